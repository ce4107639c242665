//! Concrete units.

use super::converter::UnitConverter;
use super::error::{UnitError, UnitResult};
use super::index::{DimensionIndex, UnitIndex, UnitSystemIndex};
use crate::text::LabelLookup;
use std::sync::Arc;

/// How a unit's label template is filled in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LabelStyle {
    #[default]
    Plain,
    /// Label template receives the currency symbol as `%1`.
    Currency,
}

/// One concrete unit inside a dimension.
///
/// Units are created by [`super::UnitCatalog`] and shared as `Arc<Unit>`.
/// Two units are equal when they have the same catalog index.
#[derive(Debug)]
pub struct Unit {
    index: UnitIndex,
    name: String,
    dimension: DimensionIndex,
    dimension_name: String,
    unit_system: UnitSystemIndex,
    enum_value: i32,
    converter: Arc<dyn UnitConverter>,
    label_style: LabelStyle,
}

impl Unit {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        index: UnitIndex,
        name: String,
        dimension: DimensionIndex,
        dimension_name: String,
        unit_system: UnitSystemIndex,
        enum_value: i32,
        converter: Arc<dyn UnitConverter>,
        label_style: LabelStyle,
    ) -> Self {
        Self {
            index,
            name,
            dimension,
            dimension_name,
            unit_system,
            enum_value,
            converter,
            label_style,
        }
    }

    pub fn index(&self) -> UnitIndex {
        self.index
    }

    /// Internal, never-translated identifier. Also the label key.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dimension(&self) -> DimensionIndex {
        self.dimension
    }

    pub fn dimension_name(&self) -> &str {
        &self.dimension_name
    }

    pub fn unit_system(&self) -> UnitSystemIndex {
        self.unit_system
    }

    /// External enum value, unique only within this unit's dimension.
    pub fn enum_value(&self) -> i32 {
        self.enum_value
    }

    pub fn label_style(&self) -> LabelStyle {
        self.label_style
    }

    /// Converts `value`, expressed in `from`, into this unit.
    ///
    /// Returns `value` untouched when `from` is this unit.
    ///
    /// # Errors
    /// - Returns `IncompatibleDimensions` when `from` belongs to another
    ///   dimension.
    pub fn convert_from(&self, value: f64, from: &Unit) -> UnitResult<f64> {
        if from.index == self.index {
            return Ok(value);
        }
        if from.dimension != self.dimension {
            return Err(UnitError::IncompatibleDimensions {
                from: from.dimension_name.clone(),
                to: self.dimension_name.clone(),
            });
        }

        Ok(self.converter.from_base(from.converter.to_base(value)))
    }

    /// Returns how many `other` units make one of this unit.
    pub fn conversion_factor(&self, other: &Unit) -> UnitResult<f64> {
        Ok(1.0 / self.convert_from(1.0, other)?)
    }

    pub fn label(&self, labels: &dyn LabelLookup) -> String {
        match self.label_style {
            LabelStyle::Plain => labels.label(&self.name),
            LabelStyle::Currency => {
                let symbol = labels.currency_symbol();
                labels.label_with(&self.name, &[symbol.as_str()])
            }
        }
    }

    pub fn short_label(&self, labels: &dyn LabelLookup) -> String {
        match self.label_style {
            LabelStyle::Plain => labels.short_label(&self.name),
            LabelStyle::Currency => {
                let symbol = labels.currency_symbol();
                labels.short_label_with(&self.name, &[symbol.as_str()])
            }
        }
    }

    /// Returns `dimension:unit`, the human-readable persisted form.
    ///
    /// Using this form freezes both internal names.
    pub fn to_serialized_string(&self) -> String {
        format!("{}:{}", self.dimension_name, self.name)
    }
}

impl PartialEq for Unit {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl Eq for Unit {}
