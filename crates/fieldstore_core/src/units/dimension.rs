//! Dimensions: families of mutually convertible units.

use super::error::{UnitError, UnitResult};
use super::index::{DimensionIndex, UnitIndex};
use crate::text::LabelLookup;
use std::collections::BTreeMap;

/// A named family of units sharing one implicit base quantity.
#[derive(Debug, Clone)]
pub struct Dimension {
    index: DimensionIndex,
    name: String,
    enum_value: i32,
    units: Vec<UnitIndex>,
    units_by_enum: BTreeMap<i32, UnitIndex>,
}

impl Dimension {
    pub(crate) fn new(index: DimensionIndex, name: impl Into<String>, enum_value: i32) -> Self {
        Self {
            index,
            name: name.into(),
            enum_value,
            units: Vec::new(),
            units_by_enum: BTreeMap::new(),
        }
    }

    pub fn index(&self) -> DimensionIndex {
        self.index
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// External enum value. Not the same as [`Self::index`].
    pub fn enum_value(&self) -> i32 {
        self.enum_value
    }

    /// Catalog indices of member units in registration order.
    pub fn unit_indices(&self) -> &[UnitIndex] {
        &self.units
    }

    pub fn unit_for_enum(&self, enum_value: i32) -> Option<UnitIndex> {
        self.units_by_enum.get(&enum_value).copied()
    }

    pub fn label(&self, labels: &dyn LabelLookup) -> String {
        labels.label(&self.name)
    }

    pub fn short_label(&self, labels: &dyn LabelLookup) -> String {
        labels.short_label(&self.name)
    }

    /// Adds one unit under its per-dimension enum value.
    ///
    /// # Errors
    /// - Returns `DuplicateUnitIndex` when `enum_value` is already taken.
    pub(crate) fn register(&mut self, enum_value: i32, unit: UnitIndex) -> UnitResult<()> {
        if self.units_by_enum.contains_key(&enum_value) {
            return Err(UnitError::DuplicateUnitIndex {
                dimension: self.name.clone(),
                enum_value,
            });
        }
        self.units_by_enum.insert(enum_value, unit);
        self.units.push(unit);
        Ok(())
    }
}
