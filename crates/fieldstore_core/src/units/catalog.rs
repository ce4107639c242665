//! Registry of every dimension, unit system and unit.
//!
//! # Responsibility
//! - Own all catalog entries and hand out permanent indices.
//! - Resolve units by index, name, label, enum value or serialized form.
//! - Convert values between units of one dimension.
//!
//! # Invariants
//! - Indices are vector positions and entries are only ever appended.
//! - A catalog is built once and then shared read-only, typically in an `Arc`.

use super::converter::{FactorConverter, UnitConverter};
use super::dimension::Dimension;
use super::error::{UnitError, UnitResult};
use super::index::{DimensionIndex, UnitIndex, UnitSystemIndex};
use super::unit::{LabelStyle, Unit};
use super::unit_system::UnitSystem;
use crate::text::LabelLookup;
use log::debug;
use std::collections::BTreeMap;
use std::sync::Arc;

/// External dimension ids that resolve to an already registered dimension.
const CURRENCY_ALIAS_ENUM: i32 = 101;

/// Everything needed to register one unit.
#[derive(Debug, Clone)]
pub struct UnitDefinition {
    pub name: String,
    pub dimension: DimensionIndex,
    pub unit_system: UnitSystemIndex,
    pub enum_value: i32,
    pub converter: Arc<dyn UnitConverter>,
    pub label_style: LabelStyle,
}

impl UnitDefinition {
    /// Linear unit where one base quantity equals `factor` of this unit.
    pub fn scaled(
        name: impl Into<String>,
        dimension: DimensionIndex,
        enum_value: i32,
        factor: f64,
    ) -> UnitResult<Self> {
        Ok(Self {
            name: name.into(),
            dimension,
            unit_system: UnitSystemIndex::NONE,
            enum_value,
            converter: Arc::new(FactorConverter::new(factor)?),
            label_style: LabelStyle::Plain,
        })
    }

    pub fn with_unit_system(mut self, unit_system: UnitSystemIndex) -> Self {
        self.unit_system = unit_system;
        self
    }

    pub fn with_label_style(mut self, label_style: LabelStyle) -> Self {
        self.label_style = label_style;
        self
    }
}

/// Owner of all dimensions, unit systems and units.
#[derive(Debug, Default)]
pub struct UnitCatalog {
    dimensions: Vec<Dimension>,
    unit_systems: Vec<UnitSystem>,
    units: Vec<Arc<Unit>>,
    dimension_aliases: BTreeMap<i32, DimensionIndex>,
}

impl UnitCatalog {
    /// Catalog without any entry. Used to build custom catalogs.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds the standard catalog.
    ///
    /// Registration order defines the permanent indices pinned by
    /// [`DimensionIndex`], [`UnitIndex`] and [`UnitSystemIndex`] constants.
    pub fn standard() -> UnitResult<Self> {
        let mut catalog = Self::empty();

        let none = catalog.add_dimension("none", 0)?;
        let currency = catalog.add_dimension("currency", 26)?;
        let percent = catalog.add_dimension("percent", 5)?;
        let unitless = catalog.add_dimension("unitless", 35)?;
        catalog.add_dimension_alias(CURRENCY_ALIAS_ENUM, currency)?;

        for name in ["none", "si", "usCustomary", "both"] {
            catalog.add_unit_system(name);
        }

        catalog.register_unit(UnitDefinition::scaled("none", none, 0, 1.0)?)?;
        catalog.register_unit(
            UnitDefinition::scaled("dollars", currency, 1, 1.0)?
                .with_label_style(LabelStyle::Currency),
        )?;
        catalog.register_unit(UnitDefinition::scaled("percentPercent", percent, 1, 1.0)?)?;
        catalog.register_unit(UnitDefinition::scaled("unitlessPercent", percent, 2, 0.01)?)?;
        catalog.register_unit(UnitDefinition::scaled("unitlessUnit", unitless, 0, 1.0)?)?;

        debug!(
            "event=unit_catalog_init module=units status=ok dimensions={} units={} unit_systems={}",
            catalog.dimensions.len(),
            catalog.units.len(),
            catalog.unit_systems.len()
        );
        Ok(catalog)
    }

    /// Appends a dimension.
    ///
    /// # Errors
    /// - Returns `DuplicateDimension` when the name or external enum is taken.
    pub fn add_dimension(
        &mut self,
        name: impl Into<String>,
        enum_value: i32,
    ) -> UnitResult<DimensionIndex> {
        let name = name.into();
        let taken = self
            .dimensions
            .iter()
            .any(|dimension| dimension.name() == name || dimension.enum_value() == enum_value)
            || self.dimension_aliases.contains_key(&enum_value);
        if taken {
            return Err(UnitError::DuplicateDimension(name));
        }

        let index = DimensionIndex(self.dimensions.len() as u32);
        self.dimensions.push(Dimension::new(index, name, enum_value));
        Ok(index)
    }

    /// Makes another external enum id resolve to `dimension`.
    pub fn add_dimension_alias(
        &mut self,
        enum_value: i32,
        dimension: DimensionIndex,
    ) -> UnitResult<()> {
        let target = self.dimension(dimension)?;
        let taken = self
            .dimensions
            .iter()
            .any(|candidate| candidate.enum_value() == enum_value)
            || self.dimension_aliases.contains_key(&enum_value);
        if taken {
            return Err(UnitError::DuplicateDimension(target.name().to_string()));
        }
        self.dimension_aliases.insert(enum_value, dimension);
        Ok(())
    }

    pub fn add_unit_system(&mut self, name: impl Into<String>) -> UnitSystemIndex {
        let index = UnitSystemIndex(self.unit_systems.len() as u32);
        self.unit_systems.push(UnitSystem::new(index, name));
        index
    }

    /// Appends a unit and registers it with its dimension.
    ///
    /// # Errors
    /// - Returns `UnknownDimensionIndex` when the dimension does not exist.
    /// - Returns `DuplicateUnitIndex` when the enum value is taken in that
    ///   dimension. The catalog is left unchanged.
    pub fn register_unit(&mut self, definition: UnitDefinition) -> UnitResult<UnitIndex> {
        let index = UnitIndex(self.units.len() as u32);
        let slot = definition.dimension.value() as usize;
        let dimension = self
            .dimensions
            .get_mut(slot)
            .ok_or(UnitError::UnknownDimensionIndex(definition.dimension))?;
        dimension.register(definition.enum_value, index)?;

        let unit = Unit::new(
            index,
            definition.name,
            definition.dimension,
            dimension.name().to_string(),
            definition.unit_system,
            definition.enum_value,
            definition.converter,
            definition.label_style,
        );
        self.units.push(Arc::new(unit));
        Ok(index)
    }

    /// Shorthand for registering a linear unit.
    pub fn register_scaled(
        &mut self,
        name: impl Into<String>,
        dimension: DimensionIndex,
        enum_value: i32,
        factor: f64,
    ) -> UnitResult<UnitIndex> {
        self.register_unit(UnitDefinition::scaled(name, dimension, enum_value, factor)?)
    }

    pub fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    pub fn unit_systems(&self) -> &[UnitSystem] {
        &self.unit_systems
    }

    pub fn units(&self) -> &[Arc<Unit>] {
        &self.units
    }

    pub fn dimension(&self, index: DimensionIndex) -> UnitResult<&Dimension> {
        self.dimensions
            .get(index.value() as usize)
            .ok_or(UnitError::UnknownDimensionIndex(index))
    }

    pub fn unit(&self, index: UnitIndex) -> Option<Arc<Unit>> {
        self.units.get(index.value() as usize).cloned()
    }

    pub fn require_unit(&self, index: UnitIndex) -> UnitResult<Arc<Unit>> {
        self.unit(index).ok_or(UnitError::UnknownUnitIndex(index))
    }

    pub fn unit_system(&self, index: UnitSystemIndex) -> Option<&UnitSystem> {
        self.unit_systems.get(index.value() as usize)
    }

    pub fn dimension_by_name(&self, name: &str) -> Option<&Dimension> {
        self.dimensions
            .iter()
            .find(|dimension| dimension.name() == name)
    }

    /// Resolves an external dimension id, aliases included.
    pub fn dimension_from_external_enum(&self, enum_value: i32) -> UnitResult<&Dimension> {
        if let Some(dimension) = self
            .dimensions
            .iter()
            .find(|dimension| dimension.enum_value() == enum_value)
        {
            return Ok(dimension);
        }
        match self.dimension_aliases.get(&enum_value) {
            Some(index) => self.dimension(*index),
            None => Err(UnitError::UnknownDimensionEnum(enum_value)),
        }
    }

    pub fn unit_by_name(&self, dimension: DimensionIndex, name: &str) -> Option<Arc<Unit>> {
        self.units_of(dimension)
            .find(|unit| unit.name() == name)
            .cloned()
    }

    /// Finds a unit by its localized label within one dimension.
    pub fn unit_by_label(
        &self,
        dimension: DimensionIndex,
        label: &str,
        labels: &dyn LabelLookup,
    ) -> Option<Arc<Unit>> {
        self.units_of(dimension)
            .find(|unit| unit.label(labels) == label)
            .cloned()
    }

    pub fn unit_from_dimension_enum(
        &self,
        dimension: DimensionIndex,
        enum_value: i32,
    ) -> UnitResult<Arc<Unit>> {
        let owner = self.dimension(dimension)?;
        let index = owner
            .unit_for_enum(enum_value)
            .ok_or_else(|| UnitError::UnknownUnitEnum {
                dimension: owner.name().to_string(),
                enum_value,
            })?;
        self.require_unit(index)
    }

    /// Parses the `dimension:unit` form produced by
    /// [`Unit::to_serialized_string`].
    pub fn unit_from_serialized(&self, value: &str) -> UnitResult<Arc<Unit>> {
        let (dimension_name, unit_name) = value
            .split_once(':')
            .ok_or_else(|| UnitError::MalformedSerializedUnit(value.to_string()))?;
        let dimension = self
            .dimension_by_name(dimension_name)
            .ok_or_else(|| UnitError::UnknownDimension(dimension_name.to_string()))?;
        self.unit_by_name(dimension.index(), unit_name)
            .ok_or_else(|| UnitError::UnknownUnit {
                dimension: dimension_name.to_string(),
                unit: unit_name.to_string(),
            })
    }

    /// Converts `value` from one unit to another by index.
    pub fn convert(&self, value: f64, from: UnitIndex, to: UnitIndex) -> UnitResult<f64> {
        let from = self.require_unit(from)?;
        let to = self.require_unit(to)?;
        to.convert_from(value, &from)
    }

    /// Converts `value` between two units named by their per-dimension enum
    /// values.
    pub fn convert_by_enum(
        &self,
        dimension: DimensionIndex,
        value: f64,
        from_enum: i32,
        to_enum: i32,
    ) -> UnitResult<f64> {
        let from = self.unit_from_dimension_enum(dimension, from_enum)?;
        let to = self.unit_from_dimension_enum(dimension, to_enum)?;
        to.convert_from(value, &from)
    }

    /// Units of one dimension ordered by label.
    ///
    /// Units sharing a label are all kept, in registration order.
    pub fn available_units_sorted(
        &self,
        dimension: DimensionIndex,
        labels: &dyn LabelLookup,
    ) -> Vec<Arc<Unit>> {
        let mut keyed = self
            .units_of(dimension)
            .map(|unit| (unit.label(labels), Arc::clone(unit)))
            .collect::<Vec<_>>();
        // Stable sort keeps registration order among equal labels.
        keyed.sort_by(|left, right| left.0.cmp(&right.0));
        keyed.into_iter().map(|(_, unit)| unit).collect()
    }

    /// Units of one dimension ordered by label with one unit per label.
    ///
    /// When two units share a label, the unit whose enum value is
    /// `current_enum` wins, otherwise the first registered one.
    pub fn available_units_sorted_with(
        &self,
        dimension: DimensionIndex,
        current_enum: i32,
        labels: &dyn LabelLookup,
    ) -> Vec<Arc<Unit>> {
        let mut by_label = BTreeMap::new();
        if let Some(current) = self
            .units_of(dimension)
            .find(|unit| unit.enum_value() == current_enum)
        {
            by_label.insert(current.label(labels), Arc::clone(current));
        }
        for unit in self.units_of(dimension) {
            by_label
                .entry(unit.label(labels))
                .or_insert_with(|| Arc::clone(unit));
        }
        by_label.into_values().collect()
    }

    fn units_of(&self, dimension: DimensionIndex) -> impl Iterator<Item = &Arc<Unit>> + '_ {
        self.units
            .iter()
            .filter(move |unit| unit.dimension() == dimension)
    }
}
