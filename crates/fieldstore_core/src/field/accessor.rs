//! Live, unit-aware accessors over entity properties.
//!
//! # Responsibility
//! - Read and write one named property of a target instance by id.
//! - Convert between the storage unit and a caller-selected working unit.
//! - Coerce boolean and date properties stored as integers or text.
//!
//! # Invariants
//! - A field holds no value: every read and write goes to the target.
//! - With the working unit equal to the storage unit, reads return the stored
//!   value unchanged.
//! - The working unit always shares the storage unit's dimension.

use super::error::{FieldError, FieldResult};
use super::field_type::FieldType;
use super::property::Property;
use super::target::Target;
use super::value::{FieldDataType, FieldValue, SetValuesOperation, ValueRepr};
use crate::units::{ConversionHandler, SharedFormatter, Unit, UnitCatalog, UnitError, UnitIndex};
use chrono::{Local, NaiveDate};
use log::debug;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::Arc;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TRUE_TEXT: &str = "TRUE";
const FALSE_TEXT: &str = "FALSE";

/// How values are translated between the caller and the stored property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Coercion {
    /// Values pass through unchanged.
    #[default]
    Plain,
    /// Boolean view over integer (`0`/`1`) or text (`TRUE`/`FALSE`) storage.
    Boolean,
    /// Date view over `yyyy-MM-dd` text storage.
    Date,
}

impl Coercion {
    fn read(self, field: &str, raw: FieldValue) -> FieldResult<FieldValue> {
        match self {
            Self::Plain => Ok(raw),
            Self::Boolean => read_boolean(field, raw).map(FieldValue::Boolean),
            Self::Date => Ok(FieldValue::Date(read_date(field, raw))),
        }
    }

    fn write(self, field: &str, value: FieldValue, repr: ValueRepr) -> FieldResult<FieldValue> {
        match self {
            Self::Plain => Ok(value),
            Self::Boolean => {
                let flag = match &value {
                    FieldValue::Boolean(flag) => *flag,
                    FieldValue::Integer(number) => *number != 0,
                    other => return Err(FieldError::type_mismatch(field, "boolean", other)),
                };
                Ok(match repr {
                    ValueRepr::Int | ValueRepr::Long => FieldValue::Integer(i64::from(flag)),
                    ValueRepr::Text | ValueRepr::Char => {
                        FieldValue::Text(if flag { TRUE_TEXT } else { FALSE_TEXT }.to_string())
                    }
                    _ => FieldValue::Boolean(flag),
                })
            }
            Self::Date => match value {
                FieldValue::Date(date) => Ok(FieldValue::Text(date.format(DATE_FORMAT).to_string())),
                FieldValue::Null => Ok(FieldValue::Null),
                other => Err(FieldError::type_mismatch(field, "date", &other)),
            },
        }
    }
}

fn read_boolean(field: &str, raw: FieldValue) -> FieldResult<bool> {
    match raw {
        FieldValue::Null => Ok(false),
        FieldValue::Boolean(flag) => Ok(flag),
        FieldValue::Integer(number) => Ok(number != 0),
        // Anything other than a case-insensitive `true` reads as false.
        FieldValue::Text(text) => Ok(text.trim().eq_ignore_ascii_case(TRUE_TEXT)),
        other => Err(FieldError::type_mismatch(field, "boolean", &other)),
    }
}

fn read_date(field: &str, raw: FieldValue) -> NaiveDate {
    match raw {
        FieldValue::Date(date) => date,
        FieldValue::Text(text) if !text.trim().is_empty() => {
            NaiveDate::parse_from_str(text.trim(), DATE_FORMAT).unwrap_or_else(|_| {
                debug!("event=field_read module=field status=fallback field={field} reason=unparsable_date");
                today()
            })
        }
        _ => today(),
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Storage and working units of a unit-aware field.
#[derive(Debug, Clone)]
pub struct UnitStrategy {
    storage: Arc<Unit>,
    working: Arc<Unit>,
}

impl UnitStrategy {
    pub fn new(storage: Arc<Unit>) -> Self {
        Self {
            working: Arc::clone(&storage),
            storage,
        }
    }

    pub fn storage(&self) -> &Arc<Unit> {
        &self.storage
    }

    pub fn working(&self) -> &Arc<Unit> {
        &self.working
    }

    pub fn is_identity(&self) -> bool {
        self.storage.index() == self.working.index()
    }

    fn set_working(&mut self, unit: Arc<Unit>) -> Result<(), UnitError> {
        if unit.dimension() != self.storage.dimension() {
            return Err(UnitError::IncompatibleDimensions {
                from: self.storage.dimension_name().to_string(),
                to: unit.dimension_name().to_string(),
            });
        }
        self.working = unit;
        Ok(())
    }
}

/// Accessor binding a [`FieldType`] to a target.
pub struct Field<T> {
    field_type: FieldType,
    property: Property<T>,
    target: Target<T>,
    coercion: Coercion,
    units: Option<UnitStrategy>,
}

impl<T> std::fmt::Debug for Field<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Field")
            .field("field_type", &self.field_type)
            .field("property", &self.property)
            .field("coercion", &self.coercion)
            .field("units", &self.units)
            .finish()
    }
}

impl<T> Field<T> {
    pub fn new(field_type: FieldType, property: Property<T>, target: Target<T>) -> Self {
        Self {
            field_type,
            property,
            target,
            coercion: Coercion::Plain,
            units: None,
        }
    }

    pub fn with_coercion(mut self, coercion: Coercion) -> Self {
        self.coercion = coercion;
        self
    }

    /// Attaches the storage unit named by the field type.
    ///
    /// # Errors
    /// - `NotUnitized` when the field type has no storage unit.
    /// - `Unit` when the catalog does not know that unit.
    pub fn with_units(mut self, catalog: &UnitCatalog) -> FieldResult<Self> {
        let index = self
            .field_type
            .storage_unit()
            .ok_or_else(|| FieldError::NotUnitized(self.field_type.name().to_string()))?;
        self.units = Some(UnitStrategy::new(catalog.require_unit(index)?));
        Ok(self)
    }

    pub fn field_type(&self) -> &FieldType {
        &self.field_type
    }

    pub fn name(&self) -> &str {
        self.field_type.name()
    }

    pub fn data_type(&self) -> FieldDataType {
        match self.coercion {
            Coercion::Boolean => FieldDataType::Boolean,
            Coercion::Date => FieldDataType::DateTime,
            Coercion::Plain => self.field_type.data_type(),
        }
    }

    pub fn default_value(&self) -> &FieldValue {
        self.field_type.default_value()
    }

    pub fn coercion(&self) -> Coercion {
        self.coercion
    }

    pub fn is_read_only(&self) -> bool {
        !self.property.is_writable()
    }

    pub fn is_unitized(&self) -> bool {
        self.units.is_some()
    }

    pub fn unit_strategy(&self) -> Option<&UnitStrategy> {
        self.units.as_ref()
    }

    pub fn storage_unit_index(&self) -> Option<UnitIndex> {
        self.units.as_ref().map(|units| units.storage.index())
    }

    pub fn working_unit_index(&self) -> Option<UnitIndex> {
        self.units.as_ref().map(|units| units.working.index())
    }

    /// Changes the unit values are read and written in.
    ///
    /// # Errors
    /// - `NotUnitized` for fields without a storage unit.
    /// - `Unit(IncompatibleDimensions)` when `unit` is from another dimension.
    pub fn set_working_unit(&mut self, unit: Arc<Unit>) -> FieldResult<()> {
        let name = self.field_type.name();
        let units = self
            .units
            .as_mut()
            .ok_or_else(|| FieldError::NotUnitized(name.to_string()))?;
        units.set_working(unit)?;
        Ok(())
    }

    pub fn set_working_unit_index(
        &mut self,
        index: UnitIndex,
        catalog: &UnitCatalog,
    ) -> FieldResult<()> {
        let unit = catalog.require_unit(index)?;
        self.set_working_unit(unit)
    }

    /// Handler converting this field's storage values for display.
    pub fn conversion_handler(&self, formatter: SharedFormatter) -> FieldResult<ConversionHandler> {
        let units = self
            .units
            .as_ref()
            .ok_or_else(|| FieldError::NotUnitized(self.name().to_string()))?;
        Ok(ConversionHandler::new(Arc::clone(&units.storage), formatter)?)
    }

    /// Reads the property of the instance addressed by `id`.
    ///
    /// Unit-aware fields return the value in the working unit.
    pub fn get_value(&self, id: i64) -> FieldResult<FieldValue> {
        let raw = self
            .target
            .with_ref(id, |item| self.property.get(item))
            .ok_or_else(|| self.no_such_target(id))?;
        let value = self.coercion.read(self.name(), raw)?;

        match &self.units {
            Some(units) if !units.is_identity() && !value.is_null() => {
                let stored = value
                    .as_f64()
                    .ok_or_else(|| FieldError::type_mismatch(self.name(), "number", &value))?;
                Ok(FieldValue::Real(
                    units.working.convert_from(stored, &units.storage)?,
                ))
            }
            _ => Ok(value),
        }
    }

    /// Numeric read. Fails for non-numeric values, null included.
    pub fn get_f64(&self, id: i64) -> FieldResult<f64> {
        let value = self.get_value(id)?;
        value
            .as_f64()
            .ok_or_else(|| FieldError::type_mismatch(self.name(), "number", &value))
    }

    /// Reads every instance of the target, keyed by id.
    pub fn get_values(&self) -> FieldResult<BTreeMap<i64, FieldValue>> {
        self.get_values_for(self.target.ids())
    }

    pub fn get_values_for(
        &self,
        ids: impl IntoIterator<Item = i64>,
    ) -> FieldResult<BTreeMap<i64, FieldValue>> {
        ids.into_iter()
            .map(|id| self.get_value(id).map(|value| (id, value)))
            .collect()
    }

    /// Writes the property of the instance addressed by `id`.
    ///
    /// Unit-aware fields take `value` in the working unit and store it in the
    /// storage unit, narrowed to the property's representation.
    pub fn set_value(&self, id: i64, value: impl Into<FieldValue>) -> FieldResult<()> {
        if !self.property.is_writable() {
            return Err(FieldError::ReadOnly(self.name().to_string()));
        }
        let repr = self.field_type.repr();
        let value = match &self.units {
            Some(units) => self.to_storage(units, value.into(), repr)?,
            None => value.into(),
        };
        let stored = self.coercion.write(self.name(), value, repr)?;

        match self
            .target
            .with_mut(id, |item| self.property.set(item, stored))
        {
            None => Err(self.no_such_target(id)),
            Some(None) => Err(FieldError::ReadOnly(self.name().to_string())),
            Some(Some(result)) => result,
        }
    }

    /// Bulk write entry point. The operation is not applied: the value is
    /// written to id `0` only.
    pub fn set_values(
        &self,
        _operation: SetValuesOperation,
        value: impl Into<FieldValue>,
    ) -> FieldResult<()> {
        self.set_value(0, value)
    }

    fn to_storage(
        &self,
        units: &UnitStrategy,
        value: FieldValue,
        repr: ValueRepr,
    ) -> FieldResult<FieldValue> {
        if value.is_null() {
            return Ok(value);
        }
        if units.is_identity() {
            return match (repr, &value) {
                (ValueRepr::Decimal, FieldValue::Decimal(_))
                | (ValueRepr::Int | ValueRepr::Long, FieldValue::Integer(_)) => Ok(value),
                _ => {
                    let number = value
                        .as_f64()
                        .ok_or_else(|| FieldError::type_mismatch(self.name(), "number", &value))?;
                    self.narrow(number, repr)
                }
            };
        }

        let working = value
            .as_f64()
            .ok_or_else(|| FieldError::type_mismatch(self.name(), "number", &value))?;
        let stored = units.storage.convert_from(working, &units.working)?;
        self.narrow(stored, repr)
    }

    fn narrow(&self, number: f64, repr: ValueRepr) -> FieldResult<FieldValue> {
        let not_representable = || FieldError::NotRepresentable {
            field: self.name().to_string(),
            value: number,
        };
        match repr {
            ValueRepr::Decimal => Decimal::from_f64(number)
                .map(FieldValue::Decimal)
                .ok_or_else(not_representable),
            ValueRepr::Int | ValueRepr::Long => {
                let rounded = number.round();
                if !rounded.is_finite() || rounded < i64::MIN as f64 || rounded >= i64::MAX as f64 {
                    return Err(not_representable());
                }
                Ok(FieldValue::Integer(rounded as i64))
            }
            _ => Ok(FieldValue::Real(number)),
        }
    }

    fn no_such_target(&self, id: i64) -> FieldError {
        FieldError::NoSuchTarget {
            field: self.name().to_string(),
            id,
        }
    }
}
