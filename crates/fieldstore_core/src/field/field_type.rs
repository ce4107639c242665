//! Immutable field metadata.

use super::error::{FieldError, FieldResult};
use super::value::{FieldDataType, FieldValue, ValueRepr};
use crate::text::LabelLookup;
use crate::units::UnitIndex;

/// Describes one named property of an entity.
///
/// Labels are resolved once when the type is built, so a `FieldType` never
/// touches the label catalog afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldType {
    name: String,
    repr: ValueRepr,
    data_type: FieldDataType,
    default_value: FieldValue,
    storage_unit: Option<UnitIndex>,
    formatter_name: Option<String>,
    label: String,
    category: String,
    notes: String,
}

impl FieldType {
    pub fn builder(name: impl Into<String>, repr: ValueRepr) -> FieldTypeBuilder {
        FieldTypeBuilder {
            name: name.into(),
            repr,
            label_key: None,
            category_key: None,
            notes_key: None,
            default_value: FieldValue::Null,
            storage_unit: None,
            formatter_name: None,
        }
    }

    /// Accessor lookup key and default label key.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn repr(&self) -> ValueRepr {
        self.repr
    }

    pub fn data_type(&self) -> FieldDataType {
        self.data_type
    }

    pub fn default_value(&self) -> &FieldValue {
        &self.default_value
    }

    pub fn storage_unit(&self) -> Option<UnitIndex> {
        self.storage_unit
    }

    pub fn formatter_name(&self) -> Option<&str> {
        self.formatter_name.as_deref()
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Empty when the type has no category key.
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Empty when the type has no notes key.
    pub fn notes(&self) -> &str {
        &self.notes
    }

    pub fn is_unitized(&self) -> bool {
        self.storage_unit.is_some()
    }
}

/// Collects optional [`FieldType`] attributes before validation.
#[derive(Debug, Clone)]
pub struct FieldTypeBuilder {
    name: String,
    repr: ValueRepr,
    label_key: Option<String>,
    category_key: Option<String>,
    notes_key: Option<String>,
    default_value: FieldValue,
    storage_unit: Option<UnitIndex>,
    formatter_name: Option<String>,
}

impl FieldTypeBuilder {
    /// Label key when it differs from the field name.
    pub fn label_key(mut self, key: impl Into<String>) -> Self {
        self.label_key = Some(key.into());
        self
    }

    pub fn category_key(mut self, key: impl Into<String>) -> Self {
        self.category_key = Some(key.into());
        self
    }

    pub fn notes_key(mut self, key: impl Into<String>) -> Self {
        self.notes_key = Some(key.into());
        self
    }

    pub fn default_value(mut self, value: impl Into<FieldValue>) -> Self {
        self.default_value = value.into();
        self
    }

    pub fn storage_unit(mut self, unit: UnitIndex) -> Self {
        self.storage_unit = Some(unit);
        self
    }

    pub fn formatter_name(mut self, name: impl Into<String>) -> Self {
        self.formatter_name = Some(name.into());
        self
    }

    /// Validates the description and resolves its labels.
    ///
    /// # Errors
    /// - `InvalidFieldName` for a blank name or one containing whitespace.
    /// - `UnmappedRepresentation` when the representation has no data type.
    /// - `UnitOnNonNumeric` when a storage unit is set on a non-numeric
    ///   representation.
    pub fn build(self, labels: &dyn LabelLookup) -> FieldResult<FieldType> {
        if self.name.is_empty() || self.name.chars().any(char::is_whitespace) {
            return Err(FieldError::InvalidFieldName(self.name));
        }
        let data_type = self
            .repr
            .data_type()
            .ok_or_else(|| FieldError::UnmappedRepresentation {
                field: self.name.clone(),
                repr: self.repr.as_str().to_string(),
            })?;
        if self.storage_unit.is_some() && !self.repr.is_numeric() {
            return Err(FieldError::UnitOnNonNumeric(self.name));
        }

        let label = labels.label(self.label_key.as_deref().unwrap_or(&self.name));
        let category = resolve_optional(labels, self.category_key.as_deref());
        let notes = resolve_optional(labels, self.notes_key.as_deref());

        Ok(FieldType {
            name: self.name,
            repr: self.repr,
            data_type,
            default_value: self.default_value,
            storage_unit: self.storage_unit,
            formatter_name: self.formatter_name,
            label,
            category,
            notes,
        })
    }
}

fn resolve_optional(labels: &dyn LabelLookup, key: Option<&str>) -> String {
    match key {
        Some(key) if !key.is_empty() => labels.label(key),
        _ => String::new(),
    }
}
