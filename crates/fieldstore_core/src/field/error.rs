//! Field layer errors.

use super::value::FieldValue;
use crate::units::UnitError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type FieldResult<T> = Result<T, FieldError>;

/// Errors raised while describing, binding or accessing fields.
///
/// Binding and schema errors are configuration mistakes found when an
/// entity's schema is built. Access errors carry the field name so the
/// caller can report which property failed.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldError {
    /// Value representation has no storage data type.
    UnmappedRepresentation { field: String, repr: String },
    /// No accessor with this name on the entity or its capabilities.
    UnboundProperty { entity: String, property: String },
    DuplicateField(String),
    InvalidFieldName(String),
    /// Storage unit declared on a non-numeric representation.
    UnitOnNonNumeric(String),
    ReadOnly(String),
    /// Unit operation on a field without a storage unit.
    NotUnitized(String),
    NoSuchTarget { field: String, id: i64 },
    TypeMismatch {
        field: String,
        expected: &'static str,
        found: &'static str,
    },
    /// Converted value cannot be stored in the field's representation.
    NotRepresentable { field: String, value: f64 },
    Unit(UnitError),
}

impl FieldError {
    /// Builds a `TypeMismatch` for `found`. Used by property setters.
    pub fn type_mismatch(field: &str, expected: &'static str, found: &FieldValue) -> Self {
        Self::TypeMismatch {
            field: field.to_string(),
            expected,
            found: found.kind(),
        }
    }
}

impl Display for FieldError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnmappedRepresentation { field, repr } => write!(
                f,
                "field `{field}` uses representation `{repr}` which has no storage data type"
            ),
            Self::UnboundProperty { entity, property } => write!(
                f,
                "entity `{entity}` has no property `{property}` in its own or capability accessors"
            ),
            Self::DuplicateField(name) => write!(f, "duplicate field name in schema: {name}"),
            Self::InvalidFieldName(name) => write!(f, "invalid field name `{name}`"),
            Self::UnitOnNonNumeric(name) => {
                write!(f, "field `{name}` declares a storage unit but is not numeric")
            }
            Self::ReadOnly(name) => write!(f, "field `{name}` is read-only"),
            Self::NotUnitized(name) => write!(f, "field `{name}` has no storage unit"),
            Self::NoSuchTarget { field, id } => {
                write!(f, "field `{field}` has no target instance with id {id}")
            }
            Self::TypeMismatch {
                field,
                expected,
                found,
            } => write!(f, "field `{field}` expected a {expected} value, got {found}"),
            Self::NotRepresentable { field, value } => {
                write!(f, "value {value} cannot be stored in field `{field}`")
            }
            Self::Unit(err) => write!(f, "{err}"),
        }
    }
}

impl Error for FieldError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Unit(err) => Some(err),
            _ => None,
        }
    }
}

impl From<UnitError> for FieldError {
    fn from(value: UnitError) -> Self {
        Self::Unit(value)
    }
}
