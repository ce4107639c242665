//! Dynamic values and the representation to data-type table.

use chrono::NaiveDate;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// A property value as seen through a field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Boolean(bool),
    Integer(i64),
    Real(f64),
    Decimal(Decimal),
    Text(String),
    Date(NaiveDate),
    Binary(Vec<u8>),
    Enumerated(i32),
}

impl FieldValue {
    /// Short name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean(_) => "boolean",
            Self::Integer(_) => "integer",
            Self::Real(_) => "real",
            Self::Decimal(_) => "decimal",
            Self::Text(_) => "text",
            Self::Date(_) => "date",
            Self::Binary(_) => "binary",
            Self::Enumerated(_) => "enumerated",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Numeric view of integer, real and decimal values.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(value) => Some(*value as f64),
            Self::Real(value) => Some(*value),
            Self::Decimal(value) => value.to_f64(),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(value) => Some(*value),
            Self::Enumerated(value) => Some(i64::from(*value)),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Self::Decimal(value) => Some(*value),
            Self::Integer(value) => Some(Decimal::from(*value)),
            Self::Real(value) => Decimal::from_f64(*value),
            _ => None,
        }
    }

    pub fn into_text(self) -> Option<String> {
        match self {
            Self::Text(value) => Some(value),
            _ => None,
        }
    }
}

impl Display for FieldValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Boolean(value) => write!(f, "{value}"),
            Self::Integer(value) => write!(f, "{value}"),
            Self::Real(value) => write!(f, "{value}"),
            Self::Decimal(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
            Self::Date(value) => write!(f, "{}", value.format("%Y-%m-%d")),
            Self::Binary(value) => write!(f, "<{} bytes>", value.len()),
            Self::Enumerated(value) => write!(f, "{value}"),
        }
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Real(value)
    }
}

impl From<Decimal> for FieldValue {
    fn from(value: Decimal) -> Self {
        Self::Decimal(value)
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

impl From<Vec<u8>> for FieldValue {
    fn from(value: Vec<u8>) -> Self {
        Self::Binary(value)
    }
}

impl<T> From<Option<T>> for FieldValue
where
    T: Into<FieldValue>,
{
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// In-memory representation of a property, as declared by its entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueRepr {
    Bool,
    DateTime,
    Enumerated,
    Int,
    Long,
    Text,
    Char,
    Double,
    Decimal,
    Binary,
    Byte,
    Guid,
    Object,
}

impl ValueRepr {
    /// Storage data type of this representation.
    ///
    /// `None` marks a representation that cannot be described to storage.
    pub fn data_type(self) -> Option<FieldDataType> {
        match self {
            Self::Bool => Some(FieldDataType::Boolean),
            Self::DateTime => Some(FieldDataType::DateTime),
            Self::Enumerated => Some(FieldDataType::Enumerated),
            Self::Int | Self::Long => Some(FieldDataType::Integer),
            Self::Text | Self::Char => Some(FieldDataType::Text),
            Self::Double | Self::Decimal => Some(FieldDataType::Real),
            Self::Binary => Some(FieldDataType::LongBinary),
            Self::Byte => Some(FieldDataType::Collection),
            Self::Guid | Self::Object => None,
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Int | Self::Long | Self::Double | Self::Decimal)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::DateTime => "datetime",
            Self::Enumerated => "enumerated",
            Self::Int => "int",
            Self::Long => "long",
            Self::Text => "text",
            Self::Char => "char",
            Self::Double => "double",
            Self::Decimal => "decimal",
            Self::Binary => "binary",
            Self::Byte => "byte",
            Self::Guid => "guid",
            Self::Object => "object",
        }
    }
}

/// Storage-level data type. Discriminants are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldDataType {
    Integer = 1,
    Real = 2,
    Text = 3,
    LongText = 4,
    DateTime = 5,
    Boolean = 6,
    LongBinary = 7,
    Referenced = 8,
    Collection = 9,
    Enumerated = 10,
}

impl FieldDataType {
    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(Self::Integer),
            2 => Some(Self::Real),
            3 => Some(Self::Text),
            4 => Some(Self::LongText),
            5 => Some(Self::DateTime),
            6 => Some(Self::Boolean),
            7 => Some(Self::LongBinary),
            8 => Some(Self::Referenced),
            9 => Some(Self::Collection),
            10 => Some(Self::Enumerated),
            _ => None,
        }
    }
}

/// Bulk-edit operation. Accepted by `Field::set_values` and currently
/// ignored there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetValuesOperation {
    Add = 1,
    Divide = 2,
    Multiply = 3,
    Set = 4,
    Subtract = 5,
}
