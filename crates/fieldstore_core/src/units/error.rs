//! Error types for unit conversion and numeric formatting.

use super::index::{DimensionIndex, UnitIndex};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type UnitResult<T> = Result<T, UnitError>;

/// Unit catalog and conversion errors.
///
/// Every variant is a configuration or programming error: callers are not
/// expected to recover, only to report with enough context to diagnose.
#[derive(Debug, Clone, PartialEq)]
pub enum UnitError {
    /// Conversion requested between units of different dimensions.
    IncompatibleDimensions { from: String, to: String },
    /// A unit enum value was registered twice in one dimension.
    DuplicateUnitIndex { dimension: String, enum_value: i32 },
    DuplicateDimension(String),
    InvalidFactor(f64),
    UnknownDimension(String),
    UnknownDimensionIndex(DimensionIndex),
    UnknownDimensionEnum(i32),
    UnknownUnitIndex(UnitIndex),
    UnknownUnit { dimension: String, unit: String },
    UnknownUnitEnum { dimension: String, enum_value: i32 },
    /// Serialized unit text is not in `dimension:unit` form.
    MalformedSerializedUnit(String),
}

impl Display for UnitError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IncompatibleDimensions { from, to } => {
                write!(f, "cannot convert between incompatible dimensions `{from}` and `{to}`")
            }
            Self::DuplicateUnitIndex {
                dimension,
                enum_value,
            } => write!(
                f,
                "unit index {enum_value} is already registered in dimension `{dimension}`"
            ),
            Self::DuplicateDimension(name) => write!(f, "dimension already registered: {name}"),
            Self::InvalidFactor(factor) => {
                write!(f, "unit scale factor must be finite and non-zero, got {factor}")
            }
            Self::UnknownDimension(name) => write!(f, "unknown dimension: {name}"),
            Self::UnknownDimensionIndex(index) => write!(f, "unknown dimension index: {index}"),
            Self::UnknownDimensionEnum(value) => write!(f, "unknown dimension enum: {value}"),
            Self::UnknownUnitIndex(index) => write!(f, "unknown unit index: {index}"),
            Self::UnknownUnit { dimension, unit } => {
                write!(f, "unknown unit `{unit}` in dimension `{dimension}`")
            }
            Self::UnknownUnitEnum {
                dimension,
                enum_value,
            } => write!(
                f,
                "no unit with enum value {enum_value} in dimension `{dimension}`"
            ),
            Self::MalformedSerializedUnit(value) => {
                write!(f, "serialized unit must look like `dimension:unit`, got `{value}`")
            }
        }
    }
}

impl Error for UnitError {}

pub type FormatResult<T> = Result<T, FormatError>;

/// Numeric formatter configuration errors.
#[derive(Debug, Clone, PartialEq)]
pub enum FormatError {
    BlankName,
    UnsupportedFormatCode(String),
    DecimalDigitsOutOfRange(u8),
    /// `initialize_from` was given a formatter with a different name.
    NameMismatch { expected: String, found: String },
    Unit(UnitError),
}

impl Display for FormatError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankName => write!(f, "numeric formatter name must not be blank"),
            Self::UnsupportedFormatCode(code) => {
                write!(f, "unsupported numeric format code `{code}`; expected n|f|e|p")
            }
            Self::DecimalDigitsOutOfRange(digits) => write!(
                f,
                "decimal digits {digits} out of range 0..={}",
                super::MAX_DECIMAL_DIGITS
            ),
            Self::NameMismatch { expected, found } => write!(
                f,
                "cannot initialize formatter `{expected}` from formatter `{found}`"
            ),
            Self::Unit(err) => write!(f, "{err}"),
        }
    }
}

impl Error for FormatError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Unit(err) => Some(err),
            _ => None,
        }
    }
}

impl From<UnitError> for FormatError {
    fn from(value: UnitError) -> Self {
        Self::Unit(value)
    }
}
