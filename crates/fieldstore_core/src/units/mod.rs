//! Unit-of-measure engine.
//!
//! # Responsibility
//! - Model dimensions, units and unit systems addressed by permanent indices.
//! - Convert values between units of one dimension through a base quantity.
//! - Map numbers to and from display strings in a chosen display unit.
//!
//! # Invariants
//! - Index values are append-only. Persisted data refers to them, so an index
//!   is never renumbered or reused.
//! - Units of different dimensions never convert into each other.
//! - Within one dimension, unit enum values are unique.

mod catalog;
mod converter;
mod dimension;
mod error;
mod formatter;
mod index;
mod unit;
mod unit_system;

pub use catalog::{UnitCatalog, UnitDefinition};
pub use converter::{FactorConverter, UnitConverter};
pub use dimension::Dimension;
pub use error::{FormatError, FormatResult, UnitError, UnitResult};
pub use formatter::{
    ConversionHandler, FormatCode, NumericFormatter, SharedFormatter, StandardFormatter,
    MAX_DECIMAL_DIGITS,
};
pub use index::{DimensionIndex, UnitIndex, UnitSystemIndex};
pub use unit::{LabelStyle, Unit};
pub use unit_system::UnitSystem;
