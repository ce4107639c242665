//! Metadata-driven property access.
//!
//! # Responsibility
//! - Describe entity properties with immutable [`FieldType`] metadata.
//! - Bind metadata to get/set closures and live instances as [`Field`]s.
//!
//! # Invariants
//! - Field names are unique within an entity schema.
//! - Fields never cache values.

mod accessor;
mod error;
mod field_type;
mod property;
mod target;
mod value;

pub use accessor::{Coercion, Field, UnitStrategy};
pub use error::{FieldError, FieldResult};
pub use field_type::{FieldType, FieldTypeBuilder};
pub use property::{Editable, Property, PropertyTable, Schema, SchemaEntry};
pub use target::Target;
pub use value::{FieldDataType, FieldValue, SetValuesOperation, ValueRepr};
