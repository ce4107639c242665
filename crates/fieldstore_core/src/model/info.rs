//! Marker table record.
//!
//! # Responsibility
//! - Represent one `INFOTABLE_V1` row as a key/value pair.
//! - Expose `InfoName` and `Value` through the field layer.
//!
//! # Invariants
//! - `info_name` is non-blank and unique without regard to case.
//! - `id == 0` marks a record that has not been saved yet.

use crate::db::{INFO_FIELD_NAME, INFO_FIELD_VALUE};
use crate::field::{
    Editable, FieldError, FieldResult, FieldType, FieldValue, Property, PropertyTable, Schema,
    ValueRepr,
};
use crate::text::LabelLookup;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Row id of an unsaved record.
pub const UNSAVED_ID: i64 = 0;

const INFO_NAME_LABEL_KEY: &str = "InfoNameLabel";
const VALUE_LABEL_KEY: &str = "ValueLabel";

/// Accessors shared by every entity with a numeric row id.
static IDENTIFIED: Lazy<Arc<PropertyTable<InfoRecord>>> = Lazy::new(|| {
    Arc::new(
        PropertyTable::new("Identified").with(Property::read_only("Id", |record: &InfoRecord| {
            FieldValue::Integer(record.id)
        })),
    )
});

static INFO_PROPERTIES: Lazy<Arc<PropertyTable<InfoRecord>>> = Lazy::new(|| {
    Arc::new(
        PropertyTable::new("InfoRecord")
            .with(Property::read_write(
                INFO_FIELD_NAME,
                |record: &InfoRecord| FieldValue::from(record.info_name.as_str()),
                |record: &mut InfoRecord, value| {
                    record.info_name = text_value(INFO_FIELD_NAME, value)?;
                    Ok(())
                },
            ))
            .with(Property::read_write(
                INFO_FIELD_VALUE,
                |record: &InfoRecord| FieldValue::from(record.value.as_str()),
                |record: &mut InfoRecord, value| {
                    record.value = text_value(INFO_FIELD_VALUE, value)?;
                    Ok(())
                },
            ))
            .with_capability(Arc::clone(&IDENTIFIED)),
    )
});

/// One key/value pair stored in the marker table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfoRecord {
    pub id: i64,
    pub info_name: String,
    pub value: String,
}

impl InfoRecord {
    /// Creates an unsaved record.
    pub fn new(info_name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id: UNSAVED_ID,
            info_name: info_name.into(),
            value: value.into(),
        }
    }

    pub fn is_saved(&self) -> bool {
        self.id != UNSAVED_ID
    }

    /// Checks the record before it is written.
    pub fn validate(&self) -> Result<(), InfoValidationError> {
        if self.info_name.trim().is_empty() {
            return Err(InfoValidationError::BlankName);
        }
        if self.id < UNSAVED_ID {
            return Err(InfoValidationError::NegativeId(self.id));
        }
        Ok(())
    }
}

impl Editable for InfoRecord {
    fn schema(labels: &dyn LabelLookup) -> FieldResult<Schema<Self>> {
        let info_name = FieldType::builder(INFO_FIELD_NAME, ValueRepr::Text)
            .label_key(INFO_NAME_LABEL_KEY)
            .default_value("")
            .build(labels)?;
        let value = FieldType::builder(INFO_FIELD_VALUE, ValueRepr::Text)
            .label_key(VALUE_LABEL_KEY)
            .default_value("")
            .build(labels)?;

        Schema::new(Arc::clone(&INFO_PROPERTIES))
            .add(info_name)?
            .add(value)
    }
}

fn text_value(field: &str, value: FieldValue) -> FieldResult<String> {
    match value {
        FieldValue::Text(text) => Ok(text),
        FieldValue::Null => Ok(String::new()),
        other => Err(FieldError::type_mismatch(field, "text", &other)),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InfoValidationError {
    BlankName,
    NegativeId(i64),
}

impl Display for InfoValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankName => write!(f, "info name must not be blank"),
            Self::NegativeId(id) => write!(f, "info id must not be negative, got {id}"),
        }
    }
}

impl Error for InfoValidationError {}

#[cfg(test)]
mod tests {
    use super::{InfoRecord, InfoValidationError, INFO_PROPERTIES};
    use crate::field::{Editable, FieldValue, Target};
    use crate::text::TextCatalog;
    use crate::units::UnitCatalog;

    #[test]
    fn schema_lists_name_then_value() {
        let labels = TextCatalog::from_pairs([("InfoNameLabel", "Name"), ("ValueLabel", "Value")]);
        let fields = InfoRecord::supported_fields(&labels).unwrap();
        let names = fields.iter().map(|field| field.name()).collect::<Vec<_>>();
        assert_eq!(names, ["InfoName", "Value"]);
        assert_eq!(fields[0].label(), "Name");
    }

    #[test]
    fn fields_write_through_to_the_record() {
        let labels = TextCatalog::new();
        let units = UnitCatalog::standard().unwrap();
        let target = Target::single(InfoRecord::new("Setting1", "V1"));

        let name = InfoRecord::field("InfoName", target.clone(), &labels, &units).unwrap();
        let value = InfoRecord::field("Value", target.clone(), &labels, &units).unwrap();
        name.set_value(0, "Test2").unwrap();
        value.set_value(0, "Test3").unwrap();

        assert_eq!(name.get_value(0).unwrap(), FieldValue::from("Test2"));
        let record = target.with_ref(0, Clone::clone).unwrap();
        assert_eq!(record.info_name, "Test2");
        assert_eq!(record.value, "Test3");
    }

    #[test]
    fn id_is_reachable_through_capability_but_not_in_schema() {
        let labels = TextCatalog::new();
        let units = UnitCatalog::standard().unwrap();
        let record = InfoRecord {
            id: 9,
            ..InfoRecord::new("a", "b")
        };

        let id = INFO_PROPERTIES.bind("Id").unwrap();
        assert!(!id.is_writable());
        assert_eq!(id.get(&record), FieldValue::Integer(9));

        let target = Target::single(record);
        assert!(InfoRecord::field("Id", target, &labels, &units).is_err());
        let schema = InfoRecord::schema(&labels).unwrap();
        assert!(schema.find("Id").is_none());
    }

    #[test]
    fn validate_rejects_blank_name() {
        assert_eq!(
            InfoRecord::new("  ", "x").validate(),
            Err(InfoValidationError::BlankName)
        );
        assert!(InfoRecord::new("Owner", "").validate().is_ok());
    }

    #[test]
    fn serializes_with_snake_case_fields() {
        let json = serde_json::to_value(InfoRecord::new("Owner", "me")).unwrap();
        assert_eq!(json["info_name"], "Owner");
        assert_eq!(json["id"], 0);
    }
}
