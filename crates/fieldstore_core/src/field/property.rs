//! Accessor tables and entity schemas.
//!
//! # Responsibility
//! - Hold the get/set closures that expose an entity's properties by name.
//! - Pair accessors with field metadata into a per-entity schema.
//!
//! # Invariants
//! - Lookup searches the entity's own properties first, then each capability
//!   table in declaration order.
//! - A schema entry is always bound to an accessor. Binding failures surface
//!   when the schema is built, never on first access.

use super::error::{FieldError, FieldResult};
use super::accessor::{Coercion, Field};
use super::field_type::FieldType;
use super::target::Target;
use super::value::FieldValue;
use crate::text::LabelLookup;
use crate::units::UnitCatalog;
use std::collections::HashSet;
use std::sync::Arc;

type Getter<T> = Arc<dyn Fn(&T) -> FieldValue + Send + Sync>;
type Setter<T> = Arc<dyn Fn(&mut T, FieldValue) -> FieldResult<()> + Send + Sync>;

/// Named accessor pair for one property.
pub struct Property<T> {
    name: String,
    getter: Getter<T>,
    setter: Option<Setter<T>>,
}

impl<T> Clone for Property<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            getter: Arc::clone(&self.getter),
            setter: self.setter.clone(),
        }
    }
}

impl<T> std::fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Property")
            .field("name", &self.name)
            .field("writable", &self.setter.is_some())
            .finish()
    }
}

impl<T> Property<T> {
    pub fn read_only<G>(name: impl Into<String>, getter: G) -> Self
    where
        G: Fn(&T) -> FieldValue + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            getter: Arc::new(getter),
            setter: None,
        }
    }

    pub fn read_write<G, S>(name: impl Into<String>, getter: G, setter: S) -> Self
    where
        G: Fn(&T) -> FieldValue + Send + Sync + 'static,
        S: Fn(&mut T, FieldValue) -> FieldResult<()> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            getter: Arc::new(getter),
            setter: Some(Arc::new(setter)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_writable(&self) -> bool {
        self.setter.is_some()
    }

    pub(crate) fn get(&self, item: &T) -> FieldValue {
        (self.getter)(item)
    }

    /// Returns `None` for read-only properties.
    pub(crate) fn set(&self, item: &mut T, value: FieldValue) -> Option<FieldResult<()>> {
        self.setter.as_ref().map(|setter| setter(item, value))
    }
}

/// Accessors of one entity type, plus the capability tables it implements.
pub struct PropertyTable<T> {
    entity: String,
    properties: Vec<Property<T>>,
    capabilities: Vec<Arc<PropertyTable<T>>>,
}

impl<T> std::fmt::Debug for PropertyTable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PropertyTable")
            .field("entity", &self.entity)
            .field("properties", &self.properties)
            .field("capabilities", &self.capabilities)
            .finish()
    }
}

impl<T> PropertyTable<T> {
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            properties: Vec::new(),
            capabilities: Vec::new(),
        }
    }

    pub fn with(mut self, property: Property<T>) -> Self {
        self.properties.push(property);
        self
    }

    /// Appends a capability table searched after the entity's own properties.
    pub fn with_capability(mut self, capability: Arc<PropertyTable<T>>) -> Self {
        self.capabilities.push(capability);
        self
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn find(&self, name: &str) -> Option<&Property<T>> {
        self.properties
            .iter()
            .find(|property| property.name == name)
            .or_else(|| {
                self.capabilities
                    .iter()
                    .find_map(|capability| capability.find(name))
            })
    }

    /// Resolves the accessor for `name`.
    ///
    /// # Errors
    /// - Returns `UnboundProperty` naming this entity when no table has it.
    pub fn bind(&self, name: &str) -> FieldResult<Property<T>> {
        self.find(name)
            .cloned()
            .ok_or_else(|| FieldError::UnboundProperty {
                entity: self.entity.clone(),
                property: name.to_string(),
            })
    }
}

/// One schema row: metadata, its accessor and its value coercion.
pub struct SchemaEntry<T> {
    field_type: FieldType,
    property: Property<T>,
    coercion: Coercion,
}

impl<T> SchemaEntry<T> {
    pub fn field_type(&self) -> &FieldType {
        &self.field_type
    }

    pub fn coercion(&self) -> Coercion {
        self.coercion
    }
}

/// Fixed, ordered set of field types for one entity.
pub struct Schema<T> {
    properties: Arc<PropertyTable<T>>,
    entries: Vec<SchemaEntry<T>>,
    names: HashSet<String>,
}

impl<T> Schema<T> {
    pub fn new(properties: Arc<PropertyTable<T>>) -> Self {
        Self {
            properties,
            entries: Vec::new(),
            names: HashSet::new(),
        }
    }

    /// Adds a field read and written without coercion.
    pub fn add(self, field_type: FieldType) -> FieldResult<Self> {
        self.add_coerced(field_type, Coercion::Plain)
    }

    /// Adds a field and binds it to its accessor.
    ///
    /// # Errors
    /// - `DuplicateField` when the name is already in the schema.
    /// - `UnboundProperty` when no accessor has the field's name.
    pub fn add_coerced(mut self, field_type: FieldType, coercion: Coercion) -> FieldResult<Self> {
        if self.names.contains(field_type.name()) {
            return Err(FieldError::DuplicateField(field_type.name().to_string()));
        }
        let property = self.properties.bind(field_type.name())?;
        self.names.insert(field_type.name().to_string());
        self.entries.push(SchemaEntry {
            field_type,
            property,
            coercion,
        });
        Ok(self)
    }

    pub fn entity(&self) -> &str {
        self.properties.entity()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[SchemaEntry<T>] {
        &self.entries
    }

    pub fn field_types(&self) -> impl Iterator<Item = &FieldType> + '_ {
        self.entries.iter().map(|entry| &entry.field_type)
    }

    pub fn find(&self, name: &str) -> Option<&SchemaEntry<T>> {
        self.entries
            .iter()
            .find(|entry| entry.field_type.name() == name)
    }

    /// Builds a live field over `target`.
    ///
    /// Fields with a storage unit get a unit strategy whose working unit
    /// starts at the storage unit.
    pub fn field(
        &self,
        name: &str,
        target: Target<T>,
        units: &UnitCatalog,
    ) -> FieldResult<Field<T>> {
        let entry = self
            .find(name)
            .ok_or_else(|| FieldError::UnboundProperty {
                entity: self.entity().to_string(),
                property: name.to_string(),
            })?;
        let field = Field::new(entry.field_type.clone(), entry.property.clone(), target)
            .with_coercion(entry.coercion);
        if entry.field_type.is_unitized() {
            return field.with_units(units);
        }
        Ok(field)
    }
}

/// Entity that exposes its properties through a fixed schema.
pub trait Editable: Sized + Send + Sync + 'static {
    fn schema(labels: &dyn LabelLookup) -> FieldResult<Schema<Self>>;

    /// Field types in schema order.
    fn supported_fields(labels: &dyn LabelLookup) -> FieldResult<Vec<FieldType>> {
        Ok(Self::schema(labels)?.field_types().cloned().collect())
    }

    fn field(
        name: &str,
        target: Target<Self>,
        labels: &dyn LabelLookup,
        units: &UnitCatalog,
    ) -> FieldResult<Field<Self>> {
        Self::schema(labels)?.field(name, target, units)
    }
}

#[cfg(test)]
mod tests {
    use super::{Property, PropertyTable, Schema};
    use crate::field::{FieldError, FieldType, FieldValue, ValueRepr};
    use crate::text::TextCatalog;
    use std::sync::Arc;

    #[derive(Debug, Default)]
    struct Pump {
        id: i64,
        tag: String,
    }

    fn identified() -> Arc<PropertyTable<Pump>> {
        Arc::new(PropertyTable::new("Identified").with(Property::read_only("Id", |pump: &Pump| {
            FieldValue::Integer(pump.id)
        })))
    }

    fn pump_table() -> Arc<PropertyTable<Pump>> {
        Arc::new(
            PropertyTable::new("Pump")
                .with(Property::read_write(
                    "Tag",
                    |pump: &Pump| FieldValue::from(pump.tag.as_str()),
                    |pump: &mut Pump, value| {
                        pump.tag = value
                            .into_text()
                            .ok_or_else(|| FieldError::TypeMismatch {
                                field: "Tag".to_string(),
                                expected: "text",
                                found: "other",
                            })?;
                        Ok(())
                    },
                ))
                .with(Property::read_only("Id", |_: &Pump| FieldValue::Integer(-1)))
                .with_capability(identified()),
        )
    }

    #[test]
    fn own_properties_shadow_capabilities() {
        let table = pump_table();
        let pump = Pump { id: 5, tag: String::new() };
        let id = table.bind("Id").unwrap();
        assert_eq!(id.get(&pump), FieldValue::Integer(-1));
    }

    #[test]
    fn capability_properties_are_found_after_own() {
        let table = Arc::new(PropertyTable::new("Pump").with_capability(identified()));
        let pump = Pump { id: 5, tag: String::new() };
        assert_eq!(table.bind("Id").unwrap().get(&pump), FieldValue::Integer(5));
        assert_eq!(
            table.bind("Flow").unwrap_err(),
            FieldError::UnboundProperty {
                entity: "Pump".to_string(),
                property: "Flow".to_string(),
            }
        );
    }

    #[test]
    fn schema_rejects_duplicates_and_unbound_names() {
        let labels = TextCatalog::new();
        let tag = FieldType::builder("Tag", ValueRepr::Text).build(&labels).unwrap();
        let flow = FieldType::builder("Flow", ValueRepr::Double).build(&labels).unwrap();

        let schema = Schema::new(pump_table()).add(tag.clone()).unwrap();
        assert_eq!(schema.len(), 1);
        assert!(matches!(
            Schema::new(pump_table()).add(tag.clone()).unwrap().add(tag),
            Err(FieldError::DuplicateField(name)) if name == "Tag"
        ));
        assert!(matches!(
            schema.add(flow),
            Err(FieldError::UnboundProperty { .. })
        ));
    }
}
