//! Constructed objects
//!
//! An [`Instance`] owns its raw values (one entry per property that holds a
//! value) and the attributes produced by its base constructor. Named access
//! goes through the accessor chain of the instance's class; raw access does
//! not.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::accessor::{GetterNext, SetterNext};
use crate::collection::PropertyCollection;
use crate::error::{AssignmentError, PropertyError};
use crate::ids::{ClassId, InstanceId};
use crate::property::Property;
use crate::registry::Registry;
use crate::value::{Map, Value};

pub struct Instance {
    id: InstanceId,
    class: ClassId,
    class_name: String,
    registry: Registry,
    values: HashMap<String, Value>,
    attributes: Map<String, Value>,
}

impl Instance {
    pub(crate) fn new(registry: Registry, class: ClassId, class_name: String) -> Self {
        Self {
            id: InstanceId::new(),
            class,
            class_name,
            registry,
            values: HashMap::new(),
            attributes: Map::new(),
        }
    }

    // =========================================================================
    // Identity
    // =========================================================================

    #[inline]
    pub fn id(&self) -> InstanceId {
        self.id
    }

    #[inline]
    pub fn class(&self) -> ClassId {
        self.class
    }

    #[inline]
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// The class's current effective collection.
    pub fn properties(&self) -> Arc<PropertyCollection> {
        self.registry.effective(self.class).unwrap_or_default()
    }

    pub fn has_property(&self, name: &str) -> bool {
        self.registry
            .effective(self.class)
            .is_some_and(|collection| collection.contains(name))
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Read `name` through the getter chain, `instance[name]` included.
    ///
    /// `None` when the property is unset or the class has no such property.
    pub fn get(&self, name: &str) -> Option<Value> {
        let chain = self.registry.getter_chain(self.class, name)?;
        GetterNext::new(name, &chain).get(self)
    }

    /// Write `name` through the setter chain, `instance[name] = value` included.
    ///
    /// Validation is fail-fast: on error the stored value is unchanged.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<(), PropertyError> {
        let (property, chain) = self
            .registry
            .setter_chain(self.class, name)
            .ok_or_else(|| PropertyError::unknown_property(&self.class_name, name))?;
        SetterNext::new(&property, &chain).set(self, value.into())
    }

    /// The stored value, bypassing getter overrides
    pub fn raw(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Store `value` without conversion or acceptance checks, returning the
    /// previous raw value. Null clears the entry.
    pub fn write_raw(
        &mut self,
        name: &str,
        value: impl Into<Value>,
    ) -> Result<Option<Value>, PropertyError> {
        if !self.has_property(name) {
            return Err(PropertyError::unknown_property(&self.class_name, name));
        }
        let value = value.into();
        if value.is_null() {
            return Ok(self.values.remove(name));
        }
        Ok(self.values.insert(name.to_string(), value))
    }

    /// Attribute kept by the base constructor
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    // =========================================================================
    // Storage used by the initializer and the generated setter
    // =========================================================================

    pub(crate) fn store(&mut self, name: &str, value: Value) {
        trace!(class = %self.class_name, property = name, "Stored value");
        self.values.insert(name.to_string(), value);
    }

    pub(crate) fn set_attributes(&mut self, attributes: Map<String, Value>) {
        self.attributes = attributes;
    }

    /// The generated setter: convert, check, store.
    pub(crate) fn assign(
        &mut self,
        property: &Property,
        value: Value,
    ) -> Result<(), PropertyError> {
        if !property.is_writable() {
            return Err(AssignmentError::ReadOnly {
                class: self.class_name.clone(),
                property: property.name().to_string(),
                value,
            }
            .into());
        }

        let prepared = property.prepare(value, self)?;
        if prepared.is_null() {
            if property.required_for(self) {
                return Err(AssignmentError::Missing {
                    class: self.class_name.clone(),
                    property: property.name().to_string(),
                }
                .into());
            }
            trace!(class = %self.class_name, property = property.name(), "Cleared value");
            self.values.remove(property.name());
            return Ok(());
        }

        self.store(property.name(), prepared);
        Ok(())
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("id", &self.id)
            .field("class", &self.class_name)
            .field("values", &self.values)
            .field("attributes", &self.attributes)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::initializer::Arguments;
    use crate::property::{Accepter, PropertyOptions};
    use crate::value::ValueKind;
    use serde_json::json;

    fn article() -> (Registry, ClassId) {
        let registry = Registry::new();
        let article = registry.define_class("Article", None).unwrap();
        registry
            .declare(
                article,
                "title",
                PropertyOptions::new()
                    .required(true)
                    .accepts(Accepter::kind(ValueKind::String)),
            )
            .unwrap();
        registry
            .declare(
                article,
                "slug",
                PropertyOptions::new().converts(|v| match v {
                    Value::String(s) => Value::String(s.to_lowercase().replace(' ', "-")),
                    other => other,
                }),
            )
            .unwrap();
        registry
            .declare(article, "id", PropertyOptions::new().read_only())
            .unwrap();
        (registry, article)
    }

    #[test]
    fn setter_converts_and_stores() {
        let (registry, class) = article();
        let mut instance = registry
            .instantiate(class, Arguments::new().keyword("title", "Hello"))
            .unwrap();

        instance.set("slug", "Hello World").unwrap();
        assert_eq!(instance.get("slug"), Some(json!("hello-world")));
        assert_eq!(instance.raw("slug"), Some(&json!("hello-world")));
    }

    #[test]
    fn setter_rejection_keeps_previous_value() {
        let (registry, class) = article();
        let mut instance = registry
            .instantiate(class, Arguments::new().keyword("title", "Hello"))
            .unwrap();

        let err = instance.set("title", 42).unwrap_err();
        match err {
            PropertyError::Assignment(AssignmentError::Rejected { property, value, .. }) => {
                assert_eq!(property, "title");
                assert_eq!(value, json!(42));
            }
            other => panic!("Expected Rejected, got {:?}", other),
        }
        assert_eq!(instance.get("title"), Some(json!("Hello")));
    }

    #[test]
    fn null_on_required_property_is_refused() {
        let (registry, class) = article();
        let mut instance = registry
            .instantiate(class, Arguments::new().keyword("title", "Hello"))
            .unwrap();

        let err = instance.set("title", Value::Null).unwrap_err();
        assert!(matches!(
            err,
            PropertyError::Assignment(AssignmentError::Missing { .. })
        ));
        assert_eq!(instance.get("title"), Some(json!("Hello")));

        instance.set("slug", "x").unwrap();
        instance.set("slug", Value::Null).unwrap();
        assert_eq!(instance.get("slug"), None);
    }

    #[test]
    fn read_only_property_is_set_at_construction_only() {
        let (registry, class) = article();
        let mut instance = registry
            .instantiate(
                class,
                Arguments::new().keyword("title", "Hello").keyword("id", 7),
            )
            .unwrap();
        assert_eq!(instance.get("id"), Some(json!(7)));

        let err = instance.set("id", 8).unwrap_err();
        assert!(err.to_string().contains("read-only"));

        // raw writes bypass the setter
        assert_eq!(instance.write_raw("id", 8).unwrap(), Some(json!(7)));
        assert_eq!(instance.get("id"), Some(json!(8)));
    }

    #[test]
    fn unknown_names() {
        let (registry, class) = article();
        let mut instance = registry
            .instantiate(class, Arguments::new().keyword("title", "Hello"))
            .unwrap();

        assert_eq!(instance.get("colour"), None);
        assert!(!instance.has_property("colour"));
        assert_eq!(
            instance.set("colour", "red").unwrap_err(),
            PropertyError::unknown_property("Article", "colour")
        );
        assert!(instance.write_raw("colour", "red").is_err());
    }

    #[test]
    fn instance_exposes_identity() {
        let (registry, class) = article();
        let instance = registry
            .instantiate(class, Arguments::new().keyword("title", "Hello"))
            .unwrap();
        assert_eq!(instance.class(), class);
        assert_eq!(instance.class_name(), "Article");
        assert_eq!(
            instance.properties().keys().collect::<Vec<_>>(),
            vec!["title", "slug", "id"]
        );
        assert!(format!("{:?}", instance).contains("Article"));
    }
}
