//! # Class Declarations
//!
//! `HostClass` is a named, ordered table of properties, built once through
//! its builder and immutable afterwards. Property names are bound at build
//! time — the single place a validator's `name` is ever set.

use std::rc::{Rc, Weak};

use indexmap::IndexMap;

use attrix_core::{ConfigError, Json, PropError, SerializationError, Value};
use attrix_props::{ClassRef, DeserializeOptions, EntityClass, ItemType, Property};

use crate::entity::Entity;

/// A declared class of host objects.
#[derive(Debug)]
pub struct HostClass {
    name: String,
    props: IndexMap<String, Rc<dyn Property>>,
    self_ref: Weak<HostClass>,
}

impl HostClass {
    /// Start declaring a class.
    pub fn builder(name: impl Into<String>) -> HostClassBuilder {
        HostClassBuilder {
            name: name.into(),
            props: IndexMap::new(),
        }
    }

    /// The declared class name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up a declared property by attribute name.
    pub fn property(&self, name: &str) -> Option<&Rc<dyn Property>> {
        self.props.get(name)
    }

    /// Iterate the declared properties in declaration order.
    pub fn properties(&self) -> impl Iterator<Item = (&str, &Rc<dyn Property>)> {
        self.props.iter().map(|(name, prop)| (name.as_str(), prop))
    }

    /// A class as an element declaration for container properties.
    pub fn as_item(class: &Rc<HostClass>) -> ItemType {
        ItemType::class(Rc::clone(class) as ClassRef)
    }
}

impl EntityClass for HostClass {
    fn name(&self) -> &str {
        &self.name
    }

    fn deserialize_entity(
        &self,
        json: &Json,
        opts: &DeserializeOptions,
    ) -> Result<Value, PropError> {
        let class = self.self_ref.upgrade().ok_or_else(|| {
            SerializationError::Unexportable {
                reason: format!("class '{}' declaration is no longer alive", self.name),
            }
        })?;
        let entity = Entity::deserialize(class, json, opts)?;
        Ok(Value::Entity(entity.host_ref()))
    }
}

/// Builder for a [`HostClass`].
#[derive(Debug)]
pub struct HostClassBuilder {
    name: String,
    props: IndexMap<String, Box<dyn Property>>,
}

impl HostClassBuilder {
    /// Declare a property under an attribute name. The property's `name`
    /// is bound here, once.
    pub fn prop(
        self,
        name: impl Into<String>,
        prop: impl Property + 'static,
    ) -> Result<Self, ConfigError> {
        self.prop_boxed(name, Box::new(prop))
    }

    /// Declare an already-boxed property under an attribute name.
    pub fn prop_boxed(
        mut self,
        name: impl Into<String>,
        mut prop: Box<dyn Property>,
    ) -> Result<Self, ConfigError> {
        let name = name.into();
        if self.props.contains_key(&name) {
            return Err(ConfigError::DuplicateProperty {
                class: self.name,
                property: name,
            });
        }
        prop.set_name(&name);
        self.props.insert(name, prop);
        Ok(self)
    }

    /// Finish the declaration.
    pub fn build(self) -> Rc<HostClass> {
        let name = self.name;
        let props: IndexMap<String, Rc<dyn Property>> = self
            .props
            .into_iter()
            .map(|(key, prop)| (key, Rc::from(prop)))
            .collect();
        Rc::new_cyclic(|self_ref| HostClass {
            name,
            props,
            self_ref: self_ref.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use attrix_props::IntProp;

    #[test]
    fn test_builder_binds_names_in_order() {
        let class = HostClass::builder("Point")
            .prop("x", IntProp::new("x coordinate"))
            .unwrap()
            .prop("y", IntProp::new("y coordinate"))
            .unwrap()
            .build();
        assert_eq!(class.name(), "Point");
        let names: Vec<&str> = class.properties().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["x", "y"]);
        assert_eq!(class.property("x").unwrap().name(), "x");
        assert!(class.property("z").is_none());
    }

    #[test]
    fn test_duplicate_property_is_fatal() {
        let err = HostClass::builder("Point")
            .prop("x", IntProp::new(""))
            .unwrap()
            .prop("x", IntProp::new(""))
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::DuplicateProperty {
                class: "Point".into(),
                property: "x".into(),
            }
        );
    }
}
