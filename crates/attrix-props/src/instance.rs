//! # Instance-Of Validator
//!
//! Validates that a value is a live entity of a declared class. This is
//! what the element adapter produces for a class reference, and what the
//! container properties drive for entity-valued elements.

use attrix_core::{
    Host, HostRef, Json, PropDefault, PropError, SerializationError, ValidationError, Value,
};

use crate::class::{ClassRef, EntityClass};
use crate::property::{DeserializeOptions, Property, SerializeOptions};

/// A property whose values are entities of one declared class.
#[derive(Debug, Clone)]
pub struct InstanceProp {
    name: String,
    doc: String,
    class: ClassRef,
    default: PropDefault,
}

impl InstanceProp {
    /// Declare an instance property.
    pub fn new(doc: impl Into<String>, class: ClassRef) -> Self {
        Self {
            name: String::new(),
            doc: doc.into(),
            class,
            default: PropDefault::Undefined,
        }
    }

    /// Wrap a bare class reference, as the element adapter does.
    pub fn of(class: ClassRef) -> Self {
        Self::new("", class)
    }

    /// The declared class.
    pub fn class(&self) -> &ClassRef {
        &self.class
    }
}

impl Property for InstanceProp {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    fn doc(&self) -> &str {
        &self.doc
    }

    fn info(&self) -> String {
        format!("an instance of {}", self.class.name())
    }

    fn default(&self) -> &PropDefault {
        &self.default
    }

    fn validate(&self, _host: Option<&HostRef>, value: Value) -> Result<Value, ValidationError> {
        match &value {
            Value::Entity(host) if host.class_name() == self.class.name() => Ok(value),
            _ => Err(self.error(&value, None)),
        }
    }

    fn assert_valid(&self, _host: Option<&HostRef>, value: &Value) -> Result<(), ValidationError> {
        match value {
            Value::Entity(entity) if entity.class_name() == self.class.name() => {
                entity.assert_valid()
            }
            _ => Err(self.error(value, None)),
        }
    }

    fn serialize(&self, value: &Value, opts: &SerializeOptions) -> Result<Json, SerializationError> {
        match value {
            Value::Entity(entity) => entity.export(opts.include_kind),
            _ => Err(SerializationError::UnexpectedShape {
                property: self.name.clone(),
                expected: self.info(),
                found: value.kind().name().into(),
            }),
        }
    }

    fn deserialize(&self, json: &Json, opts: &DeserializeOptions) -> Result<Value, PropError> {
        self.class.deserialize_entity(json, opts)
    }

    fn equal(&self, a: &Value, b: &Value) -> bool {
        match (a, b) {
            (Value::Entity(x), Value::Entity(y)) => {
                if x.host_id() == y.host_id() {
                    return true;
                }
                // Distinct objects compare by their exported state.
                match (x.export(true), y.export(true)) {
                    (Ok(xa), Ok(xb)) => xa == xb,
                    _ => false,
                }
            }
            _ => false,
        }
    }
}
