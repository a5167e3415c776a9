//! # Mapping Property
//!
//! `MapProp` validates keys and values independently. Either side may be
//! left unconfigured, in which case that side passes through untouched.
//! Serialization renders keys as object keys; a rendered key that is not
//! a scalar, or two distinct keys collapsing to one rendered key, is a
//! serialization error naming the offender.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use attrix_core::{
    render_key, ConfigError, HostRef, Json, PropDefault, PropError, SerializationError,
    ValidationError, Value,
};

use crate::adapter::{resolve_item, ItemType};
use crate::property::{DeserializeOptions, Deserializer, Property, SerializeOptions, Serializer};
use crate::support::{bounds_text, check_bounds, config_bounds, json_kind_name};

/// Property for key-value mappings with independent key and value
/// validators.
pub struct MapProp {
    name: String,
    doc: String,
    key: Option<Box<dyn Property>>,
    value: Option<Box<dyn Property>>,
    min_length: Option<usize>,
    max_length: Option<usize>,
    observe_mutations: bool,
    serializer: Option<Serializer>,
    deserializer: Option<Deserializer>,
    default: PropDefault,
}

impl fmt::Debug for MapProp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapProp")
            .field("name", &self.name)
            .field("key", &self.key)
            .field("value", &self.value)
            .field("min_length", &self.min_length)
            .field("max_length", &self.max_length)
            .field("observe_mutations", &self.observe_mutations)
            .finish_non_exhaustive()
    }
}

impl MapProp {
    /// Declare a mapping property with no key or value transformation.
    pub fn new(doc: impl Into<String>) -> Self {
        Self {
            name: String::new(),
            doc: doc.into(),
            key: None,
            value: None,
            min_length: None,
            max_length: None,
            observe_mutations: false,
            serializer: None,
            deserializer: None,
            default: PropDefault::Undefined,
        }
    }

    /// Configure the key validator.
    pub fn with_key(mut self, item: ItemType) -> Self {
        self.key = Some(resolve_item(item));
        self
    }

    /// Configure the value validator.
    pub fn with_value(mut self, item: ItemType) -> Self {
        self.value = Some(resolve_item(item));
        self
    }

    /// Configure the minimum valid entry count, inclusive.
    pub fn with_min_length(mut self, min: usize) -> Result<Self, ConfigError> {
        config_bounds(Some(min), self.max_length)?;
        self.min_length = Some(min);
        Ok(self)
    }

    /// Configure the maximum valid entry count, inclusive.
    pub fn with_max_length(mut self, max: usize) -> Result<Self, ConfigError> {
        config_bounds(self.min_length, Some(max))?;
        self.max_length = Some(max);
        Ok(self)
    }

    /// Route in-place mutations of validated values through the owner.
    pub fn with_observe_mutations(mut self, observe: bool) -> Self {
        self.observe_mutations = observe;
        self
    }

    /// Override serialization.
    pub fn with_serializer(mut self, serializer: Serializer) -> Self {
        self.serializer = Some(serializer);
        self
    }

    /// Override deserialization.
    pub fn with_deserializer(mut self, deserializer: Deserializer) -> Self {
        self.deserializer = Some(deserializer);
        self
    }

    /// Configure a default value.
    pub fn with_default(mut self, value: Value) -> Self {
        self.default = PropDefault::Value(value);
        self
    }

    /// The key validator, if configured.
    pub fn key(&self) -> Option<&dyn Property> {
        self.key.as_deref()
    }

    /// The value validator, if configured.
    pub fn value(&self) -> Option<&dyn Property> {
        self.value.as_deref()
    }

    /// Whether mutation observation is enabled.
    pub fn observe_mutations(&self) -> bool {
        self.observe_mutations
    }

    fn wrong_kind(&self, value: &Value) -> ValidationError {
        ValidationError::WrongKind {
            property: self.name.clone(),
            expected: "a mapping".into(),
            actual: value.kind().name().into(),
        }
    }

    /// Generic export with no validator context: entity values are
    /// serialized, other values pass through; keys are never transformed
    /// beyond object-key rendering.
    pub fn to_json(value: &Value) -> Result<Json, SerializationError> {
        match value {
            Value::Map(_) => value.to_plain(),
            _ => Err(SerializationError::Unexportable {
                reason: format!("expected a mapping, got {}", value.kind().name()),
            }),
        }
    }

    /// Generic import with no validator context: a text-keyed mapping of
    /// raw values.
    pub fn from_json(json: &Json) -> Result<Value, SerializationError> {
        match json {
            Json::Object(_) => Ok(Value::from_plain(json)),
            _ => Err(SerializationError::Unexportable {
                reason: format!("expected an object, got {}", json_kind_name(json)),
            }),
        }
    }
}

impl Property for MapProp {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: &str) {
        // Both side validators inherit the container's name.
        if let Some(key) = self.key.as_mut() {
            key.set_name(name);
        }
        if let Some(value) = self.value.as_mut() {
            value.set_name(name);
        }
        self.name = name.to_string();
    }

    fn doc(&self) -> &str {
        &self.doc
    }

    fn info(&self) -> String {
        let mut text = String::from("a mapping");
        match (
            self.key.as_ref().map(|p| p.info()),
            self.value.as_ref().map(|p| p.info()),
        ) {
            (Some(key), Some(value)) => {
                text.push_str(&format!(" (keys: {key}; values: {value})"));
            }
            (Some(key), None) => text.push_str(&format!(" (keys: {key})")),
            (None, Some(value)) => text.push_str(&format!(" (values: {value})")),
            (None, None) => {}
        }
        match bounds_text(self.min_length, self.max_length) {
            Some(bounds) => format!("{text} with {bounds}"),
            None => text,
        }
    }

    fn default(&self) -> &PropDefault {
        &self.default
    }

    fn validate(&self, host: Option<&HostRef>, value: Value) -> Result<Value, ValidationError> {
        let entries = match &value {
            Value::Map(map) => map.entries(),
            _ => return Err(self.wrong_kind(&value)),
        };
        let mut out: IndexMap<Value, Value> = IndexMap::with_capacity(entries.len());
        for (key, val) in entries {
            let key = match &self.key {
                Some(prop) => {
                    prop.validate(host, key.clone())
                        .map_err(|source| ValidationError::InvalidKey {
                            property: self.name.clone(),
                            key: key.to_string(),
                            source: Box::new(source),
                        })?
                }
                None => key,
            };
            let val = match &self.value {
                Some(prop) => {
                    prop.validate(host, val)
                        .map_err(|source| ValidationError::InvalidValue {
                            property: self.name.clone(),
                            key: key.to_string(),
                            source: Box::new(source),
                        })?
                }
                None => val,
            };
            out.insert(key, val);
        }
        check_bounds(&self.name, out.len(), self.min_length, self.max_length)?;
        let out = Value::map(out);
        if self.observe_mutations {
            if let (Some(host), Value::Map(map)) = (host, &out) {
                map.attach(Rc::clone(host), self.name.as_str());
            }
        }
        Ok(out)
    }

    fn assert_valid(&self, host: Option<&HostRef>, value: &Value) -> Result<(), ValidationError> {
        let map = value.as_map().ok_or_else(|| self.wrong_kind(value))?;
        check_bounds(&self.name, map.len(), self.min_length, self.max_length)?;
        if self.key.is_none() && self.value.is_none() {
            return Ok(());
        }
        for (key, val) in map.entries() {
            if let Some(prop) = &self.key {
                prop.assert_valid(host, &key)
                    .map_err(|source| ValidationError::InvalidKey {
                        property: self.name.clone(),
                        key: key.to_string(),
                        source: Box::new(source),
                    })?;
            }
            if let Some(prop) = &self.value {
                prop.assert_valid(host, &val)
                    .map_err(|source| ValidationError::InvalidValue {
                        property: self.name.clone(),
                        key: key.to_string(),
                        source: Box::new(source),
                    })?;
            }
        }
        Ok(())
    }

    fn serialize(&self, value: &Value, opts: &SerializeOptions) -> Result<Json, SerializationError> {
        if let Some(custom) = &self.serializer {
            return custom(value, opts);
        }
        let map = value
            .as_map()
            .ok_or_else(|| SerializationError::UnexpectedShape {
                property: self.name.clone(),
                expected: "a mapping".into(),
                found: value.kind().name().into(),
            })?;
        let mut out = serde_json::Map::new();
        for (key, val) in map.entries() {
            let serial_key = match &self.key {
                Some(prop) => prop.serialize(&key, opts)?,
                None => key.to_plain()?,
            };
            let rendered =
                render_key(&serial_key).ok_or_else(|| SerializationError::UnkeyableKey {
                    property: self.name.clone(),
                    key: key.to_string(),
                })?;
            let serial_val = match &self.value {
                Some(prop) => prop.serialize(&val, opts)?,
                None => val.to_plain()?,
            };
            if out.insert(rendered.clone(), serial_val).is_some() {
                return Err(SerializationError::KeyCollision {
                    property: self.name.clone(),
                    key: rendered,
                });
            }
        }
        Ok(Json::Object(out))
    }

    fn deserialize(&self, json: &Json, opts: &DeserializeOptions) -> Result<Value, PropError> {
        if let Some(custom) = &self.deserializer {
            return custom(json, opts);
        }
        let Json::Object(entries) = json else {
            return Err(SerializationError::UnexpectedShape {
                property: self.name.clone(),
                expected: "an object".into(),
                found: json_kind_name(json).into(),
            }
            .into());
        };
        let mut out: IndexMap<Value, Value> = IndexMap::with_capacity(entries.len());
        for (key_text, val_json) in entries {
            let key = match &self.key {
                Some(prop) => prop.deserialize(&Json::String(key_text.clone()), opts)?,
                None => Value::Text(key_text.clone()),
            };
            let val = match &self.value {
                Some(prop) => prop.deserialize(val_json, opts)?,
                None => Value::from_plain(val_json),
            };
            out.insert(key, val);
        }
        if !opts.trusted {
            check_bounds(&self.name, out.len(), self.min_length, self.max_length)?;
        }
        Ok(Value::map(out))
    }

    /// Equal size, exact key match, value-validator equality per entry.
    /// Keys are never fuzzy-matched.
    fn equal(&self, a: &Value, b: &Value) -> bool {
        let (Some(map_a), Some(map_b)) = (a.as_map(), b.as_map()) else {
            return false;
        };
        if map_a.len() != map_b.len() {
            return false;
        }
        for (key, val_a) in map_a.entries() {
            let Some(val_b) = map_b.get(&key) else {
                return false;
            };
            let values_equal = match &self.value {
                Some(prop) => prop.equal(&val_a, &val_b),
                None => val_a == val_b,
            };
            if !values_equal {
                return false;
            }
        }
        true
    }
}
