//! # Fixed-Arity Sequence Property
//!
//! `TupleProp` validates an ordered collection one element at a time and
//! returns a freshly built sequence that never aliases the input. It is
//! the bounded, never-observed sequence flavor; the variable-length,
//! optionally-observed flavor composes it.
//!
//! ## Coercion
//!
//! With coercion off, the raw value must already be a sequence. With
//! coercion on, sequence and set inputs are consumed item-wise and any
//! other value becomes a single-item sequence.

use std::fmt;

use attrix_core::{
    ConfigError, HostRef, Json, PropDefault, PropError, SerializationError, ValidationError, Value,
};

use crate::adapter::{resolve_item, ItemType};
use crate::property::{DeserializeOptions, Deserializer, Property, SerializeOptions, Serializer};
use crate::support::{bounds_text, check_bounds, config_bounds, json_kind_name};

/// Property for ordered collections where each element is validated by a
/// single element validator.
pub struct TupleProp {
    name: String,
    doc: String,
    item: Box<dyn Property>,
    min_length: Option<usize>,
    max_length: Option<usize>,
    coerce: bool,
    serializer: Option<Serializer>,
    deserializer: Option<Deserializer>,
    default: PropDefault,
}

impl fmt::Debug for TupleProp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TupleProp")
            .field("name", &self.name)
            .field("item", &self.item)
            .field("min_length", &self.min_length)
            .field("max_length", &self.max_length)
            .field("coerce", &self.coerce)
            .finish_non_exhaustive()
    }
}

impl TupleProp {
    /// Declare a fixed-arity sequence property over an element type.
    pub fn new(doc: impl Into<String>, item: ItemType) -> Self {
        Self {
            name: String::new(),
            doc: doc.into(),
            item: resolve_item(item),
            min_length: None,
            max_length: None,
            coerce: false,
            serializer: None,
            deserializer: None,
            default: PropDefault::Undefined,
        }
    }

    /// Configure the minimum valid length, inclusive.
    pub fn with_min_length(mut self, min: usize) -> Result<Self, ConfigError> {
        config_bounds(Some(min), self.max_length)?;
        self.min_length = Some(min);
        Ok(self)
    }

    /// Configure the maximum valid length, inclusive.
    pub fn with_max_length(mut self, max: usize) -> Result<Self, ConfigError> {
        config_bounds(self.min_length, Some(max))?;
        self.max_length = Some(max);
        Ok(self)
    }

    /// Configure coercion of non-sequence inputs.
    pub fn with_coerce(mut self, coerce: bool) -> Self {
        self.coerce = coerce;
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

    /// The element validator.
    pub fn item(&self) -> &dyn Property {
        self.item.as_ref()
    }

    /// The configured minimum length.
    pub fn min_length(&self) -> Option<usize> {
        self.min_length
    }

    /// The configured maximum length.
    pub fn max_length(&self) -> Option<usize> {
        self.max_length
    }

    /// Whether coercion is enabled.
    pub fn coerce(&self) -> bool {
        self.coerce
    }

    /// Gather raw items per the coercion rules, or `None` on a kind
    /// mismatch.
    fn collect_items(&self, value: &Value) -> Option<Vec<Value>> {
        match value {
            Value::Seq(seq) => Some(seq.items()),
            Value::Set(set) if self.coerce => Some(set.items()),
            _ if self.coerce => Some(vec![value.clone()]),
            _ => None,
        }
    }

    fn wrong_kind(&self, value: &Value) -> ValidationError {
        ValidationError::WrongKind {
            property: self.name.clone(),
            expected: "a sequence".into(),
            actual: value.kind().name().into(),
        }
    }

    /// Generic export with no validator context: nested entities are
    /// serialized, everything else passes through as plain data.
    pub fn to_json(value: &Value) -> Result<Json, SerializationError> {
        match value {
            Value::Seq(_) => value.to_plain(),
            _ => Err(SerializationError::Unexportable {
                reason: format!("expected a sequence, got {}", value.kind().name()),
            }),
        }
    }

    /// Generic import with no validator context: element types cannot be
    /// reconstructed, so the result is a plain sequence of raw values.
    pub fn from_json(json: &Json) -> Result<Value, SerializationError> {
        match json {
            Json::Array(items) => Ok(Value::seq(items.iter().map(Value::from_plain))),
            _ => Err(SerializationError::Unexportable {
                reason: format!("expected an array, got {}", json_kind_name(json)),
            }),
        }
    }
}

impl Property for TupleProp {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: &str) {
        // The element validator inherits the container's name.
        self.item.set_name(name);
        self.name = name.to_string();
    }

    fn doc(&self) -> &str {
        &self.doc
    }

    fn info(&self) -> String {
        let mut text = String::from("a sequence");
        let item_info = self.item.info();
        if !item_info.is_empty() {
            text.push_str(&format!(" (each item is {item_info})"));
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
        let items = self
            .collect_items(&value)
            .ok_or_else(|| self.wrong_kind(&value))?;
        let mut out = Vec::with_capacity(items.len());
        for (index, item) in items.into_iter().enumerate() {
            let validated =
                self.item
                    .validate(host, item)
                    .map_err(|source| ValidationError::InvalidItem {
                        property: self.name.clone(),
                        index,
                        source: Box::new(source),
                    })?;
            out.push(validated);
        }
        check_bounds(&self.name, out.len(), self.min_length, self.max_length)?;
        Ok(Value::seq(out))
    }

    fn assert_valid(&self, host: Option<&HostRef>, value: &Value) -> Result<(), ValidationError> {
        let seq = value.as_seq().ok_or_else(|| self.wrong_kind(value))?;
        check_bounds(&self.name, seq.len(), self.min_length, self.max_length)?;
        for (index, item) in seq.items().iter().enumerate() {
            self.item
                .assert_valid(host, item)
                .map_err(|source| ValidationError::InvalidItem {
                    property: self.name.clone(),
                    index,
                    source: Box::new(source),
                })?;
        }
        Ok(())
    }

    fn serialize(&self, value: &Value, opts: &SerializeOptions) -> Result<Json, SerializationError> {
        if let Some(custom) = &self.serializer {
            return custom(value, opts);
        }
        let seq = value
            .as_seq()
            .ok_or_else(|| SerializationError::UnexpectedShape {
                property: self.name.clone(),
                expected: "a sequence".into(),
                found: value.kind().name().into(),
            })?;
        let items: Result<Vec<Json>, _> = seq
            .items()
            .iter()
            .map(|item| self.item.serialize(item, opts))
            .collect();
        Ok(Json::Array(items?))
    }

    fn deserialize(&self, json: &Json, opts: &DeserializeOptions) -> Result<Value, PropError> {
        if let Some(custom) = &self.deserializer {
            return custom(json, opts);
        }
        let Json::Array(items) = json else {
            return Err(SerializationError::UnexpectedShape {
                property: self.name.clone(),
                expected: "an array".into(),
                found: json_kind_name(json).into(),
            }
            .into());
        };
        let mut out = Vec::with_capacity(items.len());
        for item in items {
            out.push(self.item.deserialize(item, opts)?);
        }
        if !opts.trusted {
            check_bounds(&self.name, out.len(), self.min_length, self.max_length)?;
        }
        Ok(Value::seq(out))
    }

    fn equal(&self, a: &Value, b: &Value) -> bool {
        let (Some(seq_a), Some(seq_b)) = (a.as_seq(), b.as_seq()) else {
            return false;
        };
        let (items_a, items_b) = (seq_a.items(), seq_b.items());
        items_a.len() == items_b.len()
            && items_a
                .iter()
                .zip(items_b.iter())
                .all(|(x, y)| self.item.equal(x, y))
    }
}
