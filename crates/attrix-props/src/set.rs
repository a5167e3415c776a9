//! # Set Property
//!
//! `SetProp` validates an unordered unique collection. Construction and
//! coercion collapse duplicates silently — only post-dedup bound
//! violations are errors. Equality is an unordered multiset match driven
//! by the element validator, worst case O(n²); container properties are
//! expected to hold small collections.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexSet;

use attrix_core::{
    ConfigError, HostRef, Json, PropDefault, PropError, SerializationError, ValidationError, Value,
};

use crate::adapter::{resolve_item, ItemType};
use crate::property::{DeserializeOptions, Deserializer, Property, SerializeOptions, Serializer};
use crate::support::{bounds_text, check_bounds, config_bounds, json_kind_name};

/// Property for unordered unique collections with one element validator.
pub struct SetProp {
    name: String,
    doc: String,
    item: Box<dyn Property>,
    min_length: Option<usize>,
    max_length: Option<usize>,
    coerce: bool,
    observe_mutations: bool,
    serializer: Option<Serializer>,
    deserializer: Option<Deserializer>,
    default: PropDefault,
}

impl fmt::Debug for SetProp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SetProp")
            .field("name", &self.name)
            .field("item", &self.item)
            .field("min_length", &self.min_length)
            .field("max_length", &self.max_length)
            .field("coerce", &self.coerce)
            .field("observe_mutations", &self.observe_mutations)
            .finish_non_exhaustive()
    }
}

impl SetProp {
    /// Declare a set property over an element type.
    pub fn new(doc: impl Into<String>, item: ItemType) -> Self {
        Self {
            name: String::new(),
            doc: doc.into(),
            item: resolve_item(item),
            min_length: None,
            max_length: None,
            coerce: false,
            observe_mutations: false,
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

    /// Configure coercion of non-set inputs.
    pub fn with_coerce(mut self, coerce: bool) -> Self {
        self.coerce = coerce;
        self
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

    /// The element validator.
    pub fn item(&self) -> &dyn Property {
        self.item.as_ref()
    }

    /// Whether mutation observation is enabled.
    pub fn observe_mutations(&self) -> bool {
        self.observe_mutations
    }

    fn collect_items(&self, value: &Value) -> Option<Vec<Value>> {
        match value {
            Value::Set(set) => Some(set.items()),
            Value::Seq(seq) if self.coerce => Some(seq.items()),
            _ if self.coerce => Some(vec![value.clone()]),
            _ => None,
        }
    }

    fn wrong_kind(&self, value: &Value) -> ValidationError {
        ValidationError::WrongKind {
            property: self.name.clone(),
            expected: "a set".into(),
            actual: value.kind().name().into(),
        }
    }

    /// Generic export with no validator context.
    pub fn to_json(value: &Value) -> Result<Json, SerializationError> {
        match value {
            Value::Set(_) => value.to_plain(),
            _ => Err(SerializationError::Unexportable {
                reason: format!("expected a set, got {}", value.kind().name()),
            }),
        }
    }

    /// Generic import with no validator context: the result is a set of
    /// raw values, duplicates collapsed on import.
    pub fn from_json(json: &Json) -> Result<Value, SerializationError> {
        match json {
            Json::Array(items) => Ok(Value::set(items.iter().map(Value::from_plain))),
            _ => Err(SerializationError::Unexportable {
                reason: format!("expected an array, got {}", json_kind_name(json)),
            }),
        }
    }
}

impl Property for SetProp {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: &str) {
        self.item.set_name(name);
        self.name = name.to_string();
    }

    fn doc(&self) -> &str {
        &self.doc
    }

    fn info(&self) -> String {
        let mut text = String::from("a set");
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
        let mut out: IndexSet<Value> = IndexSet::with_capacity(items.len());
        for (index, item) in items.into_iter().enumerate() {
            let validated =
                self.item
                    .validate(host, item)
                    .map_err(|source| ValidationError::InvalidItem {
                        property: self.name.clone(),
                        index,
                        source: Box::new(source),
                    })?;
            out.insert(validated);
        }
        // Bounds apply to the deduplicated result; collapsing duplicates
        // is not an error.
        check_bounds(&self.name, out.len(), self.min_length, self.max_length)?;
        let out = Value::set(out);
        if self.observe_mutations {
            if let (Some(host), Value::Set(set)) = (host, &out) {
                set.attach(Rc::clone(host), self.name.as_str());
            }
        }
        Ok(out)
    }

    fn assert_valid(&self, host: Option<&HostRef>, value: &Value) -> Result<(), ValidationError> {
        let set = value.as_set().ok_or_else(|| self.wrong_kind(value))?;
        check_bounds(&self.name, set.len(), self.min_length, self.max_length)?;
        for (index, item) in set.items().iter().enumerate() {
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
        let set = value
            .as_set()
            .ok_or_else(|| SerializationError::UnexpectedShape {
                property: self.name.clone(),
                expected: "a set".into(),
                found: value.kind().name().into(),
            })?;
        let items: Result<Vec<Json>, _> = set
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
        let mut out: IndexSet<Value> = IndexSet::with_capacity(items.len());
        for item in items {
            out.insert(self.item.deserialize(item, opts)?);
        }
        if !opts.trusted {
            check_bounds(&self.name, out.len(), self.min_length, self.max_length)?;
        }
        Ok(Value::set(out))
    }

    /// Unordered multiset match: every element of `a` consumes one
    /// validator-equal element of `b`.
    fn equal(&self, a: &Value, b: &Value) -> bool {
        let (Some(set_a), Some(set_b)) = (a.as_set(), b.as_set()) else {
            return false;
        };
        if set_a.len() != set_b.len() {
            return false;
        }
        let mut remaining = set_b.items();
        'items: for item_a in set_a.items() {
            for (index, item_b) in remaining.iter().enumerate() {
                if self.item.equal(&item_a, item_b) {
                    remaining.swap_remove(index);
                    continue 'items;
                }
            }
            return false;
        }
        remaining.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scalar::IntProp;

    fn int_set() -> SetProp {
        SetProp::new("tags", ItemType::prop(IntProp::new("")))
    }

    #[test]
    fn test_validate_collapses_duplicates() {
        let prop = int_set().with_coerce(true);
        let out = prop
            .validate(None, Value::seq([1.into(), 1.into(), 2.into()]))
            .unwrap();
        assert_eq!(out.as_set().unwrap().len(), 2);
    }

    #[test]
    fn test_coerces_scalar_to_singleton() {
        let prop = int_set().with_coerce(true);
        let out = prop.validate(None, 5.into()).unwrap();
        let set = out.as_set().unwrap();
        assert_eq!(set.len(), 1);
        assert!(set.contains(&5.into()));
    }

    #[test]
    fn test_wrong_kind_without_coercion() {
        let prop = int_set();
        assert!(prop.validate(None, Value::seq([1.into()])).is_err());
        assert!(prop.validate(None, 5.into()).is_err());
        assert!(prop.validate(None, Value::set([1.into()])).is_ok());
    }

    #[test]
    fn test_bounds_apply_post_dedup() {
        let prop = int_set().with_coerce(true).with_min_length(2).unwrap();
        // Three raw items, two after dedup: meets min 2.
        assert!(prop
            .validate(None, Value::seq([1.into(), 1.into(), 2.into()]))
            .is_ok());
        // Two raw items, one after dedup: violates min 2.
        assert!(prop
            .validate(None, Value::seq([1.into(), 1.into()]))
            .is_err());
    }

    #[test]
    fn test_equal_is_unordered() {
        let prop = int_set();
        let a = Value::set([1.into(), 2.into(), 3.into()]);
        let b = Value::set([3.into(), 2.into(), 1.into()]);
        assert!(prop.equal(&a, &b));
        assert!(!prop.equal(&a, &Value::set([1.into(), 2.into()])));
        assert!(!prop.equal(&a, &Value::set([1.into(), 2.into(), 9.into()])));
    }

    #[test]
    fn test_round_trip() {
        let prop = int_set();
        let value = prop
            .validate(None, Value::set([1.into(), 2.into()]))
            .unwrap();
        let plain = prop.serialize(&value, &SerializeOptions::default()).unwrap();
        let back = prop
            .deserialize(&plain, &DeserializeOptions::default())
            .unwrap();
        assert!(prop.equal(&value, &back));
    }

    #[test]
    fn test_item_failure_cites_position() {
        let prop = int_set();
        let err = prop
            .validate(None, Value::set(["x".into(), 1.into()]))
            .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidItem { .. }));
    }

    #[test]
    fn test_generic_import_dedups() {
        let back = SetProp::from_json(&serde_json::json!([1, 1, 2])).unwrap();
        assert_eq!(back.as_set().unwrap().len(), 2);
    }
}
