//! # Dynamic Value Model
//!
//! Defines `Value`, the runtime representation of everything a property can
//! validate, store, compare, or serialize: scalars, ordered sequences,
//! unordered unique sets, key-value mappings, and entity references.
//!
//! ## Design
//!
//! 1. **Total equality and ordering.** `Value` implements `Eq`, `Hash`, and
//!    `Ord` for every variant so any value can live in a set or serve as a
//!    mapping key. Floats compare and hash by bit pattern (`total_cmp`),
//!    the same trade the YAML value model makes.
//!
//! 2. **Container variants are shared handles.** Cloning a `Value::Seq`
//!    aliases the same underlying container. This is what lets a handle
//!    read from an owner slot be the *same* wrapper the owner stores, which
//!    the mutation-observation machinery depends on.
//!
//! 3. **Plain-data bridges.** `to_plain`/`from_plain` convert between
//!    `Value` trees and `serde_json::Value` trees. Export serializes nested
//!    entities; import cannot reconstruct sets or entities and yields only
//!    sequences and text-keyed mappings.

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

use crate::error::SerializationError;
use crate::observe::{Host, HostRef, ObservableMap, ObservableSeq, ObservableSet};

/// Plain nested data handed to an external codec.
pub type Json = serde_json::Value;

/// The outer kind of a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ValueKind {
    /// The null value.
    Null,
    /// A boolean.
    Bool,
    /// A signed integer.
    Int,
    /// A double-precision float.
    Float,
    /// A text string.
    Text,
    /// An ordered sequence.
    Seq,
    /// An unordered unique collection.
    Set,
    /// A key-value mapping.
    Map,
    /// A reference to a live host object.
    Entity,
}

impl ValueKind {
    /// Human-readable kind name used in error messages.
    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Null => "null",
            ValueKind::Bool => "a boolean",
            ValueKind::Int => "an integer",
            ValueKind::Float => "a float",
            ValueKind::Text => "text",
            ValueKind::Seq => "a sequence",
            ValueKind::Set => "a set",
            ValueKind::Map => "a mapping",
            ValueKind::Entity => "an entity",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A dynamically typed attribute value.
#[derive(Debug, Clone)]
pub enum Value {
    /// The null value.
    Null,
    /// A boolean.
    Bool(bool),
    /// A signed integer.
    Int(i64),
    /// A double-precision float.
    Float(f64),
    /// A text string.
    Text(String),
    /// An ordered sequence; a shared handle to the backing store.
    Seq(ObservableSeq),
    /// An unordered unique collection; a shared handle.
    Set(ObservableSet),
    /// A key-value mapping; a shared handle.
    Map(ObservableMap),
    /// A reference to a live host object. Compared by identity.
    Entity(HostRef),
}

impl Value {
    /// Build a sequence value from an iterator of items.
    pub fn seq(items: impl IntoIterator<Item = Value>) -> Value {
        Value::Seq(ObservableSeq::from_items(items.into_iter().collect()))
    }

    /// Build a set value from an iterator of items, collapsing duplicates.
    pub fn set(items: impl IntoIterator<Item = Value>) -> Value {
        Value::Set(ObservableSet::from_items(items.into_iter().collect()))
    }

    /// Build a mapping value from an iterator of entries. Later entries
    /// overwrite earlier ones with an equal key.
    pub fn map(entries: impl IntoIterator<Item = (Value, Value)>) -> Value {
        Value::Map(ObservableMap::from_entries(entries.into_iter().collect()))
    }

    /// The outer kind of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::Float(_) => ValueKind::Float,
            Value::Text(_) => ValueKind::Text,
            Value::Seq(_) => ValueKind::Seq,
            Value::Set(_) => ValueKind::Set,
            Value::Map(_) => ValueKind::Map,
            Value::Entity(_) => ValueKind::Entity,
        }
    }

    /// True for the three container kinds.
    pub fn is_container(&self) -> bool {
        matches!(self, Value::Seq(_) | Value::Set(_) | Value::Map(_))
    }

    /// Access the boolean, if this is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Access the integer, if this is one.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Access the float, if this is one.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Access the text, if this is text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Access the sequence handle, if this is a sequence.
    pub fn as_seq(&self) -> Option<&ObservableSeq> {
        match self {
            Value::Seq(s) => Some(s),
            _ => None,
        }
    }

    /// Access the set handle, if this is a set.
    pub fn as_set(&self) -> Option<&ObservableSet> {
        match self {
            Value::Set(s) => Some(s),
            _ => None,
        }
    }

    /// Access the mapping handle, if this is a mapping.
    pub fn as_map(&self) -> Option<&ObservableMap> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Access the entity reference, if this is an entity.
    pub fn as_entity(&self) -> Option<&HostRef> {
        match self {
            Value::Entity(h) => Some(h),
            _ => None,
        }
    }

    /// True when both values are container handles backed by the same
    /// allocation. Used for the wrapper liveness check.
    pub fn container_ptr_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Seq(a), Value::Seq(b)) => ObservableSeq::ptr_eq(a, b),
            (Value::Set(a), Value::Set(b)) => ObservableSet::ptr_eq(a, b),
            (Value::Map(a), Value::Map(b)) => ObservableMap::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Render this value as plain nested data for an external codec.
    ///
    /// Sequences and sets become arrays (sets in iteration order); mappings
    /// become objects with scalar keys rendered to text; entities are
    /// exported through their host. Non-finite floats, non-scalar mapping
    /// keys, and rendered-key collisions have no plain rendering.
    pub fn to_plain(&self) -> Result<Json, SerializationError> {
        match self {
            Value::Null => Ok(Json::Null),
            Value::Bool(b) => Ok(Json::Bool(*b)),
            Value::Int(i) => Ok(Json::Number((*i).into())),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(Json::Number)
                .ok_or_else(|| SerializationError::Unexportable {
                    reason: format!("float {f} has no JSON rendering"),
                }),
            Value::Text(s) => Ok(Json::String(s.clone())),
            Value::Seq(seq) => {
                let items: Result<Vec<Json>, _> =
                    seq.items().iter().map(Value::to_plain).collect();
                Ok(Json::Array(items?))
            }
            Value::Set(set) => {
                let items: Result<Vec<Json>, _> =
                    set.items().iter().map(Value::to_plain).collect();
                Ok(Json::Array(items?))
            }
            Value::Map(map) => {
                let mut out = serde_json::Map::new();
                for (key, val) in map.entries() {
                    let rendered = key
                        .to_plain()
                        .ok()
                        .as_ref()
                        .and_then(render_key)
                        .ok_or_else(|| SerializationError::Unexportable {
                            reason: format!("key {key} cannot serve as an object key"),
                        })?;
                    if out.insert(rendered.clone(), val.to_plain()?).is_some() {
                        return Err(SerializationError::Unexportable {
                            reason: format!("distinct keys render to the same object key {rendered:?}"),
                        });
                    }
                }
                Ok(Json::Object(out))
            }
            Value::Entity(host) => host.export(true),
        }
    }

    /// Import plain nested data as a value.
    ///
    /// Arrays become sequences and objects become text-keyed mappings —
    /// sets and entities cannot be reconstructed without a validator.
    /// Unsigned integers beyond `i64::MAX` degrade to floats.
    pub fn from_plain(json: &Json) -> Value {
        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(*b),
            Json::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else {
                    Value::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            Json::String(s) => Value::Text(s.clone()),
            Json::Array(items) => Value::seq(items.iter().map(Value::from_plain)),
            Json::Object(obj) => Value::map(
                obj.iter()
                    .map(|(k, v)| (Value::Text(k.clone()), Value::from_plain(v))),
            ),
        }
    }
}

/// Kind name of a plain JSON value, for shape errors.
pub fn json_kind_name(json: &Json) -> &'static str {
    match json {
        Json::Null => "null",
        Json::Bool(_) => "a boolean",
        Json::Number(_) => "a number",
        Json::String(_) => "a string",
        Json::Array(_) => "an array",
        Json::Object(_) => "an object",
    }
}

/// Render a serialized (plain) key as a JSON object key.
///
/// Text passes through; numbers and booleans stringify; null, arrays, and
/// objects cannot serve as keys.
pub fn render_key(json: &Json) -> Option<String> {
    match json {
        Json::String(s) => Some(s.clone()),
        Json::Number(n) => Some(n.to_string()),
        Json::Bool(b) => Some(b.to_string()),
        Json::Null | Json::Array(_) | Json::Object(_) => None,
    }
}

// ─── Equality, hashing, ordering ─────────────────────────────────────

impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Seq(a), Value::Seq(b)) => a.with(|x| b.with(|y| x == y)),
            (Value::Set(a), Value::Set(b)) => a.with(|x| b.with(|y| x == y)),
            (Value::Map(a), Value::Map(b)) => a.with(|x| b.with(|y| x == y)),
            (Value::Entity(a), Value::Entity(b)) => a.host_id() == b.host_id(),
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Null => {}
            Value::Bool(b) => b.hash(state),
            Value::Int(i) => i.hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::Text(s) => s.hash(state),
            Value::Seq(seq) => seq.with(|items| {
                for item in items {
                    item.hash(state);
                }
            }),
            // Sets and mappings hash order-insensitively so that equal
            // collections hash equally regardless of insertion order.
            Value::Set(set) => set.with(|items| unordered_hash(items.iter(), state)),
            Value::Map(map) => map.with(|entries| unordered_hash(entries.iter(), state)),
            Value::Entity(host) => host.host_id().hash(state),
        }
    }
}

/// Combine element hashes commutatively, then feed the total to `state`.
fn unordered_hash<T: Hash, H: Hasher>(items: impl Iterator<Item = T>, state: &mut H) {
    let mut combined: u64 = 0;
    for item in items {
        let mut hasher = DefaultHasher::new();
        item.hash(&mut hasher);
        combined = combined.wrapping_add(hasher.finish());
    }
    combined.hash(state);
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Value) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    /// Total order: by kind rank first, then within kind. Floats order by
    /// `total_cmp`; sets and mappings compare as sorted snapshots so the
    /// order agrees with their order-insensitive equality.
    fn cmp(&self, other: &Value) -> std::cmp::Ordering {
        use std::cmp::Ordering;
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Float(a), Value::Float(b)) => a.total_cmp(b),
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            (Value::Seq(a), Value::Seq(b)) => a.items().cmp(&b.items()),
            (Value::Set(a), Value::Set(b)) => {
                let mut xs = a.items();
                let mut ys = b.items();
                xs.sort();
                ys.sort();
                xs.cmp(&ys)
            }
            (Value::Map(a), Value::Map(b)) => {
                let mut xs = a.entries();
                let mut ys = b.entries();
                xs.sort();
                ys.sort();
                xs.cmp(&ys)
            }
            (Value::Entity(a), Value::Entity(b)) => a.host_id().cmp(&b.host_id()),
            _ => self.kind().cmp(&other.kind()),
        }
    }
}

// ─── Display ─────────────────────────────────────────────────────────

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Text(s) => write!(f, "{s:?}"),
            Value::Seq(seq) => {
                f.write_str("[")?;
                for (i, item) in seq.items().iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Set(set) => {
                f.write_str("{")?;
                for (i, item) in set.items().iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("}")
            }
            Value::Map(map) => {
                f.write_str("{")?;
                for (i, (key, val)) in map.entries().iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {val}")?;
                }
                f.write_str("}")
            }
            Value::Entity(host) => write!(f, "<{}>", host.class_name()),
        }
    }
}

// ─── Conversions ─────────────────────────────────────────────────────

impl From<bool> for Value {
    fn from(v: bool) -> Value {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Value {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Value {
        Value::Int(v.into())
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Value {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Value {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Value {
        Value::Text(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Value {
        Value::seq(items)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let plain = self.to_plain().map_err(serde::ser::Error::custom)?;
        plain.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Value, D::Error> {
        let json = Json::deserialize(deserializer)?;
        Ok(Value::from_plain(&json))
    }
}

// ─── Default sentinel ────────────────────────────────────────────────

/// The default configuration of a property.
///
/// `Undefined` is the distinguished "no default" sentinel, distinct from
/// every real value including `Value::Null`.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum PropDefault {
    /// No default configured.
    #[default]
    Undefined,
    /// A concrete default value.
    Value(Value),
}

impl PropDefault {
    /// True when no default is configured.
    pub fn is_undefined(&self) -> bool {
        matches!(self, PropDefault::Undefined)
    }

    /// The concrete default, if one is configured.
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            PropDefault::Undefined => None,
            PropDefault::Value(v) => Some(v),
        }
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    /// Strategy for plain JSON trees with i64-range numbers, mirroring what
    /// `from_plain` can round-trip losslessly.
    fn plain_json() -> impl Strategy<Value = Json> {
        let leaf = prop_oneof![
            Just(Json::Null),
            any::<bool>().prop_map(Json::Bool),
            any::<i64>().prop_map(|n| serde_json::json!(n)),
            "[a-zA-Z0-9_ ]{0,12}".prop_map(Json::String),
        ];
        leaf.prop_recursive(3, 32, 6, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..6).prop_map(Json::Array),
                prop::collection::btree_map("[a-z]{1,6}", inner, 0..6).prop_map(|m| {
                    Json::Object(m.into_iter().collect())
                }),
            ]
        })
    }

    proptest! {
        /// Importing plain data and exporting it again is lossless.
        #[test]
        fn plain_round_trip(json in plain_json()) {
            let value = Value::from_plain(&json);
            let back = value.to_plain().unwrap();
            prop_assert_eq!(back, json);
        }

        /// Equality is reflexive and clones compare equal.
        #[test]
        fn clone_equality(json in plain_json()) {
            let value = Value::from_plain(&json);
            prop_assert_eq!(value.clone(), value);
        }

        /// Ordering is a total order consistent with equality on clones.
        #[test]
        fn self_compare_equal(json in plain_json()) {
            let value = Value::from_plain(&json);
            prop_assert_eq!(value.cmp(&value.clone()), std::cmp::Ordering::Equal);
        }
    }
}
