//! # Variable-Length Sequence Property
//!
//! `ListProp` is the variable-length sequence flavor: the same validation,
//! coercion, serialization, and equality as the fixed-arity flavor, plus
//! opt-in mutation observation. With observation on, `validate` stamps the
//! owner back-reference on the sequence it returns, so in-place mutation of
//! the live value re-enters the owner's validate+notify path.

use std::fmt;
use std::rc::Rc;

use attrix_core::{
    ConfigError, HostRef, Json, PropDefault, PropError, SerializationError, ValidationError, Value,
};

use crate::adapter::ItemType;
use crate::property::{DeserializeOptions, Deserializer, Property, SerializeOptions, Serializer};
use crate::tuple::TupleProp;

/// Property for variable-length sequences, optionally observing mutation.
pub struct ListProp {
    base: TupleProp,
    observe_mutations: bool,
}

impl fmt::Debug for ListProp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListProp")
            .field("base", &self.base)
            .field("observe_mutations", &self.observe_mutations)
            .finish()
    }
}

impl ListProp {
    /// Declare a variable-length sequence property over an element type.
    pub fn new(doc: impl Into<String>, item: ItemType) -> Self {
        Self {
            base: TupleProp::new(doc, item),
            observe_mutations: false,
        }
    }

    /// Configure the minimum valid length, inclusive.
    pub fn with_min_length(mut self, min: usize) -> Result<Self, ConfigError> {
        self.base = self.base.with_min_length(min)?;
        Ok(self)
    }

    /// Configure the maximum valid length, inclusive.
    pub fn with_max_length(mut self, max: usize) -> Result<Self, ConfigError> {
        self.base = self.base.with_max_length(max)?;
        Ok(self)
    }

    /// Configure coercion of non-sequence inputs.
    pub fn with_coerce(mut self, coerce: bool) -> Self {
        self.base = self.base.with_coerce(coerce);
        self
    }

    /// Route in-place mutations of validated values through the owner.
    pub fn with_observe_mutations(mut self, observe: bool) -> Self {
        self.observe_mutations = observe;
        self
    }

    /// Override serialization.
    pub fn with_serializer(mut self, serializer: Serializer) -> Self {
        self.base = self.base.with_serializer(serializer);
        self
    }

    /// Override deserialization.
    pub fn with_deserializer(mut self, deserializer: Deserializer) -> Self {
        self.base = self.base.with_deserializer(deserializer);
        self
    }

    /// Configure a default value.
    pub fn with_default(mut self, value: Value) -> Self {
        self.base = self.base.with_default(value);
        self
    }

    /// The element validator.
    pub fn item(&self) -> &dyn Property {
        self.base.item()
    }

    /// Whether mutation observation is enabled.
    pub fn observe_mutations(&self) -> bool {
        self.observe_mutations
    }

    /// Generic export with no validator context.
    pub fn to_json(value: &Value) -> Result<Json, SerializationError> {
        TupleProp::to_json(value)
    }

    /// Generic import with no validator context.
    pub fn from_json(json: &Json) -> Result<Value, SerializationError> {
        TupleProp::from_json(json)
    }
}

impl Property for ListProp {
    fn name(&self) -> &str {
        self.base.name()
    }

    fn set_name(&mut self, name: &str) {
        self.base.set_name(name);
    }

    fn doc(&self) -> &str {
        self.base.doc()
    }

    fn info(&self) -> String {
        self.base.info()
    }

    fn default(&self) -> &PropDefault {
        self.base.default()
    }

    fn validate(&self, host: Option<&HostRef>, value: Value) -> Result<Value, ValidationError> {
        let out = self.base.validate(host, value)?;
        if self.observe_mutations {
            if let (Some(host), Value::Seq(seq)) = (host, &out) {
                seq.attach(Rc::clone(host), self.base.name());
            }
        }
        Ok(out)
    }

    fn assert_valid(&self, host: Option<&HostRef>, value: &Value) -> Result<(), ValidationError> {
        self.base.assert_valid(host, value)
    }

    fn serialize(&self, value: &Value, opts: &SerializeOptions) -> Result<Json, SerializationError> {
        self.base.serialize(value, opts)
    }

    fn deserialize(&self, json: &Json, opts: &DeserializeOptions) -> Result<Value, PropError> {
        self.base.deserialize(json, opts)
    }

    fn equal(&self, a: &Value, b: &Value) -> bool {
        self.base.equal(a, b)
    }
}
