//! # Scalar Element Validators
//!
//! The primitive validators container properties are exercised with.
//! Numeric properties coerce the obvious neighbors — integral floats and
//! numeric text become integers, integers and numeric text become floats —
//! while booleans and text accept only their own kind.

use attrix_core::{HostRef, Json, PropDefault, PropError, SerializationError, ValidationError, Value};

use crate::property::{DeserializeOptions, Property, SerializeOptions};
use crate::support::json_kind_name;

/// A signed-integer property.
#[derive(Debug, Clone, Default)]
pub struct IntProp {
    name: String,
    doc: String,
    default: PropDefault,
}

impl IntProp {
    /// Declare an integer property.
    pub fn new(doc: impl Into<String>) -> Self {
        Self {
            name: String::new(),
            doc: doc.into(),
            default: PropDefault::Undefined,
        }
    }

    /// Configure a default value.
    pub fn with_default(mut self, value: i64) -> Self {
        self.default = PropDefault::Value(Value::Int(value));
        self
    }

    fn reconstruct(&self, json: &Json) -> Result<Value, SerializationError> {
        match json {
            Json::Number(n) => {
                if let Some(i) = n.as_i64() {
                    return Ok(Value::Int(i));
                }
                if let Some(f) = n.as_f64() {
                    if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
                        return Ok(Value::Int(f as i64));
                    }
                }
            }
            Json::String(s) => {
                if let Ok(i) = s.trim().parse::<i64>() {
                    return Ok(Value::Int(i));
                }
            }
            _ => {}
        }
        Err(SerializationError::UnexpectedShape {
            property: self.name.clone(),
            expected: "an integer".into(),
            found: json_kind_name(json).into(),
        })
    }
}

impl Property for IntProp {
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
        "an integer".into()
    }

    fn default(&self) -> &PropDefault {
        &self.default
    }

    fn validate(&self, _host: Option<&HostRef>, value: Value) -> Result<Value, ValidationError> {
        match value {
            Value::Int(_) => Ok(value),
            Value::Float(f)
                if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 =>
            {
                Ok(Value::Int(f as i64))
            }
            Value::Text(ref s) => s
                .trim()
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| self.error(&value, None)),
            _ => Err(self.error(&value, None)),
        }
    }

    fn serialize(&self, value: &Value, _opts: &SerializeOptions) -> Result<Json, SerializationError> {
        value.to_plain()
    }

    fn deserialize(&self, json: &Json, opts: &DeserializeOptions) -> Result<Value, PropError> {
        let raw = self.reconstruct(json)?;
        if opts.trusted {
            Ok(raw)
        } else {
            Ok(self.validate(None, raw)?)
        }
    }
}

/// A double-precision float property.
#[derive(Debug, Clone, Default)]
pub struct FloatProp {
    name: String,
    doc: String,
    default: PropDefault,
}

impl FloatProp {
    /// Declare a float property.
    pub fn new(doc: impl Into<String>) -> Self {
        Self {
            name: String::new(),
            doc: doc.into(),
            default: PropDefault::Undefined,
        }
    }

    /// Configure a default value.
    pub fn with_default(mut self, value: f64) -> Self {
        self.default = PropDefault::Value(Value::Float(value));
        self
    }
}

impl Property for FloatProp {
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
        "a float".into()
    }

    fn default(&self) -> &PropDefault {
        &self.default
    }

    fn validate(&self, _host: Option<&HostRef>, value: Value) -> Result<Value, ValidationError> {
        match value {
            Value::Float(_) => Ok(value),
            Value::Int(i) => Ok(Value::Float(i as f64)),
            Value::Text(ref s) => s
                .trim()
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|_| self.error(&value, None)),
            _ => Err(self.error(&value, None)),
        }
    }

    fn serialize(&self, value: &Value, _opts: &SerializeOptions) -> Result<Json, SerializationError> {
        value.to_plain()
    }

    fn deserialize(&self, json: &Json, opts: &DeserializeOptions) -> Result<Value, PropError> {
        let raw = match json {
            Json::Number(n) => n.as_f64().map(Value::Float),
            Json::String(s) => s.trim().parse::<f64>().ok().map(Value::Float),
            _ => None,
        }
        .ok_or_else(|| SerializationError::UnexpectedShape {
            property: self.name.clone(),
            expected: "a float".into(),
            found: json_kind_name(json).into(),
        })?;
        if opts.trusted {
            Ok(raw)
        } else {
            Ok(self.validate(None, raw)?)
        }
    }
}

/// A boolean property.
#[derive(Debug, Clone, Default)]
pub struct BoolProp {
    name: String,
    doc: String,
    default: PropDefault,
}

impl BoolProp {
    /// Declare a boolean property.
    pub fn new(doc: impl Into<String>) -> Self {
        Self {
            name: String::new(),
            doc: doc.into(),
            default: PropDefault::Undefined,
        }
    }

    /// Configure a default value.
    pub fn with_default(mut self, value: bool) -> Self {
        self.default = PropDefault::Value(Value::Bool(value));
        self
    }
}

impl Property for BoolProp {
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
        "a boolean".into()
    }

    fn default(&self) -> &PropDefault {
        &self.default
    }

    fn validate(&self, _host: Option<&HostRef>, value: Value) -> Result<Value, ValidationError> {
        match value {
            Value::Bool(_) => Ok(value),
            _ => Err(self.error(&value, None)),
        }
    }

    fn serialize(&self, value: &Value, _opts: &SerializeOptions) -> Result<Json, SerializationError> {
        value.to_plain()
    }

    fn deserialize(&self, json: &Json, opts: &DeserializeOptions) -> Result<Value, PropError> {
        let raw = match json {
            Json::Bool(b) => Value::Bool(*b),
            _ => {
                return Err(SerializationError::UnexpectedShape {
                    property: self.name.clone(),
                    expected: "a boolean".into(),
                    found: json_kind_name(json).into(),
                }
                .into())
            }
        };
        if opts.trusted {
            Ok(raw)
        } else {
            Ok(self.validate(None, raw)?)
        }
    }
}

/// A text property.
#[derive(Debug, Clone, Default)]
pub struct TextProp {
    name: String,
    doc: String,
    default: PropDefault,
}

impl TextProp {
    /// Declare a text property.
    pub fn new(doc: impl Into<String>) -> Self {
        Self {
            name: String::new(),
            doc: doc.into(),
            default: PropDefault::Undefined,
        }
    }

    /// Configure a default value.
    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default = PropDefault::Value(Value::Text(value.into()));
        self
    }
}

impl Property for TextProp {
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
        "a text string".into()
    }

    fn default(&self) -> &PropDefault {
        &self.default
    }

    fn validate(&self, _host: Option<&HostRef>, value: Value) -> Result<Value, ValidationError> {
        match value {
            Value::Text(_) => Ok(value),
            _ => Err(self.error(&value, None)),
        }
    }

    fn serialize(&self, value: &Value, _opts: &SerializeOptions) -> Result<Json, SerializationError> {
        value.to_plain()
    }

    fn deserialize(&self, json: &Json, opts: &DeserializeOptions) -> Result<Value, PropError> {
        let raw = match json {
            Json::String(s) => Value::Text(s.clone()),
            _ => {
                return Err(SerializationError::UnexpectedShape {
                    property: self.name.clone(),
                    expected: "a text string".into(),
                    found: json_kind_name(json).into(),
                }
                .into())
            }
        };
        if opts.trusted {
            Ok(raw)
        } else {
            Ok(self.validate(None, raw)?)
        }
    }
}

/// A pass-through property: accepts any value unchanged.
#[derive(Debug, Clone, Default)]
pub struct AnyProp {
    name: String,
    doc: String,
    default: PropDefault,
}

impl AnyProp {
    /// Declare a pass-through property.
    pub fn new(doc: impl Into<String>) -> Self {
        Self {
            name: String::new(),
            doc: doc.into(),
            default: PropDefault::Undefined,
        }
    }

    /// Configure a default value.
    pub fn with_default(mut self, value: Value) -> Self {
        self.default = PropDefault::Value(value);
        self
    }
}

impl Property for AnyProp {
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
        "any value".into()
    }

    fn default(&self) -> &PropDefault {
        &self.default
    }

    fn validate(&self, _host: Option<&HostRef>, value: Value) -> Result<Value, ValidationError> {
        Ok(value)
    }

    fn serialize(&self, value: &Value, _opts: &SerializeOptions) -> Result<Json, SerializationError> {
        value.to_plain()
    }

    fn deserialize(&self, json: &Json, _opts: &DeserializeOptions) -> Result<Value, PropError> {
        Ok(Value::from_plain(json))
    }
}
