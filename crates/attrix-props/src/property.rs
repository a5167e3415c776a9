//! # The Validator Contract
//!
//! `Property` is the object-safe contract every validator satisfies: the
//! scalar element validators, the instance-of validator, and the four
//! container property kinds. A container holds its element validators as
//! `Box<dyn Property>` and drives them through this surface only.
//!
//! ## Contract
//!
//! - `validate` checks and coerces a raw value, returning a fresh value
//!   that never aliases a raw input container.
//! - `assert_valid` re-checks invariants on an already-stored value,
//!   recursing into containers.
//! - `serialize`/`deserialize` bridge to plain nested data; `deserialize`
//!   takes a trusted flag controlling whether reconstruction re-validates.
//! - `equal` is the property's own equivalence, which may be finer or
//!   coarser than plain value equality.
//! - `name` is bound once, when a class declaration adopts the property.

use std::fmt;
use std::rc::Rc;

use attrix_core::{HostRef, Json, PropDefault, PropError, SerializationError, ValidationError, Value};

/// Options threaded through `serialize`.
#[derive(Debug, Clone, Copy)]
pub struct SerializeOptions {
    /// Include a type hint (the class name) when exporting entities.
    pub include_kind: bool,
}

impl Default for SerializeOptions {
    fn default() -> Self {
        Self { include_kind: true }
    }
}

/// Options threaded through `deserialize`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeserializeOptions {
    /// Skip re-validation of reconstructed values.
    pub trusted: bool,
}

/// Custom serializer override for a container property.
pub type Serializer = Rc<dyn Fn(&Value, &SerializeOptions) -> Result<Json, SerializationError>>;

/// Custom deserializer override for a container property.
pub type Deserializer = Rc<dyn Fn(&Json, &DeserializeOptions) -> Result<Value, PropError>>;

/// The contract satisfied by every attrix validator.
pub trait Property: fmt::Debug {
    /// The attribute name this property is bound to, or `""` before
    /// adoption by a class declaration.
    fn name(&self) -> &str;

    /// Bind the attribute name. Container properties propagate the name
    /// to their element validators.
    fn set_name(&mut self, name: &str);

    /// The declaration docstring.
    fn doc(&self) -> &str;

    /// Human-readable description of what the property accepts.
    fn info(&self) -> String;

    /// The configured default, or the undefined sentinel.
    fn default(&self) -> &PropDefault;

    /// Check and coerce a raw value.
    ///
    /// `host` is the owner the value is being validated for, when there is
    /// one; container properties with mutation observation use it to stamp
    /// the back-reference on the value they return.
    fn validate(&self, host: Option<&HostRef>, value: Value) -> Result<Value, ValidationError>;

    /// Re-check invariants on an already-validated value, recursing into
    /// containers.
    ///
    /// The default re-runs `validate` and discards the result, which is
    /// exact for scalar properties.
    fn assert_valid(&self, host: Option<&HostRef>, value: &Value) -> Result<(), ValidationError> {
        self.validate(host, value.clone()).map(|_| ())
    }

    /// Render the value as plain nested data.
    fn serialize(&self, value: &Value, opts: &SerializeOptions) -> Result<Json, SerializationError>;

    /// Reconstruct a value from plain nested data.
    fn deserialize(&self, json: &Json, opts: &DeserializeOptions) -> Result<Value, PropError>;

    /// The property's own equivalence on validated values.
    fn equal(&self, a: &Value, b: &Value) -> bool {
        a == b
    }

    /// Build the property's rejection error for a value.
    fn error(&self, value: &Value, extra: Option<&str>) -> ValidationError {
        let mut message = format!("expected {}, got {}", self.info(), value);
        if let Some(extra) = extra {
            message.push_str(": ");
            message.push_str(extra);
        }
        ValidationError::Invalid {
            property: self.name().to_string(),
            message,
        }
    }
}
