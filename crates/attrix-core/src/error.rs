//! # Error Types — Structured Error Hierarchy
//!
//! Defines the error types used throughout the attrix property layer. All
//! errors use `thiserror` for derive-based `Display` and `Error`
//! implementations.
//!
//! ## Design
//!
//! - Configuration errors are raised at property-definition time and are
//!   fatal to that definition.
//! - Validation errors cite the offending item, key, or value side, so a
//!   failure deep inside a nested container names the full path when the
//!   `source` chain is walked.
//! - Serialization errors name the offending key, never just "bad key".
//! - A failed validation must never corrupt the owner's stored value; the
//!   error types carry no partially-built state.

use thiserror::Error;

/// Top-level error type for the attrix property layer.
///
/// Surfaces that can fail in more than one way (deserialization, whole-host
/// import) return this umbrella; narrower surfaces return the specific kind.
#[derive(Error, Debug)]
pub enum PropError {
    /// Property definition rejected at configuration time.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Value rejected during validate or assert_valid.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Value could not be rendered as, or reconstructed from, plain data.
    #[error("serialization error: {0}")]
    Serialization(#[from] SerializationError),
}

/// Error raised while configuring a property definition.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Length bounds out of order.
    #[error("min_length {min} must be <= max_length {max}")]
    BoundsOutOfOrder {
        /// The configured minimum length.
        min: usize,
        /// The configured maximum length.
        max: usize,
    },

    /// A class declared the same property name twice.
    #[error("class '{class}' already declares a property named '{property}'")]
    DuplicateProperty {
        /// The class being declared.
        class: String,
        /// The repeated property name.
        property: String,
    },
}

/// Error raised while validating a value against a property.
#[derive(Error, Debug, Clone)]
pub enum ValidationError {
    /// The outer kind of the value does not match the declared kind.
    #[error("property '{property}' expects {expected}, got {actual}")]
    WrongKind {
        /// Name of the property that rejected the value.
        property: String,
        /// Human-readable description of the declared kind.
        expected: String,
        /// Kind name of the rejected value.
        actual: String,
    },

    /// A container length fell outside the configured bounds.
    #[error("property '{property}' has length {len}, expected {bounds}")]
    LengthOutOfBounds {
        /// Name of the property that rejected the value.
        property: String,
        /// Observed length after validation (post-dedup for sets).
        len: usize,
        /// Rendered bound description, e.g. "length between 1 and 3".
        bounds: String,
    },

    /// An element of a sequence or set failed its element validator.
    #[error("item {index} of property '{property}' is invalid: {source}")]
    InvalidItem {
        /// Name of the container property.
        property: String,
        /// Position of the offending item, in validation order.
        index: usize,
        /// The element validator's own failure.
        #[source]
        source: Box<ValidationError>,
    },

    /// A mapping key failed the key validator.
    #[error("key {key} of property '{property}' is invalid: {source}")]
    InvalidKey {
        /// Name of the mapping property.
        property: String,
        /// Display rendering of the offending key.
        key: String,
        /// The key validator's own failure.
        #[source]
        source: Box<ValidationError>,
    },

    /// A mapping value failed the value validator.
    #[error("value for key {key} of property '{property}' is invalid: {source}")]
    InvalidValue {
        /// Name of the mapping property.
        property: String,
        /// Display rendering of the key whose value failed.
        key: String,
        /// The value validator's own failure.
        #[source]
        source: Box<ValidationError>,
    },

    /// Assignment to an attribute the class does not declare.
    #[error("class '{class}' has no property named '{attr}'")]
    UnknownProperty {
        /// The host class name.
        class: String,
        /// The unknown attribute name.
        attr: String,
    },

    /// A positional container operation addressed a missing slot.
    #[error("index {index} out of range for container of length {len}")]
    IndexOutOfRange {
        /// The requested index.
        index: usize,
        /// The container length at the time of the call.
        len: usize,
    },

    /// Catch-all rejection raised through `Property::error`.
    #[error("invalid value for property '{property}': {message}")]
    Invalid {
        /// Name of the property that rejected the value.
        property: String,
        /// Human-readable rejection message.
        message: String,
    },
}

/// Error raised while producing or consuming plain nested data.
#[derive(Error, Debug)]
pub enum SerializationError {
    /// Two distinct keys rendered to the same serialized key.
    #[error("property '{property}': serialized keys collide at {key:?}")]
    KeyCollision {
        /// Name of the mapping property.
        property: String,
        /// The rendered key both sources collapsed to.
        key: String,
    },

    /// A serialized key is not a scalar and cannot serve as an object key.
    #[error("property '{property}': serialized key {key} cannot serve as a key")]
    UnkeyableKey {
        /// Name of the mapping property.
        property: String,
        /// Display rendering of the offending serialized key.
        key: String,
    },

    /// The input does not have the shape the property produces or consumes.
    #[error("property '{property}' expected {expected}, found {found}")]
    UnexpectedShape {
        /// Name of the property.
        property: String,
        /// The shape the property works with, e.g. "an array".
        expected: String,
        /// What was found instead.
        found: String,
    },

    /// A value has no plain-data rendering.
    #[error("cannot export value: {reason}")]
    Unexportable {
        /// Why the value cannot be rendered.
        reason: String,
    },

    /// Underlying JSON error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
