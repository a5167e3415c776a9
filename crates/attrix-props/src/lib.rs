//! # attrix-props — The Property Layer
//!
//! Validators for declared, typed attributes: the object-safe `Property`
//! contract, scalar element validators, the element-validator adapter, the
//! instance-of validator, and the four container property kinds.
//!
//! ## Container Properties
//!
//! - [`TupleProp`] — fixed-arity ordered sequences, never observed.
//! - [`ListProp`] — variable-length ordered sequences, optionally observed.
//! - [`SetProp`] — unordered unique collections, duplicate-collapsing.
//! - [`MapProp`] — key-value mappings with independent key and value
//!   validators.
//!
//! Each implements the full validator contract — validate, assert_valid,
//! serialize, deserialize, equal — plus generic `to_json`/`from_json`
//! conversions that need no validator context. Element validators are
//! applied independently per item, key, and value; nothing is shared
//! across elements.
//!
//! ## Mutation Observation
//!
//! `ListProp`, `SetProp`, and `MapProp` accept an `observe_mutations`
//! flag. When enabled and a host is supplied, `validate` stamps the owner
//! back-reference on the container it returns, arming the observable
//! wrapper machinery in `attrix-core`.

pub mod adapter;
pub mod class;
pub mod instance;
pub mod list;
pub mod map;
pub mod property;
pub mod scalar;
pub mod set;
pub mod tuple;

mod support;

// Re-export primary types for ergonomic imports.
pub use adapter::{resolve_item, ItemType};
pub use class::{ClassRef, EntityClass};
pub use instance::InstanceProp;
pub use list::ListProp;
pub use map::MapProp;
pub use property::{DeserializeOptions, Deserializer, Property, SerializeOptions, Serializer};
pub use scalar::{AnyProp, BoolProp, FloatProp, IntProp, TextProp};
pub use set::SetProp;
pub use tuple::TupleProp;
