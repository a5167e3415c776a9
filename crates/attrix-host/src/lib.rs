//! # attrix-host — The Owner Framework
//!
//! Live host objects for the attrix property layer: class declarations
//! (`HostClass`) and instances (`Entity`) whose attribute assignment runs
//! the full validate+store+notify pipeline.
//!
//! ## Design
//!
//! - **One managed setter.** Every assignment — direct `set` calls,
//!   defaults at construction, deserialization, and observable wrapper
//!   write-backs — flows through `Entity::set`. Validation happens before
//!   storage, storage is a single insert, and notification follows; a
//!   rejection leaves the prior value untouched.
//!
//! - **Handles, not objects.** `Entity` is a cheap-to-clone handle with
//!   stable identity, and it implements the `Host` contract from
//!   `attrix-core`, which is how attached container wrappers route their
//!   write-backs without this crate and that one knowing each other's
//!   concrete types.

pub mod class;
pub mod entity;

// Re-export primary types for ergonomic imports.
pub use class::{HostClass, HostClassBuilder};
pub use entity::{ChangeEvent, ChangeListener, Entity};
