//! # attrix-core — Foundational Types for the Attrix Property Layer
//!
//! This crate is the bedrock of the attrix workspace. It defines the dynamic
//! value model, the structured error hierarchy, the owner contract, and the
//! observable container wrapper mechanism. Every other crate in the
//! workspace depends on `attrix-core`; it depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **One value model.** `Value` carries every kind a property can
//!    validate — scalars, sequences, sets, mappings, entity references —
//!    with total equality, hashing, and ordering so containers can nest
//!    freely.
//!
//! 2. **Container values are shared handles.** Cloning a container value
//!    aliases its backing store. The handle read from an owner slot *is*
//!    the wrapper the owner stores, which is what lets in-place mutation
//!    re-enter the owner's validate+notify path.
//!
//! 3. **Single-use back-references.** An attached wrapper routes exactly
//!    one mutation through its owner's setter and detaches unconditionally,
//!    success or failure. The back-reference is an explicit optional field,
//!    cleared by assignment — no weak-reference tricks.
//!
//! 4. **Static kind registry.** The kind → wrapper table and the per-kind
//!    operation groups are `const` data, immutable after startup.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `attrix-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.
//! - Single-threaded by design: shared state is `Rc<RefCell<..>>`, and no
//!   operation in validate/serialize/mutate paths suspends or blocks.

pub mod error;
pub mod observe;
pub mod value;

// Re-export primary types for ergonomic imports.
pub use error::{ConfigError, PropError, SerializationError, ValidationError};
pub use observe::{
    kind_ops, Binding, Container, ContainerKind, Host, HostRef, KindOps, Observable,
    ObservableMap, ObservableSeq, ObservableSet, OBSERVABLE_KINDS,
};
pub use value::{json_kind_name, render_key, Json, PropDefault, Value, ValueKind};
