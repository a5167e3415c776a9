//! # Class Declaration Contract
//!
//! `EntityClass` is the seam between the property layer and the host
//! framework above it. An instance-of validator holds a `ClassRef` and can
//! check class membership and delegate entity reconstruction without
//! knowing the concrete host object type.

use std::fmt;
use std::rc::Rc;

use attrix_core::{Json, PropError};

use crate::property::DeserializeOptions;

/// A declared class of host objects: a name plus reconstruction.
pub trait EntityClass: fmt::Debug {
    /// The declared class name.
    fn name(&self) -> &str;

    /// Reconstruct an entity of this class from plain nested data.
    fn deserialize_entity(
        &self,
        json: &Json,
        opts: &DeserializeOptions,
    ) -> Result<attrix_core::Value, PropError>;
}

/// Shared handle to a class declaration.
pub type ClassRef = Rc<dyn EntityClass>;
