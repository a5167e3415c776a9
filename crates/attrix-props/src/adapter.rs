//! # Element Validator Adapter
//!
//! A container property declares what its elements are in one of two
//! forms: a validator instance, or a reference to a declared entity class.
//! The adapter normalizes both into a concrete validator once, at property
//! construction — a class reference becomes an instance-of validator.
//!
//! A validator supplied with a default configured warns and proceeds:
//! defaults are meaningless for contained elements and are ignored.

use tracing::warn;

use crate::class::ClassRef;
use crate::instance::InstanceProp;
use crate::property::Property;

/// A declared element type: a validator instance or an entity class.
#[derive(Debug)]
pub enum ItemType {
    /// An already-configured validator.
    Prop(Box<dyn Property>),
    /// A class reference, to be wrapped as an instance-of validator.
    Class(ClassRef),
}

impl ItemType {
    /// Declare the element type with a validator instance.
    pub fn prop(prop: impl Property + 'static) -> ItemType {
        ItemType::Prop(Box::new(prop))
    }

    /// Declare the element type with an entity class reference.
    pub fn class(class: ClassRef) -> ItemType {
        ItemType::Class(class)
    }
}

/// Resolve a declared element type into a concrete validator.
pub fn resolve_item(item: ItemType) -> Box<dyn Property> {
    let prop: Box<dyn Property> = match item {
        ItemType::Prop(prop) => prop,
        ItemType::Class(class) => Box::new(InstanceProp::of(class)),
    };
    if !prop.default().is_undefined() {
        warn!(
            item = %prop.info(),
            "element validator default is ignored inside containers"
        );
    }
    prop
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scalar::IntProp;

    #[test]
    fn test_prop_passes_through() {
        let resolved = resolve_item(ItemType::prop(IntProp::new("n")));
        assert_eq!(resolved.info(), "an integer");
    }

    #[test]
    fn test_defaulted_prop_warns_but_resolves() {
        // The default is ignored for contained elements; resolution still
        // succeeds and the validator is usable.
        let resolved = resolve_item(ItemType::prop(IntProp::new("n").with_default(5)));
        assert_eq!(resolved.info(), "an integer");
    }
}
