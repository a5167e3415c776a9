//! # Live Host Objects
//!
//! `Entity` is a live instance of a [`HostClass`]: attribute storage plus
//! the managed setter every validated assignment — including observable
//! wrapper write-backs — flows through.
//!
//! ## Atomicity
//!
//! `set` validates fully before touching storage; the store is a single
//! map insert and listeners fire after it. A rejected assignment therefore
//! leaves the prior value untouched and fires no notification. The
//! observable wrapper machinery depends on this guarantee.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use tracing::debug;

use attrix_core::{
    Host, HostRef, Json, PropError, SerializationError, ValidationError, Value,
};
use attrix_props::{DeserializeOptions, Property, SerializeOptions};

use crate::class::HostClass;

/// A change notification fired after a successful assignment.
#[derive(Debug, Clone)]
pub struct ChangeEvent {
    /// The attribute that changed.
    pub attr: String,
    /// The value previously stored, if any.
    pub old: Option<Value>,
    /// The value now stored.
    pub new: Value,
}

/// A registered change listener.
pub type ChangeListener = Rc<dyn Fn(&ChangeEvent)>;

struct EntityInner {
    class: Rc<HostClass>,
    attrs: RefCell<IndexMap<String, Value>>,
    listeners: RefCell<Vec<ChangeListener>>,
}

/// A live host object. Cloning clones the handle; both handles address
/// the same object and report the same identity.
#[derive(Clone)]
pub struct Entity(Rc<EntityInner>);

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("class", &self.0.class.name())
            .field("attrs", &self.0.attrs.borrow())
            .finish_non_exhaustive()
    }
}

impl Entity {
    /// Instantiate a class, applying declared defaults through the managed
    /// setter.
    pub fn new(class: Rc<HostClass>) -> Result<Entity, ValidationError> {
        let entity = Entity(Rc::new(EntityInner {
            class: Rc::clone(&class),
            attrs: RefCell::new(IndexMap::new()),
            listeners: RefCell::new(Vec::new()),
        }));
        for (name, prop) in class.properties() {
            if let Some(default) = prop.default().as_value() {
                entity.set(name, default.clone())?;
            }
        }
        Ok(entity)
    }

    /// The class this object instantiates.
    pub fn class(&self) -> &Rc<HostClass> {
        &self.0.class
    }

    /// This entity as a shared owner handle.
    pub fn host_ref(&self) -> HostRef {
        Rc::new(self.clone())
    }

    /// Aliasing read of the current attribute value, if set.
    pub fn get(&self, attr: &str) -> Option<Value> {
        self.0.attrs.borrow().get(attr).cloned()
    }

    /// Validate and store an attribute value, then notify listeners.
    ///
    /// The target property's `validate` runs first; on rejection nothing
    /// is stored and nothing fires. Observed container properties stamp
    /// their back-reference on the stored value here, making it the live
    /// wrapper for the slot.
    pub fn set(&self, attr: &str, value: Value) -> Result<(), ValidationError> {
        let prop = self.0.class.property(attr).cloned().ok_or_else(|| {
            ValidationError::UnknownProperty {
                class: self.0.class.name().to_string(),
                attr: attr.to_string(),
            }
        })?;
        let host = self.host_ref();
        let validated = prop.validate(Some(&host), value)?;
        let old = self
            .0
            .attrs
            .borrow_mut()
            .insert(attr.to_string(), validated.clone());
        debug!(
            class = self.0.class.name(),
            attr, "attribute changed, notifying listeners"
        );
        self.notify(&ChangeEvent {
            attr: attr.to_string(),
            old,
            new: validated,
        });
        Ok(())
    }

    /// Remove and return an attribute value without validation.
    pub fn unset(&self, attr: &str) -> Option<Value> {
        self.0.attrs.borrow_mut().shift_remove(attr)
    }

    /// Register a change listener, fired after every successful `set`.
    pub fn observe(&self, listener: impl Fn(&ChangeEvent) + 'static) {
        self.0.listeners.borrow_mut().push(Rc::new(listener));
    }

    fn notify(&self, event: &ChangeEvent) {
        // Snapshot so listeners may register further listeners.
        let listeners: Vec<ChangeListener> = self.0.listeners.borrow().clone();
        for listener in listeners {
            listener(event);
        }
    }

    /// Assert that every stored attribute is valid, recursing into
    /// containers.
    pub fn assert_valid(&self) -> Result<(), ValidationError> {
        let host = self.host_ref();
        for (name, prop) in self.0.class.properties() {
            if let Some(value) = self.get(name) {
                prop.assert_valid(Some(&host), &value)?;
            }
        }
        Ok(())
    }

    /// Export the set attributes as plain nested data, optionally tagged
    /// with the class name.
    pub fn serialize(&self, opts: &SerializeOptions) -> Result<Json, SerializationError> {
        let mut out = serde_json::Map::new();
        if opts.include_kind {
            out.insert(
                "__class__".to_string(),
                Json::String(self.0.class.name().to_string()),
            );
        }
        for (name, prop) in self.0.class.properties() {
            if let Some(value) = self.get(name) {
                out.insert(name.to_string(), prop.serialize(&value, opts)?);
            }
        }
        Ok(Json::Object(out))
    }

    /// Reconstruct an entity from plain nested data.
    ///
    /// Every attribute flows through the managed setter, so observed
    /// containers come back attached and defaults apply to absent
    /// attributes. The trusted flag is forwarded to each property's
    /// `deserialize`.
    pub fn deserialize(
        class: Rc<HostClass>,
        json: &Json,
        opts: &DeserializeOptions,
    ) -> Result<Entity, PropError> {
        let Json::Object(entries) = json else {
            return Err(SerializationError::UnexpectedShape {
                property: class.name().to_string(),
                expected: "an object".into(),
                found: attrix_core::json_kind_name(json).into(),
            }
            .into());
        };
        let entity = Entity::new(Rc::clone(&class))?;
        for (key, val) in entries {
            if key == "__class__" {
                continue;
            }
            let prop = class.property(key).cloned().ok_or_else(|| {
                ValidationError::UnknownProperty {
                    class: class.name().to_string(),
                    attr: key.clone(),
                }
            })?;
            let value = prop.deserialize(val, opts)?;
            entity.set(key, value)?;
        }
        Ok(entity)
    }
}

impl Host for Entity {
    fn class_name(&self) -> &str {
        self.0.class.name()
    }

    fn host_id(&self) -> usize {
        Rc::as_ptr(&self.0) as usize
    }

    fn get(&self, attr: &str) -> Option<Value> {
        Entity::get(self, attr)
    }

    fn set(&self, attr: &str, value: Value) -> Result<(), ValidationError> {
        Entity::set(self, attr, value)
    }

    fn assert_valid(&self) -> Result<(), ValidationError> {
        Entity::assert_valid(self)
    }

    fn export(&self, include_kind: bool) -> Result<Json, SerializationError> {
        self.serialize(&SerializeOptions { include_kind })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use attrix_props::{IntProp, ItemType, ListProp, Property, TextProp};

    fn point_class() -> Rc<HostClass> {
        HostClass::builder("Point")
            .prop("x", IntProp::new("x coordinate"))
            .unwrap()
            .prop("y", IntProp::new("y coordinate").with_default(0))
            .unwrap()
            .build()
    }

    #[test]
    fn test_defaults_apply_on_construction() {
        let point = Entity::new(point_class()).unwrap();
        assert_eq!(point.get("x"), None);
        assert_eq!(point.get("y"), Some(Value::Int(0)));
    }

    #[test]
    fn test_set_validates_and_stores() {
        let point = Entity::new(point_class()).unwrap();
        point.set("x", "3".into()).unwrap();
        assert_eq!(point.get("x"), Some(Value::Int(3)));
    }

    #[test]
    fn test_rejected_set_leaves_prior_value() {
        let point = Entity::new(point_class()).unwrap();
        point.set("x", 1.into()).unwrap();
        assert!(point.set("x", "nope".into()).is_err());
        assert_eq!(point.get("x"), Some(Value::Int(1)));
    }

    #[test]
    fn test_unknown_attribute_rejected() {
        let point = Entity::new(point_class()).unwrap();
        assert!(matches!(
            point.set("z", 1.into()),
            Err(ValidationError::UnknownProperty { .. })
        ));
    }

    #[test]
    fn test_listeners_fire_once_per_set() {
        let point = Entity::new(point_class()).unwrap();
        let count = Rc::new(RefCell::new(0));
        let seen = Rc::clone(&count);
        point.observe(move |event| {
            assert_eq!(event.attr, "x");
            *seen.borrow_mut() += 1;
        });
        point.set("x", 1.into()).unwrap();
        assert_eq!(*count.borrow(), 1);
        // A rejected set fires nothing.
        let _ = point.set("x", "bad".into());
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn test_handle_clones_share_identity() {
        let point = Entity::new(point_class()).unwrap();
        let other = point.clone();
        assert_eq!(Host::host_id(&point), Host::host_id(&other));
        other.set("x", 5.into()).unwrap();
        assert_eq!(point.get("x"), Some(Value::Int(5)));
        let unrelated = Entity::new(point_class()).unwrap();
        assert_ne!(Host::host_id(&point), Host::host_id(&unrelated));
    }

    #[test]
    fn test_serialize_round_trip() {
        let class = HostClass::builder("Tag")
            .prop("label", TextProp::new(""))
            .unwrap()
            .prop("weights", ListProp::new("", ItemType::prop(IntProp::new(""))))
            .unwrap()
            .build();
        let tag = Entity::new(Rc::clone(&class)).unwrap();
        tag.set("label", "alpha".into()).unwrap();
        tag.set("weights", Value::seq([1.into(), 2.into()])).unwrap();

        let plain = tag.serialize(&SerializeOptions::default()).unwrap();
        assert_eq!(plain["__class__"], serde_json::json!("Tag"));
        assert_eq!(plain["weights"], serde_json::json!([1, 2]));

        let back = Entity::deserialize(
            Rc::clone(&class),
            &plain,
            &DeserializeOptions::default(),
        )
        .unwrap();
        assert_eq!(back.get("label"), Some(Value::Text("alpha".into())));
        let prop = class.property("weights").unwrap();
        assert!(prop.equal(&back.get("weights").unwrap(), &tag.get("weights").unwrap()));
    }

    #[test]
    fn test_serialize_without_kind_hint() {
        let point = Entity::new(point_class()).unwrap();
        let plain = point
            .serialize(&SerializeOptions { include_kind: false })
            .unwrap();
        assert!(plain.get("__class__").is_none());
    }

    #[test]
    fn test_assert_valid_recurses() {
        let point = Entity::new(point_class()).unwrap();
        point.set("x", 2.into()).unwrap();
        point.assert_valid().unwrap();
    }
}
