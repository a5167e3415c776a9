//! # Observable Container Wrappers
//!
//! A validated container behaves exactly like its underlying kind when used
//! standalone, but every structural mutation performed while it is still the
//! live value of an owner's attribute re-enters that attribute's full
//! validate+notify path.
//!
//! ## State Machine
//!
//! A wrapper is **Detached** (`binding == None`) or **Attached** to an
//! owner slot (`binding == Some((host, attr))`).
//!
//! ```text
//!                    container property validate()
//!        Detached ──────────────────────────────────▶ Attached
//!            ▲                                            │
//!            │        first mutator / in-place operator   │
//!            └────────────────────────────────────────────┘
//! ```
//!
//! - Fresh wrappers, structural copies, and pure-operator results start
//!   Detached.
//! - Only a container property's `validate` attaches, by stamping the
//!   `(host, attr)` back-reference on the value it returns.
//! - The first mutator or in-place operator on an Attached wrapper takes
//!   the binding unconditionally — success or failure — so a wrapper can
//!   trigger at most one write-back.
//!
//! ## Routing
//!
//! A mutator on an Attached, still-live wrapper never touches the shared
//! backing store. It mutates a structural copy and writes the copy back
//! through the owner's managed setter, which re-runs full validation and
//! change notification and may reject the value. A rejected write-back
//! propagates to the mutating caller; the owner keeps its prior value.
//!
//! The back-reference is routing information only, never ownership, and it
//! is honored only while the wrapper is pointer-identical to the value
//! currently stored at the owner slot.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::{IndexMap, IndexSet};

use crate::error::{SerializationError, ValidationError};
use crate::value::{Json, Value};

// ─── Owner contract ──────────────────────────────────────────────────

/// Object-safe contract for a live owner of named, validated attributes.
///
/// The wrapper machinery consumes this surface; the concrete host object
/// lives in a higher crate.
pub trait Host: fmt::Debug {
    /// Name of the class this object instantiates.
    fn class_name(&self) -> &str;

    /// Stable identity of the underlying object. Handle clones report the
    /// same id; distinct objects never share one.
    fn host_id(&self) -> usize;

    /// Aliasing read of the current attribute value, if set.
    fn get(&self, attr: &str) -> Option<Value>;

    /// Full validate + store + notify assignment. Atomic: on rejection the
    /// prior value is left untouched and no notification fires.
    fn set(&self, attr: &str, value: Value) -> Result<(), ValidationError>;

    /// Assert that every stored attribute is valid.
    fn assert_valid(&self) -> Result<(), ValidationError>;

    /// Export this object as plain nested data.
    fn export(&self, include_kind: bool) -> Result<Json, SerializationError>;
}

/// Shared handle to a live host object.
pub type HostRef = Rc<dyn Host>;

/// Back-reference from an attached wrapper to the owner slot that produced
/// it. Routing information only — never ownership.
#[derive(Clone)]
pub struct Binding {
    /// The owner whose managed setter receives write-backs.
    pub host: HostRef,
    /// The attribute name the wrapper was validated for.
    pub attr: String,
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("class", &self.host.class_name())
            .field("attr", &self.attr)
            .finish()
    }
}

// ─── Kind registry ───────────────────────────────────────────────────

/// The three observable container kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    /// Ordered sequence.
    Seq,
    /// Unordered unique collection.
    Set,
    /// Key-value mapping.
    Map,
}

impl ContainerKind {
    /// Human-readable kind name.
    pub fn name(self) -> &'static str {
        match self {
            ContainerKind::Seq => "sequence",
            ContainerKind::Set => "set",
            ContainerKind::Map => "mapping",
        }
    }
}

/// Operation-name groups for one container kind.
///
/// Declared once per kind, immutable after startup. Names absent from a
/// kind's underlying surface simply do not appear in its table — the skip
/// happens here, at definition, never per call.
#[derive(Debug)]
pub struct KindOps {
    /// The container kind this row describes.
    pub kind: ContainerKind,
    /// The wrapper type servicing this kind.
    pub wrapper: &'static str,
    /// In-place changes routed through the owner's setter when attached.
    pub mutators: &'static [&'static str],
    /// Operations producing a new, detached container.
    pub operators: &'static [&'static str],
    /// Compound-assignment operations: mutate a copy, skip the write-back.
    pub in_place: &'static [&'static str],
}

/// The static kind → wrapper registry.
pub const OBSERVABLE_KINDS: [KindOps; 3] = [
    KindOps {
        kind: ContainerKind::Seq,
        wrapper: "ObservableSeq",
        mutators: &[
            "push", "insert", "set", "remove", "pop", "clear", "extend", "sort", "reverse",
            "truncate",
        ],
        operators: &["concat", "repeat"],
        in_place: &["extend_assign", "repeat_assign"],
    },
    KindOps {
        kind: ContainerKind::Set,
        wrapper: "ObservableSet",
        mutators: &[
            "insert",
            "remove",
            "pop",
            "clear",
            "update",
            "difference_update",
            "intersection_update",
            "symmetric_difference_update",
        ],
        operators: &[
            "union",
            "intersection",
            "difference",
            "symmetric_difference",
            "copied",
        ],
        in_place: &[
            "union_assign",
            "intersection_assign",
            "difference_assign",
            "symmetric_difference_assign",
        ],
    },
    KindOps {
        kind: ContainerKind::Map,
        wrapper: "ObservableMap",
        mutators: &[
            "insert",
            "remove",
            "pop_last",
            "set_default",
            "update",
            "clear",
        ],
        operators: &["copied"],
        in_place: &[],
    },
];

/// Look up the registry row for a container kind.
pub fn kind_ops(kind: ContainerKind) -> &'static KindOps {
    match kind {
        ContainerKind::Seq => &OBSERVABLE_KINDS[0],
        ContainerKind::Set => &OBSERVABLE_KINDS[1],
        ContainerKind::Map => &OBSERVABLE_KINDS[2],
    }
}

// ─── Generic wrapper ─────────────────────────────────────────────────

/// Backing store of an observable container kind.
pub trait Container: Clone + Default + PartialEq + fmt::Debug {
    /// The registry kind this store services.
    const KIND: ContainerKind;

    /// Number of elements/entries.
    fn len(&self) -> usize;

    /// Wrap an observable of this store as a [`Value`].
    fn wrap(obs: Observable<Self>) -> Value;

    /// True when `value` holds a wrapper backed by the same allocation as
    /// `obs`. The liveness check for attached wrappers.
    fn value_ptr_eq(value: &Value, obs: &Observable<Self>) -> bool;
}

impl Container for Vec<Value> {
    const KIND: ContainerKind = ContainerKind::Seq;

    fn len(&self) -> usize {
        self.len()
    }

    fn wrap(obs: Observable<Self>) -> Value {
        Value::Seq(obs)
    }

    fn value_ptr_eq(value: &Value, obs: &Observable<Self>) -> bool {
        matches!(value, Value::Seq(other) if Observable::ptr_eq(other, obs))
    }
}

impl Container for IndexSet<Value> {
    const KIND: ContainerKind = ContainerKind::Set;

    fn len(&self) -> usize {
        self.len()
    }

    fn wrap(obs: Observable<Self>) -> Value {
        Value::Set(obs)
    }

    fn value_ptr_eq(value: &Value, obs: &Observable<Self>) -> bool {
        matches!(value, Value::Set(other) if Observable::ptr_eq(other, obs))
    }
}

impl Container for IndexMap<Value, Value> {
    const KIND: ContainerKind = ContainerKind::Map;

    fn len(&self) -> usize {
        self.len()
    }

    fn wrap(obs: Observable<Self>) -> Value {
        Value::Map(obs)
    }

    fn value_ptr_eq(value: &Value, obs: &Observable<Self>) -> bool {
        matches!(value, Value::Map(other) if Observable::ptr_eq(other, obs))
    }
}

struct Repr<C> {
    data: C,
    binding: Option<Binding>,
}

/// A container value plus an optional back-reference to the owner slot it
/// was validated for.
///
/// Cloning the wrapper clones the *handle*: both handles alias the same
/// backing store and binding. A structural copy with a fresh, detached
/// store is [`Observable::detached_copy`].
pub struct Observable<C: Container> {
    inner: Rc<RefCell<Repr<C>>>,
}

/// Ordered-sequence wrapper.
pub type ObservableSeq = Observable<Vec<Value>>;
/// Unique-set wrapper.
pub type ObservableSet = Observable<IndexSet<Value>>;
/// Key-value mapping wrapper.
pub type ObservableMap = Observable<IndexMap<Value, Value>>;

impl<C: Container> Clone for Observable<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<C: Container> Default for Observable<C> {
    fn default() -> Self {
        Self::new(C::default())
    }
}

impl<C: Container> fmt::Debug for Observable<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = self.inner.borrow();
        f.debug_struct("Observable")
            .field("data", &repr.data)
            .field("binding", &repr.binding)
            .finish()
    }
}

impl<C: Container> PartialEq for Observable<C> {
    /// Content equality. The binding is routing state, never part of the
    /// value.
    fn eq(&self, other: &Self) -> bool {
        Self::ptr_eq(self, other) || self.with(|a| other.with(|b| a == b))
    }
}

impl<C: Container> Observable<C> {
    /// Wrap a backing store. The wrapper starts Detached.
    pub fn new(data: C) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Repr {
                data,
                binding: None,
            })),
        }
    }

    /// True when both handles alias the same backing store.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Rc::ptr_eq(&a.inner, &b.inner)
    }

    /// The registry kind of this wrapper.
    pub fn kind(&self) -> ContainerKind {
        C::KIND
    }

    /// Number of elements/entries.
    pub fn len(&self) -> usize {
        self.inner.borrow().data.len()
    }

    /// True when the container is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read access to the backing store.
    pub fn with<R>(&self, f: impl FnOnce(&C) -> R) -> R {
        f(&self.inner.borrow().data)
    }

    /// Clone of the backing store.
    pub fn snapshot(&self) -> C {
        self.inner.borrow().data.clone()
    }

    /// True while the wrapper carries a back-reference.
    pub fn is_attached(&self) -> bool {
        self.inner.borrow().binding.is_some()
    }

    /// The current back-reference, if any.
    pub fn binding(&self) -> Option<Binding> {
        self.inner.borrow().binding.clone()
    }

    /// Stamp the back-reference. Called by a container property's
    /// `validate` on the value it returns; nothing else attaches.
    pub fn attach(&self, host: HostRef, attr: impl Into<String>) {
        self.inner.borrow_mut().binding = Some(Binding {
            host,
            attr: attr.into(),
        });
    }

    /// Clear and return the back-reference by direct assignment.
    pub fn detach(&self) -> Option<Binding> {
        self.inner.borrow_mut().binding.take()
    }

    /// Structural copy: same kind, fresh backing store, Detached.
    pub fn detached_copy(&self) -> Self {
        Self::new(self.snapshot())
    }

    /// Take the binding — unconditionally, this is the terminal transition
    /// of the wrapper state machine — and return it only if the wrapper is
    /// still the value stored at the owner slot.
    fn take_live_binding(&self) -> Option<Binding> {
        let binding = self.inner.borrow_mut().binding.take()?;
        let stored = binding.host.get(&binding.attr)?;
        if C::value_ptr_eq(&stored, self) {
            Some(binding)
        } else {
            None
        }
    }

    /// Route a mutator.
    ///
    /// Detached (or stale): apply to the shared backing store in place.
    /// Attached and live: apply to a structural copy, write the copy back
    /// through the owner's setter, and surface any rejection. The binding
    /// is gone either way, and a failing operation skips the write-back.
    fn mutate<R>(
        &self,
        op: impl FnOnce(&mut C) -> Result<R, ValidationError>,
    ) -> Result<R, ValidationError> {
        match self.take_live_binding() {
            None => {
                let mut repr = self.inner.borrow_mut();
                op(&mut repr.data)
            }
            Some(binding) => {
                let copy = self.detached_copy();
                let result = {
                    let mut repr = copy.inner.borrow_mut();
                    op(&mut repr.data)?
                };
                binding.host.set(&binding.attr, C::wrap(copy))?;
                Ok(result)
            }
        }
    }

    /// Route an in-place operator: mutate and return the receiving handle.
    ///
    /// Attached wrappers mutate a structural copy and return it without a
    /// write-back; the original is left Detached and the owner untouched.
    fn update_in_place(&self, op: impl FnOnce(&mut C)) -> Self {
        match self.take_live_binding() {
            None => {
                {
                    let mut repr = self.inner.borrow_mut();
                    op(&mut repr.data);
                }
                self.clone()
            }
            Some(_) => {
                let copy = self.detached_copy();
                {
                    let mut repr = copy.inner.borrow_mut();
                    op(&mut repr.data);
                }
                copy
            }
        }
    }

    /// Route a pure operator: build a new container from a read of this
    /// one and wrap it Detached. The receiver is left untouched.
    fn operate(&self, op: impl FnOnce(&C) -> C) -> Self {
        Self::new(self.with(op))
    }
}

// ─── Sequence surface ────────────────────────────────────────────────

impl ObservableSeq {
    /// Build a sequence wrapper from items. Detached.
    pub fn from_items(items: Vec<Value>) -> Self {
        Self::new(items)
    }

    /// Clone of the items, in order.
    pub fn items(&self) -> Vec<Value> {
        self.snapshot()
    }

    /// The item at `index`, if present.
    pub fn get(&self, index: usize) -> Option<Value> {
        self.with(|items| items.get(index).cloned())
    }

    /// True when some item equals `value`.
    pub fn contains(&self, value: &Value) -> bool {
        self.with(|items| items.contains(value))
    }

    /// Append an item.
    pub fn push(&self, item: Value) -> Result<(), ValidationError> {
        self.mutate(|items| {
            items.push(item);
            Ok(())
        })
    }

    /// Insert an item at `index`, shifting the tail.
    pub fn insert(&self, index: usize, item: Value) -> Result<(), ValidationError> {
        self.mutate(|items| {
            if index > items.len() {
                return Err(ValidationError::IndexOutOfRange {
                    index,
                    len: items.len(),
                });
            }
            items.insert(index, item);
            Ok(())
        })
    }

    /// Indexed assignment.
    pub fn set(&self, index: usize, item: Value) -> Result<(), ValidationError> {
        self.mutate(|items| match items.get_mut(index) {
            Some(slot) => {
                *slot = item;
                Ok(())
            }
            None => Err(ValidationError::IndexOutOfRange {
                index,
                len: items.len(),
            }),
        })
    }

    /// Remove and return the item at `index`.
    pub fn remove(&self, index: usize) -> Result<Value, ValidationError> {
        self.mutate(|items| {
            if index >= items.len() {
                return Err(ValidationError::IndexOutOfRange {
                    index,
                    len: items.len(),
                });
            }
            Ok(items.remove(index))
        })
    }

    /// Remove and return the last item, if any.
    pub fn pop(&self) -> Result<Option<Value>, ValidationError> {
        self.mutate(|items| Ok(items.pop()))
    }

    /// Remove every item.
    pub fn clear(&self) -> Result<(), ValidationError> {
        self.mutate(|items| {
            items.clear();
            Ok(())
        })
    }

    /// Append every item of `other`.
    pub fn extend(&self, other: impl IntoIterator<Item = Value>) -> Result<(), ValidationError> {
        self.mutate(|items| {
            items.extend(other);
            Ok(())
        })
    }

    /// Sort items by the total value order.
    pub fn sort(&self) -> Result<(), ValidationError> {
        self.mutate(|items| {
            items.sort();
            Ok(())
        })
    }

    /// Reverse the item order.
    pub fn reverse(&self) -> Result<(), ValidationError> {
        self.mutate(|items| {
            items.reverse();
            Ok(())
        })
    }

    /// Drop every item past `len`.
    pub fn truncate(&self, len: usize) -> Result<(), ValidationError> {
        self.mutate(|items| {
            items.truncate(len);
            Ok(())
        })
    }

    /// New detached sequence: this one followed by `other`.
    pub fn concat(&self, other: &ObservableSeq) -> ObservableSeq {
        self.operate(|items| {
            let mut out = items.clone();
            out.extend(other.items());
            out
        })
    }

    /// New detached sequence: this one repeated `n` times.
    pub fn repeat(&self, n: usize) -> ObservableSeq {
        self.operate(|items| {
            let mut out = Vec::with_capacity(items.len() * n);
            for _ in 0..n {
                out.extend(items.iter().cloned());
            }
            out
        })
    }

    /// Compound-assignment append: mutate and return the receiving handle
    /// (a detached copy when the receiver was attached).
    pub fn extend_assign(&self, other: impl IntoIterator<Item = Value>) -> ObservableSeq {
        let extra: Vec<Value> = other.into_iter().collect();
        self.update_in_place(|items| items.extend(extra))
    }

    /// Compound-assignment repeat.
    pub fn repeat_assign(&self, n: usize) -> ObservableSeq {
        self.update_in_place(|items| {
            let base = items.clone();
            items.clear();
            for _ in 0..n {
                items.extend(base.iter().cloned());
            }
        })
    }
}

// ─── Set surface ─────────────────────────────────────────────────────

impl ObservableSet {
    /// Build a set wrapper from items, collapsing duplicates. Detached.
    pub fn from_items(items: Vec<Value>) -> Self {
        Self::new(items.into_iter().collect())
    }

    /// Clone of the items, in iteration order.
    pub fn items(&self) -> Vec<Value> {
        self.with(|set| set.iter().cloned().collect())
    }

    /// True when the set holds `value`.
    pub fn contains(&self, value: &Value) -> bool {
        self.with(|set| set.contains(value))
    }

    /// Add an item; false when it was already present.
    pub fn insert(&self, item: Value) -> Result<bool, ValidationError> {
        self.mutate(|set| Ok(set.insert(item)))
    }

    /// Remove an item; false when it was absent.
    pub fn remove(&self, item: &Value) -> Result<bool, ValidationError> {
        self.mutate(|set| Ok(set.shift_remove(item)))
    }

    /// Remove and return the most recently inserted item, if any.
    pub fn pop(&self) -> Result<Option<Value>, ValidationError> {
        self.mutate(|set| Ok(set.pop()))
    }

    /// Remove every item.
    pub fn clear(&self) -> Result<(), ValidationError> {
        self.mutate(|set| {
            set.clear();
            Ok(())
        })
    }

    /// Add every item of `other`.
    pub fn update(&self, other: impl IntoIterator<Item = Value>) -> Result<(), ValidationError> {
        self.mutate(|set| {
            set.extend(other);
            Ok(())
        })
    }

    /// Remove every item also present in `other`.
    pub fn difference_update(&self, other: &ObservableSet) -> Result<(), ValidationError> {
        let drop = other.snapshot();
        self.mutate(|set| {
            set.retain(|v| !drop.contains(v));
            Ok(())
        })
    }

    /// Keep only items also present in `other`.
    pub fn intersection_update(&self, other: &ObservableSet) -> Result<(), ValidationError> {
        let keep = other.snapshot();
        self.mutate(|set| {
            set.retain(|v| keep.contains(v));
            Ok(())
        })
    }

    /// Keep items present in exactly one of the two sets.
    pub fn symmetric_difference_update(&self, other: &ObservableSet) -> Result<(), ValidationError> {
        let toggle = other.snapshot();
        self.mutate(|set| {
            for item in toggle.iter() {
                if !set.shift_remove(item) {
                    set.insert(item.clone());
                }
            }
            Ok(())
        })
    }

    /// New detached set holding items of either set.
    pub fn union(&self, other: &ObservableSet) -> ObservableSet {
        self.operate(|set| set.iter().chain(other.snapshot().iter()).cloned().collect())
    }

    /// New detached set holding items of both sets.
    pub fn intersection(&self, other: &ObservableSet) -> ObservableSet {
        let keep = other.snapshot();
        self.operate(|set| set.iter().filter(|v| keep.contains(*v)).cloned().collect())
    }

    /// New detached set holding items of this set absent from `other`.
    pub fn difference(&self, other: &ObservableSet) -> ObservableSet {
        let drop = other.snapshot();
        self.operate(|set| set.iter().filter(|v| !drop.contains(*v)).cloned().collect())
    }

    /// New detached set holding items of exactly one of the two sets.
    pub fn symmetric_difference(&self, other: &ObservableSet) -> ObservableSet {
        let theirs = other.snapshot();
        self.operate(|set| {
            let mut out: IndexSet<Value> =
                set.iter().filter(|v| !theirs.contains(*v)).cloned().collect();
            out.extend(theirs.iter().filter(|v| !set.contains(*v)).cloned());
            out
        })
    }

    /// New detached copy of this set.
    pub fn copied(&self) -> ObservableSet {
        self.operate(Clone::clone)
    }

    /// Compound-assignment union.
    pub fn union_assign(&self, other: &ObservableSet) -> ObservableSet {
        let extra = other.snapshot();
        self.update_in_place(|set| set.extend(extra))
    }

    /// Compound-assignment intersection.
    pub fn intersection_assign(&self, other: &ObservableSet) -> ObservableSet {
        let keep = other.snapshot();
        self.update_in_place(|set| set.retain(|v| keep.contains(v)))
    }

    /// Compound-assignment difference.
    pub fn difference_assign(&self, other: &ObservableSet) -> ObservableSet {
        let drop = other.snapshot();
        self.update_in_place(|set| set.retain(|v| !drop.contains(v)))
    }

    /// Compound-assignment symmetric difference.
    pub fn symmetric_difference_assign(&self, other: &ObservableSet) -> ObservableSet {
        let toggle = other.snapshot();
        self.update_in_place(|set| {
            for item in toggle.iter() {
                if !set.shift_remove(item) {
                    set.insert(item.clone());
                }
            }
        })
    }
}

// ─── Mapping surface ─────────────────────────────────────────────────

impl ObservableMap {
    /// Build a mapping wrapper from entries. Later entries overwrite
    /// earlier ones with an equal key. Detached.
    pub fn from_entries(entries: Vec<(Value, Value)>) -> Self {
        Self::new(entries.into_iter().collect())
    }

    /// Clone of the entries, in iteration order.
    pub fn entries(&self) -> Vec<(Value, Value)> {
        self.with(|map| map.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
    }

    /// Clone of the keys, in iteration order.
    pub fn keys(&self) -> Vec<Value> {
        self.with(|map| map.keys().cloned().collect())
    }

    /// The value stored for `key`, if present.
    pub fn get(&self, key: &Value) -> Option<Value> {
        self.with(|map| map.get(key).cloned())
    }

    /// True when the mapping holds `key`.
    pub fn contains_key(&self, key: &Value) -> bool {
        self.with(|map| map.contains_key(key))
    }

    /// Keyed assignment; returns the value previously stored for `key`.
    pub fn insert(&self, key: Value, value: Value) -> Result<Option<Value>, ValidationError> {
        self.mutate(|map| Ok(map.insert(key, value)))
    }

    /// Remove and return the value stored for `key`, preserving the order
    /// of the remaining entries.
    pub fn remove(&self, key: &Value) -> Result<Option<Value>, ValidationError> {
        self.mutate(|map| Ok(map.shift_remove(key)))
    }

    /// Remove and return the most recently inserted entry, if any.
    pub fn pop_last(&self) -> Result<Option<(Value, Value)>, ValidationError> {
        self.mutate(|map| Ok(map.pop()))
    }

    /// The value stored for `key`, inserting `default` first when absent.
    pub fn set_default(&self, key: Value, default: Value) -> Result<Value, ValidationError> {
        self.mutate(|map| Ok(map.entry(key).or_insert(default).clone()))
    }

    /// Insert every entry of `other`, overwriting on key collisions.
    pub fn update(
        &self,
        other: impl IntoIterator<Item = (Value, Value)>,
    ) -> Result<(), ValidationError> {
        self.mutate(|map| {
            map.extend(other);
            Ok(())
        })
    }

    /// Remove every entry.
    pub fn clear(&self) -> Result<(), ValidationError> {
        self.mutate(|map| {
            map.clear();
            Ok(())
        })
    }

    /// New detached copy of this mapping.
    pub fn copied(&self) -> ObservableMap {
        self.operate(Clone::clone)
    }
}
