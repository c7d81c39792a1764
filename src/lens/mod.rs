//! Bidirectional lens combinators.
//!
//! A lens maps a *concrete* value `C` to an *abstract* value `A`
//! (`get: C -> A`) and reconstructs an updated concrete value from an edited
//! abstract value plus the prior concrete value (`putback: A x C -> C`).
//! Lenses compose like functions but must additionally respect the
//! consistency laws below.
//!
//! # Laws
//!
//! Every well-formed lens must satisfy:
//!
//! 1. **GetPut Law**: Putting back an unedited view restores the original.
//!    ```text
//!    lens.putback(&lens.get(&c)?, &c)? == c
//!    ```
//!
//! 2. **PutGet Law**: Whenever putback succeeds, getting again yields the
//!    edited view.
//!    ```text
//!    lens.get(&lens.putback(&a, &c)?)? == a
//!    ```
//!
//! **PutPut** (two consecutive putbacks equal the last one) is *not*
//! universally required; combinators that use the prior concrete value to
//! preserve unedited structure generally do not satisfy it.
//!
//! The engine never validates the laws at runtime; they are a test-suite
//! concern (see `tests/lens_laws.rs`).
//!
//! # The absent concrete value
//!
//! `putback` must accept [`Value::Undefined`] as the prior concrete value,
//! meaning "no prior state". Every combinator defines sensible behavior for
//! that case, typically via a caller-supplied default.
//!
//! # Example
//!
//! ```
//! use bilens::lens::{focus, plus, seq};
//! use bilens::record;
//! use bilens::value::Value;
//!
//! // View the "x" field of a point, shifted right by 5.
//! let lens = seq(vec![
//!     focus("x", record! { "y" => 0.0 }),
//!     plus(5.0, Value::Undefined),
//! ])?;
//!
//! let point = record! { "x" => 10.0, "y" => 20.0 };
//! assert_eq!(lens.get(&point)?, Value::Num(15.0));
//!
//! // Edit the view and reconcile: "y" is preserved from the original.
//! let edited = lens.putback(&Value::Num(40.0), &point)?;
//! assert_eq!(edited, record! { "x" => 35.0, "y" => 20.0 });
//! # Ok::<(), bilens::error::LensError>(())
//! ```
//!
//! # Bindings
//!
//! Stateful lenses ([`list_map`]) queue structural edits and need the
//! outside world to re-synchronize afterwards. [`Lens::bind`] registers an
//! opaque [`Listener`] handle, propagated recursively to all sub-lenses;
//! the engine only stores, dedupes, and notifies; debouncing and
//! scheduling belong to the listener's owner.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use smallvec::SmallVec;

use crate::error::Result;
use crate::value::Value;

mod arithmetic;
mod conditional;
mod layout;
mod list;
mod list_map;
mod primitive;
mod record;

pub use arithmetic::{divide, minus, plus, times};
pub use conditional::{acond, ccond, cond, rename_if_present};
pub use layout::{LayoutEntry, layout};
pub use list::{
    End, concat, group, head, index, length, list_filter, order, reverse, rotate, tail,
};
pub use list_map::{Edit, EditHooks, list_map};
pub use primitive::{constant, constant_lax, fail, identity, invertible, seq};
pub use record::{
    add, copy, filter, focus, fork, hoist, hoist_checked, hoist_nonunique, merge, merge_keys,
    plunge, plunge_checked, prune, rename, split, value_map, wmap, xfork,
};

/// A shared handle to a lens.
///
/// Construction functions return `LensRef`s; composites hold their children
/// as `LensRef`s. Sharing is single-threaded by design (see the crate docs),
/// so plain `Rc` is used throughout.
pub type LensRef = Rc<dyn Lens>;

/// The lens capability interface.
///
/// Each of the crate's combinators is a struct implementing this trait;
/// there is no runtime shape-sniffing. A combinator author implements the
/// two directions plus [`clone_lens`](Lens::clone_lens), registers direct
/// children through [`sublenses`](Lens::sublenses), and, only if it
/// notifies listeners itself, exposes a [`BindingSet`] through
/// [`binding_set`](Lens::binding_set). Traversal for `bind`/`unbind` and
/// statefulness detection then come for free.
pub trait Lens {
    /// A short name identifying the combinator, used in error frames.
    fn name(&self) -> &str;

    /// Projects the abstract view of `concrete`.
    fn get(&self, concrete: &Value) -> Result<Value>;

    /// Reconciles an edited abstract value with the prior concrete value.
    ///
    /// `concrete` may be [`Value::Undefined`], meaning there is no prior
    /// concrete value.
    fn putback(&self, abstract_value: &Value, concrete: &Value) -> Result<Value>;

    /// The immediate sub-lenses, for generic traversal.
    ///
    /// Stateful combinators include their lazily built per-key/per-index
    /// sub-lenses here so that `bind`/`unbind` reach them.
    fn sublenses(&self) -> Vec<LensRef> {
        Vec::new()
    }

    /// Whether this lens (or any sub-lens) carries mutable per-instance
    /// state.
    fn is_stateful(&self) -> bool {
        self.sublenses().iter().any(|child| child.is_stateful())
    }

    /// Produces a fresh, independently stateful copy.
    ///
    /// A stateless lens may simply duplicate itself; a stateful lens must
    /// not share caches or edit queues with the copy. Registered listeners
    /// are carried over.
    fn clone_lens(&self) -> LensRef;

    /// The local listener storage, if this combinator notifies listeners.
    fn binding_set(&self) -> Option<&BindingSet> {
        None
    }

    /// Registers a listener on this lens and, recursively, on all
    /// sub-lenses. Duplicate handles are ignored.
    fn bind(&self, listener: &Listener) {
        if let Some(bindings) = self.binding_set() {
            bindings.add(listener);
        }
        for child in self.sublenses() {
            child.bind(listener);
        }
    }

    /// Removes a listener from this lens and, recursively, from all
    /// sub-lenses.
    fn unbind(&self, listener: &Listener) {
        if let Some(bindings) = self.binding_set() {
            bindings.remove(listener);
        }
        for child in self.sublenses() {
            child.unbind(listener);
        }
    }
}

/// The notification interface for binding listeners.
///
/// The engine attaches no semantics to a listener beyond calling
/// [`structure_changed`](BindingListener::structure_changed) when a stateful
/// lens has queued a structural edit and wants the outside world to run a
/// new `putback` cycle.
pub trait BindingListener {
    /// Called synchronously when a structural edit has been queued.
    fn structure_changed(&self);
}

/// An opaque, shareable listener handle. Identity is pointer identity.
pub type Listener = Rc<dyn BindingListener>;

/// An insertion-ordered, pointer-deduplicated set of listeners.
#[derive(Default)]
pub struct BindingSet {
    listeners: RefCell<SmallVec<[Listener; 2]>>,
}

impl BindingSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a listener unless an identical handle is already present.
    pub fn add(&self, listener: &Listener) {
        let mut listeners = self.listeners.borrow_mut();
        if !listeners.iter().any(|known| Rc::ptr_eq(known, listener)) {
            listeners.push(Rc::clone(listener));
        }
    }

    /// Removes a listener by handle identity.
    pub fn remove(&self, listener: &Listener) {
        self.listeners
            .borrow_mut()
            .retain(|known| !Rc::ptr_eq(known, listener));
    }

    /// Notifies every registered listener, in insertion order.
    ///
    /// The listener list is snapshotted first, so a listener may bind or
    /// unbind reentrantly.
    pub fn notify(&self) {
        for listener in self.snapshot() {
            listener.structure_changed();
        }
    }

    /// The current listeners, in insertion order.
    pub fn snapshot(&self) -> Vec<Listener> {
        self.listeners.borrow().iter().map(Rc::clone).collect()
    }

    /// The number of registered listeners.
    pub fn len(&self) -> usize {
        self.listeners.borrow().len()
    }

    /// Whether no listeners are registered.
    pub fn is_empty(&self) -> bool {
        self.listeners.borrow().is_empty()
    }
}

impl Clone for BindingSet {
    fn clone(&self) -> Self {
        Self {
            listeners: RefCell::new(self.listeners.borrow().clone()),
        }
    }
}

impl fmt::Debug for BindingSet {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("BindingSet")
            .field("len", &self.len())
            .finish()
    }
}
