//! The stateful list-map lens.
//!
//! [`list_map`] applies a per-index sub-lens to every element of a sequence,
//! like [`value_map`](super::value_map) does for records, but it also
//! tracks *structural* edits. The factory building each index's sub-lens
//! receives an [`EditHooks`] handle whose `add_before`/`add_after`/`delete`
//! callbacks let external code (not a normal `putback`) queue an insertion
//! or deletion at that index. Queued edits are drained atomically at the
//! next `putback` and reconciled against both sides before the per-index
//! putbacks run.
//!
//! Enqueuing an edit synchronously notifies every listener registered via
//! [`Lens::bind`] so the outside world can schedule a re-synchronization;
//! debouncing is the listener's concern, not the engine's.
//!
//! # Example
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! use bilens::lens::{EditHooks, list_map, plus};
//! use bilens::seq_value;
//! use bilens::value::Value;
//!
//! let hooks: Rc<RefCell<Vec<EditHooks>>> = Rc::new(RefCell::new(Vec::new()));
//! let store = Rc::clone(&hooks);
//! let lens = list_map(move |hook| {
//!     store.borrow_mut().push(hook);
//!     plus(5.0, Value::Undefined)
//! });
//!
//! assert_eq!(lens.get(&seq_value![5.0, 6.0])?, seq_value![10.0, 11.0]);
//!
//! // External code asks for a 6.0 to appear after index 0.
//! let hook = hooks.borrow()[0].clone();
//! hook.add_after(Value::Num(6.0));
//!
//! // The next putback reconciles the edit atomically.
//! let rebuilt = lens.putback(&seq_value![10.0, 12.0], &seq_value![5.0, 7.0])?;
//! assert_eq!(rebuilt, seq_value![5.0, 6.0, 7.0]);
//! # Ok::<(), bilens::error::LensError>(())
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::{Frame, LensError, Result};
use crate::value::Value;

use super::list::expect_items;
use super::{BindingSet, Lens, LensRef};

/// A queued structural change against a [`list_map`] lens.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Edit {
    /// Splice `value` into the concrete list at `index`.
    Insert {
        /// The insertion position.
        index: usize,
        /// The concrete value to insert.
        value: Value,
    },
    /// Remove the element at `index`.
    Delete {
        /// The removal position.
        index: usize,
    },
}

struct ListMapState {
    lenses: Vec<LensRef>,
    queue: Vec<Edit>,
}

/// The structural-edit handle passed to a [`list_map`] sub-lens factory.
///
/// Each handle is fixed to the index it was created for. Enqueuing returns
/// immediately; the edit is applied at the next `putback`.
#[derive(Clone)]
pub struct EditHooks {
    index: usize,
    state: Rc<RefCell<ListMapState>>,
    bindings: Rc<BindingSet>,
}

impl EditHooks {
    /// The index this handle edits around.
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Queues an insertion of `value` just before this index.
    pub fn add_before(&self, value: Value) {
        self.enqueue(Edit::Insert {
            index: self.index,
            value,
        });
    }

    /// Queues an insertion of `value` just after this index.
    pub fn add_after(&self, value: Value) {
        self.enqueue(Edit::Insert {
            index: self.index + 1,
            value,
        });
    }

    /// Queues the deletion of this index.
    pub fn delete(&self) {
        self.enqueue(Edit::Delete { index: self.index });
    }

    fn enqueue(&self, edit: Edit) {
        self.state.borrow_mut().queue.push(edit);
        // Borrow released above: a listener may immediately run a putback.
        self.bindings.notify();
    }
}

type MakeFn = dyn Fn(EditHooks) -> LensRef;

struct ListMap {
    make: Rc<MakeFn>,
    state: Rc<RefCell<ListMapState>>,
    bindings: Rc<BindingSet>,
}

impl ListMap {
    /// Builds a fresh sub-lens for `index`, with current listeners bound.
    fn build(&self, index: usize) -> LensRef {
        let hooks = EditHooks {
            index,
            state: Rc::clone(&self.state),
            bindings: Rc::clone(&self.bindings),
        };
        let lens = (self.make)(hooks);
        for listener in self.bindings.snapshot() {
            lens.bind(&listener);
        }
        lens
    }

    /// Looks up the cached sub-lens for `index`, creating lazily up to it.
    fn lens_for(&self, index: usize) -> LensRef {
        loop {
            {
                let state = self.state.borrow();
                if let Some(lens) = state.lenses.get(index) {
                    return Rc::clone(lens);
                }
            }
            let next = self.state.borrow().lenses.len();
            let lens = self.build(next);
            self.state.borrow_mut().lenses.push(lens);
        }
    }

    fn frame(position: usize, direction: &str) -> Frame {
        Frame::new("list_map", format!("index {position}"), direction)
    }
}

impl Lens for ListMap {
    fn name(&self) -> &str {
        "list_map"
    }

    fn get(&self, concrete: &Value) -> Result<Value> {
        let items: Vec<Value> = match concrete {
            Value::Undefined => Vec::new(),
            other => expect_items("list_map", other)?.to_vec(),
        };
        let mut view = Vec::with_capacity(items.len());
        for (position, item) in items.iter().enumerate() {
            let projected = self
                .lens_for(position)
                .get(item)
                .map_err(|error| error.with_frame(Self::frame(position, "get")))?;
            view.push(projected);
        }
        Ok(Value::Seq(view))
    }

    fn putback(&self, abstract_value: &Value, concrete: &Value) -> Result<Value> {
        // Atomic drain: swap the queue for an empty one and work from the
        // snapshot, so edits enqueued by listeners during this putback land
        // in the next cycle.
        let edits: Vec<Edit> = std::mem::take(&mut self.state.borrow_mut().queue);

        let mut view: Vec<Value> = match abstract_value {
            Value::Undefined => Vec::new(),
            Value::Seq(items) => items.clone(),
            // A bare value coerces to a one-element list.
            other => vec![other.clone()],
        };
        let concrete_present = concrete.is_defined();
        let mut prior: Vec<Value> = if concrete_present {
            expect_items("list_map", concrete)?.to_vec()
        } else {
            Vec::new()
        };

        let edits_applied = concrete_present && !edits.is_empty();
        if concrete_present {
            for edit in &edits {
                match edit {
                    Edit::Insert { index, value } => {
                        let position = (*index).min(prior.len());
                        prior.insert(position, value.clone());
                        let fresh = self.build(position);
                        {
                            let mut state = self.state.borrow_mut();
                            let slot = position.min(state.lenses.len());
                            state.lenses.insert(slot, Rc::clone(&fresh));
                        }
                        let projected = fresh
                            .get(value)
                            .map_err(|error| error.with_frame(Self::frame(position, "putback")))?;
                        let view_position = position.min(view.len());
                        view.insert(view_position, projected);
                    }
                    Edit::Delete { index } => {
                        if *index < prior.len() {
                            prior.remove(*index);
                        }
                        if *index < view.len() {
                            view.remove(*index);
                        }
                        let mut state = self.state.borrow_mut();
                        if *index < state.lenses.len() {
                            state.lenses.remove(*index);
                        }
                    }
                }
            }
            if !prior.is_empty() && view.len() != prior.len() {
                return Err(LensError::new(
                    "list_map",
                    format!(
                        "list lengths don't match after edits: {} abstract vs {} concrete",
                        view.len(),
                        prior.len()
                    ),
                ));
            }
        }

        let mut result = Vec::with_capacity(view.len());
        for (position, item) in view.iter().enumerate() {
            let prior_item = prior.get(position).cloned().unwrap_or(Value::Undefined);
            let reconciled = self
                .lens_for(position)
                .putback(item, &prior_item)
                .map_err(|error| error.with_frame(Self::frame(position, "putback")))?;
            result.push(reconciled);
        }

        if edits_applied {
            // Every index at or past an edit point now names a different
            // logical element; stale per-index state must not survive.
            let rebuilt: Vec<LensRef> = (0..result.len()).map(|index| self.build(index)).collect();
            self.state.borrow_mut().lenses = rebuilt;
        }

        Ok(Value::Seq(result))
    }

    fn sublenses(&self) -> Vec<LensRef> {
        self.state.borrow().lenses.iter().map(Rc::clone).collect()
    }

    fn is_stateful(&self) -> bool {
        true
    }

    fn binding_set(&self) -> Option<&BindingSet> {
        Some(self.bindings.as_ref())
    }

    fn clone_lens(&self) -> LensRef {
        Rc::new(Self {
            make: Rc::clone(&self.make),
            state: Rc::new(RefCell::new(ListMapState {
                lenses: Vec::new(),
                queue: Vec::new(),
            })),
            bindings: Rc::new(self.bindings.as_ref().clone()),
        })
    }
}

/// Applies a per-index sub-lens to every element of a sequence, tracking
/// structural edits.
///
/// `make` is invoked once per list index to build that index's sub-lens; it
/// receives the index's [`EditHooks`]. Sub-lenses are cached per index and
/// rebuilt from scratch after a putback that applied edits.
pub fn list_map(make: impl Fn(EditHooks) -> LensRef + 'static) -> LensRef {
    Rc::new(ListMap {
        make: Rc::new(make),
        state: Rc::new(RefCell::new(ListMapState {
            lenses: Vec::new(),
            queue: Vec::new(),
        })),
        bindings: Rc::new(BindingSet::new()),
    })
}
