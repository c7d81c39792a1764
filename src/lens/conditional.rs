//! Conditional dispatch lenses.
//!
//! These combinators choose between two sub-lenses per call. They differ in
//! which side of the lens the dispatch predicate inspects, and in how they
//! reconcile a putback whose abstract value has switched branches since the
//! last get.

use std::rc::Rc;

use crate::error::{Frame, LensError, Result};
use crate::value::{Value, ValuePred};

use super::{Lens, LensRef, identity, rename};

// =============================================================================
// Ccond
// =============================================================================

struct Ccond {
    pred: ValuePred,
    pass: LensRef,
    fail: LensRef,
}

impl Ccond {
    fn branch(&self, concrete: &Value) -> &LensRef {
        if self.pred.check(concrete) {
            &self.pass
        } else {
            &self.fail
        }
    }

    fn describe(&self) -> String {
        format!("{}, {}", self.pass.name(), self.fail.name())
    }
}

impl Lens for Ccond {
    fn name(&self) -> &str {
        "ccond"
    }

    fn get(&self, concrete: &Value) -> Result<Value> {
        self.branch(concrete)
            .get(concrete)
            .map_err(|error| error.with_frame(Frame::new("ccond", self.describe(), "get")))
    }

    fn putback(&self, abstract_value: &Value, concrete: &Value) -> Result<Value> {
        self.branch(concrete)
            .putback(abstract_value, concrete)
            .map_err(|error| error.with_frame(Frame::new("ccond", self.describe(), "putback")))
    }

    fn sublenses(&self) -> Vec<LensRef> {
        vec![Rc::clone(&self.pass), Rc::clone(&self.fail)]
    }

    fn clone_lens(&self) -> LensRef {
        Rc::new(Self {
            pred: self.pred.clone(),
            pass: self.pass.clone_lens(),
            fail: self.fail.clone_lens(),
        })
    }
}

/// Dispatches on a predicate over the *concrete* value, in both directions.
///
/// The predicate is evaluated fresh on every call. Appropriate only when
/// the two branches' abstract images are disjoint under the predicate
/// reapplied; otherwise a branch-switching edit sends the putback through
/// the wrong lens.
pub fn ccond(pred: ValuePred, pass: LensRef, fail: LensRef) -> LensRef {
    Rc::new(Ccond { pred, pass, fail })
}

// =============================================================================
// Acond
// =============================================================================

struct Acond {
    concrete_pred: ValuePred,
    abstract_pred: ValuePred,
    pass: LensRef,
    fail: LensRef,
}

impl Acond {
    fn describe(&self) -> String {
        format!("{}, {}", self.pass.name(), self.fail.name())
    }
}

impl Lens for Acond {
    fn name(&self) -> &str {
        "acond"
    }

    fn get(&self, concrete: &Value) -> Result<Value> {
        let branch = if self.concrete_pred.check(concrete) {
            &self.pass
        } else {
            &self.fail
        };
        branch
            .get(concrete)
            .map_err(|error| error.with_frame(Frame::new("acond", self.describe(), "get")))
    }

    fn putback(&self, abstract_value: &Value, concrete: &Value) -> Result<Value> {
        // Dispatch on the abstract side. When that disagrees with what the
        // concrete side would have chosen, the edit has switched branches,
        // and the prior concrete value belongs to the other branch: the
        // chosen lens runs without it.
        let concrete_picks_pass = self.concrete_pred.check(concrete);
        let result = if self.abstract_pred.check(abstract_value) {
            if concrete_picks_pass {
                self.pass.putback(abstract_value, concrete)
            } else {
                self.pass.putback(abstract_value, &Value::Undefined)
            }
        } else if concrete_picks_pass {
            self.fail.putback(abstract_value, &Value::Undefined)
        } else {
            self.fail.putback(abstract_value, concrete)
        };
        result.map_err(|error| error.with_frame(Frame::new("acond", self.describe(), "putback")))
    }

    fn sublenses(&self) -> Vec<LensRef> {
        vec![Rc::clone(&self.pass), Rc::clone(&self.fail)]
    }

    fn clone_lens(&self) -> LensRef {
        Rc::new(Self {
            concrete_pred: self.concrete_pred.clone(),
            abstract_pred: self.abstract_pred.clone(),
            pass: self.pass.clone_lens(),
            fail: self.fail.clone_lens(),
        })
    }
}

/// Dispatches `get` on a concrete predicate and `putback` on an abstract
/// predicate.
///
/// When the two disagree during putback, the chosen branch runs with the
/// concrete value replaced by `Undefined`, which keeps reconciliation
/// correct when the abstract edit has switched branches.
pub fn acond(
    concrete_pred: ValuePred,
    abstract_pred: ValuePred,
    pass: LensRef,
    fail: LensRef,
) -> LensRef {
    Rc::new(Acond {
        concrete_pred,
        abstract_pred,
        pass,
        fail,
    })
}

// =============================================================================
// Cond
// =============================================================================

type AdaptFn = dyn Fn(&Value) -> Value;

struct Cond {
    concrete_pred: ValuePred,
    abstract_pass_pred: ValuePred,
    abstract_fail_pred: ValuePred,
    pass_adapter: Rc<AdaptFn>,
    fail_adapter: Rc<AdaptFn>,
    pass: LensRef,
    fail: LensRef,
}

impl Cond {
    fn describe(&self) -> String {
        format!("{}, {}", self.pass.name(), self.fail.name())
    }
}

impl Lens for Cond {
    fn name(&self) -> &str {
        "cond"
    }

    fn get(&self, concrete: &Value) -> Result<Value> {
        let branch = if self.concrete_pred.check(concrete) {
            &self.pass
        } else {
            &self.fail
        };
        branch
            .get(concrete)
            .map_err(|error| error.with_frame(Frame::new("cond", self.describe(), "get")))
    }

    fn putback(&self, abstract_value: &Value, concrete: &Value) -> Result<Value> {
        let pass_holds = self.abstract_pass_pred.check(abstract_value);
        let fail_holds = self.abstract_fail_pred.check(abstract_value);
        let concrete_picks_pass = self.concrete_pred.check(concrete);
        let result = match (pass_holds, fail_holds) {
            (true, true) => {
                if concrete_picks_pass {
                    self.pass.putback(abstract_value, concrete)
                } else {
                    self.fail.putback(abstract_value, concrete)
                }
            }
            (true, false) => {
                let adapted = if concrete_picks_pass {
                    concrete.clone()
                } else {
                    (self.pass_adapter)(concrete)
                };
                self.pass.putback(abstract_value, &adapted)
            }
            (false, true) => {
                let adapted = if concrete_picks_pass {
                    (self.fail_adapter)(concrete)
                } else {
                    concrete.clone()
                };
                self.fail.putback(abstract_value, &adapted)
            }
            (false, false) => Err(LensError::new(
                "cond",
                format!("neither abstract predicate matched {abstract_value}"),
            )),
        };
        result.map_err(|error| error.with_frame(Frame::new("cond", self.describe(), "putback")))
    }

    fn sublenses(&self) -> Vec<LensRef> {
        vec![Rc::clone(&self.pass), Rc::clone(&self.fail)]
    }

    fn clone_lens(&self) -> LensRef {
        Rc::new(Self {
            concrete_pred: self.concrete_pred.clone(),
            abstract_pass_pred: self.abstract_pass_pred.clone(),
            abstract_fail_pred: self.abstract_fail_pred.clone(),
            pass_adapter: Rc::clone(&self.pass_adapter),
            fail_adapter: Rc::clone(&self.fail_adapter),
            pass: self.pass.clone_lens(),
            fail: self.fail.clone_lens(),
        })
    }
}

/// The fully general four-predicate conditional.
///
/// `get` dispatches on `concrete_pred`. During `putback`, `abstract_pass_pred`
/// and `abstract_fail_pred` classify the edited abstract value:
///
/// - both hold: dispatch on `concrete_pred` as usual;
/// - only the pass predicate holds: use `pass`, with the concrete value run
///   through `pass_to_fail` when `concrete_pred` had picked the other branch;
/// - only the fail predicate holds: symmetric, via `fail_to_pass`;
/// - neither holds: fatal.
///
/// It is the caller's responsibility (not enforced) that one of the two
/// abstract predicates holds for every reachable abstract value.
#[allow(clippy::too_many_arguments)]
pub fn cond(
    concrete_pred: ValuePred,
    abstract_pass_pred: ValuePred,
    abstract_fail_pred: ValuePred,
    pass_to_fail: impl Fn(&Value) -> Value + 'static,
    fail_to_pass: impl Fn(&Value) -> Value + 'static,
    pass: LensRef,
    fail: LensRef,
) -> LensRef {
    Rc::new(Cond {
        concrete_pred,
        abstract_pass_pred,
        abstract_fail_pred,
        pass_adapter: Rc::new(pass_to_fail),
        fail_adapter: Rc::new(fail_to_pass),
        pass,
        fail,
    })
}

/// Renames `from` to `to` when present, and is the identity otherwise.
pub fn rename_if_present(from: impl Into<String>, to: impl Into<String>) -> LensRef {
    let from = from.into();
    let to = to.into();
    acond(
        ValuePred::has(from.clone()),
        ValuePred::has(to.clone()),
        rename(from, to),
        identity(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record;

    #[test]
    fn test_ccond_dispatches_on_concrete() {
        let lens = ccond(
            ValuePred::new(|value| value.as_num().is_some()),
            super::super::plus(1.0, Value::Undefined),
            identity(),
        );
        assert_eq!(lens.get(&Value::Num(1.0)).expect("get"), Value::Num(2.0));
        assert_eq!(
            lens.get(&Value::Str("s".into())).expect("get"),
            Value::Str("s".into())
        );
    }

    #[test]
    fn test_acond_branch_switch_hides_concrete() {
        // pass branch echoes the concrete value it was given.
        let lens = acond(
            ValuePred::has("a"),
            ValuePred::has("a"),
            super::super::constant(record! { "a" => 1.0 }, record! { "fresh" => true }),
            identity(),
        );
        // Abstract says pass, concrete says fail: the pass lens must not see
        // the (fail-shaped) concrete value, so the constant default appears.
        let result = lens
            .putback(&record! { "a" => 1.0 }, &record! { "b" => 2.0 })
            .expect("putback");
        assert_eq!(result, record! { "fresh" => true });
    }

    #[test]
    fn test_cond_fails_when_no_abstract_predicate_matches() {
        let lens = cond(
            ValuePred::always(),
            ValuePred::has("a"),
            ValuePred::has("b"),
            |concrete| concrete.clone(),
            |concrete| concrete.clone(),
            identity(),
            identity(),
        );
        let error = lens
            .putback(&record! { "c" => 1.0 }, &record! {})
            .expect_err("neither predicate");
        assert!(error.to_string().contains("neither abstract predicate"));
    }

    #[test]
    fn test_rename_if_present() {
        let lens = rename_if_present("old", "new");
        let renamed = lens.get(&record! { "old" => 1.0 }).expect("get");
        assert_eq!(renamed, record! { "new" => 1.0 });
        let untouched = lens.get(&record! { "other" => 1.0 }).expect("get");
        assert_eq!(untouched, record! { "other" => 1.0 });
        let restored = lens
            .putback(&record! { "new" => 5.0 }, &record! { "old" => 1.0 })
            .expect("putback");
        assert_eq!(restored, record! { "old" => 5.0 });
    }
}
