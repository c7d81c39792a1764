//! Primitive lenses: identity, constant, failure, invertible operators, and
//! sequencing.
//!
//! These are the atoms everything else is built from. `seq` in particular is
//! the composition operator: nearly every derived combinator in this crate
//! is a `seq` of smaller lenses.

use std::rc::Rc;

use crate::error::{Frame, LensError, Result};
use crate::value::Value;

use super::{Lens, LensRef};

// =============================================================================
// Identity
// =============================================================================

#[derive(Clone)]
struct Identity;

impl Lens for Identity {
    fn name(&self) -> &str {
        "id"
    }

    fn get(&self, concrete: &Value) -> Result<Value> {
        Ok(concrete.clone())
    }

    fn putback(&self, abstract_value: &Value, _concrete: &Value) -> Result<Value> {
        Ok(abstract_value.clone())
    }

    fn clone_lens(&self) -> LensRef {
        Rc::new(Self)
    }
}

/// The identity lens: `get` and `putback` both pass the value through.
pub fn identity() -> LensRef {
    Rc::new(Identity)
}

// =============================================================================
// Fail
// =============================================================================

#[derive(Clone)]
struct Fail {
    message: String,
}

impl Lens for Fail {
    fn name(&self) -> &str {
        "error"
    }

    fn get(&self, _concrete: &Value) -> Result<Value> {
        Err(LensError::new("error", format!("GET: {}", self.message)))
    }

    fn putback(&self, _abstract_value: &Value, _concrete: &Value) -> Result<Value> {
        Err(LensError::new("error", format!("PUTBACK: {}", self.message)))
    }

    fn clone_lens(&self) -> LensRef {
        Rc::new(self.clone())
    }
}

/// A lens that always fails, in either direction.
///
/// Useful as a placeholder or as the fatal branch of a conditional.
pub fn fail(message: impl Into<String>) -> LensRef {
    Rc::new(Fail {
        message: message.into(),
    })
}

// =============================================================================
// Constant
// =============================================================================

#[derive(Clone)]
struct Constant {
    value: Value,
    default: Value,
    strict: bool,
}

impl Lens for Constant {
    fn name(&self) -> &str {
        "const"
    }

    fn get(&self, _concrete: &Value) -> Result<Value> {
        Ok(self.value.clone())
    }

    fn putback(&self, abstract_value: &Value, concrete: &Value) -> Result<Value> {
        if self.strict && *abstract_value != self.value {
            return Err(LensError::new(
                "const",
                format!(
                    "abstract value was edited away from its constant: expected {}, got {}",
                    self.value, abstract_value
                ),
            ));
        }
        if concrete.is_defined() {
            Ok(concrete.clone())
        } else {
            Ok(self.default.clone())
        }
    }

    fn clone_lens(&self) -> LensRef {
        Rc::new(self.clone())
    }
}

/// A lens whose view is always `value`.
///
/// `putback` requires the abstract value to still equal `value`
/// (structurally), then returns the prior concrete value unchanged, or
/// `default` when there is none.
pub fn constant(value: Value, default: Value) -> LensRef {
    Rc::new(Constant {
        value,
        default,
        strict: true,
    })
}

/// Like [`constant`], but `putback` silently discards any edit to the view.
///
/// Legal, but violates the PutGet law: an edited abstract value does not
/// survive a putback/get round trip. Prefer [`constant`] unless the view is
/// genuinely write-only decoration.
pub fn constant_lax(value: Value, default: Value) -> LensRef {
    Rc::new(Constant {
        value,
        default,
        strict: false,
    })
}

// =============================================================================
// Invertible Operator
// =============================================================================

type OpFn = dyn Fn(&Value) -> Result<Value>;

struct Invertible {
    name: String,
    forward: Rc<OpFn>,
    inverse: Rc<OpFn>,
    default: Value,
}

impl Lens for Invertible {
    fn name(&self) -> &str {
        &self.name
    }

    fn get(&self, concrete: &Value) -> Result<Value> {
        (self.forward)(concrete)
    }

    fn putback(&self, abstract_value: &Value, _concrete: &Value) -> Result<Value> {
        if abstract_value.is_defined() {
            (self.inverse)(abstract_value)
        } else {
            Ok(self.default.clone())
        }
    }

    fn clone_lens(&self) -> LensRef {
        Rc::new(Self {
            name: self.name.clone(),
            forward: Rc::clone(&self.forward),
            inverse: Rc::clone(&self.inverse),
            default: self.default.clone(),
        })
    }
}

/// Wraps a unary operation and its inverse as a lens.
///
/// `get` applies `forward`; `putback` applies `inverse` to the abstract
/// value, ignoring the prior concrete value, or returns `default` when the
/// abstract value is absent. The caller is responsible for `inverse` really
/// inverting `forward`; the arithmetic lenses are built this way.
pub fn invertible(
    name: impl Into<String>,
    forward: impl Fn(&Value) -> Result<Value> + 'static,
    inverse: impl Fn(&Value) -> Result<Value> + 'static,
    default: Value,
) -> LensRef {
    Rc::new(Invertible {
        name: name.into(),
        forward: Rc::new(forward),
        inverse: Rc::new(inverse),
        default,
    })
}

// =============================================================================
// Sequence
// =============================================================================

struct Seq {
    lenses: Vec<LensRef>,
}

impl Seq {
    fn describe(&self) -> String {
        let names: Vec<&str> = self.lenses.iter().map(|lens| lens.name()).collect();
        names.join(", ")
    }

    fn putback_chain(lenses: &[LensRef], abstract_value: &Value, concrete: &Value) -> Result<Value> {
        match lenses {
            [] => Ok(abstract_value.clone()),
            [last] => last.putback(abstract_value, concrete),
            [first, rest @ ..] => {
                // The intermediate concrete value is recomputed here rather
                // than cached from a previous get: the inner lens needs the
                // concrete context as it stands *now*.
                let intermediate = first.get(concrete)?;
                let pushed = Self::putback_chain(rest, abstract_value, &intermediate)?;
                first.putback(&pushed, concrete)
            }
        }
    }
}

impl Lens for Seq {
    fn name(&self) -> &str {
        "seq"
    }

    fn get(&self, concrete: &Value) -> Result<Value> {
        let mut current = concrete.clone();
        for lens in &self.lenses {
            current = lens
                .get(&current)
                .map_err(|error| error.with_frame(Frame::new("seq", self.describe(), "get")))?;
        }
        Ok(current)
    }

    fn putback(&self, abstract_value: &Value, concrete: &Value) -> Result<Value> {
        Self::putback_chain(&self.lenses, abstract_value, concrete)
            .map_err(|error| error.with_frame(Frame::new("seq", self.describe(), "putback")))
    }

    fn sublenses(&self) -> Vec<LensRef> {
        self.lenses.clone()
    }

    fn clone_lens(&self) -> LensRef {
        Rc::new(Self {
            lenses: self.lenses.iter().map(|lens| lens.clone_lens()).collect(),
        })
    }
}

/// Composes two or more lenses left to right.
///
/// `get` threads the concrete value through every lens in order. `putback`
/// is the right fold of pairwise composition:
/// `l.putback(&k.putback(a, &l.get(c)?)?, c)`; note that `l.get(c)` is
/// recomputed during putback to supply the inner lens its concrete context.
///
/// # Errors
///
/// Fails at construction when fewer than two lenses are supplied. Sub-lens
/// failures are rethrown with a `"seq"` frame naming the chain and the
/// direction.
pub fn seq(lenses: Vec<LensRef>) -> Result<LensRef> {
    if lenses.len() < 2 {
        return Err(LensError::new(
            "seq",
            format!("expected at least two lenses, got {}", lenses.len()),
        ));
    }
    Ok(Rc::new(Seq { lenses }))
}

/// Composition for derived combinators whose arity is known statically.
pub(crate) fn seq_unchecked(lenses: Vec<LensRef>) -> LensRef {
    Rc::new(Seq { lenses })
}
