//! Arithmetic lenses over numeric scalars.
//!
//! Each of these is an [`invertible`](super::invertible) operator pairing an
//! arithmetic operation with its inverse, parameterized by a fixed operand
//! and a default for the absent abstract value.

use crate::error::{LensError, Result};
use crate::value::Value;

use super::{LensRef, invertible};

fn numeric(name: &str, value: &Value, operation: impl Fn(f64) -> f64) -> Result<Value> {
    value.as_num().map_or_else(
        || Err(LensError::new(name, format!("expected a number, got {value}"))),
        |number| Ok(Value::Num(operation(number))),
    )
}

/// A lens adding `operand` on `get` and subtracting it on `putback`.
pub fn plus(operand: f64, default: Value) -> LensRef {
    invertible(
        "plus",
        move |concrete| numeric("plus", concrete, |number| number + operand),
        move |abstract_value| numeric("plus", abstract_value, |number| number - operand),
        default,
    )
}

/// A lens subtracting `operand` on `get` and adding it on `putback`.
pub fn minus(operand: f64, default: Value) -> LensRef {
    invertible(
        "minus",
        move |concrete| numeric("minus", concrete, |number| number - operand),
        move |abstract_value| numeric("minus", abstract_value, |number| number + operand),
        default,
    )
}

/// A lens multiplying by `operand` on `get` and dividing on `putback`.
///
/// # Errors
///
/// Fails at construction when `operand` is zero: multiplication by zero has
/// no inverse. This is a static guard, not a per-call check.
pub fn times(operand: f64, default: Value) -> Result<LensRef> {
    if operand == 0.0 {
        return Err(LensError::new("times", "operand 0 has no inverse"));
    }
    Ok(invertible(
        "times",
        move |concrete| numeric("times", concrete, |number| number * operand),
        move |abstract_value| numeric("times", abstract_value, |number| number / operand),
        default,
    ))
}

/// A lens dividing by `operand` on `get` and multiplying on `putback`.
///
/// # Errors
///
/// Fails at construction when `operand` is zero.
pub fn divide(operand: f64, default: Value) -> Result<LensRef> {
    if operand == 0.0 {
        return Err(LensError::new("divide", "operand 0 has no inverse"));
    }
    Ok(invertible(
        "divide",
        move |concrete| numeric("divide", concrete, |number| number / operand),
        move |abstract_value| numeric("divide", abstract_value, |number| number * operand),
        default,
    ))
}
