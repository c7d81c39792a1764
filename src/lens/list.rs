//! List lenses: element projection, length, layout ordering, reordering,
//! grouping, flattening, and filtering.
//!
//! The stateful [`list_map`](super::list_map) lens lives in its own module;
//! everything here is stateless.

use std::collections::BTreeMap;
use std::rc::Rc;

use crate::error::{LensError, Result};
use crate::value::{Value, ValuePred};

use super::{Lens, LensRef};

pub(super) fn expect_items<'a>(lens: &str, value: &'a Value) -> Result<&'a [Value]> {
    value.as_seq().ok_or_else(|| {
        LensError::new(lens, format!("expected a sequence, got {value}"))
    })
}

fn items_or_empty(lens: &str, value: &Value) -> Result<Vec<Value>> {
    match value {
        Value::Undefined => Ok(Vec::new()),
        Value::Seq(items) => Ok(items.clone()),
        other => Err(LensError::new(
            lens,
            format!("expected a sequence, got {other}"),
        )),
    }
}

// =============================================================================
// Element Projection
// =============================================================================

#[derive(Clone)]
enum Position {
    First,
    Last,
    At(usize),
}

impl Position {
    fn resolve(&self, len: usize) -> usize {
        match self {
            Self::First => 0,
            Self::Last => len.saturating_sub(1),
            Self::At(position) => *position,
        }
    }
}

struct Element {
    name: &'static str,
    position: Position,
    default: Value,
}

impl Lens for Element {
    fn name(&self) -> &str {
        self.name
    }

    fn get(&self, concrete: &Value) -> Result<Value> {
        if !concrete.is_defined() {
            return Ok(Value::Undefined);
        }
        let items = expect_items(self.name, concrete)?;
        let position = self.position.resolve(items.len());
        Ok(items.get(position).cloned().unwrap_or(Value::Undefined))
    }

    fn putback(&self, abstract_value: &Value, concrete: &Value) -> Result<Value> {
        let base = if concrete.is_defined() {
            concrete
        } else {
            &self.default
        };
        let mut items = items_or_empty(self.name, base)?;
        let position = self.position.resolve(items.len());
        if position >= items.len() {
            items.resize(position + 1, Value::Undefined);
        }
        items[position] = abstract_value.clone();
        Ok(Value::Seq(items))
    }

    fn clone_lens(&self) -> LensRef {
        Rc::new(Self {
            name: self.name,
            position: self.position.clone(),
            default: self.default.clone(),
        })
    }
}

/// Projects the first element of a sequence.
///
/// `putback` clones the prior sequence (or `default` when there is none) and
/// overwrites the one position, preserving all others.
pub fn head(default: Value) -> LensRef {
    Rc::new(Element {
        name: "head",
        position: Position::First,
        default,
    })
}

/// Projects the last element of a sequence.
pub fn tail(default: Value) -> LensRef {
    Rc::new(Element {
        name: "tail",
        position: Position::Last,
        default,
    })
}

/// Projects the element at a fixed position.
pub fn index(position: usize, default: Value) -> LensRef {
    Rc::new(Element {
        name: "index",
        position: Position::At(position),
        default,
    })
}

// =============================================================================
// Length
// =============================================================================

/// Which end of the list [`length`] grows or shrinks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum End {
    /// The front of the list.
    Beginning,
    /// The back of the list.
    End,
}

struct Length {
    take_from: End,
    add_to: End,
    default: Value,
}

impl Lens for Length {
    fn name(&self) -> &str {
        "length"
    }

    fn get(&self, concrete: &Value) -> Result<Value> {
        let items = items_or_empty("length", concrete)?;
        #[allow(clippy::cast_precision_loss)]
        let len = items.len() as f64;
        Ok(Value::Num(len))
    }

    fn putback(&self, abstract_value: &Value, concrete: &Value) -> Result<Value> {
        let Some(number) = abstract_value.as_num() else {
            return Err(LensError::new(
                "length",
                format!("expected a numeric length, got {abstract_value}"),
            ));
        };
        if number < 0.0 || number.fract() != 0.0 {
            return Err(LensError::new(
                "length",
                format!("expected a non-negative integer length, got {number}"),
            ));
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let target = number as usize;
        let mut items = items_or_empty("length", concrete)?;
        if target < items.len() {
            let excess = items.len() - target;
            match self.take_from {
                End::Beginning => {
                    items.drain(..excess);
                }
                End::End => items.truncate(target),
            }
        } else if target > items.len() {
            let missing = target - items.len();
            let padding = std::iter::repeat_with(|| self.default.clone()).take(missing);
            match self.add_to {
                End::Beginning => {
                    let mut grown: Vec<Value> = padding.collect();
                    grown.extend(items);
                    items = grown;
                }
                End::End => items.extend(padding),
            }
        }
        Ok(Value::Seq(items))
    }

    fn clone_lens(&self) -> LensRef {
        Rc::new(Self {
            take_from: self.take_from,
            add_to: self.add_to,
            default: self.default.clone(),
        })
    }
}

/// Views a sequence as its length.
///
/// `putback` of an unchanged length is a no-op; shrinking removes elements
/// from the `take_from` end; growing adds clones of `default` at the
/// `add_to` end.
pub fn length(take_from: End, add_to: End, default: Value) -> LensRef {
    Rc::new(Length {
        take_from,
        add_to,
        default,
    })
}

// =============================================================================
// Order
// =============================================================================

struct Order {
    keys: Vec<String>,
}

impl Lens for Order {
    fn name(&self) -> &str {
        "order"
    }

    fn get(&self, concrete: &Value) -> Result<Value> {
        match concrete {
            Value::Undefined | Value::Record(_) => Ok(Value::Seq(
                self.keys
                    .iter()
                    .map(|key| concrete.entry(key).clone())
                    .collect(),
            )),
            other => Err(LensError::new(
                "order",
                format!("expected a record, got {other}"),
            )),
        }
    }

    fn putback(&self, abstract_value: &Value, _concrete: &Value) -> Result<Value> {
        let items: Vec<Value> = match abstract_value {
            Value::Seq(items) => items.clone(),
            // A single-key order tolerates a bare scalar in place of a
            // one-element sequence.
            other if self.keys.len() == 1 && other.is_defined() => vec![other.clone()],
            other => {
                return Err(LensError::new(
                    "order",
                    format!("expected a sequence, got {other}"),
                ));
            }
        };
        if items.len() != self.keys.len() {
            return Err(LensError::new(
                "order",
                format!(
                    "expected a sequence of length {}, got {}",
                    self.keys.len(),
                    items.len()
                ),
            ));
        }
        let mut entries = BTreeMap::new();
        for (key, item) in self.keys.iter().zip(items) {
            // Undefined slots are omitted rather than stored.
            if item.is_defined() {
                entries.insert(key.clone(), item);
            }
        }
        Ok(Value::Record(entries))
    }

    fn clone_lens(&self) -> LensRef {
        Rc::new(Self {
            keys: self.keys.clone(),
        })
    }
}

/// Converts a record into a fixed-order sequence, one slot per named key.
///
/// Absent keys read as `Undefined` slots; `putback` requires the sequence's
/// length to equal the key count and omits `Undefined` slots from the
/// reconstructed record.
pub fn order<I, K>(keys: I) -> LensRef
where
    I: IntoIterator<Item = K>,
    K: Into<String>,
{
    Rc::new(Order {
        keys: keys.into_iter().map(Into::into).collect(),
    })
}

// =============================================================================
// Reorderings
// =============================================================================

struct Rotate;

impl Lens for Rotate {
    fn name(&self) -> &str {
        "rotate"
    }

    fn get(&self, concrete: &Value) -> Result<Value> {
        if !concrete.is_defined() {
            return Ok(Value::Undefined);
        }
        let mut items = expect_items("rotate", concrete)?.to_vec();
        if !items.is_empty() {
            let first = items.remove(0);
            items.push(first);
        }
        Ok(Value::Seq(items))
    }

    fn putback(&self, abstract_value: &Value, _concrete: &Value) -> Result<Value> {
        if !abstract_value.is_defined() {
            return Ok(Value::Undefined);
        }
        let mut items = expect_items("rotate", abstract_value)?.to_vec();
        if let Some(last) = items.pop() {
            items.insert(0, last);
        }
        Ok(Value::Seq(items))
    }

    fn clone_lens(&self) -> LensRef {
        Rc::new(Self)
    }
}

/// Moves the first element to the end on `get`, and the last to the front on
/// `putback`.
pub fn rotate() -> LensRef {
    Rc::new(Rotate)
}

struct Reverse;

impl Reverse {
    fn flip(lens: &str, value: &Value) -> Result<Value> {
        if !value.is_defined() {
            return Ok(Value::Undefined);
        }
        let mut items = expect_items(lens, value)?.to_vec();
        items.reverse();
        Ok(Value::Seq(items))
    }
}

impl Lens for Reverse {
    fn name(&self) -> &str {
        "reverse"
    }

    fn get(&self, concrete: &Value) -> Result<Value> {
        Self::flip("reverse", concrete)
    }

    fn putback(&self, abstract_value: &Value, _concrete: &Value) -> Result<Value> {
        Self::flip("reverse", abstract_value)
    }

    fn clone_lens(&self) -> LensRef {
        Rc::new(Self)
    }
}

/// Reverses the sequence; its own inverse in both directions.
pub fn reverse() -> LensRef {
    Rc::new(Reverse)
}

// =============================================================================
// Group / Concat
// =============================================================================

struct Group {
    size: usize,
}

impl Lens for Group {
    fn name(&self) -> &str {
        "group"
    }

    fn get(&self, concrete: &Value) -> Result<Value> {
        if !concrete.is_defined() {
            return Ok(Value::Undefined);
        }
        let items = expect_items("group", concrete)?;
        Ok(Value::Seq(
            items
                .chunks(self.size)
                .map(|chunk| Value::Seq(chunk.to_vec()))
                .collect(),
        ))
    }

    fn putback(&self, abstract_value: &Value, _concrete: &Value) -> Result<Value> {
        if !abstract_value.is_defined() {
            return Ok(Value::Undefined);
        }
        let groups = expect_items("group", abstract_value)?;
        let mut flat = Vec::new();
        for group in groups {
            flat.extend(expect_items("group", group)?.iter().cloned());
        }
        Ok(Value::Seq(flat))
    }

    fn clone_lens(&self) -> LensRef {
        Rc::new(Self { size: self.size })
    }
}

/// Chunks a sequence into consecutive groups of `size` (the last group may
/// be shorter); `putback` concatenates the groups back regardless of their
/// possibly edited sizes.
///
/// # Errors
///
/// Fails at construction when `size` is zero.
pub fn group(size: usize) -> Result<LensRef> {
    if size == 0 {
        return Err(LensError::new("group", "group size must be positive"));
    }
    Ok(Rc::new(Group { size }))
}

struct Concat {
    spacer: Value,
}

impl Lens for Concat {
    fn name(&self) -> &str {
        "concat"
    }

    fn get(&self, concrete: &Value) -> Result<Value> {
        if !concrete.is_defined() {
            return Ok(Value::Undefined);
        }
        let sublists = expect_items("concat", concrete)?;
        let mut flat = Vec::new();
        for (position, sublist) in sublists.iter().enumerate() {
            if position > 0 {
                flat.push(self.spacer.clone());
            }
            flat.extend(expect_items("concat", sublist)?.iter().cloned());
        }
        Ok(Value::Seq(flat))
    }

    fn putback(&self, abstract_value: &Value, _concrete: &Value) -> Result<Value> {
        if !abstract_value.is_defined() {
            return Ok(Value::Undefined);
        }
        let flat = expect_items("concat", abstract_value)?;
        if flat.is_empty() {
            return Ok(Value::Seq(Vec::new()));
        }
        let mut sublists = Vec::new();
        let mut current = Vec::new();
        for item in flat {
            if *item == self.spacer {
                sublists.push(Value::Seq(std::mem::take(&mut current)));
            } else {
                current.push(item.clone());
            }
        }
        sublists.push(Value::Seq(current));
        Ok(Value::Seq(sublists))
    }

    fn clone_lens(&self) -> LensRef {
        Rc::new(Self {
            spacer: self.spacer.clone(),
        })
    }
}

/// Flattens a list of lists, inserting a cloned `spacer` between adjacent
/// sublists (not after the last).
///
/// `putback` re-segments the flat list by scanning for elements structurally
/// equal to the spacer, starting a new sublist after each. This is ambiguous
/// and lossy when a genuine element equals the spacer; the ambiguity is
/// inherited from the design and deliberately not resolved here.
pub fn concat(spacer: Value) -> LensRef {
    Rc::new(Concat { spacer })
}

// =============================================================================
// List Filter
// =============================================================================

struct ListFilter {
    keep: ValuePred,
    drop: ValuePred,
}

impl Lens for ListFilter {
    fn name(&self) -> &str {
        "list_filter"
    }

    fn get(&self, concrete: &Value) -> Result<Value> {
        if !concrete.is_defined() {
            return Ok(Value::Undefined);
        }
        let items = expect_items("list_filter", concrete)?;
        Ok(Value::Seq(
            items
                .iter()
                .filter(|item| !self.drop.check(item))
                .cloned()
                .collect(),
        ))
    }

    fn putback(&self, abstract_value: &Value, concrete: &Value) -> Result<Value> {
        let replacements = items_or_empty("list_filter", abstract_value)?;
        let mut result = items_or_empty("list_filter", concrete)?;
        // Walk the prior list left to right; each keep-matching slot absorbs
        // the next edited element in order. The predicates are not required
        // to be exhaustive or disjoint; with inconsistent predicates the
        // result is unspecified but the walk stays total.
        let mut next = 0usize;
        for slot in &mut result {
            if next >= replacements.len() {
                break;
            }
            if self.keep.check(slot) {
                *slot = replacements[next].clone();
                next += 1;
            }
        }
        result.extend(replacements[next..].iter().cloned());
        Ok(Value::Seq(result))
    }

    fn clone_lens(&self) -> LensRef {
        Rc::new(Self {
            keep: self.keep.clone(),
            drop: self.drop.clone(),
        })
    }
}

/// Keeps only the elements failing `drop` in the view.
///
/// `putback` walks the prior concrete list and overwrites each
/// `keep`-matching position with the next edited element, appending any
/// leftover edited elements at the end.
pub fn list_filter(keep: ValuePred, drop: ValuePred) -> LensRef {
    Rc::new(ListFilter { keep, drop })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seq_value;

    #[test]
    fn test_head_and_tail_preserve_other_elements() {
        let lens = head(seq_value![0.0]);
        assert_eq!(
            lens.get(&seq_value![1.0, 2.0, 3.0]).expect("get"),
            Value::Num(1.0)
        );
        assert_eq!(
            lens.putback(&Value::Num(9.0), &seq_value![1.0, 2.0, 3.0])
                .expect("putback"),
            seq_value![9.0, 2.0, 3.0]
        );

        let lens = tail(seq_value![0.0]);
        assert_eq!(
            lens.putback(&Value::Num(9.0), &seq_value![1.0, 2.0, 3.0])
                .expect("putback"),
            seq_value![1.0, 2.0, 9.0]
        );
    }

    #[test]
    fn test_index_uses_default_when_concrete_absent() {
        let lens = index(1, seq_value![0.0, 0.0]);
        assert_eq!(
            lens.putback(&Value::Num(5.0), &Value::Undefined)
                .expect("putback"),
            seq_value![0.0, 5.0]
        );
    }

    #[test]
    fn test_length_shrinks_and_grows_at_configured_ends() {
        let lens = length(End::End, End::Beginning, Value::Num(0.0));
        assert_eq!(
            lens.get(&seq_value![1.0, 2.0, 3.0]).expect("get"),
            Value::Num(3.0)
        );
        assert_eq!(
            lens.putback(&Value::Num(2.0), &seq_value![1.0, 2.0, 3.0])
                .expect("putback"),
            seq_value![1.0, 2.0]
        );
        assert_eq!(
            lens.putback(&Value::Num(4.0), &seq_value![1.0, 2.0])
                .expect("putback"),
            seq_value![0.0, 0.0, 1.0, 2.0]
        );
    }

    #[test]
    fn test_rotate_and_reverse_round_trip() {
        let lens = rotate();
        let view = lens.get(&seq_value![1.0, 2.0, 3.0]).expect("get");
        assert_eq!(view, seq_value![2.0, 3.0, 1.0]);
        assert_eq!(
            lens.putback(&view, &Value::Undefined).expect("putback"),
            seq_value![1.0, 2.0, 3.0]
        );

        let lens = reverse();
        let view = lens.get(&seq_value![1.0, 2.0]).expect("get");
        assert_eq!(view, seq_value![2.0, 1.0]);
        assert_eq!(
            lens.putback(&view, &Value::Undefined).expect("putback"),
            seq_value![1.0, 2.0]
        );
    }

    #[test]
    fn test_group_chunks_with_short_last_group() {
        let lens = group(2).expect("positive size");
        let view = lens.get(&seq_value![1.0, 2.0, 3.0]).expect("get");
        assert_eq!(
            view,
            Value::Seq(vec![seq_value![1.0, 2.0], seq_value![3.0]])
        );
        assert_eq!(
            lens.putback(&view, &Value::Undefined).expect("putback"),
            seq_value![1.0, 2.0, 3.0]
        );
        assert!(group(0).is_err());
    }

    #[test]
    fn test_concat_round_trip_and_spacer_ambiguity() {
        let lens = concat(Value::Str("|".into()));
        let nested = Value::Seq(vec![seq_value![1.0, 2.0], seq_value![3.0]]);
        let flat = lens.get(&nested).expect("get");
        assert_eq!(flat, seq_value![1.0, 2.0, "|", 3.0]);
        assert_eq!(lens.putback(&flat, &Value::Undefined).expect("putback"), nested);

        // A genuine element equal to the spacer starts a new sublist: the
        // documented lossy behavior.
        let ambiguous = seq_value![1.0, "|"];
        assert_eq!(
            lens.putback(&ambiguous, &Value::Undefined).expect("putback"),
            Value::Seq(vec![seq_value![1.0], seq_value![]])
        );
    }
}
