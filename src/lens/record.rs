//! Object-reshaping lenses over keyed records.
//!
//! The workhorse here is [`xfork`], which routes disjoint halves of a record
//! through two sub-lenses and merges the results. Most other combinators in
//! this module (`fork`, `filter`, `prune`, `add`, `focus`, `rename`) are
//! thin compositions over `xfork`, [`hoist`]/[`plunge`], and the primitives,
//! built the same way larger optics are assembled from smaller ones.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::error::{Frame, LensError, Result};
use crate::record;
use crate::value::{KeyPred, Value};

use super::primitive::seq_unchecked;
use super::{BindingSet, Lens, LensRef, constant, identity};

// =============================================================================
// Record Utilities
// =============================================================================

/// Partitions a record's entries by a key predicate.
///
/// Returns `(matching, rest)`.
pub fn split(
    record: &BTreeMap<String, Value>,
    pred: &KeyPred,
) -> (BTreeMap<String, Value>, BTreeMap<String, Value>) {
    let mut matching = BTreeMap::new();
    let mut rest = BTreeMap::new();
    for (key, value) in record {
        if pred.matches(key) {
            matching.insert(key.clone(), value.clone());
        } else {
            rest.insert(key.clone(), value.clone());
        }
    }
    (matching, rest)
}

/// Unions two records, calling `on_collision` when both define a key.
///
/// The collision policy is per-caller: `xfork` treats a collision as fatal,
/// other callers may not.
pub fn merge(
    left: BTreeMap<String, Value>,
    right: BTreeMap<String, Value>,
    on_collision: impl Fn(&str) -> LensError,
) -> Result<BTreeMap<String, Value>> {
    let mut merged = left;
    for (key, value) in right {
        if merged.contains_key(&key) {
            return Err(on_collision(&key));
        }
        merged.insert(key, value);
    }
    Ok(merged)
}

/// Splits a possibly-absent record value into `(matching, rest)` halves.
///
/// `Undefined` splits into two `Undefined` halves so that sub-lenses see the
/// absence rather than a fabricated empty record.
fn split_halves(lens: &str, value: &Value, pred: &KeyPred) -> Result<(Value, Value)> {
    match value {
        Value::Undefined => Ok((Value::Undefined, Value::Undefined)),
        Value::Record(entries) => {
            let (matching, rest) = split(entries, pred);
            Ok((Value::Record(matching), Value::Record(rest)))
        }
        other => Err(LensError::new(
            lens,
            format!("expected a record, got {other}"),
        )),
    }
}

/// Merges two branch outputs, which must be records (or absent).
fn merge_halves(lens: &str, left: &Value, right: &Value) -> Result<Value> {
    let as_entries = |value: &Value| -> Result<BTreeMap<String, Value>> {
        match value {
            Value::Undefined => Ok(BTreeMap::new()),
            Value::Record(entries) => Ok(entries.clone()),
            other => Err(LensError::new(
                lens,
                format!("branch produced a non-record: {other}"),
            )),
        }
    };
    let merged = merge(as_entries(left)?, as_entries(right)?, |key| {
        LensError::new(lens, format!("key collision on {key:?}"))
    })?;
    Ok(Value::Record(merged))
}

fn expect_record<'a>(lens: &str, value: &'a Value) -> Result<&'a BTreeMap<String, Value>> {
    value.as_record().ok_or_else(|| {
        LensError::new(lens, format!("expected a record, got {value}"))
    })
}

fn record_or_empty(lens: &str, value: &Value) -> Result<BTreeMap<String, Value>> {
    match value {
        Value::Undefined => Ok(BTreeMap::new()),
        Value::Record(entries) => Ok(entries.clone()),
        other => Err(LensError::new(
            lens,
            format!("expected a record, got {other}"),
        )),
    }
}

// =============================================================================
// Hoist / Plunge
// =============================================================================

struct Hoist {
    key: String,
    check: bool,
}

impl Lens for Hoist {
    fn name(&self) -> &str {
        "hoist"
    }

    fn get(&self, concrete: &Value) -> Result<Value> {
        if !concrete.is_defined() {
            return Ok(Value::Undefined);
        }
        let entries = expect_record("hoist", concrete)?;
        if self.check && !(entries.len() == 1 && entries.contains_key(&self.key)) {
            return Err(LensError::new(
                "hoist",
                format!("expected a record with the single key {:?}, got {concrete}", self.key),
            ));
        }
        Ok(entries.get(&self.key).cloned().unwrap_or(Value::Undefined))
    }

    fn putback(&self, abstract_value: &Value, _concrete: &Value) -> Result<Value> {
        Ok(record! { self.key.as_str() => abstract_value.clone() })
    }

    fn clone_lens(&self) -> LensRef {
        Rc::new(Self {
            key: self.key.clone(),
            check: self.check,
        })
    }
}

/// Unwraps the value stored under `key`: `get` projects `c[key]`, `putback`
/// rebuilds `{key: a}`.
pub fn hoist(key: impl Into<String>) -> LensRef {
    Rc::new(Hoist {
        key: key.into(),
        check: false,
    })
}

/// Like [`hoist`], but `get` fails unless `key` is the record's only key.
pub fn hoist_checked(key: impl Into<String>) -> LensRef {
    Rc::new(Hoist {
        key: key.into(),
        check: true,
    })
}

struct Plunge {
    key: String,
    check: bool,
}

impl Lens for Plunge {
    fn name(&self) -> &str {
        "plunge"
    }

    fn get(&self, concrete: &Value) -> Result<Value> {
        Ok(record! { self.key.as_str() => concrete.clone() })
    }

    fn putback(&self, abstract_value: &Value, _concrete: &Value) -> Result<Value> {
        let entries = expect_record("plunge", abstract_value)?;
        if self.check && !(entries.len() == 1 && entries.contains_key(&self.key)) {
            return Err(LensError::new(
                "plunge",
                format!(
                    "expected a record with the single key {:?}, got {abstract_value}",
                    self.key
                ),
            ));
        }
        Ok(entries.get(&self.key).cloned().unwrap_or(Value::Undefined))
    }

    fn clone_lens(&self) -> LensRef {
        Rc::new(Self {
            key: self.key.clone(),
            check: self.check,
        })
    }
}

/// Wraps the concrete value under `key`: the dual of [`hoist`].
///
/// `putback` fails unconditionally when the abstract value is not a record.
pub fn plunge(key: impl Into<String>) -> LensRef {
    Rc::new(Plunge {
        key: key.into(),
        check: false,
    })
}

/// Like [`plunge`], but `putback` fails unless `key` is the abstract
/// record's only key.
pub fn plunge_checked(key: impl Into<String>) -> LensRef {
    Rc::new(Plunge {
        key: key.into(),
        check: true,
    })
}

// =============================================================================
// Xfork and its Derivatives
// =============================================================================

struct Xfork {
    concrete_pred: KeyPred,
    abstract_pred: KeyPred,
    pass: LensRef,
    fail: LensRef,
}

impl Xfork {
    fn describe(&self) -> String {
        format!("{}, {}", self.pass.name(), self.fail.name())
    }
}

impl Lens for Xfork {
    fn name(&self) -> &str {
        "xfork"
    }

    fn get(&self, concrete: &Value) -> Result<Value> {
        let (matching, rest) = split_halves("xfork", concrete, &self.concrete_pred)?;
        let frame = |error: LensError| error.with_frame(Frame::new("xfork", self.describe(), "get"));
        let pass_view = self.pass.get(&matching).map_err(frame)?;
        let fail_view = self.fail.get(&rest).map_err(frame)?;
        merge_halves("xfork", &pass_view, &fail_view)
    }

    fn putback(&self, abstract_value: &Value, concrete: &Value) -> Result<Value> {
        let (abstract_pass, abstract_fail) =
            split_halves("xfork", abstract_value, &self.abstract_pred)?;
        let (concrete_pass, concrete_fail) =
            split_halves("xfork", concrete, &self.concrete_pred)?;
        let frame =
            |error: LensError| error.with_frame(Frame::new("xfork", self.describe(), "putback"));
        let pass_result = self
            .pass
            .putback(&abstract_pass, &concrete_pass)
            .map_err(frame)?;
        let fail_result = self
            .fail
            .putback(&abstract_fail, &concrete_fail)
            .map_err(frame)?;
        merge_halves("xfork", &pass_result, &fail_result)
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

/// Splits a record by two key predicates and routes the halves through two
/// lenses.
///
/// `get` splits the concrete record by `concrete_pred`, sends the matching
/// half through `pass` and the rest through `fail`, and merges the views.
/// `putback` splits the abstract record by `abstract_pred` and the concrete
/// record by `concrete_pred` independently, puts back each pair through the
/// matching lens, and merges. Either direction fails on a key collision
/// between the branch outputs.
pub fn xfork(
    concrete_pred: impl Into<KeyPred>,
    abstract_pred: impl Into<KeyPred>,
    pass: LensRef,
    fail: LensRef,
) -> LensRef {
    Rc::new(Xfork {
        concrete_pred: concrete_pred.into(),
        abstract_pred: abstract_pred.into(),
        pass,
        fail,
    })
}

/// [`xfork`] with the same predicate on both sides.
pub fn fork(pred: impl Into<KeyPred>, pass: LensRef, fail: LensRef) -> LensRef {
    let pred = pred.into();
    xfork(pred.clone(), pred, pass, fail)
}

/// Keeps only the keys matching `pred` in the view; `putback` restores the
/// non-matching keys from the prior concrete value, or from `default` when
/// there is none.
pub fn filter(pred: impl Into<KeyPred>, default: Value) -> LensRef {
    fork(pred, identity(), constant(record! {}, default))
}

/// Removes `key` from the view; `putback` reinstates it from the prior
/// concrete value, or as `default` when there is none.
pub fn prune(key: impl Into<String>, default: Value) -> LensRef {
    let key = key.into();
    let fallback = record! { key.as_str() => default };
    fork(
        KeyPred::Key(key),
        constant(record! {}, fallback),
        identity(),
    )
}

/// Introduces `key` in the view only, with the fixed value `value`.
///
/// `get` fails if the concrete record already defines `key`; `putback`
/// strips `key` back out (and fails if its value was edited away from
/// `value`).
pub fn add(key: impl Into<String>, value: Value) -> LensRef {
    let key = key.into();
    xfork(
        KeyPred::Never,
        KeyPred::Key(key.clone()),
        seq_unchecked(vec![constant(value, record! {}), plunge(key)]),
        identity(),
    )
}

/// Projects the value of one key, defaulting the rest of the record on
/// reconstruction.
///
/// Equivalent to `seq(filter(key, default), hoist(key))`.
pub fn focus(key: impl Into<String>, default: Value) -> LensRef {
    let key = key.into();
    seq_unchecked(vec![
        filter(KeyPred::Key(key.clone()), default),
        hoist(key),
    ])
}

/// Renames the key `from` to `to`, leaving everything else alone.
pub fn rename(from: impl Into<String>, to: impl Into<String>) -> LensRef {
    let from = from.into();
    let to = to.into();
    xfork(
        KeyPred::Key(from.clone()),
        KeyPred::Key(to.clone()),
        seq_unchecked(vec![hoist(from), plunge(to)]),
        identity(),
    )
}

// =============================================================================
// Nonunique Hoist
// =============================================================================

struct HoistNonunique {
    key: String,
    grandchild_pred: KeyPred,
}

impl Lens for HoistNonunique {
    fn name(&self) -> &str {
        "hoist_nonunique"
    }

    fn get(&self, concrete: &Value) -> Result<Value> {
        if !concrete.is_defined() {
            return Ok(Value::Undefined);
        }
        let entries = expect_record("hoist_nonunique", concrete)?;
        let mut merged: BTreeMap<String, Value> = entries.clone();
        merged.remove(&self.key);
        let grandchildren = match entries.get(&self.key) {
            None | Some(Value::Undefined) => BTreeMap::new(),
            Some(Value::Record(inner)) => inner.clone(),
            Some(other) => {
                return Err(LensError::new(
                    "hoist_nonunique",
                    format!("value under {:?} is not a record: {other}", self.key),
                ));
            }
        };
        let merged = merge(merged, grandchildren, |collision| {
            LensError::new(
                "hoist_nonunique",
                format!("key collision on {collision:?} while unpacking {:?}", self.key),
            )
        })?;
        Ok(Value::Record(merged))
    }

    fn putback(&self, abstract_value: &Value, _concrete: &Value) -> Result<Value> {
        let entries = expect_record("hoist_nonunique", abstract_value)?;
        let (grandchildren, mut rest) = split(entries, &self.grandchild_pred);
        if rest.contains_key(&self.key) {
            return Err(LensError::new(
                "hoist_nonunique",
                format!("key collision on {:?}", self.key),
            ));
        }
        rest.insert(self.key.clone(), Value::Record(grandchildren));
        Ok(Value::Record(rest))
    }

    fn clone_lens(&self) -> LensRef {
        Rc::new(Self {
            key: self.key.clone(),
            grandchild_pred: self.grandchild_pred.clone(),
        })
    }
}

/// Like [`hoist`], but only the record under `key` is unpacked, merged into
/// the sibling level.
///
/// `grandchild_pred` identifies, during `putback`, which abstract-level keys
/// belong back under `key`.
pub fn hoist_nonunique(key: impl Into<String>, grandchild_pred: impl Into<KeyPred>) -> LensRef {
    Rc::new(HoistNonunique {
        key: key.into(),
        grandchild_pred: grandchild_pred.into(),
    })
}

// =============================================================================
// Per-Key Mapping
// =============================================================================

struct ValueMap {
    template: LensRef,
    cache: RefCell<BTreeMap<String, LensRef>>,
    bindings: BindingSet,
}

impl ValueMap {
    /// Looks up the lens for a key, lazily cloning the template when it is
    /// stateful so each key's edit history is independent.
    fn lens_for(&self, key: &str) -> LensRef {
        if !self.template.is_stateful() {
            return Rc::clone(&self.template);
        }
        let mut cache = self.cache.borrow_mut();
        if let Some(cached) = cache.get(key) {
            return Rc::clone(cached);
        }
        let fresh = self.template.clone_lens();
        for listener in self.bindings.snapshot() {
            fresh.bind(&listener);
        }
        cache.insert(key.to_string(), Rc::clone(&fresh));
        fresh
    }
}

impl Lens for ValueMap {
    fn name(&self) -> &str {
        "map"
    }

    fn get(&self, concrete: &Value) -> Result<Value> {
        let entries = record_or_empty("map", concrete)?;
        let mut view = BTreeMap::new();
        for (key, value) in &entries {
            let projected = self.lens_for(key).get(value).map_err(|error| {
                error.with_frame(Frame::new(
                    "map",
                    format!("key {key:?}, {}", self.template.name()),
                    "get",
                ))
            })?;
            view.insert(key.clone(), projected);
        }
        Ok(Value::Record(view))
    }

    fn putback(&self, abstract_value: &Value, concrete: &Value) -> Result<Value> {
        let abstract_entries = record_or_empty("map", abstract_value)?;
        let mut result = BTreeMap::new();
        for (key, value) in &abstract_entries {
            let reconciled = self
                .lens_for(key)
                .putback(value, concrete.entry(key))
                .map_err(|error| {
                    error.with_frame(Frame::new(
                        "map",
                        format!("key {key:?}, {}", self.template.name()),
                        "putback",
                    ))
                })?;
            result.insert(key.clone(), reconciled);
        }
        Ok(Value::Record(result))
    }

    fn sublenses(&self) -> Vec<LensRef> {
        let mut children = vec![Rc::clone(&self.template)];
        children.extend(self.cache.borrow().values().map(Rc::clone));
        children
    }

    fn is_stateful(&self) -> bool {
        self.template.is_stateful()
    }

    fn binding_set(&self) -> Option<&BindingSet> {
        Some(&self.bindings)
    }

    fn clone_lens(&self) -> LensRef {
        Rc::new(Self {
            template: self.template.clone_lens(),
            cache: RefCell::new(BTreeMap::new()),
            bindings: self.bindings.clone(),
        })
    }
}

/// Applies `lens` independently to every value of a record, preserving keys.
///
/// When `lens` is stateful, a fresh clone is cached per key (lazily) so that
/// each key's state is independent; the clones are rebuilt on
/// [`clone_lens`](Lens::clone_lens) so copies never alias state.
pub fn value_map(lens: LensRef) -> LensRef {
    Rc::new(ValueMap {
        template: lens,
        cache: RefCell::new(BTreeMap::new()),
        bindings: BindingSet::new(),
    })
}

struct Wmap {
    groups: Vec<(Vec<String>, LensRef)>,
    default_to_id: bool,
    cache: RefCell<BTreeMap<String, LensRef>>,
    bindings: BindingSet,
}

impl Wmap {
    fn template_for(&self, key: &str) -> Result<LensRef> {
        for (keys, lens) in &self.groups {
            if keys.iter().any(|candidate| candidate == key) {
                return Ok(Rc::clone(lens));
            }
        }
        if self.default_to_id {
            Ok(identity())
        } else {
            Err(LensError::new(
                "wmap",
                format!("no lens registered for key {key:?}"),
            ))
        }
    }

    fn lens_for(&self, key: &str) -> Result<LensRef> {
        let template = self.template_for(key)?;
        if !template.is_stateful() {
            return Ok(template);
        }
        let mut cache = self.cache.borrow_mut();
        if let Some(cached) = cache.get(key) {
            return Ok(Rc::clone(cached));
        }
        let fresh = template.clone_lens();
        for listener in self.bindings.snapshot() {
            fresh.bind(&listener);
        }
        cache.insert(key.to_string(), Rc::clone(&fresh));
        Ok(fresh)
    }
}

impl Lens for Wmap {
    fn name(&self) -> &str {
        "wmap"
    }

    fn get(&self, concrete: &Value) -> Result<Value> {
        let entries = record_or_empty("wmap", concrete)?;
        let mut view = BTreeMap::new();
        for (key, value) in &entries {
            let projected = self.lens_for(key)?.get(value).map_err(|error| {
                error.with_frame(Frame::new("wmap", format!("key {key:?}"), "get"))
            })?;
            view.insert(key.clone(), projected);
        }
        Ok(Value::Record(view))
    }

    fn putback(&self, abstract_value: &Value, concrete: &Value) -> Result<Value> {
        let abstract_entries = record_or_empty("wmap", abstract_value)?;
        let mut result = BTreeMap::new();
        for (key, value) in &abstract_entries {
            let reconciled = self
                .lens_for(key)?
                .putback(value, concrete.entry(key))
                .map_err(|error| {
                    error.with_frame(Frame::new("wmap", format!("key {key:?}"), "putback"))
                })?;
            result.insert(key.clone(), reconciled);
        }
        Ok(Value::Record(result))
    }

    fn sublenses(&self) -> Vec<LensRef> {
        let mut children: Vec<LensRef> =
            self.groups.iter().map(|(_, lens)| Rc::clone(lens)).collect();
        children.extend(self.cache.borrow().values().map(Rc::clone));
        children
    }

    fn is_stateful(&self) -> bool {
        self.groups.iter().any(|(_, lens)| lens.is_stateful())
    }

    fn binding_set(&self) -> Option<&BindingSet> {
        Some(&self.bindings)
    }

    fn clone_lens(&self) -> LensRef {
        Rc::new(Self {
            groups: self
                .groups
                .iter()
                .map(|(keys, lens)| (keys.clone(), lens.clone_lens()))
                .collect(),
            default_to_id: self.default_to_id,
            cache: RefCell::new(BTreeMap::new()),
            bindings: self.bindings.clone(),
        })
    }
}

/// Like [`value_map`], but with a different lens per explicit key group.
///
/// `default_to_id` controls what happens to keys outside every group: they
/// default to the identity lens (`true`) or are a fatal error (`false`).
pub fn wmap(groups: Vec<(Vec<String>, LensRef)>, default_to_id: bool) -> LensRef {
    Rc::new(Wmap {
        groups,
        default_to_id,
        cache: RefCell::new(BTreeMap::new()),
        bindings: BindingSet::new(),
    })
}

// =============================================================================
// Copy / Merge
// =============================================================================

struct Copy {
    original: String,
    duplicate: String,
}

impl Lens for Copy {
    fn name(&self) -> &str {
        "copy"
    }

    fn get(&self, concrete: &Value) -> Result<Value> {
        let entries = expect_record("copy", concrete)?;
        if entries.get(&self.duplicate).is_some_and(Value::is_defined) {
            return Err(LensError::new(
                "copy",
                format!("key {:?} already exists in the concrete record", self.duplicate),
            ));
        }
        let mut view = entries.clone();
        let duplicated = entries
            .get(&self.original)
            .cloned()
            .unwrap_or(Value::Undefined);
        view.insert(self.duplicate.clone(), duplicated);
        Ok(Value::Record(view))
    }

    fn putback(&self, abstract_value: &Value, _concrete: &Value) -> Result<Value> {
        let entries = expect_record("copy", abstract_value)?;
        let mut result = entries.clone();
        result.remove(&self.duplicate);
        Ok(Value::Record(result))
    }

    fn clone_lens(&self) -> LensRef {
        Rc::new(Self {
            original: self.original.clone(),
            duplicate: self.duplicate.clone(),
        })
    }
}

/// Duplicates `original`'s value into a read-only view key `duplicate`.
///
/// `get` fails when `duplicate` already exists; `putback` discards the
/// duplicate, returning the abstract record otherwise unchanged (any edit to
/// the duplicate is silently dropped).
pub fn copy(original: impl Into<String>, duplicate: impl Into<String>) -> LensRef {
    Rc::new(Copy {
        original: original.into(),
        duplicate: duplicate.into(),
    })
}

struct MergeKeys {
    kept: String,
    dropped: String,
}

impl Lens for MergeKeys {
    fn name(&self) -> &str {
        "merge"
    }

    fn get(&self, concrete: &Value) -> Result<Value> {
        let entries = expect_record("merge", concrete)?;
        let mut view = entries.clone();
        view.remove(&self.dropped);
        Ok(Value::Record(view))
    }

    fn putback(&self, abstract_value: &Value, concrete: &Value) -> Result<Value> {
        let entries = expect_record("merge", abstract_value)?;
        let mut result = entries.clone();
        // If the two keys still agreed in the concrete record, the dropped
        // key tracks the kept one; otherwise it had diverged on purpose and
        // is restored verbatim.
        let restored = if concrete.entry(&self.kept) == concrete.entry(&self.dropped) {
            abstract_value.entry(&self.kept).clone()
        } else {
            concrete.entry(&self.dropped).clone()
        };
        result.insert(self.dropped.clone(), restored);
        Ok(Value::Record(result))
    }

    fn clone_lens(&self) -> LensRef {
        Rc::new(Self {
            kept: self.kept.clone(),
            dropped: self.dropped.clone(),
        })
    }
}

/// Drops the key `dropped` from the view, assuming it is redundant with
/// `kept`.
///
/// `putback` restores `dropped` from the edited `kept` value when the two
/// agreed in the prior concrete record, and verbatim from the prior value
/// when they had diverged.
pub fn merge_keys(kept: impl Into<String>, dropped: impl Into<String>) -> LensRef {
    Rc::new(MergeKeys {
        kept: kept.into(),
        dropped: dropped.into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hoist_checked_requires_single_key() {
        let lens = hoist_checked("only");
        assert!(lens.get(&record! { "only" => 1.0, "more" => 2.0 }).is_err());
        assert_eq!(
            lens.get(&record! { "only" => 1.0 }).expect("get"),
            Value::Num(1.0)
        );
    }

    #[test]
    fn test_plunge_rejects_non_record_abstract() {
        let lens = plunge("wrap");
        assert!(lens.putback(&Value::Num(1.0), &Value::Undefined).is_err());
    }

    #[test]
    fn test_split_and_merge_utilities() {
        let source = record! { "a" => 1.0, "b" => 2.0 };
        let entries = source.as_record().expect("record").clone();
        let (matching, rest) = split(&entries, &KeyPred::from("a"));
        assert_eq!(matching.len(), 1);
        assert_eq!(rest.len(), 1);

        let rejoined = merge(matching.clone(), rest, |key| {
            LensError::new("test", format!("collision {key}"))
        })
        .expect("disjoint");
        assert_eq!(Value::Record(rejoined), source);

        let colliding = merge(matching.clone(), matching, |key| {
            LensError::new("test", format!("collision {key}"))
        });
        assert!(colliding.is_err());
    }

    #[test]
    fn test_prune_reinstates_from_default() {
        let lens = prune("secret", Value::Str("hidden".into()));
        let view = lens
            .get(&record! { "public" => 1.0, "secret" => 2.0 })
            .expect("get");
        assert_eq!(view, record! { "public" => 1.0 });

        let rebuilt = lens
            .putback(&record! { "public" => 3.0 }, &Value::Undefined)
            .expect("putback");
        assert_eq!(
            rebuilt,
            record! { "public" => 3.0, "secret" => "hidden" }
        );
    }

    #[test]
    fn test_value_map_shares_stateless_template() {
        let lens = value_map(super::super::plus(1.0, Value::Undefined));
        assert!(!lens.is_stateful());
        let view = lens
            .get(&record! { "a" => 1.0, "b" => 2.0 })
            .expect("get");
        assert_eq!(view, record! { "a" => 2.0, "b" => 3.0 });
    }

    #[test]
    fn test_wmap_unmapped_key_policies() {
        let groups = vec![(
            vec!["scaled".to_string()],
            super::super::times(2.0, Value::Undefined).expect("nonzero"),
        )];
        let lenient = wmap(groups.clone(), true);
        let view = lenient
            .get(&record! { "scaled" => 3.0, "other" => "kept" })
            .expect("get");
        assert_eq!(view, record! { "scaled" => 6.0, "other" => "kept" });

        let strict = wmap(groups, false);
        assert!(strict.get(&record! { "other" => 1.0 }).is_err());
    }
}
