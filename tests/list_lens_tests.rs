//! Integration tests for the sequence lenses.
//!
//! Covers element projection (head, tail, index), length, order, the
//! reorderings (rotate, reverse), grouping, concatenation with a spacer, and
//! predicate-based list filtering.

use bilens::lens::{
    End, concat, group, head, index, length, list_filter, order, reverse, rotate, tail,
};
use bilens::value::{Value, ValuePred};
use bilens::{record, seq_value};
use rstest::rstest;

// =============================================================================
// Element Projection
// =============================================================================

/// Test head and tail projection and reconstruction
#[test]
fn test_head_and_tail() {
    let items = seq_value![1.0, 2.0, 3.0];

    let first = head(Value::Undefined);
    assert_eq!(first.get(&items).expect("get"), Value::Num(1.0));
    assert_eq!(
        first.putback(&Value::Num(9.0), &items).expect("putback"),
        seq_value![9.0, 2.0, 3.0]
    );

    let last = tail(Value::Undefined);
    assert_eq!(last.get(&items).expect("get"), Value::Num(3.0));
    assert_eq!(
        last.putback(&Value::Num(9.0), &items).expect("putback"),
        seq_value![1.0, 2.0, 9.0]
    );
}

/// Test that projecting past the end reads as Undefined
#[test]
fn test_element_out_of_range_reads_undefined() {
    let lens = index(5, Value::Undefined);
    assert_eq!(
        lens.get(&seq_value![1.0]).expect("get"),
        Value::Undefined
    );
}

/// Test that putback without a prior concrete list grows one from the default
#[test]
fn test_element_putback_grows_from_default() {
    let lens = index(2, Value::Undefined);
    let result = lens
        .putback(&Value::Num(7.0), &Value::Undefined)
        .expect("putback");
    assert_eq!(
        result,
        Value::Seq(vec![Value::Undefined, Value::Undefined, Value::Num(7.0)])
    );
}

// =============================================================================
// Length
// =============================================================================

/// Test that length views the element count
#[test]
fn test_length_get() {
    let lens = length(End::End, End::End, Value::Num(0.0));
    assert_eq!(
        lens.get(&seq_value![1.0, 2.0, 3.0]).expect("get"),
        Value::Num(3.0)
    );
    assert_eq!(lens.get(&Value::Undefined).expect("get"), Value::Num(0.0));
}

#[rstest]
#[case(End::End, seq_value![1.0, 2.0])]
#[case(End::Beginning, seq_value![2.0, 3.0])]
fn test_length_shrink_end(#[case] take_from: End, #[case] expected: Value) {
    let lens = length(take_from, End::End, Value::Num(0.0));
    let result = lens
        .putback(&Value::Num(2.0), &seq_value![1.0, 2.0, 3.0])
        .expect("putback");
    assert_eq!(result, expected);
}

#[rstest]
#[case(End::End, seq_value![1.0, 0.0, 0.0])]
#[case(End::Beginning, seq_value![0.0, 0.0, 1.0])]
fn test_length_grow_end(#[case] add_to: End, #[case] expected: Value) {
    let lens = length(End::End, add_to, Value::Num(0.0));
    let result = lens
        .putback(&Value::Num(3.0), &seq_value![1.0])
        .expect("putback");
    assert_eq!(result, expected);
}

/// Test that a non-integer or negative length is rejected
#[test]
fn test_length_rejects_bad_targets() {
    let lens = length(End::End, End::End, Value::Num(0.0));
    assert!(lens.putback(&Value::Num(1.5), &seq_value![1.0]).is_err());
    assert!(lens.putback(&Value::Num(-1.0), &seq_value![1.0]).is_err());
    assert!(
        lens.putback(&Value::Str("3".into()), &seq_value![1.0])
            .is_err()
    );
}

// =============================================================================
// Order
// =============================================================================

/// Test that order lays record fields out positionally and back
#[test]
fn test_order_round_trip() {
    let lens = order(["x", "y", "z"]);
    let point = record! { "x" => 1.0, "y" => 2.0, "z" => 3.0 };
    let view = lens.get(&point).expect("get");
    assert_eq!(view, seq_value![1.0, 2.0, 3.0]);
    assert_eq!(
        lens.putback(&seq_value![9.0, 2.0, 3.0], &point)
            .expect("putback"),
        record! { "x" => 9.0, "y" => 2.0, "z" => 3.0 }
    );
}

/// Test that absent keys surface as Undefined slots and are omitted on
/// reconstruction
#[test]
fn test_order_absent_keys() {
    let lens = order(["x", "y"]);
    let sparse = record! { "x" => 1.0 };
    let view = lens.get(&sparse).expect("get");
    assert_eq!(view, Value::Seq(vec![Value::Num(1.0), Value::Undefined]));
    assert_eq!(lens.putback(&view, &sparse).expect("putback"), sparse);
}

/// Test that a length mismatch is fatal
#[test]
fn test_order_length_mismatch() {
    let lens = order(["x", "y"]);
    let error = lens
        .putback(&seq_value![1.0], &record! {})
        .expect_err("too short");
    assert!(error.to_string().contains("expected a sequence of length 2"));
}

/// Test that a single-key order tolerates a bare scalar
#[test]
fn test_order_single_key_accepts_scalar() {
    let lens = order(["only"]);
    assert_eq!(
        lens.putback(&Value::Num(4.0), &record! {}).expect("putback"),
        record! { "only" => 4.0 }
    );
}

// =============================================================================
// Reorderings
// =============================================================================

/// Test that rotate moves the first element to the end and back
#[test]
fn test_rotate_round_trip() {
    let lens = rotate();
    let items = seq_value![1.0, 2.0, 3.0];
    let view = lens.get(&items).expect("get");
    assert_eq!(view, seq_value![2.0, 3.0, 1.0]);
    assert_eq!(lens.putback(&view, &items).expect("putback"), items);
}

/// Test that reverse is its own inverse
#[test]
fn test_reverse_round_trip() {
    let lens = reverse();
    let items = seq_value![1.0, 2.0, 3.0];
    let view = lens.get(&items).expect("get");
    assert_eq!(view, seq_value![3.0, 2.0, 1.0]);
    assert_eq!(lens.putback(&view, &items).expect("putback"), items);
}

// =============================================================================
// Group / Concat
// =============================================================================

/// Test grouping into fixed-size chunks with a short final group
#[test]
fn test_group_round_trip() {
    let lens = group(2).expect("positive size");
    let items = seq_value![1.0, 2.0, 3.0, 4.0, 5.0];
    let view = lens.get(&items).expect("get");
    assert_eq!(
        view,
        seq_value![
            seq_value![1.0, 2.0],
            seq_value![3.0, 4.0],
            seq_value![5.0]
        ]
    );
    assert_eq!(lens.putback(&view, &items).expect("putback"), items);
}

/// Test that a zero group size is a construction error
#[test]
fn test_group_zero_is_fatal() {
    assert!(group(0).is_err());
}

/// Test concat flattening with a spacer and re-segmentation
#[test]
fn test_concat_round_trip() {
    let lens = concat(Value::Str("|".into()));
    let nested = seq_value![seq_value![1.0, 2.0], seq_value![3.0], seq_value![]];
    let view = lens.get(&nested).expect("get");
    assert_eq!(view, seq_value![1.0, 2.0, "|", 3.0, "|"]);
    assert_eq!(lens.putback(&view, &nested).expect("putback"), nested);
}

/// Test that an empty flat list segments to an empty list of lists
#[test]
fn test_concat_empty() {
    let lens = concat(Value::Str("|".into()));
    assert_eq!(
        lens.putback(&seq_value![], &Value::Undefined)
            .expect("putback"),
        seq_value![]
    );
}

/// Test the documented spacer ambiguity: a genuine element equal to the
/// spacer starts a new sublist
#[test]
fn test_concat_spacer_ambiguity() {
    let lens = concat(Value::Str("|".into()));
    let result = lens
        .putback(&seq_value!["a", "|", "b"], &Value::Undefined)
        .expect("putback");
    assert_eq!(result, seq_value![seq_value!["a"], seq_value!["b"]]);
}

// =============================================================================
// List Filter
// =============================================================================

fn is_num() -> ValuePred {
    ValuePred::new(|value| value.as_num().is_some())
}

fn is_str() -> ValuePred {
    ValuePred::new(|value| value.as_str().is_some())
}

/// Test that the view keeps only elements failing the drop predicate
#[test]
fn test_list_filter_get() {
    let lens = list_filter(is_num(), is_str());
    let mixed = seq_value![1.0, "x", 2.0, "y", 3.0];
    assert_eq!(lens.get(&mixed).expect("get"), seq_value![1.0, 2.0, 3.0]);
}

/// Test that putback overwrites keep-matching slots in order
#[test]
fn test_list_filter_putback_overwrites_in_order() {
    let lens = list_filter(is_num(), is_str());
    let mixed = seq_value![1.0, "x", 2.0, "y", 3.0];
    let result = lens
        .putback(&seq_value![10.0, 20.0, 30.0], &mixed)
        .expect("putback");
    assert_eq!(result, seq_value![10.0, "x", 20.0, "y", 30.0]);
}

/// Test that leftover edited elements are appended at the end
#[test]
fn test_list_filter_putback_appends_leftovers() {
    let lens = list_filter(is_num(), is_str());
    let mixed = seq_value![1.0, "x"];
    let result = lens
        .putback(&seq_value![10.0, 20.0, 30.0], &mixed)
        .expect("putback");
    assert_eq!(result, seq_value![10.0, "x", 20.0, 30.0]);
}

/// Test that a shorter edited list leaves unconsumed slots untouched
#[test]
fn test_list_filter_putback_short_view() {
    let lens = list_filter(is_num(), is_str());
    let mixed = seq_value![1.0, "x", 2.0];
    let result = lens
        .putback(&seq_value![10.0], &mixed)
        .expect("putback");
    assert_eq!(result, seq_value![10.0, "x", 2.0]);
}
