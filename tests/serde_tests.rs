//! Serde round-trip tests for the value model (behind the `serde` feature).

#![cfg(feature = "serde")]

use bilens::value::Value;
use bilens::{record, seq_value};

/// Test that a nested value tree survives a JSON round trip
#[test]
fn test_value_json_round_trip() {
    let tree = record! {
        "name" => "rectangle",
        "visible" => true,
        "size" => seq_value![20.0, 30.0],
        "meta" => record! { "layer" => 2.0 },
    };
    let encoded = serde_json::to_string(&tree).expect("serialize");
    let decoded: Value = serde_json::from_str(&encoded).expect("deserialize");
    assert_eq!(decoded, tree);
}

/// Test that Undefined survives a round trip
#[test]
fn test_undefined_round_trip() {
    let encoded = serde_json::to_string(&Value::Undefined).expect("serialize");
    let decoded: Value = serde_json::from_str(&encoded).expect("deserialize");
    assert_eq!(decoded, Value::Undefined);
}

/// Test that a queued edit is serializable for external persistence
#[test]
fn test_edit_round_trip() {
    use bilens::lens::Edit;

    let edit = Edit::Insert {
        index: 3,
        value: record! { "fresh" => true },
    };
    let encoded = serde_json::to_string(&edit).expect("serialize");
    let decoded: Edit = serde_json::from_str(&encoded).expect("deserialize");
    assert_eq!(decoded, edit);
}
