//! Integration tests for the record-reshaping lenses.
//!
//! Covers hoist/plunge and their checked variants, xfork and the combinators
//! derived from it (fork, filter, prune, add, focus, rename), the nonunique
//! hoist, per-key mapping (value_map, wmap), copy, and merge_keys.

use bilens::lens::{
    add, copy, filter, focus, fork, hoist, hoist_checked, hoist_nonunique, identity, merge_keys,
    plunge, plunge_checked, plus, prune, rename, value_map, wmap, xfork,
};
use bilens::value::{KeyPred, Value};
use bilens::{record, seq_value};

// =============================================================================
// Hoist / Plunge
// =============================================================================

/// Test that hoist projects the value under a key and rebuilds the wrapper
#[test]
fn test_hoist_round_trip() {
    let lens = hoist("inner");
    let wrapped = record! { "inner" => seq_value![1.0, 2.0] };
    assert_eq!(lens.get(&wrapped).expect("get"), seq_value![1.0, 2.0]);
    assert_eq!(
        lens.putback(&seq_value![3.0], &wrapped).expect("putback"),
        record! { "inner" => seq_value![3.0] }
    );
}

/// Test that hoist tolerates siblings but hoist_checked does not
#[test]
fn test_hoist_checked_rejects_siblings() {
    let cluttered = record! { "inner" => 1.0, "extra" => 2.0 };
    assert_eq!(hoist("inner").get(&cluttered).expect("get"), Value::Num(1.0));
    assert!(hoist_checked("inner").get(&cluttered).is_err());
    assert!(
        hoist_checked("inner")
            .get(&record! { "inner" => 1.0 })
            .is_ok()
    );
}

/// Test that plunge wraps in one direction and unwraps in the other
#[test]
fn test_plunge_round_trip() {
    let lens = plunge("wrapper");
    assert_eq!(
        lens.get(&Value::Num(1.0)).expect("get"),
        record! { "wrapper" => 1.0 }
    );
    assert_eq!(
        lens.putback(&record! { "wrapper" => 2.0 }, &Value::Num(1.0))
            .expect("putback"),
        Value::Num(2.0)
    );
}

/// Test that plunge_checked rejects an abstract record with extra keys
#[test]
fn test_plunge_checked_rejects_extra_abstract_keys() {
    let lens = plunge_checked("wrapper");
    let padded = record! { "wrapper" => 2.0, "stray" => 1.0 };
    assert!(lens.putback(&padded, &Value::Undefined).is_err());
}

// =============================================================================
// Xfork and Derivatives
// =============================================================================

/// Test that xfork routes disjoint halves through different lenses
#[test]
fn test_xfork_routes_by_predicate() {
    // Keys starting with "n" are numbers to increment; the rest pass through.
    let lens = xfork(
        KeyPred::test(|key| key.starts_with('n')),
        KeyPred::test(|key| key.starts_with('n')),
        value_map(plus(1.0, Value::Undefined)),
        identity(),
    );
    let tree = record! { "n1" => 10.0, "n2" => 20.0, "label" => "fixed" };
    let view = lens.get(&tree).expect("get");
    assert_eq!(
        view,
        record! { "n1" => 11.0, "n2" => 21.0, "label" => "fixed" }
    );
    assert_eq!(lens.putback(&view, &tree).expect("putback"), tree);
}

/// Test that a branch output colliding with the other branch is fatal
#[test]
fn test_xfork_detects_key_collisions() {
    // The pass branch renames "a" to "b", which the fail branch already has.
    let lens = xfork("a", "b", rename("a", "b"), identity());
    let tree = record! { "a" => 1.0, "b" => 2.0 };
    let error = lens.get(&tree).expect_err("collision");
    assert!(error.to_string().contains("key collision"));
}

/// Test filter: view keeps matching keys, putback restores the rest
#[test]
fn test_filter_restores_hidden_keys() {
    let lens = filter(KeyPred::keys(["x", "y"]), record! { "z" => 0.0 });
    let tree = record! { "x" => 1.0, "y" => 2.0, "z" => 3.0 };
    assert_eq!(
        lens.get(&tree).expect("get"),
        record! { "x" => 1.0, "y" => 2.0 }
    );
    // Prior concrete value present: z comes back.
    assert_eq!(
        lens.putback(&record! { "x" => 9.0, "y" => 2.0 }, &tree)
            .expect("putback"),
        record! { "x" => 9.0, "y" => 2.0, "z" => 3.0 }
    );
    // No prior concrete value: the default supplies z.
    assert_eq!(
        lens.putback(&record! { "x" => 9.0 }, &Value::Undefined)
            .expect("putback"),
        record! { "x" => 9.0, "z" => 0.0 }
    );
}

/// Test prune: the view hides one key, putback reinstates it
#[test]
fn test_prune_hides_and_reinstates() {
    let lens = prune("secret", Value::Str("redacted".into()));
    let tree = record! { "open" => 1.0, "secret" => "s3cr3t" };
    assert_eq!(lens.get(&tree).expect("get"), record! { "open" => 1.0 });
    assert_eq!(
        lens.putback(&record! { "open" => 2.0 }, &tree)
            .expect("putback"),
        record! { "open" => 2.0, "secret" => "s3cr3t" }
    );
    assert_eq!(
        lens.putback(&record! { "open" => 2.0 }, &Value::Undefined)
            .expect("putback"),
        record! { "open" => 2.0, "secret" => "redacted" }
    );
}

/// Test add: the view gains a constant key that putback strips back out
#[test]
fn test_add_injects_view_only_key() {
    let lens = add("version", Value::Num(2.0));
    let tree = record! { "payload" => "data" };
    assert_eq!(
        lens.get(&tree).expect("get"),
        record! { "payload" => "data", "version" => 2.0 }
    );
    assert_eq!(
        lens.putback(&record! { "payload" => "edited", "version" => 2.0 }, &tree)
            .expect("putback"),
        record! { "payload" => "edited" }
    );
    // The injected key is not writable.
    assert!(
        lens.putback(&record! { "payload" => "data", "version" => 3.0 }, &tree)
            .is_err()
    );
    // A concrete record already defining the key cannot be viewed.
    assert!(lens.get(&record! { "version" => 1.0 }).is_err());
}

/// Test focus: projects one field and restores its siblings
#[test]
fn test_focus_round_trip() {
    let lens = focus("celsius", record! { "sensor" => "unknown" });
    let reading = record! { "celsius" => 21.0, "sensor" => "attic" };
    assert_eq!(lens.get(&reading).expect("get"), Value::Num(21.0));
    assert_eq!(
        lens.putback(&Value::Num(19.5), &reading).expect("putback"),
        record! { "celsius" => 19.5, "sensor" => "attic" }
    );
    assert_eq!(
        lens.putback(&Value::Num(19.5), &Value::Undefined)
            .expect("putback"),
        record! { "celsius" => 19.5, "sensor" => "unknown" }
    );
}

/// Test rename in both directions
#[test]
fn test_rename_round_trip() {
    let lens = rename("colour", "color");
    let tree = record! { "colour" => "red", "size" => 4.0 };
    let view = lens.get(&tree).expect("get");
    assert_eq!(view, record! { "color" => "red", "size" => 4.0 });
    assert_eq!(
        lens.putback(&record! { "color" => "blue", "size" => 4.0 }, &tree)
            .expect("putback"),
        record! { "colour" => "blue", "size" => 4.0 }
    );
}

// =============================================================================
// Nonunique Hoist
// =============================================================================

/// Test that hoist_nonunique merges grandchildren with siblings and splits
/// them back apart
#[test]
fn test_hoist_nonunique_round_trip() {
    let grandchildren = KeyPred::keys(["x", "y"]);
    let lens = hoist_nonunique("point", grandchildren);
    let tree = record! {
        "point" => record! { "x" => 1.0, "y" => 2.0 },
        "label" => "origin",
    };
    let view = lens.get(&tree).expect("get");
    assert_eq!(
        view,
        record! { "x" => 1.0, "y" => 2.0, "label" => "origin" }
    );
    assert_eq!(lens.putback(&view, &tree).expect("putback"), tree);
}

/// Test that a grandchild shadowing a sibling key is fatal
#[test]
fn test_hoist_nonunique_collision() {
    let lens = hoist_nonunique("inner", KeyPred::Always);
    let tree = record! {
        "inner" => record! { "shared" => 1.0 },
        "shared" => 2.0,
    };
    assert!(lens.get(&tree).is_err());
}

// =============================================================================
// Per-Key Mapping
// =============================================================================

/// Test that value_map applies one lens to every record value
#[test]
fn test_value_map_round_trip() {
    let lens = value_map(plus(100.0, Value::Undefined));
    let tree = record! { "a" => 1.0, "b" => 2.0 };
    let view = lens.get(&tree).expect("get");
    assert_eq!(view, record! { "a" => 101.0, "b" => 102.0 });
    assert_eq!(lens.putback(&view, &tree).expect("putback"), tree);
}

/// Test that a putback through value_map can introduce new keys
#[test]
fn test_value_map_putback_accepts_new_keys() {
    let lens = value_map(plus(1.0, Value::Undefined));
    let result = lens
        .putback(&record! { "fresh" => 10.0 }, &Value::Undefined)
        .expect("putback");
    assert_eq!(result, record! { "fresh" => 9.0 });
}

/// Test that wmap routes each key group through its own lens
#[test]
fn test_wmap_routes_key_groups() {
    let lens = wmap(
        vec![
            (vec!["a".into(), "b".into()], plus(1.0, Value::Undefined)),
            (vec!["c".into()], plus(10.0, Value::Undefined)),
        ],
        true,
    );
    let tree = record! { "a" => 1.0, "c" => 1.0, "other" => "kept" };
    let view = lens.get(&tree).expect("get");
    assert_eq!(
        view,
        record! { "a" => 2.0, "c" => 11.0, "other" => "kept" }
    );
    assert_eq!(lens.putback(&view, &tree).expect("putback"), tree);
}

/// Test the two policies for keys outside every wmap group
#[test]
fn test_wmap_unregistered_key_policy() {
    let groups = vec![(vec!["a".to_string()], plus(1.0, Value::Undefined))];
    let tree = record! { "a" => 1.0, "stray" => 2.0 };

    let tolerant = wmap(groups.clone(), true);
    assert!(tolerant.get(&tree).is_ok());

    let strict = wmap(groups, false);
    let error = strict.get(&tree).expect_err("unregistered key");
    assert!(error.to_string().contains("no lens registered"));
}

// =============================================================================
// Copy / Merge
// =============================================================================

/// Test that copy duplicates a key into the view and discards it on putback
#[test]
fn test_copy_round_trip() {
    let lens = copy("title", "heading");
    let tree = record! { "title" => "Report" };
    let view = lens.get(&tree).expect("get");
    assert_eq!(
        view,
        record! { "title" => "Report", "heading" => "Report" }
    );
    // Edits to the duplicate are silently dropped.
    assert_eq!(
        lens.putback(
            &record! { "title" => "Report", "heading" => "Vandalized" },
            &tree
        )
        .expect("putback"),
        record! { "title" => "Report" }
    );
    // A pre-existing duplicate key cannot be viewed.
    assert!(
        lens.get(&record! { "title" => "Report", "heading" => "taken" })
            .is_err()
    );
}

/// Test that merge_keys restores the dropped key from the kept one when they
/// agreed, and verbatim when they had diverged
#[test]
fn test_merge_keys_restoration_policy() {
    let lens = merge_keys("kept", "mirror");

    // The two keys agreed: the mirror tracks the edited kept value.
    let agreed = record! { "kept" => 1.0, "mirror" => 1.0 };
    assert_eq!(
        lens.get(&agreed).expect("get"),
        record! { "kept" => 1.0 }
    );
    assert_eq!(
        lens.putback(&record! { "kept" => 5.0 }, &agreed)
            .expect("putback"),
        record! { "kept" => 5.0, "mirror" => 5.0 }
    );

    // The two keys had diverged: the mirror is restored verbatim.
    let diverged = record! { "kept" => 1.0, "mirror" => 9.0 };
    assert_eq!(
        lens.putback(&record! { "kept" => 5.0 }, &diverged)
            .expect("putback"),
        record! { "kept" => 5.0, "mirror" => 9.0 }
    );
}

// =============================================================================
// Fork
// =============================================================================

/// Test that fork applies the same predicate on both sides
#[test]
fn test_fork_round_trip() {
    let lens = fork(
        KeyPred::test(|key| key.ends_with("_num")),
        value_map(plus(1.0, Value::Undefined)),
        identity(),
    );
    let tree = record! { "a_num" => 1.0, "name" => "x" };
    let view = lens.get(&tree).expect("get");
    assert_eq!(view, record! { "a_num" => 2.0, "name" => "x" });
    assert_eq!(lens.putback(&view, &tree).expect("putback"), tree);
}
