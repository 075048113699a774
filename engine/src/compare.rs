//! Structural equality and dirty-path diffing between value trees.
//!
//! `dirty_paths` is how the engine derives per-field dirtiness: it compares
//! the default tree against the current tree and reports every differing
//! path. Recursion descends through object pairs only; a differing array is
//! reported as a whole, matching how field arrays are tracked.

use crate::path;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Recursive structural equality. A kind mismatch (including array vs.
/// object) or a length/key-count mismatch short-circuits to false.
pub fn deep_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Object(ma), Value::Object(mb)) => {
            ma.len() == mb.len()
                && ma
                    .iter()
                    .all(|(k, va)| mb.get(k).is_some_and(|vb| deep_equal(va, vb)))
        }
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| deep_equal(x, y))
        }
        (Value::Object(_), _) | (_, Value::Object(_)) => false,
        (Value::Array(_), _) | (_, Value::Array(_)) => false,
        _ => a == b,
    }
}

/// One level of comparison only. Scalar children are compared by value;
/// container children are compared by kind and length, never descended.
pub fn shallow_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Object(ma), Value::Object(mb)) => {
            ma.len() == mb.len()
                && ma
                    .iter()
                    .all(|(k, va)| mb.get(k).is_some_and(|vb| top_level_equal(va, vb)))
        }
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| top_level_equal(x, y))
        }
        _ => a == b,
    }
}

fn top_level_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Object(ma), Value::Object(mb)) => ma.len() == mb.len(),
        (Value::Array(xs), Value::Array(ys)) => xs.len() == ys.len(),
        (Value::Object(_), _) | (_, Value::Object(_)) => false,
        (Value::Array(_), _) | (_, Value::Array(_)) => false,
        _ => a == b,
    }
}

/// Every path at which `original` and `current` differ, sorted.
///
/// For each key present in either tree the path is recorded when the two
/// sides are not deeply equal; when both sides are objects the diff also
/// descends to record nested sub-paths. A key present on one side only is
/// recorded without descending.
pub fn dirty_paths(original: &Value, current: &Value) -> Vec<String> {
    let mut out = Vec::new();
    diff_objects(original, current, "", &mut out);
    out.sort();
    out
}

/// Same result as [`dirty_paths`], as a presence map.
pub fn dirty_fields(original: &Value, current: &Value) -> BTreeMap<String, bool> {
    dirty_paths(original, current)
        .into_iter()
        .map(|p| (p, true))
        .collect()
}

fn diff_objects(original: &Value, current: &Value, prefix: &str, out: &mut Vec<String>) {
    let (Value::Object(mo), Value::Object(mc)) = (original, current) else {
        return;
    };

    let keys: BTreeSet<&String> = mo.keys().chain(mc.keys()).collect();
    for key in keys {
        let child_path = path::join(prefix, key);
        match (mo.get(key), mc.get(key)) {
            (Some(vo), Some(vc)) => {
                if !deep_equal(vo, vc) {
                    out.push(child_path.clone());
                }
                diff_objects(vo, vc, &child_path, out);
            }
            (Some(_), None) | (None, Some(_)) => out.push(child_path),
            (None, None) => unreachable!("key drawn from the union of both maps"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deep_equal_scalars_and_containers() {
        assert!(deep_equal(&json!(1), &json!(1)));
        assert!(deep_equal(&json!({"a": [1, 2]}), &json!({"a": [1, 2]})));
        assert!(!deep_equal(&json!({"a": 1}), &json!({"a": 2})));
        assert!(!deep_equal(&json!([1, 2]), &json!([1, 2, 3])));
    }

    #[test]
    fn deep_equal_kind_mismatch() {
        assert!(!deep_equal(&json!({"0": 1}), &json!([1])));
        assert!(!deep_equal(&json!(null), &json!({})));
        assert!(!deep_equal(&json!("1"), &json!(1)));
    }

    #[test]
    fn deep_equal_key_count_mismatch() {
        assert!(!deep_equal(&json!({"a": 1}), &json!({"a": 1, "b": 2})));
    }

    #[test]
    fn shallow_equal_scalars() {
        assert!(shallow_equal(&json!({"a": 1}), &json!({"a": 1})));
        assert!(!shallow_equal(&json!({"a": 1}), &json!({"a": 2})));
    }

    #[test]
    fn shallow_equal_does_not_descend() {
        // Same shape, different nested leaf: shallow comparison cannot see it.
        assert!(shallow_equal(
            &json!({"a": {"x": 1}}),
            &json!({"a": {"x": 2}})
        ));
        assert!(!shallow_equal(
            &json!({"a": {"x": 1}}),
            &json!({"a": {"x": 1, "y": 2}})
        ));
    }

    #[test]
    fn dirty_paths_identical_trees() {
        let tree = json!({"a": {"b": 1}, "items": [1, 2]});
        assert!(dirty_paths(&tree, &tree).is_empty());
    }

    #[test]
    fn dirty_paths_single_leaf_records_ancestors() {
        let original = json!({"user": {"name": "Ada", "age": 36}});
        let current = json!({"user": {"name": "Grace", "age": 36}});
        assert_eq!(dirty_paths(&original, &current), vec!["user", "user.name"]);
    }

    #[test]
    fn dirty_paths_key_only_on_one_side() {
        let original = json!({"a": 1});
        let current = json!({"a": 1, "b": {"c": 2}});
        assert_eq!(dirty_paths(&original, &current), vec!["b"]);
    }

    #[test]
    fn dirty_paths_array_recorded_whole() {
        let original = json!({"items": [{"n": 1}]});
        let current = json!({"items": [{"n": 2}]});
        // Arrays are not descended, only the array path itself is dirty.
        assert_eq!(dirty_paths(&original, &current), vec!["items"]);
    }

    #[test]
    fn dirty_fields_presence_map() {
        let original = json!({"a": 1, "b": 2});
        let current = json!({"a": 1, "b": 3});
        let fields = dirty_fields(&original, &current);
        assert_eq!(fields.len(), 1);
        assert_eq!(fields.get("b"), Some(&true));
    }

    #[test]
    fn dirty_paths_deterministic() {
        let original = json!({"z": 1, "a": 1, "m": {"q": 1, "b": 2}});
        let current = json!({"z": 2, "a": 3, "m": {"q": 4, "b": 5}});
        let first = dirty_paths(&original, &current);
        let second = dirty_paths(&original, &current);
        assert_eq!(first, second);
        assert_eq!(first, vec!["a", "m", "m.b", "m.q", "z"]);
    }
}
