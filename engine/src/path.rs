//! Dotted-path addressing over JSON value trees.
//!
//! A path is a dot-separated string; a segment consisting only of ASCII
//! digits addresses an array index, any other segment addresses an object
//! key. The empty path addresses the whole tree.
//!
//! Reads never fail: traversal through `null`, a scalar, or a missing key
//! yields "absent". Writes never mutate their input; they return a new tree.

use serde_json::{Map, Value};
use std::fmt;

/// A single segment of a parsed path.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Segment {
    /// Object key access
    Key(String),
    /// Array index access
    Index(usize),
}

impl Segment {
    /// Returns true if this is an index segment.
    pub fn is_index(&self) -> bool {
        matches!(self, Segment::Index(_))
    }

    /// Get the index if this is an index segment.
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Segment::Key(_) => None,
            Segment::Index(i) => Some(*i),
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Key(k) => write!(f, "{}", k),
            Segment::Index(i) => write!(f, "{}", i),
        }
    }
}

/// Location of the first array index within a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayInfo {
    /// Path of the array itself (everything before the index)
    pub base_path: String,
    /// The index segment
    pub index: usize,
    /// Remaining path below the indexed element (may be empty)
    pub remainder: String,
}

/// Parse a dotted path into segments. Empty segments are skipped, so
/// `"a..b"` parses the same as `"a.b"` and `""` parses to no segments.
pub fn parse(path: &str) -> Vec<Segment> {
    path.split('.')
        .filter(|s| !s.is_empty())
        .map(|s| match s.parse::<usize>() {
            Ok(i) => Segment::Index(i),
            Err(_) => Segment::Key(s.to_owned()),
        })
        .collect()
}

/// Join a base path and one more segment.
pub fn join(base: &str, segment: &str) -> String {
    if base.is_empty() {
        segment.to_owned()
    } else {
        format!("{}.{}", base, segment)
    }
}

/// Parent of a path: `"a.b.c"` -> `"a.b"`, `"a"` -> `""`.
pub fn parent_path(path: &str) -> &str {
    match path.rfind('.') {
        Some(pos) => &path[..pos],
        None => "",
    }
}

/// Last segment of a path: `"a.b.c"` -> `"c"`.
pub fn last_segment(path: &str) -> &str {
    match path.rfind('.') {
        Some(pos) => &path[pos + 1..],
        None => path,
    }
}

/// Returns true if any segment of the path is an array index.
pub fn is_array_path(path: &str) -> bool {
    parse(path).iter().any(Segment::is_index)
}

/// Split a path at its first array index, if it has one.
pub fn array_info(path: &str) -> Option<ArrayInfo> {
    let segments: Vec<&str> = path.split('.').filter(|s| !s.is_empty()).collect();
    let pos = segments
        .iter()
        .position(|s| s.bytes().all(|b| b.is_ascii_digit()))?;
    let index = segments[pos].parse().ok()?;
    Some(ArrayInfo {
        base_path: segments[..pos].join("."),
        index,
        remainder: segments[pos + 1..].join("."),
    })
}

/// Read the value at `path`. The empty path returns the tree itself.
pub fn get<'a>(tree: &'a Value, path: &str) -> Option<&'a Value> {
    let mut node = tree;
    for segment in parse(path) {
        node = match (&segment, node) {
            (Segment::Key(k), Value::Object(map)) => map.get(k)?,
            (Segment::Index(i), Value::Array(items)) => items.get(*i)?,
            _ => return None,
        };
    }
    Some(node)
}

/// Returns true if `path` addresses an existing value.
pub fn has(tree: &Value, path: &str) -> bool {
    get(tree, path).is_some()
}

/// Write `value` at `path`, returning a new tree. Intermediate containers
/// are created on demand: an array when the next segment is an index, an
/// object otherwise. An existing non-container in the way is replaced.
/// The empty path replaces the whole tree.
pub fn set(tree: &Value, path: &str, value: Value) -> Value {
    let segments = parse(path);
    if segments.is_empty() {
        return value;
    }
    let mut root = tree.clone();
    ensure_container(&mut root, &segments[0]);
    set_in_place(&mut root, &segments, value);
    root
}

fn ensure_container(slot: &mut Value, next: &Segment) {
    match (next, &*slot) {
        (Segment::Key(_), Value::Object(_)) => {}
        (Segment::Index(_), Value::Array(_)) => {}
        (Segment::Key(_), _) => *slot = Value::Object(Map::new()),
        (Segment::Index(_), _) => *slot = Value::Array(Vec::new()),
    }
}

fn set_in_place(node: &mut Value, segments: &[Segment], value: Value) {
    let (head, rest) = segments
        .split_first()
        .expect("set_in_place called with empty segments");

    let slot = match head {
        Segment::Key(k) => {
            let map = node.as_object_mut().expect("node shaped by ensure_container");
            map.entry(k.clone()).or_insert(Value::Null)
        }
        Segment::Index(i) => {
            let items = node.as_array_mut().expect("node shaped by ensure_container");
            while items.len() <= *i {
                items.push(Value::Null);
            }
            &mut items[*i]
        }
    };

    match rest.first() {
        None => *slot = value,
        Some(next) => {
            ensure_container(slot, next);
            set_in_place(slot, rest, value);
        }
    }
}

/// Remove the value at `path`, returning a new tree. Removing an array
/// element shifts later elements down. A path that does not resolve leaves
/// the tree unchanged. The empty path empties the whole tree.
pub fn delete(tree: &Value, path: &str) -> Value {
    let segments = parse(path);
    if segments.is_empty() {
        return match tree {
            Value::Array(_) => Value::Array(Vec::new()),
            _ => Value::Object(Map::new()),
        };
    }
    let mut root = tree.clone();
    delete_in_place(&mut root, &segments);
    root
}

fn delete_in_place(node: &mut Value, segments: &[Segment]) {
    let (head, rest) = segments
        .split_first()
        .expect("delete_in_place called with empty segments");

    if rest.is_empty() {
        match (head, node) {
            (Segment::Key(k), Value::Object(map)) => {
                map.remove(k);
            }
            (Segment::Index(i), Value::Array(items)) => {
                if *i < items.len() {
                    items.remove(*i);
                }
            }
            _ => {}
        }
        return;
    }

    let child = match (head, node) {
        (Segment::Key(k), Value::Object(map)) => map.get_mut(k),
        (Segment::Index(i), Value::Array(items)) => items.get_mut(*i),
        _ => None,
    };
    if let Some(child) = child {
        delete_in_place(child, rest);
    }
}

/// Every addressable leaf path in the tree, depth first. Empty containers
/// are reported as leaves; the root itself is not reported.
pub fn all_paths(tree: &Value) -> Vec<String> {
    let mut out = Vec::new();
    collect_paths(tree, String::new(), &mut out);
    out
}

fn collect_paths(node: &Value, prefix: String, out: &mut Vec<String>) {
    match node {
        Value::Object(map) if !map.is_empty() => {
            for (key, child) in map {
                collect_paths(child, join(&prefix, key), out);
            }
        }
        Value::Array(items) if !items.is_empty() => {
            for (i, child) in items.iter().enumerate() {
                collect_paths(child, join(&prefix, &i.to_string()), out);
            }
        }
        _ => {
            if !prefix.is_empty() {
                out.push(prefix);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_mixed_segments() {
        let segments = parse("items.0.name");
        assert_eq!(
            segments,
            vec![
                Segment::Key("items".into()),
                Segment::Index(0),
                Segment::Key("name".into()),
            ]
        );
    }

    #[test]
    fn parse_empty_path() {
        assert!(parse("").is_empty());
        assert_eq!(parse("a..b"), parse("a.b"));
    }

    #[test]
    fn get_nested() {
        let tree = json!({"user": {"pets": [{"name": "Rex"}]}});
        assert_eq!(get(&tree, "user.pets.0.name"), Some(&json!("Rex")));
        assert_eq!(get(&tree, ""), Some(&tree));
    }

    #[test]
    fn get_through_scalar_is_absent() {
        let tree = json!({"a": 1, "b": null});
        assert_eq!(get(&tree, "a.b.c"), None);
        assert_eq!(get(&tree, "b.c"), None);
        assert_eq!(get(&tree, "missing"), None);
        assert!(!has(&tree, "a.b.c"));
    }

    #[test]
    fn set_get_round_trip() {
        let tree = json!({});
        let updated = set(&tree, "user.name", json!("Ada"));
        assert_eq!(get(&updated, "user.name"), Some(&json!("Ada")));
    }

    #[test]
    fn set_does_not_mutate_input() {
        let tree = json!({"user": {"name": "Ada"}});
        let before = tree.clone();
        let _updated = set(&tree, "user.name", json!("Grace"));
        assert_eq!(tree, before);
    }

    #[test]
    fn set_creates_array_for_numeric_segment() {
        let tree = json!({});
        let updated = set(&tree, "items.1.name", json!("b"));
        assert_eq!(updated, json!({"items": [null, {"name": "b"}]}));
    }

    #[test]
    fn set_replaces_scalar_in_the_way() {
        let tree = json!({"a": 5});
        let updated = set(&tree, "a.b", json!(1));
        assert_eq!(updated, json!({"a": {"b": 1}}));
    }

    #[test]
    fn set_empty_path_replaces_tree() {
        let tree = json!({"a": 1});
        assert_eq!(set(&tree, "", json!({"b": 2})), json!({"b": 2}));
    }

    #[test]
    fn delete_object_key() {
        let tree = json!({"a": {"b": 1, "c": 2}});
        assert_eq!(delete(&tree, "a.b"), json!({"a": {"c": 2}}));
    }

    #[test]
    fn delete_array_element_shifts() {
        let tree = json!({"items": [1, 2, 3]});
        assert_eq!(delete(&tree, "items.1"), json!({"items": [1, 3]}));
    }

    #[test]
    fn delete_missing_path_is_noop() {
        let tree = json!({"a": 1});
        assert_eq!(delete(&tree, "b.c"), tree);
    }

    #[test]
    fn delete_empty_path_empties_tree() {
        assert_eq!(delete(&json!({"a": 1}), ""), json!({}));
        assert_eq!(delete(&json!([1, 2]), ""), json!([]));
    }

    #[test]
    fn all_paths_depth_first() {
        let tree = json!({"a": {"b": 1}, "items": [{"x": 2}, 3], "empty": {}});
        let mut paths = all_paths(&tree);
        paths.sort();
        assert_eq!(paths, vec!["a.b", "empty", "items.0.x", "items.1"]);
    }

    #[test]
    fn parent_and_last() {
        assert_eq!(parent_path("a.b.c"), "a.b");
        assert_eq!(parent_path("a"), "");
        assert_eq!(last_segment("a.b.c"), "c");
        assert_eq!(last_segment("a"), "a");
    }

    #[test]
    fn array_info_splits_at_first_index() {
        assert_eq!(
            array_info("items.2.name"),
            Some(ArrayInfo {
                base_path: "items".into(),
                index: 2,
                remainder: "name".into(),
            })
        );
        assert_eq!(array_info("user.name"), None);
        assert!(is_array_path("items.2.name"));
        assert!(!is_array_path("user.name"));
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        fn arb_key() -> impl Strategy<Value = String> {
            "[a-z]{1,6}"
        }

        fn arb_path() -> impl Strategy<Value = String> {
            prop::collection::vec(
                prop_oneof![arb_key(), (0usize..4).prop_map(|i| i.to_string())],
                1..4,
            )
            .prop_map(|segments| segments.join("."))
        }

        proptest! {
            #[test]
            fn prop_set_get_round_trip(path in arb_path(), n in 0i64..1000) {
                let tree = serde_json::json!({});
                let updated = set(&tree, &path, serde_json::json!(n));
                prop_assert_eq!(get(&updated, &path), Some(&serde_json::json!(n)));
            }

            #[test]
            fn prop_set_preserves_input(path in arb_path(), n in 0i64..1000) {
                let tree = serde_json::json!({"fixed": {"leaf": true}});
                let before = tree.clone();
                let _updated = set(&tree, &path, serde_json::json!(n));
                prop_assert_eq!(tree, before);
            }

            #[test]
            fn prop_delete_removes(path in arb_path(), n in 0i64..1000) {
                let tree = set(&serde_json::json!({}), &path, serde_json::json!(n));
                let removed = delete(&tree, &path);
                prop_assert_ne!(get(&removed, &path), Some(&serde_json::json!(n)));
            }
        }
    }
}
