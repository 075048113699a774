//! Validation error normalization.
//!
//! Validators produce a flat list of issues; field-level lookups consume a
//! tree mirroring the value tree's shape. The two representations round
//! trip losslessly for unique paths: converting list -> tree -> list
//! preserves every `(path, message, type)` triple (order aside).

use crate::path;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Kind tag for errors set directly through `set_error` with a bare message.
pub const MANUAL_KIND: &str = "manual";

/// Default kind tag for issues a validator reports without its own code.
pub const VALIDATION_KIND: &str = "validation";

/// A single error attached to one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldError {
    /// Human-readable message
    pub message: String,
    /// Error code: the validator's own tag, or `"manual"`
    #[serde(rename = "type")]
    pub kind: String,
}

impl FieldError {
    /// Create an error with an explicit kind.
    pub fn new(message: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: kind.into(),
        }
    }

    /// Create a manually set error.
    pub fn manual(message: impl Into<String>) -> Self {
        Self::new(message, MANUAL_KIND)
    }
}

impl From<&str> for FieldError {
    fn from(message: &str) -> Self {
        FieldError::manual(message)
    }
}

/// One entry of a validator's flat error list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationIssue {
    /// Dotted path of the offending field
    pub path: String,
    /// Human-readable message
    pub message: String,
    /// Error code from the validator
    #[serde(rename = "type", default = "default_kind")]
    pub kind: String,
}

fn default_kind() -> String {
    VALIDATION_KIND.to_owned()
}

impl ValidationIssue {
    /// Create an issue with the default `"validation"` kind.
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_kind(path, message, VALIDATION_KIND)
    }

    /// Create an issue with an explicit kind.
    pub fn with_kind(
        path: impl Into<String>,
        message: impl Into<String>,
        kind: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            kind: kind.into(),
        }
    }

    /// The error carried by this issue, without its path.
    pub fn error(&self) -> FieldError {
        FieldError::new(&self.message, &self.kind)
    }
}

/// Build a path-keyed error tree from a flat issue list.
/// Later entries win when two issues name the same path.
pub fn to_error_tree(issues: &[ValidationIssue]) -> Value {
    let mut tree = json!({});
    for issue in issues {
        tree = path::set(
            &tree,
            &issue.path,
            json!({"message": issue.message, "type": issue.kind}),
        );
    }
    tree
}

/// Flatten an error tree back to a list, depth first. A node counts as a
/// leaf when it is an object carrying a string `"message"`.
pub fn to_error_list(tree: &Value) -> Vec<ValidationIssue> {
    let mut out = Vec::new();
    collect_issues(tree, String::new(), &mut out);
    out
}

fn collect_issues(node: &Value, prefix: String, out: &mut Vec<ValidationIssue>) {
    if let Some(message) = leaf_message(node) {
        let kind = node
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or(VALIDATION_KIND);
        out.push(ValidationIssue::with_kind(prefix, message, kind));
        return;
    }
    match node {
        Value::Object(map) => {
            for (key, child) in map {
                collect_issues(child, path::join(&prefix, key), out);
            }
        }
        Value::Array(items) => {
            for (i, child) in items.iter().enumerate() {
                collect_issues(child, path::join(&prefix, &i.to_string()), out);
            }
        }
        _ => {}
    }
}

fn leaf_message(node: &Value) -> Option<&str> {
    node.as_object()?.get("message")?.as_str()
}

/// Merge two error trees; entries of `b` override entries of `a` at the
/// same path, the result is the union otherwise.
pub fn merge_errors(a: &Value, b: &Value) -> Value {
    let mut merged = a.clone();
    for issue in to_error_list(b) {
        merged = path::set(
            &merged,
            &issue.path,
            json!({"message": issue.message, "type": issue.kind}),
        );
    }
    merged
}

/// Remove exactly the listed paths from an error tree.
pub fn clear_at_paths(tree: &Value, paths: &[&str]) -> Value {
    let mut cleared = tree.clone();
    for p in paths {
        cleared = path::delete(&cleared, p);
    }
    cleared
}

/// Normalize loosely typed error input. A bare non-empty string becomes a
/// manual error; empty or absent input normalizes to no error at all.
pub fn normalize(input: Option<&str>) -> Option<FieldError> {
    match input {
        None => None,
        Some("") => None,
        Some(message) => Some(FieldError::manual(message)),
    }
}
