//! Observable form state snapshots.

use crate::report::FieldError;
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Per-field metadata as seen by a caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldState {
    /// The field received a blur at least once
    pub is_touched: bool,
    /// The field's value differs from its default
    pub is_dirty: bool,
    /// The field currently carries an error
    pub is_invalid: bool,
    /// The current error, if any
    pub error: Option<FieldError>,
}

/// An immutable, point-in-time aggregate of the whole form.
///
/// Derived on demand from the value tree and field metadata; every mutation
/// produces a new snapshot, none is ever edited in place.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormState {
    /// The current value tree
    pub values: Value,
    /// Errors keyed by field path
    pub errors: BTreeMap<String, FieldError>,
    /// Paths that have been touched
    pub touched: BTreeSet<String>,
    /// Paths whose value differs from the default
    pub dirty: BTreeSet<String>,
    /// A submit is in flight
    pub is_submitting: bool,
    /// A validation pass has begun and not yet settled
    pub is_validating: bool,
    /// No field carries an error
    pub is_valid: bool,
    /// At least one field is dirty
    pub is_dirty: bool,
    /// Number of submit attempts since creation or reset
    pub submit_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn field_state_default_is_pristine() {
        let state = FieldState::default();
        assert!(!state.is_touched);
        assert!(!state.is_dirty);
        assert!(!state.is_invalid);
        assert!(state.error.is_none());
    }

    #[test]
    fn form_state_serialization_is_camel_case() {
        let state = FormState {
            values: json!({"name": "Ada"}),
            errors: BTreeMap::new(),
            touched: BTreeSet::new(),
            dirty: BTreeSet::new(),
            is_submitting: false,
            is_validating: false,
            is_valid: true,
            is_dirty: false,
            submit_count: 2,
        };
        let json = serde_json::to_string(&state).unwrap();
        assert!(json.contains(r#""isSubmitting":false"#));
        assert!(json.contains(r#""submitCount":2"#));
    }
}
