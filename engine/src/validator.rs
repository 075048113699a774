//! The pluggable validator boundary.
//!
//! A validator receives the whole current value tree and reports either the
//! (possibly transformed) data or a flat list of path-keyed issues. Nothing
//! else is assumed about it, so any schema library can be bridged by
//! implementing [`Validator`] for an adapter type or a closure.

use crate::path;
use crate::report::ValidationIssue;
use serde_json::Value;

/// Outcome of one validation pass over a value tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Validation {
    /// The tree passed; carries the validator's view of the data.
    Valid(Value),
    /// The tree failed; carries every issue found.
    Invalid(Vec<ValidationIssue>),
}

impl Validation {
    /// Returns true for [`Validation::Valid`].
    pub fn is_valid(&self) -> bool {
        matches!(self, Validation::Valid(_))
    }

    /// The issues of an invalid outcome; empty when valid.
    pub fn issues(&self) -> &[ValidationIssue] {
        match self {
            Validation::Valid(_) => &[],
            Validation::Invalid(issues) => issues,
        }
    }
}

/// A pluggable validator. Always called with the complete value tree.
pub trait Validator {
    /// Validate `values` and report the outcome.
    fn validate(&self, values: &Value) -> Validation;
}

impl<F> Validator for F
where
    F: Fn(&Value) -> Validation,
{
    fn validate(&self, values: &Value) -> Validation {
        self(values)
    }
}

type Predicate = Box<dyn Fn(&Value) -> bool>;

enum Check {
    Required,
    MinLength(usize),
    Custom { message: String, accept: Predicate },
}

struct Rule {
    path: String,
    check: Check,
}

/// A small built-in validator for embedders without a schema library.
///
/// # Examples
///
/// ```
/// use conform_engine::{Rules, Validator};
/// use serde_json::json;
///
/// let rules = Rules::new().required("name").min_length("name", 2);
/// assert!(rules.validate(&json!({"name": "Ada"})).is_valid());
/// assert!(!rules.validate(&json!({"name": ""})).is_valid());
/// ```
#[derive(Default)]
pub struct Rules {
    rules: Vec<Rule>,
}

impl Rules {
    /// Create an empty rule set (accepts everything).
    pub fn new() -> Self {
        Self::default()
    }

    /// The value at `path` must be present, non-null, and not an empty
    /// string. Reports `"required"` with kind `"validation"`.
    pub fn required(mut self, path: impl Into<String>) -> Self {
        self.rules.push(Rule {
            path: path.into(),
            check: Check::Required,
        });
        self
    }

    /// A string at `path` must be at least `min` characters long. Absent
    /// values are left to `required`.
    pub fn min_length(mut self, path: impl Into<String>, min: usize) -> Self {
        self.rules.push(Rule {
            path: path.into(),
            check: Check::MinLength(min),
        });
        self
    }

    /// The value at `path` must satisfy `accept`, otherwise `message` is
    /// reported.
    pub fn custom(
        mut self,
        path: impl Into<String>,
        message: impl Into<String>,
        accept: impl Fn(&Value) -> bool + 'static,
    ) -> Self {
        self.rules.push(Rule {
            path: path.into(),
            check: Check::Custom {
                message: message.into(),
                accept: Box::new(accept),
            },
        });
        self
    }
}

impl Validator for Rules {
    fn validate(&self, values: &Value) -> Validation {
        let mut issues = Vec::new();
        for rule in &self.rules {
            let value = path::get(values, &rule.path);
            match &rule.check {
                Check::Required => {
                    let missing = match value {
                        None | Some(Value::Null) => true,
                        Some(Value::String(s)) => s.is_empty(),
                        Some(_) => false,
                    };
                    if missing {
                        issues.push(ValidationIssue::new(&rule.path, "required"));
                    }
                }
                Check::MinLength(min) => {
                    if let Some(Value::String(s)) = value {
                        if s.chars().count() < *min {
                            issues.push(ValidationIssue::with_kind(
                                &rule.path,
                                format!("must be at least {} characters", min),
                                "minLength",
                            ));
                        }
                    }
                }
                Check::Custom { message, accept } => {
                    let candidate = value.unwrap_or(&Value::Null);
                    if !accept(candidate) {
                        issues.push(ValidationIssue::new(&rule.path, message.clone()));
                    }
                }
            }
        }
        if issues.is_empty() {
            Validation::Valid(values.clone())
        } else {
            Validation::Invalid(issues)
        }
    }
}
