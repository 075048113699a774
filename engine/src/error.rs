//! Error types for the form engine.
//!
//! These cover structural misuse only: a malformed configuration or an
//! array operation that cannot apply. Validation failures and manually set
//! field errors are data, surfaced through `FormState`, never through
//! `Err`.

use thiserror::Error;

/// All possible errors from the form engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("default values must be a JSON object, got {0}")]
    DefaultsNotObject(String),

    #[error("partial values must be a JSON object, got {0}")]
    ValuesNotObject(String),

    #[error("value at '{0}' is not an array")]
    NotAnArray(String),

    #[error("index {index} out of bounds at '{path}' (length {len})")]
    IndexOutOfBounds {
        path: String,
        index: usize,
        len: usize,
    },
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = Error::DefaultsNotObject("array".into());
        assert_eq!(
            err.to_string(),
            "default values must be a JSON object, got array"
        );

        let err = Error::IndexOutOfBounds {
            path: "items".into(),
            index: 5,
            len: 2,
        };
        assert_eq!(
            err.to_string(),
            "index 5 out of bounds at 'items' (length 2)"
        );

        let err = Error::NotAnArray("user.name".into());
        assert_eq!(err.to_string(), "value at 'user.name' is not an array");
    }
}
