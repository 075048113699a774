//! Form configuration.

use crate::validator::Validator;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// When `change`/`blur` trigger validation for a field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Mode {
    /// Validate only on submit or an explicit `trigger`
    #[default]
    OnSubmit,
    /// Validate when a field loses focus
    OnBlur,
    /// Validate on every change
    OnChange,
    /// Validate on first blur, then on every change
    OnTouched,
    /// Validate on both change and blur
    All,
}

impl Mode {
    /// Does this mode validate on a change event for a field that has been
    /// touched (or regardless of touch, for the eager modes)?
    pub(crate) fn validates_on_change(self, touched: bool) -> bool {
        match self {
            Mode::OnChange | Mode::All => true,
            Mode::OnTouched => touched,
            Mode::OnSubmit | Mode::OnBlur => false,
        }
    }

    /// Does this mode validate on a blur event?
    pub(crate) fn validates_on_blur(self) -> bool {
        matches!(self, Mode::OnBlur | Mode::OnTouched | Mode::All)
    }
}

/// Configuration for one form engine instance.
///
/// Built in the builder style; the engine takes it by value at construction
/// and the caller's inputs are never mutated behind its back.
pub struct FormConfig {
    /// Initial value tree; must be a JSON object at the root.
    pub default_values: Value,
    /// Optional pluggable validator.
    pub validator: Option<Box<dyn Validator>>,
    /// Validation timing for fields without an error.
    pub mode: Mode,
    /// Validation timing for fields that already carry an error.
    pub re_validate_mode: Mode,
    /// Run one full validation pass at construction time.
    pub validate_on_mount: bool,
}

impl FormConfig {
    /// Create a config with the given defaults, mode `OnSubmit`, and
    /// re-validate mode `OnChange`.
    pub fn new(default_values: Value) -> Self {
        Self {
            default_values,
            validator: None,
            mode: Mode::OnSubmit,
            re_validate_mode: Mode::OnChange,
            validate_on_mount: false,
        }
    }

    /// Attach a validator.
    pub fn with_validator(mut self, validator: impl Validator + 'static) -> Self {
        self.validator = Some(Box::new(validator));
        self
    }

    /// Set the validation mode.
    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the re-validation mode for fields that already have an error.
    pub fn with_re_validate_mode(mut self, mode: Mode) -> Self {
        self.re_validate_mode = mode;
        self
    }

    /// Validate once at construction time.
    pub fn validate_on_mount(mut self, enabled: bool) -> Self {
        self.validate_on_mount = enabled;
        self
    }
}

impl std::fmt::Debug for FormConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormConfig")
            .field("default_values", &self.default_values)
            .field("validator", &self.validator.as_ref().map(|_| "<dyn Validator>"))
            .field("mode", &self.mode)
            .field("re_validate_mode", &self.re_validate_mode)
            .field("validate_on_mount", &self.validate_on_mount)
            .finish()
    }
}
