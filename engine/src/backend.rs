//! The uniform backend contract.
//!
//! Every backing engine, whatever its native state representation, exposes
//! exactly this surface. Callers hold a [`FormBackend`] (usually as a
//! generic bound or a `Box<dyn FormBackend>`) and never depend on a
//! concrete backend's internals.

use crate::error::Result;
use crate::report::FieldError;
use crate::state::{FieldState, FormState};
use serde::Serialize;
use serde_json::{Number, Value};
use std::collections::BTreeMap;

/// Registration descriptor handed to the rendering layer.
///
/// The renderer binds this to a concrete input and reports interaction back
/// through [`FormBackend::change`] and [`FormBackend::blur`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    /// The registered path, used as the input's name
    pub name: String,
}

/// What kind of control emitted an input event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlKind {
    /// Plain value-carrying control
    #[default]
    Text,
    /// Checkbox: the `checked` flag carries the value
    Checkbox,
    /// Numeric input: string values coerce to numbers
    Number,
}

/// An event-shaped change, mirroring what a DOM-like renderer produces.
#[derive(Debug, Clone, PartialEq)]
pub struct InputEvent {
    /// The control's raw value
    pub value: Value,
    /// Checkbox state, when the control is a checkbox
    pub checked: Option<bool>,
    /// What kind of control produced the event
    pub control: ControlKind,
}

/// A change reported for a registered field: either a raw value or an
/// event-shaped object.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldEvent {
    /// A raw value, stored as-is
    Value(Value),
    /// An event from a concrete input control
    Input(InputEvent),
}

impl FieldEvent {
    /// A text-control event.
    pub fn input(value: impl Into<Value>) -> Self {
        FieldEvent::Input(InputEvent {
            value: value.into(),
            checked: None,
            control: ControlKind::Text,
        })
    }

    /// A checkbox event.
    pub fn checkbox(checked: bool) -> Self {
        FieldEvent::Input(InputEvent {
            value: Value::Null,
            checked: Some(checked),
            control: ControlKind::Checkbox,
        })
    }

    /// A numeric-control event; string input coerces to a number.
    pub fn number(value: impl Into<Value>) -> Self {
        FieldEvent::Input(InputEvent {
            value: value.into(),
            checked: None,
            control: ControlKind::Number,
        })
    }

    /// Resolve the event to the value that lands in the tree.
    ///
    /// Checkbox controls contribute their `checked` flag; number controls
    /// coerce string input to a number (empty or unparsable input becomes
    /// null); everything else passes through unchanged.
    pub fn into_value(self) -> Value {
        match self {
            FieldEvent::Value(value) => value,
            FieldEvent::Input(event) => match event.control {
                ControlKind::Checkbox => Value::Bool(event.checked.unwrap_or(false)),
                ControlKind::Number => coerce_number(event.value),
                ControlKind::Text => event.value,
            },
        }
    }
}

fn coerce_number(value: Value) -> Value {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Value::Null;
            }
            if let Ok(i) = trimmed.parse::<i64>() {
                return Value::Number(i.into());
            }
            match trimmed.parse::<f64>().ok().and_then(Number::from_f64) {
                Some(n) => Value::Number(n),
                None => Value::Null,
            }
        }
        other => other,
    }
}

/// Payload delivered to a `watch` callback.
#[derive(Debug, Clone, PartialEq)]
pub enum WatchUpdate {
    /// Watching a single path: that path's value (null when absent)
    Single(Value),
    /// Watching several paths: values keyed by path
    Many(BTreeMap<String, Value>),
    /// Watching no particular path: the whole tree
    All(Value),
}

/// Handle for cancelling a `subscribe` registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub(crate) u64);

/// Handle for cancelling a `watch` registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchId(pub(crate) u64);

/// Options for [`FormBackend::set_value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetValueOpts {
    /// Run a validation pass for the written path
    pub validate: bool,
    /// Recompute dirtiness at the written path (on by default)
    pub mark_dirty: bool,
}

impl Default for SetValueOpts {
    fn default() -> Self {
        Self {
            validate: false,
            mark_dirty: true,
        }
    }
}

impl SetValueOpts {
    /// Options that also schedule validation.
    pub fn validated() -> Self {
        Self {
            validate: true,
            mark_dirty: true,
        }
    }
}

/// Options for [`FormBackend::reset`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResetOpts {
    /// Keep current errors instead of clearing them
    pub keep_errors: bool,
}

/// One element of a field array, as keyed by the rendering layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArrayField {
    /// Durable identity, stable across reorders
    pub key: String,
    /// Current position in the array
    pub index: usize,
}

/// Subscriber callback invoked with each new state snapshot.
pub type StateCallback = Box<dyn FnMut(&FormState)>;

/// Watch callback invoked with each value update.
pub type WatchCallback = Box<dyn FnMut(&WatchUpdate)>;

/// The uniform operation set every backend engine implements.
///
/// Backends differ in how they hold values and metadata; from the caller's
/// perspective every implementation behaves identically.
pub trait FormBackend {
    /// A full snapshot of the current form state.
    fn state(&self) -> FormState;

    /// The value at `path`, if present.
    fn value(&self, path: &str) -> Option<Value>;

    /// The whole current value tree.
    fn values(&self) -> Value;

    /// The error at `path`, if any.
    fn error(&self, path: &str) -> Option<FieldError>;

    /// Every current error, keyed by path.
    fn errors(&self) -> BTreeMap<String, FieldError>;

    /// Touched/dirty/error metadata for one path.
    fn field_state(&self, path: &str) -> FieldState;

    /// Write `value` at `path`.
    fn set_value(&mut self, path: &str, value: Value, opts: SetValueOpts);

    /// Write several values at once with a single notification, followed by
    /// one validation pass if requested. `partial` must be an object; its
    /// objects are merged key by key, while arrays and scalars replace the
    /// current value wholesale.
    fn set_values(&mut self, partial: Value, validate: bool) -> Result<()>;

    /// Attach an error to `path` directly, independent of the validator.
    fn set_error(&mut self, path: &str, error: FieldError);

    /// Clear the errors at exactly `paths`; an empty slice clears every
    /// field.
    fn clear_errors(&mut self, paths: &[&str]);

    /// Register a path, creating its metadata, and return the descriptor
    /// the renderer binds to an input.
    fn register(&mut self, path: &str) -> FieldDescriptor;

    /// Drop the metadata for `path`. The value tree is not altered.
    fn unregister(&mut self, path: &str);

    /// Report a change event for a registered path. Validation runs
    /// according to the configured mode.
    fn change(&mut self, path: &str, event: FieldEvent);

    /// Report that `path` lost focus: marks it touched and validates when
    /// the configured mode asks for it.
    fn blur(&mut self, path: &str);

    /// Replace the value tree with `values` merged over the stored defaults
    /// (or the defaults alone); clears touched/dirty, errors (unless kept),
    /// array identities, and the submit count.
    fn reset(&mut self, values: Option<Value>, opts: ResetOpts) -> Result<()>;

    /// Validate the whole tree and apply results to `paths` (all paths when
    /// empty). Returns whether the requested set passed.
    fn trigger(&mut self, paths: &[&str]) -> bool;

    /// Run the submit flow: flag `is_submitting`, bump the submit count,
    /// validate, then call exactly one of the two handlers. An `Err` from
    /// `on_valid` is redirected to `on_invalid` with the best-known errors.
    fn submit(
        &mut self,
        on_valid: &mut dyn FnMut(&Value) -> std::result::Result<(), String>,
        on_invalid: &mut dyn FnMut(&BTreeMap<String, FieldError>),
    );

    /// Observe every state change with full snapshots.
    fn subscribe(&mut self, callback: StateCallback) -> SubscriptionId;

    /// Cancel a subscription; idempotent.
    fn unsubscribe(&mut self, id: SubscriptionId);

    /// Observe value changes for the given paths (all values when empty).
    fn watch(&mut self, paths: &[&str], callback: WatchCallback) -> WatchId;

    /// Cancel a watch; idempotent.
    fn unwatch(&mut self, id: WatchId);

    /// The elements of the array at `path` with their durable keys.
    fn array_fields(&mut self, path: &str) -> Vec<ArrayField>;

    /// Append a new element.
    fn array_append(&mut self, path: &str, value: Value) -> Result<()>;

    /// Prepend a new element.
    fn array_prepend(&mut self, path: &str, value: Value) -> Result<()>;

    /// Insert a new element at `index`.
    fn array_insert(&mut self, path: &str, index: usize, value: Value) -> Result<()>;

    /// Remove the elements at `indices`.
    fn array_remove(&mut self, path: &str, indices: &[usize]) -> Result<()>;

    /// Exchange the elements at `a` and `b`; identities travel with them.
    fn array_swap(&mut self, path: &str, a: usize, b: usize) -> Result<()>;

    /// Move the element at `from` to `to`; its identity travels with it.
    fn array_move(&mut self, path: &str, from: usize, to: usize) -> Result<()>;

    /// Overwrite the element at `index` in place, keeping its identity.
    fn array_update(&mut self, path: &str, index: usize, value: Value) -> Result<()>;

    /// Replace the whole array; every element gets a fresh identity.
    fn array_replace(&mut self, path: &str, values: Vec<Value>) -> Result<()>;

    /// Submit with owned closures (ergonomic form of [`FormBackend::submit`]).
    fn handle_submit<V, I>(&mut self, mut on_valid: V, mut on_invalid: I)
    where
        Self: Sized,
        V: FnMut(&Value) -> std::result::Result<(), String>,
        I: FnMut(&BTreeMap<String, FieldError>),
    {
        self.submit(&mut on_valid, &mut on_invalid);
    }

    /// A borrowing facade bundling the array operations for one path.
    fn field_array(&mut self, path: &str) -> FieldArray<'_, Self>
    where
        Self: Sized,
    {
        FieldArray {
            backend: self,
            path: path.to_owned(),
        }
    }
}

/// Borrowing facade over one field array, so call sites do not repeat the
/// path for every operation.
#[derive(Debug)]
pub struct FieldArray<'a, B: FormBackend + ?Sized> {
    backend: &'a mut B,
    path: String,
}

impl<B: FormBackend + ?Sized> FieldArray<'_, B> {
    /// The elements with their durable keys.
    pub fn fields(&mut self) -> Vec<ArrayField> {
        self.backend.array_fields(&self.path)
    }

    /// Append a new element.
    pub fn append(&mut self, value: Value) -> Result<()> {
        self.backend.array_append(&self.path, value)
    }

    /// Prepend a new element.
    pub fn prepend(&mut self, value: Value) -> Result<()> {
        self.backend.array_prepend(&self.path, value)
    }

    /// Insert a new element at `index`.
    pub fn insert(&mut self, index: usize, value: Value) -> Result<()> {
        self.backend.array_insert(&self.path, index, value)
    }

    /// Remove the elements at `indices`.
    pub fn remove(&mut self, indices: &[usize]) -> Result<()> {
        self.backend.array_remove(&self.path, indices)
    }

    /// Exchange two elements.
    pub fn swap(&mut self, a: usize, b: usize) -> Result<()> {
        self.backend.array_swap(&self.path, a, b)
    }

    /// Move one element.
    pub fn move_item(&mut self, from: usize, to: usize) -> Result<()> {
        self.backend.array_move(&self.path, from, to)
    }

    /// Overwrite one element in place.
    pub fn update(&mut self, index: usize, value: Value) -> Result<()> {
        self.backend.array_update(&self.path, index, value)
    }

    /// Replace the whole array.
    pub fn replace(&mut self, values: Vec<Value>) -> Result<()> {
        self.backend.array_replace(&self.path, values)
    }
}
