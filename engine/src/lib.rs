//! # Conform Engine
//!
//! A form state synchronization engine.
//!
//! This crate provides the core logic for managing form state: a nested
//! value tree addressed by dotted paths, per-field touched/dirty/error
//! metadata, pluggable validation, and stable identities for dynamic field
//! arrays. A rendering layer (native UI, web bridge, TUI) drives it through
//! the [`FormBackend`] trait and observes it through snapshots.
//!
//! ## Design Principles
//!
//! - **No IO**: the engine has no knowledge of files, network, or platform
//! - **Deterministic**: the same event sequence always produces the same state
//! - **Testable**: pure logic, no mocks needed
//! - **Backend-agnostic**: callers depend on [`FormBackend`], never on a
//!   concrete engine's internals
//!
//! ## Core Concepts
//!
//! ### Paths
//!
//! Every field is addressed by a dotted path such as `"user.pets.0.name"`.
//! All-numeric segments index into arrays, everything else keys into
//! objects. Reads through absent branches yield nothing instead of failing;
//! writes create intermediate containers as needed.
//!
//! ### State
//!
//! [`FormState`] is an immutable point-in-time aggregate: the value tree,
//! errors keyed by path, touched and dirty path sets, and the derived
//! `is_valid` / `is_dirty` flags. A field is dirty when its value differs
//! from its default by deep comparison, so changing a field back to its
//! default makes it clean again.
//!
//! ### Validation
//!
//! A [`Validator`] receives the whole value tree and reports either the
//! data or a flat list of [`ValidationIssue`]s. When validation runs is
//! governed by [`Mode`] (`onSubmit` by default, `onChange` once a field
//! carries an error). Concurrent passes are generation-stamped: a stale
//! result never overwrites a newer one.
//!
//! ### Field Arrays
//!
//! Dynamic lists get a durable key per element from the engine's id
//! registry. Reordering, inserting, or removing elements keeps each
//! surviving element's key attached to it, so a renderer never remounts a
//! row that merely moved.
//!
//! ## Quick Start
//!
//! ```rust
//! use conform_engine::{FieldEvent, FormBackend, FormConfig, FormEngine, Rules};
//! use serde_json::json;
//!
//! // 1. Configure the form
//! let config = FormConfig::new(json!({"name": "", "email": ""}))
//!     .with_validator(Rules::new().required("name"));
//! let mut form = FormEngine::new(config).unwrap();
//!
//! // 2. Feed it interaction events
//! form.change("name", FieldEvent::input("Ada"));
//! assert_eq!(form.value("name"), Some(json!("Ada")));
//! assert!(form.field_state("name").is_dirty);
//!
//! // 3. Validate explicitly
//! assert!(form.trigger(&[]));
//!
//! // 4. Submit
//! let mut submitted = None;
//! form.handle_submit(
//!     |values| {
//!         submitted = Some(values.clone());
//!         Ok(())
//!     },
//!     |_errors| {},
//! );
//! assert!(submitted.is_some());
//! assert_eq!(form.state().submit_count, 1);
//! ```
//!
//! ## Backends
//!
//! [`FormEngine`] is the reference backend: a JSON value tree with side
//! metadata maps. Alternative backends (a proxy-based store, a signal
//! graph, a remote mirror) implement [`FormBackend`] and become drop-in
//! replacements; callers written against the trait surface never notice
//! the swap.

pub mod backend;
pub mod compare;
pub mod config;
pub mod engine;
pub mod error;
pub mod identity;
pub mod path;
pub mod report;
pub mod state;
pub mod validator;

// Re-export main types at crate root
pub use backend::{
    ArrayField, ControlKind, FieldArray, FieldDescriptor, FieldEvent, FormBackend, InputEvent,
    ResetOpts, SetValueOpts, StateCallback, SubscriptionId, WatchCallback, WatchId, WatchUpdate,
};
pub use config::{FormConfig, Mode};
pub use engine::{FormEngine, ValidationTicket};
pub use error::{Error, Result};
pub use identity::IdRegistry;
pub use report::{FieldError, ValidationIssue, MANUAL_KIND, VALIDATION_KIND};
pub use state::{FieldState, FormState};
pub use validator::{Rules, Validation, Validator};

/// Type aliases for clarity
pub type FieldPath = String;
pub type ArrayKey = String;
