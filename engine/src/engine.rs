//! The reference backend: a nested value tree with side metadata maps.
//!
//! `FormEngine` owns the value tree, a per-path metadata map, the stable-id
//! registry for field arrays, and the subscriber lists. Every mutation goes
//! through path-qualified writes that produce a new tree, derived state is
//! recomputed, and observers are notified synchronously.
//!
//! Validation is decoupled from settlement so an embedder may run the
//! validator asynchronously: [`FormEngine::begin_validation`] hands out a
//! generation-stamped ticket with a values snapshot, and
//! [`FormEngine::settle_validation`] applies the outcome unless a newer
//! pass has claimed the same paths in the meantime. The synchronous
//! conveniences (`trigger`, `set_value` with validation, `submit`) drive
//! the same machinery, so last-call-wins has a single implementation.

use crate::backend::{
    ArrayField, FieldDescriptor, FieldEvent, FormBackend, ResetOpts, SetValueOpts, StateCallback,
    SubscriptionId, WatchCallback, WatchId, WatchUpdate,
};
use crate::compare;
use crate::config::{FormConfig, Mode};
use crate::error::{Error, Result};
use crate::identity::IdRegistry;
use crate::path;
use crate::report::FieldError;
use crate::state::{FieldState, FormState};
use crate::validator::{Validation, Validator};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, trace};

/// Per-path touched/dirty/error record, created lazily on first
/// registration or mutation of a path.
#[derive(Debug, Clone, Default)]
struct FieldMeta {
    touched: bool,
    dirty: bool,
    error: Option<FieldError>,
}

/// A generation-stamped validation pass in flight.
///
/// Holds the values snapshot the validator should see. Settling a ticket
/// whose paths have since been claimed by a newer pass applies nothing.
#[derive(Debug)]
pub struct ValidationTicket {
    generation: u64,
    scope: Option<Vec<String>>,
    values: Value,
}

impl ValidationTicket {
    /// The value tree as it stood when the pass began.
    pub fn values(&self) -> &Value {
        &self.values
    }
}

/// The reference implementation of [`FormBackend`].
pub struct FormEngine {
    defaults: Value,
    values: Value,
    validator: Option<Box<dyn Validator>>,
    mode: Mode,
    re_validate_mode: Mode,
    meta: BTreeMap<String, FieldMeta>,
    ids: IdRegistry,
    subscribers: Vec<(SubscriptionId, StateCallback)>,
    watchers: Vec<(WatchId, Vec<String>, WatchCallback)>,
    next_handle: u64,
    submit_count: u64,
    is_submitting: bool,
    pending_validations: u64,
    generation: u64,
    all_scope_generation: u64,
    path_generations: BTreeMap<String, u64>,
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn merge_over(base: &Value, overlay: &Value) -> Value {
    match (base, overlay) {
        (Value::Object(b), Value::Object(o)) => {
            let mut out = b.clone();
            for (key, value) in o {
                let merged = match out.get(key) {
                    Some(existing) => merge_over(existing, value),
                    None => value.clone(),
                };
                out.insert(key.clone(), merged);
            }
            Value::Object(out)
        }
        _ => overlay.clone(),
    }
}

fn within_scope(scope: &str, key: &str) -> bool {
    scope.is_empty() || key == scope || (key.starts_with(scope) && key.as_bytes()[scope.len()] == b'.')
}

/// Decompose a partial value tree into `(path, value)` writes. Only objects
/// are descended; arrays and scalars are written wholesale, so a shorter
/// array in the partial replaces the current array instead of patching its
/// leading indices.
fn collect_writes(node: &Value, prefix: String, out: &mut Vec<(String, Value)>) {
    match node {
        Value::Object(map) if !map.is_empty() => {
            for (key, child) in map {
                collect_writes(child, path::join(&prefix, key), out);
            }
        }
        other => {
            if !prefix.is_empty() {
                out.push((prefix, other.clone()));
            }
        }
    }
}

impl FormEngine {
    /// Create an engine from a config. The native store is initialized from
    /// `default_values`, which must be a JSON object; anything else is a
    /// configuration mistake and fails fast.
    pub fn new(config: FormConfig) -> Result<Self> {
        if !config.default_values.is_object() {
            return Err(Error::DefaultsNotObject(
                json_kind(&config.default_values).to_owned(),
            ));
        }
        let mut engine = Self {
            defaults: config.default_values.clone(),
            values: config.default_values,
            validator: config.validator,
            mode: config.mode,
            re_validate_mode: config.re_validate_mode,
            meta: BTreeMap::new(),
            ids: IdRegistry::new(),
            subscribers: Vec::new(),
            watchers: Vec::new(),
            next_handle: 0,
            submit_count: 0,
            is_submitting: false,
            pending_validations: 0,
            generation: 0,
            all_scope_generation: 0,
            path_generations: BTreeMap::new(),
        };
        debug!(mode = ?engine.mode, "form engine created");
        if config.validate_on_mount {
            engine.run_validation(&[]);
        }
        Ok(engine)
    }

    /// The stored default values.
    pub fn default_values(&self) -> &Value {
        &self.defaults
    }

    /// Begin a validation pass for `paths` (the whole form when empty).
    ///
    /// Stamps a fresh generation on the requested paths and snapshots the
    /// current values for the validator. `is_validating` stays true until
    /// the matching [`FormEngine::settle_validation`] call; subscribers are
    /// notified of the flip.
    pub fn begin_validation(&mut self, paths: &[&str]) -> ValidationTicket {
        self.generation += 1;
        self.pending_validations += 1;
        let scope = if paths.is_empty() {
            self.all_scope_generation = self.generation;
            None
        } else {
            let owned: Vec<String> = paths.iter().map(|p| (*p).to_owned()).collect();
            for p in &owned {
                self.path_generations.insert(p.clone(), self.generation);
            }
            Some(owned)
        };
        trace!(generation = self.generation, "validation pass started");
        let ticket = ValidationTicket {
            generation: self.generation,
            scope,
            values: self.values.clone(),
        };
        self.notify(false);
        ticket
    }

    /// Settle a validation pass. Applies the outcome to the ticket's scope,
    /// except for paths a newer pass has claimed since — a stale result
    /// never overwrites a newer one. Notifies subscribers and returns
    /// whether the scope passed.
    pub fn settle_validation(&mut self, ticket: ValidationTicket, outcome: Validation) -> bool {
        self.pending_validations = self.pending_validations.saturating_sub(1);

        let issues: BTreeMap<String, FieldError> = outcome
            .issues()
            .iter()
            .map(|issue| (issue.path.clone(), issue.error()))
            .collect();

        let scopes: Vec<String> = match &ticket.scope {
            None => vec![String::new()],
            Some(paths) => paths.clone(),
        };
        let in_scope =
            |key: &str| scopes.iter().any(|scope| within_scope(scope, key));
        let passed = !issues.keys().any(|key| in_scope(key));

        // Clear existing errors within scope, on paths this ticket still owns.
        let stale_cleared: Vec<String> = self
            .meta
            .iter()
            .filter(|(key, meta)| meta.error.is_some() && in_scope(key))
            .map(|(key, _)| key.clone())
            .collect();
        for key in stale_cleared {
            if self.path_is_current(&key, ticket.generation) {
                if let Some(meta) = self.meta.get_mut(&key) {
                    meta.error = None;
                }
            }
        }

        // Record the new errors within scope, same ownership rule.
        for (key, error) in &issues {
            if in_scope(key) && self.path_is_current(key, ticket.generation) {
                self.meta.entry(key.clone()).or_default().error = Some(error.clone());
            }
        }

        trace!(generation = ticket.generation, passed, "validation pass settled");
        self.notify(false);
        passed
    }

    /// Whether a pass of `generation` still owns `path`: no newer pass may
    /// have claimed it, directly or through an ancestor scope.
    fn path_is_current(&self, path: &str, generation: u64) -> bool {
        if self.all_scope_generation > generation {
            return false;
        }
        self.path_generations
            .iter()
            .all(|(scope, g)| *g <= generation || !within_scope(scope, path))
    }

    fn run_validation(&mut self, paths: &[&str]) -> bool {
        if self.validator.is_none() {
            return true;
        }
        let ticket = self.begin_validation(paths);
        let outcome = match self.validator.as_ref() {
            Some(validator) => validator.validate(ticket.values()),
            None => Validation::Valid(ticket.values().clone()),
        };
        self.settle_validation(ticket, outcome)
    }

    fn meta_mut(&mut self, path: &str) -> &mut FieldMeta {
        self.meta.entry(path.to_owned()).or_default()
    }

    fn recompute_dirty(&mut self, path: &str) {
        let dirty = match (
            path::get(&self.defaults, path),
            path::get(&self.values, path),
        ) {
            (Some(default), Some(current)) => !compare::deep_equal(default, current),
            (None, Some(current)) => !current.is_null(),
            (Some(default), None) => !default.is_null(),
            (None, None) => false,
        };
        self.meta_mut(path).dirty = dirty;
    }

    fn write_value(&mut self, path: &str, value: Value, mark_dirty: bool) {
        self.values = path::set(&self.values, path, value);
        if mark_dirty {
            self.recompute_dirty(path);
        } else {
            self.meta_mut(path);
        }
    }

    fn errors_map(&self) -> BTreeMap<String, FieldError> {
        self.meta
            .iter()
            .filter_map(|(path, meta)| meta.error.clone().map(|e| (path.clone(), e)))
            .collect()
    }

    fn snapshot(&self) -> FormState {
        let errors = self.errors_map();
        let touched = self
            .meta
            .iter()
            .filter(|(_, meta)| meta.touched)
            .map(|(path, _)| path.clone())
            .collect();
        let dirty: std::collections::BTreeSet<String> = self
            .meta
            .iter()
            .filter(|(_, meta)| meta.dirty)
            .map(|(path, _)| path.clone())
            .collect();
        FormState {
            values: self.values.clone(),
            is_valid: errors.is_empty(),
            is_dirty: !dirty.is_empty(),
            errors,
            touched,
            dirty,
            is_submitting: self.is_submitting,
            is_validating: self.pending_validations > 0,
            submit_count: self.submit_count,
        }
    }

    /// Notify observers. Subscriber and watcher lists are taken out of the
    /// engine while iterating, so a callback can never be re-entered by the
    /// same mutation and cancellation during notification cannot misfire.
    fn notify(&mut self, values_changed: bool) {
        let state = self.snapshot();
        let mut subscribers = std::mem::take(&mut self.subscribers);
        for (_, callback) in subscribers.iter_mut() {
            callback(&state);
        }
        self.subscribers = subscribers;

        if values_changed {
            let mut watchers = std::mem::take(&mut self.watchers);
            for (_, paths, callback) in watchers.iter_mut() {
                let update = self.watch_update(paths);
                callback(&update);
            }
            self.watchers = watchers;
        }
    }

    fn watch_update(&self, paths: &[String]) -> WatchUpdate {
        match paths {
            [] => WatchUpdate::All(self.values.clone()),
            [single] => WatchUpdate::Single(
                path::get(&self.values, single)
                    .cloned()
                    .unwrap_or(Value::Null),
            ),
            many => WatchUpdate::Many(
                many.iter()
                    .map(|p| {
                        (
                            p.clone(),
                            path::get(&self.values, p).cloned().unwrap_or(Value::Null),
                        )
                    })
                    .collect(),
            ),
        }
    }

    fn array_at(&self, path: &str) -> Result<Vec<Value>> {
        match path::get(&self.values, path) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Array(items)) => Ok(items.clone()),
            Some(_) => Err(Error::NotAnArray(path.to_owned())),
        }
    }

    fn check_index(&self, path: &str, index: usize, len: usize) -> Result<()> {
        if index < len {
            Ok(())
        } else {
            Err(Error::IndexOutOfBounds {
                path: path.to_owned(),
                index,
                len,
            })
        }
    }

    /// Write the mutated array back, refresh dirtiness for the array path,
    /// revalidate it when a validator is configured, and notify.
    fn commit_array(&mut self, path: &str, items: Vec<Value>) {
        self.values = path::set(&self.values, path, Value::Array(items));
        self.recompute_dirty(path);
        if self.validator.is_some() {
            self.run_validation(&[path]);
        }
        self.notify(true);
    }
}

impl FormBackend for FormEngine {
    fn state(&self) -> FormState {
        self.snapshot()
    }

    fn value(&self, path: &str) -> Option<Value> {
        path::get(&self.values, path).cloned()
    }

    fn values(&self) -> Value {
        self.values.clone()
    }

    fn error(&self, path: &str) -> Option<FieldError> {
        self.meta.get(path).and_then(|meta| meta.error.clone())
    }

    fn errors(&self) -> BTreeMap<String, FieldError> {
        self.errors_map()
    }

    fn field_state(&self, path: &str) -> FieldState {
        let meta = self.meta.get(path).cloned().unwrap_or_default();
        FieldState {
            is_touched: meta.touched,
            is_dirty: meta.dirty,
            is_invalid: meta.error.is_some(),
            error: meta.error,
        }
    }

    fn set_value(&mut self, path: &str, value: Value, opts: SetValueOpts) {
        trace!(path = %path, "set value");
        self.write_value(path, value, opts.mark_dirty);
        if opts.validate {
            self.run_validation(&[path]);
        }
        self.notify(true);
    }

    fn set_values(&mut self, partial: Value, validate: bool) -> Result<()> {
        if !partial.is_object() {
            return Err(Error::ValuesNotObject(json_kind(&partial).to_owned()));
        }
        // Sequential writes without intermediate notifications.
        let mut writes = Vec::new();
        collect_writes(&partial, String::new(), &mut writes);
        let mut written = Vec::with_capacity(writes.len());
        for (leaf, value) in writes {
            self.write_value(&leaf, value, true);
            written.push(leaf);
        }
        if validate {
            let refs: Vec<&str> = written.iter().map(String::as_str).collect();
            self.run_validation(&refs);
        }
        self.notify(true);
        Ok(())
    }

    fn set_error(&mut self, path: &str, error: FieldError) {
        self.meta_mut(path).error = Some(error);
        self.notify(false);
    }

    fn clear_errors(&mut self, paths: &[&str]) {
        if paths.is_empty() {
            for meta in self.meta.values_mut() {
                meta.error = None;
            }
        } else {
            for p in paths {
                if let Some(meta) = self.meta.get_mut(*p) {
                    meta.error = None;
                }
            }
        }
        self.notify(false);
    }

    fn register(&mut self, path: &str) -> FieldDescriptor {
        self.meta_mut(path);
        FieldDescriptor {
            name: path.to_owned(),
        }
    }

    fn unregister(&mut self, path: &str) {
        self.meta.remove(path);
        self.notify(false);
    }

    fn change(&mut self, path: &str, event: FieldEvent) {
        let value = event.into_value();
        self.write_value(path, value, true);
        let (touched, has_error) = self
            .meta
            .get(path)
            .map(|meta| (meta.touched, meta.error.is_some()))
            .unwrap_or((false, false));
        let should_validate = if has_error {
            self.re_validate_mode.validates_on_change(touched)
        } else {
            self.mode.validates_on_change(touched)
        };
        if should_validate {
            self.run_validation(&[path]);
        }
        self.notify(true);
    }

    fn blur(&mut self, path: &str) {
        self.meta_mut(path).touched = true;
        let has_error = self
            .meta
            .get(path)
            .is_some_and(|meta| meta.error.is_some());
        let should_validate = if has_error {
            self.re_validate_mode.validates_on_blur()
        } else {
            self.mode.validates_on_blur()
        };
        if should_validate {
            self.run_validation(&[path]);
        }
        self.notify(false);
    }

    fn reset(&mut self, values: Option<Value>, opts: ResetOpts) -> Result<()> {
        let next = match values {
            None => self.defaults.clone(),
            Some(overlay) => {
                if !overlay.is_object() {
                    return Err(Error::ValuesNotObject(json_kind(&overlay).to_owned()));
                }
                merge_over(&self.defaults, &overlay)
            }
        };
        debug!("form reset");
        self.values = next;
        if opts.keep_errors {
            self.meta.retain(|_, meta| meta.error.is_some());
            for meta in self.meta.values_mut() {
                meta.touched = false;
                meta.dirty = false;
            }
        } else {
            self.meta.clear();
        }
        self.ids.reset();
        self.submit_count = 0;
        // Any in-flight validation pass is now stale by definition.
        self.generation += 1;
        self.all_scope_generation = self.generation;
        self.path_generations.clear();
        self.notify(true);
        Ok(())
    }

    fn trigger(&mut self, paths: &[&str]) -> bool {
        let passed = self.run_validation(paths);
        self.notify(false);
        passed
    }

    fn submit(
        &mut self,
        on_valid: &mut dyn FnMut(&Value) -> std::result::Result<(), String>,
        on_invalid: &mut dyn FnMut(&BTreeMap<String, FieldError>),
    ) {
        self.is_submitting = true;
        self.submit_count += 1;
        debug!(submit_count = self.submit_count, "submit started");
        self.notify(false);

        let passed = self.run_validation(&[]);
        if passed && self.errors_map().is_empty() {
            let values = self.values.clone();
            if let Err(reason) = on_valid(&values) {
                debug!(reason = %reason, "submit handler failed");
                on_invalid(&self.errors_map());
            }
        } else {
            on_invalid(&self.errors_map());
        }

        self.is_submitting = false;
        self.notify(false);
    }

    fn subscribe(&mut self, callback: StateCallback) -> SubscriptionId {
        self.next_handle += 1;
        let id = SubscriptionId(self.next_handle);
        self.subscribers.push((id, callback));
        id
    }

    fn unsubscribe(&mut self, id: SubscriptionId) {
        self.subscribers.retain(|(sid, _)| *sid != id);
    }

    fn watch(&mut self, paths: &[&str], callback: WatchCallback) -> WatchId {
        self.next_handle += 1;
        let id = WatchId(self.next_handle);
        let owned = paths.iter().map(|p| (*p).to_owned()).collect();
        self.watchers.push((id, owned, callback));
        id
    }

    fn unwatch(&mut self, id: WatchId) {
        self.watchers.retain(|(wid, _, _)| *wid != id);
    }

    fn array_fields(&mut self, path: &str) -> Vec<ArrayField> {
        let len = self.array_at(path).map(|items| items.len()).unwrap_or(0);
        self.ids
            .ids(path, len)
            .into_iter()
            .enumerate()
            .map(|(index, key)| ArrayField { key, index })
            .collect()
    }

    fn array_append(&mut self, path: &str, value: Value) -> Result<()> {
        let mut items = self.array_at(path)?;
        items.push(value);
        self.ids.append(path, items.len());
        self.commit_array(path, items);
        Ok(())
    }

    fn array_prepend(&mut self, path: &str, value: Value) -> Result<()> {
        let mut items = self.array_at(path)?;
        items.insert(0, value);
        self.ids.prepend(path, items.len());
        self.commit_array(path, items);
        Ok(())
    }

    fn array_insert(&mut self, path: &str, index: usize, value: Value) -> Result<()> {
        let mut items = self.array_at(path)?;
        if index > items.len() {
            return Err(Error::IndexOutOfBounds {
                path: path.to_owned(),
                index,
                len: items.len(),
            });
        }
        items.insert(index, value);
        self.ids.insert(path, index, items.len());
        self.commit_array(path, items);
        Ok(())
    }

    fn array_remove(&mut self, path: &str, indices: &[usize]) -> Result<()> {
        let mut items = self.array_at(path)?;
        let len_before = items.len();
        for &index in indices {
            self.check_index(path, index, len_before)?;
        }
        let mut sorted: Vec<usize> = indices.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        for index in sorted.into_iter().rev() {
            items.remove(index);
        }
        self.ids.remove(path, indices, len_before);
        self.commit_array(path, items);
        Ok(())
    }

    fn array_swap(&mut self, path: &str, a: usize, b: usize) -> Result<()> {
        let mut items = self.array_at(path)?;
        self.check_index(path, a, items.len())?;
        self.check_index(path, b, items.len())?;
        items.swap(a, b);
        self.ids.swap(path, a, b, items.len());
        self.commit_array(path, items);
        Ok(())
    }

    fn array_move(&mut self, path: &str, from: usize, to: usize) -> Result<()> {
        let mut items = self.array_at(path)?;
        self.check_index(path, from, items.len())?;
        let item = items.remove(from);
        // Destination past the end clamps to the array length.
        let clamped = to.min(items.len());
        items.insert(clamped, item);
        self.ids.move_item(path, from, to, items.len());
        self.commit_array(path, items);
        Ok(())
    }

    fn array_update(&mut self, path: &str, index: usize, value: Value) -> Result<()> {
        let mut items = self.array_at(path)?;
        self.check_index(path, index, items.len())?;
        items[index] = value;
        // Identity is unchanged for an in-place update.
        self.ids.ids(path, items.len());
        self.commit_array(path, items);
        Ok(())
    }

    fn array_replace(&mut self, path: &str, values: Vec<Value>) -> Result<()> {
        // Guard against replacing a non-array value.
        self.array_at(path)?;
        self.ids.replace(path, values.len());
        // A full replace is a semantic reset: metadata under the array goes.
        self.meta.retain(|key, _| !within_scope(path, key));
        self.commit_array(path, values);
        Ok(())
    }
}

impl std::fmt::Debug for FormEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormEngine")
            .field("values", &self.values)
            .field("mode", &self.mode)
            .field("fields", &self.meta.len())
            .field("subscribers", &self.subscribers.len())
            .field("watchers", &self.watchers.len())
            .field("submit_count", &self.submit_count)
            .finish()
    }
}
