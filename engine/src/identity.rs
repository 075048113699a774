//! Stable identities for field-array elements.
//!
//! A rendering layer needs a durable key per list item so that reordering a
//! field array does not remount every row. The registry assigns an opaque id
//! to each array element and keeps it attached to that element across
//! insert, remove, move and swap; ids are regenerated only when an element
//! is genuinely new.
//!
//! Each engine instance owns its own registry and counter, so concurrent
//! forms never share or leak identifier sequences.

use std::collections::BTreeMap;

/// Per array-path mapping from element index to a durable identifier.
#[derive(Debug, Default)]
pub struct IdRegistry {
    arrays: BTreeMap<String, Vec<String>>,
    counter: u64,
}

impl IdRegistry {
    /// Create an empty registry with its counter at zero.
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&mut self) -> String {
        self.counter += 1;
        format!("field-{}", self.counter)
    }

    /// The ids for the array at `path`, grown or shrunk to `len` entries.
    ///
    /// Elements seen for the first time get fresh ids; reading twice
    /// without an intervening mutation yields the identical list.
    pub fn ids(&mut self, path: &str, len: usize) -> Vec<String> {
        // Two-phase to satisfy the borrow on `self.arrays` while minting ids.
        let current_len = self.arrays.get(path).map_or(0, Vec::len);
        let fresh: Vec<String> = (current_len..len).map(|_| self.next_id()).collect();
        let entry = self.arrays.entry(path.to_owned()).or_default();
        entry.truncate(len);
        entry.extend(fresh);
        entry.clone()
    }

    /// A new element was appended; assign it a fresh id at the last index.
    pub fn append(&mut self, path: &str, len_after: usize) {
        self.ids(path, len_after.saturating_sub(1));
        let id = self.next_id();
        self.arrays.entry(path.to_owned()).or_default().push(id);
    }

    /// A new element was prepended; existing ids shift up by one.
    pub fn prepend(&mut self, path: &str, len_after: usize) {
        self.insert(path, 0, len_after);
    }

    /// A new element was inserted at `at`; ids at `index >= at` shift up.
    pub fn insert(&mut self, path: &str, at: usize, len_after: usize) {
        self.ids(path, len_after.saturating_sub(1));
        let id = self.next_id();
        let entry = self.arrays.entry(path.to_owned()).or_default();
        let at = at.min(entry.len());
        entry.insert(at, id);
    }

    /// Elements at `indices` were removed; remaining ids renumber densely
    /// from zero, preserving relative order and original identifiers.
    pub fn remove(&mut self, path: &str, indices: &[usize], len_before: usize) {
        self.ids(path, len_before);
        if let Some(entry) = self.arrays.get_mut(path) {
            let mut sorted: Vec<usize> = indices.to_vec();
            sorted.sort_unstable();
            sorted.dedup();
            for index in sorted.into_iter().rev() {
                if index < entry.len() {
                    entry.remove(index);
                }
            }
        }
    }

    /// Elements at `a` and `b` traded places; their ids trade places too.
    pub fn swap(&mut self, path: &str, a: usize, b: usize, len: usize) {
        self.ids(path, len);
        if let Some(entry) = self.arrays.get_mut(path) {
            if a < entry.len() && b < entry.len() {
                entry.swap(a, b);
            }
        }
    }

    /// The element at `from` moved to `to`; its id travels with it and is
    /// never regenerated for a pure reorder. A destination past the end is
    /// clamped to the array length.
    pub fn move_item(&mut self, path: &str, from: usize, to: usize, len: usize) {
        self.ids(path, len);
        if let Some(entry) = self.arrays.get_mut(path) {
            if from < entry.len() {
                let id = entry.remove(from);
                let to = to.min(entry.len());
                entry.insert(to, id);
            }
        }
    }

    /// Every element was replaced; the whole map resets to fresh ids.
    pub fn replace(&mut self, path: &str, len: usize) {
        let fresh: Vec<String> = (0..len).map(|_| self.next_id()).collect();
        self.arrays.insert(path.to_owned(), fresh);
    }

    /// Drop the ids for one array path.
    pub fn clear(&mut self, path: &str) {
        self.arrays.remove(path);
    }

    /// Drop all ids and restart the counter. Intended for form reset and
    /// test isolation.
    pub fn reset(&mut self) {
        self.arrays.clear();
        self.counter = 0;
    }
}
