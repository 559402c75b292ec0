//! In-memory record store.
//!
//! An insertion-ordered map of canonical key to [`StoredEntry`]. Keys are
//! unique and the first insertion wins. Culling keeps the most recently
//! inserted entries and drops the oldest ones.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use rand::Rng;

use crate::models::{Record, StoredEntry};

/// Insertion-ordered, deduplicated record map.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    entries: IndexMap<String, StoredEntry>,
    updated_at: Option<DateTime<Utc>>,
}

impl RecordStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from entries already in insertion order.
    pub fn from_entries(entries: IndexMap<String, StoredEntry>) -> Self {
        Self {
            entries,
            updated_at: Some(Utc::now()),
        }
    }

    /// Insert a record stamped with the current time.
    ///
    /// Returns `false` without touching the existing entry if `key` is
    /// already present.
    pub fn add_record(&mut self, key: &str, title: &str) -> bool {
        self.add_record_at(key, title, Utc::now())
    }

    /// Insert a record with an explicit timestamp.
    pub fn add_record_at(&mut self, key: &str, title: &str, added: DateTime<Utc>) -> bool {
        if self.entries.contains_key(key) {
            return false;
        }
        self.entries
            .insert(key.to_string(), StoredEntry::new(title, added));
        true
    }

    /// Drop the oldest entries once the store grows past `threshold`.
    ///
    /// Keeps exactly `floor(len * retain_fraction)` of the most recently
    /// inserted entries, in their original order. Returns how many entries
    /// were removed; zero when `len <= threshold`.
    ///
    /// A single oversized merge can leave more than `threshold` entries
    /// behind (`floor(len * retain_fraction) > threshold`); the next
    /// oversized merge culls again.
    pub fn cull(&mut self, threshold: usize, retain_fraction: f64) -> usize {
        let size = self.entries.len();
        if size <= threshold {
            return 0;
        }

        let keep = retained_count(size, retain_fraction);
        let remove = size - keep;
        self.entries.drain(..remove);
        remove
    }

    /// Pick a record uniformly at random.
    pub fn random_record(&self) -> Option<Record> {
        self.random_record_with(&mut rand::rng())
    }

    /// Pick a record uniformly at random using the given generator.
    pub fn random_record_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Record> {
        if self.entries.is_empty() {
            return None;
        }
        let index = rng.random_range(0..self.entries.len());
        self.entries
            .get_index(index)
            .map(|(key, entry)| entry.to_record(key))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<Record> {
        self.entries.get(key).map(|entry| entry.to_record(key))
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &StoredEntry)> {
        self.entries.iter().map(|(key, entry)| (key.as_str(), entry))
    }

    /// Earliest-inserted record still held.
    pub fn oldest(&self) -> Option<Record> {
        self.entries
            .first()
            .map(|(key, entry)| entry.to_record(key))
    }

    /// Most recently inserted record.
    pub fn newest(&self) -> Option<Record> {
        self.entries.last().map(|(key, entry)| entry.to_record(key))
    }

    pub fn entries(&self) -> &IndexMap<String, StoredEntry> {
        &self.entries
    }

    /// When the store was last loaded or published.
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = Some(Utc::now());
    }
}

/// Number of entries a cull keeps for a store of `size`.
pub fn retained_count(size: usize, retain_fraction: f64) -> usize {
    let fraction = retain_fraction.clamp(0.0, 1.0);
    let keep = (size as f64 * fraction).floor() as usize;
    keep.min(size)
}
