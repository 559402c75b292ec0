// src/services/reader.rs

//! Random record reader for the presentation layer.

use rand::Rng;
use serde::Serialize;

use crate::models::Record;
use crate::storage::SharedStore;

/// Result of a random read.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ReadOutcome {
    Found(Record),
    Empty,
}

impl ReadOutcome {
    pub fn into_record(self) -> Option<Record> {
        match self {
            Self::Found(record) => Some(record),
            Self::Empty => None,
        }
    }
}

impl From<Option<Record>> for ReadOutcome {
    fn from(record: Option<Record>) -> Self {
        record.map_or(Self::Empty, Self::Found)
    }
}

/// Stateless reader over the current store snapshot.
#[derive(Clone)]
pub struct RandomReader {
    store: SharedStore,
}

impl RandomReader {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Pick one stored record, or `Empty` when nothing is stored.
    pub fn pick(&self) -> ReadOutcome {
        self.store.snapshot().random_record().into()
    }

    pub fn pick_with<R: Rng + ?Sized>(&self, rng: &mut R) -> ReadOutcome {
        self.store.snapshot().random_record_with(rng).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::RecordStore;

    #[test]
    fn test_empty_store_reads_empty() {
        let reader = RandomReader::new(SharedStore::new(RecordStore::new()));
        assert_eq!(reader.pick(), ReadOutcome::Empty);
        assert_eq!(
            serde_json::to_value(reader.pick()).unwrap(),
            serde_json::json!({"status": "empty"})
        );
    }

    #[test]
    fn test_found_serializes_with_status() {
        let mut store = RecordStore::new();
        store.add_record("abc", "Mr. Sneezy");
        let reader = RandomReader::new(SharedStore::new(store));

        let value = serde_json::to_value(reader.pick()).unwrap();
        assert_eq!(value["status"], "found");
        assert_eq!(value["key"], "abc");
        assert_eq!(value["title"], "Mr. Sneezy");
    }

    #[test]
    fn test_reader_sees_published_updates() {
        let shared = SharedStore::new(RecordStore::new());
        let reader = RandomReader::new(shared.clone());
        assert!(reader.pick().into_record().is_none());

        shared.update(|store| store.add_record("k1", "Gazorpazorp"));
        assert_eq!(reader.pick().into_record().unwrap().key, "k1");
    }
}
