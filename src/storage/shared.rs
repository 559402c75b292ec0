//! Copy-on-write handle shared by the scheduler and readers.

use std::sync::{Arc, Mutex, PoisonError, RwLock};

use crate::models::Record;
use crate::storage::RecordStore;

/// Thread-safe handle to the current store snapshot.
///
/// Readers clone the current `Arc<RecordStore>` and never see a half-applied
/// merge. Writers mutate a private copy and publish it with one pointer swap.
#[derive(Clone, Default)]
pub struct SharedStore {
    current: Arc<RwLock<Arc<RecordStore>>>,
    writer: Arc<Mutex<()>>,
}

impl SharedStore {
    pub fn new(store: RecordStore) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(store))),
            writer: Arc::new(Mutex::new(())),
        }
    }

    /// The most recently published snapshot.
    pub fn snapshot(&self) -> Arc<RecordStore> {
        // The guarded value is a single Arc, so a poisoned lock still holds
        // a complete snapshot.
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Apply `mutate` to a copy of the store and publish the result.
    ///
    /// Returns the closure's output together with the published snapshot.
    pub fn update<T>(&self, mutate: impl FnOnce(&mut RecordStore) -> T) -> (T, Arc<RecordStore>) {
        let _gate = self.writer.lock().unwrap_or_else(PoisonError::into_inner);

        let mut next = RecordStore::clone(&self.snapshot());
        let output = mutate(&mut next);
        next.touch();

        let next = Arc::new(next);
        self.publish(Arc::clone(&next));
        (output, next)
    }

    /// Replace the whole store, e.g. after a reload.
    pub fn replace(&self, store: RecordStore) {
        let _gate = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        self.publish(Arc::new(store));
    }

    pub fn random_record(&self) -> Option<Record> {
        self.snapshot().random_record()
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    fn publish(&self, next: Arc<RecordStore>) {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *guard = next;
    }
}
