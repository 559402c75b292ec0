//! Storage for harvested records.
//!
//! - [`RecordStore`]: the in-memory ordered map with dedup and culling
//! - [`SharedStore`]: copy-on-write handle shared by scheduler and readers
//! - [`LocalStorage`]: the JSON store file on disk
//!
//! ## File Format
//!
//! ```text
//! {
//!   "dQw4w9WgXcQ": { "title": "Ball Fondlers", "added": "2024-03-01T12:00:00Z" },
//!   ...
//! }
//! ```
//!
//! Keys appear in first-insertion order.

pub mod local;
pub mod records;
pub mod shared;

use async_trait::async_trait;

use crate::error::Result;

// Re-export for convenience
pub use local::LocalStorage;
pub use records::{RecordStore, retained_count};
pub use shared::SharedStore;

/// An entry skipped while loading because it failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuarantinedEntry {
    pub key: String,
    pub reason: String,
}

/// Result of loading the store file.
#[derive(Debug, Default)]
pub struct LoadOutcome {
    pub store: RecordStore,
    /// Entries rejected by validation, in file order
    pub quarantined: Vec<QuarantinedEntry>,
    /// Whether a store file was found
    pub existed: bool,
}

/// Trait for record persistence backends.
#[async_trait]
pub trait RecordStorage: Send + Sync {
    /// Load the persisted store, or an empty one if nothing was saved yet.
    ///
    /// Fails with `StoreLoad` if saved data exists but cannot be read.
    async fn load(&self) -> Result<LoadOutcome>;

    /// Overwrite the persisted store with `store`.
    ///
    /// Fails with `PersistenceWrite` on any I/O error.
    async fn persist(&self, store: &RecordStore) -> Result<()>;

    /// Human-readable location for logs.
    fn location(&self) -> String;
}
