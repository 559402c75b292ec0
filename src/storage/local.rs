//! Local filesystem storage implementation.
//!
//! The whole store lives in one JSON file which is rewritten on every
//! persist. Writes go to a sibling `.tmp` file that is renamed over the
//! target, so readers of the file never see a partial write.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::Value;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::StoredEntry;
use crate::storage::{LoadOutcome, QuarantinedEntry, RecordStorage, RecordStore};

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    path: PathBuf,
}

impl LocalStorage {
    /// Create a LocalStorage for the given store file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    ///
    /// The temp file is removed if any step fails.
    async fn write_bytes(&self, bytes: &[u8]) -> std::io::Result<()> {
        self.ensure_dir().await?;

        let tmp = self.path.with_extension("tmp");
        let result = Self::write_and_rename(&tmp, &self.path, bytes).await;
        if result.is_err() {
            if let Err(e) = tokio::fs::remove_file(&tmp).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    log::warn!("Could not remove {}: {}", tmp.display(), e);
                }
            }
        }
        result
    }

    async fn write_and_rename(tmp: &Path, target: &Path, bytes: &[u8]) -> std::io::Result<()> {
        let mut file = tokio::fs::File::create(tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(tmp, target).await
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::store_load(&self.path, e)),
        }
    }

    /// Validate raw entries, keeping good ones in file order.
    fn parse_entries(&self, bytes: &[u8]) -> Result<LoadOutcome> {
        let raw: IndexMap<String, Value> = serde_json::from_slice(bytes)
            .map_err(|e| AppError::store_load(&self.path, e))?;

        let mut entries = IndexMap::with_capacity(raw.len());
        let mut quarantined = Vec::new();

        for (key, value) in raw {
            if key.trim().is_empty() {
                quarantined.push(QuarantinedEntry {
                    key,
                    reason: "empty key".to_string(),
                });
                continue;
            }

            match serde_json::from_value::<StoredEntry>(value) {
                Ok(entry) => {
                    entries.insert(key, entry);
                }
                Err(e) => quarantined.push(QuarantinedEntry {
                    key,
                    reason: e.to_string(),
                }),
            }
        }

        for entry in &quarantined {
            log::warn!(
                "Quarantined store entry '{}' from {}: {}",
                entry.key,
                self.path.display(),
                entry.reason
            );
        }

        Ok(LoadOutcome {
            store: RecordStore::from_entries(entries),
            quarantined,
            existed: true,
        })
    }
}

#[async_trait]
impl RecordStorage for LocalStorage {
    async fn load(&self) -> Result<LoadOutcome> {
        match self.read_bytes().await? {
            Some(bytes) => {
                let outcome = self.parse_entries(&bytes)?;
                log::info!(
                    "Loaded {} records from {} ({} quarantined)",
                    outcome.store.len(),
                    self.path.display(),
                    outcome.quarantined.len()
                );
                Ok(outcome)
            }
            None => {
                log::warn!("No store file at {}, starting empty", self.path.display());
                Ok(LoadOutcome::default())
            }
        }
    }

    async fn persist(&self, store: &RecordStore) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(store.entries())
            .map_err(|e| AppError::persistence(&self.path, e))?;

        self.write_bytes(&bytes)
            .await
            .map_err(|e| AppError::persistence(&self.path, e))?;

        log::debug!(
            "Persisted {} records ({} bytes) to {}",
            store.len(),
            bytes.len(),
            self.path.display()
        );
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn sample_store() -> RecordStore {
        let mut store = RecordStore::new();
        let ts = Utc.with_ymd_and_hms(2024, 2, 2, 8, 30, 0).unwrap();
        store.add_record_at("zzz", "Real Fake Doors", ts);
        store.add_record_at("aaa", "Two Brothers", ts + chrono::Duration::seconds(1));
        store.add_record_at("mmm", "Personal Space", ts + chrono::Duration::seconds(2));
        store
    }

    #[tokio::test]
    async fn test_persist_and_load_round_trip() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path().join("db.json"));
        let store = sample_store();

        storage.persist(&store).await.unwrap();
        let loaded = storage.load().await.unwrap();

        assert!(loaded.existed);
        assert!(loaded.quarantined.is_empty());
        assert_eq!(loaded.store.entries(), store.entries());
        let keys: Vec<&str> = loaded.store.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["zzz", "aaa", "mmm"]);
    }

    #[tokio::test]
    async fn test_persist_overwrites_previous_content() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path().join("db.json"));

        storage.persist(&sample_store()).await.unwrap();
        let mut smaller = RecordStore::new();
        smaller.add_record("only", "Lil' Bits");
        storage.persist(&smaller).await.unwrap();

        let loaded = storage.load().await.unwrap();
        assert_eq!(loaded.store.len(), 1);
        assert!(loaded.store.contains("only"));
        assert!(!tmp.path().join("db.tmp").exists());
    }

    #[tokio::test]
    async fn test_file_shape() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("db.json");
        let storage = LocalStorage::new(&path);

        storage.persist(&sample_store()).await.unwrap();
        let value: Value = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();

        assert_eq!(value["aaa"]["title"], "Two Brothers");
        assert_eq!(value["aaa"]["added"], "2024-02-02T08:30:01Z");
    }

    #[tokio::test]
    async fn test_load_missing_file_is_empty() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path().join("missing.json"));

        let loaded = storage.load().await.unwrap();
        assert!(!loaded.existed);
        assert!(loaded.store.is_empty());
    }

    #[tokio::test]
    async fn test_load_corrupt_file_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("db.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = LocalStorage::new(&path).load().await.unwrap_err();
        assert!(matches!(err, AppError::StoreLoad { .. }));
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_load_non_object_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("db.json");
        std::fs::write(&path, "[1, 2, 3]").unwrap();

        let err = LocalStorage::new(&path).load().await.unwrap_err();
        assert!(matches!(err, AppError::StoreLoad { .. }));
    }

    #[tokio::test]
    async fn test_load_quarantines_bad_entries() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("db.json");
        std::fs::write(
            &path,
            r#"{
                "good1": {"title": "Eyeholes", "added": "2024-01-01T00:00:00Z"},
                "bad_shape": "just a string",
                "": {"title": "No key", "added": "2024-01-01T00:00:00Z"},
                "bad_time": {"title": "Stealy", "added": "soon"},
                "legacy": {"name": "Turbulent Juice", "added": "2022-07-08 09:10:11.123456"}
            }"#,
        )
        .unwrap();

        let loaded = LocalStorage::new(&path).load().await.unwrap();

        let keys: Vec<&str> = loaded.store.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["good1", "legacy"]);
        assert_eq!(loaded.store.get("legacy").unwrap().title, "Turbulent Juice");

        let rejected: Vec<&str> = loaded.quarantined.iter().map(|q| q.key.as_str()).collect();
        assert_eq!(rejected, vec!["bad_shape", "", "bad_time"]);
    }

    #[tokio::test]
    async fn test_persist_failure_is_reported() {
        let tmp = TempDir::new().unwrap();
        let blocker = tmp.path().join("blocker");
        std::fs::write(&blocker, "a file, not a directory").unwrap();
        let storage = LocalStorage::new(blocker.join("db.json"));

        let err = storage.persist(&sample_store()).await.unwrap_err();
        assert!(matches!(err, AppError::PersistenceWrite { .. }));
        assert!(!err.is_fatal());
    }

    #[tokio::test]
    async fn test_failed_rename_removes_temp_file() {
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("db.json");
        // A non-empty directory at the target path makes the rename fail
        // after the temp file has been fully written.
        std::fs::create_dir(&target).unwrap();
        std::fs::write(target.join("occupied"), "x").unwrap();
        let storage = LocalStorage::new(&target);

        let err = storage.persist(&sample_store()).await.unwrap_err();

        assert!(matches!(err, AppError::PersistenceWrite { .. }));
        assert!(!tmp.path().join("db.tmp").exists());
        assert!(target.join("occupied").exists());
    }
}
