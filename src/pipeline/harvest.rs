// src/pipeline/harvest.rs

//! Harvest pipeline entry points used by the CLI.

use std::future::Future;
use std::sync::Arc;

use crate::error::Result;
use crate::models::{Config, CycleReport};
use crate::pipeline::ingest::Scheduler;
use crate::pipeline::supervisor::{Supervisor, SupervisorHandle};
use crate::services::{FeedClient, RandomReader};
use crate::storage::{RecordStorage, SharedStore};

/// Load the persisted store into a shared handle.
///
/// Fails with the fatal `StoreLoad` error if the file exists but is corrupt.
pub async fn open_store(storage: &dyn RecordStorage) -> Result<SharedStore> {
    let outcome = storage.load().await?;
    if !outcome.quarantined.is_empty() {
        log::warn!(
            "{} malformed entries in {} were skipped",
            outcome.quarantined.len(),
            storage.location()
        );
    }
    Ok(SharedStore::new(outcome.store))
}

/// Run a single ingestion cycle and return its report.
pub async fn run_once(
    config: &Config,
    feed: Arc<dyn FeedClient>,
    storage: Arc<dyn RecordStorage>,
) -> Result<CycleReport> {
    config.validate()?;
    let store = open_store(storage.as_ref()).await?;
    log::info!(
        "Harvesting r/{} into {} ({} records)",
        config.feed.collection,
        storage.location(),
        store.len()
    );

    let scheduler = Scheduler::new(config, feed, storage, store)?;
    let report = scheduler.run_cycle().await;
    log::info!("Ingestion cycle: {}", report.summary());
    Ok(report)
}

/// A running harvester: the supervised scheduler plus the store it feeds.
pub struct ServiceHandle {
    store: SharedStore,
    supervisor: SupervisorHandle,
}

impl ServiceHandle {
    /// Reader over the live store, usable while cycles are running.
    pub fn reader(&self) -> RandomReader {
        RandomReader::new(self.store.clone())
    }

    /// Whether the supervisor has exited on its own.
    pub fn is_finished(&self) -> bool {
        self.supervisor.is_finished()
    }

    /// Stop after the in-flight cycle (persistence included) and return the
    /// final store.
    pub async fn shutdown(self) -> SharedStore {
        let restarts = self.supervisor.shutdown().await;
        log::info!(
            "Harvester stopped with {} records ({} scheduler restarts)",
            self.store.len(),
            restarts
        );
        self.store
    }
}

/// Load the store and spawn the supervised scheduler.
///
/// Returns as soon as the scheduler is running; the first cycle starts
/// immediately in the background.
pub async fn start_service(
    config: &Config,
    feed: Arc<dyn FeedClient>,
    storage: Arc<dyn RecordStorage>,
) -> Result<ServiceHandle> {
    config.validate()?;
    let store = open_store(storage.as_ref()).await?;
    log::info!(
        "Starting harvester for r/{} with {} stored records",
        config.feed.collection,
        store.len()
    );

    let scheduler = Scheduler::new(config, feed, storage, store.clone())?;
    let supervisor = Supervisor::new(scheduler).spawn();
    Ok(ServiceHandle { store, supervisor })
}

/// Run the supervised scheduler until `shutdown_signal` resolves.
///
/// The cycle in flight when the signal arrives completes (and persists)
/// before this returns.
pub async fn run_service<F>(
    config: &Config,
    feed: Arc<dyn FeedClient>,
    storage: Arc<dyn RecordStorage>,
    shutdown_signal: F,
) -> Result<SharedStore>
where
    F: Future<Output = ()>,
{
    let handle = start_service(config, feed, storage).await?;
    shutdown_signal.await;
    Ok(handle.shutdown().await)
}
