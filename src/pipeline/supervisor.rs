//! Scheduler supervision.
//!
//! Runs the [`Scheduler`] as a tokio task. If the task panics it is restarted
//! after a growing delay; a clean exit (after shutdown) ends supervision.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::pipeline::ingest::Scheduler;
use crate::pipeline::retry::Backoff;

const RESTART_BASE: Duration = Duration::from_secs(5);
const RESTART_MAX: Duration = Duration::from_secs(300);

/// Owns the scheduler and restarts it when it dies.
pub struct Supervisor {
    scheduler: Scheduler,
    restart: Backoff,
}

/// Handle used to stop a spawned supervisor.
pub struct SupervisorHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<u32>,
}

impl Supervisor {
    pub fn new(scheduler: Scheduler) -> Self {
        Self {
            scheduler,
            restart: Backoff::new(RESTART_BASE, RESTART_MAX),
        }
    }

    pub fn with_restart_backoff(mut self, restart: Backoff) -> Self {
        self.restart = restart;
        self
    }

    /// Spawn the supervision loop on the current runtime.
    pub fn spawn(self) -> SupervisorHandle {
        let (shutdown, rx) = watch::channel(false);
        let task = tokio::spawn(self.supervise(rx));
        SupervisorHandle { shutdown, task }
    }

    /// Returns the number of restarts performed.
    async fn supervise(self, mut shutdown: watch::Receiver<bool>) -> u32 {
        let mut restarts = 0u32;

        loop {
            let worker = tokio::spawn(self.scheduler.clone().run(shutdown.clone()));

            match worker.await {
                Ok(()) => break,
                Err(e) if e.is_panic() => {
                    restarts += 1;
                    let delay = self.restart.delay(restarts);
                    log::error!(
                        "Scheduler task panicked (restart #{restarts}); restarting in {:?}",
                        delay
                    );
                }
                Err(e) => {
                    log::error!("Scheduler task was cancelled: {e}");
                    break;
                }
            }

            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                _ = tokio::time::sleep(self.restart.delay(restarts)) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        log::info!("Supervisor finished after {restarts} restart(s)");
        restarts
    }
}

impl SupervisorHandle {
    /// Ask the scheduler to stop after its current cycle and wait for it.
    ///
    /// Returns the number of restarts that happened while supervised.
    pub async fn shutdown(self) -> u32 {
        log::info!("Shutdown requested; waiting for the current cycle to finish");
        let _ = self.shutdown.send(true);
        match self.task.await {
            Ok(restarts) => restarts,
            Err(e) => {
                log::error!("Supervisor task failed: {e}");
                0
            }
        }
    }

    /// Whether the supervision loop has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::models::{Config, FeedBatch, FeedItem};
    use crate::services::FeedClient;
    use crate::storage::{LocalStorage, RecordStore, SharedStore};
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    /// Panics on its first call, then serves one item.
    struct FlakyFeed {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl FeedClient for FlakyFeed {
        async fn fetch_top(&self, collection: &str, _limit: usize) -> Result<FeedBatch> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                panic!("feed client bug");
            }
            Ok(FeedBatch {
                collection: collection.to_string(),
                adult: false,
                items: vec![FeedItem::new("Survivor", "https://youtu.be/survivor")],
            })
        }
    }

    #[tokio::test]
    async fn test_restarts_after_panic() {
        let tmp = TempDir::new().unwrap();
        let store = SharedStore::new(RecordStore::new());
        let scheduler = Scheduler::new(
            &Config::default(),
            Arc::new(FlakyFeed {
                calls: AtomicUsize::new(0),
            }),
            Arc::new(LocalStorage::new(tmp.path().join("db.json"))),
            store.clone(),
        )
        .unwrap()
        .with_interval(Duration::from_secs(3600));

        let handle = Supervisor::new(scheduler)
            .with_restart_backoff(Backoff::new(
                Duration::from_millis(1),
                Duration::from_millis(5),
            ))
            .spawn();

        tokio::time::timeout(Duration::from_secs(5), async {
            while store.is_empty() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("restarted scheduler should ingest");

        let restarts = handle.shutdown().await;
        assert_eq!(restarts, 1);
        assert!(store.snapshot().contains("survivor"));
    }
}
