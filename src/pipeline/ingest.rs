// src/pipeline/ingest.rs

//! Ingestion scheduler.
//!
//! One cycle runs fetch → filter → extract → merge → cull → persist and
//! produces a [`CycleReport`]. [`Scheduler::run`] repeats cycles at a fixed
//! interval until a shutdown signal arrives. A cycle that has started always
//! runs to completion, persistence included.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::error::{AppError, Result};
use crate::models::{Config, CycleReport, FeedBatch};
use crate::pipeline::filter::MediaFilter;
use crate::pipeline::retry::RetryPolicy;
use crate::services::FeedClient;
use crate::storage::{RecordStorage, SharedStore};
use crate::utils::normalize_whitespace;
use crate::utils::url::extract_key;

/// Counts produced by one merge + cull step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub inserted: usize,
    pub duplicates: usize,
    pub culled: usize,
}

/// Background harvester that feeds the shared store.
#[derive(Clone)]
pub struct Scheduler {
    feed: Arc<dyn FeedClient>,
    storage: Arc<dyn RecordStorage>,
    store: SharedStore,
    filter: MediaFilter,
    retry: RetryPolicy,
    collection: String,
    batch_size: usize,
    fetch_timeout: Duration,
    interval: Duration,
    max_records: usize,
    retain_fraction: f64,
}

impl Scheduler {
    /// Create a scheduler, rejecting configuration that fails
    /// [`Config::validate`].
    pub fn new(
        config: &Config,
        feed: Arc<dyn FeedClient>,
        storage: Arc<dyn RecordStorage>,
        store: SharedStore,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            feed,
            storage,
            store,
            filter: MediaFilter::from_config(&config.ingest)?,
            retry: RetryPolicy::from_config(&config.ingest),
            collection: config.feed.collection.clone(),
            batch_size: config.feed.batch_size,
            fetch_timeout: config.feed.timeout(),
            interval: config.ingest.interval(),
            max_records: config.store.max_records,
            retain_fraction: config.store.retain_fraction,
        })
    }

    /// Override the pause between cycles.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Override the per-attempt fetch timeout.
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    /// Run cycles until `shutdown` turns true or its sender is dropped.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        log::info!(
            "Scheduler started: r/{} every {}s, {} items per fetch",
            self.collection,
            self.interval.as_secs(),
            self.batch_size
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            let report = self.run_cycle().await;
            log::info!("Ingestion cycle: {}", report.summary());

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        log::info!("Scheduler stopped");
    }

    /// Run one full ingestion cycle.
    pub async fn run_cycle(&self) -> CycleReport {
        let mut report = CycleReport::started();

        let batch = match self.fetch_with_retry(&mut report).await {
            Ok(batch) => batch,
            Err(e) => {
                log::error!("{e}; skipping this cycle");
                report.skipped = true;
                report.store_size = self.store.len();
                return report.finish();
            }
        };
        report.fetched = batch.items.len();

        let outcome = self.filter.admit(&batch);
        report.admitted = outcome.admitted.len();
        report.rejected_url = outcome.rejected_url;
        report.rejected_adult = outcome.rejected_adult;
        if outcome.rejected_adult > 0 {
            log::warn!(
                "r/{} is flagged adult; rejected all {} items",
                batch.collection,
                outcome.rejected_adult
            );
        }

        let mut candidates = Vec::with_capacity(outcome.admitted.len());
        for item in outcome.admitted {
            match extract_key(&item.source_url) {
                Ok(key) => {
                    log::info!("Adding post '{}' from {}", item.title, item.source_url);
                    candidates.push((key, normalize_whitespace(&item.title)));
                }
                Err(e) => {
                    report.extraction_failures += 1;
                    log::warn!("Could not add '{}': {e}", item.title);
                }
            }
        }

        let (stats, snapshot) = self.store.update(|store| {
            let mut stats = MergeStats::default();
            for (key, title) in &candidates {
                if store.add_record(key, title) {
                    stats.inserted += 1;
                } else {
                    stats.duplicates += 1;
                }
            }
            stats.culled = store.cull(self.max_records, self.retain_fraction);
            stats
        });
        report.inserted = stats.inserted;
        report.duplicates = stats.duplicates;
        report.culled = stats.culled;
        report.store_size = snapshot.len();

        if stats.culled > 0 {
            log::warn!(
                "Culled {} oldest records; store exceeded {} entries, {} remain",
                stats.culled,
                self.max_records,
                snapshot.len()
            );
        }

        match self.storage.persist(&snapshot).await {
            Ok(()) => report.persisted = true,
            Err(e) => {
                log::error!("{e}; will retry next cycle");
                report.persist_error = Some(e.to_string());
            }
        }

        report.finish()
    }

    /// Fetch one batch, retrying with backoff.
    async fn fetch_with_retry(&self, report: &mut CycleReport) -> Result<FeedBatch> {
        let mut last_error = String::new();

        for attempt in 1..=self.retry.attempts {
            report.fetch_attempts = attempt;

            match self.fetch_once().await {
                Ok(batch) => return Ok(batch),
                Err(e) => {
                    log::warn!(
                        "Fetch attempt {}/{} for r/{} failed: {}",
                        attempt,
                        self.retry.attempts,
                        self.collection,
                        e
                    );
                    last_error = e.to_string();
                }
            }

            if attempt < self.retry.attempts {
                tokio::time::sleep(self.retry.backoff.delay(attempt)).await;
            }
        }

        Err(AppError::feed(
            &self.collection,
            format!(
                "gave up after {} attempts: {}",
                self.retry.attempts, last_error
            ),
        ))
    }

    async fn fetch_once(&self) -> Result<FeedBatch> {
        let call = self.feed.fetch_top(&self.collection, self.batch_size);
        match tokio::time::timeout(self.fetch_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(AppError::feed(
                &self.collection,
                format!("timed out after {:?}", self.fetch_timeout),
            )),
        }
    }
}
