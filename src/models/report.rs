// src/models/report.rs

//! Per-cycle ingestion statistics.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Summary of one ingestion cycle.
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Fetch attempts made, including the successful one
    pub fetch_attempts: u32,
    /// True when every fetch attempt failed and the cycle was skipped
    pub skipped: bool,
    pub fetched: usize,
    pub admitted: usize,
    pub rejected_url: usize,
    pub rejected_adult: usize,
    pub extraction_failures: usize,
    pub inserted: usize,
    pub duplicates: usize,
    pub culled: usize,
    pub store_size: usize,
    pub persisted: bool,
    /// Persistence error message, if the write failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persist_error: Option<String>,
}

impl CycleReport {
    pub fn started() -> Self {
        let now = Utc::now();
        Self {
            start_time: now,
            end_time: now,
            fetch_attempts: 0,
            skipped: false,
            fetched: 0,
            admitted: 0,
            rejected_url: 0,
            rejected_adult: 0,
            extraction_failures: 0,
            inserted: 0,
            duplicates: 0,
            culled: 0,
            store_size: 0,
            persisted: false,
            persist_error: None,
        }
    }

    /// Stamp the end time.
    pub fn finish(mut self) -> Self {
        self.end_time = Utc::now();
        self
    }

    pub fn duration_ms(&self) -> i64 {
        (self.end_time - self.start_time).num_milliseconds()
    }

    /// One-line summary for the log.
    pub fn summary(&self) -> String {
        if self.skipped {
            return format!(
                "cycle skipped after {} failed fetch attempt(s); store holds {} records",
                self.fetch_attempts, self.store_size
            );
        }

        format!(
            "fetched {}, admitted {} (url rejects {}, adult rejects {}), \
             {} new, {} duplicate, {} extraction failures, {} culled, \
             {} records, persisted: {} ({} ms)",
            self.fetched,
            self.admitted,
            self.rejected_url,
            self.rejected_adult,
            self.inserted,
            self.duplicates,
            self.extraction_failures,
            self.culled,
            self.store_size,
            self.persisted,
            self.duration_ms()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skipped_summary() {
        let mut report = CycleReport::started();
        report.skipped = true;
        report.fetch_attempts = 3;
        report.store_size = 12;

        let summary = report.finish().summary();
        assert!(summary.contains("skipped after 3"));
        assert!(summary.contains("12 records"));
    }
}
