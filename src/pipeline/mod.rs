//! Pipeline entry points for harvester operations.
//!
//! - `run_once`: one fetch → filter → merge → cull → persist cycle
//! - `start_service`: spawn the supervised scheduler and get a live handle
//! - `run_service`: the supervised scheduler loop with graceful shutdown

pub mod filter;
pub mod harvest;
pub mod ingest;
pub mod retry;
pub mod supervisor;

pub use filter::{FilterOutcome, MediaFilter};
pub use harvest::{ServiceHandle, open_store, run_once, run_service, start_service};
pub use ingest::{MergeStats, Scheduler};
pub use retry::{Backoff, RetryPolicy};
pub use supervisor::{Supervisor, SupervisorHandle};
