// src/models/mod.rs

//! Domain models for the harvester.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod feed;
mod record;
mod report;

// Re-export all public types
pub use config::{Config, ENV_CLIENT_ID, ENV_CLIENT_SECRET, FeedConfig, IngestConfig, StoreConfig};
pub use feed::{FeedBatch, FeedItem};
pub use record::{Record, StoredEntry, parse_timestamp};
pub use report::CycleReport;
