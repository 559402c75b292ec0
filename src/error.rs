// src/error.rs

//! Unified error handling for the harvester.

use std::fmt;
use std::path::Path;

use thiserror::Error;

/// Result type alias for harvester operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Media-link pattern failed to compile
    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// Startup configuration unreadable or malformed
    #[error("Failed to load config from {path}: {message}")]
    ConfigLoad { path: String, message: String },

    /// Configuration values failed validation
    #[error("Configuration error: {0}")]
    Config(String),

    /// Persisted store exists but cannot be read or parsed
    #[error("Failed to load store from {path}: {message}")]
    StoreLoad { path: String, message: String },

    /// Upstream feed call failed or timed out
    #[error("Feed fetch failed for {collection}: {message}")]
    FeedFetch { collection: String, message: String },

    /// A single candidate item could not be turned into a record
    #[error("Cannot extract key from {url}: {message}")]
    ItemExtraction { url: String, message: String },

    /// Writing the store file failed
    #[error("Failed to persist store to {path}: {message}")]
    PersistenceWrite { path: String, message: String },
}

impl AppError {
    /// Create a config load error for a path.
    pub fn config_load(path: &Path, message: impl fmt::Display) -> Self {
        Self::ConfigLoad {
            path: path.display().to_string(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a store load error for a path.
    pub fn store_load(path: &Path, message: impl fmt::Display) -> Self {
        Self::StoreLoad {
            path: path.display().to_string(),
            message: message.to_string(),
        }
    }

    /// Create a feed fetch error.
    pub fn feed(collection: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::FeedFetch {
            collection: collection.into(),
            message: message.to_string(),
        }
    }

    /// Create an item extraction error.
    pub fn extraction(url: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::ItemExtraction {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// Create a persistence write error for a path.
    pub fn persistence(path: &Path, message: impl fmt::Display) -> Self {
        Self::PersistenceWrite {
            path: path.display().to_string(),
            message: message.to_string(),
        }
    }

    /// Whether this error should abort startup.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::ConfigLoad { .. } | Self::StoreLoad { .. })
    }
}
