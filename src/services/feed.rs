// src/services/feed.rs

//! Upstream feed client interface.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::FeedBatch;

/// Source of candidate items.
///
/// Implementations are treated as untrusted: calls may fail, hang, or return
/// junk. Callers bound each call with a timeout.
#[async_trait]
pub trait FeedClient: Send + Sync {
    /// Fetch up to `limit` top items from `collection`.
    async fn fetch_top(&self, collection: &str, limit: usize) -> Result<FeedBatch>;
}
