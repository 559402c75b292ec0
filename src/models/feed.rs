// src/models/feed.rs

//! Candidate items delivered by a feed client.

use serde::{Deserialize, Serialize};

/// One candidate item from the upstream feed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeedItem {
    /// Post title
    pub title: String,

    /// URL the post links to
    pub source_url: String,
}

impl FeedItem {
    pub fn new(title: impl Into<String>, source_url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            source_url: source_url.into(),
        }
    }
}

/// A batch of candidates fetched from one collection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeedBatch {
    /// Collection the items were fetched from
    pub collection: String,

    /// Collection-level adult-content flag
    pub adult: bool,

    /// Candidate items, in feed order
    pub items: Vec<FeedItem>,
}
