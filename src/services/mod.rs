//! Service layer for the harvester.
//!
//! This module contains:
//! - The upstream feed interface (`FeedClient`) and its Reddit implementation
//! - The random record reader (`RandomReader`)

mod feed;
mod reader;
mod reddit;

pub use feed::FeedClient;
pub use reader::{RandomReader, ReadOutcome};
pub use reddit::RedditClient;
