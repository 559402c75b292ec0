//! Candidate admission filter.
//!
//! An item is admitted when its source URL matches one of the media-link
//! patterns AND its collection is not flagged adult. The adult flag belongs
//! to the whole batch, so a flagged batch admits nothing.

use regex::RegexSet;

use crate::error::Result;
use crate::models::{FeedBatch, FeedItem, IngestConfig};

/// Items admitted from one batch, plus rejection counts.
#[derive(Debug, Default)]
pub struct FilterOutcome<'a> {
    pub admitted: Vec<&'a FeedItem>,
    pub rejected_url: usize,
    pub rejected_adult: usize,
}

/// Media-link URL filter.
#[derive(Debug, Clone)]
pub struct MediaFilter {
    patterns: RegexSet,
}

impl MediaFilter {
    /// Compile a filter from regex patterns.
    pub fn new<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Ok(Self {
            patterns: RegexSet::new(patterns)?,
        })
    }

    pub fn from_config(config: &IngestConfig) -> Result<Self> {
        Ok(Self {
            patterns: config.media_pattern_set()?,
        })
    }

    /// Whether `url` looks like a supported media link.
    pub fn matches(&self, url: &str) -> bool {
        self.patterns.is_match(url.trim())
    }

    /// Split a batch into admitted items and rejection counts.
    pub fn admit<'a>(&self, batch: &'a FeedBatch) -> FilterOutcome<'a> {
        if batch.adult {
            return FilterOutcome {
                admitted: Vec::new(),
                rejected_url: 0,
                rejected_adult: batch.items.len(),
            };
        }

        let (admitted, rejected): (Vec<&FeedItem>, Vec<&FeedItem>) = batch
            .items
            .iter()
            .partition(|item| self.matches(&item.source_url));

        for item in &rejected {
            log::debug!("Skipping non-media post '{}' ({})", item.title, item.source_url);
        }

        FilterOutcome {
            admitted,
            rejected_url: rejected.len(),
            rejected_adult: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_filter() -> MediaFilter {
        MediaFilter::from_config(&IngestConfig::default()).unwrap()
    }

    fn batch(adult: bool) -> FeedBatch {
        FeedBatch {
            collection: "InterdimensionalCable".to_string(),
            adult,
            items: vec![
                FeedItem::new("Real Fake Doors", "https://www.youtube.com/watch?v=aaa"),
                FeedItem::new("Discussion thread", "https://www.reddit.com/r/x/comments/1"),
                FeedItem::new("Ball Fondlers", "https://youtu.be/bbb"),
            ],
        }
    }

    #[test]
    fn test_default_patterns() {
        let filter = default_filter();
        assert!(filter.matches("https://youtu.be/abc"));
        assert!(filter.matches("https://www.youtube.com/watch?v=abc"));
        assert!(!filter.matches("http://youtu.be/abc"));
        assert!(!filter.matches("https://vimeo.com/123"));
        assert!(!filter.matches("https://example.com/?u=https://youtu.be/abc"));
    }

    #[test]
    fn test_unflagged_batch_admits_matching_urls() {
        let filter = default_filter();
        let batch = batch(false);
        let outcome = filter.admit(&batch);

        let titles: Vec<&str> = outcome.admitted.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["Real Fake Doors", "Ball Fondlers"]);
        assert_eq!(outcome.rejected_url, 1);
        assert_eq!(outcome.rejected_adult, 0);
    }

    #[test]
    fn test_adult_batch_admits_nothing() {
        let filter = default_filter();
        let batch = batch(true);
        let outcome = filter.admit(&batch);

        assert!(outcome.admitted.is_empty());
        assert_eq!(outcome.rejected_adult, 3);
        assert_eq!(outcome.rejected_url, 0);
    }

    #[test]
    fn test_custom_patterns() {
        let filter = MediaFilter::new([r"^https://vimeo\.com/\d+$"]).unwrap();
        assert!(filter.matches("https://vimeo.com/123"));
        assert!(!filter.matches("https://youtu.be/abc"));
        assert!(MediaFilter::new(["(broken"]).is_err());
    }
}
