// src/models/record.rs

//! Stored record data structures.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A single tracked item, as handed to readers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Record {
    /// Canonical item key (e.g. a video id)
    pub key: String,

    /// Display title captured at first insertion
    pub title: String,

    /// First insertion time
    pub added_at: DateTime<Utc>,
}

/// Value stored under each key in the store file.
///
/// The on-disk shape is `{"title": "...", "added": "<ISO-8601>"}`. Files
/// written by older deployments used `name` instead of `title` and naive
/// `YYYY-MM-DD HH:MM:SS.ffffff` timestamps; both are accepted on load.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredEntry {
    #[serde(alias = "name")]
    pub title: String,

    #[serde(deserialize_with = "deserialize_timestamp")]
    pub added: DateTime<Utc>,
}

impl StoredEntry {
    pub fn new(title: impl Into<String>, added: DateTime<Utc>) -> Self {
        Self {
            title: title.into(),
            added,
        }
    }

    /// Pair this entry with its key.
    pub fn to_record(&self, key: &str) -> Record {
        Record {
            key: key.to_string(),
            title: self.title.clone(),
            added_at: self.added,
        }
    }
}

/// Parse an RFC 3339 timestamp, falling back to naive UTC forms.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }

    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{raw}'")))
}
