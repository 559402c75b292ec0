//! Utility functions and helpers.

pub mod http;
pub mod url;

/// Collapse runs of whitespace and trim.
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
