// src/utils/url.rs

//! URL manipulation utilities.

use crate::error::{AppError, Result};

/// Extract a canonical item key from a media URL.
///
/// Uses the `v` query parameter when present (`/watch?v=ID&t=1`), otherwise
/// the last non-empty path segment (`youtu.be/ID?t=1`, `/shorts/ID`). Other
/// query parameters are ignored. Keys are limited to `[A-Za-z0-9_-]`.
///
/// # Examples
/// ```
/// use cable_harvester::utils::url::extract_key;
///
/// assert_eq!(
///     extract_key("https://www.youtube.com/watch?v=abc123&t=42").unwrap(),
///     "abc123"
/// );
/// assert_eq!(extract_key("https://youtu.be/xyz789?si=share").unwrap(), "xyz789");
/// ```
pub fn extract_key(source_url: &str) -> Result<String> {
    let parsed = url::Url::parse(source_url.trim())
        .map_err(|e| AppError::extraction(source_url, e))?;

    let from_query = parsed
        .query_pairs()
        .find(|(name, _)| name == "v")
        .map(|(_, value)| value.into_owned());

    let key = match from_query {
        Some(value) => value,
        None => parsed
            .path_segments()
            .and_then(|mut segments| segments.rfind(|s| !s.is_empty()))
            .map(str::to_string)
            .unwrap_or_default(),
    };

    if key.is_empty() {
        return Err(AppError::extraction(source_url, "no key in URL"));
    }
    if !key
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(AppError::extraction(
            source_url,
            format!("unexpected characters in key '{key}'"),
        ));
    }
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watch_url() {
        assert_eq!(
            extract_key("https://www.youtube.com/watch?v=dQw4w9WgXcQ").unwrap(),
            "dQw4w9WgXcQ"
        );
    }

    #[test]
    fn test_watch_url_strips_extra_params() {
        assert_eq!(
            extract_key("https://www.youtube.com/watch?feature=share&v=a-b_c&t=10s").unwrap(),
            "a-b_c"
        );
    }

    #[test]
    fn test_short_link() {
        assert_eq!(extract_key("https://youtu.be/xyz789?t=5").unwrap(), "xyz789");
    }

    #[test]
    fn test_trailing_segment() {
        assert_eq!(
            extract_key("https://www.youtube.com/shorts/Sh0rt1d/").unwrap(),
            "Sh0rt1d"
        );
        assert_eq!(
            extract_key("https://www.youtube.com/embed/Emb3d").unwrap(),
            "Emb3d"
        );
    }

    #[test]
    fn test_empty_key_fails() {
        let err = extract_key("https://www.youtube.com/").unwrap_err();
        assert!(matches!(err, AppError::ItemExtraction { .. }));
        assert!(extract_key("https://www.youtube.com/watch?v=").is_err());
    }

    #[test]
    fn test_unparsable_url_fails() {
        assert!(matches!(
            extract_key("not a url").unwrap_err(),
            AppError::ItemExtraction { .. }
        ));
    }

    #[test]
    fn test_odd_characters_fail() {
        assert!(extract_key("https://youtu.be/abc%20def").is_err());
    }
}
