//! Application configuration structures.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use regex::RegexSet;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Environment variable overriding `feed.client_id`.
pub const ENV_CLIENT_ID: &str = "REDDIT_CLIENT_ID";
/// Environment variable overriding `feed.client_secret`.
pub const ENV_CLIENT_SECRET: &str = "REDDIT_CLIENT_SECRET";

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Upstream feed access
    #[serde(default)]
    pub feed: FeedConfig,

    /// Scheduler timing and filtering
    #[serde(default)]
    pub ingest: IngestConfig,

    /// Store file and retention
    #[serde(default)]
    pub store: StoreConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// A missing file yields the defaults. A file that exists but cannot be
    /// read or parsed is a fatal `ConfigLoad` error. Paths ending in `.json`
    /// are read in the legacy `{"reddit": {...}}` credential format.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::warn!("No config at {}. Using defaults.", path.display());
                return Ok(Self::default());
            }
            Err(e) => return Err(AppError::config_load(path, e)),
        };

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        if is_json {
            let legacy: LegacyConfig =
                serde_json::from_str(&content).map_err(|e| AppError::config_load(path, e))?;
            Ok(legacy.into())
        } else {
            toml::from_str(&content).map_err(|e| AppError::config_load(path, e))
        }
    }

    /// Apply credential overrides from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(id) = lookup(ENV_CLIENT_ID).filter(|v| !v.trim().is_empty()) {
            self.feed.client_id = id;
        }
        if let Some(secret) = lookup(ENV_CLIENT_SECRET).filter(|v| !v.trim().is_empty()) {
            self.feed.client_secret = secret;
        }
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.feed.user_agent.trim().is_empty() {
            return Err(AppError::config("feed.user_agent is empty"));
        }
        if self.feed.collection.trim().is_empty() {
            return Err(AppError::config("feed.collection is empty"));
        }
        if self.feed.batch_size == 0 {
            return Err(AppError::config("feed.batch_size must be > 0"));
        }
        if self.feed.timeout_secs == 0 {
            return Err(AppError::config("feed.timeout_secs must be > 0"));
        }
        if self.ingest.interval_secs == 0 {
            return Err(AppError::config("ingest.interval_secs must be > 0"));
        }
        if self.ingest.fetch_attempts == 0 {
            return Err(AppError::config("ingest.fetch_attempts must be > 0"));
        }
        if self.ingest.media_patterns.is_empty() {
            return Err(AppError::config("ingest.media_patterns is empty"));
        }
        self.ingest.media_pattern_set()?;
        if self.store.max_records == 0 {
            return Err(AppError::config("store.max_records must be > 0"));
        }
        let fraction = self.store.retain_fraction;
        if !(fraction > 0.0 && fraction < 1.0) {
            return Err(AppError::config(format!(
                "store.retain_fraction must be in (0, 1), got {fraction}"
            )));
        }
        Ok(())
    }

    /// Check that feed credentials are present.
    pub fn require_credentials(&self) -> Result<()> {
        if self.feed.client_id.trim().is_empty() || self.feed.client_secret.trim().is_empty() {
            return Err(AppError::config(format!(
                "feed credentials missing: set feed.client_id/feed.client_secret or {ENV_CLIENT_ID}/{ENV_CLIENT_SECRET}"
            )));
        }
        Ok(())
    }

    /// Store file path, resolved against `base` when relative.
    pub fn store_path(&self, base: &Path) -> PathBuf {
        if self.store.path.is_absolute() {
            self.store.path.clone()
        } else {
            base.join(&self.store.path)
        }
    }
}

/// Upstream feed client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// OAuth client id
    #[serde(default)]
    pub client_id: String,

    /// OAuth client secret
    #[serde(default)]
    pub client_secret: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Subreddit to harvest
    #[serde(default = "defaults::collection")]
    pub collection: String,

    /// Items requested per cycle
    #[serde(default = "defaults::batch_size")]
    pub batch_size: usize,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// OAuth token endpoint
    #[serde(default = "defaults::auth_url")]
    pub auth_url: String,

    /// Authenticated API base URL
    #[serde(default = "defaults::api_base")]
    pub api_base: String,
}

impl FeedConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            user_agent: defaults::user_agent(),
            collection: defaults::collection(),
            batch_size: defaults::batch_size(),
            timeout_secs: defaults::timeout(),
            auth_url: defaults::auth_url(),
            api_base: defaults::api_base(),
        }
    }
}

/// Scheduler settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Seconds between the end of one cycle and the start of the next
    #[serde(default = "defaults::interval")]
    pub interval_secs: u64,

    /// Fetch attempts per cycle before the cycle is skipped
    #[serde(default = "defaults::fetch_attempts")]
    pub fetch_attempts: u32,

    /// First retry delay in milliseconds; doubles per attempt
    #[serde(default = "defaults::backoff_base")]
    pub backoff_base_ms: u64,

    /// Upper bound for a single retry delay in milliseconds
    #[serde(default = "defaults::backoff_max")]
    pub backoff_max_ms: u64,

    /// Regexes a source URL must match to be admitted
    #[serde(default = "defaults::media_patterns")]
    pub media_patterns: Vec<String>,
}

impl IngestConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Compile the media-link patterns.
    pub fn media_pattern_set(&self) -> Result<RegexSet> {
        Ok(RegexSet::new(&self.media_patterns)?)
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            interval_secs: defaults::interval(),
            fetch_attempts: defaults::fetch_attempts(),
            backoff_base_ms: defaults::backoff_base(),
            backoff_max_ms: defaults::backoff_max(),
            media_patterns: defaults::media_patterns(),
        }
    }
}

/// Store file and retention settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Store file, relative to the storage directory unless absolute
    #[serde(default = "defaults::store_path")]
    pub path: PathBuf,

    /// Size above which a cull runs
    #[serde(default = "defaults::max_records")]
    pub max_records: usize,

    /// Share of entries kept by a cull (newest first)
    #[serde(default = "defaults::retain_fraction")]
    pub retain_fraction: f64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: defaults::store_path(),
            max_records: defaults::max_records(),
            retain_fraction: defaults::retain_fraction(),
        }
    }
}

/// Credential file shape used by earlier deployments.
#[derive(Debug, Deserialize)]
struct LegacyConfig {
    reddit: LegacyCredentials,
}

#[derive(Debug, Deserialize)]
struct LegacyCredentials {
    client_id: String,
    client_secret: String,
}

impl From<LegacyConfig> for Config {
    fn from(legacy: LegacyConfig) -> Self {
        let mut config = Config::default();
        config.feed.client_id = legacy.reddit.client_id;
        config.feed.client_secret = legacy.reddit.client_secret;
        config
    }
}

mod defaults {
    use std::path::PathBuf;

    // Feed defaults
    pub fn user_agent() -> String {
        "cable-harvester/0.1 (a lonely bot)".into()
    }
    pub fn collection() -> String {
        "InterdimensionalCable".into()
    }
    pub fn batch_size() -> usize {
        15
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn auth_url() -> String {
        "https://www.reddit.com/api/v1/access_token".into()
    }
    pub fn api_base() -> String {
        "https://oauth.reddit.com".into()
    }

    // Ingest defaults
    pub fn interval() -> u64 {
        2 * 60 * 60
    }
    pub fn fetch_attempts() -> u32 {
        3
    }
    pub fn backoff_base() -> u64 {
        2_000
    }
    pub fn backoff_max() -> u64 {
        60_000
    }
    pub fn media_patterns() -> Vec<String> {
        vec![
            r"^https://youtu\.be/".into(),
            r"^https://www\.youtube\.com/".into(),
        ]
    }

    // Store defaults
    pub fn store_path() -> PathBuf {
        PathBuf::from("db.json")
    }
    pub fn max_records() -> usize {
        50_000
    }
    pub fn retain_fraction() -> f64 {
        0.5
    }
}
