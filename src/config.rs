//! Configuration types for savant-dl

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{path::Path, path::PathBuf, time::Duration};

/// Download behavior configuration (destination, concurrency, chunking)
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Destination directory for clips (default: "./clips")
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,

    /// Maximum number of items processed concurrently (default: 5)
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    /// Size of the write buffer used while streaming media (default: 8192 bytes)
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// File extension given to downloaded clips (default: "mp4")
    #[serde(default = "default_file_extension")]
    pub file_extension: String,

    /// Cap on the number of clips resolved from a date range (None = all)
    #[serde(default)]
    pub max_clips: Option<usize>,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            download_dir: default_download_dir(),
            max_workers: default_max_workers(),
            chunk_size: default_chunk_size(),
            file_extension: default_file_extension(),
            max_clips: None,
        }
    }
}

/// HTTP session settings shared by every request of a batch
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HttpConfig {
    /// User-Agent header sent with every request (default: a desktop browser string)
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Whole-request timeout, including body streaming (default: 60 seconds)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub request_timeout: Duration,

    /// TCP/TLS connect timeout (default: 10 seconds)
    #[serde(default = "default_connect_timeout", with = "duration_serde")]
    pub connect_timeout: Duration,

    /// Keep cookies set by the upstream site across requests (default: true)
    #[serde(default = "default_true")]
    pub cookie_store: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            request_timeout: default_request_timeout(),
            connect_timeout: default_connect_timeout(),
            cookie_store: true,
        }
    }
}

/// Upstream site location
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SavantConfig {
    /// Base URL of Baseball Savant (default: "https://baseballsavant.mlb.com")
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for SavantConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

/// Which team-side play lists are read from per-game metadata
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaySides {
    /// `team_home` only (default)
    #[default]
    Home,
    /// `team_away` only
    Away,
    /// `team_home` followed by `team_away`
    Both,
}

impl PlaySides {
    /// JSON keys to read, in order
    pub fn keys(&self) -> &'static [&'static str] {
        match self {
            PlaySides::Home => &["team_home"],
            PlaySides::Away => &["team_away"],
            PlaySides::Both => &["team_home", "team_away"],
        }
    }
}

/// Date-range resolution filters
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ResolveConfig {
    /// Team abbreviation passed to the Statcast search (None = all teams)
    #[serde(default)]
    pub team: Option<String>,

    /// Exact-match filter on the play's `pitch_call` field (None = keep all)
    #[serde(default)]
    pub pitch_call: Option<String>,

    /// Team-side play lists to read from per-game metadata
    #[serde(default)]
    pub sides: PlaySides,
}

/// Column names required when reading play ids from a sheet
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InputColumns {
    /// Play identifier column (default: "playId")
    #[serde(default = "default_play_id_column")]
    pub play_id: String,

    /// Game identifier column (default: "game_pk")
    #[serde(default = "default_game_id_column")]
    pub game_id: String,
}

impl Default for InputColumns {
    fn default() -> Self {
        Self {
            play_id: default_play_id_column(),
            game_id: default_game_id_column(),
        }
    }
}

/// Retry behavior for transient failures
///
/// `max_attempts` counts every attempt, including the first. The delay before
/// the second attempt is `backoff_delay`; later delays are multiplied by
/// `backoff_multiplier` and capped at `max_delay`. Jitter only lengthens a delay.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts (default: 5)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay between attempts (default: 1 second)
    #[serde(default = "default_backoff_delay", with = "duration_serde")]
    pub backoff_delay: Duration,

    /// Maximum delay between attempts (default: 60 seconds)
    #[serde(default = "default_max_delay", with = "duration_serde")]
    pub max_delay: Duration,

    /// Multiplier applied to the delay after each failure (default: 1.0, fixed delay)
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Add random jitter to delays (default: false)
    #[serde(default)]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_delay: default_backoff_delay(),
            max_delay: default_max_delay(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter: false,
        }
    }
}

/// Main configuration for [`ClipDownloader`](crate::ClipDownloader)
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Destination, concurrency and chunking
    #[serde(default)]
    pub download: DownloadConfig,

    /// Shared session settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Upstream site location
    #[serde(default)]
    pub savant: SavantConfig,

    /// Date-range filters
    #[serde(default)]
    pub resolve: ResolveConfig,

    /// Sheet column names
    #[serde(default)]
    pub input: InputColumns,

    /// Retry policy for clip page lookups
    #[serde(default)]
    pub page_retry: RetryConfig,

    /// Retry policy for media downloads
    #[serde(default)]
    pub download_retry: RetryConfig,
}

impl Config {
    /// Load a configuration from a JSON file; missing fields take their defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| Error::InputUnavailable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let config: Config = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would make a batch impossible to run
    pub fn validate(&self) -> Result<()> {
        if self.download.chunk_size == 0 {
            return Err(Error::config("chunk size must be positive", "chunk_size"));
        }
        if self.download.file_extension.is_empty()
            || self.download.file_extension.contains(['/', '\\', '.'])
        {
            return Err(Error::config(
                format!(
                    "file extension {:?} must be a bare extension",
                    self.download.file_extension
                ),
                "file_extension",
            ));
        }
        if url::Url::parse(&self.savant.base_url).is_err() {
            return Err(Error::config(
                format!("{:?} is not a valid URL", self.savant.base_url),
                "base_url",
            ));
        }
        for (key, retry) in [
            ("page_retry", &self.page_retry),
            ("download_retry", &self.download_retry),
        ] {
            if retry.max_attempts == 0 {
                return Err(Error::config("at least one attempt is required", key));
            }
            if retry.backoff_multiplier.is_nan() || retry.backoff_multiplier < 1.0 {
                return Err(Error::config("backoff multiplier must be at least 1.0", key));
            }
        }
        if self.input.play_id.is_empty() || self.input.game_id.is_empty() {
            return Err(Error::config("column names cannot be empty", "input"));
        }
        Ok(())
    }
}

fn default_download_dir() -> PathBuf {
    PathBuf::from("./clips")
}

fn default_max_workers() -> usize {
    5
}

fn default_chunk_size() -> usize {
    8192
}

fn default_file_extension() -> String {
    "mp4".to_string()
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/124.0.0.0 Safari/537.36"
        .to_string()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(60)
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_true() -> bool {
    true
}

fn default_base_url() -> String {
    "https://baseballsavant.mlb.com".to_string()
}

fn default_play_id_column() -> String {
    "playId".to_string()
}

fn default_game_id_column() -> String {
    "game_pk".to_string()
}

fn default_max_attempts() -> u32 {
    5
}

fn default_backoff_delay() -> Duration {
    Duration::from_secs(1)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(60)
}

fn default_backoff_multiplier() -> f64 {
    1.0
}

// Duration serialization helper (whole seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
