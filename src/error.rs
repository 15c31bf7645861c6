//! Error types for savant-dl
//!
//! This module provides the error taxonomy for the library:
//! - Transport failures (network, HTTP status, truncated bodies, I/O)
//! - Content absence (the clip page carries no playable video)
//! - Input schema problems (tabular files missing identifier columns)
//! - Configuration and batch-level failures
//!
//! Whether an error is worth retrying is decided by [`crate::retry::IsRetryable`].

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for savant-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for savant-dl
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "max_workers")
        key: Option<String>,
    },

    /// Network error raised by the HTTP client
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Upstream answered with a non-success status
    #[error("HTTP {status} from {url}")]
    HttpStatus {
        /// The requested URL
        url: String,
        /// The status code returned
        status: u16,
    },

    /// Response body ended before the advertised length was received
    #[error("incomplete body from {url}: expected {expected} bytes, received {received}")]
    IncompleteBody {
        /// The requested URL
        url: String,
        /// Advertised Content-Length
        expected: u64,
        /// Bytes actually written
        received: u64,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Tabular input could not be read or parsed
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON (de)serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Required identifier columns are missing from a tabular source
    #[error("schema error in {source_name}: missing column(s) {}", .missing.join(", "))]
    Schema {
        /// Where the table came from (file path or feed URL)
        source_name: String,
        /// Column names that were required but absent
        missing: Vec<String>,
    },

    /// The clip page has no video markup for this play
    #[error("no video found for play {play_id}")]
    ContentAbsent {
        /// The play identifier that was looked up
        play_id: String,
    },

    /// A CSS selector failed to parse
    #[error("invalid selector: {0}")]
    Selector(String),

    /// A date could not be parsed or the range is inverted
    #[error("invalid date: {0}")]
    InvalidDate(String),

    /// A per-item task panicked or was aborted
    #[error("task failed: {0}")]
    TaskPanicked(String),

    /// Input file could not be opened
    #[error("cannot open input {path}: {reason}")]
    InputUnavailable {
        /// The path that was requested
        path: PathBuf,
        /// The underlying reason
        reason: String,
    },

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Shorthand for a configuration error tied to a key
    pub(crate) fn config(message: impl Into<String>, key: &str) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.to_string()),
        }
    }
}
