//! Shared HTTP session for one batch run
//!
//! A [`Session`] wraps a single `reqwest::Client` (connection pool, keep-alive and
//! cookie jar). It is built at the start of a batch, handed by reference to the
//! resolver, page fetcher and media downloader, and dropped when the batch ends.

use crate::config::{HttpConfig, SavantConfig};
use crate::error::{Error, Result};
use url::Url;

/// Connection context shared by every request of a batch
#[derive(Clone, Debug)]
pub struct Session {
    client: reqwest::Client,
    base_url: Url,
}

impl Session {
    /// Build a session from HTTP and site settings
    ///
    /// # Errors
    /// Returns a configuration error if the base URL is invalid or the client
    /// cannot be constructed.
    pub fn new(http: &HttpConfig, savant: &SavantConfig) -> Result<Self> {
        let base_url = Url::parse(&savant.base_url).map_err(|e| Error::Config {
            message: format!("invalid base URL {:?}: {}", savant.base_url, e),
            key: Some("base_url".to_string()),
        })?;

        let client = reqwest::Client::builder()
            .user_agent(&http.user_agent)
            .timeout(http.request_timeout)
            .connect_timeout(http.connect_timeout)
            .cookie_store(http.cookie_store)
            .build()
            .map_err(|e| Error::Other(format!("Failed to create HTTP client: {}", e)))?;

        tracing::debug!(base_url = %base_url, "HTTP session created");

        Ok(Self { client, base_url })
    }

    /// The underlying client (cheap to clone, shares the pool)
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// Site root all relative endpoints are joined to
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Join `path` onto the base URL and append query parameters
    ///
    /// # Errors
    /// Returns an error if `path` cannot be joined onto the base URL.
    pub fn endpoint(&self, path: &str, query: &[(&str, &str)]) -> Result<Url> {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|e| Error::Other(format!("cannot build URL for {path}: {e}")))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }
}
