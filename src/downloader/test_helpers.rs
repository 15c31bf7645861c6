//! Shared test helpers for creating ClipDownloader instances and fake components.

use crate::config::{Config, HttpConfig, RetryConfig, SavantConfig};
use crate::downloader::{ClipDownloader, DownloadedClip, MediaFetch, MediaLocator};
use crate::error::{Error, Result};
use crate::session::Session;
use crate::types::MediaReference;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::tempdir;

/// Retry policy with short delays so retry tests stay fast
pub(crate) fn fast_retry(max_attempts: u32) -> RetryConfig {
    RetryConfig {
        max_attempts,
        backoff_delay: Duration::from_millis(10),
        max_delay: Duration::from_millis(50),
        backoff_multiplier: 1.0,
        jitter: false,
    }
}

/// Session pointed at a local mock server
pub(crate) fn test_session(base_url: &str) -> Session {
    Session::new(
        &HttpConfig::default(),
        &SavantConfig {
            base_url: base_url.to_string(),
        },
    )
    .unwrap()
}

/// Helper to create a test ClipDownloader writing into a temp directory.
/// Returns the downloader and the tempdir (which must be kept alive).
pub(crate) fn create_test_downloader(base_url: &str) -> (ClipDownloader, tempfile::TempDir) {
    let temp_dir = tempdir().unwrap();

    let mut config = Config::default();
    config.savant.base_url = base_url.to_string();
    config.download.download_dir = temp_dir.path().join("clips");
    config.download.max_workers = 3;
    config.page_retry = fast_retry(2);
    config.download_retry = fast_retry(3);

    (ClipDownloader::new(config).unwrap(), temp_dir)
}

/// Minimal clip page carrying an MP4 source
pub(crate) fn clip_page(src: &str) -> String {
    format!(
        r#"<html><body>
<div class="video-box">
  <video controls autoplay>
    <source src="{src}" type="video/mp4">
  </video>
</div>
</body></html>"#
    )
}

/// Clip page without any video element
pub(crate) const EMPTY_CLIP_PAGE: &str =
    r#"<html><body><div class="mod"><p>Video not available</p></div></body></html>"#;

/// Locator answering from a fixed table; unknown plays have no video
#[derive(Default)]
pub(crate) struct TableLocator {
    pub(crate) found: HashMap<String, String>,
    pub(crate) calls: AtomicUsize,
}

impl TableLocator {
    pub(crate) fn with(mut self, play_id: &str, url: &str) -> Self {
        self.found.insert(play_id.to_string(), url.to_string());
        self
    }
}

#[async_trait::async_trait]
impl MediaLocator for TableLocator {
    async fn locate(&self, play_id: &str) -> Result<MediaReference> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.found.get(play_id) {
            Some(url) => Ok(MediaReference {
                source_url: url.clone(),
            }),
            None => Err(Error::ContentAbsent {
                play_id: play_id.to_string(),
            }),
        }
    }
}

/// Media fetcher that records calls and writes a fixed body
pub(crate) struct RecordingFetch {
    pub(crate) body: Vec<u8>,
    pub(crate) calls: AtomicUsize,
}

impl RecordingFetch {
    pub(crate) fn new(body: &[u8]) -> Arc<Self> {
        Arc::new(Self {
            body: body.to_vec(),
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait::async_trait]
impl MediaFetch for RecordingFetch {
    async fn download(&self, _source: &MediaReference, destination: &Path) -> Result<DownloadedClip> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::fs::write(destination, &self.body).await?;
        Ok(DownloadedClip {
            path: destination.to_path_buf(),
            bytes: self.body.len() as u64,
            attempts: 1,
        })
    }
}
