//! Streaming media download with retry
//!
//! Every attempt streams into `<destination>.part` through a buffer of
//! `chunk_size` bytes. The scratch file is renamed onto the destination only once
//! the whole body has been written and flushed, and removed when the attempt
//! fails, so a file at the destination path is always complete.

use std::path::{Path, PathBuf};

use tokio::io::{AsyncWriteExt, BufWriter};

use crate::config::RetryConfig;
use crate::error::{Error, Result};
use crate::retry::with_retry;
use crate::session::Session;
use crate::types::MediaReference;
use crate::utils::part_path;

/// A clip written to disk
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DownloadedClip {
    /// Final file
    pub path: PathBuf,
    /// Bytes written
    pub bytes: u64,
    /// Attempts used (1 = first try)
    pub attempts: u32,
}

/// Writes a media file to a destination path
#[async_trait::async_trait]
pub trait MediaFetch: Send + Sync {
    /// Download `source` to `destination`, retrying transient failures
    async fn download(&self, source: &MediaReference, destination: &Path) -> Result<DownloadedClip>;
}

/// HTTP media downloader over the batch session
#[derive(Clone, Debug)]
pub struct MediaDownloader {
    session: Session,
    retry: RetryConfig,
    chunk_size: usize,
}

impl MediaDownloader {
    /// Create a downloader; `chunk_size` of 0 is raised to 1
    pub fn new(session: Session, retry: RetryConfig, chunk_size: usize) -> Self {
        Self {
            session,
            retry,
            chunk_size: chunk_size.max(1),
        }
    }

    async fn download_once(&self, url: &str, destination: &Path, attempt: u32) -> Result<u64> {
        let part = part_path(destination);
        tracing::debug!(url = %url, attempt, part = %part.display(), "Downloading media");

        let result = match self.stream_to(url, &part).await {
            Ok(bytes) => tokio::fs::rename(&part, destination)
                .await
                .map(|()| bytes)
                .map_err(Error::from),
            Err(e) => Err(e),
        };

        if result.is_err() {
            discard(&part).await;
        }
        result
    }

    async fn stream_to(&self, url: &str, part: &Path) -> Result<u64> {
        let mut response = self.session.client().get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let expected = response.content_length();

        let file = tokio::fs::File::create(part).await?;
        let mut writer = BufWriter::with_capacity(self.chunk_size, file);
        let mut written: u64 = 0;
        while let Some(chunk) = response.chunk().await? {
            writer.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        writer.flush().await?;

        if let Some(expected) = expected
            && expected != written
        {
            return Err(Error::IncompleteBody {
                url: url.to_string(),
                expected,
                received: written,
            });
        }
        Ok(written)
    }
}

#[async_trait::async_trait]
impl MediaFetch for MediaDownloader {
    async fn download(&self, source: &MediaReference, destination: &Path) -> Result<DownloadedClip> {
        let url = source.source_url.as_str();
        let mut attempts = 0;

        let bytes = with_retry(&self.retry, |attempt| {
            attempts = attempt;
            self.download_once(url, destination, attempt)
        })
        .await?;

        Ok(DownloadedClip {
            path: destination.to_path_buf(),
            bytes,
            attempts,
        })
    }
}

async fn discard(part: &Path) {
    if let Err(e) = tokio::fs::remove_file(part).await
        && e.kind() != std::io::ErrorKind::NotFound
    {
        tracing::warn!(part = %part.display(), error = %e, "Failed to remove partial file");
    }
}
