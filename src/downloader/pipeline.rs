//! Per-item pipeline: page lookup followed by media download

use std::path::PathBuf;
use std::sync::Arc;

use super::media::MediaFetch;
use super::page::MediaLocator;
use crate::error::Error;
use crate::types::{DownloadOutcome, WorkItem};
use crate::utils::clip_path;

/// Turns one work item into its final outcome
#[async_trait::async_trait]
pub trait ItemProcessor: Send + Sync {
    /// Process `item`; never fails, every problem becomes an outcome
    async fn process(&self, item: &WorkItem) -> DownloadOutcome;
}

/// Page lookup then media download for a single clip
pub struct ClipPipeline {
    locator: Arc<dyn MediaLocator>,
    media: Arc<dyn MediaFetch>,
    download_dir: PathBuf,
    extension: String,
}

impl ClipPipeline {
    /// Build a pipeline writing `{download_dir}/{game}_{play}.{extension}`
    pub fn new(
        locator: Arc<dyn MediaLocator>,
        media: Arc<dyn MediaFetch>,
        download_dir: PathBuf,
        extension: impl Into<String>,
    ) -> Self {
        Self {
            locator,
            media,
            download_dir,
            extension: extension.into(),
        }
    }
}

#[async_trait::async_trait]
impl ItemProcessor for ClipPipeline {
    async fn process(&self, item: &WorkItem) -> DownloadOutcome {
        let reference = match self.locator.locate(&item.play_id).await {
            Ok(reference) => reference,
            Err(Error::ContentAbsent { .. }) => {
                tracing::info!(game_id = %item.game_id, play_id = %item.play_id, "No video on clip page");
                return DownloadOutcome::NotFound;
            }
            Err(e) => {
                return DownloadOutcome::Failed {
                    reason: format!("page lookup failed: {e}"),
                };
            }
        };

        let destination = clip_path(&self.download_dir, item, &self.extension);
        match self.media.download(&reference, &destination).await {
            Ok(clip) => DownloadOutcome::Success {
                path: clip.path,
                bytes: clip.bytes,
                attempts: clip.attempts,
            },
            Err(e) => DownloadOutcome::Failed {
                reason: format!("download failed: {e}"),
            },
        }
    }
}
