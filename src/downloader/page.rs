//! Clip page lookup: play identifier to direct media URL

use scraper::{Html, Selector};
use url::Url;

use crate::config::RetryConfig;
use crate::error::{Error, Result};
use crate::retry::with_retry;
use crate::session::Session;
use crate::types::MediaReference;

const PAGE_PATH: &str = "/sporty-videos";
const VIDEO_BOX: &str = "div.video-box";
const VIDEO: &str = "video";
const MP4_SOURCE: &str = r#"source[type="video/mp4"]"#;

/// Locates the media file behind a play
///
/// Returns [`Error::ContentAbsent`] when the play has no video; any other error
/// means the lookup itself failed.
#[async_trait::async_trait]
pub trait MediaLocator: Send + Sync {
    /// Resolve the direct media URL for `play_id`
    async fn locate(&self, play_id: &str) -> Result<MediaReference>;
}

/// Scrapes the public clip page of a play
#[derive(Clone, Debug)]
pub struct PageFetcher {
    session: Session,
    retry: RetryConfig,
}

impl PageFetcher {
    /// Create a fetcher over the batch session
    pub fn new(session: Session, retry: RetryConfig) -> Self {
        Self { session, retry }
    }

    /// Canonical page URL of a play
    pub fn page_url(&self, play_id: &str) -> Result<Url> {
        self.session.endpoint(PAGE_PATH, &[("playId", play_id)])
    }

    async fn fetch_once(&self, url: &Url, play_id: &str, attempt: u32) -> Result<MediaReference> {
        tracing::debug!(play_id = %play_id, attempt, url = %url, "Fetching clip page");

        let response = self.session.client().get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let html = response.text().await?;
        extract_media_url(&html, url, play_id)
    }
}

#[async_trait::async_trait]
impl MediaLocator for PageFetcher {
    async fn locate(&self, play_id: &str) -> Result<MediaReference> {
        let url = self.page_url(play_id)?;
        let url = &url;
        with_retry(&self.retry, move |attempt| self.fetch_once(url, play_id, attempt)).await
    }
}

/// Pull the MP4 source out of a clip page
///
/// Looks for `div.video-box`, then a nested `video`, then a
/// `source[type="video/mp4"]` with a non-empty `src`. Relative sources are
/// resolved against `page_url`.
///
/// # Errors
/// [`Error::ContentAbsent`] when no such element exists.
pub fn extract_media_url(html: &str, page_url: &Url, play_id: &str) -> Result<MediaReference> {
    let video_box = selector(VIDEO_BOX)?;
    let video = selector(VIDEO)?;
    let source = selector(MP4_SOURCE)?;

    let document = Html::parse_document(html);
    let src = document
        .select(&video_box)
        .flat_map(|b| b.select(&video))
        .flat_map(|v| v.select(&source))
        .filter_map(|s| s.value().attr("src"))
        .map(str::trim)
        .find(|src| !src.is_empty())
        .ok_or_else(|| Error::ContentAbsent {
            play_id: play_id.to_string(),
        })?;

    let absolute = page_url
        .join(src)
        .map_err(|e| Error::Other(format!("invalid media URL {src:?}: {e}")))?;

    Ok(MediaReference {
        source_url: absolute.to_string(),
    })
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| Error::Selector(format!("{css}: {e:?}")))
}
