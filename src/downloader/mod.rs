//! Core downloader implementation split into focused submodules.
//!
//! The `ClipDownloader` drives one batch at a time through these components:
//! - [`page`] - Clip page lookup (play identifier to media URL)
//! - [`media`] - Streaming media download with partial-file discipline
//! - [`pipeline`] - Per-item composition of lookup and download
//! - [`dispatcher`] - Bounded concurrent dispatch and outcome collection

mod dispatcher;
mod media;
mod page;
mod pipeline;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

pub use dispatcher::CANCELLED_REASON;
pub use media::{DownloadedClip, MediaDownloader, MediaFetch};
pub use page::{MediaLocator, PageFetcher, extract_media_url};
pub use pipeline::{ClipPipeline, ItemProcessor};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::resolver::{DateRange, DateRangeRequest, IdentifierResolver, SavantClient};
use crate::session::Session;
use crate::types::{BatchReport, BatchState, Event, WorkItem};
use dispatcher::{DispatchContext, run_batch};

/// Where a batch writes and how wide it runs
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchOptions {
    /// Destination directory, created before dispatch
    pub download_dir: PathBuf,
    /// Concurrent workers (0 is treated as 1)
    pub workers: usize,
}

impl BatchOptions {
    /// Options taken from the download section of `config`
    pub fn from_config(config: &Config) -> Self {
        Self {
            download_dir: config.download.download_dir.clone(),
            workers: config.download.max_workers,
        }
    }
}

/// Main downloader instance (cloneable - clones share channels and the cancel token)
#[derive(Clone)]
pub struct ClipDownloader {
    /// Configuration (wrapped in Arc for sharing across tasks)
    pub(crate) config: Arc<Config>,
    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: tokio::sync::broadcast::Sender<Event>,
    /// Current batch state
    pub(crate) state_tx: Arc<tokio::sync::watch::Sender<BatchState>>,
    /// Stops dispatch of further items when cancelled
    pub(crate) cancel_token: tokio_util::sync::CancellationToken,
}

impl ClipDownloader {
    /// Create a new ClipDownloader instance
    ///
    /// Validates the configuration and sets up the event and state channels.
    /// No network traffic happens until a batch is started.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        // Subscribers lagging more than 1000 events behind receive `RecvError::Lagged`
        let (event_tx, _rx) = tokio::sync::broadcast::channel(1000);
        let (state_tx, _state_rx) = tokio::sync::watch::channel(BatchState::Idle);

        Ok(Self {
            config: Arc::new(config),
            event_tx,
            state_tx: Arc::new(state_tx),
            cancel_token: tokio_util::sync::CancellationToken::new(),
        })
    }

    /// Subscribe to batch events
    ///
    /// Multiple subscribers are supported. Each subscriber receives all events independently.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use savant_dl::{ClipDownloader, Config};
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), Box<dyn std::error::Error>> {
    ///     let downloader = ClipDownloader::new(Config::default())?;
    ///
    ///     let mut events = downloader.subscribe();
    ///     tokio::spawn(async move {
    ///         while let Ok(event) = events.recv().await {
    ///             tracing::info!(?event, "batch event");
    ///         }
    ///     });
    ///
    ///     Ok(())
    /// }
    /// ```
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Current batch state
    pub fn state(&self) -> BatchState {
        *self.state_tx.borrow()
    }

    /// Watch batch state transitions
    pub fn watch_state(&self) -> tokio::sync::watch::Receiver<BatchState> {
        self.state_tx.subscribe()
    }

    /// Token that stops dispatch of further items when cancelled
    ///
    /// Items already in flight run to completion; items not yet dispatched are
    /// recorded as failed with [`CANCELLED_REASON`].
    ///
    /// Cancellation is permanent for this handle and its clones: every later
    /// batch reports all of its items as cancelled. Create a new
    /// [`ClipDownloader`] to run again after cancelling.
    pub fn cancel_token(&self) -> tokio_util::sync::CancellationToken {
        self.cancel_token.clone()
    }

    /// Get the current configuration
    pub fn get_config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    /// Build a date-range request pre-filled with the configured filters and cap
    ///
    /// # Errors
    /// [`Error::InvalidDate`] when either date is not `YYYY-MM-DD` or `start > end`.
    pub fn date_range_request(&self, start: &str, end: &str) -> Result<DateRangeRequest> {
        let resolve = &self.config.resolve;
        Ok(DateRangeRequest {
            range: DateRange::parse(start, end)?,
            team: resolve.team.clone(),
            pitch_call: resolve.pitch_call.clone(),
            max_clips: self.config.download.max_clips,
        })
    }

    /// Download every clip played in a date range
    ///
    /// Per-item failures are logged and recorded in the report.
    ///
    /// # Errors
    /// Fails when the session cannot be built, the statistics feed is
    /// unavailable, or the destination directory cannot be created.
    pub async fn run_date_range(
        &self,
        request: &DateRangeRequest,
        options: &BatchOptions,
    ) -> Result<BatchReport> {
        let session = self.session()?;
        let items = self.resolver(&session).resolve_date_range(request).await?;
        tracing::info!(
            start = %request.range.start(),
            end = %request.range.end(),
            items = items.len(),
            "Date range resolved"
        );
        self.dispatch(session, items, options).await
    }

    /// Download every clip listed in a CSV play sheet
    ///
    /// A sheet missing the identifier columns is logged, announced with
    /// [`Event::InputRejected`] and yields an empty report whose
    /// [`BatchReport::rejection`] carries the reason. No network traffic happens.
    ///
    /// # Errors
    /// Fails when the file cannot be read or parsed, or the destination
    /// directory cannot be created.
    pub async fn run_from_file(
        &self,
        path: impl AsRef<Path>,
        options: &BatchOptions,
    ) -> Result<BatchReport> {
        let path = path.as_ref();
        let session = self.session()?;
        let (items, rejection) = match self.resolver(&session).resolve_file(path).await {
            Ok(items) => (items, None),
            Err(e @ Error::Schema { .. }) => {
                tracing::error!(path = %path.display(), error = %e, "Play sheet rejected");
                let reason = e.to_string();
                self.emit_event(Event::InputRejected {
                    source: path.display().to_string(),
                    reason: reason.clone(),
                });
                (Vec::new(), Some(reason))
            }
            Err(e) => return Err(e),
        };
        tracing::info!(path = %path.display(), items = items.len(), "Play sheet resolved");

        let mut report = self.dispatch(session, items, options).await?;
        if let Some(reason) = rejection {
            report.reject(reason);
        }
        Ok(report)
    }

    /// Download an already resolved list of work items
    ///
    /// # Errors
    /// Fails when the session cannot be built or the destination directory
    /// cannot be created.
    pub async fn run_items(
        &self,
        items: Vec<WorkItem>,
        options: &BatchOptions,
    ) -> Result<BatchReport> {
        let session = self.session()?;
        self.dispatch(session, items, options).await
    }

    fn session(&self) -> Result<Session> {
        Session::new(&self.config.http, &self.config.savant)
    }

    fn resolver(&self, session: &Session) -> IdentifierResolver {
        let savant = Arc::new(SavantClient::new(session.clone()));
        IdentifierResolver::new(
            savant.clone(),
            savant,
            self.config.resolve.sides,
            self.config.input.clone(),
            self.config.download.max_workers,
        )
    }

    async fn dispatch(
        &self,
        session: Session,
        items: Vec<WorkItem>,
        options: &BatchOptions,
    ) -> Result<BatchReport> {
        tokio::fs::create_dir_all(&options.download_dir)
            .await
            .map_err(|e| {
                Error::Io(std::io::Error::new(
                    e.kind(),
                    format!(
                        "Failed to create download directory '{}': {}",
                        options.download_dir.display(),
                        e
                    ),
                ))
            })?;

        let pipeline = ClipPipeline::new(
            Arc::new(PageFetcher::new(
                session.clone(),
                self.config.page_retry.clone(),
            )),
            Arc::new(MediaDownloader::new(
                session,
                self.config.download_retry.clone(),
                self.config.download.chunk_size,
            )),
            options.download_dir.clone(),
            self.config.download.file_extension.clone(),
        );

        Ok(self
            .run_with(Arc::new(pipeline), items, options.workers)
            .await)
    }

    /// Dispatch `items` through any processor, emitting batch events
    pub(crate) async fn run_with(
        &self,
        processor: Arc<dyn ItemProcessor>,
        items: Vec<WorkItem>,
        workers: usize,
    ) -> BatchReport {
        self.emit_event(Event::Resolved { items: items.len() });
        tracing::info!(
            items = items.len(),
            workers = workers.max(1),
            "Starting batch"
        );

        let ctx = DispatchContext {
            event_tx: &self.event_tx,
            state_tx: self.state_tx.as_ref(),
            cancel_token: &self.cancel_token,
        };
        let report = run_batch(processor, items, workers, &ctx).await;

        tracing::info!(
            succeeded = report.succeeded(),
            not_found = report.not_found(),
            failed = report.failed(),
            "Batch complete"
        );
        self.emit_event(Event::BatchComplete {
            succeeded: report.succeeded(),
            not_found: report.not_found(),
            failed: report.failed(),
        });
        report
    }

    /// Emit an event to all subscribers
    ///
    /// If there are no active subscribers, the event is silently dropped.
    pub(crate) fn emit_event(&self, event: Event) {
        self.event_tx.send(event).ok();
    }
}
