//! # savant-dl
//!
//! Batch downloader for Baseball Savant pitch clips.
//!
//! ## Design Philosophy
//!
//! savant-dl is designed to be:
//! - **Library-first** - No UI, a Rust crate that callers drive from their own binaries
//! - **Sensible defaults** - Works against the public site with zero configuration
//! - **Fault-isolated** - Every play ends with exactly one outcome; one failure never stops the batch
//! - **Event-driven** - Consumers subscribe to events instead of polling
//!
//! A batch resolves its work list either from a date range (Statcast search plus
//! per-game metadata) or from a CSV play sheet, then fans the plays out over a
//! bounded pool of workers. Each worker scrapes the clip page for the MP4 source
//! and streams it to `{download_dir}/{game_id}_{play_id}.mp4`.
//!
//! ## Quick Start
//!
//! ```no_run
//! use savant_dl::{BatchOptions, ClipDownloader, Config};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = Config::default();
//!     config.resolve.pitch_call = Some("called_strike".to_string());
//!
//!     let downloader = ClipDownloader::new(config)?;
//!
//!     // Subscribe to events
//!     let mut events = downloader.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let request = downloader.date_range_request("2023-04-12", "2023-04-12")?;
//!     let options = BatchOptions::from_config(&downloader.get_config());
//!     let report = downloader.run_date_range(&request, &options).await?;
//!     println!("{} clips downloaded", report.succeeded());
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Clip downloader (decomposed into focused submodules)
pub mod downloader;
/// Error types
pub mod error;
/// Work list resolution from date ranges and play sheets
pub mod resolver;
/// Retry logic with backoff
pub mod retry;
/// Shared HTTP session
pub mod session;
/// Core types and events
pub mod types;
/// Utility functions
pub mod utils;

// Re-export commonly used types
pub use config::{Config, PlaySides, RetryConfig};
pub use downloader::{BatchOptions, ClipDownloader};
pub use error::{Error, Result};
pub use resolver::{DateRange, DateRangeRequest};
pub use types::{BatchReport, BatchState, DownloadOutcome, Event, MediaReference, WorkItem};

/// Cancel `token` when a termination signal arrives.
///
/// Spawns a task that waits for a signal and then cancels the token, so a running
/// batch stops dispatching new items while in-flight clips finish.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Example
///
/// ```no_run
/// use savant_dl::{BatchOptions, ClipDownloader, Config, cancel_on_signal};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let downloader = ClipDownloader::new(Config::default())?;
///     cancel_on_signal(downloader.cancel_token());
///
///     let options = BatchOptions::from_config(&downloader.get_config());
///     downloader.run_from_file("plays.csv", &options).await?;
///     Ok(())
/// }
/// ```
pub fn cancel_on_signal(
    token: tokio_util::sync::CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            _ = wait_for_signal() => {
                tracing::info!("Stopping dispatch; in-flight clips will finish");
                token.cancel();
            }
            _ = token.cancelled() => {}
        }
    })
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Signal registration may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), Ok(mut sigint)) => {
            tracing::warn!(error = %e, "Failed to register SIGTERM handler, listening for SIGINT only");
            sigint.recv().await;
            tracing::info!("Received SIGINT signal (Ctrl+C)");
        }
        (Ok(mut sigterm), Err(e)) => {
            tracing::warn!(error = %e, "Failed to register SIGINT handler, listening for SIGTERM only");
            sigterm.recv().await;
            tracing::info!("Received SIGTERM signal");
        }
        (Err(e), Err(_)) => {
            tracing::error!(error = %e, "Could not register any signal handlers, using ctrl_c fallback");
            tokio::signal::ctrl_c().await.ok();
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
