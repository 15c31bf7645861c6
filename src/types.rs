//! Core types and events for savant-dl

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One downloadable clip: a play inside a game
///
/// Immutable once produced by the resolver and consumed exactly once by the dispatcher.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkItem {
    /// Baseball Savant play identifier (a UUID in practice)
    pub play_id: String,
    /// Game identifier (`game_pk`)
    pub game_id: String,
}

impl WorkItem {
    /// Create a new work item
    pub fn new(game_id: impl Into<String>, play_id: impl Into<String>) -> Self {
        Self {
            play_id: play_id.into(),
            game_id: game_id.into(),
        }
    }
}

impl std::fmt::Display for WorkItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.game_id, self.play_id)
    }
}

/// Direct media URL scraped from a clip page
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MediaReference {
    /// Absolute URL of the video file
    pub source_url: String,
}

/// Final result of processing one [`WorkItem`]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DownloadOutcome {
    /// The clip was written to `path`
    Success {
        /// Destination file
        path: PathBuf,
        /// Number of bytes written
        bytes: u64,
        /// Download attempts used (1 = first try)
        attempts: u32,
    },
    /// The clip page has no playable video
    NotFound,
    /// Retries were exhausted or an unexpected fault occurred
    Failed {
        /// Human-readable reason
        reason: String,
    },
}

impl DownloadOutcome {
    /// Whether the clip ended up on disk
    pub fn is_success(&self) -> bool {
        matches!(self, DownloadOutcome::Success { .. })
    }
}

/// Lifecycle of a dispatcher run
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchState {
    /// No batch has started
    #[default]
    Idle,
    /// Items are being handed to workers
    Dispatching,
    /// Every item has been handed out; waiting for in-flight work
    Draining,
    /// Every item has an outcome
    Done,
}

/// Outcomes of one batch, one per submitted item
#[derive(Clone, Debug, Default)]
pub struct BatchReport {
    entries: Vec<(WorkItem, DownloadOutcome)>,
    rejection: Option<String>,
}

impl BatchReport {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            rejection: None,
        }
    }

    pub(crate) fn reject(&mut self, reason: impl Into<String>) {
        self.rejection = Some(reason.into());
    }

    /// Why the input was rejected before any item was resolved
    ///
    /// Set when a play sheet lacks its identifier columns; such a batch is
    /// empty but distinct from a sheet that simply has no rows.
    pub fn rejection(&self) -> Option<&str> {
        self.rejection.as_deref()
    }

    pub(crate) fn record(&mut self, item: WorkItem, outcome: DownloadOutcome) {
        self.entries.push((item, outcome));
    }

    /// Outcome recorded for `item`, if it was part of the batch
    pub fn get(&self, item: &WorkItem) -> Option<&DownloadOutcome> {
        self.entries
            .iter()
            .find(|(candidate, _)| candidate == item)
            .map(|(_, outcome)| outcome)
    }

    /// All `(item, outcome)` pairs in completion order
    pub fn entries(&self) -> &[(WorkItem, DownloadOutcome)] {
        &self.entries
    }

    /// Number of recorded outcomes
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the batch had no items
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of clips written to disk
    pub fn succeeded(&self) -> usize {
        self.count(|o| matches!(o, DownloadOutcome::Success { .. }))
    }

    /// Number of plays without a video
    pub fn not_found(&self) -> usize {
        self.count(|o| matches!(o, DownloadOutcome::NotFound))
    }

    /// Number of failed items
    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, DownloadOutcome::Failed { .. }))
    }

    fn count(&self, predicate: impl Fn(&DownloadOutcome) -> bool) -> usize {
        self.entries.iter().filter(|(_, o)| predicate(o)).count()
    }
}

/// Event emitted while a batch runs
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Work list resolved
    Resolved {
        /// Number of items about to be dispatched
        items: usize,
    },

    /// Dispatcher changed state
    StateChanged {
        /// New state
        state: BatchState,
    },

    /// Input was rejected, so the batch runs with no items
    InputRejected {
        /// Input source (file path)
        source: String,
        /// Why it was rejected
        reason: String,
    },

    /// A worker picked up an item
    ItemStarted {
        /// The item
        item: WorkItem,
    },

    /// An item reached its final outcome
    ItemFinished {
        /// The item
        item: WorkItem,
        /// Its outcome
        outcome: DownloadOutcome,
    },

    /// Batch finished
    BatchComplete {
        /// Clips written
        succeeded: usize,
        /// Plays without video
        not_found: usize,
        /// Failed items
        failed: usize,
    },
}
