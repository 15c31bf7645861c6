//! Identifier resolution: turns a date range or a play sheet into work items
//!
//! Split into focused submodules:
//! - [`savant`] - HTTP implementations of the statistics and per-game feeds
//! - [`tabular`] - CSV column extraction shared by sheets and the Statcast export
//!
//! Date-range mode asks a [`StatsFeed`] for the games played in the range, then
//! asks a [`GameFeed`] for each game's play list. A game whose metadata cannot be
//! fetched or parsed contributes nothing; a feed failure aborts resolution.

mod savant;
mod tabular;


pub use savant::SavantClient;
pub use tabular::read_columns;

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use chrono::NaiveDate;
use futures::stream::{self, StreamExt};
use serde_json::Value;

use crate::config::{InputColumns, PlaySides};
use crate::error::{Error, Result};
use crate::types::WorkItem;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Inclusive range of calendar days
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Create a range; `start` must not be after `end`
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(Error::InvalidDate(format!(
                "start {start} is after end {end}"
            )));
        }
        Ok(Self { start, end })
    }

    /// Parse `YYYY-MM-DD` bounds
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        let parse = |raw: &str| {
            NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
                .map_err(|e| Error::InvalidDate(format!("{raw:?}: {e}")))
        };
        Self::new(parse(start)?, parse(end)?)
    }

    /// First day
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// Last day
    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Every day in the range, in order
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + use<> {
        let end = self.end;
        self.start.iter_days().take_while(move |day| *day <= end)
    }
}

/// Filters and cap for a date-range batch
#[derive(Clone, Debug)]
pub struct DateRangeRequest {
    /// Days to cover
    pub range: DateRange,
    /// Team abbreviation passed to the statistics feed
    pub team: Option<String>,
    /// Exact-match filter on each play's `pitch_call`
    pub pitch_call: Option<String>,
    /// Keep only the first N resolved items
    pub max_clips: Option<usize>,
}

impl DateRangeRequest {
    /// Request covering `range` with no filters
    pub fn new(range: DateRange) -> Self {
        Self {
            range,
            team: None,
            pitch_call: None,
            max_clips: None,
        }
    }
}

/// Source of the games played in a date range
#[async_trait::async_trait]
pub trait StatsFeed: Send + Sync {
    /// Game identifiers of every row in the range, in feed order (may repeat)
    async fn game_ids(&self, range: &DateRange, team: Option<&str>) -> Result<Vec<String>>;
}

/// Source of per-game play metadata
#[async_trait::async_trait]
pub trait GameFeed: Send + Sync {
    /// Raw metadata document for one game
    async fn game_data(&self, game_id: &str) -> Result<Value>;
}

/// One play row taken from a game's metadata
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlayRow {
    /// Play identifier
    pub play_id: String,
    /// Pitch result classification, when present
    pub pitch_call: Option<String>,
}

/// Extract play rows from a per-game metadata document
///
/// Reads the lists named by `sides` in order. Anything that is not an object with
/// a non-empty string `play_id` is ignored.
pub fn plays_from_game_data(doc: &Value, sides: PlaySides) -> Vec<PlayRow> {
    sides
        .keys()
        .iter()
        .filter_map(|key| doc.get(*key).and_then(Value::as_array))
        .flatten()
        .filter_map(|row| {
            let play_id = row.get("play_id")?.as_str()?.trim();
            if play_id.is_empty() {
                return None;
            }
            Some(PlayRow {
                play_id: play_id.to_string(),
                pitch_call: row
                    .get("pitch_call")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            })
        })
        .collect()
}

/// Turns date ranges or play sheets into ordered, duplicate-free work lists
pub struct IdentifierResolver {
    stats: Arc<dyn StatsFeed>,
    games: Arc<dyn GameFeed>,
    sides: PlaySides,
    columns: InputColumns,
    metadata_concurrency: usize,
}

impl IdentifierResolver {
    /// Create a resolver over the given feeds
    pub fn new(
        stats: Arc<dyn StatsFeed>,
        games: Arc<dyn GameFeed>,
        sides: PlaySides,
        columns: InputColumns,
        metadata_concurrency: usize,
    ) -> Self {
        Self {
            stats,
            games,
            sides,
            columns,
            metadata_concurrency: metadata_concurrency.max(1),
        }
    }

    /// Resolve a date range into work items
    ///
    /// Games keep the order in which the statistics feed first mentions them;
    /// plays keep the upstream order within a game.
    ///
    /// # Errors
    /// Fails only when the statistics feed fails. Per-game problems are logged
    /// and skipped.
    pub async fn resolve_date_range(&self, request: &DateRangeRequest) -> Result<Vec<WorkItem>> {
        let game_ids = distinct(
            self.stats
                .game_ids(&request.range, request.team.as_deref())
                .await?,
        );
        tracing::info!(
            start = %request.range.start(),
            end = %request.range.end(),
            games = game_ids.len(),
            "Resolved games for date range"
        );

        let per_game: Vec<Vec<WorkItem>> = stream::iter(game_ids)
            .map(|game_id| async move {
                match self.games.game_data(&game_id).await {
                    Ok(doc) => plays_from_game_data(&doc, self.sides)
                        .into_iter()
                        .filter(|row| match &request.pitch_call {
                            Some(wanted) => row.pitch_call.as_deref() == Some(wanted.as_str()),
                            None => true,
                        })
                        .map(|row| WorkItem::new(game_id.clone(), row.play_id))
                        .collect::<Vec<_>>(),
                    Err(e) => {
                        tracing::warn!(game_id = %game_id, error = %e, "Skipping game with unusable metadata");
                        Vec::new()
                    }
                }
            })
            .buffered(self.metadata_concurrency)
            .collect()
            .await;

        let mut items = dedupe(per_game.into_iter().flatten());
        if let Some(max) = request.max_clips {
            items.truncate(max);
        }
        Ok(items)
    }

    /// Resolve a play sheet into work items
    ///
    /// # Errors
    /// Returns [`Error::Schema`] when a required column is missing and
    /// [`Error::InputUnavailable`] or [`Error::Csv`] when the file cannot be read.
    pub async fn resolve_file(&self, path: &Path) -> Result<Vec<WorkItem>> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| Error::InputUnavailable {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        let source_name = path.display().to_string();
        let rows = read_columns(
            bytes.as_slice(),
            &[self.columns.play_id.as_str(), self.columns.game_id.as_str()],
            &source_name,
        )?;

        let items = rows.into_iter().enumerate().filter_map(|(line, mut cells)| {
            let game_id = cells.pop().unwrap_or_default();
            let play_id = cells.pop().unwrap_or_default();
            if play_id.is_empty() || game_id.is_empty() {
                tracing::warn!(source = %source_name, row = line + 1, "Skipping row with blank identifier");
                return None;
            }
            Some(WorkItem::new(game_id, play_id))
        });

        Ok(dedupe(items))
    }
}

fn distinct(ids: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    ids.into_iter()
        .filter(|id| seen.insert(id.clone()))
        .collect()
}

fn dedupe(items: impl IntoIterator<Item = WorkItem>) -> Vec<WorkItem> {
    let mut seen = HashSet::new();
    let mut dropped = 0usize;
    let unique: Vec<WorkItem> = items
        .into_iter()
        .filter(|item| {
            let fresh = seen.insert(item.clone());
            if !fresh {
                dropped += 1;
            }
            fresh
        })
        .collect();

    if dropped > 0 {
        tracing::debug!(dropped, kept = unique.len(), "Dropped repeated work items");
    }
    unique
}
