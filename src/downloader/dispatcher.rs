//! Bounded concurrent dispatch of work items
//!
//! Each item runs in its own spawned task so that a panic stays inside that
//! task. At most `workers` tasks are in flight; results flow back through the
//! stream to a single collector that builds the [`BatchReport`].

use std::collections::HashMap;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;

use super::pipeline::ItemProcessor;
use crate::error::Error;
use crate::types::{BatchReport, BatchState, DownloadOutcome, Event, WorkItem};

/// Reason recorded for items still queued when the batch is cancelled
pub const CANCELLED_REASON: &str = "cancelled before dispatch";

/// Channels a dispatcher reports through
pub(crate) struct DispatchContext<'a> {
    pub(crate) event_tx: &'a broadcast::Sender<Event>,
    pub(crate) state_tx: &'a watch::Sender<BatchState>,
    pub(crate) cancel_token: &'a CancellationToken,
}

impl DispatchContext<'_> {
    fn set_state(&self, state: BatchState) {
        self.state_tx.send_replace(state);
        self.event_tx.send(Event::StateChanged { state }).ok();
    }
}

/// Run every item through `processor` with at most `workers` in flight
///
/// Returns exactly one outcome per item. Repeated items share a destination, so
/// only the first copy runs and later copies receive its outcome. A `workers`
/// value of 0 is treated as 1.
pub(crate) async fn run_batch(
    processor: Arc<dyn ItemProcessor>,
    items: Vec<WorkItem>,
    workers: usize,
    ctx: &DispatchContext<'_>,
) -> BatchReport {
    let workers = workers.max(1);
    let mut report = BatchReport::with_capacity(items.len());
    let (items, mut repeats) = collapse_repeats(items);
    let total = items.len();

    ctx.set_state(BatchState::Dispatching);
    if total == 0 {
        ctx.set_state(BatchState::Draining);
    }

    let mut results = stream::iter(items.into_iter().enumerate())
        .map(|(index, item)| {
            if index + 1 == total {
                ctx.set_state(BatchState::Draining);
            }
            let processor = Arc::clone(&processor);
            let cancel_token = ctx.cancel_token.clone();
            let event_tx = ctx.event_tx.clone();

            async move {
                if cancel_token.is_cancelled() {
                    let outcome = DownloadOutcome::Failed {
                        reason: CANCELLED_REASON.to_string(),
                    };
                    return (item, outcome);
                }

                event_tx.send(Event::ItemStarted { item: item.clone() }).ok();
                let task_item = item.clone();
                let handle = tokio::spawn(async move { processor.process(&task_item).await });

                let outcome = match handle.await {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        let cause = if e.is_panic() { "worker panicked" } else { "worker cancelled" };
                        let err = Error::TaskPanicked(format!("{cause}: {e}"));
                        tracing::error!(game_id = %item.game_id, play_id = %item.play_id, error = %err, "Item task aborted");
                        DownloadOutcome::Failed {
                            reason: err.to_string(),
                        }
                    }
                };
                (item, outcome)
            }
        })
        .buffer_unordered(workers);

    while let Some((item, outcome)) = results.next().await {
        log_outcome(&item, &outcome);
        ctx.event_tx
            .send(Event::ItemFinished {
                item: item.clone(),
                outcome: outcome.clone(),
            })
            .ok();
        for _ in 0..repeats.remove(&item).unwrap_or(0) {
            report.record(item.clone(), outcome.clone());
        }
        report.record(item, outcome);
    }

    ctx.set_state(BatchState::Done);
    report
}

/// Split off repeated items, counting the extra copies of each
fn collapse_repeats(items: Vec<WorkItem>) -> (Vec<WorkItem>, HashMap<WorkItem, usize>) {
    let mut repeats: HashMap<WorkItem, usize> = HashMap::new();
    let mut unique = Vec::with_capacity(items.len());
    for item in items {
        match repeats.get_mut(&item) {
            Some(extra) => *extra += 1,
            None => {
                repeats.insert(item.clone(), 0);
                unique.push(item);
            }
        }
    }

    let dropped: usize = repeats.values().sum();
    if dropped > 0 {
        tracing::warn!(
            repeated = dropped,
            unique = unique.len(),
            "Repeated work items share the first copy's outcome"
        );
    }
    (unique, repeats)
}

fn log_outcome(item: &WorkItem, outcome: &DownloadOutcome) {
    match outcome {
        DownloadOutcome::Success {
            path,
            bytes,
            attempts,
        } => tracing::info!(
            game_id = %item.game_id,
            play_id = %item.play_id,
            path = %path.display(),
            bytes,
            attempts,
            "Clip downloaded"
        ),
        DownloadOutcome::NotFound => {
            tracing::info!(game_id = %item.game_id, play_id = %item.play_id, "Clip not found")
        }
        DownloadOutcome::Failed { reason } => tracing::error!(
            game_id = %item.game_id,
            play_id = %item.play_id,
            reason = %reason,
            "Clip failed"
        ),
    }
}
