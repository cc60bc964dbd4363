//! # LogWriter: events as tracing records
//!
//! A minimal subscriber that writes every incoming [`Event`] through `tracing`
//! under the `combocube::events` target. Install any `tracing` subscriber
//! (e.g. `tracing_subscriber::fmt`) to see the output.
//!
//! ## Example output (fmt layer)
//! ```text
//!  INFO combocube::events: run started task="Leg day" tasks=Some(6)
//!  INFO combocube::events: task activated task="squats" position=Some(0)
//! DEBUG combocube::events: task progress task="squats" remaining_ms=None remaining_count=Some(9)
//!  INFO combocube::events: task completed task="squats" completed_count=Some(10) elapsed_ms=Some(41200)
//!  WARN combocube::events: transition rejected task="plank" reason="op=increment_count kind=timer state=running"
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let task = e.task.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("-");
        match e.kind {
            EventKind::RunStarted => {
                tracing::info!(target: "combocube::events", task, tasks = ?e.total, "run started");
            }
            EventKind::RunFinished => {
                tracing::info!(target: "combocube::events", tasks = ?e.total, "run finished");
            }
            EventKind::RunStopped => {
                tracing::info!(target: "combocube::events", discarded = ?e.total, reason, "run stopped");
            }
            EventKind::RunRejected => {
                tracing::warn!(target: "combocube::events", task, reason, "run rejected");
            }
            EventKind::TaskActivated => {
                tracing::info!(target: "combocube::events", task, position = ?e.position, "task activated");
            }
            EventKind::TaskPaused
            | EventKind::TaskResumed
            | EventKind::TaskReset
            | EventKind::AwaitingAdvance => {
                tracing::info!(target: "combocube::events", task, kind = e.kind.as_label(), "task state changed");
            }
            EventKind::TaskProgress => {
                tracing::debug!(
                    target: "combocube::events",
                    task,
                    remaining_ms = ?e.remaining_ms,
                    remaining_count = ?e.remaining_count,
                    "task progress"
                );
            }
            EventKind::TaskCompleted => {
                tracing::info!(
                    target: "combocube::events",
                    task,
                    completed_count = ?e.completed_count,
                    elapsed_ms = ?e.elapsed_ms,
                    "task completed"
                );
            }
            EventKind::TransitionRejected => {
                tracing::warn!(target: "combocube::events", task, reason, "transition rejected");
            }
            EventKind::SubscriberOverflow => {
                tracing::warn!(target: "combocube::events", subscriber = task, reason, "subscriber overflow");
            }
            EventKind::SubscriberPanicked => {
                tracing::error!(target: "combocube::events", subscriber = task, reason, "subscriber panicked");
            }
        }
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
