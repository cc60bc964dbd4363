//! # ProgressTracker: fold events into a session view.
//!
//! Keeps an in-memory [`Progress`] record of the current run by listening to
//! run and task events. UIs can poll [`ProgressTracker::snapshot`] without
//! talking to the engine at all.
//!
//! ## Behavior
//! - `RunStarted` clears the view and records the queue length.
//! - Task events (`TaskActivated`, `TaskProgress`, `TaskPaused`, ...) replace
//!   the current-task fields.
//! - `TaskCompleted` bumps the completed counter.
//! - `RunFinished` / `RunStopped` clear the current task.
//! - Events whose `seq` is not newer than the last applied one are ignored.
//!
//! ```text
//! on_event(ev):
//!   ├─ ev.seq <= last_seq          → ignore (stale)
//!   ├─ RunStarted                  → reset, running=true, total
//!   ├─ Task{Activated,Progress,..} → current task fields
//!   ├─ TaskCompleted               → completed += 1
//!   ├─ AwaitingAdvance             → awaiting_advance=true
//!   └─ RunFinished | RunStopped    → running=false, current=None
//! ```

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::model::NodeId;
use crate::subscribers::Subscribe;
use crate::tasks::TaskState;

/// Point-in-time view of a session, built from events.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Progress {
    /// True between `RunStarted` and `RunFinished`/`RunStopped`.
    pub running: bool,
    /// Queue length of the current run.
    pub total: u32,
    /// Tasks completed in the current run.
    pub completed: u32,
    /// Title of the active task.
    pub current: Option<Arc<str>>,
    pub node: Option<NodeId>,
    pub state: Option<TaskState>,
    pub position: Option<u32>,
    pub remaining: Option<Duration>,
    pub remaining_count: Option<u32>,
    pub awaiting_advance: bool,
    /// Sequence number of the last applied event.
    pub last_seq: u64,
}

impl Progress {
    /// Share of the queue already completed, in `0.0..=1.0`.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        (f64::from(self.completed) / f64::from(self.total)).min(1.0)
    }

    fn apply(&mut self, ev: &Event) {
        match ev.kind {
            EventKind::RunStarted => {
                *self = Progress {
                    running: true,
                    total: ev.total.unwrap_or(0),
                    ..Progress::default()
                };
            }
            EventKind::TaskActivated
            | EventKind::TaskPaused
            | EventKind::TaskResumed
            | EventKind::TaskProgress
            | EventKind::TaskReset => {
                self.current = ev.task.clone();
                self.node = ev.node;
                self.state = ev.state;
                self.position = ev.position;
                self.remaining = ev.remaining();
                self.remaining_count = ev.remaining_count;
                self.awaiting_advance = false;
            }
            EventKind::TaskCompleted => {
                self.completed = self.completed.saturating_add(1);
                self.state = Some(TaskState::Completed);
                self.remaining = ev.remaining();
                self.remaining_count = ev.remaining_count;
            }
            EventKind::AwaitingAdvance => self.awaiting_advance = true,
            EventKind::RunFinished | EventKind::RunStopped => {
                self.running = false;
                self.awaiting_advance = false;
                self.current = None;
                self.node = None;
                self.state = None;
                self.position = None;
                self.remaining = None;
                self.remaining_count = None;
            }
            _ => {}
        }
    }
}

/// Subscriber that maintains a [`Progress`] view.
pub struct ProgressTracker {
    inner: RwLock<Progress>,
    capacity: usize,
}

impl ProgressTracker {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Progress::default()),
            capacity: 2048,
        }
    }

    /// Configure the queue capacity for this subscriber.
    #[must_use]
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    /// Returns a copy of the current view.
    #[must_use]
    pub fn snapshot(&self) -> Progress {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl Subscribe for ProgressTracker {
    async fn on_event(&self, ev: &Event) {
        let mut view = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if ev.seq <= view.last_seq {
            tracing::debug!(seq = ev.seq, last = view.last_seq, "stale event ignored");
            return;
        }
        view.last_seq = ev.seq;
        view.apply(ev);
    }

    fn name(&self) -> &'static str {
        "progress"
    }

    fn queue_capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Config, Runner};
    use crate::model::Node;

    /// Runs `f` against a runner and replays everything it published into a tracker.
    async fn replay(f: impl FnOnce(&mut Runner)) -> ProgressTracker {
        let mut runner = Runner::new(Config::default());
        let mut rx = runner.subscribe();
        f(&mut runner);

        let tracker = ProgressTracker::new();
        while let Ok(ev) = rx.try_recv() {
            tracker.on_event(&ev).await;
        }
        tracker
    }

    #[tokio::test]
    async fn test_tracks_current_task() {
        let root = Node::combo(
            "session",
            [
                Node::timer("A", Duration::from_secs(1)).shared(),
                Node::repetitions("B", 5).shared(),
            ],
        )
        .shared();

        let tracker = replay(|r| {
            r.run(&root).unwrap();
            r.tick();
            r.increment_count().unwrap();
        })
        .await;

        let view = tracker.snapshot();
        assert!(view.running);
        assert_eq!(view.total, 2);
        assert_eq!(view.completed, 1);
        assert_eq!(view.current.as_deref(), Some("B"));
        assert_eq!(view.state, Some(TaskState::Running));
        assert_eq!(view.remaining_count, Some(4));
        assert_eq!(view.fraction(), 0.5);
    }

    #[tokio::test]
    async fn test_stop_clears_current() {
        let tracker = replay(|r| {
            r.run(&Node::timer("plank", Duration::from_secs(30)).shared())
                .unwrap();
            r.stop();
        })
        .await;

        let view = tracker.snapshot();
        assert!(!view.running);
        assert!(view.current.is_none());
        assert_eq!(view.completed, 1);
    }

    #[tokio::test]
    async fn test_stale_events_are_ignored() {
        let tracker = ProgressTracker::new();
        let old = Event::new(EventKind::RunStarted).with_total(3);
        let new = Event::new(EventKind::RunFinished);

        tracker.on_event(&new).await;
        tracker.on_event(&old).await;

        let view = tracker.snapshot();
        assert!(!view.running);
        assert_eq!(view.total, 0);
        assert_eq!(view.last_seq, new.seq);
    }
}
