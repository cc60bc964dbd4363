//! # Events emitted by the runner and the engine.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **Run events**: a queue was started, finished, stopped or rejected
//! - **Task events**: the active task was activated, paused, resumed, ticked,
//!   counted, reset or completed
//! - **Diagnostics**: rejected transitions
//! - **Subscriber events**: overflow and panics inside subscriber workers
//!
//! The [`Event`] struct carries additional metadata such as the task title,
//! node id, queue position and progress.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use combocube::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::TransitionRejected)
//!     .with_task("squats")
//!     .with_reason("op=tick kind=repetitions state=running");
//!
//! assert_eq!(ev.kind, EventKind::TransitionRejected);
//! assert_eq!(ev.task.as_deref(), Some("squats"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

use crate::model::NodeId;
use crate::tasks::{Remaining, TaskSnapshot, TaskState};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(1);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    // === Run events ===
    /// A node tree was expanded and its queue started.
    ///
    /// Sets:
    /// - `task`: root node title
    /// - `node`: root node id
    /// - `total`: number of queued tasks
    RunStarted,

    /// The queue drained normally; nothing is running.
    ///
    /// Sets:
    /// - `total`: number of tasks in the finished run
    RunFinished,

    /// The run was stopped before the queue drained.
    ///
    /// Sets:
    /// - `total`: number of queued tasks that never ran
    /// - `reason`: `"stopped"`, `"replaced"` or `"shutdown"`
    RunStopped,

    /// Expansion of a node tree failed; the previous run (if any) is untouched.
    ///
    /// Sets:
    /// - `task`: root node title
    /// - `node`: root node id
    /// - `reason`: error message
    RunRejected,

    // === Task events ===
    /// A task became the active task.
    ///
    /// Published just before the task starts, so `state` is `Idle`.
    ///
    /// Sets: task fields (see [`Event::with_snapshot`]), `total`
    TaskActivated,

    /// The active task was paused.
    TaskPaused,

    /// The active task was resumed.
    TaskResumed,

    /// A tick or count event changed the active task's progress.
    TaskProgress,

    /// The active task was reset to idle.
    TaskReset,

    /// A task transitioned into `Completed` (published by its finish hook).
    TaskCompleted,

    /// A completed task belongs to a combo without auto-advance; the runner
    /// waits for `next()`.
    AwaitingAdvance,

    // === Diagnostics ===
    /// An operation did not apply to the active task and was ignored.
    ///
    /// Sets:
    /// - task fields when a task was targeted
    /// - `reason`: rejection details
    TransitionRejected,

    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `task`: subscriber name
    /// - `reason`: panic info/message
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `task`: subscriber name
    /// - `reason`: reason string (e.g., "full", "closed")
    SubscriberOverflow,
}

impl EventKind {
    /// Returns a short stable label (kebab-case) for logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            EventKind::RunStarted => "run-started",
            EventKind::RunFinished => "run-finished",
            EventKind::RunStopped => "run-stopped",
            EventKind::RunRejected => "run-rejected",
            EventKind::TaskActivated => "task-activated",
            EventKind::TaskPaused => "task-paused",
            EventKind::TaskResumed => "task-resumed",
            EventKind::TaskProgress => "task-progress",
            EventKind::TaskReset => "task-reset",
            EventKind::TaskCompleted => "task-completed",
            EventKind::AwaitingAdvance => "awaiting-advance",
            EventKind::TransitionRejected => "transition-rejected",
            EventKind::SubscriberPanicked => "subscriber-panicked",
            EventKind::SubscriberOverflow => "subscriber-overflow",
        }
    }
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Debug, Clone)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Task title (or subscriber name for subscriber events).
    pub task: Option<Arc<str>>,
    /// Node the task wraps.
    pub node: Option<NodeId>,
    /// Task state after the transition.
    pub state: Option<TaskState>,
    /// Queue position of the task.
    pub position: Option<u32>,
    /// Queue size (meaning depends on the kind).
    pub total: Option<u32>,
    /// Remaining time in milliseconds (bounded time tasks).
    pub remaining_ms: Option<u64>,
    /// Remaining count events (bounded repetition tasks).
    pub remaining_count: Option<u32>,
    /// Count events received so far.
    pub completed_count: Option<u32>,
    /// Running time accrued in milliseconds.
    pub elapsed_ms: Option<u64>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            task: None,
            node: None,
            state: None,
            position: None,
            total: None,
            remaining_ms: None,
            remaining_count: None,
            completed_count: None,
            elapsed_ms: None,
            reason: None,
        }
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a task title.
    #[inline]
    pub fn with_task(mut self, task: impl Into<Arc<str>>) -> Self {
        self.task = Some(task.into());
        self
    }

    /// Attaches a node id.
    #[inline]
    pub fn with_node(mut self, node: NodeId) -> Self {
        self.node = Some(node);
        self
    }

    /// Attaches a queue size.
    #[inline]
    pub fn with_total(mut self, total: usize) -> Self {
        self.total = Some(saturating_u32(total));
        self
    }

    /// Attaches every observable field of a task.
    pub fn with_snapshot(mut self, snap: &TaskSnapshot) -> Self {
        self.task = Some(Arc::clone(&snap.title));
        self.node = Some(snap.id);
        self.state = Some(snap.state);
        self.position = Some(saturating_u32(snap.position));
        self.completed_count = Some(snap.completed_count);
        self.elapsed_ms = Some(millis(snap.elapsed));
        match snap.remaining {
            Remaining::Time(left) => self.remaining_ms = Some(millis(left)),
            Remaining::Count(left) => self.remaining_count = Some(left),
            Remaining::Unbounded => {}
        }
        self
    }

    /// Remaining time as a `Duration`, if set.
    #[inline]
    pub fn remaining(&self) -> Option<Duration> {
        self.remaining_ms.map(Duration::from_millis)
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_task(subscriber)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_task(subscriber)
            .with_reason(info)
    }

    #[inline]
    pub fn is_subscriber_overflow(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberOverflow)
    }

    #[inline]
    pub fn is_subscriber_panic(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberPanicked)
    }
}

fn millis(d: Duration) -> u64 {
    d.as_millis().min(u128::from(u64::MAX)) as u64
}

fn saturating_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Node;
    use crate::tasks::Task;

    #[test]
    fn test_sequence_is_monotonic() {
        let a = Event::new(EventKind::RunStarted);
        let b = Event::new(EventKind::RunFinished);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn test_snapshot_fields() {
        let mut task = Task::from_node(Node::timer("plank", Duration::from_secs(30)).shared());
        task.start().unwrap();
        task.tick(Duration::from_secs(1)).unwrap();

        let ev = Event::new(EventKind::TaskProgress).with_snapshot(&task.snapshot());
        assert_eq!(ev.task.as_deref(), Some("plank"));
        assert_eq!(ev.state, Some(TaskState::Running));
        assert_eq!(ev.remaining(), Some(Duration::from_secs(29)));
        assert_eq!(ev.remaining_count, None);
        assert_eq!(ev.elapsed_ms, Some(1000));
    }

    #[test]
    fn test_subscriber_helpers() {
        let ev = Event::subscriber_overflow("metrics", "full");
        assert!(ev.is_subscriber_overflow());
        assert_eq!(ev.reason.as_deref(), Some("subscriber=metrics reason=full"));
        assert!(Event::subscriber_panicked("audit", "boom".into()).is_subscriber_panic());
    }
}
