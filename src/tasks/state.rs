//! # Task state machine vocabulary.
//!
//! ```text
//!            start()/resume()            pause()
//!   Idle ───────────────────► Running ◄──────────► Paused
//!    ▲                          │      resume()      │
//!    │ reset()                  │ stop() / tick→0    │ stop()
//!    │                          ▼ / count→target     ▼
//!    └───────────────────── Completed ◄──────────────┘
//! ```
//!
//! `Completed` is terminal for everything except `reset()`.

use std::fmt;
use std::time::Duration;

use crate::model::NodeKind;

/// Lifecycle state of a [`Task`](crate::Task).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TaskState {
    /// Constructed, never started (or reset).
    #[default]
    Idle,
    /// Accruing ticks / accepting counts.
    Running,
    /// Halted with progress preserved.
    Paused,
    /// Terminal.
    Completed,
}

impl TaskState {
    /// Returns a short stable label (snake_case).
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskState::Idle => "idle",
            TaskState::Running => "running",
            TaskState::Paused => "paused",
            TaskState::Completed => "completed",
        }
    }

    #[inline]
    pub fn is_completed(&self) -> bool {
        matches!(self, TaskState::Completed)
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// Behaviour a leaf node resolves to.
///
/// Combo never becomes a task, and dice is resolved during expansion, so neither
/// appears here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    /// Time-based countdown.
    Timer,
    /// Time-based countdown.
    Countdown,
    /// Completes after a number of count events.
    RepetitionCount,
    /// Completes immediately on start.
    Dummy,
}

impl TaskKind {
    /// Returns a short stable label (snake_case).
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskKind::Timer => "timer",
            TaskKind::Countdown => "countdown",
            TaskKind::RepetitionCount => "repetitions",
            TaskKind::Dummy => "dummy",
        }
    }

    /// True for kinds driven by clock ticks.
    #[inline]
    pub fn is_time_based(&self) -> bool {
        matches!(self, TaskKind::Timer | TaskKind::Countdown)
    }
}

impl From<NodeKind> for TaskKind {
    /// Maps a leaf node kind to its task behaviour.
    ///
    /// Kinds with no runnable behaviour of their own (`Combo`, an unresolved
    /// `Dice`, `None`) fall back to [`TaskKind::Dummy`] so the runner always has
    /// something to step past.
    fn from(kind: NodeKind) -> Self {
        match kind {
            NodeKind::Timer => TaskKind::Timer,
            NodeKind::Countdown => TaskKind::Countdown,
            NodeKind::RepetitionCount => TaskKind::RepetitionCount,
            NodeKind::Combo | NodeKind::Dice | NodeKind::None => TaskKind::Dummy,
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// What is left before a task completes on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Remaining {
    /// Time left on a bounded timer or countdown.
    Time(Duration),
    /// Count events left on a repetition task with a target.
    Count(u32),
    /// The task never completes on its own (zero duration, zero target, dummy).
    Unbounded,
}

impl Remaining {
    /// Returns the time left, if time-bounded.
    #[inline]
    pub fn as_time(&self) -> Option<Duration> {
        match self {
            Remaining::Time(d) => Some(*d),
            _ => None,
        }
    }

    /// Returns the count left, if count-bounded.
    #[inline]
    pub fn as_count(&self) -> Option<u32> {
        match self {
            Remaining::Count(n) => Some(*n),
            _ => None,
        }
    }
}

/// Effect of a task operation that was valid for the task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing changed (e.g. pausing a paused task, ticking an idle one).
    Unchanged,
    /// State or progress changed; the task is not completed.
    Changed,
    /// The task transitioned into `Completed` during this call.
    Completed,
}

impl Outcome {
    #[inline]
    pub fn is_completed(&self) -> bool {
        matches!(self, Outcome::Completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_kind_mapping_falls_back_to_dummy() {
        assert_eq!(TaskKind::from(NodeKind::Timer), TaskKind::Timer);
        assert_eq!(TaskKind::from(NodeKind::Countdown), TaskKind::Countdown);
        assert_eq!(
            TaskKind::from(NodeKind::RepetitionCount),
            TaskKind::RepetitionCount
        );
        assert_eq!(TaskKind::from(NodeKind::None), TaskKind::Dummy);
        assert_eq!(TaskKind::from(NodeKind::Dice), TaskKind::Dummy);
        assert_eq!(TaskKind::from(NodeKind::Combo), TaskKind::Dummy);
    }

    #[test]
    fn test_remaining_accessors() {
        assert_eq!(
            Remaining::Time(Duration::from_secs(3)).as_time(),
            Some(Duration::from_secs(3))
        );
        assert_eq!(Remaining::Count(2).as_count(), Some(2));
        assert_eq!(Remaining::Unbounded.as_time(), None);
        assert_eq!(Remaining::Unbounded.as_count(), None);
    }
}
