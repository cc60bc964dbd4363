//! # Runtime wrapper around one leaf node.
//!
//! A [`Task`] owns the mutable side of a leaf: state, time or count left, elapsed
//! running time and the finish hook. It is built by the expander and owned by the
//! [`Runner`](crate::Runner) for the duration of one run.
//!
//! Every operation except [`stop`](Task::stop), which always applies, returns
//! `Result<Outcome, InvalidTransition>`:
//! - `Ok(Outcome::Unchanged)` for idempotent repeats (pause twice, resume twice);
//! - `Ok(Outcome::Completed)` exactly once, on the transition into `Completed`;
//! - `Err(InvalidTransition)` when the operation does not apply to the kind/state.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use combocube::{Node, Outcome, Task, TaskState};
//!
//! let mut task = Task::from_node(Node::timer("plank", Duration::from_secs(2)).shared());
//! task.start().unwrap();
//! assert_eq!(task.tick(Duration::from_secs(1)), Ok(Outcome::Changed));
//! assert_eq!(task.tick(Duration::from_secs(1)), Ok(Outcome::Completed));
//! assert_eq!(task.state(), TaskState::Completed);
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::error::InvalidTransition;
use crate::model::{Node, NodeId};
use crate::tasks::state::{Outcome, Remaining, TaskKind, TaskState};

/// Callback invoked once, when a task transitions into `Completed`.
pub type FinishHook = Box<dyn FnOnce(&TaskSnapshot) + Send + 'static>;

/// Stateful execution of a single leaf node.
pub struct Task {
    node: Arc<Node>,
    kind: TaskKind,
    state: TaskState,
    remaining: Remaining,
    elapsed: Duration,
    completed_count: u32,
    auto_advance: bool,
    position: usize,
    on_finish: Option<FinishHook>,
}

impl Task {
    /// Creates an idle task running `node` with the given behaviour.
    pub fn new(node: Arc<Node>, kind: TaskKind) -> Self {
        let remaining = initial_remaining(&node, kind);
        Self {
            node,
            kind,
            state: TaskState::Idle,
            remaining,
            elapsed: Duration::ZERO,
            completed_count: 0,
            auto_advance: true,
            position: 0,
            on_finish: None,
        }
    }

    /// Creates a task whose behaviour follows `node.kind` directly.
    ///
    /// Dice is not resolved here (use the expander for that); like combo and
    /// none it falls back to [`TaskKind::Dummy`].
    pub fn from_node(node: Arc<Node>) -> Self {
        let kind = TaskKind::from(node.kind);
        Self::new(node, kind)
    }

    /// Returns the task with a finish hook registered.
    pub fn with_on_finish(mut self, hook: FinishHook) -> Self {
        self.on_finish = Some(hook);
        self
    }

    /// Registers the finish hook, replacing any previous one.
    pub fn set_on_finish(&mut self, hook: FinishHook) {
        self.on_finish = Some(hook);
    }

    pub(crate) fn set_auto_advance(&mut self, enabled: bool) {
        self.auto_advance = enabled;
    }

    pub(crate) fn set_position(&mut self, position: usize) {
        self.position = position;
    }

    /// Wrapped node.
    pub fn node(&self) -> &Arc<Node> {
        &self.node
    }

    /// Convenience: the wrapped node's id.
    pub fn id(&self) -> NodeId {
        self.node.id
    }

    /// Convenience: the wrapped node's title.
    pub fn title(&self) -> &str {
        &self.node.title
    }

    pub fn kind(&self) -> TaskKind {
        self.kind
    }

    pub fn state(&self) -> TaskState {
        self.state
    }

    pub fn remaining(&self) -> Remaining {
        self.remaining
    }

    /// Running time delivered by ticks since start (or last reset).
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn completed_count(&self) -> u32 {
        self.completed_count
    }

    /// Whether the runner may move on without a manual `next()` once this task completes.
    pub fn auto_advance(&self) -> bool {
        self.auto_advance
    }

    /// Index of the task in the queue it was expanded into.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Fraction of the work done in `0.0..=1.0`, or `None` when unbounded.
    pub fn progress(&self) -> Option<f64> {
        if self.state.is_completed() {
            return Some(1.0);
        }
        match self.remaining {
            Remaining::Time(left) => {
                let total = self.node.duration.as_secs_f64();
                Some(1.0 - left.as_secs_f64() / total)
            }
            Remaining::Count(left) => {
                let total = f64::from(self.node.target_count);
                Some(1.0 - f64::from(left) / total)
            }
            Remaining::Unbounded => None,
        }
    }

    /// Starts the task; same as [`resume`](Self::resume) from `Idle`.
    ///
    /// A dummy task completes immediately.
    pub fn start(&mut self) -> Result<Outcome, InvalidTransition> {
        self.activate("start")
    }

    /// Resumes a paused task (or starts an idle one). No-op if already running.
    pub fn resume(&mut self) -> Result<Outcome, InvalidTransition> {
        self.activate("resume")
    }

    /// Pauses a running task. `remaining` is preserved exactly.
    pub fn pause(&mut self) -> Result<Outcome, InvalidTransition> {
        match self.state {
            TaskState::Running => {
                self.state = TaskState::Paused;
                Ok(Outcome::Changed)
            }
            TaskState::Idle | TaskState::Paused => Ok(Outcome::Unchanged),
            TaskState::Completed => Err(self.invalid("pause")),
        }
    }

    /// Forces the task into `Completed`, firing the finish hook.
    ///
    /// Stopping a completed task is a no-op; the hook never fires twice.
    pub fn stop(&mut self) -> Outcome {
        if self.state.is_completed() {
            return Outcome::Unchanged;
        }
        self.complete()
    }

    /// Returns the task to `Idle` with its initial remaining value.
    ///
    /// A hook that already fired is not re-armed.
    pub fn reset(&mut self) -> Result<Outcome, InvalidTransition> {
        let initial = initial_remaining(&self.node, self.kind);
        let pristine = self.state == TaskState::Idle
            && self.remaining == initial
            && self.elapsed.is_zero()
            && self.completed_count == 0;
        if pristine {
            return Ok(Outcome::Unchanged);
        }
        self.state = TaskState::Idle;
        self.remaining = initial;
        self.elapsed = Duration::ZERO;
        self.completed_count = 0;
        Ok(Outcome::Changed)
    }

    /// Delivers one clock tick of length `interval`.
    ///
    /// Only time-based kinds accept ticks; they are ignored unless the task is
    /// running. `remaining` is clamped at zero; reaching zero completes the task.
    pub fn tick(&mut self, interval: Duration) -> Result<Outcome, InvalidTransition> {
        if !self.kind.is_time_based() || self.state.is_completed() {
            return Err(self.invalid("tick"));
        }
        if self.state != TaskState::Running {
            return Ok(Outcome::Unchanged);
        }
        self.elapsed = self.elapsed.saturating_add(interval);
        match self.remaining {
            Remaining::Time(left) => {
                let left = left.saturating_sub(interval);
                self.remaining = Remaining::Time(left);
                if left.is_zero() {
                    Ok(self.complete())
                } else {
                    Ok(Outcome::Changed)
                }
            }
            Remaining::Count(_) | Remaining::Unbounded => Ok(Outcome::Changed),
        }
    }

    /// Records one external count event (a tap).
    ///
    /// Only repetition tasks that are running or paused accept counts. With a
    /// non-zero target the task completes once the target is reached.
    pub fn increment_count(&mut self) -> Result<Outcome, InvalidTransition> {
        let accepts = self.kind == TaskKind::RepetitionCount
            && matches!(self.state, TaskState::Running | TaskState::Paused);
        if !accepts {
            return Err(self.invalid("increment_count"));
        }
        self.completed_count = self.completed_count.saturating_add(1);
        match self.remaining {
            Remaining::Count(left) => {
                let left = left.saturating_sub(1);
                self.remaining = Remaining::Count(left);
                if left == 0 {
                    Ok(self.complete())
                } else {
                    Ok(Outcome::Changed)
                }
            }
            Remaining::Time(_) | Remaining::Unbounded => Ok(Outcome::Changed),
        }
    }

    /// Read-only copy of the observable fields.
    pub fn snapshot(&self) -> TaskSnapshot {
        TaskSnapshot {
            id: self.node.id,
            title: Arc::clone(&self.node.title),
            kind: self.kind,
            state: self.state,
            remaining: self.remaining,
            elapsed: self.elapsed,
            completed_count: self.completed_count,
            target_count: self.node.target_count,
            position: self.position,
            auto_advance: self.auto_advance,
        }
    }

    fn activate(&mut self, op: &'static str) -> Result<Outcome, InvalidTransition> {
        match self.state {
            TaskState::Running => Ok(Outcome::Unchanged),
            TaskState::Completed => Err(self.invalid(op)),
            TaskState::Idle | TaskState::Paused => {
                if self.kind == TaskKind::Dummy {
                    return Ok(self.complete());
                }
                self.state = TaskState::Running;
                Ok(Outcome::Changed)
            }
        }
    }

    fn complete(&mut self) -> Outcome {
        self.state = TaskState::Completed;
        if let Some(hook) = self.on_finish.take() {
            hook(&self.snapshot());
        }
        Outcome::Completed
    }

    fn invalid(&self, op: &'static str) -> InvalidTransition {
        InvalidTransition {
            op,
            kind: self.kind,
            state: self.state,
        }
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("node", &self.node.id)
            .field("title", &self.node.title)
            .field("kind", &self.kind)
            .field("state", &self.state)
            .field("remaining", &self.remaining)
            .field("completed_count", &self.completed_count)
            .field("position", &self.position)
            .field("on_finish", &self.on_finish.is_some())
            .finish()
    }
}

/// Cloneable view of a task, published to observers.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskSnapshot {
    pub id: NodeId,
    pub title: Arc<str>,
    pub kind: TaskKind,
    pub state: TaskState,
    pub remaining: Remaining,
    pub elapsed: Duration,
    pub completed_count: u32,
    pub target_count: u32,
    pub position: usize,
    pub auto_advance: bool,
}

fn initial_remaining(node: &Node, kind: TaskKind) -> Remaining {
    match kind {
        TaskKind::Timer | TaskKind::Countdown if !node.duration.is_zero() => {
            Remaining::Time(node.duration)
        }
        TaskKind::RepetitionCount if node.target_count > 0 => Remaining::Count(node.target_count),
        TaskKind::Timer | TaskKind::Countdown | TaskKind::RepetitionCount | TaskKind::Dummy => {
            Remaining::Unbounded
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    const SEC: Duration = Duration::from_secs(1);

    fn timer(secs: u64) -> Task {
        Task::from_node(Node::timer("t", Duration::from_secs(secs)).shared())
    }

    fn counting_hook(counter: &Arc<AtomicUsize>) -> FinishHook {
        let counter = Arc::clone(counter);
        Box::new(move |_snap: &TaskSnapshot| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_new_task_is_idle_with_initial_remaining() {
        let t = timer(10);
        assert_eq!(t.state(), TaskState::Idle);
        assert_eq!(t.remaining(), Remaining::Time(Duration::from_secs(10)));
        assert_eq!(t.completed_count(), 0);
    }

    #[test]
    fn test_ten_ticks_complete_timer_and_fire_hook_once() {
        let fired = Arc::new(AtomicUsize::new(0));
        let mut t = timer(10).with_on_finish(counting_hook(&fired));
        assert_eq!(t.start(), Ok(Outcome::Changed));

        for _ in 0..9 {
            assert_eq!(t.tick(SEC), Ok(Outcome::Changed));
        }
        assert_eq!(t.tick(SEC), Ok(Outcome::Completed));
        assert_eq!(t.remaining(), Remaining::Time(Duration::ZERO));
        assert_eq!(t.state(), TaskState::Completed);
        assert_eq!(t.elapsed(), Duration::from_secs(10));

        assert_eq!(t.stop(), Outcome::Unchanged);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_pause_is_idempotent() {
        let mut once = timer(10);
        once.start().unwrap();
        once.tick(SEC).unwrap();
        once.pause().unwrap();

        let mut twice = timer(10);
        twice.start().unwrap();
        twice.tick(SEC).unwrap();
        assert_eq!(twice.pause(), Ok(Outcome::Changed));
        assert_eq!(twice.pause(), Ok(Outcome::Unchanged));

        assert_eq!(once.state(), twice.state());
        assert_eq!(once.remaining(), twice.remaining());
        assert_eq!(twice.state(), TaskState::Paused);
    }

    #[test]
    fn test_pause_preserves_remaining() {
        let mut t = timer(10);
        t.start().unwrap();
        for _ in 0..3 {
            t.tick(SEC).unwrap();
        }
        t.pause().unwrap();
        assert_eq!(t.remaining(), Remaining::Time(Duration::from_secs(7)));

        // ticks while paused do nothing
        assert_eq!(t.tick(SEC), Ok(Outcome::Unchanged));
        assert_eq!(t.remaining(), Remaining::Time(Duration::from_secs(7)));

        t.resume().unwrap();
        for _ in 0..6 {
            assert_eq!(t.tick(SEC), Ok(Outcome::Changed));
        }
        assert_eq!(t.tick(SEC), Ok(Outcome::Completed));
        assert_eq!(t.remaining(), Remaining::Time(Duration::ZERO));
    }

    #[test]
    fn test_tick_clamps_at_zero() {
        let mut t = Task::from_node(Node::countdown("c", Duration::from_millis(1500)).shared());
        t.start().unwrap();
        t.tick(SEC).unwrap();
        assert_eq!(t.tick(SEC), Ok(Outcome::Completed));
        assert_eq!(t.remaining(), Remaining::Time(Duration::ZERO));
    }

    #[test]
    fn test_zero_duration_timer_runs_until_stopped() {
        let mut t = timer(0);
        assert_eq!(t.remaining(), Remaining::Unbounded);
        t.start().unwrap();
        for _ in 0..100 {
            assert_eq!(t.tick(SEC), Ok(Outcome::Changed));
        }
        assert_eq!(t.elapsed(), Duration::from_secs(100));
        assert_eq!(t.state(), TaskState::Running);
        assert_eq!(t.stop(), Outcome::Completed);
    }

    #[test]
    fn test_stop_from_idle_completes_and_fires_hook() {
        let fired = Arc::new(AtomicUsize::new(0));
        let mut t = timer(5).with_on_finish(counting_hook(&fired));
        assert_eq!(t.stop(), Outcome::Completed);
        assert_eq!(t.stop(), Outcome::Unchanged);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_completed_rejects_activation() {
        let mut t = timer(1);
        t.start().unwrap();
        t.tick(SEC).unwrap();
        let err = t.resume().unwrap_err();
        assert_eq!(err.op, "resume");
        assert_eq!(err.state, TaskState::Completed);
        assert!(t.pause().is_err());
        assert!(t.tick(SEC).is_err());
    }

    #[test]
    fn test_repetitions_complete_at_target() {
        let fired = Arc::new(AtomicUsize::new(0));
        let mut t = Task::from_node(Node::repetitions("r", 3).shared())
            .with_on_finish(counting_hook(&fired));
        assert!(t.increment_count().is_err(), "idle task rejects counts");

        t.start().unwrap();
        assert_eq!(t.increment_count(), Ok(Outcome::Changed));
        assert_eq!(t.increment_count(), Ok(Outcome::Changed));
        assert_eq!(t.remaining(), Remaining::Count(1));
        assert_eq!(t.increment_count(), Ok(Outcome::Completed));
        assert_eq!(t.completed_count(), 3);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_repetitions_without_target_never_complete() {
        let mut t = Task::from_node(Node::repetitions("r", 0).shared());
        t.start().unwrap();
        for _ in 0..50 {
            assert_eq!(t.increment_count(), Ok(Outcome::Changed));
        }
        assert_eq!(t.state(), TaskState::Running);
        assert_eq!(t.completed_count(), 50);
    }

    #[test]
    fn test_repetitions_reject_ticks_and_timers_reject_counts() {
        let mut r = Task::from_node(Node::repetitions("r", 3).shared());
        r.start().unwrap();
        assert_eq!(r.tick(SEC).unwrap_err().op, "tick");

        let mut t = timer(3);
        t.start().unwrap();
        let err = t.increment_count().unwrap_err();
        assert_eq!(err.kind, TaskKind::Timer);
        assert_eq!(t.completed_count(), 0);
    }

    #[test]
    fn test_dummy_completes_on_start() {
        let fired = Arc::new(AtomicUsize::new(0));
        let mut t =
            Task::from_node(Node::none("n").shared()).with_on_finish(counting_hook(&fired));
        assert_eq!(t.start(), Ok(Outcome::Completed));
        assert_eq!(t.state(), TaskState::Completed);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_reset_restores_initial_values() {
        let mut t = timer(10);
        assert_eq!(t.reset(), Ok(Outcome::Unchanged));
        t.start().unwrap();
        t.tick(SEC).unwrap();
        t.tick(SEC).unwrap();
        assert_eq!(t.reset(), Ok(Outcome::Changed));
        assert_eq!(t.state(), TaskState::Idle);
        assert_eq!(t.remaining(), Remaining::Time(Duration::from_secs(10)));
        assert_eq!(t.elapsed(), Duration::ZERO);
    }

    #[test]
    fn test_progress() {
        let mut t = timer(4);
        assert_eq!(t.progress(), Some(0.0));
        t.start().unwrap();
        t.tick(SEC).unwrap();
        assert_eq!(t.progress(), Some(0.25));
        assert_eq!(timer(0).progress(), None);
    }

    #[test]
    fn test_hook_sees_completed_snapshot() {
        let seen = Arc::new(std::sync::Mutex::new(None));
        let sink = Arc::clone(&seen);
        let mut t = timer(1).with_on_finish(Box::new(move |snap: &TaskSnapshot| {
            *sink.lock().unwrap() = Some(snap.state);
        }));
        t.start().unwrap();
        t.tick(SEC).unwrap();
        assert_eq!(*seen.lock().unwrap(), Some(TaskState::Completed));
    }
}
