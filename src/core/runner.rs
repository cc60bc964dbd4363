//! # Sequential task runner.
//!
//! The [`Runner`] owns the flat queue produced by the expander and drives it one
//! task at a time. It is fully synchronous: every operation runs to completion
//! before returning. Real time enters only through [`tick`](Runner::tick), which
//! the async [`Engine`](crate::Engine) calls from its interval loop, and tests
//! call directly.
//!
//! ## Lifecycle
//! ```text
//! run(root) ──► expand ──► queue = [T0, T1, ..., Tn]
//!                │
//!                └─(error)──► RunRejected, previous run untouched
//!
//! advance():
//!   pop Ti ──► install finish hook ──► start ──► arm clock (time kinds)
//!                                        │
//!                                        └─ dummy completes at once ──► advance again
//!
//! Ti completes (tick / count / next / stop):
//!   hook ──► TaskCompleted ──► disarm clock
//!        ├─ auto_advance=false and queue non-empty ──► AwaitingAdvance (wait for next())
//!        └─ otherwise ──► advance()
//!
//! queue drained ──► RunFinished, running=false
//! ```
//!
//! ## Rules
//! - At most one task is active; at most one task is `Running`.
//! - The clock is armed only while the active task is a running time kind.
//! - Operations that do not apply are logged, counted, published as
//!   `TransitionRejected` and returned as [`InvalidTransition`]. They never
//!   panic and never change state.
//! - `stop()` forces the active task to `Completed` (its hook fires once) and
//!   discards the rest of the queue.

use std::collections::VecDeque;
use std::sync::Arc;

use rand::{SeedableRng, rngs::StdRng};
use tokio::sync::{broadcast, watch};

use crate::{
    core::{Clock, Config, expander::expand_with},
    error::{EngineError, InvalidTransition},
    events::{Bus, Event, EventKind},
    model::Node,
    tasks::{FinishHook, Outcome, Task, TaskSnapshot, TaskState},
};

/// Drives a queue of tasks sequentially.
pub struct Runner {
    cfg: Config,
    bus: Bus,
    clock: Clock,
    rng: StdRng,

    queue: VecDeque<Task>,
    active: Option<Task>,
    /// Length of the current run's queue at start.
    total: usize,
    running: bool,
    awaiting_advance: bool,
    rejected: u64,

    current_tx: watch::Sender<Option<TaskSnapshot>>,
    running_tx: watch::Sender<bool>,
}

impl Runner {
    /// Creates an idle runner with its own event bus.
    pub fn new(cfg: Config) -> Self {
        let bus = Bus::new(cfg.bus_capacity_clamped());
        Self::with_bus(cfg, bus)
    }

    pub(crate) fn with_bus(cfg: Config, bus: Bus) -> Self {
        let rng = match cfg.dice_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let clock = Clock::new(cfg.tick_interval());
        let (current_tx, _) = watch::channel(None);
        let (running_tx, _) = watch::channel(false);

        Self {
            cfg,
            bus,
            clock,
            rng,
            queue: VecDeque::new(),
            active: None,
            total: 0,
            running: false,
            awaiting_advance: false,
            rejected: 0,
            current_tx,
            running_tx,
        }
    }

    /// Expands `root` and starts executing it from the first task.
    ///
    /// A run already in progress is stopped first (`RunStopped` with reason
    /// `"replaced"`). If expansion fails, nothing changes and the error is
    /// returned. Returns the number of queued tasks.
    pub fn run(&mut self, root: &Arc<Node>) -> Result<usize, EngineError> {
        let tasks = match expand_with(root, &self.cfg, &mut self.rng) {
            Ok(tasks) => tasks,
            Err(err) => {
                tracing::warn!(root = %root.id, error = %err, "run rejected");
                self.bus.publish(
                    Event::new(EventKind::RunRejected)
                        .with_task(Arc::clone(&root.title))
                        .with_node(root.id)
                        .with_reason(err.as_message()),
                );
                return Err(err);
            }
        };

        self.halt("replaced");
        self.total = tasks.len();
        self.queue = tasks.into();
        self.running = true;

        tracing::info!(root = %root.id, title = %root.title, tasks = self.total, "run started");
        self.bus.publish(
            Event::new(EventKind::RunStarted)
                .with_task(Arc::clone(&root.title))
                .with_node(root.id)
                .with_total(self.total),
        );
        self.publish_running();
        self.advance();
        Ok(self.total)
    }

    /// Pauses the active task.
    ///
    /// While held at an advance gate there is nothing to pause and the call is a no-op.
    pub fn pause(&mut self) -> Result<Outcome, InvalidTransition> {
        if self.awaiting_advance {
            return Ok(Outcome::Unchanged);
        }
        let Some(task) = self.active.as_mut() else {
            return Ok(Outcome::Unchanged);
        };
        match task.pause() {
            Ok(Outcome::Changed) => {
                self.clock.disarm();
                self.publish_task(EventKind::TaskPaused);
                self.publish_current();
                Ok(Outcome::Changed)
            }
            Ok(outcome) => Ok(outcome),
            Err(err) => Err(self.reject(err)),
        }
    }

    /// Resumes the active task, or starts it again after a [`reset`](Self::reset).
    pub fn resume(&mut self) -> Result<Outcome, InvalidTransition> {
        let Some(task) = self.active.as_mut() else {
            return Ok(Outcome::Unchanged);
        };
        match task.resume() {
            Ok(Outcome::Changed) => {
                self.rearm();
                self.publish_task(EventKind::TaskResumed);
                self.publish_current();
                Ok(Outcome::Changed)
            }
            Ok(Outcome::Completed) => {
                self.on_completed();
                Ok(Outcome::Completed)
            }
            Ok(Outcome::Unchanged) => Ok(Outcome::Unchanged),
            Err(err) => Err(self.reject(err)),
        }
    }

    /// Stops the run: the active task completes, the remaining queue is discarded.
    pub fn stop(&mut self) -> Outcome {
        self.halt("stopped")
    }

    /// Stops the run because its owner is going away.
    pub(crate) fn shut_down(&mut self) -> Outcome {
        self.halt("shutdown")
    }

    /// Records one count event on the active repetition task.
    pub fn increment_count(&mut self) -> Result<Outcome, InvalidTransition> {
        let Some(task) = self.active.as_mut() else {
            return Ok(Outcome::Unchanged);
        };
        match task.increment_count() {
            Ok(Outcome::Completed) => {
                self.on_completed();
                Ok(Outcome::Completed)
            }
            Ok(outcome) => {
                self.publish_task(EventKind::TaskProgress);
                self.publish_current();
                Ok(outcome)
            }
            Err(err) => Err(self.reject(err)),
        }
    }

    /// Delivers one clock tick to the active task, if the clock is armed.
    pub fn tick(&mut self) -> Outcome {
        match self.clock.current() {
            Some(generation) => self.tick_for(generation),
            None => Outcome::Unchanged,
        }
    }

    /// Delivers a tick issued under `generation`.
    ///
    /// Ticks from an earlier arming are stale and ignored.
    pub fn tick_for(&mut self, generation: u64) -> Outcome {
        if !self.running || !self.clock.accepts(generation) {
            tracing::trace!(generation, current = self.clock.generation(), "stale tick");
            return Outcome::Unchanged;
        }
        let interval = self.clock.interval();
        let Some(task) = self.active.as_mut() else {
            return Outcome::Unchanged;
        };
        match task.tick(interval) {
            Ok(Outcome::Completed) => {
                self.on_completed();
                Outcome::Completed
            }
            Ok(Outcome::Changed) => {
                self.publish_task(EventKind::TaskProgress);
                self.publish_current();
                Outcome::Changed
            }
            Ok(Outcome::Unchanged) => Outcome::Unchanged,
            Err(err) => {
                self.reject(err);
                Outcome::Unchanged
            }
        }
    }

    /// Completes the active task if needed and moves on, ignoring `auto_advance`.
    pub fn next(&mut self) -> Outcome {
        if !self.running {
            return Outcome::Unchanged;
        }
        if let Some(task) = self.active.as_mut() {
            task.stop();
        }
        self.advance();
        Outcome::Changed
    }

    /// Returns the active task to `Idle`; [`resume`](Self::resume) starts it again.
    ///
    /// Works on a task held at an advance gate as well, which lifts the gate.
    pub fn reset(&mut self) -> Result<Outcome, InvalidTransition> {
        let hook = self.completion_hook();
        let Some(task) = self.active.as_mut() else {
            return Ok(Outcome::Unchanged);
        };
        match task.reset() {
            Ok(Outcome::Changed) => {
                task.set_on_finish(hook);
                self.awaiting_advance = false;
                self.clock.disarm();
                self.publish_task(EventKind::TaskReset);
                self.publish_current();
                Ok(Outcome::Changed)
            }
            Ok(outcome) => Ok(outcome),
            Err(err) => Err(self.reject(err)),
        }
    }

    /// The active task, if any.
    #[inline]
    pub fn current(&self) -> Option<&Task> {
        self.active.as_ref()
    }

    /// Tasks still waiting in the queue, in execution order.
    pub fn upcoming(&self) -> impl Iterator<Item = &Task> {
        self.queue.iter()
    }

    /// Number of tasks still waiting in the queue.
    #[inline]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Queue length of the current (or last) run.
    #[inline]
    pub fn total(&self) -> usize {
        self.total
    }

    /// True from `run()` until the queue drains or `stop()` is called.
    ///
    /// Pausing does not clear it.
    #[inline]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// True while a completed task waits for [`next`](Self::next).
    #[inline]
    pub fn is_awaiting_advance(&self) -> bool {
        self.awaiting_advance
    }

    /// Number of rejected operations since creation.
    #[inline]
    pub fn invalid_transitions(&self) -> u64 {
        self.rejected
    }

    #[inline]
    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Receiver that always holds a snapshot of the active task.
    pub fn watch_current(&self) -> watch::Receiver<Option<TaskSnapshot>> {
        self.current_tx.subscribe()
    }

    /// Receiver for the overall running flag.
    pub fn watch_running(&self) -> watch::Receiver<bool> {
        self.running_tx.subscribe()
    }

    /// Receiver for events published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    pub(crate) fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Drops the finished head and activates tasks until one keeps running,
    /// a gate holds, or the queue is drained.
    fn advance(&mut self) {
        self.awaiting_advance = false;
        self.clock.disarm();
        self.active = None;

        loop {
            let Some(mut task) = self.queue.pop_front() else {
                self.finish();
                return;
            };
            task.set_on_finish(self.completion_hook());
            tracing::debug!(
                node = %task.id(),
                title = task.title(),
                kind = %task.kind(),
                position = task.position(),
                "task activated"
            );
            self.bus.publish(
                Event::new(EventKind::TaskActivated)
                    .with_snapshot(&task.snapshot())
                    .with_total(self.total),
            );

            match task.start() {
                Ok(Outcome::Completed) => {
                    self.active = Some(task);
                    if self.hold() {
                        return;
                    }
                    self.active = None;
                }
                Ok(_) => {
                    self.active = Some(task);
                    self.rearm();
                    self.publish_current();
                    return;
                }
                Err(err) => {
                    self.active = Some(task);
                    self.reject(err);
                    self.active = None;
                }
            }
        }
    }

    fn on_completed(&mut self) {
        if !self.hold() {
            self.advance();
        }
    }

    /// Settles a completed active task. Returns `true` if an advance gate holds it.
    fn hold(&mut self) -> bool {
        self.clock.disarm();
        self.publish_current();

        let gated = !self.queue.is_empty()
            && self.active.as_ref().is_some_and(|task| !task.auto_advance());
        if gated {
            self.awaiting_advance = true;
            tracing::debug!(pending = self.queue.len(), "awaiting advance");
            self.publish_task(EventKind::AwaitingAdvance);
        }
        gated
    }

    fn finish(&mut self) {
        self.active = None;
        self.running = false;
        self.awaiting_advance = false;
        self.clock.disarm();

        tracing::info!(tasks = self.total, "run finished");
        self.bus
            .publish(Event::new(EventKind::RunFinished).with_total(self.total));
        self.publish_current();
        self.publish_running();
    }

    fn halt(&mut self, reason: &'static str) -> Outcome {
        if !self.running {
            return Outcome::Unchanged;
        }
        self.clock.disarm();
        let discarded = self.queue.len();
        self.queue.clear();
        if let Some(mut task) = self.active.take() {
            task.stop();
        }
        self.running = false;
        self.awaiting_advance = false;

        tracing::info!(discarded, reason, "run stopped");
        self.bus.publish(
            Event::new(EventKind::RunStopped)
                .with_total(discarded)
                .with_reason(reason),
        );
        self.publish_current();
        self.publish_running();
        Outcome::Changed
    }

    /// Arms the clock if the active task is a running time kind, disarms otherwise.
    fn rearm(&mut self) {
        let ticking = self.active.as_ref().is_some_and(|task| {
            task.state() == TaskState::Running && task.kind().is_time_based()
        });
        if ticking {
            self.clock.arm();
        } else {
            self.clock.disarm();
        }
    }

    fn reject(&mut self, err: InvalidTransition) -> InvalidTransition {
        self.rejected = self.rejected.saturating_add(1);
        tracing::warn!(
            op = err.op,
            kind = %err.kind,
            state = %err.state,
            rejected = self.rejected,
            "transition rejected"
        );

        let mut ev = Event::new(EventKind::TransitionRejected).with_reason(err.as_message());
        if let Some(task) = &self.active {
            ev = ev.with_snapshot(&task.snapshot());
        }
        self.bus.publish(ev);
        err
    }

    fn completion_hook(&self) -> FinishHook {
        let bus = self.bus.clone();
        Box::new(move |snap: &TaskSnapshot| {
            tracing::debug!(node = %snap.id, title = %snap.title, "task completed");
            bus.publish(Event::new(EventKind::TaskCompleted).with_snapshot(snap));
        })
    }

    fn publish_task(&self, kind: EventKind) {
        if let Some(task) = &self.active {
            self.bus.publish(Event::new(kind).with_snapshot(&task.snapshot()));
        }
    }

    fn publish_current(&self) {
        self.current_tx
            .send_replace(self.active.as_ref().map(Task::snapshot));
    }

    fn publish_running(&self) {
        let running = self.running;
        self.running_tx.send_if_modified(|flag| {
            if *flag == running {
                return false;
            }
            *flag = running;
            true
        });
    }
}

impl std::fmt::Debug for Runner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runner")
            .field("active", &self.active)
            .field("pending", &self.queue.len())
            .field("running", &self.running)
            .field("awaiting_advance", &self.awaiting_advance)
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}
