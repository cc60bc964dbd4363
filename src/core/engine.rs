//! # Engine: async driver around the runner.
//!
//! The [`Engine`] owns a [`Runner`] inside a spawned driver task and exposes
//! its operations as async methods. Commands travel over a bounded mpsc queue
//! and are applied strictly one at a time, so the runner never sees concurrent
//! mutation. Real time comes from a `tokio::time::Interval` that only ticks
//! while the runner's clock is armed.
//!
//! ## Architecture
//! ```text
//! Engine::run / pause / ...  ──► [command queue] ──► driver task
//!                                                    │
//!          ┌─────────────────────────────────────────┤
//!          │  select! (biased):                      │
//!          │    token.cancelled()  → halt, exit      │
//!          │    commands.recv()    → apply to Runner │
//!          │    interval.tick()    → Runner::tick_for│ (only while armed)
//!          └─────────────────────────────────────────┘
//!                                │ publish(Event)
//!                                ▼
//!                               Bus ──► fan-out listener ──► SubscriberSet
//!                                │
//!                                └──► Engine::subscribe()
//! ```
//!
//! ## Clock rules
//! - The interval is reset whenever the runner re-arms its clock, so a newly
//!   activated or resumed task always waits one full tick before its first decrement.
//! - Missed ticks are delayed, never bursted.
//! - Each tick is stamped with the generation that was armed when the interval
//!   was reset; a tick from a previous arming is dropped by the runner.
//!
//! ## Shutdown
//! [`Engine::shutdown`] cancels the driver, which stops the current run
//! (`RunStopped` with reason `"shutdown"`), then waits for the fan-out listener
//! to deliver every remaining event and for subscriber workers to drain.
//! Dropping the engine without calling `shutdown` also stops the driver once the
//! command queue closes.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::{
    sync::{broadcast, mpsc, oneshot, watch},
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use crate::{
    core::{Config, EngineBuilder, Runner},
    error::{EngineError, InvalidTransition},
    events::{Bus, Event},
    model::Node,
    subscribers::{Subscribe, SubscriberSet},
    tasks::{Outcome, TaskSnapshot},
};

/// Runner operations that carry no payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Control {
    Pause,
    Resume,
    Stop,
    Increment,
    Next,
    Reset,
}

enum Command {
    Run(Arc<Node>, oneshot::Sender<Result<usize, EngineError>>),
    Control(Control, oneshot::Sender<Result<Outcome, InvalidTransition>>),
}

struct Workers {
    driver: JoinHandle<()>,
    listener: JoinHandle<()>,
}

/// Async handle to a runner driven in real time.
pub struct Engine {
    commands: mpsc::Sender<Command>,
    bus: Bus,
    current: watch::Receiver<Option<TaskSnapshot>>,
    running: watch::Receiver<bool>,
    token: CancellationToken,
    workers: Mutex<Option<Workers>>,
}

impl Engine {
    /// Returns a builder for configuring the engine.
    pub fn builder(cfg: Config) -> EngineBuilder {
        EngineBuilder::new(cfg)
    }

    pub(crate) fn spawn(cfg: Config, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        let bus = Bus::new(cfg.bus_capacity_clamped());
        let (commands, rx) = mpsc::channel(cfg.command_capacity_clamped());
        let runner = Runner::with_bus(cfg, bus.clone());
        let current = runner.watch_current();
        let running = runner.watch_running();

        let token = CancellationToken::new();
        let drained = CancellationToken::new();

        let subs = SubscriberSet::new(subscribers, bus.clone());
        let listener = tokio::spawn(subscriber_listener(
            bus.subscribe(),
            subs,
            drained.clone(),
        ));
        let driver = tokio::spawn(drive(runner, rx, token.clone(), drained));

        Self {
            commands,
            bus,
            current,
            running,
            token,
            workers: Mutex::new(Some(Workers { driver, listener })),
        }
    }

    /// Expands `root` and starts it, replacing any run in progress.
    ///
    /// Returns the number of queued tasks.
    pub async fn run(&self, root: Arc<Node>) -> Result<usize, EngineError> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Run(root, tx)).await?;
        rx.await.map_err(|_| EngineError::Closed)?
    }

    /// Pauses the active task.
    pub async fn pause(&self) -> Result<Outcome, EngineError> {
        self.control(Control::Pause).await
    }

    /// Resumes the active task.
    pub async fn resume(&self) -> Result<Outcome, EngineError> {
        self.control(Control::Resume).await
    }

    /// Stops the current run and discards the remaining queue.
    pub async fn stop(&self) -> Result<Outcome, EngineError> {
        self.control(Control::Stop).await
    }

    /// Records one count event on the active repetition task.
    pub async fn increment_count(&self) -> Result<Outcome, EngineError> {
        self.control(Control::Increment).await
    }

    /// Completes the active task and moves on, ignoring `auto_advance`.
    pub async fn next(&self) -> Result<Outcome, EngineError> {
        self.control(Control::Next).await
    }

    /// Returns the active task to idle.
    pub async fn reset(&self) -> Result<Outcome, EngineError> {
        self.control(Control::Reset).await
    }

    /// Snapshot of the active task.
    pub fn current(&self) -> Option<TaskSnapshot> {
        self.current.borrow().clone()
    }

    /// True while a run is in progress (also while paused).
    pub fn is_running(&self) -> bool {
        *self.running.borrow()
    }

    pub fn watch_current(&self) -> watch::Receiver<Option<TaskSnapshot>> {
        self.current.clone()
    }

    pub fn watch_running(&self) -> watch::Receiver<bool> {
        self.running.clone()
    }

    /// Receiver for events published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// Stops the driver and waits until every subscriber has seen the final events.
    ///
    /// Later calls return immediately; operations after shutdown fail with
    /// [`EngineError::Closed`].
    pub async fn shutdown(&self) {
        self.token.cancel();
        let workers = self
            .workers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(Workers { driver, listener }) = workers else {
            return;
        };

        if let Err(err) = driver.await {
            tracing::error!(error = %err, "engine driver ended abnormally");
        }
        if let Err(err) = listener.await {
            tracing::error!(error = %err, "subscriber listener ended abnormally");
        }
    }

    async fn control(&self, op: Control) -> Result<Outcome, EngineError> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Control(op, tx)).await?;
        let reply = rx.await.map_err(|_| EngineError::Closed)?;
        Ok(reply?)
    }

    async fn send(&self, cmd: Command) -> Result<(), EngineError> {
        self.commands
            .send(cmd)
            .await
            .map_err(|_| EngineError::Closed)
    }
}

/// Driver loop: applies commands and clock ticks until cancelled or orphaned.
async fn drive(
    mut runner: Runner,
    mut commands: mpsc::Receiver<Command>,
    token: CancellationToken,
    drained: CancellationToken,
) {
    let period = runner.clock().interval();
    let mut interval = time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut armed = runner.clock().current();

    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            cmd = commands.recv() => match cmd {
                Some(cmd) => apply(&mut runner, cmd),
                None => break,
            },
            _ = interval.tick(), if armed.is_some() => {
                if let Some(generation) = armed {
                    runner.tick_for(generation);
                }
            }
        }

        let now = runner.clock().current();
        if now != armed {
            if now.is_some() {
                interval.reset();
            }
            armed = now;
        }
    }

    runner.shut_down();
    tracing::debug!(rejected = runner.invalid_transitions(), "engine driver stopped");
    drained.cancel();
}

fn apply(runner: &mut Runner, cmd: Command) {
    match cmd {
        Command::Run(root, reply) => {
            let _ = reply.send(runner.run(&root));
        }
        Command::Control(op, reply) => {
            let result = match op {
                Control::Pause => runner.pause(),
                Control::Resume => runner.resume(),
                Control::Stop => Ok(runner.stop()),
                Control::Increment => runner.increment_count(),
                Control::Next => Ok(runner.next()),
                Control::Reset => runner.reset(),
            };
            let _ = reply.send(result);
        }
    }
}

/// Forwards bus events to the subscriber set until the driver has stopped,
/// then delivers whatever is still buffered and shuts the workers down.
async fn subscriber_listener(
    mut rx: broadcast::Receiver<Event>,
    subs: SubscriberSet,
    drained: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            ev = rx.recv() => match ev {
                Ok(ev) => subs.emit(&ev),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "subscriber listener lagged behind the bus");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            _ = drained.cancelled() => {
                drain_remaining(&mut rx, &subs);
                break;
            }
        }
    }
    subs.shutdown().await;
}

/// Hands every event still buffered on `rx` to the subscribers, skipping past lag.
fn drain_remaining(rx: &mut broadcast::Receiver<Event>, subs: &SubscriberSet) {
    loop {
        match rx.try_recv() {
            Ok(ev) => subs.emit(&ev),
            Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "events lost while draining the bus");
            }
            Err(broadcast::error::TryRecvError::Empty | broadcast::error::TryRecvError::Closed) => {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::events::EventKind;
    use crate::tasks::{Remaining, TaskState};

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    fn engine() -> Arc<Engine> {
        Engine::builder(Config::default()).build()
    }

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<EventKind>>,
    }

    impl Recorder {
        fn kinds(&self) -> Vec<EventKind> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Subscribe for Recorder {
        async fn on_event(&self, ev: &Event) {
            self.seen.lock().unwrap().push(ev.kind);
        }

        fn name(&self) -> &'static str {
            "recorder"
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_advance_through_queue() {
        let engine = engine();
        let root = Node::combo(
            "session",
            [
                Node::timer("A", secs(2)).shared(),
                Node::timer("B", secs(1)).shared(),
            ],
        )
        .shared();

        assert_eq!(engine.run(root).await.unwrap(), 2);
        assert_eq!(engine.current().unwrap().title.as_ref(), "A");

        time::sleep(Duration::from_millis(2500)).await;
        let current = engine.current().unwrap();
        assert_eq!(current.title.as_ref(), "B");
        assert_eq!(current.remaining, Remaining::Time(secs(1)));
        assert!(engine.is_running());

        time::sleep(secs(1)).await;
        assert!(engine.current().is_none());
        assert!(!engine.is_running());
        engine.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_freezes_remaining_time() {
        let engine = engine();
        engine.run(Node::timer("plank", secs(5)).shared()).await.unwrap();

        time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(engine.pause().await.unwrap(), Outcome::Changed);

        time::sleep(secs(10)).await;
        let paused = engine.current().unwrap();
        assert_eq!(paused.state, TaskState::Paused);
        assert_eq!(paused.remaining, Remaining::Time(secs(4)));
        assert!(engine.is_running());

        engine.resume().await.unwrap();
        time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(engine.current().unwrap().remaining, Remaining::Time(secs(3)));
        engine.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_counts_and_rejections() {
        let engine = engine();
        engine
            .run(Node::repetitions("squats", 2).shared())
            .await
            .unwrap();

        time::sleep(secs(5)).await;
        assert_eq!(engine.current().unwrap().remaining, Remaining::Count(2));

        assert_eq!(engine.pause().await.unwrap(), Outcome::Changed);
        assert_eq!(engine.increment_count().await.unwrap(), Outcome::Changed);
        assert_eq!(engine.increment_count().await.unwrap(), Outcome::Completed);
        assert!(!engine.is_running());

        // Nothing is active any more, so the tap is a no-op.
        assert_eq!(engine.increment_count().await.unwrap(), Outcome::Unchanged);

        engine.run(Node::timer("plank", secs(5)).shared()).await.unwrap();
        match engine.increment_count().await {
            Err(EngineError::Transition(err)) => assert_eq!(err.op, "increment_count"),
            other => panic!("unexpected reply: {other:?}"),
        }
        engine.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_expansion_error_is_returned() {
        let engine = engine();
        let back = Node::combo("back", []).with_id(9_000).shared();
        let cyclic = Node::combo("loop", [back]).with_id(9_000).shared();

        let err = engine.run(cyclic).await.unwrap_err();
        assert_eq!(err.as_label(), "cyclic_structure");
        assert!(!engine.is_running());
        engine.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribers_see_final_events() {
        let recorder = Arc::new(Recorder::default());
        let engine = Engine::builder(Config::default())
            .with_subscriber(recorder.clone())
            .build();

        engine
            .run(
                Node::combo(
                    "session",
                    [
                        Node::timer("A", secs(1)).shared(),
                        Node::timer("B", secs(60)).shared(),
                    ],
                )
                .shared(),
            )
            .await
            .unwrap();
        time::sleep(Duration::from_millis(1500)).await;
        engine.shutdown().await;

        assert_eq!(
            recorder.kinds(),
            [
                EventKind::RunStarted,
                EventKind::TaskActivated,
                EventKind::TaskCompleted,
                EventKind::TaskActivated,
                EventKind::TaskCompleted,
                EventKind::RunStopped,
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_ticks_collapse_into_one() {
        let engine = engine();
        engine.run(Node::timer("plank", secs(10)).shared()).await.unwrap();

        time::advance(secs(5)).await;
        tokio::task::yield_now().await;
        assert_eq!(engine.current().unwrap().remaining, Remaining::Time(secs(9)));
        engine.shutdown().await;
    }

    #[tokio::test]
    async fn test_drain_continues_past_lag() {
        let recorder = Arc::new(Recorder::default());
        let bus = Bus::new(2);
        let mut rx = bus.subscribe();
        let subs_list: Vec<Arc<dyn Subscribe>> = vec![recorder.clone()];
        let subs = SubscriberSet::new(subs_list, bus.clone());

        bus.publish(Event::new(EventKind::RunStarted));
        bus.publish(Event::new(EventKind::TaskActivated));
        bus.publish(Event::new(EventKind::TaskCompleted));
        bus.publish(Event::new(EventKind::RunFinished));

        drain_remaining(&mut rx, &subs);
        subs.shutdown().await;
        assert_eq!(
            recorder.kinds(),
            [EventKind::TaskCompleted, EventKind::RunFinished]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_after_shutdown() {
        let engine = engine();
        engine.shutdown().await;
        engine.shutdown().await;

        assert_eq!(engine.pause().await.unwrap_err(), EngineError::Closed);
        assert_eq!(
            engine.run(Node::timer("late", secs(1)).shared()).await.unwrap_err(),
            EngineError::Closed
        );
    }
}
