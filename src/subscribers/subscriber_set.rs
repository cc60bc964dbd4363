//! # Non-blocking event fan-out to multiple subscribers.
//!
//! [`SubscriberSet`] hands each event to every subscriber through its own
//! bounded queue, so a slow sound cue or UI refresh never stalls the engine.
//!
//! ```text
//! emit(event)
//!     │
//!     ├──► [queue 1] ──► worker 1 ──► subscriber1.on_event()
//!     │    (bounded)         └──────► panic → SubscriberPanicked
//!     ├──► [queue 2] ──► worker 2 ──► subscriber2.on_event()
//!     └──► [queue N] ──► worker N ──► subscriberN.on_event()
//! ```
//!
//! ## Rules
//! - **Non-blocking**: `emit()` returns immediately (`try_send`).
//! - **Per-subscriber FIFO**; no ordering across subscribers.
//! - **Overflow**: the event is dropped for that subscriber only and
//!   `SubscriberOverflow` is published (never for an overflow event itself).
//! - **Panics** are caught per event; the worker keeps going.
//!
//! `AssertUnwindSafe` is used, so a subscriber that panics while holding a lock
//! may leave its own state poisoned.

use std::any::Any;
use std::sync::Arc;

use futures::FutureExt;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::events::{Bus, Event, EventKind};
use crate::subscribers::Subscribe;

struct SubscriberChannel {
    name: &'static str,
    sender: mpsc::Sender<Arc<Event>>,
}

/// Fan-out coordinator for event subscribers.
pub struct SubscriberSet {
    channels: Vec<SubscriberChannel>,
    workers: Vec<JoinHandle<()>>,
    bus: Bus,
}

impl SubscriberSet {
    /// Creates the set and spawns one worker per subscriber.
    ///
    /// Queue capacity comes from [`Subscribe::queue_capacity`] (min 1). Must be
    /// called from within a Tokio runtime.
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>, bus: Bus) -> Self {
        let mut channels = Vec::with_capacity(subs.len());
        let mut workers = Vec::with_capacity(subs.len());

        for sub in subs {
            let name = sub.name();
            let (tx, rx) = mpsc::channel::<Arc<Event>>(sub.queue_capacity().max(1));
            workers.push(tokio::spawn(worker(sub, rx, bus.clone())));
            channels.push(SubscriberChannel { name, sender: tx });
        }
        Self {
            channels,
            workers,
            bus,
        }
    }

    /// Emits an event to all subscribers (clones the event once).
    pub fn emit(&self, event: &Event) {
        self.emit_arc(Arc::new(event.clone()));
    }

    /// Emits a shared event to all subscribers without cloning it.
    pub fn emit_arc(&self, event: Arc<Event>) {
        let is_overflow_evt = matches!(event.kind, EventKind::SubscriberOverflow);

        for channel in &self.channels {
            let reason = match channel.sender.try_send(Arc::clone(&event)) {
                Ok(()) => continue,
                Err(mpsc::error::TrySendError::Full(_)) => "full",
                Err(mpsc::error::TrySendError::Closed(_)) => "closed",
            };
            tracing::debug!(subscriber = channel.name, reason, seq = event.seq, "event dropped");
            if !is_overflow_evt {
                self.bus
                    .publish(Event::subscriber_overflow(channel.name, reason));
            }
        }
    }

    /// Number of subscribers.
    #[inline]
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Closes every queue and waits for the workers to finish what is buffered.
    pub async fn shutdown(self) {
        drop(self.channels);
        for h in self.workers {
            let _ = h.await;
        }
    }
}

async fn worker(sub: Arc<dyn Subscribe>, mut rx: mpsc::Receiver<Arc<Event>>, bus: Bus) {
    while let Some(ev) = rx.recv().await {
        let fut = sub.on_event(ev.as_ref());
        if let Err(panic_err) = std::panic::AssertUnwindSafe(fut).catch_unwind().await {
            let info = panic_message(&*panic_err);
            tracing::error!(subscriber = sub.name(), info = %info, "subscriber panicked");
            bus.publish(Event::subscriber_panicked(sub.name(), info));
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;

    #[derive(Default)]
    struct Collect {
        seen: Mutex<Vec<u64>>,
    }

    #[async_trait]
    impl Subscribe for Collect {
        async fn on_event(&self, ev: &Event) {
            self.seen.lock().unwrap().push(ev.seq);
        }

        fn name(&self) -> &'static str {
            "collect"
        }
    }

    struct Explode;

    #[async_trait]
    impl Subscribe for Explode {
        async fn on_event(&self, _ev: &Event) {
            panic!("boom");
        }

        fn name(&self) -> &'static str {
            "explode"
        }
    }

    struct Stuck;

    #[async_trait]
    impl Subscribe for Stuck {
        async fn on_event(&self, _ev: &Event) {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }

        fn name(&self) -> &'static str {
            "stuck"
        }

        fn queue_capacity(&self) -> usize {
            1
        }
    }

    #[tokio::test]
    async fn test_fifo_delivery() {
        let collect = Arc::new(Collect::default());
        let subs: Vec<Arc<dyn Subscribe>> = vec![collect.clone()];
        let set = SubscriberSet::new(subs, Bus::new(16));
        assert_eq!(set.len(), 1);

        let events: Vec<Event> = (0..5).map(|_| Event::new(EventKind::TaskProgress)).collect();
        for ev in &events {
            set.emit(ev);
        }
        set.shutdown().await;

        let expected: Vec<u64> = events.iter().map(|ev| ev.seq).collect();
        assert_eq!(*collect.seen.lock().unwrap(), expected);
    }

    #[tokio::test]
    async fn test_panic_is_reported() {
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let collect = Arc::new(Collect::default());
        let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(Explode), collect.clone()];
        let set = SubscriberSet::new(subs, bus);

        set.emit(&Event::new(EventKind::RunStarted));
        set.shutdown().await;

        let ev = rx.recv().await.unwrap();
        assert!(ev.is_subscriber_panic());
        assert_eq!(ev.task.as_deref(), Some("explode"));
        assert_eq!(ev.reason.as_deref(), Some("boom"));
        assert_eq!(collect.seen.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overflow_is_reported() {
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(Stuck)];
        let set = SubscriberSet::new(subs, bus);

        // One event is picked up by the worker, one fills the queue, the rest overflow.
        set.emit(&Event::new(EventKind::TaskProgress));
        tokio::task::yield_now().await;
        for _ in 0..3 {
            set.emit(&Event::new(EventKind::TaskProgress));
        }

        let ev = rx.recv().await.unwrap();
        assert!(ev.is_subscriber_overflow());
        assert_eq!(ev.reason.as_deref(), Some("subscriber=stuck reason=full"));
    }
}
