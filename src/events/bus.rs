//! # Event bus.
//!
//! Every run and task event goes through one [`Bus`]. The runner and its
//! finish hooks publish; subscriber workers publish overflow and panic reports.
//!
//! ```text
//!   Runner        ──┐              ┌──► Engine fan-out listener ──► SubscriberSet
//!   finish hooks  ──┼──► Bus ──────┤
//!   sub. workers  ──┘              └──► Runner::subscribe() / Engine::subscribe()
//! ```
//!
//! Publishing never waits on receivers. A receiver that falls more than
//! `bus_capacity` events behind gets `RecvError::Lagged` and resumes at the
//! oldest event still buffered.

use tokio::sync::broadcast;

use super::event::Event;

/// Shared sender for engine events; clones publish into the same channel.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a bus buffering up to `capacity` events (at least 1).
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel::<Event>(capacity.max(1));
        Self { tx }
    }

    /// Publishes `ev`. Dropped silently when nobody is subscribed.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Receiver for events published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::broadcast::error::TryRecvError;

    use super::*;
    use crate::events::EventKind;

    #[test]
    fn test_late_receiver_sees_only_later_events() {
        let bus = Bus::new(8);
        bus.publish(Event::new(EventKind::RunStarted));

        let mut rx = bus.subscribe();
        bus.publish(Event::new(EventKind::RunFinished));

        assert_eq!(rx.try_recv().unwrap().kind, EventKind::RunFinished);
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[test]
    fn test_slow_receiver_lags() {
        let bus = Bus::new(0);
        let mut rx = bus.subscribe();
        bus.publish(Event::new(EventKind::TaskProgress));
        bus.publish(Event::new(EventKind::TaskCompleted));

        assert!(matches!(rx.try_recv(), Err(TryRecvError::Lagged(1))));
        assert_eq!(rx.try_recv().unwrap().kind, EventKind::TaskCompleted);
    }
}
