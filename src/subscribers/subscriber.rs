//! # Event subscriber trait.
//!
//! [`Subscribe`] is how UIs, sound cues and loggers react to a running session
//! without sitting on the engine's hot path.
//!
//! ```text
//! SubscriberSet ──► [bounded queue] ──► worker task ──► subscriber.on_event()
//!                                    └─► panic caught → EventKind::SubscriberPanicked
//! ```
//!
//! ## Rules
//! - Each subscriber has its own worker and queue; events arrive in publish order.
//! - A full queue drops the event for that subscriber only and publishes
//!   `EventKind::SubscriberOverflow`.
//! - A panic in `on_event` is reported and the next event is still delivered.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use combocube::{Event, EventKind, Subscribe};
//!
//! struct Haptics;
//!
//! #[async_trait]
//! impl Subscribe for Haptics {
//!     async fn on_event(&self, ev: &Event) {
//!         if matches!(ev.kind, EventKind::TaskCompleted | EventKind::AwaitingAdvance) {
//!             // buzz the device
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "haptics" }
//!     fn queue_capacity(&self) -> usize { 64 }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Receiver of engine events.
///
/// Implementations should not block the executor; anything slow only delays
/// this subscriber's own queue.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handles one event. Called from the subscriber's worker task.
    async fn on_event(&self, event: &Event);

    /// Name used in logs and in overflow/panic events.
    ///
    /// Defaults to the type name; short names ("progress", "haptics") read better.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Queue capacity for this subscriber (clamped to at least 1).
    ///
    /// Default: 1024.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
