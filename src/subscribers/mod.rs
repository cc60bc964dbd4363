//! # Event subscribers.
//!
//! This module provides the [`Subscribe`] trait, the [`SubscriberSet`] fan-out
//! and built-in implementations for runtime events broadcast through the
//! [`Bus`](crate::events::Bus).
//!
//! ## Architecture
//! ```text
//! Runner ── publish(Event) ──► Bus ──► engine fan-out listener ──► SubscriberSet::emit
//!                                                                      │
//!                                                  ┌───────────────────┼──────────────┐
//!                                                  ▼                   ▼              ▼
//!                                           ProgressTracker       LogWriter        Custom
//! ```
//!
//! ## Subscriber types
//! - **Passive subscribers**: observe and react to events (logging, sound cues, haptics)
//! - **Stateful subscribers**: fold events into a view (ProgressTracker)
//!
//! ## Implementing custom subscribers
//! ```no_run
//! use async_trait::async_trait;
//! use combocube::{Event, EventKind, Subscribe};
//!
//! struct Beeper;
//!
//! #[async_trait]
//! impl Subscribe for Beeper {
//!     async fn on_event(&self, event: &Event) {
//!         if event.kind == EventKind::TaskCompleted {
//!             // play a sound
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str {
//!         "beeper"
//!     }
//! }
//! ```

mod embedded;
mod progress;
mod subscriber;
mod subscriber_set;

#[cfg(feature = "logging")]
pub use embedded::LogWriter;
pub use progress::{Progress, ProgressTracker};
pub use subscriber::Subscribe;
pub use subscriber_set::SubscriberSet;
