//! Runtime events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to events emitted by the runner, task finish hooks and
//! subscriber workers.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Runner` (run and task transitions), task finish hooks
//!   (`TaskCompleted`), `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: the engine's fan-out listener (feeds `SubscriberSet`) and
//!   any receiver obtained through `Runner::subscribe` / `Engine::subscribe`.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
