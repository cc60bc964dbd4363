//! # Runtime tasks.
//!
//! This module provides the runtime side of a leaf node:
//! - [`Task`] - stateful wrapper around one leaf [`Node`](crate::Node)
//! - [`TaskKind`] - resolved behaviour (timer, countdown, repetitions, dummy)
//! - [`TaskState`] - `Idle → Running ⇄ Paused → Completed`
//! - [`Outcome`] - what a transition did
//! - [`Remaining`] - time or count left before completion
//! - [`TaskSnapshot`] - cloneable read-only view for observers

mod state;
mod task;

pub use state::{Outcome, Remaining, TaskKind, TaskState};
pub use task::{FinishHook, Task, TaskSnapshot};
