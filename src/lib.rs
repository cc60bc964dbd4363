//! # combocube
//!
//! **Combocube** is a tick-driven execution engine for timed and counted
//! action sequences ("combos"), such as workout sets or drill routines.
//!
//! A session is described as a tree of [`Node`]s: combos group other nodes,
//! leaves are timers, countdowns, repetition counters or dice that pick one of
//! those at random. The engine flattens the tree into an ordered queue of
//! [`Task`]s and runs them strictly one after another, driven by a fixed
//! clock tick and by external count events (taps).
//!
//! ## Architecture
//! ### Overview
//! ```text
//!                 ┌───────────────────────────────┐
//!                 │  Node tree (Combo / leaves)   │
//!                 └───────────────┬───────────────┘
//!                                 ▼  expand()
//!                 ┌───────────────────────────────┐
//!                 │ [Task, Task, Task, ...] queue │  (pre-order, loop_count, dice)
//!                 └───────────────┬───────────────┘
//!                                 ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Runner (synchronous state machine)                               │
//! │  - one active task, Clock armed for running time kinds            │
//! │  - pause / resume / stop / increment_count / next / reset / tick  │
//! │  - watch channels: current task snapshot, running flag            │
//! └──────┬─────────────────────────────────────────────────────┬──────┘
//!        │ owned by                                            │ publishes
//!        ▼                                                     ▼
//! ┌──────────────────────────────┐              ┌──────────────────────────────┐
//! │ Engine driver task           │              │ Bus (broadcast channel)      │
//! │ - mpsc command queue         │              └──────────────┬───────────────┘
//! │ - tokio Interval (armed only)│                             ▼
//! └──────────────────────────────┘              ┌──────────────────────────────┐
//!                                               │ SubscriberSet (per-sub queue)│
//!                                               └───┬──────────┬──────────┬────┘
//!                                                   ▼          ▼          ▼
//!                                            ProgressTracker LogWriter  custom
//! ```
//!
//! ### Task lifecycle
//! ```text
//! Idle ──start/resume──► Running ──pause──► Paused ──resume──► Running
//!   ▲                       │                  │
//!   └───────reset───────────┤                  │
//!                           ▼                  ▼
//!          tick→0 / count→target / stop ──► Completed (finish hook fires once)
//! ```
//!
//! ## Features
//! | Area              | Description                                                    | Key types                              |
//! |-------------------|----------------------------------------------------------------|----------------------------------------|
//! | **Model**         | Declarative session trees.                                     | [`Node`], [`NodeKind`], [`NodeId`]     |
//! | **Tasks**         | Per-leaf state machines with finish hooks.                     | [`Task`], [`TaskKind`], [`TaskState`]  |
//! | **Expansion**     | Tree → queue with cycle, depth and size guards.                | [`expand`], [`expand_with`]            |
//! | **Sequencing**    | Synchronous queue runner, usable without an async runtime.     | [`Runner`], [`Clock`]                  |
//! | **Async engine**  | Runner driven in real time on a Tokio task.                    | [`Engine`], [`EngineBuilder`]          |
//! | **Subscriber API**| Hook into run and task events.                                 | [`Subscribe`], [`ProgressTracker`]     |
//! | **Errors**        | Typed errors for expansion and invalid transitions.            | [`EngineError`], [`InvalidTransition`] |
//! | **Configuration** | Tick, capacities, limits, dice seed.                           | [`Config`]                             |
//!
//! ## Optional features
//! - `logging`: exports the built-in [`LogWriter`] subscriber, which writes every
//!   event as a `tracing` record.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use combocube::{Config, Node, Runner};
//!
//! let session = Node::combo(
//!     "warm-up",
//!     [
//!         Node::timer("jumping jacks", Duration::from_secs(2)).shared(),
//!         Node::repetitions("squats", 2).shared(),
//!     ],
//! )
//! .shared();
//!
//! let mut runner = Runner::new(Config::default());
//! runner.run(&session)?;
//!
//! runner.tick();
//! runner.tick();
//! assert_eq!(runner.current().map(|t| t.title()), Some("squats"));
//!
//! runner.increment_count()?;
//! runner.increment_count()?;
//! assert!(!runner.is_running());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
mod core;
mod error;
mod events;
mod model;
mod subscribers;
mod tasks;

// ---- Public re-exports ----

pub use crate::core::{Clock, Config, Engine, EngineBuilder, Runner, expand, expand_with};
pub use error::{EngineError, InvalidTransition};
pub use events::{Bus, Event, EventKind};
pub use model::{Node, NodeId, NodeKind};
pub use subscribers::{Progress, ProgressTracker, Subscribe, SubscriberSet};
pub use tasks::{FinishHook, Outcome, Remaining, Task, TaskKind, TaskSnapshot, TaskState};

// Optional: expose a built-in subscriber that logs events through `tracing`.
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
