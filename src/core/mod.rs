//! Runtime core: expansion, sequencing and the async driver.
//!
//! The public API from this module is [`Runner`] (synchronous, tick-driven) and
//! [`Engine`] (the same runner driven in real time on a Tokio task), plus the
//! [`expand`] functions and the shared [`Config`].
//!
//! Internal modules:
//! - [`expander`]: flattens a node tree into an ordered task queue;
//! - [`clock`]: tick arming with generations;
//! - [`runner`]: the sequential queue state machine;
//! - [`engine`]: command queue, interval loop and subscriber fan-out;
//! - [`builder`]: engine construction.

mod builder;
mod clock;
mod config;
mod engine;
mod expander;
mod runner;

pub use builder::EngineBuilder;
pub use clock::Clock;
pub use config::Config;
pub use engine::Engine;
pub use expander::{expand, expand_with};
pub use runner::Runner;
