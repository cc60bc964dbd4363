//! # Built-in subscribers
//!
//! Small, self-contained implementations useful for demos and debugging.
//!
//! - [`LogWriter`]: writes every event as a structured `tracing` record.

#[cfg(feature = "logging")]
mod log;

#[cfg(feature = "logging")]
pub use log::LogWriter;
