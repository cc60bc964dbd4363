//! Error types used by the combocube engine.
//!
//! This module defines two error types:
//!
//! - [`EngineError`]: failures that abort an engine operation (a `run()` call
//!   or a request sent to a closed [`Engine`](crate::Engine)).
//! - [`InvalidTransition`]: a task operation that does not apply to the task's
//!   kind or state. It is never fatal: the runner logs it, counts it and moves on.
//!
//! Both types provide helper methods (`as_label`, `as_message`) for logging/metrics.

use thiserror::Error;

use crate::model::NodeId;
use crate::tasks::{TaskKind, TaskState};

/// # Errors produced by the engine.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The node tree revisits a node that is already on the current path.
    ///
    /// Raised by the expander; no partial queue is produced.
    #[error("cyclic structure: node {node} is its own ancestor (path: {path:?})")]
    CyclicStructure {
        /// The node that was reached twice.
        node: NodeId,
        /// Ancestor path from the root down to the repeated node.
        path: Vec<NodeId>,
    },

    /// Combo nesting exceeds [`Config::max_depth`](crate::Config::max_depth).
    #[error("combo nesting exceeds the depth limit of {limit}")]
    DepthExceeded {
        /// The configured limit.
        limit: usize,
    },

    /// Expansion would produce more than [`Config::max_tasks`](crate::Config::max_tasks) tasks.
    #[error("expansion exceeds the task limit of {limit}")]
    TooManyTasks {
        /// The configured limit.
        limit: usize,
    },

    /// A control command sent through the async engine did not apply.
    #[error(transparent)]
    Transition(#[from] InvalidTransition),

    /// The async engine is no longer running (shut down or its driver exited).
    #[error("engine is closed")]
    Closed,
}

impl EngineError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use combocube::{EngineError, NodeId};
    ///
    /// let err = EngineError::CyclicStructure { node: NodeId::from(7), path: vec![] };
    /// assert_eq!(err.as_label(), "cyclic_structure");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            EngineError::CyclicStructure { .. } => "cyclic_structure",
            EngineError::DepthExceeded { .. } => "depth_exceeded",
            EngineError::TooManyTasks { .. } => "too_many_tasks",
            EngineError::Transition(err) => err.as_label(),
            EngineError::Closed => "engine_closed",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            EngineError::CyclicStructure { node, path } => {
                format!("cycle at node={node}; path={path:?}")
            }
            EngineError::DepthExceeded { limit } => format!("depth limit={limit} exceeded"),
            EngineError::TooManyTasks { limit } => format!("task limit={limit} exceeded"),
            EngineError::Transition(err) => err.as_message(),
            EngineError::Closed => "engine closed".to_string(),
        }
    }
}

/// # A task operation that does not apply.
///
/// Examples: `increment_count()` on a timer, `tick()` on a repetition counter,
/// `pause()` on a completed task. Idempotent repeats (pausing a paused task)
/// are **not** reported here; they return `Outcome::Unchanged`.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("invalid transition: {op} on {kind} task in state {state}")]
pub struct InvalidTransition {
    /// Name of the attempted operation.
    pub op: &'static str,
    /// Kind of the task the operation was applied to.
    pub kind: TaskKind,
    /// State of the task when the operation was attempted.
    pub state: TaskState,
}

impl InvalidTransition {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        "invalid_transition"
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        format!(
            "op={} kind={} state={}",
            self.op,
            self.kind.as_label(),
            self.state.as_label()
        )
    }
}
