//! # Node tree data model.
//!
//! The engine consumes an already-materialized tree of [`Node`]s. A node is either
//! a leaf action (timer, countdown, repetition counter, dice, none) or a
//! [`NodeKind::Combo`] holding an ordered list of children.
//!
//! ## Contents
//! - [`Node`] the tree entity plus constructors for every kind
//! - [`NodeId`] opaque node identity used by the cycle guard
//! - [`NodeKind`] closed set of kinds with a `None` fallback for unknown strings

mod kind;
mod node;

pub use kind::NodeKind;
pub use node::{Node, NodeId};
