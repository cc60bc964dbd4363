//! # Tree entity.
//!
//! A [`Node`] is handed to the engine fully materialized: children are resolved
//! nodes, not identifiers. Children are held as `Arc<Node>` so a store may alias
//! one node under several parents; identity for the cycle guard is the
//! [`NodeId`], not the pointer.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use combocube::{Node, NodeKind};
//!
//! let warmup = Node::combo("warm-up", [
//!     Node::timer("jog", Duration::from_secs(60)).shared(),
//!     Node::repetitions("squats", 20).shared(),
//! ])
//! .with_loop_count(2);
//!
//! assert_eq!(warmup.kind, NodeKind::Combo);
//! assert_eq!(warmup.children.len(), 2);
//! assert_eq!(warmup.loops(), 2);
//! ```

use std::fmt;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::Duration;

use super::kind::NodeKind;

/// Counter backing [`NodeId::next`].
static NODE_SEQ: AtomicU64 = AtomicU64::new(1);

/// Opaque node identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    /// Allocates a fresh process-unique id.
    pub fn next() -> Self {
        Self(NODE_SEQ.fetch_add(1, AtomicOrdering::Relaxed))
    }

    /// Returns the raw value.
    #[inline]
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl From<u64> for NodeId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A timed/counted action or an ordered group of them.
///
/// Fields that do not apply to the node's kind are ignored:
/// - `duration`: Timer, Countdown (and Dice landing on them); zero = run until stopped
/// - `target_count`: RepetitionCount (and Dice landing on it); zero = never auto-complete
/// - `loop_count`, `auto_advance`, `children`: Combo
/// - `possible_kinds`: Dice
#[derive(Debug, Clone)]
pub struct Node {
    /// Identity used for cycle detection.
    pub id: NodeId,
    /// Display label, carried into events.
    pub title: Arc<str>,
    /// Node classification.
    pub kind: NodeKind,
    /// Countdown length.
    pub duration: Duration,
    /// Number of count events that completes a repetition task.
    pub target_count: u32,
    /// How many times a combo's children are expanded (`None` = once).
    pub loop_count: Option<NonZeroU32>,
    /// Whether the runner moves past this combo's children without a manual `next()`.
    pub auto_advance: bool,
    /// Kinds a dice node may resolve to.
    pub possible_kinds: Vec<NodeKind>,
    /// Ordered children (combo only).
    pub children: Vec<Arc<Node>>,
}

impl Node {
    /// Creates a node of `kind` with a fresh id and neutral parameters.
    pub fn new(kind: NodeKind, title: impl Into<Arc<str>>) -> Self {
        Self {
            id: NodeId::next(),
            title: title.into(),
            kind,
            duration: Duration::ZERO,
            target_count: 0,
            loop_count: None,
            auto_advance: true,
            possible_kinds: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Creates a combo over `children` (in order).
    pub fn combo(
        title: impl Into<Arc<str>>,
        children: impl IntoIterator<Item = Arc<Node>>,
    ) -> Self {
        Self::new(NodeKind::Combo, title).with_children(children)
    }

    /// Creates a timer counting `duration` down.
    pub fn timer(title: impl Into<Arc<str>>, duration: Duration) -> Self {
        Self::new(NodeKind::Timer, title).with_duration(duration)
    }

    /// Creates a countdown of `duration`.
    pub fn countdown(title: impl Into<Arc<str>>, duration: Duration) -> Self {
        Self::new(NodeKind::Countdown, title).with_duration(duration)
    }

    /// Creates a repetition counter completing after `target` count events.
    pub fn repetitions(title: impl Into<Arc<str>>, target: u32) -> Self {
        Self::new(NodeKind::RepetitionCount, title).with_target_count(target)
    }

    /// Creates a dice node landing on one of `kinds`.
    pub fn dice(title: impl Into<Arc<str>>, kinds: impl IntoIterator<Item = NodeKind>) -> Self {
        let mut node = Self::new(NodeKind::Dice, title);
        node.possible_kinds = kinds.into_iter().collect();
        node
    }

    /// Creates a placeholder node.
    pub fn none(title: impl Into<Arc<str>>) -> Self {
        Self::new(NodeKind::None, title)
    }

    /// Returns the node with an explicit id.
    pub fn with_id(mut self, id: impl Into<NodeId>) -> Self {
        self.id = id.into();
        self
    }

    /// Returns the node with an updated duration.
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Returns the node with an updated repetition target.
    pub fn with_target_count(mut self, target: u32) -> Self {
        self.target_count = target;
        self
    }

    /// Returns the node with an updated loop count (`0` clears it).
    pub fn with_loop_count(mut self, count: u32) -> Self {
        self.loop_count = NonZeroU32::new(count);
        self
    }

    /// Returns the node with an updated auto-advance flag.
    pub fn with_auto_advance(mut self, enabled: bool) -> Self {
        self.auto_advance = enabled;
        self
    }

    /// Appends `children` to the node.
    pub fn with_children(mut self, children: impl IntoIterator<Item = Arc<Node>>) -> Self {
        self.children.extend(children);
        self
    }

    /// Wraps the node in an `Arc` for use as a child or a run root.
    pub fn shared(self) -> Arc<Node> {
        Arc::new(self)
    }

    /// Number of passes over a combo's children (at least 1).
    #[inline]
    pub fn loops(&self) -> u32 {
        self.loop_count.map_or(1, NonZeroU32::get)
    }

    /// Total number of leaf nodes under this node, counting loops; cycles are not followed.
    ///
    /// Saturates instead of overflowing on pathological loop counts.
    pub fn leaf_count(&self) -> usize {
        let mut path = Vec::new();
        self.leaf_count_inner(&mut path)
    }

    fn leaf_count_inner(&self, path: &mut Vec<NodeId>) -> usize {
        if self.kind.is_leaf() {
            return 1;
        }
        if path.contains(&self.id) {
            return 0;
        }
        path.push(self.id);
        let once = self
            .children
            .iter()
            .fold(0usize, |acc, c| acc.saturating_add(c.leaf_count_inner(path)));
        path.pop();
        once.saturating_mul(self.loops() as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        let a = Node::none("a");
        let b = Node::none("b");
        assert_ne!(a.id, b.id);
        assert_eq!(Node::none("c").with_id(42).id, NodeId::from(42));
    }

    #[test]
    fn test_constructors_set_parameters() {
        let t = Node::timer("t", Duration::from_secs(10));
        assert_eq!(t.kind, NodeKind::Timer);
        assert_eq!(t.duration, Duration::from_secs(10));
        assert!(t.children.is_empty());

        let r = Node::repetitions("r", 12);
        assert_eq!(r.kind, NodeKind::RepetitionCount);
        assert_eq!(r.target_count, 12);

        let d = Node::dice("d", [NodeKind::Timer, NodeKind::Countdown]);
        assert_eq!(d.possible_kinds, vec![NodeKind::Timer, NodeKind::Countdown]);
        assert!(d.auto_advance);
    }

    #[test]
    fn test_loop_count_zero_clears() {
        let c = Node::combo("c", []).with_loop_count(0);
        assert_eq!(c.loop_count, None);
        assert_eq!(c.loops(), 1);
        assert_eq!(c.with_loop_count(3).loops(), 3);
    }

    #[test]
    fn test_leaf_count_follows_loops() {
        let inner = Node::combo(
            "inner",
            [Node::none("x").shared(), Node::none("y").shared()],
        )
        .with_loop_count(3)
        .shared();
        let root = Node::combo("root", [Node::none("a").shared(), inner]);
        assert_eq!(root.leaf_count(), 7);
    }

    #[test]
    fn test_leaf_count_ignores_cycles() {
        let back = Node::combo("back", [Node::none("leaf").shared()])
            .with_id(1)
            .shared();
        let root = Node::combo("root", [back]).with_id(1);
        assert_eq!(root.leaf_count(), 0);
    }
}
