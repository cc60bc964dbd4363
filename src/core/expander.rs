//! # Tree expansion: combo tree → flat task queue.
//!
//! Walks a node tree depth-first, pre-order, and emits one [`Task`] per leaf.
//! Combos contribute no task of their own; their children are emitted in order,
//! `loop_count` times when [`Config::honor_loop_count`] is set.
//!
//! ```text
//! Combo[A, B, Combo[C, D] ×2, E]  ──►  [A, B, C, D, C, D, E]
//! ```
//!
//! ## Rules
//! - The output never contains a combo; an empty combo yields nothing.
//! - Revisiting a node id that is on the current ancestor path fails with
//!   [`EngineError::CyclicStructure`]. The same node under two different parents
//!   (aliasing) is fine.
//! - Nesting beyond [`Config::max_depth`] fails with [`EngineError::DepthExceeded`].
//! - A result larger than [`Config::max_tasks`] fails with [`EngineError::TooManyTasks`].
//! - Errors discard everything: no partial queue is returned.
//! - Dice nodes resolve here to one of their `possible_kinds`, uniformly at random.
//! - Each task inherits `auto_advance` from its nearest enclosing combo; a leaf
//!   root gets `true`.

use std::sync::Arc;

use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{
    core::Config,
    error::EngineError,
    model::{Node, NodeId, NodeKind},
    tasks::{Task, TaskKind},
};

/// Expands `root` with the default configuration.
pub fn expand(root: &Arc<Node>) -> Result<Vec<Task>, EngineError> {
    let cfg = Config::default();
    let mut rng = StdRng::from_os_rng();
    expand_with(root, &cfg, &mut rng)
}

/// Expands `root` with explicit limits and random source (used for dice).
pub fn expand_with<R: Rng + ?Sized>(
    root: &Arc<Node>,
    cfg: &Config,
    rng: &mut R,
) -> Result<Vec<Task>, EngineError> {
    let mut expander = Expander {
        cfg,
        rng,
        path: Vec::new(),
        out: Vec::new(),
    };
    expander.visit(root, true)?;

    let mut tasks = expander.out;
    for (position, task) in tasks.iter_mut().enumerate() {
        task.set_position(position);
    }
    tracing::debug!(root = %root.id, tasks = tasks.len(), "expanded node tree");
    Ok(tasks)
}

struct Expander<'a, R: Rng + ?Sized> {
    cfg: &'a Config,
    rng: &'a mut R,
    /// Combo ids from the root down to the node being visited.
    path: Vec<NodeId>,
    out: Vec<Task>,
}

impl<R: Rng + ?Sized> Expander<'_, R> {
    fn visit(&mut self, node: &Arc<Node>, auto_advance: bool) -> Result<(), EngineError> {
        if self.path.contains(&node.id) {
            let mut path = self.path.clone();
            path.push(node.id);
            return Err(EngineError::CyclicStructure {
                node: node.id,
                path,
            });
        }

        if node.kind == NodeKind::Combo {
            return self.visit_combo(node);
        }

        if !node.children.is_empty() {
            tracing::warn!(
                node = %node.id,
                kind = %node.kind,
                children = node.children.len(),
                "leaf node carries children; ignoring them"
            );
        }
        if let Some(limit) = self.cfg.task_limit() {
            if self.out.len() >= limit {
                return Err(EngineError::TooManyTasks { limit });
            }
        }

        let kind = self.resolve(node);
        let mut task = Task::new(Arc::clone(node), kind);
        task.set_auto_advance(auto_advance);
        self.out.push(task);
        Ok(())
    }

    fn visit_combo(&mut self, node: &Arc<Node>) -> Result<(), EngineError> {
        if let Some(limit) = self.cfg.depth_limit() {
            if self.path.len() >= limit {
                return Err(EngineError::DepthExceeded { limit });
            }
        }

        let passes = if self.cfg.honor_loop_count {
            node.loops()
        } else {
            1
        };

        self.path.push(node.id);
        for pass in 0..passes {
            let before = self.out.len();
            for child in &node.children {
                self.visit(child, node.auto_advance)?;
            }
            if self.out.len() == before {
                // A pass that yields no tasks yields none on every later pass.
                tracing::debug!(node = %node.id, pass, "combo expands to nothing; skipping repeats");
                break;
            }
        }
        self.path.pop();
        Ok(())
    }

    /// Picks the runtime behaviour of a leaf, rolling the dice if needed.
    fn resolve(&mut self, node: &Node) -> TaskKind {
        if node.kind != NodeKind::Dice {
            return TaskKind::from(node.kind);
        }
        let faces: Vec<NodeKind> = node
            .possible_kinds
            .iter()
            .copied()
            .filter(NodeKind::is_dice_face)
            .collect();
        if faces.is_empty() {
            tracing::warn!(node = %node.id, "dice has no runnable faces; using dummy");
            return TaskKind::Dummy;
        }
        let face = faces[self.rng.random_range(0..faces.len())];
        tracing::debug!(node = %node.id, face = %face, "dice resolved");
        TaskKind::from(face)
    }
}
