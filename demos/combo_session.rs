//! # Example: combo_session
//!
//! Runs a short workout through the async [`Engine`] with a fast clock.
//!
//! Shows how to:
//! - Build a node tree with nested combos, `loop_count` and a dice.
//! - Attach [`LogWriter`] and [`ProgressTracker`] subscribers.
//! - Feed count events (taps) while repetition tasks are active.
//! - Wait for the run to finish through the running watch channel.
//!
//! ## Flow
//! ```text
//! Node tree ──► Engine::run() ──► Runner expands ──► tasks run in order
//!                                        │
//!                                        └─► Bus ──► LogWriter (tracing)
//!                                                └─► ProgressTracker
//! tapper task ──► Engine::increment_count() while a repetition task is active
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=info cargo run --example combo_session --features logging
//! ```

use std::{sync::Arc, time::Duration};

use combocube::{Config, Engine, LogWriter, Node, NodeKind, ProgressTracker, Subscribe, TaskKind};
use tracing_subscriber::EnvFilter;

fn leg_day() -> Arc<Node> {
    let circuit = Node::combo(
        "circuit",
        [
            Node::repetitions("squats", 5).shared(),
            Node::timer("wall sit", Duration::from_secs(3)).shared(),
            Node::dice("wildcard", [NodeKind::Timer, NodeKind::RepetitionCount])
                .with_duration(Duration::from_secs(2))
                .with_target_count(3)
                .shared(),
        ],
    )
    .with_loop_count(2)
    .shared();

    Node::combo(
        "leg day",
        [
            Node::countdown("get ready", Duration::from_secs(3)).shared(),
            circuit,
            Node::timer("stretch", Duration::from_secs(4)).shared(),
        ],
    )
    .shared()
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cfg = Config {
        tick: Duration::from_millis(100),
        ..Config::default()
    };
    let progress = Arc::new(ProgressTracker::new());
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new()), progress.clone()];
    let engine = Engine::builder(cfg).with_subscribers(subs).build();

    let queued = engine.run(leg_day()).await?;
    println!("queued {queued} tasks");

    let tapper = {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(Duration::from_millis(150));
            loop {
                tick.tick().await;
                if !engine.is_running() {
                    break;
                }
                let counting = engine
                    .current()
                    .is_some_and(|t| t.kind == TaskKind::RepetitionCount);
                if counting {
                    let _ = engine.increment_count().await;
                }
            }
        })
    };

    let mut running = engine.watch_running();
    while *running.borrow_and_update() {
        running.changed().await?;
    }
    tapper.await?;

    let view = progress.snapshot();
    println!("completed {}/{} tasks", view.completed, view.total);
    engine.shutdown().await;
    Ok(())
}
