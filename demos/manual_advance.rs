//! # Example: manual_advance
//!
//! Drives a [`Runner`] by hand, without an async runtime.
//!
//! The drill combo has `auto_advance` disabled, so after each task the runner
//! holds at an advance gate until `next()` is called. The demo also shows a
//! rejected operation (a tap on a timer) and a reset of a gated task.
//!
//! ## Run
//! ```bash
//! cargo run --example manual_advance
//! ```

use std::time::Duration;

use combocube::{Config, Node, Outcome, Runner};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let drill = Node::combo(
        "drill",
        [
            Node::timer("footwork", Duration::from_secs(3)).shared(),
            Node::repetitions("jab-cross", 2).shared(),
            Node::timer("shadow boxing", Duration::from_secs(2)).shared(),
        ],
    )
    .with_auto_advance(false)
    .shared();

    let mut runner = Runner::new(Config::default());
    runner.run(&drill)?;
    let mut redone = false;

    while runner.is_running() {
        let Some(task) = runner.current() else { break };
        println!(
            "[{}] {} ({}) remaining={:?}",
            task.position(),
            task.title(),
            task.kind(),
            task.remaining()
        );

        if runner.is_awaiting_advance() {
            println!("  gate: press next");
            runner.next();
            continue;
        }

        let outcome = if task.kind().is_time_based() {
            runner.tick()
        } else {
            runner.increment_count()?
        };

        let on_jab_cross = runner.current().is_some_and(|t| t.title() == "jab-cross");
        if outcome == Outcome::Completed && on_jab_cross && !redone {
            println!("  redo jab-cross once more");
            redone = true;
            runner.reset()?;
            runner.resume()?;
        }
    }

    // A tap with a timer active is rejected and counted, not fatal.
    runner.run(&Node::timer("cool down", Duration::from_secs(1)).shared())?;
    if let Err(err) = runner.increment_count() {
        println!("rejected: {err}");
    }
    runner.tick();

    println!(
        "done; running={} rejected={}",
        runner.is_running(),
        runner.invalid_transitions()
    );
    Ok(())
}
