//! # Clock arming.
//!
//! The [`Clock`] binds the tick source to at most one task at a time. Each
//! [`arm`](Clock::arm) produces a new generation; ticks stamped with an older
//! generation are stale and must be dropped. This is what keeps a tick that was
//! already in flight for the previous task from decrementing the next one.
//!
//! ```text
//! arm() ─► gen=1 ── tick(gen=1) ✓ ── arm() ─► gen=2 ── tick(gen=1) ✗ stale
//!                                                    └─ tick(gen=2) ✓
//! disarm() ─► no generation is current; every tick is stale
//! ```
//!
//! The clock itself never sleeps. The [`Runner`](crate::Runner) asks it whether a
//! tick applies, and the async [`Engine`](crate::Engine) drives real time with a
//! `tokio::time::Interval` that it resets whenever the generation changes.

use std::time::Duration;

/// Fixed-interval tick arming for the active task.
#[derive(Debug, Clone)]
pub struct Clock {
    interval: Duration,
    generation: u64,
    armed: bool,
}

impl Clock {
    /// Creates a disarmed clock.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            generation: 0,
            armed: false,
        }
    }

    /// Tick length.
    #[inline]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Arms the clock for a new task, invalidating every earlier generation.
    pub fn arm(&mut self) -> u64 {
        self.generation = self.generation.wrapping_add(1);
        self.armed = true;
        self.generation
    }

    /// Cancels the current arming.
    pub fn disarm(&mut self) {
        self.armed = false;
    }

    #[inline]
    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Generation of the latest arming (also after `disarm`).
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns the generation a tick delivered now would carry, if armed.
    #[inline]
    pub fn current(&self) -> Option<u64> {
        self.armed.then_some(self.generation)
    }

    /// True if a tick stamped with `generation` applies to the armed task.
    #[inline]
    pub fn accepts(&self, generation: u64) -> bool {
        self.armed && self.generation == generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rearm_invalidates_previous_generation() {
        let mut clock = Clock::new(Duration::from_secs(1));
        assert!(!clock.is_armed());
        assert_eq!(clock.current(), None);

        let first = clock.arm();
        assert!(clock.accepts(first));

        let second = clock.arm();
        assert_ne!(first, second);
        assert!(!clock.accepts(first));
        assert!(clock.accepts(second));
    }

    #[test]
    fn test_disarm_rejects_everything() {
        let mut clock = Clock::new(Duration::from_millis(50));
        let arming = clock.arm();
        clock.disarm();
        assert!(!clock.accepts(arming));
        assert_eq!(clock.current(), None);
        assert_eq!(clock.generation(), arming);
        assert_eq!(clock.interval(), Duration::from_millis(50));
    }
}
