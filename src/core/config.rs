//! # Engine configuration.
//!
//! Provides [`Config`] centralized settings for the runner and the async engine.
//!
//! Config is used in two ways:
//! 1. **Synchronous runner**: `Runner::new(config)`
//! 2. **Async engine**: `Engine::builder(config).build()`
//!
//! ## Sentinel values
//! - `max_depth = 0` → unlimited combo nesting (the cycle guard still applies)
//! - `max_tasks = 0` → unlimited queue length
//! - `dice_seed = None` → dice rolls draw from OS entropy

use std::time::Duration;

/// Global configuration for the engine.
///
/// Defines:
/// - **Clock**: the fixed tick interval
/// - **Event system**: bus and command channel capacities
/// - **Expansion**: depth limit, loop-count handling, dice seeding
///
/// ## Field semantics
/// - `tick`: Clock interval and the amount subtracted from `remaining` per tick
/// - `bus_capacity`: Event bus ring buffer size (min 1; clamped by Bus)
/// - `command_capacity`: Engine command queue size (min 1)
/// - `max_depth`: Maximum combo nesting (`0` = unlimited)
/// - `max_tasks`: Maximum expanded queue length (`0` = unlimited)
/// - `honor_loop_count`: Repeat a combo's children `loop_count` times
/// - `dice_seed`: Fixed seed for dice resolution (`None` = random)
#[derive(Clone, Debug)]
pub struct Config {
    /// Tick interval of the clock.
    ///
    /// Each tick subtracts exactly this amount from the active task's
    /// remaining time, regardless of how late the tick was delivered.
    pub tick: Duration,

    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Receivers that lag more than `bus_capacity` events behind observe
    /// `Lagged` and skip older items.
    pub bus_capacity: usize,

    /// Capacity of the async engine's command queue.
    pub command_capacity: usize,

    /// Maximum combo nesting depth.
    ///
    /// - `0` = unlimited
    /// - `n > 0` = expansion fails with `DepthExceeded` below `n` nested combos
    pub max_depth: usize,

    /// Maximum number of tasks a single expansion may produce.
    ///
    /// Guards against runaway `loop_count` values. `0` = unlimited.
    pub max_tasks: usize,

    /// Whether a combo's `loop_count` repeats its children.
    ///
    /// When `false`, every combo is traversed exactly once.
    pub honor_loop_count: bool,

    /// Seed for dice resolution, for reproducible sessions.
    pub dice_seed: Option<u64>,
}

impl Config {
    /// Returns the depth limit as an `Option`.
    ///
    /// - `None` → unlimited
    /// - `Some(n)` → at most `n` nested combos
    #[inline]
    pub fn depth_limit(&self) -> Option<usize> {
        if self.max_depth == 0 {
            None
        } else {
            Some(self.max_depth)
        }
    }

    /// Returns the queue length limit as an `Option`.
    #[inline]
    pub fn task_limit(&self) -> Option<usize> {
        if self.max_tasks == 0 {
            None
        } else {
            Some(self.max_tasks)
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Returns a command capacity clamped to a minimum of 1.
    #[inline]
    pub fn command_capacity_clamped(&self) -> usize {
        self.command_capacity.max(1)
    }

    /// Returns the tick interval, substituting the default for a zero interval.
    ///
    /// A zero interval would never make progress and would spin the engine's clock.
    #[inline]
    pub fn tick_interval(&self) -> Duration {
        if self.tick.is_zero() {
            DEFAULT_TICK
        } else {
            self.tick
        }
    }
}

const DEFAULT_TICK: Duration = Duration::from_secs(1);

impl Default for Config {
    /// Default configuration:
    ///
    /// - `tick = 1s`
    /// - `bus_capacity = 1024`
    /// - `command_capacity = 64`
    /// - `max_depth = 64`
    /// - `max_tasks = 10_000`
    /// - `honor_loop_count = true`
    /// - `dice_seed = None`
    fn default() -> Self {
        Self {
            tick: DEFAULT_TICK,
            bus_capacity: 1024,
            command_capacity: 64,
            max_depth: 64,
            max_tasks: 10_000,
            honor_loop_count: true,
            dice_seed: None,
        }
    }
}
