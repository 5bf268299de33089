//! Simulation Clock
//!
//! Converts elapsed wall time into a count of fixed simulation ticks. The
//! simulation itself only ever sees whole ticks.

use std::time::Duration;

use tracing::warn;

use crate::config::ArenaConfig;

/// Fixed-step accumulator.
#[derive(Clone, Debug)]
pub struct SimClock {
    tick_duration: Duration,
    accumulator: Duration,
    max_catch_up: u32,
    dropped: u64,
}

impl SimClock {
    /// Clock running at `tick_rate` Hz, running at most `max_catch_up`
    /// ticks per advance.
    pub fn new(tick_rate: u32, max_catch_up: u32) -> Self {
        Self {
            tick_duration: Duration::from_secs(1) / tick_rate.max(1),
            accumulator: Duration::ZERO,
            max_catch_up: max_catch_up.max(1),
            dropped: 0,
        }
    }

    /// Clock for a match configuration.
    pub fn from_config(config: &ArenaConfig) -> Self {
        Self::new(config.tick_rate, config.max_catch_up_ticks)
    }

    /// Length of one tick.
    pub fn tick_duration(&self) -> Duration {
        self.tick_duration
    }

    /// Ticks skipped because the caller fell too far behind.
    pub fn dropped_ticks(&self) -> u64 {
        self.dropped
    }

    /// Add elapsed time and return how many ticks are due.
    ///
    /// Any backlog beyond the catch-up cap is discarded.
    pub fn advance(&mut self, elapsed: Duration) -> u32 {
        self.accumulator += elapsed;

        let mut due = 0;
        while self.accumulator >= self.tick_duration && due < self.max_catch_up {
            self.accumulator -= self.tick_duration;
            due += 1;
        }

        if self.accumulator >= self.tick_duration {
            let skipped = (self.accumulator.as_nanos() / self.tick_duration.as_nanos()) as u64;
            self.dropped += skipped;
            self.accumulator = Duration::from_nanos(
                (self.accumulator.as_nanos() % self.tick_duration.as_nanos()) as u64,
            );
            warn!(skipped, "simulation behind, dropping ticks");
        }

        due
    }

    /// Fraction of the next tick already elapsed, for render interpolation.
    pub fn alpha(&self) -> f32 {
        self.accumulator.as_secs_f32() / self.tick_duration.as_secs_f32()
    }
}
