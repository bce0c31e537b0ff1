//! Tick Clock
//!
//! Fixed-period accumulator. The caller feeds measured elapsed time; the
//! clock answers how many whole ticks are due and keeps the remainder.
//! Stalls are not compressed: 0.35 s at a 0.1 s period is three ticks with
//! 0.05 s carried over.

use std::time::Duration;

/// Elapsed-time accumulator for a fixed tick period.
#[derive(Debug, Clone)]
pub struct TickClock {
    period: Duration,
    accumulated: Duration,
}

impl TickClock {
    /// Create a clock. `period` must be non-zero.
    pub fn new(period: Duration) -> Self {
        debug_assert!(!period.is_zero(), "tick period must be non-zero");
        Self {
            period,
            accumulated: Duration::ZERO,
        }
    }

    /// The tick period.
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Time accumulated toward the next tick.
    pub fn carry(&self) -> Duration {
        self.accumulated
    }

    /// Add elapsed time and return the number of ticks now due.
    pub fn advance(&mut self, elapsed: Duration) -> u32 {
        self.accumulated = self.accumulated.saturating_add(elapsed);
        let due = self
            .accumulated
            .as_nanos()
            .checked_div(self.period.as_nanos())
            .unwrap_or(0);
        let due = u32::try_from(due).unwrap_or(u32::MAX);
        self.accumulated = self.accumulated.saturating_sub(self.period.saturating_mul(due));
        due
    }
}
