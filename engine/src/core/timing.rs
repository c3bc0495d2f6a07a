//! Millisecond timestamps and clocks for reaction-time measurement.
//!
//! Engines never read a clock themselves: every signal that needs a time
//! carries an [`InstantStamp`] supplied by the caller.

use std::time::Instant;

use serde::{Deserialize, Serialize};

/// A point on a caller-chosen monotonic timeline, in milliseconds.
#[derive(Debug, Default, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct InstantStamp(f64);

impl InstantStamp {
    pub const ZERO: Self = Self(0.0);

    pub fn from_millis(ms: f64) -> Self {
        Self(ms)
    }

    pub fn as_millis(self) -> f64 {
        self.0
    }

    /// Elapsed milliseconds since `earlier`; clock skew never yields a negative RT.
    pub fn millis_since(self, earlier: InstantStamp) -> f64 {
        (self.0 - earlier.0).max(0.0)
    }

    pub fn offset(self, ms: f64) -> Self {
        Self(self.0 + ms)
    }
}

/// Source of monotonic timestamps.
pub trait Clock {
    fn now(&self) -> InstantStamp;
}

/// Wall clock anchored at construction.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> InstantStamp {
        InstantStamp(self.origin.elapsed().as_secs_f64() * 1000.0)
    }
}

/// Hand-advanced clock for scripted sessions and simulations.
#[derive(Debug, Default, Clone, Copy)]
pub struct ManualClock {
    now: InstantStamp,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance_ms(&mut self, ms: f64) -> InstantStamp {
        self.now = self.now.offset(ms.max(0.0));
        self.now
    }
}

impl Clock for ManualClock {
    fn now(&self) -> InstantStamp {
        self.now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn millis_since_never_goes_negative() {
        let early = InstantStamp::from_millis(1_000.0);
        let late = InstantStamp::from_millis(1_420.0);
        assert_eq!(late.millis_since(early), 420.0);
        assert_eq!(early.millis_since(late), 0.0);
    }

    #[test]
    fn manual_clock_only_moves_forward() {
        let mut clock = ManualClock::new();
        clock.advance_ms(250.0);
        clock.advance_ms(-40.0);
        assert_eq!(clock.now().as_millis(), 250.0);
    }

    #[test]
    fn monotonic_clock_is_non_decreasing() {
        let clock = MonotonicClock::new();
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }
}
