//! Frame timing utilities
//!
//! The transport pump and the fixed-step update loop that drive this
//! library live in the caller; these clocks give them monotonic frame
//! deltas and fixed-step accumulation.

use std::time::Instant;

/// Per-frame delta clock over the steady system clock
///
/// Deltas are clamped to `max_delta` so a debugger pause or long hitch
/// does not flood the fixed stepper, then scaled by `time_scale`.
pub struct FrameClock {
    prev: Instant,
    /// Largest raw delta passed through, in seconds
    pub max_delta: f64,
    /// Multiplier applied to clamped deltas
    pub time_scale: f64,
}

impl FrameClock {
    pub fn new() -> Self {
        FrameClock {
            prev: Instant::now(),
            max_delta: 0.25,
            time_scale: 1.0,
        }
    }

    /// Seconds since the previous tick, clamped and scaled
    pub fn tick(&mut self) -> f64 {
        let now = Instant::now();
        let dt = now.duration_since(self.prev).as_secs_f64();
        self.prev = now;

        dt.clamp(0.0, self.max_delta) * self.time_scale
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixed-step accumulator
///
/// Feed it frame deltas; it yields one `step()` per elapsed fixed
/// interval and an interpolation fraction for rendering between steps.
pub struct FixedStepper {
    /// Fixed interval in seconds
    pub fixed_delta: f64,
    /// Unconsumed time in seconds
    pub accumulator: f64,
}

impl FixedStepper {
    pub fn new(fixed_delta: f64) -> Self {
        FixedStepper {
            fixed_delta,
            accumulator: 0.0,
        }
    }

    /// Accumulate a frame delta
    pub fn add_time(&mut self, dt: f64) {
        self.accumulator += dt;
    }

    /// Consume one fixed interval if enough time has accumulated
    pub fn step(&mut self) -> bool {
        if self.accumulator >= self.fixed_delta {
            self.accumulator -= self.fixed_delta;
            true
        } else {
            false
        }
    }

    /// Fraction of the next step already accumulated, for interpolation
    pub fn alpha(&self) -> f64 {
        if self.fixed_delta > 0.0 {
            self.accumulator / self.fixed_delta
        } else {
            0.0
        }
    }
}

impl Default for FixedStepper {
    fn default() -> Self {
        Self::new(1.0 / 60.0)
    }
}
