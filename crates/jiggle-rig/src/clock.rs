//! Wall-clock frame timing convenience.
//!
//! The simulation types take an explicit delta; this timer derives one from
//! wall-clock time for hosts that don't track their own.

use std::time::Instant;

/// Delta reported by the first tick, before any elapsed time exists.
const NOMINAL_FRAME: f32 = 1.0 / 60.0;

/// Measures elapsed seconds between successive `tick` calls.
#[derive(Debug, Default)]
pub struct FrameTimer {
    last: Option<Instant>,
}

impl FrameTimer {
    /// Creates a timer that has not ticked yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns seconds since the previous tick, or a nominal frame interval
    /// on the first call.
    pub fn tick(&mut self) -> f32 {
        let now = Instant::now();
        let dt = match self.last {
            Some(previous) => now.duration_since(previous).as_secs_f32(),
            None => NOMINAL_FRAME,
        };
        self.last = Some(now);
        dt
    }

    /// Forgets the previous tick; the next tick reports the nominal frame
    /// interval again.
    pub fn restart(&mut self) {
        self.last = None;
    }
}
