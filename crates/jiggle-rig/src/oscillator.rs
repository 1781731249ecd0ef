//! Single-axis damped harmonic oscillator.
//!
//! Solves `x'' = stiffness * (target - x) - damping * x'` (unit mass) in
//! closed form, so a step of any size lands exactly on the analytic
//! trajectory instead of accumulating integration error. All three damping
//! regimes are handled; which one applies is entirely up to the stiffness
//! and damping the caller supplies.
//!
//! # Example
//!
//! ```
//! use jiggle_rig::Oscillator;
//!
//! let mut osc = Oscillator::new();
//! osc.configure(0.0, 1.0, 500.0, 45.0);
//! for _ in 0..200 {
//!     osc.advance(16.0);
//! }
//! assert!((osc.value() - 1.0).abs() < 1e-3);
//! ```

/// Damping ratios within this band of 1 are treated as critically damped.
const CRITICAL_BAND: f32 = 1e-4;

/// A damped harmonic oscillator driving one scalar value toward a target.
#[derive(Debug, Clone, Copy, Default)]
pub struct Oscillator {
    value: f32,
    velocity: f32,
    target: f32,
    stiffness: f32,
    damping: f32,
}

impl Oscillator {
    /// Creates an oscillator at rest at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the starting value, target, and spring constants. Velocity is
    /// zeroed.
    pub fn configure(&mut self, from: f32, to: f32, stiffness: f32, damping: f32) {
        self.value = from;
        self.velocity = 0.0;
        self.target = to;
        self.stiffness = stiffness;
        self.damping = damping;
    }

    /// Moves the target, keeping the current value and velocity so motion
    /// stays continuous.
    pub fn retarget(&mut self, to: f32) {
        self.target = to;
    }

    /// Advances the motion by `elapsed_ms` and returns the new value.
    pub fn advance(&mut self, elapsed_ms: f32) -> f32 {
        if self.stiffness <= 0.0 {
            return self.value;
        }
        let t = elapsed_ms / 1000.0;
        let omega = self.stiffness.sqrt();
        let zeta = self.damping / (2.0 * self.stiffness.sqrt());
        let x0 = self.value - self.target;
        let v0 = self.velocity;

        let (x, v) = if (zeta - 1.0).abs() < CRITICAL_BAND {
            critically_damped(x0, v0, omega, t)
        } else if zeta < 1.0 {
            underdamped(x0, v0, omega, zeta, t)
        } else {
            overdamped(x0, v0, omega, zeta, t)
        };

        self.value = self.target + x;
        self.velocity = v;
        self.value
    }

    /// Returns the current value.
    pub fn value(&self) -> f32 {
        self.value
    }

    /// Returns the current velocity (units per second).
    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    /// Returns the current target.
    pub fn target(&self) -> f32 {
        self.target
    }

    /// Returns true once value and velocity are both within `tolerance` of
    /// rest at the target.
    pub fn at_rest(&self, tolerance: f32) -> bool {
        (self.value - self.target).abs() < tolerance && self.velocity.abs() < tolerance
    }
}

fn underdamped(x0: f32, v0: f32, omega: f32, zeta: f32, t: f32) -> (f32, f32) {
    let omega_d = omega * (1.0 - zeta * zeta).sqrt();
    let decay = (-zeta * omega * t).exp();
    let (sin, cos) = (omega_d * t).sin_cos();
    let b = (v0 + zeta * omega * x0) / omega_d;
    let x = decay * (x0 * cos + b * sin);
    let v = decay * ((b * omega_d - x0 * zeta * omega) * cos - (x0 * omega_d + b * zeta * omega) * sin);
    (x, v)
}

fn critically_damped(x0: f32, v0: f32, omega: f32, t: f32) -> (f32, f32) {
    let decay = (-omega * t).exp();
    let slope = v0 + omega * x0;
    let x = decay * (x0 + slope * t);
    let v = decay * (v0 - omega * slope * t);
    (x, v)
}

fn overdamped(x0: f32, v0: f32, omega: f32, zeta: f32, t: f32) -> (f32, f32) {
    let spread = (zeta * zeta - 1.0).sqrt();
    let r1 = omega * (-zeta + spread);
    let r2 = omega * (-zeta - spread);
    let c2 = (v0 - r1 * x0) / (r2 - r1);
    let c1 = x0 - c2;
    let e1 = (r1 * t).exp();
    let e2 = (r2 * t).exp();
    (c1 * e1 + c2 * e2, c1 * r1 * e1 + c2 * r2 * e2)
}
