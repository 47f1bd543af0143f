//! Step-interval recurrence for constant-acceleration ramps.
//!
//! Implements the real-time speed profile from D. Austin, "Generate
//! stepper-motor speed profiles in real time" (2005). With `c0` the wait
//! before the first step from rest, the exact interval before step `n` is
//!
//! ```text
//! c(n) = c0 · (sqrt(n + 1) - sqrt(n))
//! ```
//!
//! and a first-order expansion turns that into a square-root-free update:
//!
//! ```text
//! accelerating:  c(n)   = c(n-1) - 2·c(n-1) / (4n + 1)
//! decelerating:  c(n-1) = c(n)   + 2·c(n)   / (4n - 1)
//! ```
//!
//! The expansion is poor for the very first step, so the `n = 1` update is
//! seeded from `0.676 · c0` instead of `c0`. With that correction the
//! recurrence stays within 2.1% of the exact value at `n = 1` and within
//! 0.1% from `n = 7` on.

use libm::sqrt;

use crate::error::MotionError;
use crate::time::MAX_SCHEDULE_US;

use super::profile::MotionPhase;

/// Microseconds per second; scales `sqrt(2 / a)` into a microsecond interval.
pub const TICKS_PER_SECOND: f64 = 1_000_000.0;

/// Austin's first-step correction factor.
pub const FIRST_STEP_CORRECTION: f64 = 0.676;

/// Wait before the first step from rest, in microseconds: `T0 · sqrt(2 / a)`.
#[inline]
pub fn first_interval(acceleration: f32) -> f64 {
    TICKS_PER_SECOND * sqrt(2.0 / f64::from(acceleration))
}

/// Interval at constant `speed` steps/s, in microseconds.
#[inline]
pub fn cruise_interval(speed: f32) -> f64 {
    TICKS_PER_SECOND / f64::from(speed)
}

/// Closed-form interval before step `n` of a ramp starting with `first`.
///
/// Used as the reference the recurrence is checked against; the engine never
/// calls it per step.
#[inline]
pub fn exact_interval(first: f64, n: u32) -> f64 {
    let n = f64::from(n);
    first * (sqrt(n + 1.0) - sqrt(n))
}

/// Advance the recurrence by one step.
///
/// `level` is the ramp level of `current` (the number of acceleration steps
/// it represents) and `phase` selects the direction of the update:
///
/// - [`MotionPhase::Accelerating`]: returns the interval for `level + 1`.
///   At level 0 `current` must be `c0`; the corrected seed is applied here.
/// - [`MotionPhase::Decelerating`]: returns the interval for `level - 1`.
///   Leaving level 1 yields `c0` again, mirroring the start of the ramp.
/// - anything else holds `current`.
pub fn compute_next_interval(level: u32, current: f64, phase: MotionPhase) -> f64 {
    match phase {
        MotionPhase::Accelerating => {
            let base = if level == 0 {
                current * FIRST_STEP_CORRECTION
            } else {
                current
            };
            let n = f64::from(level) + 1.0;
            base - (2.0 * base) / (4.0 * n + 1.0)
        }
        MotionPhase::Decelerating if level == 1 => {
            // Exact inverse of the seeded first update: c1 = 0.6 · 0.676 · c0.
            current * (5.0 / 3.0) / FIRST_STEP_CORRECTION
        }
        MotionPhase::Decelerating if level > 1 => {
            let n = f64::from(level);
            current + (2.0 * current) / (4.0 * n - 1.0)
        }
        _ => current,
    }
}

/// Ramp parameters captured at the start of a move.
///
/// Changing the motor's acceleration or speed while a move is in flight does
/// not touch these, so the running ramp never jumps.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RampParameters {
    /// Acceleration in steps/s².
    pub acceleration: f32,
    /// Maximum speed in steps/s.
    pub max_speed: f32,
    /// First interval `c0` in microseconds.
    pub first_interval_us: f64,
    /// Shortest interval the ramp may produce: `max(cMin, pulse width)`.
    pub floor_us: f64,
}

impl RampParameters {
    /// Derive ramp parameters, rejecting values that cannot be scheduled.
    ///
    /// Acceleration and speed are expected to be positive (the motor's
    /// setters enforce that); anything yielding a non-finite interval or one
    /// longer than [`MAX_SCHEDULE_US`] is rejected here.
    pub fn new(
        acceleration: f32,
        max_speed: f32,
        pulse_width_us: u16,
    ) -> Result<Self, MotionError> {
        let first_interval_us = first_interval(acceleration);
        let cruise_us = cruise_interval(max_speed);

        for interval in [first_interval_us, cruise_us] {
            if !(interval.is_finite() && interval > 0.0 && interval <= f64::from(MAX_SCHEDULE_US)) {
                return Err(MotionError::IntervalOutOfRange {
                    interval_us: interval as f32,
                    max_us: MAX_SCHEDULE_US as f32,
                });
            }
        }

        let floor_us = cruise_us.max(f64::from(pulse_width_us));

        Ok(Self {
            acceleration,
            max_speed,
            first_interval_us,
            floor_us,
        })
    }

    /// Whether the motor can start directly at cruise speed.
    #[inline]
    pub fn starts_at_cruise(&self) -> bool {
        self.first_interval_us <= self.floor_us
    }
}
