//! Motion profile planning.
//!
//! Closed-form summary of a symmetric trapezoidal move: how many steps are
//! spent accelerating, cruising and decelerating, and how long it should take.
//! The step-by-step timing itself comes from [`super::ramp`]; this module is
//! what callers use to reason about a move before running it.

use libm::sqrtf;

/// Direction of motor motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Clockwise (forward, positive step count).
    #[default]
    Clockwise,
    /// Counter-clockwise (reverse, negative step count).
    CounterClockwise,
}

impl Direction {
    /// Get direction from signed step count.
    #[inline]
    pub fn from_steps(steps: i64) -> Self {
        if steps >= 0 {
            Direction::Clockwise
        } else {
            Direction::CounterClockwise
        }
    }

    /// Get the sign multiplier.
    #[inline]
    pub fn sign(self) -> i32 {
        match self {
            Direction::Clockwise => 1,
            Direction::CounterClockwise => -1,
        }
    }

    /// Short name for logs.
    #[inline]
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Clockwise => "cw",
            Direction::CounterClockwise => "ccw",
        }
    }
}

/// Current phase of motion execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotionPhase {
    /// No move in progress.
    #[default]
    Idle,
    /// Accelerating from rest toward cruise speed.
    Accelerating,
    /// Moving at constant speed (cruise, or the peak of a short move).
    Cruising,
    /// Decelerating toward rest.
    Decelerating,
}

/// Planned shape of a symmetric trapezoidal move.
#[derive(Debug, Clone, PartialEq)]
pub struct MotionProfile {
    /// Total steps to move (absolute value).
    pub total_steps: u32,

    /// Direction of motion.
    pub direction: Direction,

    /// Steps in acceleration phase.
    pub accel_steps: u32,

    /// Steps in cruise phase (constant speed).
    pub cruise_steps: u32,

    /// Steps in deceleration phase.
    pub decel_steps: u32,

    /// Highest speed reached, in steps/s.
    pub peak_speed: f32,

    /// Acceleration rate in steps/s².
    pub acceleration: f32,
}

impl MotionProfile {
    /// Plan a symmetric trapezoidal move.
    ///
    /// # Arguments
    ///
    /// * `total_steps` - Signed step count (positive = CW, negative = CCW)
    /// * `max_speed` - Maximum speed in steps/s
    /// * `acceleration` - Acceleration and deceleration rate in steps/s²
    pub fn symmetric_trapezoidal(total_steps: i64, max_speed: f32, acceleration: f32) -> Self {
        let direction = Direction::from_steps(total_steps);
        let steps = total_steps.unsigned_abs().min(u64::from(u32::MAX)) as u32;

        if steps == 0 || max_speed <= 0.0 || acceleration <= 0.0 {
            return Self::zero();
        }

        // Distance to reach max speed from rest: d = v² / 2a
        let ramp_steps = (max_speed * max_speed) / (2.0 * acceleration);

        let (accel_steps, cruise_steps, decel_steps, peak_speed) =
            if 2.0 * ramp_steps >= steps as f32 {
                // Triangle profile: max speed is never reached
                let accel_steps = steps / 2;
                let decel_steps = steps - accel_steps;
                let peak = sqrtf(acceleration * steps as f32);
                (accel_steps, 0, decel_steps, peak)
            } else {
                let ramp = ramp_steps as u32;
                (ramp, steps - 2 * ramp, ramp, max_speed)
            };

        Self {
            total_steps: steps,
            direction,
            accel_steps,
            cruise_steps,
            decel_steps,
            peak_speed,
            acceleration,
        }
    }

    /// Create a zero-length profile (no motion).
    pub fn zero() -> Self {
        Self {
            total_steps: 0,
            direction: Direction::Clockwise,
            accel_steps: 0,
            cruise_steps: 0,
            decel_steps: 0,
            peak_speed: 0.0,
            acceleration: 0.0,
        }
    }

    /// Check if this is a zero-length profile.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.total_steps == 0
    }

    /// Whether the move reaches and holds its maximum speed.
    #[inline]
    pub fn is_trapezoidal(&self) -> bool {
        self.cruise_steps > 0
    }

    /// Get the planned phase at a given step number.
    pub fn phase_at(&self, step: u32) -> MotionPhase {
        if step >= self.total_steps {
            MotionPhase::Idle
        } else if step < self.accel_steps {
            MotionPhase::Accelerating
        } else if step < self.accel_steps + self.cruise_steps {
            MotionPhase::Cruising
        } else {
            MotionPhase::Decelerating
        }
    }

    /// Estimate total duration of the move in seconds.
    ///
    /// Each ramp takes `v / a`; the cruise covers the remaining distance at
    /// `v`. For a full trapezoid this equals `d / v + v / a`.
    pub fn estimated_duration_secs(&self) -> f32 {
        if self.total_steps == 0 || self.peak_speed <= 0.0 {
            return 0.0;
        }

        let ramp_time = self.peak_speed / self.acceleration;
        let cruise_time = self.cruise_steps as f32 / self.peak_speed;

        2.0 * ramp_time + cruise_time
    }
}
