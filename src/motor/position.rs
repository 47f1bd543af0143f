//! Position tracking for stepper motors.
//!
//! Absolute position in steps, readable from any context while a move runs.

use portable_atomic::{AtomicI32, Ordering};

use crate::config::units::{Degrees, Steps};
use crate::motion::Direction;

/// Motor position counter.
///
/// Counts emitted step pulses, +1 clockwise and -1 counter-clockwise. Wraps
/// at the `i32` bounds like a hardware counter.
#[derive(Debug, Default)]
pub struct Position {
    steps: AtomicI32,
}

impl Position {
    /// Create a position counter at `steps`.
    #[inline]
    pub const fn new(steps: i32) -> Self {
        Self {
            steps: AtomicI32::new(steps),
        }
    }

    /// Get current position in steps.
    #[inline]
    pub fn steps(&self) -> Steps {
        Steps(self.steps.load(Ordering::Acquire))
    }

    /// Get current position in degrees.
    #[inline]
    pub fn degrees(&self, steps_per_revolution: u32) -> Degrees {
        self.steps().to_degrees(steps_per_revolution)
    }

    /// Overwrite the position.
    #[inline]
    pub(crate) fn set(&self, steps: Steps) {
        self.steps.store(steps.0, Ordering::Release);
    }

    /// Count one emitted pulse in `direction`.
    #[inline]
    pub(crate) fn advance(&self, direction: Direction) {
        // Only the motor that owns the status writes; fetch_add keeps the
        // update a single atomic step for readers.
        self.steps.fetch_add(direction.sign(), Ordering::AcqRel);
    }

    /// Steps from the current position to `target`, computed without overflow.
    #[inline]
    pub fn delta_to(&self, target: Steps) -> i64 {
        i64::from(target.0) - i64::from(self.steps().0)
    }
}
