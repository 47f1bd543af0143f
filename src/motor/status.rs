//! Motion status shared between the motor and other execution contexts.
//!
//! A [`MotionStatus`] is borrowed by the motor for its whole life. Keep it in
//! a `static` to reach it from an interrupt handler, or on the stack when a
//! scoped thread is the other context.
//!
//! ```rust,ignore
//! static STATUS: MotionStatus = MotionStatus::new();
//!
//! #[interrupt]
//! fn EXTI0() {
//!     STATUS.request_stop();
//! }
//! ```

use portable_atomic::{AtomicBool, Ordering};

use crate::config::units::Steps;
use crate::error::MotorError;
use crate::motion::Direction;

use super::position::Position;

/// Cross-context view of a motor: running flag, stop request, position and
/// last commanded direction.
#[derive(Debug, Default)]
pub struct MotionStatus {
    running: AtomicBool,
    stop_requested: AtomicBool,
    counter_clockwise: AtomicBool,
    position: Position,
}

impl MotionStatus {
    /// Idle status at position 0, direction clockwise.
    pub const fn new() -> Self {
        Self {
            running: AtomicBool::new(false),
            stop_requested: AtomicBool::new(false),
            counter_clockwise: AtomicBool::new(false),
            position: Position::new(0),
        }
    }

    /// True strictly while a move is being executed.
    #[inline]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Ask the running move to decelerate to rest.
    ///
    /// Ignored when no move is running. Safe to call from an interrupt
    /// handler or another thread.
    pub fn request_stop(&self) {
        if self.is_running() {
            self.stop_requested.store(true, Ordering::Release);
        }
    }

    /// Whether a stop has been requested for the running move.
    #[inline]
    pub fn is_stop_requested(&self) -> bool {
        // A request racing with the end of a move must not outlive it.
        self.stop_requested.load(Ordering::Acquire) && self.is_running()
    }

    /// Absolute position in steps.
    #[inline]
    pub fn position(&self) -> Steps {
        self.position.steps()
    }

    /// Position counter.
    #[inline]
    pub fn position_counter(&self) -> &Position {
        &self.position
    }

    /// Last commanded direction.
    #[inline]
    pub fn direction(&self) -> Direction {
        if self.counter_clockwise.load(Ordering::Acquire) {
            Direction::CounterClockwise
        } else {
            Direction::Clockwise
        }
    }

    /// Claim the motor for a new move.
    ///
    /// The stale stop request is cleared before `running` is raised: a
    /// request that lands before the claim is ignored as idle, one that lands
    /// after it belongs to the new move and is kept.
    pub(crate) fn try_begin(&self) -> Result<(), MotorError> {
        if self.is_running() {
            return Err(MotorError::Busy);
        }
        self.stop_requested.store(false, Ordering::Release);
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| MotorError::Busy)?;
        Ok(())
    }

    /// Release the motor at the end of a move.
    pub(crate) fn finish(&self) {
        self.stop_requested.store(false, Ordering::Release);
        self.running.store(false, Ordering::Release);
    }

    pub(crate) fn set_direction(&self, direction: Direction) {
        self.counter_clockwise
            .store(direction == Direction::CounterClockwise, Ordering::Release);
    }

    pub(crate) fn record_step(&self, direction: Direction) {
        self.position.advance(direction);
    }

    pub(crate) fn set_position(&self, steps: Steps) {
        self.position.set(steps);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_ignored_when_idle() {
        let status = MotionStatus::new();
        status.request_stop();
        assert!(!status.is_stop_requested());
    }

    #[test]
    fn test_begin_clears_stop_and_rejects_second_claim() {
        let status = MotionStatus::new();
        status.try_begin().unwrap();
        assert!(status.is_running());

        status.request_stop();
        assert!(status.is_stop_requested());
        assert_eq!(status.try_begin(), Err(MotorError::Busy));

        status.finish();
        assert!(!status.is_running());
        assert!(!status.is_stop_requested());

        status.try_begin().unwrap();
        assert!(!status.is_stop_requested());
    }

    #[test]
    fn test_stop_right_after_claim_survives() {
        let status = MotionStatus::new();

        // Left over from a request racing the end of the previous move.
        status.stop_requested.store(true, Ordering::Release);

        status.try_begin().unwrap();
        assert!(!status.is_stop_requested());

        // Another context sees the motor running and asks it to stop.
        status.request_stop();
        assert!(status.is_stop_requested());

        // A rejected second claim leaves the pending request alone.
        assert_eq!(status.try_begin(), Err(MotorError::Busy));
        assert!(status.is_stop_requested());
    }

    #[test]
    fn test_direction_and_position() {
        let status = MotionStatus::new();
        assert_eq!(status.direction(), Direction::Clockwise);

        status.set_direction(Direction::CounterClockwise);
        status.record_step(Direction::CounterClockwise);
        assert_eq!(status.direction(), Direction::CounterClockwise);
        assert_eq!(status.position(), Steps(-1));

        status.set_position(Steps(42));
        assert_eq!(status.position(), Steps(42));
    }

    #[test]
    fn test_static_status() {
        static STATUS: MotionStatus = MotionStatus::new();
        assert!(!STATUS.is_running());
    }
}
