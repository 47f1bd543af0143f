//! Motion execution - per-pulse phase decisions.

use super::profile::{Direction, MotionPhase};
use super::ramp::{compute_next_interval, RampParameters};

/// How a move ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MoveOutcome {
    /// Every requested step was issued.
    Completed,
    /// A stop request shortened the move; the motor decelerated to rest.
    Stopped,
}

/// Runtime state of one move.
///
/// Call [`MotionExecutor::complete_pulse`] after every emitted step pulse to
/// get the wait before the next one. The executor decides, from the pulses
/// still to go and the current ramp level, whether to accelerate, hold or
/// decelerate so that the last pulse is issued at rest speed.
#[derive(Debug, Clone)]
pub struct MotionExecutor {
    /// Ramp parameters captured when the move started.
    params: RampParameters,

    /// Direction of this move.
    direction: Direction,

    /// Total pulses requested.
    total_steps: u32,

    /// Pulses not yet emitted.
    remaining: u32,

    /// Ramp level: acceleration steps represented by `ramp_interval`.
    level: u32,

    /// Recurrence value at `level`, before clamping to the floor.
    ramp_interval: f64,

    /// Last interval handed out, in microseconds.
    interval: f64,

    /// Intervals handed out so far.
    gaps_issued: u32,

    /// Current phase of motion.
    phase: MotionPhase,

    /// Ramp reached the floor and stopped climbing.
    at_floor: bool,

    /// Stop was requested and cut the move short.
    stopped: bool,
}

impl MotionExecutor {
    /// Create a new executor for a move of `steps` pulses.
    pub fn new(steps: u32, direction: Direction, params: RampParameters) -> Self {
        let phase = if steps == 0 {
            MotionPhase::Idle
        } else if params.starts_at_cruise() {
            MotionPhase::Cruising
        } else {
            MotionPhase::Accelerating
        };

        Self {
            params,
            direction,
            total_steps: steps,
            remaining: steps,
            level: 0,
            ramp_interval: params.first_interval_us,
            interval: params.first_interval_us.max(params.floor_us),
            gaps_issued: 0,
            phase,
            at_floor: false,
            stopped: false,
        }
    }

    /// Check if motion is complete.
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.remaining == 0
    }

    /// Get the total number of steps.
    #[inline]
    pub fn total_steps(&self) -> u32 {
        self.total_steps
    }

    /// Get steps remaining.
    #[inline]
    pub fn steps_remaining(&self) -> u32 {
        self.remaining
    }

    /// Get the current phase.
    #[inline]
    pub fn phase(&self) -> MotionPhase {
        self.phase
    }

    /// Direction of the move.
    #[inline]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Current ramp level (steps needed to decelerate to rest).
    #[inline]
    pub fn level(&self) -> u32 {
        self.level
    }

    /// Last interval handed out, in microseconds.
    #[inline]
    pub fn current_interval_us(&self) -> f64 {
        self.interval
    }

    /// Ramp parameters of this move.
    #[inline]
    pub fn params(&self) -> &RampParameters {
        &self.params
    }

    /// How the move ended (or will end, if it runs out now).
    #[inline]
    pub fn outcome(&self) -> MoveOutcome {
        if self.stopped {
            MoveOutcome::Stopped
        } else {
            MoveOutcome::Completed
        }
    }

    /// Get progress as a fraction (0.0 to 1.0).
    #[inline]
    pub fn progress(&self) -> f32 {
        if self.total_steps == 0 {
            1.0
        } else {
            (self.total_steps - self.remaining) as f32 / self.total_steps as f32
        }
    }

    /// Shorten the move so it ends as soon as the ramp can reach rest.
    ///
    /// Must be called between pulses, right after a pulse was emitted and
    /// before [`MotionExecutor::complete_pulse`] for that pulse.
    pub fn request_stop(&mut self) {
        // The pulse just emitted is still counted in `remaining`; after it,
        // `level` more pulses bring the ramp back down to rest.
        let limit = self.level.saturating_add(1);
        if self.remaining > limit {
            self.remaining = limit;
            self.stopped = true;
        }
    }

    /// Record that a pulse was emitted.
    ///
    /// Returns the wait before the next pulse in microseconds, or `None`
    /// when the move is complete.
    pub fn complete_pulse(&mut self) -> Option<f64> {
        if self.remaining == 0 {
            return None;
        }

        self.remaining -= 1;
        if self.remaining == 0 {
            self.phase = MotionPhase::Idle;
            return None;
        }

        let gap = self.next_interval();
        self.gaps_issued += 1;
        Some(gap)
    }

    fn next_interval(&mut self) -> f64 {
        let floor = self.params.floor_us;

        if self.gaps_issued == 0 {
            // Leaving rest: c0 exactly, unless the floor is already slower.
            if self.params.starts_at_cruise() {
                self.at_floor = true;
                self.phase = MotionPhase::Cruising;
            }
            return self.interval;
        }

        if self.remaining <= self.level {
            self.ramp_interval =
                compute_next_interval(self.level, self.ramp_interval, MotionPhase::Decelerating);
            self.level -= 1;
            self.interval = self.ramp_interval.max(floor);
            self.phase = MotionPhase::Decelerating;
        } else if self.at_floor || self.remaining == self.level + 1 {
            // Hold speed: cruising, or the peak of a short move.
            self.phase = MotionPhase::Cruising;
        } else {
            let next =
                compute_next_interval(self.level, self.ramp_interval, MotionPhase::Accelerating);
            self.ramp_interval = next;
            self.level += 1;
            if next < floor {
                // Speed limit reached. The level still counts this step so
                // the ramp down mirrors the ramp up.
                self.at_floor = true;
                self.interval = floor;
                self.phase = MotionPhase::Cruising;
            } else {
                self.interval = next;
                self.phase = MotionPhase::Accelerating;
            }
        }

        self.interval
    }
}

/// Dry run: yields the interval before each pulse after the first.
impl Iterator for MotionExecutor {
    type Item = f64;

    fn next(&mut self) -> Option<Self::Item> {
        self.complete_pulse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(acceleration: f32, max_speed: f32) -> RampParameters {
        RampParameters::new(acceleration, max_speed, 1).unwrap()
    }

    #[test]
    fn test_executor_complete() {
        let mut executor = MotionExecutor::new(10, Direction::Clockwise, params(2000.0, 1000.0));

        assert!(!executor.is_complete());
        assert_eq!(executor.steps_remaining(), 10);

        // One interval between each pair of pulses
        let gaps = executor.by_ref().count();
        assert_eq!(gaps, 9);
        assert!(executor.is_complete());
        assert_eq!(executor.phase(), MotionPhase::Idle);
        assert_eq!(executor.outcome(), MoveOutcome::Completed);
    }

    #[test]
    fn test_zero_move() {
        let mut executor = MotionExecutor::new(0, Direction::Clockwise, params(2000.0, 1000.0));
        assert!(executor.is_complete());
        assert_eq!(executor.phase(), MotionPhase::Idle);
        assert_eq!(executor.next(), None);
    }

    #[test]
    fn test_single_step_has_no_interval() {
        let mut executor = MotionExecutor::new(1, Direction::Clockwise, params(2000.0, 1000.0));
        assert_eq!(executor.complete_pulse(), None);
        assert!(executor.is_complete());
    }

    #[test]
    fn test_first_interval_is_c0() {
        let p = params(1000.0, 500.0);
        let mut executor = MotionExecutor::new(100, Direction::Clockwise, p);
        let first = executor.next().unwrap();
        assert_eq!(first, p.first_interval_us);
    }

    #[test]
    fn test_short_move_is_symmetric() {
        let gaps: heapless::Vec<f64, 8> =
            MotionExecutor::new(4, Direction::Clockwise, params(1000.0, 500.0)).collect();
        assert_eq!(gaps.len(), 3);
        assert!((gaps[0] - gaps[2]).abs() < 1e-6);
        assert!(gaps[1] < gaps[0]);
    }

    #[test]
    fn test_phase_transitions() {
        let mut executor = MotionExecutor::new(1000, Direction::Clockwise, params(1000.0, 500.0));

        let mut saw_accel = false;
        let mut saw_cruise = false;
        let mut saw_decel = false;

        while executor.complete_pulse().is_some() {
            match executor.phase() {
                MotionPhase::Accelerating => {
                    assert!(!saw_cruise && !saw_decel);
                    saw_accel = true;
                }
                MotionPhase::Cruising => {
                    assert!(!saw_decel);
                    saw_cruise = true;
                }
                MotionPhase::Decelerating => saw_decel = true,
                MotionPhase::Idle => unreachable!(),
            }
        }

        assert!(saw_accel && saw_cruise && saw_decel);
        assert_eq!(executor.level(), 0);
    }

    #[test]
    fn test_ramp_ends_where_it_started() {
        let p = params(1000.0, 500.0);
        let gaps: heapless::Vec<f64, 1024> =
            MotionExecutor::new(1000, Direction::Clockwise, p).collect();
        let last = *gaps.last().unwrap();
        assert!(((last - p.first_interval_us) / p.first_interval_us).abs() < 1e-9);
    }

    #[test]
    fn test_ramp_down_mirrors_ramp_up() {
        let gaps: heapless::Vec<f64, 1024> =
            MotionExecutor::new(1000, Direction::Clockwise, params(1000.0, 500.0)).collect();
        for (up, down) in gaps.iter().zip(gaps.iter().rev()) {
            assert!(((up - down) / up).abs() < 1e-9);
        }
    }

    #[test]
    fn test_stop_decelerates_from_current_level() {
        let mut executor = MotionExecutor::new(10_000, Direction::Clockwise, params(1000.0, 500.0));
        for _ in 0..50 {
            executor.complete_pulse();
        }
        let level = executor.level();
        assert!(level > 0);

        executor.request_stop();
        let mut gaps = 0;
        let mut previous = executor.current_interval_us();
        while let Some(gap) = executor.complete_pulse() {
            assert!(gap >= previous);
            assert_eq!(executor.phase(), MotionPhase::Decelerating);
            previous = gap;
            gaps += 1;
        }

        assert_eq!(gaps, level);
        assert_eq!(executor.outcome(), MoveOutcome::Stopped);
    }

    #[test]
    fn test_stop_at_rest_ends_immediately() {
        let mut executor = MotionExecutor::new(100, Direction::Clockwise, params(1000.0, 500.0));
        executor.request_stop();
        assert_eq!(executor.complete_pulse(), None);
        assert!(executor.is_complete());
        assert_eq!(executor.outcome(), MoveOutcome::Stopped);
    }

    #[test]
    fn test_stop_during_final_ramp_changes_nothing() {
        let mut executor = MotionExecutor::new(6, Direction::Clockwise, params(1000.0, 500.0));
        for _ in 0..4 {
            executor.complete_pulse();
        }
        let remaining = executor.steps_remaining();
        executor.request_stop();
        assert_eq!(executor.steps_remaining(), remaining);
        assert_eq!(executor.outcome(), MoveOutcome::Completed);
    }

    #[test]
    fn test_progress() {
        let mut executor = MotionExecutor::new(4, Direction::CounterClockwise, params(1000.0, 500.0));
        assert_eq!(executor.progress(), 0.0);
        executor.complete_pulse();
        executor.complete_pulse();
        assert!((executor.progress() - 0.5).abs() < 1e-6);
        assert_eq!(executor.direction(), Direction::CounterClockwise);
    }
}
