//! Stepper motor driver.
//!
//! Generic over embedded-hal 1.0 pin types and a [`Clock`].

use core::convert::Infallible;

use embedded_hal::digital::{ErrorType, OutputPin};

use crate::config::units::{Degrees, Steps};
use crate::config::{validate_motor, MotorConfig};
use crate::error::{ConfigError, Error, MotorError, Result};
use crate::motion::{Direction, MotionExecutor, MotionPhase, MotionProfile, MoveOutcome, RampParameters};
use crate::time::{deadline_reached, Clock, Schedule};

use super::pulse::PulseGuard;
use super::status::MotionStatus;

/// Placeholder for an absent ENABLE pin.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPin;

impl ErrorType for NoPin {
    type Error = Infallible;
}

impl OutputPin for NoPin {
    fn set_low(&mut self) -> core::result::Result<(), Self::Error> {
        Ok(())
    }

    fn set_high(&mut self) -> core::result::Result<(), Self::Error> {
        Ok(())
    }
}

/// STEP/DIR stepper motor driver.
///
/// Generic over:
/// - `STEP`: STEP pin type (must implement `OutputPin`)
/// - `DIR`: DIR pin type (must implement `OutputPin`)
/// - `CLK`: Time source (must implement [`Clock`])
/// - `EN`: optional ENABLE pin type (defaults to [`NoPin`])
///
/// Running state, stop requests and position live in a borrowed
/// [`MotionStatus`] so they can be observed from another context while a
/// blocking move runs.
pub struct StepperMotor<'a, STEP, DIR, CLK, EN = NoPin>
where
    STEP: OutputPin,
    DIR: OutputPin,
    CLK: Clock,
    EN: OutputPin,
{
    /// STEP pin (one pulse per step).
    step_pin: STEP,

    /// DIR pin (high = CW, low = CCW, or inverted).
    dir_pin: DIR,

    /// Optional driver ENABLE pin.
    enable_pin: Option<EN>,

    /// Time source for pulse scheduling.
    clock: CLK,

    /// Shared running/stop/position state.
    status: &'a MotionStatus,

    /// Motor name for logging/debugging.
    name: heapless::String<32>,

    /// Acceleration in steps/s².
    acceleration: f32,

    /// Maximum speed in steps/s.
    max_speed: f32,

    /// Minimum STEP high time in µs.
    pulse_width_us: u16,

    /// Steps per revolution, for degree conversion.
    steps_per_revolution: u32,

    /// Whether direction pin logic is inverted.
    invert_direction: bool,

    /// Whether the driver is enabled by a high ENABLE level.
    invert_enable: bool,

    /// Last level written to DIR (cached to avoid unnecessary pin writes).
    dir_level: Option<bool>,

    /// Motion executor for current move (if any).
    executor: Option<MotionExecutor>,

    /// Deadline of the next pulse.
    schedule: Schedule,
}

/// Settings a motor is created with.
#[derive(Debug, Clone)]
pub(crate) struct MotorSettings {
    pub name: heapless::String<32>,
    pub acceleration: f32,
    pub max_speed: f32,
    pub pulse_width_us: u16,
    pub steps_per_revolution: u32,
    pub invert_direction: bool,
    pub invert_enable: bool,
}

impl<'a, STEP, DIR, CLK, EN> StepperMotor<'a, STEP, DIR, CLK, EN>
where
    STEP: OutputPin,
    DIR: OutputPin,
    CLK: Clock,
    EN: OutputPin,
{
    pub(crate) fn new(
        step_pin: STEP,
        dir_pin: DIR,
        enable_pin: Option<EN>,
        clock: CLK,
        status: &'a MotionStatus,
        settings: MotorSettings,
    ) -> Self {
        Self {
            step_pin,
            dir_pin,
            enable_pin,
            clock,
            status,
            name: settings.name,
            acceleration: settings.acceleration,
            max_speed: settings.max_speed,
            pulse_width_us: settings.pulse_width_us,
            steps_per_revolution: settings.steps_per_revolution,
            invert_direction: settings.invert_direction,
            invert_enable: settings.invert_enable,
            dir_level: None,
            executor: None,
            schedule: Schedule::default(),
        }
    }

    // ---------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------

    /// Get the motor name.
    #[inline]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Shared status this motor reports to.
    #[inline]
    pub fn status(&self) -> &'a MotionStatus {
        self.status
    }

    /// Absolute position in steps.
    #[inline]
    pub fn position(&self) -> i32 {
        self.status.position().value()
    }

    /// Absolute position in degrees.
    #[inline]
    pub fn position_degrees(&self) -> Degrees {
        self.status.position().to_degrees(self.steps_per_revolution)
    }

    /// Last commanded direction (logical, before inversion).
    #[inline]
    pub fn direction(&self) -> Direction {
        self.status.direction()
    }

    /// True while a move is being executed.
    #[inline]
    pub fn is_running(&self) -> bool {
        self.status.is_running()
    }

    /// Acceleration in steps/s².
    #[inline]
    pub fn acceleration(&self) -> f32 {
        self.acceleration
    }

    /// Maximum speed in steps/s.
    #[inline]
    pub fn max_speed(&self) -> f32 {
        self.max_speed
    }

    /// Minimum STEP high time in µs.
    #[inline]
    pub fn pulse_width_us(&self) -> u16 {
        self.pulse_width_us
    }

    /// Steps per revolution.
    #[inline]
    pub fn steps_per_revolution(&self) -> u32 {
        self.steps_per_revolution
    }

    /// Whether direction pin logic is inverted.
    #[inline]
    pub fn invert_direction(&self) -> bool {
        self.invert_direction
    }

    /// Whether the ENABLE pin is active high.
    #[inline]
    pub fn invert_enable(&self) -> bool {
        self.invert_enable
    }

    /// Get current motion phase.
    #[inline]
    pub fn phase(&self) -> MotionPhase {
        self.executor
            .as_ref()
            .map(|e| e.phase())
            .unwrap_or(MotionPhase::Idle)
    }

    /// Pulses left in the current move.
    #[inline]
    pub fn steps_remaining(&self) -> u32 {
        self.executor
            .as_ref()
            .map(|e| e.steps_remaining())
            .unwrap_or(0)
    }

    /// Get move progress (0.0 to 1.0).
    #[inline]
    pub fn progress(&self) -> f32 {
        self.executor.as_ref().map(|e| e.progress()).unwrap_or(1.0)
    }

    /// Plan a move of `steps` with the current settings.
    pub fn profile_for(&self, steps: i32) -> MotionProfile {
        MotionProfile::symmetric_trapezoidal(i64::from(steps), self.max_speed, self.acceleration)
    }

    // ---------------------------------------------------------------------
    // Settings
    // ---------------------------------------------------------------------

    /// Set the acceleration in steps/s².
    ///
    /// Takes effect on the next move. Non-finite or non-positive values are
    /// rejected and the previous value is kept.
    pub fn set_acceleration(&mut self, acceleration: f32) -> Result<()> {
        if !(acceleration.is_finite() && acceleration > 0.0) {
            warn!("{}: rejected acceleration {}", self.name.as_str(), acceleration);
            return Err(Error::Config(ConfigError::InvalidAcceleration(acceleration)));
        }
        self.acceleration = acceleration;
        Ok(())
    }

    /// Set the maximum speed in steps/s.
    ///
    /// Takes effect on the next move. Non-finite or non-positive values are
    /// rejected and the previous value is kept.
    pub fn set_max_speed(&mut self, max_speed: f32) -> Result<()> {
        if !(max_speed.is_finite() && max_speed > 0.0) {
            warn!("{}: rejected max speed {}", self.name.as_str(), max_speed);
            return Err(Error::Config(ConfigError::InvalidMaxSpeed(max_speed)));
        }
        self.max_speed = max_speed;
        Ok(())
    }

    /// Set the minimum STEP high time in µs. Takes effect on the next move.
    pub fn set_pulse_width(&mut self, pulse_width_us: u16) {
        self.pulse_width_us = pulse_width_us;
    }

    /// Set steps per revolution, used by degree conversions.
    pub fn set_steps_per_revolution(&mut self, steps: u32) -> Result<()> {
        if steps == 0 {
            warn!("{}: rejected steps per revolution 0", self.name.as_str());
            return Err(Error::Config(ConfigError::InvalidStepsPerRevolution(steps)));
        }
        self.steps_per_revolution = steps;
        Ok(())
    }

    /// Set direction inversion.
    pub fn set_invert_direction(&mut self, invert: bool) {
        if invert != self.invert_direction {
            self.invert_direction = invert;
            // Same logical direction now needs the other level.
            self.dir_level = None;
        }
    }

    /// Set ENABLE polarity: `true` enables the driver with a high level.
    pub fn set_invert_enable(&mut self, invert: bool) {
        self.invert_enable = invert;
    }

    /// Attach an ENABLE pin, replacing any previous one.
    pub fn set_enable_pin<EN2: OutputPin>(self, pin: EN2) -> StepperMotor<'a, STEP, DIR, CLK, EN2> {
        StepperMotor {
            step_pin: self.step_pin,
            dir_pin: self.dir_pin,
            enable_pin: Some(pin),
            clock: self.clock,
            status: self.status,
            name: self.name,
            acceleration: self.acceleration,
            max_speed: self.max_speed,
            pulse_width_us: self.pulse_width_us,
            steps_per_revolution: self.steps_per_revolution,
            invert_direction: self.invert_direction,
            invert_enable: self.invert_enable,
            dir_level: self.dir_level,
            executor: self.executor,
            schedule: self.schedule,
        }
    }

    /// Replace every setting with the values from `config`.
    ///
    /// The configuration is validated first; on error nothing changes.
    pub fn apply_config(&mut self, config: &MotorConfig) -> Result<()> {
        validate_motor(config)?;

        self.name = config.name.clone();
        self.acceleration = config.acceleration.0;
        self.max_speed = config.max_speed.0;
        self.pulse_width_us = config.pulse_width_us;
        self.steps_per_revolution = config.steps_per_revolution;
        self.set_invert_direction(config.invert_direction);
        self.invert_enable = config.invert_enable;

        debug!("{}: configuration applied", self.name.as_str());
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Driver enable
    // ---------------------------------------------------------------------

    /// Enable the driver outputs. No-op without an ENABLE pin.
    pub fn enable_driver(&mut self) -> Result<()> {
        self.write_enable(true)
    }

    /// Disable the driver outputs. No-op without an ENABLE pin.
    pub fn disable_driver(&mut self) -> Result<()> {
        self.write_enable(false)
    }

    fn write_enable(&mut self, enabled: bool) -> Result<()> {
        let Some(pin) = self.enable_pin.as_mut() else {
            return Ok(());
        };

        // Active low unless inverted.
        let high = enabled == self.invert_enable;
        let result = if high { pin.set_high() } else { pin.set_low() };
        result.map_err(|_| MotorError::PinError)?;
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Blocking moves
    // ---------------------------------------------------------------------

    /// Move by `steps` (positive = CW) and block until the motor is at rest.
    ///
    /// Returns [`MoveOutcome::Stopped`] if a stop request cut the move short.
    /// A zero move does nothing and completes immediately.
    pub fn move_steps(&mut self, steps: i32) -> Result<MoveOutcome> {
        self.run(i64::from(steps))
    }

    /// Move by the whole number of steps closest to `degrees`.
    pub fn move_degrees(&mut self, degrees: Degrees) -> Result<MoveOutcome> {
        let steps = degrees.to_steps(self.steps_per_revolution);
        self.move_steps(steps.value())
    }

    /// Move to an absolute position in steps.
    pub fn move_position(&mut self, target: i32) -> Result<MoveOutcome> {
        let delta = self.status.position_counter().delta_to(Steps(target));
        self.run(delta)
    }

    /// Redefine the current position without moving.
    ///
    /// # Errors
    ///
    /// [`MotorError::Busy`] while a move is running.
    pub fn set_position(&mut self, position: i32) -> Result<()> {
        if self.status.is_running() {
            return Err(Error::Motor(MotorError::Busy));
        }
        self.status.set_position(Steps(position));
        Ok(())
    }

    /// Ask the running move to decelerate to rest.
    ///
    /// Equivalent to [`MotionStatus::request_stop`] on the shared status,
    /// which is the way to stop a blocking move from another context.
    #[inline]
    pub fn stop(&self) {
        self.status.request_stop();
    }

    fn run(&mut self, delta: i64) -> Result<MoveOutcome> {
        if !self.start(delta)? {
            return Ok(MoveOutcome::Completed);
        }

        loop {
            if let Some(outcome) = self.step()? {
                return Ok(outcome);
            }
        }
    }

    // ---------------------------------------------------------------------
    // Non-blocking moves
    // ---------------------------------------------------------------------

    /// Arm a move of `steps` without emitting anything yet.
    ///
    /// Returns `false` for a zero move. Drive the move with
    /// [`StepperMotor::poll`] or [`StepperMotor::step`]; the first pulse is
    /// due immediately.
    pub fn begin_move(&mut self, steps: i32) -> Result<bool> {
        self.start(i64::from(steps))
    }

    /// Emit the next pulse if its deadline has passed.
    ///
    /// Returns `Ok(Some(outcome))` once the move is over (also when no move
    /// is armed) and `Ok(None)` while it is still in progress. Only waits
    /// for the pulse width.
    pub fn poll(&mut self) -> Result<Option<MoveOutcome>> {
        if self.executor.is_none() {
            return Ok(Some(MoveOutcome::Completed));
        }
        if !deadline_reached(self.clock.now_micros(), self.schedule.deadline()) {
            return Ok(None);
        }
        self.emit()
    }

    /// Wait for the next deadline and emit one pulse.
    ///
    /// Same return convention as [`StepperMotor::poll`].
    pub fn step(&mut self) -> Result<Option<MoveOutcome>> {
        if self.executor.is_none() {
            return Ok(Some(MoveOutcome::Completed));
        }
        self.clock.wait_until(self.schedule.deadline());
        self.emit()
    }

    fn start(&mut self, delta: i64) -> Result<bool> {
        if delta == 0 {
            return Ok(false);
        }

        self.status.try_begin()?;
        let params = match RampParameters::new(self.acceleration, self.max_speed, self.pulse_width_us) {
            Ok(params) => params,
            Err(e) => {
                self.status.finish();
                warn!("{}: ramp rejected", self.name.as_str());
                return Err(e.into());
            }
        };

        let direction = Direction::from_steps(delta);
        let steps = u32::try_from(delta.unsigned_abs()).unwrap_or(u32::MAX);

        self.status.set_direction(direction);
        if let Err(e) = self.write_direction(direction) {
            self.status.finish();
            warn!("{}: direction pin failed", self.name.as_str());
            return Err(e.into());
        }

        info!(
            "{}: moving {} steps {} (a = {}, v = {})",
            self.name.as_str(),
            steps,
            direction.as_str(),
            self.acceleration,
            self.max_speed
        );

        self.executor = Some(MotionExecutor::new(steps, direction, params));
        self.schedule = Schedule::starting_at(self.clock.now_micros());
        Ok(true)
    }

    fn emit(&mut self) -> Result<Option<MoveOutcome>> {
        if let Err(e) = self.pulse() {
            self.executor = None;
            self.status.finish();
            warn!("{}: step pin failed, move aborted", self.name.as_str());
            return Err(e.into());
        }

        let Some(executor) = self.executor.as_mut() else {
            return Ok(Some(MoveOutcome::Completed));
        };

        self.status.record_step(executor.direction());

        if self.status.is_stop_requested() && executor.outcome() == MoveOutcome::Completed {
            executor.request_stop();
            if executor.outcome() == MoveOutcome::Stopped {
                debug!(
                    "{}: stop requested, {} steps to rest",
                    self.name.as_str(),
                    executor.steps_remaining().saturating_sub(1)
                );
            }
        }

        match executor.complete_pulse() {
            Some(interval) => {
                self.schedule.advance(interval);
                trace!("{}: next step in {} us", self.name.as_str(), interval);
                Ok(None)
            }
            None => {
                let outcome = executor.outcome();
                self.executor = None;
                self.status.finish();
                match outcome {
                    MoveOutcome::Completed => {
                        info!("{}: move complete at {}", self.name.as_str(), self.position())
                    }
                    MoveOutcome::Stopped => {
                        info!("{}: move stopped at {}", self.name.as_str(), self.position())
                    }
                }
                Ok(Some(outcome))
            }
        }
    }

    /// One STEP pulse of at least `pulse_width_us`.
    fn pulse(&mut self) -> core::result::Result<(), MotorError> {
        let guard = PulseGuard::raise(&mut self.step_pin)?;
        let low_at = self
            .clock
            .now_micros()
            .wrapping_add(u32::from(self.pulse_width_us));
        self.clock.wait_until(low_at);
        guard.release()
    }

    fn write_direction(&mut self, direction: Direction) -> core::result::Result<(), MotorError> {
        let high = (direction == Direction::Clockwise) != self.invert_direction;
        if self.dir_level == Some(high) {
            return Ok(());
        }

        let result = if high {
            self.dir_pin.set_high()
        } else {
            self.dir_pin.set_low()
        };
        result.map_err(|_| MotorError::PinError)?;

        self.dir_level = Some(high);
        Ok(())
    }

    /// Release the pins and the clock.
    pub fn release(self) -> (STEP, DIR, Option<EN>, CLK) {
        (self.step_pin, self.dir_pin, self.enable_pin, self.clock)
    }
}
