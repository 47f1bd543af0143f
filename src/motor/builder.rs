//! Builder pattern for StepperMotor.

use embedded_hal::digital::OutputPin;

use crate::config::{MotorConfig, SystemConfig};
use crate::error::{ConfigError, Error, Result};
use crate::time::Clock;

use super::driver::{MotorSettings, NoPin, StepperMotor};
use super::status::MotionStatus;

/// Builder for creating StepperMotor instances.
///
/// STEP pin, DIR pin, clock, status, acceleration and max speed are
/// required; everything else has a default (200 steps/rev, 1 µs pulses, no
/// inversion, no ENABLE pin).
pub struct StepperMotorBuilder<'a, STEP, DIR, CLK, EN = NoPin>
where
    STEP: OutputPin,
    DIR: OutputPin,
    CLK: Clock,
    EN: OutputPin,
{
    step_pin: Option<STEP>,
    dir_pin: Option<DIR>,
    enable_pin: Option<EN>,
    clock: Option<CLK>,
    status: Option<&'a MotionStatus>,
    name: Option<heapless::String<32>>,
    acceleration: Option<f32>,
    max_speed: Option<f32>,
    pulse_width_us: u16,
    steps_per_revolution: u32,
    invert_direction: bool,
    invert_enable: bool,
}

impl<STEP, DIR, CLK> Default for StepperMotorBuilder<'_, STEP, DIR, CLK, NoPin>
where
    STEP: OutputPin,
    DIR: OutputPin,
    CLK: Clock,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, STEP, DIR, CLK> StepperMotorBuilder<'a, STEP, DIR, CLK, NoPin>
where
    STEP: OutputPin,
    DIR: OutputPin,
    CLK: Clock,
{
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            step_pin: None,
            dir_pin: None,
            enable_pin: None,
            clock: None,
            status: None,
            name: None,
            acceleration: None,
            max_speed: None,
            pulse_width_us: 1,
            steps_per_revolution: 200,
            invert_direction: false,
            invert_enable: false,
        }
    }
}

impl<'a, STEP, DIR, CLK, EN> StepperMotorBuilder<'a, STEP, DIR, CLK, EN>
where
    STEP: OutputPin,
    DIR: OutputPin,
    CLK: Clock,
    EN: OutputPin,
{
    /// Set the STEP pin.
    pub fn step_pin(mut self, pin: STEP) -> Self {
        self.step_pin = Some(pin);
        self
    }

    /// Set the DIR pin.
    pub fn dir_pin(mut self, pin: DIR) -> Self {
        self.dir_pin = Some(pin);
        self
    }

    /// Set the ENABLE pin.
    pub fn enable_pin<EN2: OutputPin>(self, pin: EN2) -> StepperMotorBuilder<'a, STEP, DIR, CLK, EN2> {
        StepperMotorBuilder {
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
        }
    }

    /// Set the time source.
    pub fn clock(mut self, clock: CLK) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Set the shared status the motor reports to.
    pub fn status(mut self, status: &'a MotionStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Set the motor name (truncated to 32 bytes).
    pub fn name(mut self, name: &str) -> Self {
        let mut truncated = heapless::String::new();
        for c in name.chars() {
            if truncated.push(c).is_err() {
                break;
            }
        }
        self.name = Some(truncated);
        self
    }

    /// Set acceleration in steps/s².
    pub fn acceleration(mut self, acceleration: f32) -> Self {
        self.acceleration = Some(acceleration);
        self
    }

    /// Set maximum speed in steps/s.
    pub fn max_speed(mut self, max_speed: f32) -> Self {
        self.max_speed = Some(max_speed);
        self
    }

    /// Set minimum STEP high time in µs.
    pub fn pulse_width(mut self, pulse_width_us: u16) -> Self {
        self.pulse_width_us = pulse_width_us;
        self
    }

    /// Set steps per revolution.
    pub fn steps_per_revolution(mut self, steps: u32) -> Self {
        self.steps_per_revolution = steps;
        self
    }

    /// Set direction inversion.
    pub fn invert_direction(mut self, invert: bool) -> Self {
        self.invert_direction = invert;
        self
    }

    /// Set ENABLE polarity (`true` = active high).
    pub fn invert_enable(mut self, invert: bool) -> Self {
        self.invert_enable = invert;
        self
    }

    /// Configure from a MotorConfig.
    pub fn from_motor_config(mut self, config: &MotorConfig) -> Self {
        self.name = Some(config.name.clone());
        self.acceleration = Some(config.acceleration.0);
        self.max_speed = Some(config.max_speed.0);
        self.pulse_width_us = config.pulse_width_us;
        self.steps_per_revolution = config.steps_per_revolution;
        self.invert_direction = config.invert_direction;
        self.invert_enable = config.invert_enable;
        self
    }

    /// Configure from SystemConfig by motor name.
    pub fn from_config(self, config: &SystemConfig, motor_name: &str) -> Result<Self> {
        let motor_config = config.motor(motor_name).ok_or_else(|| {
            let mut name = heapless::String::new();
            for c in motor_name.chars() {
                if name.push(c).is_err() {
                    break;
                }
            }
            Error::Config(ConfigError::MotorNotFound(name))
        })?;

        Ok(self.from_motor_config(motor_config))
    }

    /// Build the StepperMotor.
    ///
    /// # Errors
    ///
    /// Returns an error if a required field is missing or a setting is out
    /// of range.
    pub fn build(self) -> Result<StepperMotor<'a, STEP, DIR, CLK, EN>> {
        let step_pin = self.step_pin.ok_or(ConfigError::MissingField("step_pin"))?;
        let dir_pin = self.dir_pin.ok_or(ConfigError::MissingField("dir_pin"))?;
        let clock = self.clock.ok_or(ConfigError::MissingField("clock"))?;
        let status = self.status.ok_or(ConfigError::MissingField("status"))?;

        let acceleration = self
            .acceleration
            .ok_or(ConfigError::MissingField("acceleration"))?;
        if !(acceleration.is_finite() && acceleration > 0.0) {
            return Err(Error::Config(ConfigError::InvalidAcceleration(acceleration)));
        }

        let max_speed = self.max_speed.ok_or(ConfigError::MissingField("max_speed"))?;
        if !(max_speed.is_finite() && max_speed > 0.0) {
            return Err(Error::Config(ConfigError::InvalidMaxSpeed(max_speed)));
        }

        if self.steps_per_revolution == 0 {
            return Err(Error::Config(ConfigError::InvalidStepsPerRevolution(0)));
        }

        let name = self.name.unwrap_or_else(|| {
            let mut name = heapless::String::new();
            let _ = name.push_str("motor");
            name
        });

        debug!(
            "{}: built (a = {}, v = {}, {} steps/rev)",
            name.as_str(),
            acceleration,
            max_speed,
            self.steps_per_revolution
        );

        Ok(StepperMotor::new(
            step_pin,
            dir_pin,
            self.enable_pin,
            clock,
            status,
            MotorSettings {
                name,
                acceleration,
                max_speed,
                pulse_width_us: self.pulse_width_us,
                steps_per_revolution: self.steps_per_revolution,
                invert_direction: self.invert_direction,
                invert_enable: self.invert_enable,
            },
        ))
    }
}
