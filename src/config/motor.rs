//! Motor configuration from TOML.

use heapless::String;
use serde::Deserialize;

use crate::error::MotionError;
use crate::motion::{MotionProfile, RampParameters};

use super::units::{Degrees, Steps, StepsPerSec, StepsPerSecSquared};

/// Complete motor configuration from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct MotorConfig {
    /// Human-readable name (max 32 chars).
    pub name: String<32>,

    /// Steps per output revolution (200 for 1.8° motors in full-step mode).
    #[serde(default = "default_steps_per_revolution")]
    pub steps_per_revolution: u32,

    /// Acceleration and deceleration rate in steps per second squared.
    #[serde(rename = "acceleration_steps_per_sec2")]
    pub acceleration: StepsPerSecSquared,

    /// Cruise speed in steps per second.
    #[serde(rename = "max_speed_steps_per_sec")]
    pub max_speed: StepsPerSec,

    /// Minimum STEP high time in microseconds.
    #[serde(default = "default_pulse_width")]
    pub pulse_width_us: u16,

    /// Invert direction pin logic.
    #[serde(default)]
    pub invert_direction: bool,

    /// Drive the enable pin high to enable the driver.
    #[serde(default)]
    pub invert_enable: bool,
}

fn default_steps_per_revolution() -> u32 {
    200
}

fn default_pulse_width() -> u16 {
    1
}

impl MotorConfig {
    /// Step count closest to `degrees` of output rotation.
    #[inline]
    pub fn degrees_to_steps(&self, degrees: Degrees) -> Steps {
        degrees.to_steps(self.steps_per_revolution)
    }

    /// Ramp parameters a move with this configuration would use.
    pub fn ramp_parameters(&self) -> core::result::Result<RampParameters, MotionError> {
        RampParameters::new(self.acceleration.0, self.max_speed.0, self.pulse_width_us)
    }

    /// Plan a move of `steps` with this configuration.
    pub fn profile_for(&self, steps: Steps) -> MotionProfile {
        MotionProfile::symmetric_trapezoidal(
            i64::from(steps.0),
            self.max_speed.0,
            self.acceleration.0,
        )
    }
}
