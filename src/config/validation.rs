//! Configuration validation.

use crate::error::{ConfigError, Error, Result};

use super::{MotorConfig, SystemConfig};

/// Validate a system configuration.
///
/// Checks every motor:
/// - acceleration and max speed are finite and positive
/// - steps per revolution is non-zero
/// - the resulting step intervals can be scheduled
pub fn validate_config(config: &SystemConfig) -> Result<()> {
    for (name, motor) in config.motors.iter() {
        validate_motor(motor).map_err(|e| {
            warn!("motor '{}' rejected", name.as_str());
            e
        })?;
    }

    Ok(())
}

/// Validate a single motor configuration.
pub fn validate_motor(config: &MotorConfig) -> Result<()> {
    let acceleration = config.acceleration.0;
    if !(acceleration.is_finite() && acceleration > 0.0) {
        return Err(Error::Config(ConfigError::InvalidAcceleration(acceleration)));
    }

    let max_speed = config.max_speed.0;
    if !(max_speed.is_finite() && max_speed > 0.0) {
        return Err(Error::Config(ConfigError::InvalidMaxSpeed(max_speed)));
    }

    if config.steps_per_revolution == 0 {
        return Err(Error::Config(ConfigError::InvalidStepsPerRevolution(0)));
    }

    config.ramp_parameters()?;

    Ok(())
}
