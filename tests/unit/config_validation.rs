//! Unit tests for configuration validation.

use smooth_stepper::config::{validate_config, SystemConfig};
use smooth_stepper::error::{ConfigError, Error, MotionError};
use smooth_stepper::parse_config;

/// Test validation of a valid configuration.
#[test]
fn test_valid_config_passes_validation() {
    let toml_str = r#"
[motors.stepper1]
name = "main_axis"
acceleration_steps_per_sec2 = 1000.0
max_speed_steps_per_sec = 500.0
"#;

    let config: SystemConfig = toml::from_str(toml_str).expect("Failed to parse TOML");
    assert!(validate_config(&config).is_ok());
}

/// Test validation fails for non-positive acceleration.
#[test]
fn test_invalid_acceleration() {
    let toml_str = r#"
[motors.stepper1]
name = "main_axis"
acceleration_steps_per_sec2 = 0.0
max_speed_steps_per_sec = 500.0
"#;

    let config: SystemConfig = toml::from_str(toml_str).expect("Failed to parse TOML");
    assert!(matches!(
        validate_config(&config),
        Err(Error::Config(ConfigError::InvalidAcceleration(_)))
    ));

    // parse_config validates too
    assert!(parse_config(toml_str).is_err());
}

/// Test validation fails for negative max speed.
#[test]
fn test_invalid_max_speed() {
    let toml_str = r#"
[motors.stepper1]
name = "main_axis"
acceleration_steps_per_sec2 = 1000.0
max_speed_steps_per_sec = -500.0
"#;

    let config: SystemConfig = toml::from_str(toml_str).expect("Failed to parse TOML");
    assert!(matches!(
        validate_config(&config),
        Err(Error::Config(ConfigError::InvalidMaxSpeed(_)))
    ));
}

/// Test validation fails for zero steps per revolution.
#[test]
fn test_invalid_steps_per_revolution() {
    let toml_str = r#"
[motors.stepper1]
name = "main_axis"
steps_per_revolution = 0
acceleration_steps_per_sec2 = 1000.0
max_speed_steps_per_sec = 500.0
"#;

    let config: SystemConfig = toml::from_str(toml_str).expect("Failed to parse TOML");
    assert!(matches!(
        validate_config(&config),
        Err(Error::Config(ConfigError::InvalidStepsPerRevolution(0)))
    ));
}

/// Test validation fails when the first step interval cannot be scheduled.
#[test]
fn test_acceleration_too_low_to_schedule() {
    // c0 = 1e6 · sqrt(2 / 1e-12) µs, far past the scheduling horizon
    let toml_str = r#"
[motors.stepper1]
name = "main_axis"
acceleration_steps_per_sec2 = 1e-12
max_speed_steps_per_sec = 500.0
"#;

    let config: SystemConfig = toml::from_str(toml_str).expect("Failed to parse TOML");
    assert!(matches!(
        validate_config(&config),
        Err(Error::Motion(MotionError::IntervalOutOfRange { .. }))
    ));
}

/// Test that one bad motor fails the whole configuration.
#[test]
fn test_one_bad_motor_fails_all() {
    let toml_str = r#"
[motors.good]
name = "good"
acceleration_steps_per_sec2 = 1000.0
max_speed_steps_per_sec = 500.0

[motors.bad]
name = "bad"
acceleration_steps_per_sec2 = 1000.0
max_speed_steps_per_sec = 0.0
"#;

    let config: SystemConfig = toml::from_str(toml_str).expect("Failed to parse TOML");
    assert!(validate_config(&config).is_err());
}
