//! Unit tests for TOML configuration parsing.

use smooth_stepper::config::{load_config, parse_config, SystemConfig};
use smooth_stepper::error::{ConfigError, Error};

/// Test parsing a fully specified motor configuration from TOML.
#[test]
fn test_parse_motor_config() {
    let toml_str = r#"
[motors.stepper1]
name = "main_axis"
steps_per_revolution = 400
acceleration_steps_per_sec2 = 1500.0
max_speed_steps_per_sec = 750.0
pulse_width_us = 3
invert_direction = true
invert_enable = true
"#;

    let config: SystemConfig = toml::from_str(toml_str).expect("Failed to parse TOML");
    let motor = config.motor("stepper1").expect("Motor not found");

    assert_eq!(motor.name.as_str(), "main_axis");
    assert_eq!(motor.steps_per_revolution, 400);
    assert_eq!(motor.acceleration.0, 1500.0);
    assert_eq!(motor.max_speed.0, 750.0);
    assert_eq!(motor.pulse_width_us, 3);
    assert!(motor.invert_direction);
    assert!(motor.invert_enable);
}

/// Test that optional fields fall back to their defaults.
#[test]
fn test_parse_defaults() {
    let toml_str = r#"
[motors.stepper1]
name = "main_axis"
acceleration_steps_per_sec2 = 1000.0
max_speed_steps_per_sec = 500.0
"#;

    let config = parse_config(toml_str).expect("Failed to parse config");
    let motor = config.motor("stepper1").unwrap();

    assert_eq!(motor.steps_per_revolution, 200);
    assert_eq!(motor.pulse_width_us, 1);
    assert!(!motor.invert_direction);
    assert!(!motor.invert_enable);
}

/// Test parsing several motors and listing their names.
#[test]
fn test_parse_multiple_motors() {
    let toml_str = r#"
[motors.x]
name = "X"
acceleration_steps_per_sec2 = 1000.0
max_speed_steps_per_sec = 500.0

[motors.y]
name = "Y"
acceleration_steps_per_sec2 = 2000.0
max_speed_steps_per_sec = 900.0
"#;

    let config = parse_config(toml_str).unwrap();
    let names: Vec<_> = config.motor_names().collect();
    assert_eq!(names, vec!["x", "y"]);
    assert!(config.motor("z").is_none());
}

/// Test that a missing required field is a parse error.
#[test]
fn test_missing_required_field() {
    let toml_str = r#"
[motors.stepper1]
name = "main_axis"
max_speed_steps_per_sec = 500.0
"#;

    let result = parse_config(toml_str);
    assert!(matches!(
        result,
        Err(Error::Config(ConfigError::ParseError(_)))
    ));
}

/// Test that a name longer than 32 bytes is rejected.
#[test]
fn test_name_too_long() {
    let toml_str = r#"
[motors.stepper1]
name = "this name is far too long to fit in thirty-two bytes"
acceleration_steps_per_sec2 = 1000.0
max_speed_steps_per_sec = 500.0
"#;

    assert!(parse_config(toml_str).is_err());
}

/// Test loading a configuration file from disk.
#[test]
fn test_load_config_file() {
    let path = std::env::temp_dir().join("smooth-stepper-load-config-test.toml");
    std::fs::write(
        &path,
        r#"
[motors.spindle]
name = "Spindle"
acceleration_steps_per_sec2 = 1000.0
max_speed_steps_per_sec = 500.0
"#,
    )
    .expect("write temp config");

    let config = load_config(&path).expect("Failed to load config");
    assert!(config.motor("spindle").is_some());

    let _ = std::fs::remove_file(&path);
}
