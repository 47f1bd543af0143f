//! Basic motor control example.
//!
//! Builds a motor from a TOML configuration, prints the planned profile and
//! runs a move forward and back in real time.
//!
//! The pins here only count pulses; swap them for your HAL's GPIO outputs
//! and `StdClock` for a hardware timer on a real board.

use smooth_stepper::{
    parse_config, time::StdClock, Degrees, MotionStatus, StepperMotorBuilder,
};

/// Output pin that counts rising edges.
struct CountingPin {
    rising_edges: u32,
}

impl CountingPin {
    fn new() -> Self {
        Self { rising_edges: 0 }
    }
}

impl embedded_hal::digital::ErrorType for CountingPin {
    type Error = core::convert::Infallible;
}

impl embedded_hal::digital::OutputPin for CountingPin {
    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.rising_edges += 1;
        Ok(())
    }

    fn set_low(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

const CONFIG: &str = r#"
[motors.demo]
name = "demo_motor"
steps_per_revolution = 200
acceleration_steps_per_sec2 = 1000.0
max_speed_steps_per_sec = 500.0
pulse_width_us = 2
"#;

fn main() -> Result<(), smooth_stepper::Error> {
    println!("=== Basic Motor Control Example ===\n");

    let config = parse_config(CONFIG)?;
    let status = MotionStatus::new();

    let mut motor = StepperMotorBuilder::new()
        .from_config(&config, "demo")?
        .step_pin(CountingPin::new())
        .dir_pin(CountingPin::new())
        .clock(StdClock::new())
        .status(&status)
        .build()?;

    println!("Motor created: {}", motor.name());
    println!(
        "Acceleration: {} steps/s², max speed: {} steps/s",
        motor.acceleration(),
        motor.max_speed()
    );

    let profile = motor.profile_for(1000);
    println!("\n=== Motion Profile (1000 steps) ===");
    println!("Acceleration phase: {} steps", profile.accel_steps);
    println!("Cruise phase: {} steps", profile.cruise_steps);
    println!("Deceleration phase: {} steps", profile.decel_steps);
    println!("Estimated duration: {:.3} seconds", profile.estimated_duration_secs());

    println!("\n=== Moving ===");
    let started = std::time::Instant::now();
    let outcome = motor.move_steps(1000)?;
    println!(
        "{:?} at {} steps in {:.3} s",
        outcome,
        motor.position(),
        started.elapsed().as_secs_f32()
    );

    let outcome = motor.move_degrees(Degrees(-180.0))?;
    println!(
        "{:?} at {} steps ({:.1}°)",
        outcome,
        motor.position(),
        motor.position_degrees().value()
    );

    motor.move_position(0)?;
    println!("Back home at {} steps", motor.position());

    let (step_pin, _, _, _) = motor.release();
    println!("\nTotal pulses emitted: {}", step_pin.rising_edges);

    Ok(())
}
