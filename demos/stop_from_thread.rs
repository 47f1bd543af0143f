//! Stopping a blocking move from another thread.
//!
//! The motor runs a long move on the main thread while a second thread asks
//! it to stop through the shared `MotionStatus`. The move decelerates to rest
//! instead of halting on the spot.

use std::thread;
use std::time::Duration;

use smooth_stepper::{time::StdClock, MotionStatus, NoPin, StepperMotorBuilder};

fn main() -> Result<(), smooth_stepper::Error> {
    let status = MotionStatus::new();

    thread::scope(|scope| {
        scope.spawn(|| {
            while !status.is_running() {
                thread::yield_now();
            }
            thread::sleep(Duration::from_millis(400));
            println!("requesting stop at {} steps", status.position().value());
            status.request_stop();
        });

        let mut motor = StepperMotorBuilder::new()
            .name("spindle")
            .step_pin(NoPin)
            .dir_pin(NoPin)
            .clock(StdClock::new())
            .status(&status)
            .acceleration(2_000.0)
            .max_speed(1_000.0)
            .build()?;

        let outcome = motor.move_steps(100_000)?;
        println!("{:?} at {} steps", outcome, motor.position());
        Ok(())
    })
}
