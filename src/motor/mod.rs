//! Motor module for smooth-stepper.
//!
//! Provides the STEP/DIR motor driver, its builder and the shared status
//! used to observe and stop it from another context.

mod builder;
mod driver;
mod position;
mod pulse;
mod status;

pub use builder::StepperMotorBuilder;
pub use driver::{NoPin, StepperMotor};
pub use position::Position;
pub use status::MotionStatus;
