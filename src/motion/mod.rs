//! Motion module for smooth-stepper.
//!
//! Provides ramp computation, move planning and per-pulse execution.

mod executor;
mod profile;
pub mod ramp;

pub use executor::{MotionExecutor, MoveOutcome};
pub use profile::{Direction, MotionPhase, MotionProfile};
pub use ramp::{compute_next_interval, RampParameters};
