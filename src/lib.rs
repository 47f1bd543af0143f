//! # smooth-stepper
//!
//! STEP/DIR stepper motor driver with real-time trapezoidal speed profiles on
//! embedded-hal 1.0.
//!
//! ## Features
//!
//! - **Smooth ramps**: constant acceleration from rest, cruise, constant
//!   deceleration to rest, computed pulse by pulse without square roots
//! - **embedded-hal 1.0**: `OutputPin` for STEP, DIR and optional ENABLE
//! - **Absolute scheduling**: pulse deadlines never drift with CPU load
//! - **Interruptible**: stop from an interrupt handler or another thread;
//!   the motor decelerates to rest
//! - **Position tracking**: absolute position tracked at all times
//! - **no_std compatible**: core library works without standard library
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use smooth_stepper::{MotionStatus, StepperMotorBuilder};
//!
//! static STATUS: MotionStatus = MotionStatus::new();
//!
//! let mut motor = StepperMotorBuilder::new()
//!     .step_pin(step_pin)
//!     .dir_pin(dir_pin)
//!     .clock(clock)
//!     .status(&STATUS)
//!     .acceleration(1000.0)
//!     .max_speed(500.0)
//!     .build()?;
//!
//! motor.move_steps(1000)?;
//! assert_eq!(motor.position(), 1000);
//! ```
//!
//! ## Feature Flags
//!
//! - `std` (default): TOML configuration files and [`time::StdClock`]
//! - `log` (default): log through the `log` facade
//! - `defmt`: log through `defmt` for embedded targets
//! - `critical-section`: atomics on targets without compare-and-swap

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]
// Allow large error types - necessary for no_std with heapless strings
#![allow(clippy::result_large_err)]

// Must come first so the logging macros are visible everywhere.
#[macro_use]
mod fmt;

// Core modules
pub mod config;
pub mod error;
pub mod motion;
pub mod motor;
pub mod time;

// Re-exports for ergonomic API
pub use config::{validate_config, MotorConfig, SystemConfig};
pub use error::{Error, Result};
pub use motion::{Direction, MotionExecutor, MotionPhase, MotionProfile, MoveOutcome};
pub use motor::{MotionStatus, NoPin, StepperMotor, StepperMotorBuilder};
pub use time::Clock;

// Configuration loading (std only)
#[cfg(feature = "std")]
pub use config::{load_config, parse_config};

// Unit types
pub use config::units::{Degrees, Steps, StepsPerSec, StepsPerSecSquared, UnitExt};
