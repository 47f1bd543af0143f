//! Unit types for physical quantities.
//!
//! Keeps step counts, angles, speeds and accelerations apart at compile time.
//! All of them deserialize transparently from plain TOML numbers.

use core::ops::{Add, Neg, Sub};

use libm::round;
use serde::Deserialize;

/// Angular position in degrees.
///
/// Used for configuration and user-facing API. Internally converted to [`Steps`].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Deserialize)]
#[serde(transparent)]
pub struct Degrees(pub f32);

impl Degrees {
    /// Create a new Degrees value.
    #[inline]
    pub const fn new(value: f32) -> Self {
        Self(value)
    }

    /// Get the raw value.
    #[inline]
    pub const fn value(self) -> f32 {
        self.0
    }

    /// Convert to the nearest whole step count.
    ///
    /// `round(degrees · steps_per_revolution / 360)`, halves away from zero,
    /// saturating at the `i32` bounds.
    #[inline]
    pub fn to_steps(self, steps_per_revolution: u32) -> Steps {
        let exact = f64::from(self.0) * f64::from(steps_per_revolution) / 360.0;
        Steps(round(exact) as i32)
    }
}

impl Add for Degrees {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Degrees {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

/// Signed step count (position or relative move).
///
/// Matches the wrapping `i32` position counter of the motor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Deserialize)]
#[serde(transparent)]
pub struct Steps(pub i32);

impl Steps {
    /// Create a new Steps value.
    #[inline]
    pub const fn new(value: i32) -> Self {
        Self(value)
    }

    /// Get the raw value.
    #[inline]
    pub const fn value(self) -> i32 {
        self.0
    }

    /// Get absolute value.
    #[inline]
    pub fn abs(self) -> u32 {
        self.0.unsigned_abs()
    }

    /// Convert to degrees.
    #[inline]
    pub fn to_degrees(self, steps_per_revolution: u32) -> Degrees {
        Degrees((f64::from(self.0) * 360.0 / f64::from(steps_per_revolution)) as f32)
    }
}

impl Add for Steps {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0.wrapping_add(rhs.0))
    }
}

impl Sub for Steps {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0.wrapping_sub(rhs.0))
    }
}

impl Neg for Steps {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self(self.0.wrapping_neg())
    }
}

/// Speed in steps per second.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Deserialize)]
#[serde(transparent)]
pub struct StepsPerSec(pub f32);

impl StepsPerSec {
    /// Create a new StepsPerSec value.
    #[inline]
    pub const fn new(value: f32) -> Self {
        Self(value)
    }

    /// Get the raw value.
    #[inline]
    pub const fn value(self) -> f32 {
        self.0
    }
}

/// Acceleration in steps per second squared.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Deserialize)]
#[serde(transparent)]
pub struct StepsPerSecSquared(pub f32);

impl StepsPerSecSquared {
    /// Create a new StepsPerSecSquared value.
    #[inline]
    pub const fn new(value: f32) -> Self {
        Self(value)
    }

    /// Get the raw value.
    #[inline]
    pub const fn value(self) -> f32 {
        self.0
    }
}

/// Extension trait for creating unit types from primitives.
pub trait UnitExt {
    /// Convert to Degrees.
    fn degrees(self) -> Degrees;
    /// Convert to StepsPerSec.
    fn steps_per_sec(self) -> StepsPerSec;
    /// Convert to StepsPerSecSquared.
    fn steps_per_sec_squared(self) -> StepsPerSecSquared;
}

impl UnitExt for f32 {
    #[inline]
    fn degrees(self) -> Degrees {
        Degrees(self)
    }

    #[inline]
    fn steps_per_sec(self) -> StepsPerSec {
        StepsPerSec(self)
    }

    #[inline]
    fn steps_per_sec_squared(self) -> StepsPerSecSquared {
        StepsPerSecSquared(self)
    }
}
