//! STEP pulse guard.

use embedded_hal::digital::OutputPin;

use crate::error::MotorError;

/// Holds the STEP line high for the lifetime of the guard.
///
/// The line is driven low on [`PulseGuard::release`] or, failing that, when
/// the guard is dropped, so an early return never leaves STEP asserted.
pub(crate) struct PulseGuard<'p, P: OutputPin> {
    pin: &'p mut P,
    released: bool,
}

impl<'p, P: OutputPin> PulseGuard<'p, P> {
    /// Drive the line high.
    pub(crate) fn raise(pin: &'p mut P) -> Result<Self, MotorError> {
        pin.set_high().map_err(|_| MotorError::PinError)?;
        Ok(Self {
            pin,
            released: false,
        })
    }

    /// Drive the line low, reporting pin errors.
    pub(crate) fn release(mut self) -> Result<(), MotorError> {
        self.released = true;
        self.pin.set_low().map_err(|_| MotorError::PinError)
    }
}

impl<P: OutputPin> Drop for PulseGuard<'_, P> {
    fn drop(&mut self) {
        if !self.released {
            let _ = self.pin.set_low();
        }
    }
}
