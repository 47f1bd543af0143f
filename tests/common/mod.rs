//! Simulated hardware shared by the integration tests.
//!
//! A [`Bench`] owns one virtual microsecond counter. Clocks and pins handed
//! out by the bench share it, so every pin edge is stamped with the virtual
//! time at which the motor produced it.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::convert::Infallible;
use std::rc::Rc;

use embedded_hal::digital::{ErrorKind, ErrorType, OutputPin};
use smooth_stepper::time::{deadline_reached, Clock};
use smooth_stepper::MotionStatus;

/// One level change on a recorded pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub at_us: u32,
    pub high: bool,
}

/// Virtual time plus edge logs.
#[derive(Default)]
pub struct Bench {
    time: Rc<Cell<u32>>,
    step_log: Rc<RefCell<Vec<Edge>>>,
    dir_log: Rc<RefCell<Vec<Edge>>>,
    enable_log: Rc<RefCell<Vec<Edge>>>,
}

impl Bench {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bench whose counter starts at `start_us` (e.g. just before a wrap).
    pub fn starting_at(start_us: u32) -> Self {
        let bench = Self::default();
        bench.time.set(start_us);
        bench
    }

    pub fn clock(&self) -> SimClock {
        SimClock {
            time: Rc::clone(&self.time),
        }
    }

    pub fn step_pin(&self) -> RecordingPin<'static> {
        RecordingPin::new(Rc::clone(&self.time), Rc::clone(&self.step_log))
    }

    /// STEP pin that requests a stop on its `after_pulses`-th rising edge.
    pub fn step_pin_stopping<'s>(
        &self,
        status: &'s MotionStatus,
        after_pulses: usize,
    ) -> RecordingPin<'s> {
        let mut pin = RecordingPin::new(Rc::clone(&self.time), Rc::clone(&self.step_log));
        pin.stop = Some((status, after_pulses));
        pin
    }

    pub fn dir_pin(&self) -> RecordingPin<'static> {
        RecordingPin::new(Rc::clone(&self.time), Rc::clone(&self.dir_log))
    }

    pub fn enable_pin(&self) -> RecordingPin<'static> {
        RecordingPin::new(Rc::clone(&self.time), Rc::clone(&self.enable_log))
    }

    pub fn now(&self) -> u32 {
        self.time.get()
    }

    pub fn advance(&self, us: u32) {
        self.time.set(self.time.get().wrapping_add(us));
    }

    /// Times of every STEP rising edge.
    pub fn pulses(&self) -> Vec<u32> {
        self.step_log
            .borrow()
            .iter()
            .filter(|e| e.high)
            .map(|e| e.at_us)
            .collect()
    }

    /// Gaps between consecutive STEP rising edges.
    pub fn gaps(&self) -> Vec<u32> {
        self.pulses()
            .windows(2)
            .map(|w| w[1].wrapping_sub(w[0]))
            .collect()
    }

    pub fn step_edges(&self) -> Vec<Edge> {
        self.step_log.borrow().clone()
    }

    pub fn dir_levels(&self) -> Vec<bool> {
        self.dir_log.borrow().iter().map(|e| e.high).collect()
    }

    pub fn enable_levels(&self) -> Vec<bool> {
        self.enable_log.borrow().iter().map(|e| e.high).collect()
    }

    pub fn clear(&self) {
        self.step_log.borrow_mut().clear();
        self.dir_log.borrow_mut().clear();
        self.enable_log.borrow_mut().clear();
    }
}

/// Clock that jumps to every deadline instead of waiting.
pub struct SimClock {
    time: Rc<Cell<u32>>,
}

impl Clock for SimClock {
    fn now_micros(&mut self) -> u32 {
        self.time.get()
    }

    fn wait_until(&mut self, deadline: u32) {
        if !deadline_reached(self.time.get(), deadline) {
            self.time.set(deadline);
        }
    }
}

/// Output pin that logs its level changes with the bench time.
pub struct RecordingPin<'s> {
    time: Rc<Cell<u32>>,
    log: Rc<RefCell<Vec<Edge>>>,
    rising_edges: usize,
    stop: Option<(&'s MotionStatus, usize)>,
}

impl RecordingPin<'_> {
    fn new(time: Rc<Cell<u32>>, log: Rc<RefCell<Vec<Edge>>>) -> Self {
        Self {
            time,
            log,
            rising_edges: 0,
            stop: None,
        }
    }

    fn record(&mut self, high: bool) {
        self.log.borrow_mut().push(Edge {
            at_us: self.time.get(),
            high,
        });
    }
}

impl ErrorType for RecordingPin<'_> {
    type Error = Infallible;
}

impl OutputPin for RecordingPin<'_> {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.record(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.record(true);
        self.rising_edges += 1;
        if let Some((status, after)) = self.stop {
            if self.rising_edges == after {
                status.request_stop();
            }
        }
        Ok(())
    }
}

/// Pin error reported by [`FlakyPin`].
#[derive(Debug)]
pub struct PinFault;

impl embedded_hal::digital::Error for PinFault {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// Pin whose `fail_on`-th `set_high` fails; every other write succeeds.
pub struct FlakyPin {
    highs: usize,
    fail_on: usize,
    pub low_writes: usize,
}

impl FlakyPin {
    pub fn failing_on(fail_on: usize) -> Self {
        Self {
            highs: 0,
            fail_on,
            low_writes: 0,
        }
    }
}

impl ErrorType for FlakyPin {
    type Error = PinFault;
}

impl OutputPin for FlakyPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.low_writes += 1;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.highs += 1;
        if self.highs == self.fail_on {
            Err(PinFault)
        } else {
            Ok(())
        }
    }
}
