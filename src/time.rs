//! Time source for step scheduling.
//!
//! The motor only needs two things from the platform: a free-running
//! microsecond counter and a way to wait until a given counter value. Both
//! are expressed by the [`Clock`] trait. Counter values wrap at `u32::MAX`;
//! every comparison in this module is wrap-safe as long as deadlines stay
//! less than `2^31` µs (about 35 minutes) ahead of the current time.

use embedded_hal::delay::DelayNs;

/// Longest gap between two scheduled events, in microseconds.
///
/// Keeps every deadline well inside the half-range window used by
/// [`deadline_reached`].
pub const MAX_SCHEDULE_US: u32 = 1 << 30;

/// Monotonic microsecond clock with absolute-deadline waiting.
pub trait Clock {
    /// Current value of the free-running microsecond counter.
    fn now_micros(&mut self) -> u32;

    /// Suspend the caller until the counter has reached `deadline`.
    ///
    /// Implementations may over-wait but must never return early. The default
    /// implementation busy-polls [`Clock::now_micros`].
    fn wait_until(&mut self, deadline: u32) {
        while !deadline_reached(self.now_micros(), deadline) {
            core::hint::spin_loop();
        }
    }
}

impl<C: Clock + ?Sized> Clock for &mut C {
    fn now_micros(&mut self) -> u32 {
        (**self).now_micros()
    }

    fn wait_until(&mut self, deadline: u32) {
        (**self).wait_until(deadline)
    }
}

/// Returns `true` once `now` is at or past `deadline`, across counter wraparound.
#[inline]
pub fn deadline_reached(now: u32, deadline: u32) -> bool {
    (now.wrapping_sub(deadline) as i32) >= 0
}

/// Microseconds from `now` until `deadline`, or 0 if it has passed.
#[inline]
pub fn micros_until(now: u32, deadline: u32) -> u32 {
    let delta = deadline.wrapping_sub(now) as i32;
    if delta > 0 {
        delta as u32
    } else {
        0
    }
}

/// Absolute pulse schedule.
///
/// Each deadline is derived from the previous deadline rather than from the
/// time the previous pulse actually went out, so computation overhead and
/// late wake-ups never accumulate. Fractional microseconds are carried from
/// one interval to the next.
#[derive(Debug, Clone, Copy, Default)]
pub struct Schedule {
    deadline: u32,
    carry: f64,
}

impl Schedule {
    /// Start a schedule whose first event is due at `now`.
    pub fn starting_at(now: u32) -> Self {
        Self {
            deadline: now,
            carry: 0.0,
        }
    }

    /// Deadline of the next event.
    #[inline]
    pub fn deadline(&self) -> u32 {
        self.deadline
    }

    /// Move the deadline forward by `interval_us`.
    pub fn advance(&mut self, interval_us: f64) {
        let total = interval_us + self.carry;
        let whole = libm::floor(total);
        self.carry = total - whole;
        self.deadline = self.deadline.wrapping_add(whole as u32);
    }
}

/// [`Clock`] built on an `embedded-hal` delay provider.
///
/// Time only advances by the delays it performs, so code running between
/// waits is not accounted for. Good enough when the CPU time spent per step
/// is small next to the step interval; use a hardware timer otherwise.
#[derive(Debug)]
pub struct DelayClock<D> {
    delay: D,
    now: u32,
}

impl<D: DelayNs> DelayClock<D> {
    /// Wrap a delay provider. The counter starts at zero.
    pub fn new(delay: D) -> Self {
        Self { delay, now: 0 }
    }

    /// Release the delay provider.
    pub fn into_inner(self) -> D {
        self.delay
    }
}

impl<D: DelayNs> Clock for DelayClock<D> {
    fn now_micros(&mut self) -> u32 {
        self.now
    }

    fn wait_until(&mut self, deadline: u32) {
        let wait = micros_until(self.now, deadline);
        if wait > 0 {
            self.delay.delay_us(wait);
            self.now = deadline;
        }
    }
}

/// Clock backed by the operating system's monotonic clock.
#[cfg(feature = "std")]
#[derive(Debug, Clone)]
pub struct StdClock {
    created_at: std::time::Instant,
}

#[cfg(feature = "std")]
impl StdClock {
    /// Create a clock whose counter starts at zero now.
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(feature = "std")]
impl Default for StdClock {
    fn default() -> Self {
        Self {
            created_at: std::time::Instant::now(),
        }
    }
}

#[cfg(feature = "std")]
impl Clock for StdClock {
    fn now_micros(&mut self) -> u32 {
        // Truncation gives the wrapping counter.
        self.created_at.elapsed().as_micros() as u32
    }

    fn wait_until(&mut self, deadline: u32) {
        // Sleep through most of a long wait, spin the last millisecond.
        let remaining = micros_until(self.now_micros(), deadline);
        if remaining > 2_000 {
            std::thread::sleep(std::time::Duration::from_micros(u64::from(remaining - 1_000)));
        }
        while !deadline_reached(self.now_micros(), deadline) {
            std::hint::spin_loop();
        }
    }
}
