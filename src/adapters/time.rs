//! Host clock adapters.
//!
//! - [`SystemClock`]: wraps `std::time::Instant`, truncated to a wrapping
//!   32-bit millisecond counter like an MCU tick register.
//! - [`ManualClock`]: stepped by hand, for simulation and tests.

use core::cell::Cell;
use std::time::Instant;

use crate::timeout::Clock;

/// Milliseconds since construction, wrapping at `u32::MAX`.
pub struct SystemClock {
    start: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u32 {
        self.start.elapsed().as_millis() as u32
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<u32>,
}

impl ManualClock {
    pub const fn new(start_ms: u32) -> Self {
        Self {
            now: Cell::new(start_ms),
        }
    }

    /// Step forward by `ms`, wrapping like the hardware counter.
    pub fn advance(&self, ms: u32) {
        self.now.set(self.now.get().wrapping_add(ms));
    }

    pub fn set(&self, now_ms: u32) {
        self.now.set(now_ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u32 {
        self.now.get()
    }
}
