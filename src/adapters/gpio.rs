//! Simulated GPIO output.
//!
//! [`SimPin`] keeps its level in `Cell`s so the composition root can hand
//! `&SimPin` to a driver and still observe the pin afterwards.  Writes are
//! logged at `debug` level.

use core::cell::Cell;
use core::convert::Infallible;

use embedded_hal::digital::{ErrorType, OutputPin};
use log::debug;

/// An output pin that records its level and transition count.
#[derive(Debug)]
pub struct SimPin {
    pin: u8,
    high: Cell<bool>,
    transitions: Cell<u32>,
}

impl SimPin {
    pub const fn new(pin: u8) -> Self {
        Self {
            pin,
            high: Cell::new(false),
            transitions: Cell::new(0),
        }
    }

    pub fn pin(&self) -> u8 {
        self.pin
    }

    pub fn is_high(&self) -> bool {
        self.high.get()
    }

    /// Level changes since construction.
    pub fn transitions(&self) -> u32 {
        self.transitions.get()
    }

    fn write(&self, high: bool) {
        if self.high.replace(high) != high {
            self.transitions.set(self.transitions.get() + 1);
            debug!("gpio{}: {}", self.pin, if high { "HIGH" } else { "LOW" });
        }
    }
}

impl ErrorType for &SimPin {
    type Error = Infallible;
}

impl OutputPin for &SimPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.write(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.write(true);
        Ok(())
    }
}
