//! Mock hardware for integration tests.
//!
//! Records every pin write so tests can assert on the full level history
//! without touching real GPIO registers, and can be told to fail writes.

use std::cell::{Cell, RefCell};

use embedded_hal::digital::{Error, ErrorKind, ErrorType, OutputPin};

// ── Pin error ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockPinError;

impl Error for MockPinError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

// ── MockPin ───────────────────────────────────────────────────

#[derive(Default)]
pub struct MockPin {
    writes: RefCell<Vec<bool>>,
    failing: Cell<bool>,
}

#[allow(dead_code)]
impl MockPin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following write fail.
    pub fn fail_writes(&self, failing: bool) {
        self.failing.set(failing);
    }

    /// Every level written, in order, including the initial low.
    pub fn writes(&self) -> Vec<bool> {
        self.writes.borrow().clone()
    }

    pub fn is_high(&self) -> bool {
        self.writes.borrow().last().copied().unwrap_or(false)
    }

    /// Number of writes that drove the pin high.
    pub fn rising_edges(&self) -> usize {
        self.writes.borrow().iter().filter(|&&high| high).count()
    }

    fn write(&self, high: bool) -> Result<(), MockPinError> {
        if self.failing.get() {
            return Err(MockPinError);
        }
        self.writes.borrow_mut().push(high);
        Ok(())
    }
}

impl ErrorType for &MockPin {
    type Error = MockPinError;
}

impl OutputPin for &MockPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.write(false)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.write(true)
    }
}
