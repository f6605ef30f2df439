//! Unified error types for portwire.
//!
//! A single `Error` enum that every subsystem converts into.  All variants
//! are `Copy` so they can be recorded in `Cell`s (the timeout multiplexer's
//! sticky last-error) and passed through behaviors without allocation.
//!
//! Contract violations (invoking an empty callable slot, re-entering a
//! running behavior, a payload of the wrong type) are not errors: they panic.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the crate funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A timeout request was rejected.
    Timer(TimerError),
    /// Port wiring failed.
    Bus(BusError),
    /// Configuration is invalid or could not be loaded.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timer(e) => write!(f, "timer: {e}"),
            Self::Bus(e) => write!(f, "bus: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Timer errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerError {
    /// Arm request without a target event.
    NullTarget,
    /// Arm request with a zero interval.
    InvalidInterval,
    /// Every slot of the pool is armed.
    NoFreeSlots,
    /// Disarm request matched no armed slot.
    TargetNotFound,
}

impl fmt::Display for TimerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NullTarget => write!(f, "no target event"),
            Self::InvalidInterval => write!(f, "interval must be non-zero"),
            Self::NoFreeSlots => write!(f, "no free timeout slots"),
            Self::TargetNotFound => write!(f, "target not armed"),
        }
    }
}

impl core::error::Error for TimerError {}

impl From<TimerError> for Error {
    fn from(e: TimerError) -> Self {
        Self::Timer(e)
    }
}

// ---------------------------------------------------------------------------
// Bus errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusError {
    /// The port arena is exhausted.
    Full,
    /// The actor has not been attached to a bus yet.
    NotAttached,
}

impl fmt::Display for BusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full => write!(f, "port arena full"),
            Self::NotAttached => write!(f, "actor not attached"),
        }
    }
}

impl core::error::Error for BusError {}

impl From<BusError> for Error {
    fn from(e: BusError) -> Self {
        Self::Bus(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T, E = Error> = core::result::Result<T, E>;
