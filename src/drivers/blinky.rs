//! Blinking LED actor.
//!
//! Toggles an output pin every `interval_ms` by asking a timeout multiplexer
//! for a one-shot timeout after each toggle.
//!
//! ```text
//!              ┌────────────── Blinky ──────────────┐
//!   timer ───▶ │ expired ──▶ timeout: toggle pin ───┼─▶ request (ArmRequest)
//!              │                                    │
//!   stop() ──▶ │ ───────────────────────────────────┼─▶ cancel (Pusher<()>)
//!              └────────────────────────────────────┘
//! ```
//!
//! `request` and `cancel` are events; the composition root joins them to the
//! multiplexer's `arm` and `disarm` behaviors.  Nothing happens until
//! [`Blinky::start`].

use core::cell::{Cell, RefCell};

use embedded_hal::digital::OutputPin;
use log::{info, warn};

use crate::config::INTERVAL_RANGE_MS;
use crate::error::{BusError, Error, Result};
use crate::port::{Bus, Pushable, Pusher};
use crate::timeout::ArmRequest;

/// Pin level as seen by the actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedState {
    Off,
    On,
}

/// Ports of an attached [`Blinky`].
#[derive(Debug, Clone, Copy)]
pub struct BlinkyPorts {
    /// Event handed to the timer as the expiry target.
    pub expired: Pusher<()>,
    /// Behavior run on every expiry.
    pub timeout: Pushable<()>,
    /// Outgoing timeout requests.
    pub request: Pusher<ArmRequest>,
    /// Outgoing cancellations.
    pub cancel: Pusher<Pusher<()>>,
}

/// Snapshot returned by [`Blinky::status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlinkyStatus {
    pub state: LedState,
    pub interval_ms: u32,
    pub running: bool,
    pub toggles: u32,
}

pub struct Blinky<P> {
    pin: RefCell<P>,
    interval_ms: Cell<u32>,
    state: Cell<LedState>,
    running: Cell<bool>,
    toggles: Cell<u32>,
    ports: Cell<Option<BlinkyPorts>>,
}

impl<P: OutputPin> Blinky<P> {
    /// Take ownership of `pin` and drive it low.
    pub fn new(pin: P, interval_ms: u32) -> Self {
        let blinky = Self {
            pin: RefCell::new(pin),
            interval_ms: Cell::new(interval_ms),
            state: Cell::new(LedState::Off),
            running: Cell::new(false),
            toggles: Cell::new(0),
            ports: Cell::new(None),
        };
        blinky.drive(LedState::Off);
        blinky
    }

    pub fn attach<'a, const PORTS: usize, const SLOT: usize>(
        &'a self,
        bus: &mut Bus<'a, PORTS, SLOT>,
    ) -> Result<BlinkyPorts, BusError> {
        let expired = bus.pusher::<()>()?;
        let request = bus.pusher::<ArmRequest>()?;
        let cancel = bus.pusher::<Pusher<()>>()?;
        let timeout = bus.pushable(move |bus, (): &()| {
            if self.running.get() {
                self.toggle();
                bus.push(request, &ArmRequest::one_shot(self.interval_ms.get(), expired));
            }
        })?;
        bus.join(expired, timeout);

        let ports = BlinkyPorts {
            expired,
            timeout,
            request,
            cancel,
        };
        self.ports.set(Some(ports));
        Ok(ports)
    }

    /// Request the first timeout.  No-op if already running.
    pub fn start<const PORTS: usize, const SLOT: usize>(
        &self,
        bus: &Bus<'_, PORTS, SLOT>,
    ) -> Result<(), BusError> {
        let ports = self.ports.get().ok_or(BusError::NotAttached)?;
        if self.running.replace(true) {
            return Ok(());
        }
        info!("blinky: start, every {} ms", self.interval_ms.get());
        bus.push(ports.request, &ArmRequest::one_shot(self.interval_ms.get(), ports.expired));
        Ok(())
    }

    /// Cancel the pending timeout and drive the pin low.
    pub fn stop<const PORTS: usize, const SLOT: usize>(
        &self,
        bus: &Bus<'_, PORTS, SLOT>,
    ) -> Result<(), BusError> {
        let ports = self.ports.get().ok_or(BusError::NotAttached)?;
        if self.running.replace(false) {
            bus.push(ports.cancel, &ports.expired);
            info!("blinky: stop");
        }
        self.switch_off();
        Ok(())
    }

    /// Change the blink period; applies from the next requested timeout.
    pub fn set_interval(&self, interval_ms: u32) -> Result<()> {
        if !INTERVAL_RANGE_MS.contains(&interval_ms) {
            return Err(Error::Config("blink interval out of range"));
        }
        self.interval_ms.set(interval_ms);
        Ok(())
    }

    /// Drive the pin low without touching the timer.
    pub fn switch_off(&self) {
        self.drive(LedState::Off);
        self.state.set(LedState::Off);
    }

    pub fn status(&self) -> BlinkyStatus {
        BlinkyStatus {
            state: self.state.get(),
            interval_ms: self.interval_ms.get(),
            running: self.running.get(),
            toggles: self.toggles.get(),
        }
    }

    fn toggle(&self) {
        let next = match self.state.get() {
            LedState::Off => LedState::On,
            LedState::On => LedState::Off,
        };
        self.drive(next);
        self.state.set(next);
        self.toggles.set(self.toggles.get() + 1);
    }

    fn drive(&self, level: LedState) {
        let mut pin = self.pin.borrow_mut();
        let result = match level {
            LedState::On => pin.set_high(),
            LedState::Off => pin.set_low(),
        };
        if let Err(e) = result {
            warn!("blinky: pin write failed: {:?}", e);
        }
    }
}
