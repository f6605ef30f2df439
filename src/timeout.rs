//! Cooperative timeout multiplexer.
//!
//! A fixed pool of `N` timeout slots, each remembering a deadline and the
//! event to fire when it passes.  Nothing runs in the background: the main
//! loop calls [`TimeoutMux::poll`] once per pass and every due slot is
//! broadcast through the [`Bus`].
//!
//! ```text
//!   arm(50, ev, periodic) ─┐         ┌─ Free ──arm──▶ Armed(one-shot) ──expire──▶ Free
//!   arm(10, ev2, once) ────┤         │
//!                          ▼         └─ Free ──arm──▶ Armed(periodic) ──expire──┐
//!   ┌──────┬──────┬──────┬──────┐                          ▲    (rearm)        │
//!   │ s0   │ s1   │ s2   │ ...  │                          └───────────────────┘
//!   └──────┴──────┴──────┴──────┘                        disarm ──▶ Free
//!          poll(): visit in index order, fire where now - deadline >= 0
//! ```
//!
//! Deadlines are compared with a signed 32-bit delta, so the millisecond
//! clock may wrap freely as long as no interval exceeds `i32::MAX` ms.
//!
//! A due slot is freed (one-shot) or rearmed (periodic) *before* its event is
//! broadcast.  Expiry handlers observe the pool after that update and may arm
//! or disarm timers, including their own.

use core::cell::Cell;

use log::{debug, trace, warn};

use crate::error::{BusError, TimerError};
use crate::port::{Bus, Pushable, Pusher};

// ═══════════════════════════════════════════════════════════════
//  Clock seam
// ═══════════════════════════════════════════════════════════════

/// Monotonic millisecond clock that wraps at `u32::MAX`.
pub trait Clock {
    fn now_ms(&self) -> u32;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_ms(&self) -> u32 {
        (**self).now_ms()
    }
}

// ═══════════════════════════════════════════════════════════════
//  Slot and request types
// ═══════════════════════════════════════════════════════════════

/// One entry of the timer pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutSlot {
    /// Clock reading at which the slot is due.
    pub target_time: u32,
    /// Event fired on expiry.
    pub target: Option<Pusher<()>>,
    pub active: bool,
    pub periodic: bool,
    /// Rearm interval for periodic slots, in ms.
    pub period: u32,
}

impl TimeoutSlot {
    pub const FREE: Self = Self {
        target_time: 0,
        target: None,
        active: false,
        periodic: false,
        period: 0,
    };
}

/// Payload of the `arm` behavior returned by [`TimeoutMux::attach`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArmRequest {
    pub interval_ms: u32,
    pub target: Option<Pusher<()>>,
    pub periodic: bool,
}

impl ArmRequest {
    pub const fn one_shot(interval_ms: u32, target: Pusher<()>) -> Self {
        Self {
            interval_ms,
            target: Some(target),
            periodic: false,
        }
    }

    pub const fn periodic(interval_ms: u32, target: Pusher<()>) -> Self {
        Self {
            interval_ms,
            target: Some(target),
            periodic: true,
        }
    }
}

/// Behaviors exposing a [`TimeoutMux`] on the bus.
#[derive(Debug, Clone, Copy)]
pub struct TimeoutPorts {
    pub arm: Pushable<ArmRequest>,
    pub disarm: Pushable<Pusher<()>>,
}

// ═══════════════════════════════════════════════════════════════
//  Multiplexer
// ═══════════════════════════════════════════════════════════════

/// Fixed pool of `N` software timeouts driven by clock `C`.
pub struct TimeoutMux<C, const N: usize> {
    clock: C,
    slots: [Cell<TimeoutSlot>; N],
    last_error: Cell<Option<TimerError>>,
}

impl<C: Clock, const N: usize> TimeoutMux<C, N> {
    pub const fn new(clock: C) -> Self {
        Self {
            clock,
            slots: [const { Cell::new(TimeoutSlot::FREE) }; N],
            last_error: Cell::new(None),
        }
    }

    /// Claim the first free slot for `target`, due `interval_ms` from now.
    ///
    /// Arming the same target twice yields two independent slots.
    pub fn arm(
        &self,
        interval_ms: u32,
        target: Option<Pusher<()>>,
        periodic: bool,
    ) -> Result<usize, TimerError> {
        self.last_error.set(None);
        let result = self.claim(interval_ms, target, periodic);
        self.record(result)
    }

    fn claim(
        &self,
        interval_ms: u32,
        target: Option<Pusher<()>>,
        periodic: bool,
    ) -> Result<usize, TimerError> {
        let target = target.ok_or(TimerError::NullTarget)?;
        if interval_ms == 0 {
            return Err(TimerError::InvalidInterval);
        }
        if interval_ms > MAX_INTERVAL_MS {
            warn!(
                "timeout: {} ms exceeds the {} ms wrap horizon and may fire early",
                interval_ms, MAX_INTERVAL_MS
            );
        }
        let index = self
            .slots
            .iter()
            .position(|slot| !slot.get().active)
            .ok_or(TimerError::NoFreeSlots)?;

        let now = self.clock.now_ms();
        self.slots[index].set(TimeoutSlot {
            target_time: now.wrapping_add(interval_ms),
            target: Some(target),
            active: true,
            periodic,
            period: interval_ms,
        });
        debug!(
            "timeout: slot {} armed for {:?} in {} ms{}",
            index,
            target,
            interval_ms,
            if periodic { " (periodic)" } else { "" }
        );
        Ok(index)
    }

    /// Release every slot whose target is `target`.  Returns how many.
    pub fn disarm(&self, target: Pusher<()>) -> Result<usize, TimerError> {
        self.last_error.set(None);
        let mut cleared = 0;
        for slot in &self.slots {
            let current = slot.get();
            if current.active && current.target == Some(target) {
                slot.set(TimeoutSlot::FREE);
                cleared += 1;
            }
        }
        let result = if cleared == 0 {
            Err(TimerError::TargetNotFound)
        } else {
            debug!("timeout: disarmed {} slot(s) for {:?}", cleared, target);
            Ok(cleared)
        };
        self.record(result)
    }

    /// Fire every due slot, in pool-index order.  Returns how many fired.
    ///
    /// The clock is read once per pass.
    pub fn poll<const PORTS: usize, const SLOT: usize>(&self, bus: &Bus<'_, PORTS, SLOT>) -> usize {
        self.last_error.set(None);
        let now = self.clock.now_ms();
        let mut fired = 0;
        for (index, slot) in self.slots.iter().enumerate() {
            let current = slot.get();
            if !current.active || !is_due(now, current.target_time) {
                continue;
            }
            let Some(target) = current.target else {
                slot.set(TimeoutSlot::FREE);
                continue;
            };

            if current.periodic {
                slot.set(TimeoutSlot {
                    target_time: now.wrapping_add(current.period),
                    ..current
                });
            } else {
                slot.set(TimeoutSlot::FREE);
            }
            trace!("timeout: slot {} expired at {} ms", index, now);
            bus.push(target, &());
            fired += 1;
        }
        fired
    }

    /// Snapshot of slot `index`.
    pub fn slot(&self, index: usize) -> Option<TimeoutSlot> {
        self.slots.get(index).map(Cell::get)
    }

    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.get().active).count()
    }

    /// Milliseconds until the earliest active deadline, `Some(0)` if one is
    /// already due, `None` when the pool is idle.
    pub fn next_due_in(&self) -> Option<u32> {
        let now = self.clock.now_ms();
        self.slots
            .iter()
            .map(Cell::get)
            .filter(|slot| slot.active)
            .map(|slot| slot.target_time.wrapping_sub(now) as i32)
            .min()
            .map(|remaining| remaining.max(0) as u32)
    }

    /// Error of the most recent operation, if it failed.
    pub fn last_error(&self) -> Option<TimerError> {
        self.last_error.get()
    }

    /// Register `arm` and `disarm` behaviors on `bus`.
    ///
    /// Failures through these behaviors are visible via [`last_error`].
    ///
    /// [`last_error`]: Self::last_error
    pub fn attach<'a, const PORTS: usize, const SLOT: usize>(
        &'a self,
        bus: &mut Bus<'a, PORTS, SLOT>,
    ) -> Result<TimeoutPorts, BusError> {
        let arm = bus.pushable(move |_, request: &ArmRequest| {
            let _ = self.arm(request.interval_ms, request.target, request.periodic);
        })?;
        let disarm = bus.pushable(move |_, target: &Pusher<()>| {
            let _ = self.disarm(*target);
        })?;
        Ok(TimeoutPorts { arm, disarm })
    }

    fn record(&self, result: Result<usize, TimerError>) -> Result<usize, TimerError> {
        if let Err(e) = result {
            warn!("timeout: {}", e);
            self.last_error.set(Some(e));
        }
        result
    }
}

/// Longest interval the signed deadline comparison orders correctly.
pub const MAX_INTERVAL_MS: u32 = i32::MAX as u32;

/// Whether `deadline` has been reached at `now`, tolerating wraparound.
pub const fn is_due(now: u32, deadline: u32) -> bool {
    (now.wrapping_sub(deadline) as i32) >= 0
}
