//! Glue actors: small adapters that compose existing ports.
//!
//! None of these introduce new port kinds; each one is a handful of ordinary
//! behaviors and events on the caller's [`Bus`], returned as a bundle of
//! handles for the composition root to join.
//!
//! ```text
//!   producer ──push──▶ Latch ◀──pull── consumer       (eager → lazy)
//!   source ◀──pull── Lift ──push──▶ sinks             (lazy → eager, on trigger)
//!   ──push A──▶ PushUnary(f) ──push B──▶
//!   ◀──pull A── PullUnary(f) ◀──pull B──
//! ```
//!
//! Unlinked outputs and inputs are silent no-ops, never errors.  Held values
//! live in `Cell`s and are copied out before emitting, so every adapter
//! tolerates being re-entered from its own output.  Every closure built here
//! must fit the bus slot width; oversized state fails the build.

use core::cell::Cell;
use core::marker::PhantomData;

use super::{Bus, Pullable, Puller, Pushable, Pusher};
use crate::error::BusError;

// ---------------------------------------------------------------------------
// Latch
// ---------------------------------------------------------------------------

/// Remembers the last pushed value and serves it to pull requests.
pub struct Latch<T> {
    value: Cell<T>,
}

/// Ports of an attached [`Latch`].
#[derive(Debug, Clone, Copy)]
pub struct LatchPorts<T> {
    pub input: Pushable<T>,
    pub output: Pullable<T>,
}

impl<T: Copy + 'static> Latch<T> {
    pub const fn new(initial: T) -> Self {
        Self {
            value: Cell::new(initial),
        }
    }

    pub fn get(&self) -> T {
        self.value.get()
    }

    pub fn attach<'a, const PORTS: usize, const SLOT: usize>(
        &'a self,
        bus: &mut Bus<'a, PORTS, SLOT>,
    ) -> Result<LatchPorts<T>, BusError> {
        let input = bus.pushable(move |_, value: &T| self.value.set(*value))?;
        let output = bus.pullable(move |_, out: &mut T| *out = self.value.get())?;
        Ok(LatchPorts { input, output })
    }
}

// ---------------------------------------------------------------------------
// Lift
// ---------------------------------------------------------------------------

/// On trigger, pulls a value and re-broadcasts it.
///
/// The held value starts at `initial` and is only refreshed while `input`
/// is linked, so an unlinked source re-broadcasts the last value seen.
#[derive(Debug, Clone, Copy)]
pub struct Lift<T> {
    pub input: Puller<T>,
    pub output: Pusher<T>,
    pub trigger: Pushable<()>,
}

impl<T: Copy + 'static> Lift<T> {
    pub fn attach<'a, const PORTS: usize, const SLOT: usize>(
        bus: &mut Bus<'a, PORTS, SLOT>,
        initial: T,
    ) -> Result<Self, BusError> {
        let input = bus.puller::<T>()?;
        let output = bus.pusher::<T>()?;
        let held = Cell::new(initial);
        let trigger = bus.pushable(move |bus, (): &()| {
            let mut value = held.get();
            if bus.is_linked(input) {
                bus.pull(input, &mut value);
                held.set(value);
            }
            if bus.is_linked(output) {
                bus.push(output, &value);
            }
        })?;
        Ok(Self {
            input,
            output,
            trigger,
        })
    }
}

// ---------------------------------------------------------------------------
// Unary adapters
// ---------------------------------------------------------------------------

/// Maps every pushed `A` through a function and pushes the `B` onward.
///
/// The function runs on every input, linked output or not.
#[derive(Debug, Clone, Copy)]
pub struct PushUnary<A, B> {
    pub input: Pushable<A>,
    pub output: Pusher<B>,
}

impl<A: 'static, B: 'static> PushUnary<A, B> {
    pub fn attach<'a, const PORTS: usize, const SLOT: usize>(
        bus: &mut Bus<'a, PORTS, SLOT>,
        f: impl Fn(&A) -> B + 'a,
    ) -> Result<Self, BusError> {
        let output = bus.pusher::<B>()?;
        let input = bus.pushable(move |bus, a: &A| {
            let b = f(a);
            bus.push(output, &b);
        })?;
        Ok(Self { input, output })
    }
}

/// Answers requests for `B` by pulling an `A` and mapping it.
///
/// The last pulled `A` is held, so requests keep working while the input is
/// unlinked.
#[derive(Debug, Clone, Copy)]
pub struct PullUnary<A, B> {
    pub input: Puller<A>,
    pub output: Pullable<B>,
}

impl<A: Copy + 'static, B: 'static> PullUnary<A, B> {
    pub fn attach<'a, const PORTS: usize, const SLOT: usize>(
        bus: &mut Bus<'a, PORTS, SLOT>,
        initial: A,
        f: impl Fn(&A) -> B + 'a,
    ) -> Result<Self, BusError> {
        let input = bus.puller::<A>()?;
        let held = Cell::new(initial);
        let output = bus.pullable(move |bus, out: &mut B| {
            let mut value = held.get();
            if bus.is_linked(input) {
                bus.pull(input, &mut value);
                held.set(value);
            }
            *out = f(&value);
        })?;
        Ok(Self { input, output })
    }
}

// ---------------------------------------------------------------------------
// N-ary adapter
// ---------------------------------------------------------------------------

/// A tuple of pulled inputs.  Implemented for tuples of one to four values.
pub trait NaryInputs: Copy + 'static {
    /// One [`Puller`] per tuple element.
    type Pullers: Copy;

    fn create<const PORTS: usize, const SLOT: usize>(
        bus: &mut Bus<'_, PORTS, SLOT>,
    ) -> Result<Self::Pullers, BusError>;

    /// Pull every linked input into its element of `held`.
    fn refresh<const PORTS: usize, const SLOT: usize>(
        bus: &Bus<'_, PORTS, SLOT>,
        pullers: Self::Pullers,
        held: &mut Self,
    );
}

macro_rules! nary_inputs {
    ($(($($name:ident $idx:tt),+))+) => {$(
        impl<$($name: Copy + 'static),+> NaryInputs for ($($name,)+) {
            type Pullers = ($(Puller<$name>,)+);

            fn create<const PORTS: usize, const SLOT: usize>(
                bus: &mut Bus<'_, PORTS, SLOT>,
            ) -> Result<Self::Pullers, BusError> {
                Ok(($(bus.puller::<$name>()?,)+))
            }

            fn refresh<const PORTS: usize, const SLOT: usize>(
                bus: &Bus<'_, PORTS, SLOT>,
                pullers: Self::Pullers,
                held: &mut Self,
            ) {
                $(
                    if bus.is_linked(pullers.$idx) {
                        bus.pull(pullers.$idx, &mut held.$idx);
                    }
                )+
            }
        }
    )+};
}

nary_inputs! {
    (A 0)
    (A 0, B 1)
    (A 0, B 1, C 2)
    (A 0, B 1, C 2, D 3)
}

/// Answers requests for `R` by pulling every input and combining them.
pub struct PullNary<I: NaryInputs, R> {
    pub inputs: I::Pullers,
    pub output: Pullable<R>,
}

impl<I: NaryInputs, R: 'static> PullNary<I, R> {
    pub fn attach<'a, const PORTS: usize, const SLOT: usize>(
        bus: &mut Bus<'a, PORTS, SLOT>,
        initial: I,
        f: impl Fn(&I) -> R + 'a,
    ) -> Result<Self, BusError> {
        let inputs = I::create(bus)?;
        let held = Cell::new(initial);
        let output = bus.pullable(move |bus, out: &mut R| {
            let mut values = held.get();
            I::refresh(bus, inputs, &mut values);
            held.set(values);
            *out = f(&values);
        })?;
        Ok(Self { inputs, output })
    }
}

impl<I: NaryInputs, R> Clone for PullNary<I, R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<I: NaryInputs, R> Copy for PullNary<I, R> {}

// ---------------------------------------------------------------------------
// Casts
// ---------------------------------------------------------------------------

/// Push adapter converting `A` into `B` with `From`.
pub struct PushCast<A, B>(PhantomData<fn(&A) -> B>);

impl<A: Clone + 'static, B: From<A> + 'static> PushCast<A, B> {
    pub fn attach<const PORTS: usize, const SLOT: usize>(
        bus: &mut Bus<'_, PORTS, SLOT>,
    ) -> Result<PushUnary<A, B>, BusError> {
        PushUnary::attach(bus, |a: &A| B::from(a.clone()))
    }
}

/// Pull adapter converting `A` into `B` with `From`.
pub struct PullCast<A, B>(PhantomData<fn(&A) -> B>);

impl<A: Copy + 'static, B: From<A> + 'static> PullCast<A, B> {
    pub fn attach<const PORTS: usize, const SLOT: usize>(
        bus: &mut Bus<'_, PORTS, SLOT>,
        initial: A,
    ) -> Result<PullUnary<A, B>, BusError> {
        PullUnary::attach(bus, initial, |a: &A| B::from(*a))
    }
}
