//! Ports, behaviors and events.
//!
//! A [`Bus`] is the arena that owns every port node.  A node is either a
//! **behavior** (a sink wrapping one [`Callable`]) or an **event** (a payload-
//! free broadcast source).  Linking an event to a port merges their lists into
//! one *topic*; triggering any event on a topic fires every behavior on it,
//! exactly once, in link order.
//!
//! ```text
//!   join(e1, b1); join(e1, b2); join(e1, e2)
//!
//!   topic:  e1 ⇄ e2 ⇄ b1 ⇄ b2        (events always cluster first)
//!
//!   push(e2, &v)  →  walk from e2.next:  b1(v), b2(v)
//! ```
//!
//! Four port shapes come from crossing control direction with data direction:
//!
//! | Handle        | Kind     | Data            | Trigger                  |
//! |---------------|----------|-----------------|--------------------------|
//! | [`Pushable`]  | behavior | arrives as `&T` | [`Bus::invoke`]          |
//! | [`Pusher`]    | event    | sent as `&T`    | [`Bus::push`]            |
//! | [`Pullable`]  | behavior | written `&mut T`| [`Bus::request`]         |
//! | [`Puller`]    | event    | read `&mut T`   | [`Bus::pull`]            |
//!
//! Zero, one or many arguments are expressed with `()`, a value, or a tuple.
//!
//! Behaviors receive the bus as their first argument so they can emit
//! synchronously, on other topics or on their own.  Behaviors are `Fn`
//! closures called through `&self`, so a cycle in the wiring is ordinary
//! recursion: keep state in `Cell`s, read inputs, update state, then emit.
//! Only the nesting depth is checked, and only in debug builds.  Handles are
//! plain indices and are only meaningful on the bus that issued them.

pub mod glue;

use core::any::Any;
use core::cell::Cell;
use core::fmt;
use core::marker::PhantomData;

use log::{debug, trace, warn};

use crate::callable::{Callable, DEFAULT_FOOTPRINT};
use crate::error::BusError;
use crate::link::{LinkArena, Links, NodeId};

/// Nesting limit for synchronous dispatch, checked in debug builds.
pub const MAX_DISPATCH_DEPTH: usize = 32;

type Payload = dyn Any;
type PushSlot<'a, const PORTS: usize, const SLOT: usize> =
    Callable<'a, fn(&Bus<'a, PORTS, SLOT>, &Payload), SLOT>;
type PullSlot<'a, const PORTS: usize, const SLOT: usize> =
    Callable<'a, fn(&Bus<'a, PORTS, SLOT>, &mut Payload), SLOT>;

// ---------------------------------------------------------------------------
// Handles
// ---------------------------------------------------------------------------

/// Flow marker: data travels with control, as `&T`.
pub struct Push<T>(PhantomData<fn(&T)>);

/// Flow marker: data travels against control, through `&mut T`.
pub struct Pull<T>(PhantomData<fn(&mut T)>);

/// Any port handle.  Ports only join ports of the same `Flow`.
pub trait Port: Copy {
    type Flow;

    fn id(self) -> NodeId;
}

/// A port that broadcasts to its topic when triggered.
pub trait EventPort: Port {}

macro_rules! port_handle {
    ($(#[$doc:meta])* $name:ident, $flow:ident) => {
        $(#[$doc])*
        pub struct $name<T> {
            id: NodeId,
            _flow: PhantomData<$flow<T>>,
        }

        impl<T> $name<T> {
            const fn from_id(id: NodeId) -> Self {
                Self { id, _flow: PhantomData }
            }
        }

        impl<T> Clone for $name<T> {
            fn clone(&self) -> Self {
                *self
            }
        }

        impl<T> Copy for $name<T> {}

        impl<T> PartialEq for $name<T> {
            fn eq(&self, other: &Self) -> bool {
                self.id == other.id
            }
        }

        impl<T> Eq for $name<T> {}

        impl<T> fmt::Debug for $name<T> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}#{}", stringify!($name), self.id.index())
            }
        }

        impl<T> Port for $name<T> {
            type Flow = $flow<T>;

            fn id(self) -> NodeId {
                self.id
            }
        }
    };
}

port_handle!(
    /// Push-input: a behavior receiving `&T`.
    Pushable, Push
);
port_handle!(
    /// Push-output: an event broadcasting `&T` to its topic.
    Pusher, Push
);
port_handle!(
    /// Pull-input: a behavior answering requests through `&mut T`.
    Pullable, Pull
);
port_handle!(
    /// Pull-output: an event collecting a `T` from its topic.
    Puller, Pull
);

impl<T> EventPort for Pusher<T> {}
impl<T> EventPort for Puller<T> {}

// ---------------------------------------------------------------------------
// Nodes
// ---------------------------------------------------------------------------

/// Role of a node on its topic; events sort before behaviors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Event = 0,
    Behavior = 1,
}

enum Target<'a, const PORTS: usize, const SLOT: usize> {
    Event,
    Push(PushSlot<'a, PORTS, SLOT>),
    Pull(PullSlot<'a, PORTS, SLOT>),
}

impl<const PORTS: usize, const SLOT: usize> Target<'_, PORTS, SLOT> {
    const fn kind(&self) -> Kind {
        match self {
            Self::Event => Kind::Event,
            Self::Push(_) | Self::Pull(_) => Kind::Behavior,
        }
    }
}

// ---------------------------------------------------------------------------
// Bus
// ---------------------------------------------------------------------------

/// Arena of up to `PORTS` ports whose behaviors hold at most `SLOT` bytes.
pub struct Bus<'a, const PORTS: usize, const SLOT: usize = DEFAULT_FOOTPRINT> {
    links: heapless::Vec<Links, PORTS>,
    kinds: heapless::Vec<Kind, PORTS>,
    targets: heapless::Vec<Target<'a, PORTS, SLOT>, PORTS>,
    depth: Cell<usize>,
}

impl<'a, const PORTS: usize, const SLOT: usize> Bus<'a, PORTS, SLOT> {
    pub const fn new() -> Self {
        Self {
            links: heapless::Vec::new(),
            kinds: heapless::Vec::new(),
            targets: heapless::Vec::new(),
            depth: Cell::new(0),
        }
    }

    /// Number of ports created so far.
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub const fn capacity(&self) -> usize {
        PORTS
    }

    // ── Creation ──────────────────────────────────────────────

    /// New push-output event.
    pub fn pusher<T: 'static>(&mut self) -> Result<Pusher<T>, BusError> {
        self.alloc(Target::Event).map(Pusher::from_id)
    }

    /// New pull-output event.
    pub fn puller<T: 'static>(&mut self) -> Result<Puller<T>, BusError> {
        self.alloc(Target::Event).map(Puller::from_id)
    }

    /// New push-input behavior running `f` with every value pushed to it.
    pub fn pushable<T: 'static>(
        &mut self,
        f: impl Fn(&Self, &T) + 'a,
    ) -> Result<Pushable<T>, BusError> {
        self.pushable_sized::<SLOT, T>(f)
    }

    /// Like [`pushable`](Self::pushable), with the target bounded to `FP`
    /// bytes.  `FP` may not exceed the bus slot width.
    pub fn pushable_sized<const FP: usize, T: 'static>(
        &mut self,
        f: impl Fn(&Self, &T) + 'a,
    ) -> Result<Pushable<T>, BusError> {
        let slot = Callable::<fn(&Self, &Payload), FP>::new(move |bus: &Self, payload: &Payload| {
            f(bus, downcast_ref(payload));
        });
        self.alloc(Target::Push(slot.widen())).map(Pushable::from_id)
    }

    /// New pull-input behavior answering requests with `f`.
    pub fn pullable<T: 'static>(
        &mut self,
        f: impl Fn(&Self, &mut T) + 'a,
    ) -> Result<Pullable<T>, BusError> {
        self.pullable_sized::<SLOT, T>(f)
    }

    /// Like [`pullable`](Self::pullable), with the target bounded to `FP`
    /// bytes.  `FP` may not exceed the bus slot width.
    pub fn pullable_sized<const FP: usize, T: 'static>(
        &mut self,
        f: impl Fn(&Self, &mut T) + 'a,
    ) -> Result<Pullable<T>, BusError> {
        let slot =
            Callable::<fn(&Self, &mut Payload), FP>::new(move |bus: &Self, payload: &mut Payload| {
                f(bus, downcast_mut(payload));
            });
        self.alloc(Target::Pull(slot.widen())).map(Pullable::from_id)
    }

    fn alloc(&mut self, target: Target<'a, PORTS, SLOT>) -> Result<NodeId, BusError> {
        let kind = target.kind();
        let id = match NodeId::from_index(self.targets.len()) {
            Some(id) if !self.targets.is_full() => id,
            _ => {
                warn!("bus: no room for another {:?} ({} ports)", kind, PORTS);
                return Err(BusError::Full);
            }
        };
        // Capacities are equal, so these cannot fail after the check above.
        let _ = self.links.push(Links::new());
        let _ = self.kinds.push(kind);
        let _ = self.targets.push(target);
        trace!("bus: created {:?} #{}", kind, id.index());
        Ok(id)
    }

    // ── Wiring ────────────────────────────────────────────────

    /// Link `sink` onto the topic of `event` and return `event`.
    ///
    /// The sink's whole list is merged in, then the topic is reordered so
    /// every event precedes every behavior, each group keeping link order.
    pub fn join<E, P>(&self, event: E, sink: P) -> E
    where
        E: EventPort,
        P: Port<Flow = E::Flow>,
    {
        let arena = self.arena();
        arena.merge(event.id(), Some(sink.id()));
        arena.clusterize::<2>(event.id(), |id| self.kinds[id.index()] as usize);
        debug!("bus: joined #{} -> #{}", event.id().index(), sink.id().index());
        event
    }

    /// Remove `port` from its topic.  No-op when already detached.
    pub fn detach(&self, port: impl Port) {
        self.arena().unlink(port.id());
        debug!("bus: detached #{}", port.id().index());
    }

    /// Whether `port` shares a topic with any other port.
    pub fn is_linked(&self, port: impl Port) -> bool {
        self.arena().is_linked(port.id())
    }

    /// Every node on the topic of `port`, in dispatch order.
    pub fn topic(&self, port: impl Port) -> impl Iterator<Item = NodeId> + '_ {
        let arena = self.arena();
        arena.walk(arena.head(port.id()))
    }

    /// Role of the node `id`.
    pub fn kind(&self, id: NodeId) -> Kind {
        self.kinds[id.index()]
    }

    fn arena(&self) -> &[Links] {
        &self.links
    }

    // ── Triggering ────────────────────────────────────────────

    /// Broadcast `value` to every behavior on the topic of `event`.
    pub fn push<T: 'static>(&self, event: Pusher<T>, value: &T) {
        let _depth = self.enter();
        self.broadcast(event.id, |id| self.fire_push(id, value));
    }

    /// Ask every behavior on the topic of `event` to write into `out`, in
    /// link order.  `out` is left untouched when nothing is linked.
    pub fn pull<T: 'static>(&self, event: Puller<T>, out: &mut T) {
        let _depth = self.enter();
        self.broadcast(event.id, |id| self.fire_pull(id, &mut *out));
    }

    /// [`pull`](Self::pull) into a fresh `T::default()`.
    pub fn pull_value<T: Default + 'static>(&self, event: Puller<T>) -> T {
        let mut value = T::default();
        self.pull(event, &mut value);
        value
    }

    /// Call one push behavior directly, without touching its topic.
    pub fn invoke<T: 'static>(&self, behavior: Pushable<T>, value: &T) {
        let _depth = self.enter();
        self.fire_push(behavior.id, value);
    }

    /// Call one pull behavior directly, without touching its topic.
    pub fn request<T: 'static>(&self, behavior: Pullable<T>, out: &mut T) {
        let _depth = self.enter();
        self.fire_pull(behavior.id, out);
    }

    fn broadcast(&self, event: NodeId, mut fire: impl FnMut(NodeId)) {
        let arena = self.arena();
        let mut cursor = arena.next(event);
        while let Some(id) = cursor {
            // Read ahead so a behavior may detach itself mid-walk.
            cursor = arena.next(id);
            fire(id);
        }
    }

    fn fire_push(&self, id: NodeId, payload: &Payload) {
        match &self.targets[id.index()] {
            Target::Event => {}
            Target::Push(slot) => {
                trace!("bus: fire push #{}", id.index());
                slot.call(self, payload);
            }
            Target::Pull(_) => flow_mismatch(),
        }
    }

    fn fire_pull(&self, id: NodeId, payload: &mut Payload) {
        match &self.targets[id.index()] {
            Target::Event => {}
            Target::Pull(slot) => {
                trace!("bus: fire pull #{}", id.index());
                slot.call(self, payload);
            }
            Target::Push(_) => flow_mismatch(),
        }
    }

    fn enter(&self) -> DepthGuard<'_> {
        let depth = self.depth.get() + 1;
        debug_assert!(
            depth <= MAX_DISPATCH_DEPTH,
            "dispatch nested deeper than {MAX_DISPATCH_DEPTH} levels"
        );
        self.depth.set(depth);
        DepthGuard(&self.depth)
    }
}

impl<const PORTS: usize, const SLOT: usize> Default for Bus<'_, PORTS, SLOT> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const PORTS: usize, const SLOT: usize> fmt::Debug for Bus<'_, PORTS, SLOT> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bus")
            .field("ports", &self.len())
            .field("capacity", &PORTS)
            .field("slot", &SLOT)
            .finish()
    }
}

struct DepthGuard<'g>(&'g Cell<usize>);

impl Drop for DepthGuard<'_> {
    fn drop(&mut self) {
        self.0.set(self.0.get() - 1);
    }
}

fn downcast_ref<T: 'static>(payload: &Payload) -> &T {
    match payload.downcast_ref::<T>() {
        Some(value) => value,
        None => flow_mismatch(),
    }
}

fn downcast_mut<T: 'static>(payload: &mut Payload) -> &mut T {
    match payload.downcast_mut::<T>() {
        Some(value) => value,
        None => flow_mismatch(),
    }
}

#[cold]
#[track_caller]
fn flow_mismatch() -> ! {
    panic!("port payload does not match the behavior's flow type")
}
