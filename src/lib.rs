//! portwire: allocation-free actor ports and a cooperative timeout
//! multiplexer.
//!
//! Layers, leaf to root:
//!
//! - [`callable`]: fixed-footprint, type-erased closure slot.
//! - [`link`]: intrusive doubly-linked lists over an index arena.
//! - [`port`]: behaviors and events on a [`port::Bus`], plus glue actors.
//! - [`finalizer`]: run-once scope-exit action.
//! - [`timeout`]: fixed pool of one-shot and periodic timeouts.
//!
//! Host adapters and the blinky demo actor sit on top; `src/main.rs` is the
//! composition root of the simulation binary.

#![deny(unused_must_use)]

pub mod callable;
pub mod config;
pub mod finalizer;
pub mod link;
pub mod port;
pub mod timeout;

pub mod error;

pub mod adapters;
pub mod drivers;

pub use callable::{Callable, DEFAULT_FOOTPRINT};
pub use error::{BusError, Error, TimerError};
pub use finalizer::Finalizer;
pub use port::{Bus, Port, Pullable, Puller, Pushable, Pusher};
pub use timeout::{ArmRequest, Clock, TimeoutMux};
