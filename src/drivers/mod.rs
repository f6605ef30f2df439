//! Demo actors built on the port framework.

pub mod blinky;
