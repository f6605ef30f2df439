//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a cross-module flow
//! (bus wiring, timeout multiplexer, demo actor) against mock adapters.
//! All tests run on the host with no real hardware required.

mod blinky_flow_tests;
mod logging_tests;
mod mock_hw;
mod timeout_scenario_tests;
mod topic_wiring_tests;
