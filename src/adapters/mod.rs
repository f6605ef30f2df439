//! Adapters: host implementations of the crate's hardware seams.
//!
//! | Adapter    | Implements                          | Connects to          |
//! |------------|-------------------------------------|----------------------|
//! | `gpio`     | `embedded_hal::digital::OutputPin`  | simulated pins       |
//! | `time`     | `timeout::Clock`                    | `Instant` / manual   |

pub mod gpio;
pub mod time;
