//! System configuration parameters
//!
//! All tunable parameters of the blinky simulation.  Values come from
//! `Default` or from a JSON document (see [`SystemConfig::from_json`]).

use core::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Maximum number of LEDs the composition root wires up.
pub const MAX_LEDS: usize = 3;

/// Timeout pool size: one one-shot per LED plus headroom.
pub const TIMER_SLOTS: usize = 4;

const _: () = assert!(MAX_LEDS <= TIMER_SLOTS, "every LED needs its own timer slot");

/// Accepted blink intervals, in milliseconds.
pub const INTERVAL_RANGE_MS: RangeInclusive<u32> = 1..=60_000;

/// One blinking output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedConfig {
    /// Output pin number.
    pub pin: u8,
    /// Half-period: time between toggles (milliseconds).
    pub interval_ms: u32,
}

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    // --- Timing ---
    /// Cooperative loop cadence (milliseconds)
    pub poll_interval_ms: u32,
    /// Simulated run time before shutdown (milliseconds)
    pub run_for_ms: u32,

    // --- Logging ---
    /// `log` level name: "error", "warn", "info", "debug" or "trace"
    pub log_level: heapless::String<8>,

    // --- Outputs ---
    pub leds: heapless::Vec<LedConfig, MAX_LEDS>,
}

impl Default for SystemConfig {
    fn default() -> Self {
        let mut leds = heapless::Vec::new();
        for (pin, interval_ms) in [(0, 500), (1, 1000), (2, 500)] {
            let _ = leds.push(LedConfig { pin, interval_ms });
        }
        let mut log_level = heapless::String::new();
        let _ = log_level.push_str("info");

        Self {
            // Timing
            poll_interval_ms: 10, // 100 Hz
            run_for_ms: 5_000,

            log_level,
            leds,
        }
    }
}

impl SystemConfig {
    /// Parse a JSON document; missing fields take their defaults.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|_| Error::Config("malformed JSON"))
    }

    /// Check cross-field invariants.
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_ms == 0 {
            return Err(Error::Config("poll interval must be non-zero"));
        }
        for led in &self.leds {
            if !INTERVAL_RANGE_MS.contains(&led.interval_ms) {
                return Err(Error::Config("LED interval outside 1..=60000 ms"));
            }
            if self.poll_interval_ms >= led.interval_ms {
                return Err(Error::Config("poll interval must be finer than every LED interval"));
            }
        }
        self.level_filter()?;
        Ok(())
    }

    /// `log_level` as a filter.
    pub fn level_filter(&self) -> Result<log::LevelFilter> {
        self.log_level
            .parse()
            .map_err(|_| Error::Config("unknown log level"))
    }
}
