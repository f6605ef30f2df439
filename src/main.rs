//! blinky-sim: host simulation of the three-LED blinker.
//!
//! Composition root: every component is constructed here and all wiring
//! happens in one step before the loop starts.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │   Blinky(gpio0)   Blinky(gpio1)   Blinky(gpio2)                │
//! │     request ─┐      request ─┐      request ─┐                 │
//! │     cancel ──┼──┐   cancel ──┼──┐   cancel ──┼──┐              │
//! │              ▼  ▼            ▼  ▼            ▼  ▼              │
//! │        ┌────────────── TimeoutMux (arm / disarm) ─────────┐    │
//! │        │  slot0   slot1   slot2   slot3                   │    │
//! │        └──────────────────────┬───────────────────────────┘    │
//! │                               │ poll() each pass               │
//! │                               ▼                                │
//! │                 expired ──▶ Blinky.timeout ──▶ toggle pin      │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Usage: `blinky-sim [config.json]`.  Time is simulated with a
//! `ManualClock` stepped by `poll_interval_ms` for `run_for_ms`.

// ── Imports ───────────────────────────────────────────────────
use anyhow::{Context, Result};
use log::info;

use portwire::adapters::gpio::SimPin;
use portwire::adapters::time::ManualClock;
use portwire::config::{MAX_LEDS, SystemConfig, TIMER_SLOTS};
use portwire::drivers::blinky::Blinky;
use portwire::{Bus, Finalizer, TimeoutMux};

/// Two timer behaviors plus four ports per LED.
const BUS_PORTS: usize = 2 + 4 * MAX_LEDS;

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. Configuration ──────────────────────────────────────
    let config = match std::env::args().nth(1) {
        Some(path) => {
            let text =
                std::fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
            SystemConfig::from_json(&text)?
        }
        None => SystemConfig::default(),
    };
    config.validate()?;
    env_logger::Builder::new()
        .filter_level(config.level_filter()?)
        .format_timestamp_millis()
        .try_init()?;

    info!("blinky-sim v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "{} LEDs, poll every {} ms, running {} ms",
        config.leds.len(),
        config.poll_interval_ms,
        config.run_for_ms
    );

    // ── 2. Construct components ───────────────────────────────
    let clock = ManualClock::new(0);
    let pins: heapless::Vec<SimPin, MAX_LEDS> =
        config.leds.iter().map(|led| SimPin::new(led.pin)).collect();
    let leds: heapless::Vec<Blinky<&SimPin>, MAX_LEDS> = pins
        .iter()
        .zip(&config.leds)
        .map(|(pin, led)| Blinky::new(pin, led.interval_ms))
        .collect();
    let timer: TimeoutMux<&ManualClock, TIMER_SLOTS> = TimeoutMux::new(&clock);
    let mut bus: Bus<'_, BUS_PORTS> = Bus::new();

    // ── 3. Wire ───────────────────────────────────────────────
    let timer_ports = timer.attach(&mut bus)?;
    for led in &leds {
        let ports = led.attach(&mut bus)?;
        bus.join(ports.request, timer_ports.arm);
        bus.join(ports.cancel, timer_ports.disarm);
    }
    info!("wired {} of {} ports", bus.len(), bus.capacity());

    let _all_off: Finalizer<'_> = Finalizer::new(|| {
        for led in &leds {
            led.switch_off();
        }
    });

    // ── 4. Run ────────────────────────────────────────────────
    for led in &leds {
        led.start(&bus)?;
    }

    let mut levels = [false; MAX_LEDS];
    let mut elapsed: u32 = 0;
    while elapsed < config.run_for_ms {
        clock.advance(config.poll_interval_ms);
        elapsed = elapsed.saturating_add(config.poll_interval_ms);
        if timer.poll(&bus) == 0 {
            continue;
        }
        for (pin, level) in pins.iter().zip(levels.iter_mut()) {
            if pin.is_high() != *level {
                *level = pin.is_high();
                info!(
                    "t={:>6} ms  gpio{} {}",
                    elapsed,
                    pin.pin(),
                    if *level { "ON" } else { "off" }
                );
            }
        }
    }

    // ── 5. Shutdown ───────────────────────────────────────────
    for led in &leds {
        led.stop(&bus)?;
        let status = led.status();
        info!(
            "LED every {} ms: {} toggles",
            status.interval_ms, status.toggles
        );
    }
    if let Some(e) = timer.last_error() {
        info!("timer last error: {}", e);
    }
    Ok(())
}
