//! Blinky actors driven by the timeout multiplexer, wired the way the
//! simulation binary wires them.

use portwire::adapters::time::ManualClock;
use portwire::drivers::blinky::{Blinky, BlinkyPorts, LedState};
use portwire::timeout::TimeoutPorts;
use portwire::{Bus, TimeoutMux, TimerError};

use crate::mock_hw::MockPin;

const STEP_MS: u32 = 10;

fn run<const N: usize, const P: usize>(
    clock: &ManualClock,
    mux: &TimeoutMux<&ManualClock, N>,
    bus: &Bus<'_, P>,
    ms: u32,
) {
    for _ in 0..ms / STEP_MS {
        clock.advance(STEP_MS);
        mux.poll(bus);
    }
}

fn wire<const P: usize>(bus: &Bus<'_, P>, led: BlinkyPorts, timer: TimeoutPorts) {
    bus.join(led.request, timer.arm);
    bus.join(led.cancel, timer.disarm);
}

// ── Three-LED layout ──────────────────────────────────────────

#[test]
fn three_leds_toggle_at_their_own_rates() {
    let clock = ManualClock::new(0);
    let pins = [MockPin::new(), MockPin::new(), MockPin::new()];
    let leds = [
        Blinky::new(&pins[0], 500),
        Blinky::new(&pins[1], 1000),
        Blinky::new(&pins[2], 500),
    ];
    let mux: TimeoutMux<_, 4> = TimeoutMux::new(&clock);
    let mut bus: Bus<'_, 16> = Bus::new();
    let timer = mux.attach(&mut bus).unwrap();
    for led in &leds {
        let ports = led.attach(&mut bus).unwrap();
        wire(&bus, ports, timer);
    }
    for led in &leds {
        led.start(&bus).unwrap();
    }
    assert_eq!(mux.active_count(), 3);

    run(&clock, &mux, &bus, 3_000);

    assert_eq!(leds[0].status().toggles, 6);
    assert_eq!(leds[1].status().toggles, 3);
    assert_eq!(leds[2].status().toggles, 6);
    // Initial low, then alternating levels.
    assert_eq!(pins[1].writes(), [false, true, false, true]);
    assert_eq!(leds[1].status().state, LedState::On);
    assert_eq!(mux.active_count(), 3);
}

#[test]
fn led_without_a_free_slot_stays_dark() {
    let clock = ManualClock::new(0);
    let pins = [MockPin::new(), MockPin::new(), MockPin::new()];
    let leds = [
        Blinky::new(&pins[0], 100),
        Blinky::new(&pins[1], 100),
        Blinky::new(&pins[2], 100),
    ];
    let mux: TimeoutMux<_, 2> = TimeoutMux::new(&clock);
    let mut bus: Bus<'_, 16> = Bus::new();
    let timer = mux.attach(&mut bus).unwrap();
    for led in &leds {
        let ports = led.attach(&mut bus).unwrap();
        wire(&bus, ports, timer);
    }

    leds[0].start(&bus).unwrap();
    leds[1].start(&bus).unwrap();
    leds[2].start(&bus).unwrap();
    assert_eq!(mux.last_error(), Some(TimerError::NoFreeSlots));

    run(&clock, &mux, &bus, 1_000);
    assert_eq!(pins[0].rising_edges(), 5);
    assert_eq!(pins[2].rising_edges(), 0);
}

#[test]
fn stopped_led_frees_its_slot_for_another() {
    let clock = ManualClock::new(0);
    let pins = [MockPin::new(), MockPin::new()];
    let leds = [Blinky::new(&pins[0], 50), Blinky::new(&pins[1], 50)];
    let mux: TimeoutMux<_, 1> = TimeoutMux::new(&clock);
    let mut bus: Bus<'_, 16> = Bus::new();
    let timer = mux.attach(&mut bus).unwrap();
    for led in &leds {
        let ports = led.attach(&mut bus).unwrap();
        wire(&bus, ports, timer);
    }

    leds[0].start(&bus).unwrap();
    run(&clock, &mux, &bus, 120);
    leds[0].stop(&bus).unwrap();
    assert!(!pins[0].is_high());
    assert_eq!(mux.active_count(), 0);

    leds[1].start(&bus).unwrap();
    assert_eq!(mux.last_error(), None);
    run(&clock, &mux, &bus, 200);
    assert_eq!(leds[1].status().toggles, 4);
    assert_eq!(leds[0].status().toggles, 2);
}

#[test]
fn failing_pin_does_not_stop_the_timer_chain() {
    let clock = ManualClock::new(0);
    let pin = MockPin::new();
    let led = Blinky::new(&pin, 20);
    let mux: TimeoutMux<_, 1> = TimeoutMux::new(&clock);
    let mut bus: Bus<'_, 8> = Bus::new();
    let timer = mux.attach(&mut bus).unwrap();
    let ports = led.attach(&mut bus).unwrap();
    wire(&bus, ports, timer);

    led.start(&bus).unwrap();
    pin.fail_writes(true);
    run(&clock, &mux, &bus, 100);
    pin.fail_writes(false);
    run(&clock, &mux, &bus, 20);

    assert_eq!(led.status().toggles, 6);
    assert_eq!(pin.writes(), [false, false]);
}

#[test]
fn restarting_a_running_led_does_not_double_arm() {
    let clock = ManualClock::new(0);
    let pin = MockPin::new();
    let led = Blinky::new(&pin, 100);
    let mux: TimeoutMux<_, 4> = TimeoutMux::new(&clock);
    let mut bus: Bus<'_, 8> = Bus::new();
    let timer = mux.attach(&mut bus).unwrap();
    let ports = led.attach(&mut bus).unwrap();
    wire(&bus, ports, timer);

    led.start(&bus).unwrap();
    led.start(&bus).unwrap();
    assert_eq!(mux.active_count(), 1);
}
