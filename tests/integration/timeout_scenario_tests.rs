//! Timeout multiplexer driven entirely through the port framework.

use std::cell::Cell;

use portwire::adapters::time::ManualClock;
use portwire::port::glue::{Latch, Lift};
use portwire::timeout::ArmRequest;
use portwire::{Bus, Clock, Pusher, TimeoutMux, TimerError};

fn counter<'a>(bus: &mut Bus<'a, 16>, hits: &'a Cell<u32>) -> Pusher<()> {
    let event = bus.pusher::<()>().unwrap();
    let sink = bus.pushable(move |_, (): &()| hits.set(hits.get() + 1)).unwrap();
    bus.join(event, sink)
}

#[test]
fn pool_of_three_through_arm_and_disarm_behaviors() {
    let clock = ManualClock::new(0);
    let hits = [Cell::new(0), Cell::new(0), Cell::new(0), Cell::new(0)];
    let mux: TimeoutMux<_, 3> = TimeoutMux::new(&clock);
    let mut bus: Bus<'_, 16> = Bus::new();
    let timer = mux.attach(&mut bus).unwrap();
    let arm = bus.pusher::<ArmRequest>().unwrap();
    let disarm = bus.pusher::<Pusher<()>>().unwrap();
    bus.join(arm, timer.arm);
    bus.join(disarm, timer.disarm);
    let [a, b, c, d] = [
        counter(&mut bus, &hits[0]),
        counter(&mut bus, &hits[1]),
        counter(&mut bus, &hits[2]),
        counter(&mut bus, &hits[3]),
    ];

    bus.push(arm, &ArmRequest::one_shot(100, a));
    bus.push(arm, &ArmRequest::periodic(50, b));
    bus.push(arm, &ArmRequest::one_shot(10, c));
    bus.push(arm, &ArmRequest::one_shot(10, d));
    assert_eq!(mux.last_error(), Some(TimerError::NoFreeSlots));

    clock.advance(10);
    mux.poll(&bus);
    bus.push(arm, &ArmRequest::one_shot(10, d));
    assert_eq!(mux.last_error(), None);

    clock.advance(90);
    mux.poll(&bus);
    // t=100: a (one-shot), b (second period) and d (t=20) have all fired.
    let counts: Vec<u32> = hits.iter().map(Cell::get).collect();
    assert_eq!(counts, [1, 1, 1, 1]);

    bus.push(disarm, &b);
    assert_eq!(mux.active_count(), 0);
    bus.push(disarm, &b);
    assert_eq!(mux.last_error(), Some(TimerError::TargetNotFound));
}

#[test]
fn arm_request_without_target_is_rejected() {
    let clock = ManualClock::new(0);
    let mux: TimeoutMux<_, 2> = TimeoutMux::new(&clock);
    let mut bus: Bus<'_, 16> = Bus::new();
    let timer = mux.attach(&mut bus).unwrap();

    bus.invoke(
        timer.arm,
        &ArmRequest {
            interval_ms: 10,
            target: None,
            periodic: false,
        },
    );
    assert_eq!(mux.last_error(), Some(TimerError::NullTarget));
    assert_eq!(mux.active_count(), 0);
}

#[test]
fn periodic_timer_samples_through_lift_into_latch() {
    let clock = ManualClock::new(0xFFFF_FF00);
    let sensor = Cell::new(0u32);
    let latest = Latch::new(0u32);
    let mux: TimeoutMux<_, 1> = TimeoutMux::new(&clock);
    let mut bus: Bus<'_, 16> = Bus::new();
    let sample = Lift::attach(&mut bus, 0u32).unwrap();
    let read = bus.pullable(|_, out: &mut u32| *out = sensor.get()).unwrap();
    let store = latest.attach(&mut bus).unwrap();
    let tick = bus.pusher::<()>().unwrap();
    bus.join(sample.input, read);
    bus.join(sample.output, store.input);
    bus.join(tick, sample.trigger);

    mux.arm(100, Some(tick), true).unwrap();
    for step in 1..=5u32 {
        sensor.set(step * 11);
        clock.advance(100);
        assert_eq!(mux.poll(&bus), 1);
        assert_eq!(latest.get(), step * 11);
    }
    // The clock wrapped during the run.
    assert!(clock.now_ms() < 0xFFFF_FF00);
}

#[test]
fn handlers_see_slots_already_released() {
    let clock = ManualClock::new(0);
    let observed = Cell::new(usize::MAX);
    let mux: TimeoutMux<_, 2> = TimeoutMux::new(&clock);
    let mut bus: Bus<'_, 16> = Bus::new();
    let expired = bus.pusher::<()>().unwrap();
    let probe = bus
        .pushable(|_, (): &()| observed.set(mux.active_count()))
        .unwrap();
    bus.join(expired, probe);

    mux.arm(5, Some(expired), false).unwrap();
    clock.advance(5);
    mux.poll(&bus);
    assert_eq!(observed.get(), 0);
}
