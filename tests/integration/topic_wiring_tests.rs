//! Topic wiring across the port layer and glue actors.

use std::cell::{Cell, RefCell};

use portwire::port::glue::{Latch, PullNary, PushCast, PushUnary};
use portwire::port::Kind;
use portwire::{Bus, Finalizer};

#[test]
fn policy_is_chosen_by_which_behavior_gets_joined() {
    let chosen = RefCell::new(Vec::new());
    let mut bus: Bus<'_, 8> = Bus::new();
    let fast = bus.pushable(|_, v: &u32| chosen.borrow_mut().push(("fast", *v))).unwrap();
    let safe = bus.pushable(|_, v: &u32| chosen.borrow_mut().push(("safe", *v))).unwrap();
    let command = bus.pusher::<u32>().unwrap();

    bus.join(command, safe);
    bus.push(command, &1);
    bus.detach(safe);
    bus.join(command, fast);
    bus.push(command, &2);

    assert_eq!(*chosen.borrow(), [("safe", 1), ("fast", 2)]);
}

#[test]
fn chained_adapters_transform_in_order() {
    let seen = Cell::new(0u64);
    let mut bus: Bus<'_, 12> = Bus::new();
    let double = PushUnary::attach(&mut bus, |v: &u16| v * 2).unwrap();
    let widen = PushCast::<u16, u64>::attach(&mut bus).unwrap();
    let sink = bus.pushable(|_, v: &u64| seen.set(*v)).unwrap();
    let source = bus.pusher::<u16>().unwrap();
    bus.join(source, double.input);
    bus.join(double.output, widen.input);
    bus.join(widen.output, sink);

    bus.push(source, &21);
    assert_eq!(seen.get(), 42);
}

#[test]
fn latches_feed_an_nary_pull() {
    let temperature = Latch::new(20i32);
    let offset = Latch::new(-3i32);
    let mut bus: Bus<'_, 12, 24> = Bus::new();
    let t = temperature.attach(&mut bus).unwrap();
    let o = offset.attach(&mut bus).unwrap();
    let corrected = PullNary::attach(&mut bus, (0i32, 0i32), |(t, o): &(i32, i32)| t + o).unwrap();
    let ask = bus.puller::<i32>().unwrap();
    let update = bus.pusher::<i32>().unwrap();
    bus.join(corrected.inputs.0, t.output);
    bus.join(corrected.inputs.1, o.output);
    bus.join(ask, corrected.output);
    bus.join(update, t.input);

    assert_eq!(bus.pull_value(ask), 17);
    bus.push(update, &25);
    assert_eq!(bus.pull_value(ask), 22);
}

#[test]
fn joined_topics_keep_events_first_after_many_joins() {
    let mut bus: Bus<'_, 12> = Bus::new();
    let head = bus.pusher::<()>().unwrap();
    for i in 0..10 {
        if i % 3 == 0 {
            let event = bus.pusher::<()>().unwrap();
            bus.join(head, event);
        } else {
            let behavior = bus.pushable(|_, (): &()| {}).unwrap();
            bus.join(head, behavior);
        }
    }

    let order: Vec<_> = bus.topic(head).collect();
    assert_eq!(order.len(), 11);
    let kinds: Vec<Kind> = order.iter().map(|&id| bus.kind(id)).collect();
    let split = kinds.iter().position(|k| *k == Kind::Behavior).unwrap();
    assert_eq!(split, 5);
    assert!(kinds[split..].iter().all(|k| *k == Kind::Behavior));
    // Each group keeps join order.
    assert!(order[..split].windows(2).all(|w| w[0] < w[1]));
    assert!(order[split..].windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn finalizer_detaches_on_scope_exit() {
    let hits = Cell::new(0u32);
    let mut bus: Bus<'_, 4> = Bus::new();
    let event = bus.pusher::<()>().unwrap();
    let sink = bus.pushable(|_, (): &()| hits.set(hits.get() + 1)).unwrap();
    bus.join(event, sink);
    {
        let _unlink: Finalizer<'_> = Finalizer::new(|| bus.detach(sink));
        bus.push(event, &());
    }
    bus.push(event, &());
    assert_eq!(hits.get(), 1);
    assert!(!bus.is_linked(sink));
}

#[test]
fn feedback_loop_through_two_topics_terminates() {
    let rallies = Cell::new(0u32);
    let mut bus: Bus<'_, 8> = Bus::new();
    let ping = bus.pusher::<u32>().unwrap();
    let pong = bus.pusher::<u32>().unwrap();
    let counted = &rallies;
    let left = bus
        .pushable(move |bus, n: &u32| {
            counted.set(counted.get() + 1);
            if *n > 0 {
                bus.push(pong, &(n - 1));
            }
        })
        .unwrap();
    let right = bus
        .pushable(move |bus, n: &u32| {
            if *n > 0 {
                bus.push(ping, &(n - 1));
            }
        })
        .unwrap();
    bus.join(ping, left);
    bus.join(pong, right);

    bus.push(ping, &6);
    // Ping sees 6, 4, 2, 0.
    assert_eq!(rallies.get(), 4);
}
