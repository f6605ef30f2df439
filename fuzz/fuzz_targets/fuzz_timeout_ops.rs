//! Fuzz target: `TimeoutMux` arm / disarm / poll sequences
//!
//! Decodes the input as a stream of 3-byte operations and drives them into a
//! small timeout pool wired to counting behaviors.  Asserts that the pool
//! never over-commits and that typed errors match the pool state.
//!
//! cargo fuzz run fuzz_timeout_ops

#![no_main]

use std::cell::Cell;

use libfuzzer_sys::fuzz_target;
use portwire::adapters::time::ManualClock;
use portwire::{Bus, TimeoutMux, TimerError};

const POOL: usize = 4;

fuzz_target!(|data: &[u8]| {
    let Some((&start, ops)) = data.split_first() else {
        return;
    };
    // Start close to the wrap point when the first byte says so.
    let clock = ManualClock::new(u32::MAX - u32::from(start) * 64);
    let hits: [Cell<u32>; 3] = Default::default();
    let mux: TimeoutMux<_, POOL> = TimeoutMux::new(&clock);
    let mut bus: Bus<'_, 8> = Bus::new();
    let mut targets = Vec::new();
    for hit in &hits {
        let event = bus.pusher::<()>().unwrap();
        let sink = bus.pushable(move |_, (): &()| hit.set(hit.get() + 1)).unwrap();
        targets.push(bus.join(event, sink));
    }

    for op in ops.chunks_exact(3) {
        let target = targets[usize::from(op[1]) % targets.len()];
        match op[0] % 3 {
            0 => {
                let interval = u32::from(op[2]);
                let full = mux.active_count() == POOL;
                match mux.arm(interval, Some(target), op[1] & 0x80 != 0) {
                    Ok(index) => assert!(index < POOL && interval > 0 && !full),
                    Err(TimerError::InvalidInterval) => assert_eq!(interval, 0),
                    Err(TimerError::NoFreeSlots) => assert!(full),
                    Err(e) => panic!("unexpected arm error {e:?}"),
                }
            }
            1 => {
                let before = mux.active_count();
                match mux.disarm(target) {
                    Ok(cleared) => assert_eq!(mux.active_count(), before - cleared),
                    Err(e) => assert_eq!(e, TimerError::TargetNotFound),
                }
            }
            _ => {
                clock.advance(u32::from(op[2]) * 4);
                let before = mux.active_count();
                let fired = mux.poll(&bus);
                assert!(fired <= before);
            }
        }
        assert!(mux.active_count() <= POOL);
    }
});
