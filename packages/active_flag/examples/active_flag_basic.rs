//! Demonstrates subscribing to an `ActiveFlag`, including a deactivation timer driven by the
//! caller's own loop.

use std::cell::Cell;
use std::rc::Rc;

use active_flag::ActiveFlag;

fn main() {
    let active = ActiveFlag::new(false);
    let deactivations = Rc::new(Cell::new(0_u32));

    let subscription = active.subscribe({
        let deactivations = Rc::clone(&deactivations);
        move |value| {
            println!("Flag written: {value}");

            if !value {
                deactivations.set(deactivations.get().wrapping_add(1));
            }
        }
    });

    active.set(true);

    // The object switches itself off after three frames.
    let mut frames_left = 3_u32;
    for frame in 0_u32.. {
        if !active.get() {
            break;
        }

        frames_left = frames_left.saturating_sub(1);
        println!("Frame {frame}, frames left: {frames_left}");

        if frames_left == 0 {
            active.set(false);
        }
    }

    // Once on subscribe and once when the timer ran out.
    println!("Deactivations observed: {}", deactivations.get());

    subscription.unsubscribe();
    active.set(true);
    println!("Subscribers after unsubscribing: {}", active.subscriber_count());
}
