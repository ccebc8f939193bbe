//! Simulates a frame loop in which every spawned object deactivates itself after a fixed
//! number of frames, showing that the pool only ever creates as many objects as are alive at
//! the same time.
//!
//! The pool's own debug output is printed alongside the per-frame summary.

use std::cell::Cell;
use std::rc::Rc;

use reuse_pool::{ActiveFlag, Lifecycle, Reclaimable, ReusePool};
use tracing::Level;

const LIFETIME_FRAMES: u32 = 4;
const FRAMES: u32 = 12;

#[derive(Default)]
struct Flash {
    lifecycle: Lifecycle,
    frames_left: Cell<u32>,
}

impl Flash {
    fn init(&self) {
        self.frames_left.set(LIFETIME_FRAMES);
        self.lifecycle.activate();
    }

    /// Advances the flash by one frame, deactivating it once its time is up.
    fn tick(&self) {
        if !self.lifecycle.is_active() {
            return;
        }

        let left = self.frames_left.get().saturating_sub(1);
        self.frames_left.set(left);

        if left == 0 {
            self.lifecycle.deactivate();
        }
    }
}

impl Reclaimable for Flash {
    fn active_flag(&self) -> &ActiveFlag {
        self.lifecycle.active_flag()
    }

    fn is_reusable(&self) -> bool {
        self.lifecycle.is_reusable()
    }
}

fn main() {
    tracing_subscriber::fmt().with_max_level(Level::DEBUG).init();

    let pool = ReusePool::builder().producer(Flash::default).build();

    for frame in 0..FRAMES {
        if pool.has_pool::<Flash>() {
            for flash in pool.management_list::<Flash>().expect("the pool exists") {
                flash.tick();
            }
        }

        let flash: Rc<Flash> = pool.acquire().expect("a producer is registered for Flash");
        flash.init();

        println!(
            "frame {frame:>2}: live {}, pooled {}, active {}",
            pool.live_len::<Flash>(),
            pool.pooled_len::<Flash>(),
            pool.active_count()
        );
    }
}
