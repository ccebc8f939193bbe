//! Demonstrates the basic acquire, activate and deactivate cycle of a `ReusePool`.

use std::rc::Rc;

use reuse_pool::{ActiveFlag, Lifecycle, Reclaimable, ReusePool};

#[derive(Default)]
struct Particle {
    lifecycle: Lifecycle,
}

impl Reclaimable for Particle {
    fn active_flag(&self) -> &ActiveFlag {
        self.lifecycle.active_flag()
    }

    fn is_reusable(&self) -> bool {
        self.lifecycle.is_reusable()
    }
}

fn main() {
    let pool = ReusePool::builder().producer(Particle::default).build();

    let particle = pool.acquire::<Particle>().expect("a producer is registered for Particle");
    particle.lifecycle.activate();
    println!("Acquired a particle; live instances: {}", pool.live_len::<Particle>());

    particle.lifecycle.deactivate();
    println!(
        "Deactivated it; instances waiting for reuse: {}",
        pool.pooled_len::<Particle>()
    );

    let again = pool.acquire::<Particle>().expect("a producer is registered for Particle");
    println!(
        "Acquired again; same instance: {}, live instances: {}",
        Rc::ptr_eq(&particle, &again),
        pool.live_len::<Particle>()
    );
}
