#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! This package provides [`ReusePool`], a pool manager that hands out instances of any
//! [`Reclaimable`] type and takes them back automatically once they deactivate.
//!
//! # How it works
//!
//! For each type it is asked for, the pool keeps a live list of every instance it ever created
//! and a stack of instances waiting to be reused. Acquiring an instance pops the top of that
//! stack, or asks the pool's [`Factory`] for a new instance when the stack is empty.
//!
//! Each created instance exposes an observable [`ActiveFlag`]. The pool subscribes to it once,
//! at creation, and pushes the instance back onto its stack whenever the flag is written
//! `false`. There is no explicit "release" call: deactivating an instance is what returns it.
//!
//! A freshly created instance is inactive, so the pool would see `false` as soon as it
//! subscribes. To tell that apart from a real deactivation, instances also report whether they
//! are [reusable][Reclaimable::is_reusable], which only becomes true once the instance has been
//! activated. [`Lifecycle`] implements this protocol for embedding into your own types.
//!
//! # Features
//!
//! - **Any type**: a single pool manages any number of types, each with its own live list and
//!   reuse stack.
//! - **Reuse first**: an instance waiting for reuse is always preferred over creating a new one,
//!   most recently reclaimed first.
//! - **Automatic reclamation**: deactivating an instance returns it to the pool synchronously.
//! - **Pluggable creation**: new instances come from a [`Factory`], by default a [`Producers`]
//!   table of per-type producer functions.
//! - **Optional leak detection**: the pool can be configured to panic on shutdown if instances
//!   are still active.
//!
//! # Example
//!
//! ```rust
//! use reuse_pool::{ActiveFlag, Error, Lifecycle, Reclaimable, ReusePool};
//!
//! #[derive(Default)]
//! struct Explosion {
//!     lifecycle: Lifecycle,
//! }
//!
//! impl Reclaimable for Explosion {
//!     fn active_flag(&self) -> &ActiveFlag {
//!         self.lifecycle.active_flag()
//!     }
//!
//!     fn is_reusable(&self) -> bool {
//!         self.lifecycle.is_reusable()
//!     }
//! }
//!
//! struct Smoke {
//!     lifecycle: Lifecycle,
//! }
//!
//! impl Reclaimable for Smoke {
//!     fn active_flag(&self) -> &ActiveFlag {
//!         self.lifecycle.active_flag()
//!     }
//!
//!     fn is_reusable(&self) -> bool {
//!         self.lifecycle.is_reusable()
//!     }
//! }
//!
//! let pool = ReusePool::builder().producer(Explosion::default).build();
//!
//! let first = pool.acquire::<Explosion>().unwrap();
//! let second = pool.acquire::<Explosion>().unwrap();
//! first.lifecycle.activate();
//! second.lifecycle.activate();
//!
//! first.lifecycle.deactivate();
//! assert_eq!(pool.pooled_len::<Explosion>(), 1);
//! assert_eq!(pool.management_list::<Explosion>().unwrap().len(), 2);
//!
//! // Nothing can produce smoke.
//! assert!(matches!(
//!     pool.acquire::<Smoke>(),
//!     Err(Error::UnknownPrefab { .. })
//! ));
//! ```
//!
//! # Logging
//!
//! The pool reports through [`tracing`](https://docs.rs/tracing) under the `reuse_pool`
//! target. Failed acquisitions and lookups are logged as errors before being returned;
//! pool creation, reuse and reclamation are logged at debug level.
//!
//! # Thread safety
//!
//! Everything in this package is single-threaded. Instances are shared between the pool and
//! callers as [`Rc`][std::rc::Rc] and reclaimed on the thread that deactivates them.

mod builder;
mod drop_policy;
mod error;
mod factory;
mod lifecycle;
mod pool;
mod reclaimable;
mod registry;

// Re-export the flag types simply because every Reclaimable implementation needs them.
pub use active_flag::{ActiveFlag, Subscription};
pub use builder::*;
pub use drop_policy::*;
pub use error::*;
pub use factory::*;
pub use lifecycle::*;
pub use pool::*;
pub use reclaimable::*;
pub use registry::*;
