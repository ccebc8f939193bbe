#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! This package provides [`ActiveFlag`], an observable boolean value that synchronously
//! notifies its subscribers on every write.
//!
//! The flag is designed to drive lifecycle signals such as "this object is in use" from the
//! object itself to whoever manages it, without any event loop, background thread or channel.
//!
//! # Features
//!
//! - **Synchronous delivery**: subscribers run on the writing thread before [`ActiveFlag::set()`]
//!   returns.
//! - **Every write is delivered**: writing the value the flag already holds still notifies.
//! - **Ordered delivery**: subscribers observe writes in write order, even when a subscriber
//!   itself writes to the flag.
//! - **Current value on subscribe**: a new subscriber immediately receives the current value.
//! - **Scoped registration**: each callback is owned by a [`Subscription`] that unregisters it
//!   when dropped.
//!
//! # Example
//!
//! ```rust
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! use active_flag::ActiveFlag;
//!
//! let flag = ActiveFlag::new(false);
//! let seen = Rc::new(RefCell::new(Vec::new()));
//!
//! let subscription = flag.subscribe({
//!     let seen = Rc::clone(&seen);
//!     move |value| seen.borrow_mut().push(value)
//! });
//!
//! flag.set(true);
//! flag.set(true);
//! flag.set(false);
//!
//! // The current value is delivered first, then every write in order.
//! assert_eq!(*seen.borrow(), vec![false, true, true, false]);
//!
//! drop(subscription);
//! flag.set(true);
//! assert_eq!(seen.borrow().len(), 4);
//! ```
//!
//! # Thread safety
//!
//! The flag is single-threaded: neither [`ActiveFlag`] nor [`Subscription`] is [`Send`] or
//! [`Sync`].

mod flag;
mod subscription;

pub use flag::*;
pub use subscription::*;
