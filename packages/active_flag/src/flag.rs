use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use crate::Subscription;

type Callback = Rc<dyn Fn(bool)>;

/// Shared state behind every clone of an [`ActiveFlag`].
pub(crate) struct FlagCore {
    value: Cell<bool>,

    /// Registered callbacks in registration order, keyed by subscription ID.
    subscribers: RefCell<Vec<(u64, Callback)>>,

    next_subscription_id: Cell<u64>,

    /// Writes that still need to be delivered. Only non-empty while a notification is running.
    pending: RefCell<VecDeque<bool>>,

    /// Set while callbacks are being invoked, so that writes made from inside a callback are
    /// queued behind the write currently being delivered.
    notifying: Cell<bool>,

    /// The write currently being delivered. Only meaningful while `notifying` is set.
    delivering: Cell<bool>,
}

impl FlagCore {
    fn new(value: bool) -> Self {
        Self {
            value: Cell::new(value),
            subscribers: RefCell::new(Vec::new()),
            next_subscription_id: Cell::new(0),
            pending: RefCell::new(VecDeque::new()),
            notifying: Cell::new(false),
            delivering: Cell::new(value),
        }
    }

    /// Removes the callback registered under `id`, if it is still registered.
    pub(crate) fn remove(&self, id: u64) {
        self.subscribers
            .borrow_mut()
            .retain(|(subscriber_id, _)| *subscriber_id != id);
    }

    pub(crate) fn contains(&self, id: u64) -> bool {
        self.subscribers
            .borrow()
            .iter()
            .any(|(subscriber_id, _)| *subscriber_id == id)
    }

    fn next_pending(&self) -> Option<bool> {
        self.pending.borrow_mut().pop_front()
    }

    fn snapshot(&self) -> Vec<Callback> {
        self.subscribers
            .borrow()
            .iter()
            .map(|(_, callback)| Rc::clone(callback))
            .collect()
    }
}

/// An observable boolean flag.
///
/// Every call to [`set()`][Self::set] stores the value and then invokes every registered
/// callback with it, synchronously and in registration order. Writes that do not change the
/// value are delivered just like writes that do.
///
/// The flag is a cloneable handle: all clones share the same value and the same subscribers.
///
/// # Re-entrancy
///
/// A callback may read the flag, write to it, subscribe to it or drop subscriptions. A write made
/// from inside a callback is stored immediately but delivered only after the write currently
/// being delivered has reached every subscriber, so all subscribers see writes in write order.
/// Subscriptions added or removed during a delivery take effect from the next delivered write.
///
/// # Example
///
/// ```rust
/// use active_flag::ActiveFlag;
///
/// let flag = ActiveFlag::default();
/// assert!(!flag.get());
///
/// let handle = flag.clone();
/// handle.set(true);
///
/// // Clones share the value.
/// assert!(flag.get());
/// ```
#[derive(Clone)]
pub struct ActiveFlag {
    core: Rc<FlagCore>,
}

impl ActiveFlag {
    /// Creates a new flag holding `value`, with no subscribers.
    ///
    /// # Example
    ///
    /// ```rust
    /// use active_flag::ActiveFlag;
    ///
    /// let flag = ActiveFlag::new(true);
    /// assert!(flag.get());
    /// assert_eq!(flag.subscriber_count(), 0);
    /// ```
    #[must_use]
    pub fn new(value: bool) -> Self {
        Self {
            core: Rc::new(FlagCore::new(value)),
        }
    }

    /// Returns the current value of the flag.
    #[must_use]
    #[inline]
    pub fn get(&self) -> bool {
        self.core.value.get()
    }

    /// Stores `value` and notifies every subscriber with it.
    ///
    /// Subscribers are notified even if the flag already held `value`.
    ///
    /// If a subscriber panics, the panic propagates to the caller and any writes queued by
    /// subscribers during this delivery are discarded. The stored value is not rolled back.
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::cell::Cell;
    /// use std::rc::Rc;
    ///
    /// use active_flag::ActiveFlag;
    ///
    /// let flag = ActiveFlag::new(false);
    /// let writes = Rc::new(Cell::new(0));
    ///
    /// let _subscription = flag.subscribe({
    ///     let writes = Rc::clone(&writes);
    ///     move |_| writes.set(writes.get() + 1)
    /// });
    ///
    /// flag.set(false);
    /// flag.set(false);
    ///
    /// // One delivery on subscribe plus one per write.
    /// assert_eq!(writes.get(), 3);
    /// ```
    pub fn set(&self, value: bool) {
        self.core.value.set(value);
        self.core.pending.borrow_mut().push_back(value);

        if self.core.notifying.replace(true) {
            // The outer delivery loop will pick this write up once the current one is done.
            return;
        }

        let core = &self.core;
        let _reset = scopeguard::guard((), |()| {
            core.notifying.set(false);
            core.pending.borrow_mut().clear();
        });

        while let Some(next) = core.next_pending() {
            core.delivering.set(next);

            for callback in core.snapshot() {
                callback(next);
            }
        }
    }

    /// Registers `callback` to be invoked with the flag value on every write.
    ///
    /// The callback is invoked once immediately with the current value, before this method
    /// returns. When called from inside a callback, the new callback instead receives the write
    /// being delivered, followed by any writes queued behind it. The registration lasts until the returned [`Subscription`] is dropped or
    /// [unsubscribed][Subscription::unsubscribe], or forever if it is
    /// [detached][Subscription::detach].
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::cell::Cell;
    /// use std::rc::Rc;
    ///
    /// use active_flag::ActiveFlag;
    ///
    /// let flag = ActiveFlag::new(true);
    /// let last = Rc::new(Cell::new(None));
    ///
    /// let subscription = flag.subscribe({
    ///     let last = Rc::clone(&last);
    ///     move |value| last.set(Some(value))
    /// });
    ///
    /// // The current value is delivered on subscribe.
    /// assert_eq!(last.get(), Some(true));
    ///
    /// flag.set(false);
    /// assert_eq!(last.get(), Some(false));
    ///
    /// subscription.unsubscribe();
    /// flag.set(true);
    /// assert_eq!(last.get(), Some(false));
    /// ```
    pub fn subscribe(&self, callback: impl Fn(bool) + 'static) -> Subscription {
        let id = self.core.next_subscription_id.get();
        self.core.next_subscription_id.set(id.wrapping_add(1));

        let callback: Callback = Rc::new(callback);
        self.core
            .subscribers
            .borrow_mut()
            .push((id, Rc::clone(&callback)));

        let current = if self.core.notifying.get() {
            // Newer writes are still queued and will follow in order.
            self.core.delivering.get()
        } else {
            self.get()
        };
        callback(current);

        Subscription::new(Rc::downgrade(&self.core), id)
    }

    /// Returns the number of callbacks currently registered.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.core.subscribers.borrow().len()
    }
}

impl Default for ActiveFlag {
    /// Creates an inactive flag.
    fn default() -> Self {
        Self::new(false)
    }
}

impl From<bool> for ActiveFlag {
    fn from(value: bool) -> Self {
        Self::new(value)
    }
}

impl fmt::Debug for ActiveFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActiveFlag")
            .field("value", &self.get())
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}
