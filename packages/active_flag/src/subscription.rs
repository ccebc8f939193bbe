use std::fmt;
use std::rc::Weak;

use crate::flag::FlagCore;

/// Keeps a callback registered with an [`ActiveFlag`][crate::ActiveFlag].
///
/// The callback stays registered for as long as this handle exists. Dropping the handle or
/// calling [`unsubscribe()`][Self::unsubscribe] removes it. A subscription does not keep the
/// flag alive: once every clone of the flag is gone, the subscription is inert.
///
/// # Example
///
/// ```rust
/// use active_flag::ActiveFlag;
///
/// let flag = ActiveFlag::new(false);
///
/// let subscription = flag.subscribe(|_| {});
/// assert!(subscription.is_attached());
/// assert_eq!(flag.subscriber_count(), 1);
///
/// drop(subscription);
/// assert_eq!(flag.subscriber_count(), 0);
/// ```
#[must_use = "dropping a subscription immediately unregisters its callback"]
pub struct Subscription {
    core: Weak<FlagCore>,
    id: u64,
}

impl Subscription {
    pub(crate) fn new(core: Weak<FlagCore>, id: u64) -> Self {
        Self { core, id }
    }

    /// Returns whether the callback is still registered with a live flag.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.core.upgrade().is_some_and(|core| core.contains(self.id))
    }

    /// Unregisters the callback.
    ///
    /// This is equivalent to dropping the subscription.
    #[cfg_attr(test, mutants::skip)] // The subscription is dropped either way, so mutations are not observable.
    pub fn unsubscribe(self) {
        drop(self);
    }

    /// Gives up control over the registration, leaving the callback registered for as long as
    /// the flag exists.
    ///
    /// # Example
    ///
    /// ```rust
    /// use active_flag::ActiveFlag;
    ///
    /// let flag = ActiveFlag::new(false);
    /// flag.subscribe(|_| {}).detach();
    ///
    /// assert_eq!(flag.subscriber_count(), 1);
    /// ```
    pub fn detach(mut self) {
        self.core = Weak::new();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(core) = self.core.upgrade() {
            core.remove(self.id);
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("attached", &self.is_attached())
            .finish_non_exhaustive()
    }
}
