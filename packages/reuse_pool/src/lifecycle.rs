use std::cell::Cell;

use active_flag::ActiveFlag;

/// The active and reusable flags of a reclaimable instance, with the activation protocol that
/// a [`ReusePool`][crate::ReusePool] expects.
///
/// A new lifecycle is inactive and not reusable. [`activate()`][Self::activate] arms the
/// reusable flag before raising the active flag; [`deactivate()`][Self::deactivate] lowers
/// the active flag, which is the signal the pool reclaims on. The reusable flag stays armed
/// across deactivation, so an instance taken back out of the pool can be deactivated again
/// without being re-armed first.
///
/// # Example
///
/// ```rust
/// use reuse_pool::Lifecycle;
///
/// let lifecycle = Lifecycle::new();
/// assert!(!lifecycle.is_active());
/// assert!(!lifecycle.is_reusable());
///
/// lifecycle.activate();
/// assert!(lifecycle.is_active());
/// assert!(lifecycle.is_reusable());
///
/// lifecycle.deactivate();
/// assert!(!lifecycle.is_active());
/// assert!(lifecycle.is_reusable());
/// ```
#[derive(Debug, Default)]
pub struct Lifecycle {
    active: ActiveFlag,
    reusable: Cell<bool>,
}

impl Lifecycle {
    /// Creates an inactive, not yet reusable lifecycle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The observable active flag.
    #[must_use]
    pub fn active_flag(&self) -> &ActiveFlag {
        &self.active
    }

    /// Returns the current value of the active flag.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.get()
    }

    /// Returns whether the instance has been activated at least once.
    #[must_use]
    pub fn is_reusable(&self) -> bool {
        self.reusable.get()
    }

    /// Marks the instance reusable, then active.
    pub fn activate(&self) {
        // Must be armed before the write so observers of the write already see it.
        self.reusable.set(true);
        self.active.set(true);
    }

    /// Marks the instance inactive.
    pub fn deactivate(&self) {
        self.active.set(false);
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::rc::Rc;

    use static_assertions::assert_not_impl_any;

    use super::*;

    assert_not_impl_any!(Lifecycle: Send, Sync);

    #[test]
    fn reusable_is_armed_before_activation_is_observed() {
        let lifecycle = Rc::new(Lifecycle::new());
        let observed = Rc::new(Cell::new(None));

        let _subscription = lifecycle.active_flag().subscribe({
            let lifecycle = Rc::downgrade(&lifecycle);
            let observed = Rc::clone(&observed);
            move |active| {
                if !active {
                    return;
                }

                if let Some(lifecycle) = lifecycle.upgrade() {
                    observed.set(Some(lifecycle.is_reusable()));
                }
            }
        });

        lifecycle.activate();

        assert_eq!(observed.get(), Some(true));
    }

    #[test]
    fn deactivate_keeps_reusable() {
        let lifecycle = Lifecycle::new();

        lifecycle.activate();
        lifecycle.deactivate();
        lifecycle.deactivate();

        assert!(!lifecycle.is_active());
        assert!(lifecycle.is_reusable());
    }

    #[test]
    fn deactivate_before_activate_is_not_reusable() {
        let lifecycle = Lifecycle::new();

        lifecycle.deactivate();

        assert!(!lifecycle.is_reusable());
    }
}
