use active_flag::{ActiveFlag, Subscription};

/// A type whose instances can be managed by a [`ReusePool`][crate::ReusePool].
///
/// A reclaimable instance exposes an observable "active" flag and a "reusable" flag. The pool
/// subscribes to the active flag once, when it creates the instance, and moves the instance
/// into the reuse stack of its type whenever the flag is written `false` while the instance
/// reports itself as reusable.
///
/// The reusable flag is owned by the instance. It must be `false` on a freshly created
/// instance and become `true` as part of the instance's own activation, before the active flag
/// is written. Until then, `false` values of the active flag (including the initial one that
/// the pool observes when subscribing) are not treated as deactivations.
///
/// Most implementations embed a [`Lifecycle`][crate::Lifecycle], which implements that
/// protocol, and delegate to it.
///
/// # Example
///
/// ```rust
/// use reuse_pool::{ActiveFlag, Lifecycle, Reclaimable};
///
/// #[derive(Default)]
/// struct Spark {
///     lifecycle: Lifecycle,
/// }
///
/// impl Reclaimable for Spark {
///     fn active_flag(&self) -> &ActiveFlag {
///         self.lifecycle.active_flag()
///     }
///
///     fn is_reusable(&self) -> bool {
///         self.lifecycle.is_reusable()
///     }
/// }
///
/// let spark = Spark::default();
/// assert!(!spark.is_active());
///
/// spark.lifecycle.activate();
/// assert!(spark.is_active());
/// assert!(spark.is_reusable());
/// ```
pub trait Reclaimable: 'static {
    /// The observable flag that tells whether the instance is in use.
    fn active_flag(&self) -> &ActiveFlag;

    /// Whether a `false` write to the active flag should return the instance to its pool.
    fn is_reusable(&self) -> bool;

    /// Returns the current value of the active flag.
    fn is_active(&self) -> bool {
        self.active_flag().get()
    }

    /// Writes the active flag, notifying its observers.
    fn set_active(&self, active: bool) {
        self.active_flag().set(active);
    }

    /// Registers `callback` to observe every write to the active flag.
    ///
    /// The callback receives the current value immediately. See [`ActiveFlag::subscribe()`].
    fn observe_active(&self, callback: impl Fn(bool) + 'static) -> Subscription
    where
        Self: Sized,
    {
        self.active_flag().subscribe(callback)
    }
}
