use std::any::type_name;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::thread;

use active_flag::Subscription;
use tracing::{debug, error, trace};

use crate::{
    DropPolicy, Error, Factory, Producers, Reclaimable, Result, ReusePoolBuilder, TypeRegistry,
};

/// An instance created by the pool, with the subscription that reclaims it.
struct Tracked {
    instance: Weak<dyn Reclaimable>,

    // Held only to keep the reclamation callback registered until the pool goes away.
    _reclaim: Subscription,
}

/// Hands out instances of any [`Reclaimable`] type, reusing deactivated instances before
/// creating new ones.
///
/// For every type it is asked for, the pool keeps a live list of all instances it ever created
/// and a stack of instances waiting for reuse. [`acquire()`][Self::acquire] pops the most
/// recently reclaimed instance of the type if there is one, and otherwise asks its [`Factory`]
/// for a new instance.
///
/// When the pool creates an instance, it subscribes to the instance's active flag once. From
/// then on, every `false` write to the flag made while the instance
/// [is reusable][Reclaimable::is_reusable] pushes the instance onto the reuse stack of its
/// type. The caller never hands instances back explicitly; deactivating them is enough.
///
/// Instances are never destroyed by the pool while it exists. Dropping the pool (or calling
/// [`shutdown()`][Self::shutdown]) unregisters all reclamation callbacks at once and releases
/// the pool's references to the instances.
///
/// # Example
///
/// ```rust
/// use std::rc::Rc;
///
/// use reuse_pool::{ActiveFlag, Lifecycle, Reclaimable, ReusePool};
///
/// #[derive(Default)]
/// struct Bullet {
///     lifecycle: Lifecycle,
/// }
///
/// impl Reclaimable for Bullet {
///     fn active_flag(&self) -> &ActiveFlag {
///         self.lifecycle.active_flag()
///     }
///
///     fn is_reusable(&self) -> bool {
///         self.lifecycle.is_reusable()
///     }
/// }
///
/// let pool = ReusePool::builder().producer(Bullet::default).build();
///
/// let bullet = pool.acquire::<Bullet>().unwrap();
/// bullet.lifecycle.activate();
///
/// // Deactivating the bullet returns it to the pool.
/// bullet.lifecycle.deactivate();
/// assert_eq!(pool.pooled_len::<Bullet>(), 1);
///
/// // The next acquisition reuses it instead of creating a new one.
/// let again = pool.acquire::<Bullet>().unwrap();
/// assert!(Rc::ptr_eq(&bullet, &again));
/// assert_eq!(pool.live_len::<Bullet>(), 1);
/// ```
///
/// # Thread safety
///
/// The pool is single-threaded and is neither [`Send`] nor [`Sync`]. Reclamation happens
/// synchronously on the thread that deactivates an instance.
pub struct ReusePool<F = Producers> {
    registry: Rc<RefCell<TypeRegistry>>,

    factory: F,

    tracked: RefCell<Vec<Tracked>>,

    drop_policy: DropPolicy,
}

impl ReusePool {
    /// Creates a builder for configuring and constructing a [`ReusePool`].
    ///
    /// # Example
    ///
    /// ```rust
    /// use reuse_pool::{DropPolicy, ReusePool};
    ///
    /// let pool = ReusePool::builder()
    ///     .drop_policy(DropPolicy::MustNotDropActive)
    ///     .build();
    /// ```
    pub fn builder() -> ReusePoolBuilder {
        ReusePoolBuilder::new()
    }
}

impl<F: Factory> ReusePool<F> {
    /// Creates a pool that obtains new instances from `factory`, with default configuration.
    ///
    /// For custom configuration, use [`ReusePool::builder()`].
    ///
    /// # Example
    ///
    /// ```rust
    /// use reuse_pool::{Producers, ReusePool};
    ///
    /// let pool = ReusePool::new(Producers::new());
    /// assert_eq!(pool.type_count(), 0);
    /// ```
    #[must_use]
    pub fn new(factory: F) -> Self {
        Self::new_inner(factory, DropPolicy::default())
    }

    pub(crate) fn new_inner(factory: F, drop_policy: DropPolicy) -> Self {
        Self {
            registry: Rc::new(RefCell::new(TypeRegistry::new())),
            factory,
            tracked: RefCell::new(Vec::new()),
            drop_policy,
        }
    }

    /// Returns an instance of `T`, reusing a reclaimed instance if one is available.
    ///
    /// A reused instance is the most recently reclaimed instance of `T`. A new instance is
    /// appended to the live list of `T` and stays there for the lifetime of the pool.
    ///
    /// Either way the instance is inactive; activating it is up to the caller.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownPrefab`] if no instance of `T` is waiting for reuse and the
    /// factory cannot produce `T`. The pool is left as it was, so no entry for `T` is created.
    pub fn acquire<T: Reclaimable>(&self) -> Result<Rc<T>> {
        let reused = self.registry.borrow_mut().pop_reuse::<T>();

        if let Some(instance) = reused {
            debug!(target: "reuse_pool", ty = type_name::<T>(), "reusing pooled instance");
            return Ok(instance);
        }

        let Some(instance) = self.factory.try_create::<T>() else {
            let error = Error::UnknownPrefab {
                type_name: type_name::<T>(),
            };
            error!(target: "reuse_pool", %error, "cannot create instance");
            return Err(error);
        };

        let instance = Rc::new(instance);

        {
            let mut registry = self.registry.borrow_mut();

            if !registry.contains::<T>() {
                registry
                    .create_pool::<T>()
                    .expect("we checked that no pool exists for this type");
                debug!(target: "reuse_pool", ty = type_name::<T>(), "created pool");
            }

            // Appended before subscribing so that every pooled instance is also live, even if
            // a misbehaving factory hands out an instance that is already reusable.
            registry
                .append_live(Rc::clone(&instance))
                .expect("the pool for this type was created above");
        }

        // The flag delivers its current value immediately, so no registry borrow may be held.
        let reclaim = instance.observe_active(reclaim_on_deactivate(
            Rc::downgrade(&instance),
            Rc::downgrade(&self.registry),
        ));

        let weak_instance: Weak<T> = Rc::downgrade(&instance);
        let weak_instance: Weak<dyn Reclaimable> = weak_instance;
        self.tracked.borrow_mut().push(Tracked {
            instance: weak_instance,
            _reclaim: reclaim,
        });

        debug!(target: "reuse_pool", ty = type_name::<T>(), "created new instance");

        Ok(instance)
    }

    /// Returns every instance of `T` the pool has ever created, in creation order.
    ///
    /// The returned list is a snapshot: instances created later are not added to it. The
    /// instances themselves are shared with the pool.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the pool has never created an instance of `T`. This does
    /// not create an entry for `T`.
    pub fn management_list<T: Reclaimable>(&self) -> Result<Vec<Rc<T>>> {
        let registry = self.registry.borrow();

        if let Some(live) = registry.get_live::<T>() {
            return Ok(live.to_vec());
        }

        let error = Error::NotFound {
            type_name: type_name::<T>(),
        };
        error!(target: "reuse_pool", %error, "cannot provide management list");
        Err(error)
    }

    /// Returns the number of instances of `T` the pool has created.
    #[must_use]
    pub fn live_len<T: Reclaimable>(&self) -> usize {
        self.registry
            .borrow()
            .get_live::<T>()
            .map_or(0, <[Rc<T>]>::len)
    }

    /// Returns the number of instances of `T` waiting for reuse.
    #[must_use]
    pub fn pooled_len<T: Reclaimable>(&self) -> usize {
        self.registry.borrow().pooled_len::<T>()
    }

    /// Returns whether the pool has created an instance of `T`.
    #[must_use]
    pub fn has_pool<T: Reclaimable>(&self) -> bool {
        self.registry.borrow().contains::<T>()
    }

    /// Returns the number of distinct types the pool has created instances of.
    #[must_use]
    pub fn type_count(&self) -> usize {
        self.registry.borrow().len()
    }

    /// Returns the number of reclamation callbacks the pool has registered, one per instance
    /// it created.
    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.tracked.borrow().len()
    }

    /// Returns the number of instances created by the pool that are currently active, across
    /// all types.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.tracked
            .borrow()
            .iter()
            .filter_map(|tracked| tracked.instance.upgrade())
            .filter(|instance| instance.is_active())
            .count()
    }

    /// Returns the factory that creates new instances.
    #[must_use]
    pub fn factory(&self) -> &F {
        &self.factory
    }

    /// Shuts the pool down, unregistering every reclamation callback.
    ///
    /// This is equivalent to dropping the pool. Instances still held by callers remain usable
    /// but are no longer reclaimed.
    ///
    /// # Panics
    ///
    /// Panics if the pool was built with [`DropPolicy::MustNotDropActive`] and any instance it
    /// created is still active.
    #[cfg_attr(test, mutants::skip)] // The pool is dropped either way, so mutations are not observable.
    pub fn shutdown(self) {
        drop(self);
    }
}

/// Builds the callback that returns `instance` to the reuse stack of `T` when it deactivates.
///
/// Both captures are weak: the callback lives inside the instance's own flag, and must not keep
/// the instance or the registry alive.
fn reclaim_on_deactivate<T: Reclaimable>(
    instance: Weak<T>,
    registry: Weak<RefCell<TypeRegistry>>,
) -> impl Fn(bool) + 'static {
    move |active| {
        if active {
            return;
        }

        let Some(instance) = instance.upgrade() else {
            return;
        };

        if !instance.is_reusable() {
            trace!(
                target: "reuse_pool",
                ty = type_name::<T>(),
                "ignoring deactivation of instance that is not reusable yet"
            );
            return;
        }

        let Some(registry) = registry.upgrade() else {
            return;
        };

        let pushed = registry
            .borrow_mut()
            .push_reuse(instance)
            .expect("the pool for a type is created before any instance of it is observed");

        if pushed {
            debug!(target: "reuse_pool", ty = type_name::<T>(), "reclaimed instance");
        }
    }
}

impl<F> Drop for ReusePool<F> {
    fn drop(&mut self) {
        let tracked = self.tracked.get_mut();

        if self.drop_policy == DropPolicy::MustNotDropActive && !thread::panicking() {
            let active = tracked
                .iter()
                .filter_map(|tracked| tracked.instance.upgrade())
                .filter(|instance| instance.is_active())
                .count();

            assert!(
                active == 0,
                "dropped a ReusePool with {active} active instances, which is forbidden by its drop policy"
            );
        }

        debug!(target: "reuse_pool", subscriptions = tracked.len(), "shutting down");
        tracked.clear();
    }
}

impl<F> fmt::Debug for ReusePool<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReusePool")
            .field("registry", &self.registry)
            .field("subscriptions", &self.tracked.borrow().len())
            .field("drop_policy", &self.drop_policy)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::cell::Cell;
    use std::panic::{AssertUnwindSafe, catch_unwind};

    use active_flag::ActiveFlag;
    use static_assertions::assert_not_impl_any;

    use super::*;
    use crate::Lifecycle;

    assert_not_impl_any!(ReusePool: Send, Sync);

    #[derive(Default)]
    struct Widget {
        lifecycle: Lifecycle,
    }

    impl Reclaimable for Widget {
        fn active_flag(&self) -> &ActiveFlag {
            self.lifecycle.active_flag()
        }

        fn is_reusable(&self) -> bool {
            self.lifecycle.is_reusable()
        }
    }

    /// Claims to be reusable from the start, violating the fresh-state contract.
    struct EagerlyReusable {
        active: ActiveFlag,
    }

    impl Reclaimable for EagerlyReusable {
        fn active_flag(&self) -> &ActiveFlag {
            &self.active
        }

        fn is_reusable(&self) -> bool {
            true
        }
    }

    fn pool() -> ReusePool {
        ReusePool::builder().producer(Widget::default).build()
    }

    #[test]
    fn created_instance_is_subscribed_once() {
        let pool = pool();

        let widget = pool.acquire::<Widget>().unwrap();

        assert_eq!(pool.subscription_count(), 1);
        assert_eq!(widget.active_flag().subscriber_count(), 1);
    }

    #[test]
    fn reused_instance_is_not_subscribed_again() {
        let pool = pool();
        let widget = pool.acquire::<Widget>().unwrap();
        widget.lifecycle.activate();
        widget.lifecycle.deactivate();

        let again = pool.acquire::<Widget>().unwrap();

        assert!(Rc::ptr_eq(&widget, &again));
        assert_eq!(pool.subscription_count(), 1);
        assert_eq!(again.active_flag().subscriber_count(), 1);
    }

    #[test]
    fn repeated_deactivation_pools_once() {
        let pool = pool();
        let widget = pool.acquire::<Widget>().unwrap();
        widget.lifecycle.activate();

        widget.lifecycle.deactivate();
        widget.lifecycle.deactivate();

        assert_eq!(pool.pooled_len::<Widget>(), 1);
    }

    #[test]
    fn misbehaving_factory_instance_stays_consistent() {
        let pool = ReusePool::builder()
            .producer(|| EagerlyReusable {
                active: ActiveFlag::default(),
            })
            .build();

        let instance = pool.acquire::<EagerlyReusable>().unwrap();

        // The initial value was taken as a deactivation, but the instance is also live.
        assert_eq!(pool.pooled_len::<EagerlyReusable>(), 1);
        assert_eq!(pool.live_len::<EagerlyReusable>(), 1);
        drop(instance);
    }

    #[test]
    fn shutdown_unregisters_callbacks() {
        let pool = pool();
        let widget = pool.acquire::<Widget>().unwrap();
        widget.lifecycle.activate();

        pool.shutdown();

        assert_eq!(widget.active_flag().subscriber_count(), 0);
        // Deactivating after shutdown is harmless.
        widget.lifecycle.deactivate();
    }

    #[test]
    fn pool_does_not_keep_released_instances_after_drop() {
        let pool = pool();
        let widget = pool.acquire::<Widget>().unwrap();
        let weak = Rc::downgrade(&widget);

        drop(widget);
        assert!(weak.upgrade().is_some(), "the live list keeps the instance");

        drop(pool);
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn active_count_spans_types() {
        let pool = ReusePool::builder()
            .producer(Widget::default)
            .producer(|| EagerlyReusable {
                active: ActiveFlag::default(),
            })
            .build();

        let widget = pool.acquire::<Widget>().unwrap();
        let eager = pool.acquire::<EagerlyReusable>().unwrap();
        widget.lifecycle.activate();
        eager.set_active(true);

        assert_eq!(pool.active_count(), 2);
        assert_eq!(pool.type_count(), 2);

        eager.set_active(false);
        assert_eq!(pool.active_count(), 1);
    }

    #[test]
    fn tracked_instances_follow_their_owners() {
        let pool = pool();
        let first = pool.acquire::<Widget>().unwrap();
        let second = pool.acquire::<Widget>().unwrap();
        first.lifecycle.activate();
        second.lifecycle.activate();

        assert_eq!(pool.subscription_count(), 2);
        assert_eq!(pool.active_count(), 2);

        second.lifecycle.deactivate();
        assert_eq!(pool.active_count(), 1);
        assert_eq!(pool.subscription_count(), 2);
    }

    #[test]
    fn must_not_drop_active_panics_with_active_instance() {
        let pool = ReusePool::builder()
            .producer(Widget::default)
            .drop_policy(DropPolicy::MustNotDropActive)
            .build();
        let widget = pool.acquire::<Widget>().unwrap();
        widget.lifecycle.activate();

        let result = catch_unwind(AssertUnwindSafe(move || drop(pool)));

        assert!(result.is_err());
    }

    #[test]
    fn must_not_drop_active_allows_deactivated_instances() {
        let pool = ReusePool::builder()
            .producer(Widget::default)
            .drop_policy(DropPolicy::MustNotDropActive)
            .build();
        let widget = pool.acquire::<Widget>().unwrap();
        widget.lifecycle.activate();
        widget.lifecycle.deactivate();

        pool.shutdown();
    }

    #[test]
    fn custom_factory_is_used() {
        struct Counting {
            calls: Cell<u32>,
        }

        impl Factory for Counting {
            fn try_create<T: Reclaimable>(&self) -> Option<T> {
                self.calls.set(self.calls.get().wrapping_add(1));
                None
            }
        }

        let pool = ReusePool::new(Counting {
            calls: Cell::new(0),
        });

        assert!(pool.acquire::<Widget>().is_err());
        assert_eq!(pool.factory().calls.get(), 1);
    }

    #[test]
    fn debug_output_mentions_policy() {
        let rendered = format!("{:?}", pool());

        assert!(rendered.contains("MayDropActive"));
    }
}
