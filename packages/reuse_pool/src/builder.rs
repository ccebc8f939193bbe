use crate::{DropPolicy, Factory, Producers, Reclaimable, ReusePool};

/// Builder for creating an instance of [`ReusePool`].
///
/// The builder starts out with an empty [`Producers`] table as its factory. Producers for
/// individual types are registered with [`producer()`][Self::producer], or the whole factory is
/// replaced with [`factory()`][Self::factory].
///
/// # Examples
///
/// ```
/// use reuse_pool::{ActiveFlag, DropPolicy, Lifecycle, Reclaimable, ReusePool};
///
/// #[derive(Default)]
/// struct Enemy {
///     lifecycle: Lifecycle,
/// }
///
/// impl Reclaimable for Enemy {
///     fn active_flag(&self) -> &ActiveFlag {
///         self.lifecycle.active_flag()
///     }
///
///     fn is_reusable(&self) -> bool {
///         self.lifecycle.is_reusable()
///     }
/// }
///
/// let pool = ReusePool::builder()
///     .producer(Enemy::default)
///     .drop_policy(DropPolicy::MustNotDropActive)
///     .build();
///
/// assert!(pool.acquire::<Enemy>().is_ok());
/// ```
#[derive(Debug)]
#[must_use]
pub struct ReusePoolBuilder<F = Producers> {
    factory: F,
    drop_policy: DropPolicy,
}

impl ReusePoolBuilder {
    pub(crate) fn new() -> Self {
        Self {
            factory: Producers::new(),
            drop_policy: DropPolicy::default(),
        }
    }

    /// Registers `produce` as the producer of new `T` instances.
    ///
    /// A producer registered earlier for the same type is replaced.
    pub fn producer<T: Reclaimable>(mut self, produce: impl Fn() -> T + 'static) -> Self {
        self.factory.insert(produce);
        self
    }
}

impl<F: Factory> ReusePoolBuilder<F> {
    /// Replaces the factory that produces new instances.
    ///
    /// Producers registered earlier with [`producer()`][ReusePoolBuilder::producer] are
    /// discarded together with the factory they were registered in.
    ///
    /// # Examples
    ///
    /// ```
    /// use reuse_pool::{Factory, Reclaimable, ReusePool};
    ///
    /// /// A factory that never produces anything.
    /// struct Barren;
    ///
    /// impl Factory for Barren {
    ///     fn try_create<T: Reclaimable>(&self) -> Option<T> {
    ///         None
    ///     }
    /// }
    ///
    /// let pool = ReusePool::builder().factory(Barren).build();
    /// assert_eq!(pool.type_count(), 0);
    /// ```
    pub fn factory<G: Factory>(self, factory: G) -> ReusePoolBuilder<G> {
        ReusePoolBuilder {
            factory,
            drop_policy: self.drop_policy,
        }
    }

    /// Sets the [drop policy][DropPolicy] for the pool. This governs how to treat instances
    /// that are still active when the pool is shut down.
    pub fn drop_policy(mut self, policy: DropPolicy) -> Self {
        self.drop_policy = policy;
        self
    }

    /// Builds the pool with the specified configuration.
    ///
    /// For a pool with default configuration around an existing factory, prefer
    /// [`ReusePool::new()`], which is equivalent to
    /// `ReusePool::builder().factory(factory).build()`.
    #[must_use]
    pub fn build(self) -> ReusePool<F> {
        ReusePool::new_inner(self.factory, self.drop_policy)
    }
}
