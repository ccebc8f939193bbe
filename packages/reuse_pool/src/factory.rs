use std::any::{Any, TypeId};
use std::fmt;

use foldhash::{HashMap, HashMapExt};

use crate::Reclaimable;

/// Produces new, not yet activated instances for a [`ReusePool`][crate::ReusePool].
///
/// The pool only asks the factory for a new instance when the reuse stack of the requested
/// type is empty. Returning `None` means the factory does not know how to produce the type,
/// which the pool reports as [`Error::UnknownPrefab`][crate::Error::UnknownPrefab].
///
/// Instances returned by a factory must be in their fresh state: inactive and not reusable.
///
/// [`Producers`] is the factory used unless another one is supplied.
pub trait Factory {
    /// Produces a new instance of `T`, or `None` if `T` is not known to this factory.
    fn try_create<T: Reclaimable>(&self) -> Option<T>;
}

type Producer = Box<dyn Fn() -> Box<dyn Any>>;

/// A [`Factory`] backed by a table of producer functions, one per type.
///
/// # Example
///
/// ```rust
/// use reuse_pool::{ActiveFlag, Factory, Lifecycle, Producers, Reclaimable};
///
/// #[derive(Default)]
/// struct Coin {
///     lifecycle: Lifecycle,
/// }
///
/// impl Reclaimable for Coin {
///     fn active_flag(&self) -> &ActiveFlag {
///         self.lifecycle.active_flag()
///     }
///
///     fn is_reusable(&self) -> bool {
///         self.lifecycle.is_reusable()
///     }
/// }
///
/// let producers = Producers::new().with(Coin::default);
///
/// assert!(producers.contains::<Coin>());
/// assert!(producers.try_create::<Coin>().is_some());
/// ```
#[derive(Default)]
pub struct Producers {
    producers: HashMap<TypeId, Producer>,
}

impl Producers {
    /// Creates an empty producer table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            producers: HashMap::new(),
        }
    }

    /// Registers `produce` as the producer of `T`, returning the updated table.
    ///
    /// A producer registered earlier for the same type is replaced.
    #[must_use]
    pub fn with<T: Reclaimable>(mut self, produce: impl Fn() -> T + 'static) -> Self {
        self.insert(produce);
        self
    }

    /// Registers `produce` as the producer of `T`.
    ///
    /// Returns `true` if this replaced a producer registered earlier for the same type.
    pub fn insert<T: Reclaimable>(&mut self, produce: impl Fn() -> T + 'static) -> bool {
        let producer: Producer = Box::new(move || -> Box<dyn Any> { Box::new(produce()) });

        self.producers
            .insert(TypeId::of::<T>(), producer)
            .is_some()
    }

    /// Returns whether a producer is registered for `T`.
    #[must_use]
    pub fn contains<T: 'static>(&self) -> bool {
        self.producers.contains_key(&TypeId::of::<T>())
    }

    /// Returns the number of types that have a producer.
    #[must_use]
    pub fn len(&self) -> usize {
        self.producers.len()
    }

    /// Returns whether no producer is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.producers.is_empty()
    }
}

impl Factory for Producers {
    fn try_create<T: Reclaimable>(&self) -> Option<T> {
        let produce = self.producers.get(&TypeId::of::<T>())?;

        let produced = produce()
            .downcast::<T>()
            .expect("producers are only ever stored under the TypeId of the type they produce");

        Some(*produced)
    }
}

impl fmt::Debug for Producers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Producers")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use active_flag::ActiveFlag;
    use static_assertions::assert_not_impl_any;

    use super::*;

    assert_not_impl_any!(Producers: Send, Sync);

    struct Numbered {
        number: u32,
        active: ActiveFlag,
    }

    impl Reclaimable for Numbered {
        fn active_flag(&self) -> &ActiveFlag {
            &self.active
        }

        fn is_reusable(&self) -> bool {
            false
        }
    }

    #[allow(dead_code, reason = "only used as a type that has no producer")]
    struct Unregistered {
        active: ActiveFlag,
    }

    impl Reclaimable for Unregistered {
        fn active_flag(&self) -> &ActiveFlag {
            &self.active
        }

        fn is_reusable(&self) -> bool {
            false
        }
    }

    #[test]
    fn empty_table_produces_nothing() {
        let producers = Producers::new();

        assert!(producers.is_empty());
        assert!(producers.try_create::<Numbered>().is_none());
    }

    #[test]
    fn each_call_runs_the_producer() {
        let counter = Rc::new(Cell::new(0_u32));
        let producers = Producers::new().with({
            let counter = Rc::clone(&counter);
            move || {
                counter.set(counter.get().wrapping_add(1));
                Numbered {
                    number: counter.get(),
                    active: ActiveFlag::default(),
                }
            }
        });

        let first = producers.try_create::<Numbered>().map(|n| n.number);
        let second = producers.try_create::<Numbered>().map(|n| n.number);

        assert_eq!(first, Some(1));
        assert_eq!(second, Some(2));
    }

    #[test]
    fn unknown_type_is_none() {
        let producers = Producers::new().with(|| Numbered {
            number: 0,
            active: ActiveFlag::default(),
        });

        assert!(producers.contains::<Numbered>());
        assert!(!producers.contains::<Unregistered>());
        assert!(producers.try_create::<Unregistered>().is_none());
    }

    #[test]
    fn insert_replaces_previous_producer() {
        let mut producers = Producers::new();

        let replaced = producers.insert(|| Numbered {
            number: 1,
            active: ActiveFlag::default(),
        });
        assert!(!replaced);

        let replaced = producers.insert(|| Numbered {
            number: 2,
            active: ActiveFlag::default(),
        });
        assert!(replaced);

        assert_eq!(producers.len(), 1);
        assert_eq!(producers.try_create::<Numbered>().map(|n| n.number), Some(2));
    }
}
