use std::any::{Any, TypeId, type_name};
use std::fmt;
use std::rc::Rc;

use foldhash::{HashMap, HashMapExt, HashSet, HashSetExt};

use crate::{Error, Result};

/// The live list and reuse stack of one type in a [`TypeRegistry`].
pub struct PoolEntry<T> {
    /// Every instance ever added, in insertion order. Append-only.
    live: Vec<Rc<T>>,

    /// Instances waiting to be reused. The top of the stack is the last element.
    reuse: Vec<Rc<T>>,

    /// Addresses of the instances in `reuse`, to keep the stack free of duplicates.
    /// Addresses are stable and unique because `live` keeps every instance alive.
    pooled: HashSet<usize>,
}

impl<T> PoolEntry<T> {
    fn new() -> Self {
        Self {
            live: Vec::new(),
            reuse: Vec::new(),
            pooled: HashSet::new(),
        }
    }

    /// Every instance ever added to the entry, in insertion order.
    #[must_use]
    pub fn live(&self) -> &[Rc<T>] {
        &self.live
    }

    /// The instances waiting to be reused, from the bottom of the stack to the top.
    #[must_use]
    pub fn reuse(&self) -> &[Rc<T>] {
        &self.reuse
    }

    fn push_reuse(&mut self, instance: Rc<T>) -> bool {
        if !self.pooled.insert(address_of(&instance)) {
            return false;
        }

        self.reuse.push(instance);
        true
    }

    fn pop_reuse(&mut self) -> Option<Rc<T>> {
        let instance = self.reuse.pop()?;
        self.pooled.remove(&address_of(&instance));
        Some(instance)
    }
}

impl<T> fmt::Debug for PoolEntry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolEntry")
            .field("live", &self.live.len())
            .field("reuse", &self.reuse.len())
            .finish_non_exhaustive()
    }
}

fn address_of<T>(instance: &Rc<T>) -> usize {
    Rc::as_ptr(instance).addr()
}

/// A store of [`PoolEntry`] values keyed by the type of the instances they hold.
///
/// Each type has at most one entry, created explicitly with
/// [`create_pool()`][Self::create_pool]. Entries are never removed.
///
/// This is the storage layer under [`ReusePool`][crate::ReusePool], which decides when entries
/// are created and when instances move between the live list and the reuse stack. It is exposed
/// for callers that want to drive that wiring themselves.
///
/// # Example
///
/// ```rust
/// use std::rc::Rc;
///
/// use reuse_pool::TypeRegistry;
///
/// let mut registry = TypeRegistry::new();
/// registry.create_pool::<String>().unwrap();
///
/// let greeting = Rc::new("hello".to_string());
/// registry.append_live(Rc::clone(&greeting)).unwrap();
/// registry.push_reuse(Rc::clone(&greeting)).unwrap();
///
/// let reused = registry.pop_reuse::<String>().unwrap();
/// assert!(Rc::ptr_eq(&reused, &greeting));
/// assert_eq!(registry.get_live::<String>().unwrap().len(), 1);
/// ```
pub struct TypeRegistry {
    /// Each value is a `PoolEntry<T>` for the `T` whose `TypeId` is the key.
    entries: HashMap<TypeId, Box<dyn Any>>,
}

impl TypeRegistry {
    /// Creates a registry with no entries.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Returns the entry of `T`, or `None` if no entry was created for `T`.
    #[must_use]
    pub fn get_pool<T: 'static>(&self) -> Option<&PoolEntry<T>> {
        self.entries.get(&TypeId::of::<T>()).map(|erased| {
            erased
                .downcast_ref::<PoolEntry<T>>()
                .expect("entries are only ever stored under the TypeId of their item type")
        })
    }

    fn get_pool_mut<T: 'static>(&mut self) -> Option<&mut PoolEntry<T>> {
        self.entries.get_mut(&TypeId::of::<T>()).map(|erased| {
            erased
                .downcast_mut::<PoolEntry<T>>()
                .expect("entries are only ever stored under the TypeId of their item type")
        })
    }

    /// Creates an empty entry for `T`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicatePool`] if `T` already has an entry. The existing entry is left
    /// untouched.
    pub fn create_pool<T: 'static>(&mut self) -> Result<&PoolEntry<T>> {
        if self.contains::<T>() {
            return Err(Error::DuplicatePool {
                type_name: type_name::<T>(),
            });
        }

        self.entries
            .insert(TypeId::of::<T>(), Box::new(PoolEntry::<T>::new()));

        Ok(self
            .get_pool::<T>()
            .expect("we just inserted the entry for this type"))
    }

    /// Removes and returns the instance at the top of the reuse stack of `T`.
    ///
    /// Returns `None` if the stack is empty or `T` has no entry.
    pub fn pop_reuse<T: 'static>(&mut self) -> Option<Rc<T>> {
        self.get_pool_mut::<T>()?.pop_reuse()
    }

    /// Pushes `instance` onto the reuse stack of `T`.
    ///
    /// Returns `false` without changing anything if `instance` is already on the stack.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownType`] if `T` has no entry.
    pub fn push_reuse<T: 'static>(&mut self, instance: Rc<T>) -> Result<bool> {
        let entry = self.get_pool_mut::<T>().ok_or(Error::UnknownType {
            type_name: type_name::<T>(),
        })?;

        Ok(entry.push_reuse(instance))
    }

    /// Appends `instance` to the live list of `T`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownType`] if `T` has no entry.
    pub fn append_live<T: 'static>(&mut self, instance: Rc<T>) -> Result<()> {
        let entry = self.get_pool_mut::<T>().ok_or(Error::UnknownType {
            type_name: type_name::<T>(),
        })?;

        entry.live.push(instance);
        Ok(())
    }

    /// Returns the live list of `T`, or `None` if `T` has no entry.
    #[must_use]
    pub fn get_live<T: 'static>(&self) -> Option<&[Rc<T>]> {
        self.get_pool::<T>().map(PoolEntry::live)
    }

    /// Returns whether `T` has an entry.
    #[must_use]
    pub fn contains<T: 'static>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<T>())
    }

    /// Returns the number of instances on the reuse stack of `T`, zero if `T` has no entry.
    #[must_use]
    pub fn pooled_len<T: 'static>(&self) -> usize {
        self.get_pool::<T>().map_or(0, |entry| entry.reuse.len())
    }

    /// Returns the number of types that have an entry.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether no type has an entry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("types", &self.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use static_assertions::assert_not_impl_any;

    use super::*;

    assert_not_impl_any!(TypeRegistry: Send, Sync);

    #[test]
    fn get_pool_does_not_create() {
        let registry = TypeRegistry::new();

        assert!(registry.get_pool::<u32>().is_none());
        assert!(registry.get_live::<u32>().is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn create_pool_starts_empty() {
        let mut registry = TypeRegistry::new();

        let entry = registry.create_pool::<u32>().unwrap();

        assert!(entry.live().is_empty());
        assert!(entry.reuse().is_empty());
        assert_eq!(registry.len(), 1);
        assert!(registry.contains::<u32>());
    }

    #[test]
    fn create_pool_twice_is_duplicate() {
        let mut registry = TypeRegistry::new();
        registry.create_pool::<u32>().unwrap();
        registry.append_live(Rc::new(5_u32)).unwrap();

        let result = registry.create_pool::<u32>();

        assert!(matches!(result, Err(Error::DuplicatePool { .. })));
        assert_eq!(registry.get_live::<u32>().unwrap().len(), 1);
    }

    #[test]
    fn push_and_append_need_an_entry() {
        let mut registry = TypeRegistry::new();

        assert!(matches!(
            registry.push_reuse(Rc::new(1_u8)),
            Err(Error::UnknownType { .. })
        ));
        assert!(matches!(
            registry.append_live(Rc::new(1_u8)),
            Err(Error::UnknownType { .. })
        ));
        assert!(registry.pop_reuse::<u8>().is_none());
    }

    #[test]
    fn reuse_stack_is_lifo() {
        let mut registry = TypeRegistry::new();
        registry.create_pool::<u32>().unwrap();

        let first = Rc::new(1_u32);
        let second = Rc::new(2_u32);
        registry.push_reuse(Rc::clone(&first)).unwrap();
        registry.push_reuse(Rc::clone(&second)).unwrap();

        assert!(Rc::ptr_eq(&registry.pop_reuse::<u32>().unwrap(), &second));
        assert!(Rc::ptr_eq(&registry.pop_reuse::<u32>().unwrap(), &first));
        assert!(registry.pop_reuse::<u32>().is_none());
    }

    #[test]
    fn same_instance_is_pooled_once() {
        let mut registry = TypeRegistry::new();
        registry.create_pool::<u32>().unwrap();
        let instance = Rc::new(7_u32);

        assert!(registry.push_reuse(Rc::clone(&instance)).unwrap());
        assert!(!registry.push_reuse(Rc::clone(&instance)).unwrap());
        assert_eq!(registry.pooled_len::<u32>(), 1);

        // Once popped, it may be pooled again.
        registry.pop_reuse::<u32>().unwrap();
        assert!(registry.push_reuse(instance).unwrap());
    }

    #[test]
    fn equal_values_are_distinct_instances() {
        let mut registry = TypeRegistry::new();
        registry.create_pool::<u32>().unwrap();

        assert!(registry.push_reuse(Rc::new(3_u32)).unwrap());
        assert!(registry.push_reuse(Rc::new(3_u32)).unwrap());

        assert_eq!(registry.pooled_len::<u32>(), 2);
    }

    #[test]
    fn types_are_kept_apart() {
        let mut registry = TypeRegistry::new();
        registry.create_pool::<u32>().unwrap();
        registry.create_pool::<String>().unwrap();

        registry.append_live(Rc::new(1_u32)).unwrap();
        registry.push_reuse(Rc::new("a".to_string())).unwrap();

        assert_eq!(registry.get_live::<u32>().unwrap().len(), 1);
        assert!(registry.get_live::<String>().unwrap().is_empty());
        assert_eq!(registry.pooled_len::<u32>(), 0);
        assert_eq!(registry.pooled_len::<String>(), 1);
    }

    #[test]
    fn live_list_is_append_only_and_ordered() {
        let mut registry = TypeRegistry::new();
        registry.create_pool::<u32>().unwrap();

        for value in 0..4_u32 {
            registry.append_live(Rc::new(value)).unwrap();
        }
        registry.pop_reuse::<u32>();

        let live: Vec<u32> = registry
            .get_live::<u32>()
            .unwrap()
            .iter()
            .map(|value| **value)
            .collect();
        assert_eq!(live, vec![0, 1, 2, 3]);
    }
}
