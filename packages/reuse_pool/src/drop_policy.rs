/// Determines how a [`ReusePool`][crate::ReusePool] treats instances that are still active when
/// the pool is shut down.
///
/// By default, the pool may be shut down at any time.
///
/// # Examples
///
/// ```
/// use reuse_pool::{DropPolicy, ReusePool};
///
/// // The drop policy is set at pool creation time.
/// let pool = ReusePool::builder()
///     .drop_policy(DropPolicy::MustNotDropActive)
///     .build();
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[non_exhaustive]
pub enum DropPolicy {
    /// The pool may be shut down while some of its instances are still active. This is the
    /// default.
    #[default]
    MayDropActive,

    /// The pool will panic if any instance it created is still active when it is shut down.
    ///
    /// This may be valuable to detect callers that forget to deactivate what they acquire,
    /// which would otherwise only show up as a pool that never gets to reuse anything.
    MustNotDropActive,
}
