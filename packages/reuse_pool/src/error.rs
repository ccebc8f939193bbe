use thiserror::Error;

/// Errors that can occur when acquiring instances or querying pools.
///
/// [`UnknownPrefab`][Error::UnknownPrefab] and [`NotFound`][Error::NotFound] are ordinary
/// outcomes that callers are expected to branch on. The remaining variants are only returned
/// by the lower level [`TypeRegistry`][crate::TypeRegistry] API and indicate misuse of it.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The factory has no producer for the requested type.
    #[error("no producer is registered for '{type_name}'")]
    UnknownPrefab {
        /// Name of the requested type.
        type_name: &'static str,
    },

    /// No instance of the requested type has ever been created, so it has no management list.
    #[error("management list for '{type_name}' is not found")]
    NotFound {
        /// Name of the requested type.
        type_name: &'static str,
    },

    /// A pool was created for a type that already has one.
    #[error("a pool for '{type_name}' already exists")]
    DuplicatePool {
        /// Name of the type whose pool was created twice.
        type_name: &'static str,
    },

    /// An instance was added to the pool of a type that has no pool.
    #[error("no pool exists for '{type_name}'")]
    UnknownType {
        /// Name of the type that has no pool.
        type_name: &'static str,
    },
}

/// A specialized `Result` type for pool operations, returning the crate's
/// [`Error`] type as the error value.
pub type Result<T> = std::result::Result<T, Error>;
