//! Repository factory trait
//!
//! Repositories are created from a shared [`DbClient`](crate::DbClient) through
//! a factory so callers never depend on a concrete SQL implementation.

/// A trait for database repository factories
///
/// Generic over the repository type and the input it is built from.
pub trait RepositoryFactory<R, C> {
    /// Create a new repository instance
    fn create_repository(&self, config: C) -> R;
}
