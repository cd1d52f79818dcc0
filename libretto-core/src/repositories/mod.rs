//! Repository traits for the data access layer.
//!
//! Two storage contracts back the whole system:
//!
//! - [`KeyValueRepository`] — the flat durable namespace holding the owner
//!   session markers and the attempt ledger
//! - [`CatalogRepository`] — the generic record store holding books,
//!   comments, and categories
//!
//! Backends implement the individual `*RepositoryProvider` traits plus the
//! unified [`RepositoryProvider`] supertrait, which adds lifecycle methods.
//! Services borrow repositories from a shared provider through the adapter
//! structs in [`adapter`].

pub mod adapter;
pub mod catalog;
pub mod key_value;

pub use adapter::{CatalogRepositoryAdapter, KeyValueRepositoryAdapter};
pub use catalog::CatalogRepository;
pub use key_value::KeyValueRepository;

use async_trait::async_trait;

use crate::Error;

/// Provider trait for key-value repository access.
pub trait KeyValueRepositoryProvider: Send + Sync + 'static {
    /// The key-value repository implementation type
    type KeyValueRepo: KeyValueRepository;

    /// Get the key-value repository
    fn key_value(&self) -> &Self::KeyValueRepo;
}

/// Provider trait for catalog repository access.
pub trait CatalogRepositoryProvider: Send + Sync + 'static {
    /// The catalog repository implementation type
    type CatalogRepo: CatalogRepository;

    /// Get the catalog repository
    fn catalog(&self) -> &Self::CatalogRepo;
}

/// Provider trait that storage backends implement to supply all
/// repositories, plus migrations and health checks.
#[async_trait]
pub trait RepositoryProvider:
    KeyValueRepositoryProvider + CatalogRepositoryProvider
{
    /// Run migrations for all repositories
    async fn migrate(&self) -> Result<(), Error>;

    /// Health check for all repositories
    async fn health_check(&self) -> Result<(), Error>;
}
