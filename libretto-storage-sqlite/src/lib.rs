//! SQLite storage backend for the libretto book-log.
//!
//! Provides [`SqliteStorage`] for connection management and
//! [`SqliteRepositoryProvider`] implementing the repository contracts from
//! `libretto-core` over a single connection pool.

pub mod migrations;
pub mod repositories;

pub use repositories::{SqliteCatalogRepository, SqliteKeyValueRepository, SqliteRepositoryProvider};

use libretto_core::{Error, error::StorageError, repositories::RepositoryProvider};
use sqlx::SqlitePool;

// Re-exported so downstream crates can accept a pool without depending on
// sqlx directly.
pub use sqlx::SqlitePool as Pool;

/// Connection handle to a SQLite-backed deployment.
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    /// Connect to the SQLite database at `url`.
    ///
    /// Accepts anything `sqlx` understands, e.g. `sqlite::memory:` or
    /// `sqlite://books.db`.
    pub async fn connect(url: &str) -> Result<Self, Error> {
        let pool = SqlitePool::connect(url).await.map_err(|e| {
            tracing::error!(error = %e, url, "Failed to connect to SQLite");
            StorageError::Connection(e.to_string())
        })?;

        Ok(Self::from_pool(pool))
    }

    /// Wrap an existing connection pool.
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Apply pending migrations.
    pub async fn migrate(&self) -> Result<(), Error> {
        self.clone_provider().migrate().await
    }

    /// Build the repository provider sharing this storage's pool.
    pub fn into_repository_provider(self) -> SqliteRepositoryProvider {
        SqliteRepositoryProvider::new(self.pool)
    }

    fn clone_provider(&self) -> SqliteRepositoryProvider {
        SqliteRepositoryProvider::new(self.pool.clone())
    }
}
