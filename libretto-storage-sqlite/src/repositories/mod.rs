//! Repository implementations for SQLite storage

pub mod catalog;
pub mod key_value;

pub use catalog::SqliteCatalogRepository;
pub use key_value::SqliteKeyValueRepository;

use async_trait::async_trait;
use libretto_core::{
    Error,
    error::StorageError,
    repositories::{CatalogRepositoryProvider, KeyValueRepositoryProvider, RepositoryProvider},
};
use sqlx::SqlitePool;
use std::sync::Arc;

/// Repository provider implementation for SQLite.
///
/// Implements the individual provider traits and the unified
/// [`RepositoryProvider`] over one shared connection pool.
pub struct SqliteRepositoryProvider {
    pool: SqlitePool,
    key_value: Arc<SqliteKeyValueRepository>,
    catalog: Arc<SqliteCatalogRepository>,
}

impl SqliteRepositoryProvider {
    pub fn new(pool: SqlitePool) -> Self {
        let key_value = Arc::new(SqliteKeyValueRepository::new(pool.clone()));
        let catalog = Arc::new(SqliteCatalogRepository::new(pool.clone()));

        Self {
            pool,
            key_value,
            catalog,
        }
    }
}

impl KeyValueRepositoryProvider for SqliteRepositoryProvider {
    type KeyValueRepo = SqliteKeyValueRepository;

    fn key_value(&self) -> &Self::KeyValueRepo {
        &self.key_value
    }
}

impl CatalogRepositoryProvider for SqliteRepositoryProvider {
    type CatalogRepo = SqliteCatalogRepository;

    fn catalog(&self) -> &Self::CatalogRepo {
        &self.catalog
    }
}

#[async_trait]
impl RepositoryProvider for SqliteRepositoryProvider {
    async fn migrate(&self) -> Result<(), Error> {
        use crate::migrations::{SqliteMigrationManager, all_migrations};

        let manager = SqliteMigrationManager::new(self.pool.clone());
        manager.initialize().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to initialize migrations");
            Error::Storage(StorageError::Migration(
                "Failed to initialize migrations".to_string(),
            ))
        })?;

        manager.up(&all_migrations()).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to run migrations");
            Error::Storage(StorageError::Migration(
                "Failed to run migrations".to_string(),
            ))
        })?;

        Ok(())
    }

    async fn health_check(&self) -> Result<(), Error> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| Error::Storage(StorageError::Database(e.to_string())))?;
        Ok(())
    }
}
