//! Builder for constructing [`Libretto`] instances.
//!
//! The builder uses a type-state pattern: storage must be configured before
//! `build()` exists, so a missing backend is a compile error rather than a
//! runtime one. An owner identity is required; lockout behavior and
//! auto-migration are optional.
//!
//! # Example
//!
//! ```rust,no_run
//! use libretto::LibrettoBuilder;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let libretto = LibrettoBuilder::new()
//!         .with_sqlite("sqlite::memory:")
//!         .await?
//!         .with_owner("owner@example.com", "a password")
//!         .apply_migrations(true)
//!         .build()
//!         .await?;
//!     # let _ = libretto;
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use libretto_core::{
    LockoutConfig, OwnerIdentity, repositories::RepositoryProvider,
};

use crate::Libretto;

/// Errors that can occur when building a Libretto instance.
#[derive(Debug, thiserror::Error)]
pub enum LibrettoBuilderError {
    /// Failed to connect to the storage backend
    #[error("Storage connection failed: {0}")]
    StorageConnection(String),

    /// Failed to run storage migrations
    #[error("Migration failed: {0}")]
    Migration(String),

    /// Invalid configuration provided
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// Marker type indicating no storage has been configured yet.
pub struct NoStorage;

/// Marker type indicating storage has been configured.
pub struct WithStorage<R: RepositoryProvider> {
    repositories: Arc<R>,
}

/// A type-safe builder for [`Libretto`] instances.
pub struct LibrettoBuilder<Storage> {
    storage: Storage,
    owner: Option<OwnerIdentity>,
    lockout: LockoutConfig,
    apply_migrations: bool,
}

impl Default for LibrettoBuilder<NoStorage> {
    fn default() -> Self {
        Self::new()
    }
}

impl LibrettoBuilder<NoStorage> {
    /// Create a new builder with default configuration.
    ///
    /// # Defaults
    ///
    /// - Lockout: 5 attempts, 15 minute lock, 15 minute attempt window
    /// - Apply migrations: false
    pub fn new() -> Self {
        Self {
            storage: NoStorage,
            owner: None,
            lockout: LockoutConfig::default(),
            apply_migrations: false,
        }
    }

    /// Use an already-constructed repository provider.
    pub fn with_repositories<R: RepositoryProvider>(
        self,
        repositories: Arc<R>,
    ) -> LibrettoBuilder<WithStorage<R>> {
        LibrettoBuilder {
            storage: WithStorage { repositories },
            owner: self.owner,
            lockout: self.lockout,
            apply_migrations: self.apply_migrations,
        }
    }
}

#[cfg(feature = "sqlite")]
impl LibrettoBuilder<NoStorage> {
    /// Configure SQLite storage by connecting to the given URL.
    ///
    /// # Arguments
    ///
    /// * `url` - SQLite connection URL (e.g., `sqlite::memory:` or
    ///   `sqlite://path/to/books.db`)
    pub async fn with_sqlite(
        self,
        url: &str,
    ) -> Result<
        LibrettoBuilder<WithStorage<libretto_storage_sqlite::SqliteRepositoryProvider>>,
        LibrettoBuilderError,
    > {
        let storage = libretto_storage_sqlite::SqliteStorage::connect(url)
            .await
            .map_err(|e| LibrettoBuilderError::StorageConnection(e.to_string()))?;

        Ok(self.with_repositories(Arc::new(storage.into_repository_provider())))
    }

    /// Configure SQLite storage with an existing connection pool.
    pub fn with_sqlite_pool(
        self,
        pool: libretto_storage_sqlite::Pool,
    ) -> LibrettoBuilder<WithStorage<libretto_storage_sqlite::SqliteRepositoryProvider>> {
        self.with_repositories(Arc::new(
            libretto_storage_sqlite::SqliteRepositoryProvider::new(pool),
        ))
    }
}

impl<Storage> LibrettoBuilder<Storage> {
    /// Set the owner identity the guard checks credentials against.
    pub fn with_owner(mut self, email: impl Into<String>, password: impl Into<String>) -> Self {
        self.owner = Some(OwnerIdentity::new(email, password));
        self
    }

    /// Override the lockout behavior.
    pub fn with_lockout_config(mut self, lockout: LockoutConfig) -> Self {
        self.lockout = lockout;
        self
    }

    /// Run pending migrations during `build()`.
    pub fn apply_migrations(mut self, apply: bool) -> Self {
        self.apply_migrations = apply;
        self
    }
}

impl<R: RepositoryProvider> LibrettoBuilder<WithStorage<R>> {
    /// Build the [`Libretto`] instance.
    ///
    /// Runs migrations when requested, then initializes the guard, which
    /// rehydrates any persisted owner session.
    pub async fn build(self) -> Result<Libretto<R>, LibrettoBuilderError> {
        let owner = self.owner.ok_or_else(|| {
            LibrettoBuilderError::InvalidConfiguration(
                "an owner identity is required; call with_owner()".to_string(),
            )
        })?;

        let repositories = self.storage.repositories;

        if self.apply_migrations {
            repositories
                .migrate()
                .await
                .map_err(|e| LibrettoBuilderError::Migration(e.to_string()))?;
            tracing::info!("Storage migrations applied");
        }

        Ok(Libretto::initialize(repositories, owner, self.lockout).await)
    }
}
