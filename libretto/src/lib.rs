//! # Libretto
//!
//! Libretto is the backend of a single-owner book log: a catalog of books,
//! visitor comments, and thematic categories, plus the authentication guard
//! that protects the editing surface. Visitors browse and comment; the one
//! configured owner logs in to manage records and moderate comments.
//!
//! The guard implements brute-force lockout: five failed logins within a
//! fifteen-minute window lock the account for fifteen minutes, and lock
//! state is derived from persisted timestamps, so it survives restarts.
//!
//! ## Example
//!
//! ```rust,no_run
//! use libretto::LibrettoBuilder;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let libretto = LibrettoBuilder::new()
//!         .with_sqlite("sqlite://books.db")
//!         .await?
//!         .with_owner("owner@example.com", "a password")
//!         .apply_migrations(true)
//!         .build()
//!         .await?;
//!
//!     let outcome = libretto.login("owner@example.com", "a password").await;
//!     assert!(outcome.success);
//!
//!     for book in libretto.catalog().books().await? {
//!         println!("{} by {}", book.item.title, book.item.author);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Storage
//!
//! Storage is pluggable through the repository traits in `libretto-core`;
//! the `sqlite` feature (on by default) provides the SQLite backend.

pub mod builder;

use std::sync::Arc;

use libretto_core::repositories::{
    CatalogRepositoryAdapter, KeyValueRepositoryAdapter, RepositoryProvider,
};

pub use builder::{LibrettoBuilder, LibrettoBuilderError};

/// Re-export core types from libretto_core
///
/// These types are commonly used when working with the Libretto API.
pub use libretto_core::{
    AttemptLedger, AuthGuard, Book, CatalogService, Comment, Error, LockoutConfig, LockoutStatus,
    LoginDenial, LoginOutcome, OwnerIdentity, Page, Record, RecordId, SessionState, Stored,
    ThematicCategory,
};

/// Re-export storage backends
///
/// Available when the corresponding feature is enabled.
#[cfg(feature = "sqlite")]
pub use libretto_storage_sqlite::{SqliteRepositoryProvider, SqliteStorage};

/// The application context: auth guard plus catalog over one storage
/// provider.
///
/// Construct through [`LibrettoBuilder`] or [`Libretto::initialize`]; call
/// [`Libretto::dispose`] when tearing down.
pub struct Libretto<R: RepositoryProvider> {
    repositories: Arc<R>,
    guard: Arc<AuthGuard<KeyValueRepositoryAdapter<R>>>,
    catalog: CatalogService<CatalogRepositoryAdapter<R>>,
}

impl<R: RepositoryProvider> Libretto<R> {
    /// Wire the services and rehydrate the owner session from storage.
    pub async fn initialize(
        repositories: Arc<R>,
        identity: OwnerIdentity,
        lockout: LockoutConfig,
    ) -> Self {
        let key_value = Arc::new(KeyValueRepositoryAdapter::new(Arc::clone(&repositories)));
        let catalog = Arc::new(CatalogRepositoryAdapter::new(Arc::clone(&repositories)));

        let guard = Arc::new(AuthGuard::initialize(key_value, identity, lockout).await);

        Self {
            repositories,
            guard,
            catalog: CatalogService::new(catalog),
        }
    }

    /// Apply pending storage migrations.
    pub async fn migrate(&self) -> Result<(), Error> {
        self.repositories.migrate().await
    }

    /// Check that the storage backend is reachable.
    pub async fn health_check(&self) -> Result<(), Error> {
        self.repositories.health_check().await
    }

    /// The owner authentication guard.
    pub fn guard(&self) -> &Arc<AuthGuard<KeyValueRepositoryAdapter<R>>> {
        &self.guard
    }

    /// Typed catalog operations.
    pub fn catalog(&self) -> &CatalogService<CatalogRepositoryAdapter<R>> {
        &self.catalog
    }

    /// Attempt an owner login. See [`AuthGuard::login`].
    pub async fn login(&self, email: &str, password: &str) -> LoginOutcome {
        self.guard.login(email, password).await
    }

    /// End the owner session. See [`AuthGuard::logout`].
    pub async fn logout(&self) {
        self.guard.logout().await;
    }

    /// Refresh the cached lock view. See [`AuthGuard::check_lock_status`].
    pub async fn check_lock_status(&self) {
        self.guard.check_lock_status().await;
    }

    /// Snapshot of the observable session state.
    pub fn session(&self) -> SessionState {
        self.guard.session()
    }

    /// Stop background tasks. Durable state is left as it is.
    pub fn dispose(&self) {
        self.guard.dispose();
    }
}
