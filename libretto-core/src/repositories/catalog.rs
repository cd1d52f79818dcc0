//! Generic CRUD contract for catalog collections.

use async_trait::async_trait;

use crate::{
    Error,
    catalog::{Page, Record, RecordId},
};

/// Record store keyed by logical collection name.
///
/// The repository persists records as given; envelope timestamps are the
/// caller's responsibility. Collections spring into existence on first
/// insert.
#[async_trait]
pub trait CatalogRepository: Send + Sync + 'static {
    /// Insert a new record into `collection`.
    async fn create(&self, collection: &str, record: Record) -> Result<Record, Error>;

    /// Replace the record with `record.id` in `collection`.
    ///
    /// Returns `StorageError::NotFound` when no such record exists.
    async fn update(&self, collection: &str, record: Record) -> Result<Record, Error>;

    /// Delete a record by id.
    ///
    /// Returns `StorageError::NotFound` when no such record exists.
    async fn delete(&self, collection: &str, id: &RecordId) -> Result<(), Error>;

    /// All records of `collection`, oldest first.
    async fn get_all(&self, collection: &str) -> Result<Page<Record>, Error>;

    /// Fetch one record by id.
    async fn get_by_id(&self, collection: &str, id: &RecordId)
    -> Result<Option<Record>, Error>;
}
