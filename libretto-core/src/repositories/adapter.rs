//! Adapters that expose a provider's repositories as standalone values.
//!
//! Services are generic over a single repository trait; a backend hands out
//! all of its repositories through one `Arc<Provider>`. The adapters bridge
//! the two by delegating each call to the provider's accessor.

use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    Error,
    catalog::{Page, Record, RecordId},
    repositories::{CatalogRepository, KeyValueRepository, RepositoryProvider},
};

pub struct KeyValueRepositoryAdapter<R: RepositoryProvider> {
    provider: Arc<R>,
}

impl<R: RepositoryProvider> KeyValueRepositoryAdapter<R> {
    pub fn new(provider: Arc<R>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<R: RepositoryProvider> KeyValueRepository for KeyValueRepositoryAdapter<R> {
    async fn get(&self, key: &str) -> Result<Option<String>, Error> {
        self.provider.key_value().get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), Error> {
        self.provider.key_value().set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<(), Error> {
        self.provider.key_value().remove(key).await
    }
}

pub struct CatalogRepositoryAdapter<R: RepositoryProvider> {
    provider: Arc<R>,
}

impl<R: RepositoryProvider> CatalogRepositoryAdapter<R> {
    pub fn new(provider: Arc<R>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<R: RepositoryProvider> CatalogRepository for CatalogRepositoryAdapter<R> {
    async fn create(&self, collection: &str, record: Record) -> Result<Record, Error> {
        self.provider.catalog().create(collection, record).await
    }

    async fn update(&self, collection: &str, record: Record) -> Result<Record, Error> {
        self.provider.catalog().update(collection, record).await
    }

    async fn delete(&self, collection: &str, id: &RecordId) -> Result<(), Error> {
        self.provider.catalog().delete(collection, id).await
    }

    async fn get_all(&self, collection: &str) -> Result<Page<Record>, Error> {
        self.provider.catalog().get_all(collection).await
    }

    async fn get_by_id(
        &self,
        collection: &str,
        id: &RecordId,
    ) -> Result<Option<Record>, Error> {
        self.provider.catalog().get_by_id(collection, id).await
    }
}
