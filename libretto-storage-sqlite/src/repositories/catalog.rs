//! SQLite implementation of the catalog repository.

use async_trait::async_trait;
use chrono::DateTime;
use libretto_core::{
    Error,
    catalog::{Page, Record, RecordId},
    error::StorageError,
    repositories::CatalogRepository,
};
use sqlx::SqlitePool;

/// Generic record store backed by the `catalog_records` table, one row per
/// record with the entity fields as a JSON column.
pub struct SqliteCatalogRepository {
    pool: SqlitePool,
}

impl SqliteCatalogRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Internal struct for query results
#[derive(Debug, sqlx::FromRow)]
struct CatalogRecordRow {
    id: String,
    fields: String,
    created_at: i64,
    updated_at: i64,
}

impl CatalogRecordRow {
    fn into_record(self) -> Result<Record, StorageError> {
        let fields = serde_json::from_str(&self.fields)
            .map_err(|e| StorageError::Malformed(e.to_string()))?;

        Ok(Record {
            id: RecordId::new(&self.id),
            created_at: DateTime::from_timestamp_millis(self.created_at)
                .ok_or_else(|| StorageError::Malformed("invalid created_at".to_string()))?,
            updated_at: DateTime::from_timestamp_millis(self.updated_at)
                .ok_or_else(|| StorageError::Malformed("invalid updated_at".to_string()))?,
            fields,
        })
    }
}

fn encode_fields(record: &Record) -> Result<String, StorageError> {
    serde_json::to_string(&record.fields).map_err(|e| StorageError::Malformed(e.to_string()))
}

#[async_trait]
impl CatalogRepository for SqliteCatalogRepository {
    async fn create(&self, collection: &str, record: Record) -> Result<Record, Error> {
        let fields = encode_fields(&record)?;

        sqlx::query(
            r#"
            INSERT INTO catalog_records (id, collection, fields, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.id.as_str())
        .bind(collection)
        .bind(&fields)
        .bind(record.created_at.timestamp_millis())
        .bind(record.updated_at.timestamp_millis())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, collection, "Failed to create catalog record");
            StorageError::Database("Failed to create catalog record".to_string())
        })?;

        Ok(record)
    }

    async fn update(&self, collection: &str, record: Record) -> Result<Record, Error> {
        let fields = encode_fields(&record)?;

        let result = sqlx::query(
            r#"
            UPDATE catalog_records
            SET fields = ?, updated_at = ?
            WHERE id = ? AND collection = ?
            "#,
        )
        .bind(&fields)
        .bind(record.updated_at.timestamp_millis())
        .bind(record.id.as_str())
        .bind(collection)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, collection, "Failed to update catalog record");
            StorageError::Database("Failed to update catalog record".to_string())
        })?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound.into());
        }

        Ok(record)
    }

    async fn delete(&self, collection: &str, id: &RecordId) -> Result<(), Error> {
        let result = sqlx::query("DELETE FROM catalog_records WHERE id = ? AND collection = ?")
            .bind(id.as_str())
            .bind(collection)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, collection, "Failed to delete catalog record");
                StorageError::Database("Failed to delete catalog record".to_string())
            })?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound.into());
        }

        Ok(())
    }

    async fn get_all(&self, collection: &str) -> Result<Page<Record>, Error> {
        let rows = sqlx::query_as::<_, CatalogRecordRow>(
            r#"
            SELECT id, fields, created_at, updated_at
            FROM catalog_records
            WHERE collection = ?
            ORDER BY created_at, id
            "#,
        )
        .bind(collection)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, collection, "Failed to list catalog records");
            StorageError::Database("Failed to list catalog records".to_string())
        })?;

        let items = rows
            .into_iter()
            .map(CatalogRecordRow::into_record)
            .collect::<Result<Vec<_>, _>>()?;
        let total = items.len() as u64;

        Ok(Page { items, total })
    }

    async fn get_by_id(
        &self,
        collection: &str,
        id: &RecordId,
    ) -> Result<Option<Record>, Error> {
        let row = sqlx::query_as::<_, CatalogRecordRow>(
            r#"
            SELECT id, fields, created_at, updated_at
            FROM catalog_records
            WHERE id = ? AND collection = ?
            "#,
        )
        .bind(id.as_str())
        .bind(collection)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, collection, "Failed to fetch catalog record");
            StorageError::Database("Failed to fetch catalog record".to_string())
        })?;

        match row {
            Some(row) => Ok(Some(row.into_record()?)),
            None => Ok(None),
        }
    }
}
