//! SQLite implementation of the key-value repository.

use async_trait::async_trait;
use chrono::Utc;
use libretto_core::{Error, error::StorageError, repositories::KeyValueRepository};
use sqlx::SqlitePool;

/// Flat durable namespace backed by the `key_value` table.
pub struct SqliteKeyValueRepository {
    pool: SqlitePool,
}

impl SqliteKeyValueRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl KeyValueRepository for SqliteKeyValueRepository {
    async fn get(&self, key: &str) -> Result<Option<String>, Error> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM key_value WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, key, "Failed to read key");
                StorageError::Database("Failed to read key".to_string())
            })?;

        Ok(row.map(|(value,)| value))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), Error> {
        sqlx::query(
            r#"
            INSERT INTO key_value (key, value, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now().timestamp())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, key, "Failed to write key");
            StorageError::Database("Failed to write key".to_string())
        })?;

        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), Error> {
        // Removing an absent key is not an error.
        sqlx::query("DELETE FROM key_value WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, key, "Failed to remove key");
                StorageError::Database("Failed to remove key".to_string())
            })?;

        Ok(())
    }
}
