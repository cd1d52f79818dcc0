//! Versioned schema migrations for the SQLite backend.
//!
//! Applied migrations are tracked in the `_libretto_migrations` table;
//! `up` skips versions that have already run, so it is safe to call on
//! every startup.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Migration failed: {0}")]
    Migration(String),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// One schema change, identified by a unique version number.
#[async_trait]
pub trait SqliteMigration: Send + Sync {
    /// Unique version number for ordering migrations
    fn version(&self) -> i64;

    /// Human readable name of the migration
    fn name(&self) -> &str;

    /// Execute the migration
    async fn up(&self, conn: &mut SqliteConnection) -> Result<(), MigrationError>;

    /// Rollback the migration
    async fn down(&self, conn: &mut SqliteConnection) -> Result<(), MigrationError>;
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MigrationRecord {
    pub version: i64,
    pub name: String,
    pub applied_at: i64,
}

const MIGRATION_TABLE: &str = "_libretto_migrations";

pub struct SqliteMigrationManager {
    pool: SqlitePool,
}

impl SqliteMigrationManager {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create the migration tracking table.
    pub async fn initialize(&self) -> Result<(), MigrationError> {
        sqlx::query(
            format!(
                r#"
            CREATE TABLE IF NOT EXISTS {MIGRATION_TABLE} (
                version INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                applied_at INTEGER NOT NULL DEFAULT (unixepoch())
            );"#
            )
            .as_str(),
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Apply pending migrations, each inside its own transaction.
    pub async fn up(&self, migrations: &[Box<dyn SqliteMigration>]) -> Result<(), MigrationError> {
        for migration in migrations {
            if self.is_applied(migration.version()).await? {
                continue;
            }

            let mut tx = self.pool.begin().await?;

            tracing::info!(
                "Applying migration {} ({})",
                migration.name(),
                migration.version()
            );

            migration.up(&mut *tx).await?;

            sqlx::query(
                format!("INSERT INTO {MIGRATION_TABLE} (version, name, applied_at) VALUES (?, ?, ?)")
                    .as_str(),
            )
            .bind(migration.version())
            .bind(migration.name())
            .bind(Utc::now().timestamp())
            .execute(&mut *tx)
            .await?;

            tx.commit().await?;
        }
        Ok(())
    }

    /// Roll back the given migrations where applied.
    pub async fn down(&self, migrations: &[Box<dyn SqliteMigration>]) -> Result<(), MigrationError> {
        for migration in migrations {
            if !self.is_applied(migration.version()).await? {
                continue;
            }

            let mut tx = self.pool.begin().await?;

            tracing::info!(
                "Rolling back migration {} ({})",
                migration.name(),
                migration.version()
            );

            migration.down(&mut *tx).await?;

            sqlx::query(format!("DELETE FROM {MIGRATION_TABLE} WHERE version = ?").as_str())
                .bind(migration.version())
                .execute(&mut *tx)
                .await?;

            tx.commit().await?;
        }
        Ok(())
    }

    pub async fn applied_migrations(&self) -> Result<Vec<MigrationRecord>, MigrationError> {
        let records = sqlx::query_as::<_, MigrationRecord>(
            format!("SELECT version, name, applied_at FROM {MIGRATION_TABLE} ORDER BY version")
                .as_str(),
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    pub async fn is_applied(&self, version: i64) -> Result<bool, MigrationError> {
        let applied: bool = sqlx::query_scalar(
            format!("SELECT EXISTS(SELECT 1 FROM {MIGRATION_TABLE} WHERE version = ?)").as_str(),
        )
        .bind(version)
        .fetch_one(&self.pool)
        .await?;
        Ok(applied)
    }
}

/// The full migration set, in order.
pub fn all_migrations() -> Vec<Box<dyn SqliteMigration>> {
    vec![
        Box::new(CreateKeyValueTable),
        Box::new(CreateCatalogRecordsTable),
        Box::new(CreateCatalogIndexes),
    ]
}

pub struct CreateKeyValueTable;

#[async_trait]
impl SqliteMigration for CreateKeyValueTable {
    fn version(&self) -> i64 {
        1
    }

    fn name(&self) -> &str {
        "CreateKeyValueTable"
    }

    async fn up(&self, conn: &mut SqliteConnection) -> Result<(), MigrationError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS key_value (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL DEFAULT (unixepoch())
            );"#,
        )
        .execute(conn)
        .await?;

        Ok(())
    }

    async fn down(&self, conn: &mut SqliteConnection) -> Result<(), MigrationError> {
        sqlx::query("DROP TABLE IF EXISTS key_value;")
            .execute(conn)
            .await?;

        Ok(())
    }
}

pub struct CreateCatalogRecordsTable;

#[async_trait]
impl SqliteMigration for CreateCatalogRecordsTable {
    fn version(&self) -> i64 {
        2
    }

    fn name(&self) -> &str {
        "CreateCatalogRecordsTable"
    }

    async fn up(&self, conn: &mut SqliteConnection) -> Result<(), MigrationError> {
        // Timestamps are unix milliseconds; fields is the entity JSON.
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS catalog_records (
                id TEXT PRIMARY KEY,
                collection TEXT NOT NULL,
                fields TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            );"#,
        )
        .execute(conn)
        .await?;

        Ok(())
    }

    async fn down(&self, conn: &mut SqliteConnection) -> Result<(), MigrationError> {
        sqlx::query("DROP TABLE IF EXISTS catalog_records;")
            .execute(conn)
            .await?;

        Ok(())
    }
}

pub struct CreateCatalogIndexes;

#[async_trait]
impl SqliteMigration for CreateCatalogIndexes {
    fn version(&self) -> i64 {
        3
    }

    fn name(&self) -> &str {
        "CreateCatalogIndexes"
    }

    async fn up(&self, conn: &mut SqliteConnection) -> Result<(), MigrationError> {
        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_catalog_records_collection
            ON catalog_records (collection, created_at);"#,
        )
        .execute(conn)
        .await?;

        Ok(())
    }

    async fn down(&self, conn: &mut SqliteConnection) -> Result<(), MigrationError> {
        sqlx::query("DROP INDEX IF EXISTS idx_catalog_records_collection;")
            .execute(conn)
            .await?;

        Ok(())
    }
}
