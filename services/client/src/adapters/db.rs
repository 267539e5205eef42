//! services/client/src/adapters/db.rs
//!
//! This module contains the storage adapter, the concrete implementation of the
//! `KeyValueStore` port backed by an on-device SQLite file via `sqlx`.
//! It holds the persisted session only; credentials never land here.

use async_trait::async_trait;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;
use talent_core::ports::{KeyValueStore, PortError, PortResult};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A storage adapter that implements the `KeyValueStore` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: SqlitePool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Opens the connection pool for `url`.
    pub async fn connect(url: &str) -> Result<SqlitePool, sqlx::Error> {
        SqlitePoolOptions::new().max_connections(1).connect(url).await
    }

    /// A helper function to run storage migrations at startup.
    pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(pool).await
    }
}

#[derive(FromRow)]
struct EntryRecord {
    value: String,
}

fn storage_error(e: sqlx::Error) -> PortError {
    PortError::Unexpected(format!("Storage error: {}", e))
}

//=========================================================================================
// `KeyValueStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl KeyValueStore for DbAdapter {
    async fn get(&self, key: &str) -> PortResult<Option<String>> {
        let record = sqlx::query_as::<_, EntryRecord>(
            "SELECT value FROM kv_entries WHERE key = ?1",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(record.map(|r| r.value))
    }

    async fn set(&self, key: &str, value: &str) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO kv_entries (key, value) VALUES (?1, ?2)
             ON CONFLICT (key) DO UPDATE SET value = excluded.value,
                 updated_at = CURRENT_TIMESTAMP",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM kv_entries WHERE key = ?1")
                .bind(key)
            .execute(&self.pool)
            .await
            .map_err(storage_error)?;
        Ok(())
    }
}
