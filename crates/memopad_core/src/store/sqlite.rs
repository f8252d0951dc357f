//! SQLite-backed key-value store.
//!
//! # Responsibility
//! - Persist memo snapshots across process restarts.
//! - Upsert one row per key in `kv_items`.
//!
//! # Invariants
//! - The wrapped connection is migrated before construction completes.
//! - A write replaces the whole value; there are no partial updates.

use super::{ensure_valid_key, KeyValueStore, StoreError, StoreResult};
use crate::db::{open_db, open_db_in_memory};
use crate::model::memo::now_ms;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;

/// `KeyValueStore` over one SQLite connection.
pub struct SqliteKvStore {
    conn: Mutex<Connection>,
}

impl SqliteKvStore {
    /// Opens (or creates) a store file and applies pending migrations.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let conn = open_db(path)?;
        Ok(Self::from_connection(conn))
    }

    /// Opens an in-memory store.
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = open_db_in_memory()?;
        Ok(Self::from_connection(conn))
    }

    /// Wraps an already migrated connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }
}

impl KeyValueStore for SqliteKvStore {
    fn get_item(&self, key: &str) -> StoreResult<Option<String>> {
        let conn = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;
        let value = conn
            .query_row(
                "SELECT value FROM kv_items WHERE key = ?1;",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set_item(&self, key: &str, value: &str) -> StoreResult<()> {
        ensure_valid_key(key)?;
        let conn = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;
        conn.execute(
            "INSERT INTO kv_items (key, value, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at;",
            params![key, value, now_ms()],
        )?;
        Ok(())
    }
}
