//! Key-value store collaborator consumed by the memo book and the
//! debounced persistence gate.
//!
//! # Responsibility
//! - Define the two operations the app needs: `get_item` and `set_item`.
//! - Keep storage transport errors out of memo business logic.
//!
//! # Invariants
//! - Values are opaque UTF-8 strings; serialization belongs to callers.
//! - `set_item` overwrites any previous value under the same key.

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod memory;
pub mod sqlite;

pub use memory::MemoryKvStore;
pub use sqlite::SqliteKvStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Error surfaced by key-value store implementations.
#[derive(Debug)]
pub enum StoreError {
    /// Key is empty or whitespace-only.
    InvalidKey(String),
    /// Backend (SQLite) failure.
    Db(DbError),
    /// A thread panicked while holding the store lock.
    LockPoisoned,
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidKey(key) => write!(f, "invalid store key: `{key}`"),
            Self::Db(err) => write!(f, "{err}"),
            Self::LockPoisoned => write!(f, "store lock poisoned"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidKey(_) | Self::LockPoisoned => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Synchronous string key-value store.
pub trait KeyValueStore: Send + Sync {
    /// Reads the value stored under `key`, `None` when absent.
    fn get_item(&self, key: &str) -> StoreResult<Option<String>>;
    /// Writes `value` under `key`, replacing any previous value.
    fn set_item(&self, key: &str, value: &str) -> StoreResult<()>;
}

pub(crate) fn ensure_valid_key(key: &str) -> StoreResult<()> {
    if key.trim().is_empty() {
        return Err(StoreError::InvalidKey(key.to_string()));
    }
    Ok(())
}
