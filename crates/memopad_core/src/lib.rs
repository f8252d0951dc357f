//! Core domain logic for memopad.
//! Owns the memo collection, its selection invariant, and the debounced
//! mirror of that collection into a key-value store.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod persist;
pub mod service;
pub mod store;

pub use config::{ConfigError, MemopadConfig};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::memo::{now_ms, Memo};
pub use persist::{DebounceError, DebounceScope, DebouncedSaver};
pub use service::memo_book::{MemoBook, MemoBookError};
pub use store::{KeyValueStore, MemoryKvStore, SqliteKvStore, StoreError, StoreResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
