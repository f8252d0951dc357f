//! Process-local store used by tests and ephemeral sessions.

use super::{ensure_valid_key, KeyValueStore, StoreError, StoreResult};
use std::collections::HashMap;
use std::sync::Mutex;

/// In-memory `KeyValueStore` that also counts physical writes.
#[derive(Debug, Default)]
pub struct MemoryKvStore {
    state: Mutex<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    items: HashMap<String, String>,
    writes: usize,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful `set_item` calls since construction.
    pub fn write_count(&self) -> usize {
        self.state.lock().map_or(0, |state| state.writes)
    }
}

impl KeyValueStore for MemoryKvStore {
    fn get_item(&self, key: &str) -> StoreResult<Option<String>> {
        let state = self.state.lock().map_err(|_| StoreError::LockPoisoned)?;
        Ok(state.items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> StoreResult<()> {
        ensure_valid_key(key)?;
        let mut state = self.state.lock().map_err(|_| StoreError::LockPoisoned)?;
        state.items.insert(key.to_string(), value.to_string());
        state.writes += 1;
        Ok(())
    }
}
