//! Memo book use-case service.
//!
//! # Responsibility
//! - Own the in-memory memo collection and the selection index.
//! - Mirror every mutation to the key-value store through one debounced gate.
//!
//! # Invariants
//! - `selected` is `0` or a valid index into `memos`.
//! - Edits replace the selected record wholesale.
//! - Every mutation hands the full serialized collection to the gate; the
//!   store is never written directly after `load`.
//! - The gate is created once with the book and never recreated.

use crate::config::MemopadConfig;
use crate::model::memo::{now_ms, Memo};
use crate::persist::{DebounceError, DebouncedSaver};
use crate::store::KeyValueStore;
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Service error for memo book use-cases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoBookError {
    /// Index does not address a memo in the current collection.
    IndexOutOfRange { index: usize, len: usize },
    /// The collection is empty, so there is nothing to edit.
    NoSelection,
    /// The configuration failed validation.
    InvalidConfig(String),
    /// The persistence gate could not be constructed.
    Gate(DebounceError),
}

impl Display for MemoBookError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IndexOutOfRange { index, len } => {
                write!(f, "memo index {index} out of range for {len} memos")
            }
            Self::NoSelection => write!(f, "no memo selected"),
            Self::InvalidConfig(message) => write!(f, "{message}"),
            Self::Gate(err) => write!(f, "{err}"),
        }
    }
}

impl Error for MemoBookError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Gate(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DebounceError> for MemoBookError {
    fn from(value: DebounceError) -> Self {
        Self::Gate(value)
    }
}

/// Application state container: memos, selection and the save gate.
pub struct MemoBook {
    memos: Vec<Memo>,
    selected: usize,
    storage_key: String,
    saver: DebouncedSaver<String>,
}

impl MemoBook {
    /// Builds a book over `store` using `config`, seeding memos from the
    /// stored snapshot.
    ///
    /// Must be called inside a tokio runtime.
    ///
    /// # Errors
    /// - `InvalidConfig` when `config` fails `MemopadConfig::validate`.
    /// - `Gate` when the debounced saver cannot be built.
    pub fn open(
        store: Arc<dyn KeyValueStore>,
        config: &MemopadConfig,
    ) -> Result<Self, MemoBookError> {
        config
            .validate()
            .map_err(|err| MemoBookError::InvalidConfig(err.to_string()))?;
        let writer = Arc::clone(&store);
        let saver = DebouncedSaver::with_scope(
            move |key: &str, snapshot: String| writer.set_item(key, snapshot.as_str()),
            config.quiet_period(),
            config.debounce_scope,
        )?;
        Ok(Self::load(store.as_ref(), saver, config.storage_key.as_str()))
    }

    /// Seeds a book from `store` and wires it to an existing gate.
    ///
    /// A missing key, a failed read or an unreadable snapshot all start an
    /// empty collection.
    pub fn load(store: &dyn KeyValueStore, saver: DebouncedSaver<String>, key: &str) -> Self {
        let memos = match store.get_item(key) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<Memo>>(raw.as_str()) {
                Ok(memos) => memos,
                Err(err) => {
                    warn!(
                        "event=memo_load module=service status=corrupt key={key} bytes={} error={err}",
                        raw.len()
                    );
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(err) => {
                warn!("event=memo_load module=service status=error key={key} error={err}");
                Vec::new()
            }
        };
        info!(
            "event=memo_load module=service status=ok key={key} count={}",
            memos.len()
        );

        Self {
            memos,
            selected: 0,
            storage_key: key.to_string(),
            saver,
        }
    }

    pub fn memos(&self) -> &[Memo] {
        &self.memos
    }

    pub fn len(&self) -> usize {
        self.memos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.memos.is_empty()
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    /// Returns the selected memo, `None` when the collection is empty.
    pub fn selected_memo(&self) -> Option<&Memo> {
        self.memos.get(self.selected)
    }

    pub fn storage_key(&self) -> &str {
        self.storage_key.as_str()
    }

    pub fn saver(&self) -> &DebouncedSaver<String> {
        &self.saver
    }

    /// Moves the selection to `index`.
    pub fn select(&mut self, index: usize) -> Result<(), MemoBookError> {
        self.ensure_index(index)?;
        self.selected = index;
        Ok(())
    }

    /// Appends an `Untitled` memo and selects it.
    ///
    /// Returns the index of the new memo.
    pub fn add_memo(&mut self) -> usize {
        self.memos.push(Memo::untitled(now_ms()));
        let index = self.memos.len() - 1;
        self.selected = index;
        info!(
            "event=memo_add module=service status=ok index={index} count={}",
            self.memos.len()
        );
        self.request_save();
        index
    }

    /// Replaces the selected memo with `memo`.
    pub fn set_memo(&mut self, memo: Memo) -> Result<(), MemoBookError> {
        let slot = self
            .memos
            .get_mut(self.selected)
            .ok_or(MemoBookError::NoSelection)?;
        *slot = memo;
        self.request_save();
        Ok(())
    }

    /// Replaces the selected memo's title and refreshes `updated_at`.
    pub fn set_title(&mut self, title: impl Into<String>) -> Result<(), MemoBookError> {
        let current = self.selected_memo().ok_or(MemoBookError::NoSelection)?;
        let next = current.with_title(title, now_ms());
        self.set_memo(next)
    }

    /// Replaces the selected memo's content and refreshes `updated_at`.
    pub fn set_content(&mut self, content: impl Into<String>) -> Result<(), MemoBookError> {
        let current = self.selected_memo().ok_or(MemoBookError::NoSelection)?;
        let next = current.with_content(content, now_ms());
        self.set_memo(next)
    }

    /// Removes the memo at `index` and returns it.
    ///
    /// Deleting the selected memo moves the selection back to `0`; deleting
    /// one above it shifts the selection so it stays on the same memo.
    pub fn delete_memo(&mut self, index: usize) -> Result<Memo, MemoBookError> {
        self.ensure_index(index)?;
        let removed = self.memos.remove(index);

        if index == self.selected || self.memos.is_empty() {
            self.selected = 0;
        } else if index < self.selected {
            self.selected -= 1;
        }

        info!(
            "event=memo_delete module=service status=ok index={index} count={} selected={}",
            self.memos.len(),
            self.selected
        );
        self.request_save();
        Ok(removed)
    }

    /// Writes any pending snapshot immediately.
    pub fn flush(&self) -> usize {
        self.saver.flush()
    }

    fn ensure_index(&self, index: usize) -> Result<(), MemoBookError> {
        if index >= self.memos.len() {
            return Err(MemoBookError::IndexOutOfRange {
                index,
                len: self.memos.len(),
            });
        }
        Ok(())
    }

    fn request_save(&self) {
        match serde_json::to_string(&self.memos) {
            Ok(snapshot) => self.saver.request(self.storage_key.as_str(), snapshot),
            Err(err) => error!(
                "event=debounce_request module=service status=error key={} error={err}",
                self.storage_key
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{MemoBook, MemoBookError};
    use crate::config::MemopadConfig;
    use crate::persist::DebounceScope;
    use crate::store::{KeyValueStore, MemoryKvStore};
    use std::sync::Arc;
    use std::time::Duration;

    fn book_with(store: Arc<MemoryKvStore>) -> MemoBook {
        MemoBook::open(store, &MemopadConfig::default()).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn open_wires_gate_from_config() {
        let config = MemopadConfig {
            quiet_period_ms: 750,
            debounce_scope: DebounceScope::Global,
            ..MemopadConfig::default()
        };
        let book = MemoBook::open(Arc::new(MemoryKvStore::new()), &config).unwrap();

        assert_eq!(book.saver().quiet_period(), Duration::from_millis(750));
        assert_eq!(book.saver().scope(), DebounceScope::Global);
        assert_eq!(book.storage_key(), "memo");
    }

    #[tokio::test(start_paused = true)]
    async fn open_rejects_blank_storage_key() {
        let store = Arc::new(MemoryKvStore::new());
        let config = MemopadConfig {
            storage_key: "  ".to_string(),
            ..MemopadConfig::default()
        };

        let err = MemoBook::open(store.clone(), &config).err().unwrap();
        assert!(matches!(err, MemoBookError::InvalidConfig(_)));
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn add_selects_new_memo() {
        let mut book = book_with(Arc::new(MemoryKvStore::new()));
        assert!(book.selected_memo().is_none());

        assert_eq!(book.add_memo(), 0);
        assert_eq!(book.add_memo(), 1);
        assert_eq!(book.selected_index(), 1);
        assert_eq!(book.selected_memo().unwrap().title, "Untitled");
    }

    #[tokio::test(start_paused = true)]
    async fn deleting_selected_memo_resets_selection() {
        let mut book = book_with(Arc::new(MemoryKvStore::new()));
        for _ in 0..3 {
            book.add_memo();
        }
        book.select(2).unwrap();

        book.delete_memo(2).unwrap();
        assert_eq!(book.selected_index(), 0);
        assert_eq!(book.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn deleting_memo_above_selection_keeps_same_memo_selected() {
        let mut book = book_with(Arc::new(MemoryKvStore::new()));
        for _ in 0..3 {
            book.add_memo();
        }
        book.select(2).unwrap();
        book.set_title("keep me").unwrap();

        book.delete_memo(0).unwrap();
        assert_eq!(book.selected_index(), 1);
        assert_eq!(book.selected_memo().unwrap().title, "keep me");
    }

    #[tokio::test(start_paused = true)]
    async fn deleting_last_memo_leaves_empty_selection() {
        let mut book = book_with(Arc::new(MemoryKvStore::new()));
        book.add_memo();
        book.delete_memo(0).unwrap();

        assert!(book.is_empty());
        assert_eq!(book.selected_index(), 0);
        assert_eq!(book.set_title("x"), Err(MemoBookError::NoSelection));
    }

    #[tokio::test(start_paused = true)]
    async fn out_of_range_index_is_rejected() {
        let mut book = book_with(Arc::new(MemoryKvStore::new()));
        book.add_memo();

        assert_eq!(
            book.select(3),
            Err(MemoBookError::IndexOutOfRange { index: 3, len: 1 })
        );
        assert!(book.delete_memo(1).is_err());
        assert_eq!(book.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn corrupt_snapshot_loads_as_empty() {
        let store = Arc::new(MemoryKvStore::new());
        store.set_item("memo", "{not json").unwrap();

        let book = book_with(store);
        assert!(book.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn edits_bump_updated_at_only() {
        let mut book = book_with(Arc::new(MemoryKvStore::new()));
        book.add_memo();
        let created = book.selected_memo().unwrap().clone();

        book.set_content("").unwrap();
        let edited = book.selected_memo().unwrap();
        assert_eq!(edited.created_at, created.created_at);
        assert!(edited.updated_at >= created.updated_at);
        assert_eq!(edited.title, created.title);
    }
}
