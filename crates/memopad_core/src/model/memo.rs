//! Memo domain model.
//!
//! # Responsibility
//! - Define the record shown in the sidebar and edited in the memo panel.
//! - Keep the persisted wire shape stable (`createdAt`/`updatedAt`).
//!
//! # Invariants
//! - A fresh memo has `created_at == updated_at`.
//! - Edits replace the whole record and only move `updated_at` forward.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Title given to every newly added memo.
pub const UNTITLED: &str = "Untitled";

/// One note with a title, a body and two epoch-millisecond timestamps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Memo {
    pub title: String,
    pub content: String,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds. Refreshed on every title/content edit.
    pub updated_at: i64,
}

impl Memo {
    /// Creates an `Untitled` memo with empty content stamped at `now`.
    pub fn untitled(now: i64) -> Self {
        Self {
            title: UNTITLED.to_string(),
            content: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns a copy with `title` replaced and `updated_at` set to `now`.
    pub fn with_title(&self, title: impl Into<String>, now: i64) -> Self {
        Self {
            title: title.into(),
            updated_at: now,
            ..self.clone()
        }
    }

    /// Returns a copy with `content` replaced and `updated_at` set to `now`.
    pub fn with_content(&self, content: impl Into<String>, now: i64) -> Self {
        Self {
            content: content.into(),
            updated_at: now,
            ..self.clone()
        }
    }
}

/// Current wall-clock time in Unix epoch milliseconds.
///
/// Falls back to `0` if the system clock is set before the epoch.
pub fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::{now_ms, Memo, UNTITLED};

    #[test]
    fn untitled_memo_has_matching_timestamps() {
        let memo = Memo::untitled(1_641_225_302_265);
        assert_eq!(memo.title, UNTITLED);
        assert!(memo.content.is_empty());
        assert_eq!(memo.created_at, memo.updated_at);
    }

    #[test]
    fn edits_keep_created_at_and_bump_updated_at() {
        let memo = Memo::untitled(100);
        let titled = memo.with_title("Groceries", 200);
        let written = titled.with_content("milk", 300);

        assert_eq!(written.title, "Groceries");
        assert_eq!(written.content, "milk");
        assert_eq!(written.created_at, 100);
        assert_eq!(written.updated_at, 300);
        assert_eq!(memo.title, UNTITLED);
    }

    #[test]
    fn now_is_after_2020() {
        assert!(now_ms() > 1_577_836_800_000);
    }
}
