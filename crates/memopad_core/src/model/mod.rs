//! Memo domain model.
//!
//! # Invariants
//! - Memos carry no identity of their own; the collection index addresses them.

pub mod memo;
