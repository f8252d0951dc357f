//! Persistence scheduling between in-memory state and the key-value store.
//!
//! # Responsibility
//! - Decouple "save requested" frequency from physical write frequency.

pub mod debounce;

pub use debounce::{DebounceError, DebounceScope, DebouncedSaver};
