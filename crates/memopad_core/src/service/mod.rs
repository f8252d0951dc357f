//! Core use-case services.
//!
//! # Responsibility
//! - Keep front-ends decoupled from storage and persistence scheduling.

pub mod memo_book;
