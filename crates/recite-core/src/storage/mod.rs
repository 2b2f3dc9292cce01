//! Storage Module
//!
//! SQLite-based storage layer with:
//! - Versioned schema migrations
//! - Owner-scoped contexts, cards, and review history
//! - The atomic review commit protocol
//! - Oldest-due-first due-item selection

mod migrations;
mod sqlite;

pub use migrations::MIGRATIONS;
pub use sqlite::{Result, Store, StoreError};
