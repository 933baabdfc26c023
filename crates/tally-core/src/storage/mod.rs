//! Storage abstraction for Tally.
//!
//! The traits describe what the services need from persistence; the SQLite
//! backend is the only implementation shipped.

pub mod sqlite;
pub mod traits;
pub mod types;

pub use sqlite::SqliteStore;
pub use traits::{AuditLog, LedgerStore};
pub use types::{
    Actor, AuditAction, AuditRecord, BalanceChange, Book, BookScope, ChannelSettings, Decrement,
    EntryKey, LedgerEntry, Rename, Transfer,
};
