//! Storage trait definitions.
//!
//! `LedgerStore` owns balances and bank settings; `AuditLog` owns the
//! append-only mutation history. They are separate so audit writes can fail
//! independently of the balance update they describe.

use crate::currency::CurrencySystem;
use crate::error::Result;

use super::types::{
    AuditRecord, BalanceChange, BookScope, ChannelSettings, Decrement, EntryKey, LedgerEntry,
    Rename, Transfer,
};

/// Balance storage.
///
/// Every mutating method must be atomic with respect to other mutations on
/// the same key: no read-then-write across two round trips. Entries whose
/// amount reaches zero or below are deleted in the same unit of work.
pub trait LedgerStore: Send + Sync {
    /// Fetch one entry.
    fn get(&self, key: &EntryKey) -> Result<Option<LedgerEntry>>;

    /// All entries in a book, ordered by name.
    fn list(&self, scope: &BookScope) -> Result<Vec<LedgerEntry>>;

    /// Add `delta` to the entry, creating it with `delta` if absent.
    fn increment(&self, key: &EntryKey, delta: i64) -> Result<BalanceChange>;

    /// Subtract `delta` only if the entry holds at least that much.
    fn decrement(&self, key: &EntryKey, delta: i64) -> Result<Decrement>;

    /// Subtract `debit` from `from` and add `credit` to `to` as one unit.
    ///
    /// Nothing changes unless `from` holds at least `debit`.
    fn transfer(&self, from: &EntryKey, debit: i64, to: &EntryKey, credit: i64)
        -> Result<Transfer>;

    /// Move `old` to `new_name`, summing into an existing entry if present.
    fn rename(&self, old: &EntryKey, new_name: &str) -> Result<Rename>;

    /// Delete every entry in the book, returning what was deleted.
    fn clear(&self, scope: &BookScope) -> Result<Vec<LedgerEntry>>;

    /// Read the settings document, creating it from `defaults` on first access.
    fn settings(
        &self,
        channel: &str,
        system: CurrencySystem,
        defaults: &serde_json::Value,
    ) -> Result<ChannelSettings>;

    /// Replace the settings document.
    fn put_settings(
        &self,
        channel: &str,
        system: CurrencySystem,
        settings: &serde_json::Value,
        updated_by: &str,
    ) -> Result<ChannelSettings>;
}

/// Append-only mutation history.
pub trait AuditLog: Send + Sync {
    fn append(&self, record: &AuditRecord) -> Result<()>;

    /// Most recent records first, at most `limit`.
    fn query(&self, scope: &BookScope, limit: usize) -> Result<Vec<AuditRecord>>;
}
