//! # Tally Core
//!
//! Core library for Tally - shared per-channel ledgers for a tabletop chat bot:
//! an item tracker, a two-system bank (D&D denominations and free-form decimal
//! currency), dice rolls and reference lookups.
//!
//! This crate owns the domain logic and storage abstractions, independent of
//! whatever transport delivers the commands.
//!
//! ## Architecture
//!
//! - **similarity**: normalized edit-distance scoring
//! - **fuzzy**: ranked, deduplicated name suggestions
//! - **validation**: input rules applied before any mutation
//! - **mutator**: atomic credit/debit/clear with audit
//! - **audit**: best-effort append-only audit trail
//! - **convert**: D&D denomination conversion with fees
//! - **tracker** / **bank**: the command-level operations
//! - **storage**: storage traits and the SQLite backend

pub mod audit;
pub mod bank;
pub mod convert;
pub mod currency;
pub mod dice;
pub mod error;
pub mod fuzzy;
pub mod mutator;
pub mod reference;
pub mod similarity;
pub mod storage;
pub mod tracker;
pub mod validation;

pub use error::{Result, TallyError, ValidationError};
pub use storage::{AuditLog, LedgerStore, SqliteStore};

/// Core version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
