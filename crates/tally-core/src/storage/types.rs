//! Core data types for the storage layer.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::currency::CurrencySystem;
use crate::error::TallyError;

/// Which ledger an entry belongs to within a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Book {
    /// Named items with integer quantities
    Tracker,
    /// D&D coins, one entry per denomination
    Dnd,
    /// Free-form balance in hundredths
    Decimal,
}

impl Book {
    pub fn as_str(&self) -> &'static str {
        match self {
            Book::Tracker => "tracker",
            Book::Dnd => "dnd",
            Book::Decimal => "decimal",
        }
    }
}

impl fmt::Display for Book {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Book {
    type Err = TallyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tracker" => Ok(Book::Tracker),
            "dnd" => Ok(Book::Dnd),
            "decimal" => Ok(Book::Decimal),
            other => Err(TallyError::StorageUnavailable(format!(
                "Unknown book: {}",
                other
            ))),
        }
    }
}

impl From<CurrencySystem> for Book {
    fn from(system: CurrencySystem) -> Self {
        match system {
            CurrencySystem::Dnd => Book::Dnd,
            CurrencySystem::Decimal => Book::Decimal,
        }
    }
}

/// All entries of one book in one channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookScope {
    pub channel: String,
    pub book: Book,
}

impl BookScope {
    pub fn new(channel: impl Into<String>, book: Book) -> Self {
        Self {
            channel: channel.into(),
            book,
        }
    }

    pub fn key(&self, name: impl Into<String>) -> EntryKey {
        EntryKey {
            channel: self.channel.clone(),
            book: self.book,
            name: name.into(),
        }
    }
}

/// The scope of exactly one ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntryKey {
    pub channel: String,
    pub book: Book,
    pub name: String,
}

impl EntryKey {
    pub fn scope(&self) -> BookScope {
        BookScope::new(self.channel.clone(), self.book)
    }
}

impl fmt::Display for EntryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.channel, self.book, self.name)
    }
}

/// A stored balance. `amount` is always positive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: Uuid,
    pub channel: String,
    pub book: Book,
    pub name: String,
    pub amount: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Before/after view of a single-entry mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceChange {
    pub old_amount: i64,
    pub new_amount: i64,
    /// The entry was deleted because it reached zero or below.
    pub removed: bool,
}

/// Result of a conditional decrement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decrement {
    Applied(BalanceChange),
    /// No entry exists at the key.
    Missing,
    /// The entry holds less than requested; nothing changed.
    Insufficient { available: i64 },
}

/// Result of a debit on one entry paired with a credit on another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transfer {
    Applied {
        debit: BalanceChange,
        credit: BalanceChange,
    },
    Insufficient {
        available: i64,
    },
}

/// Result of moving an entry to a new name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Rename {
    Missing,
    Moved {
        amount: i64,
    },
    /// The new name already existed; the amounts were summed into it.
    Merged {
        old_amount: i64,
        existing_amount: i64,
        total: i64,
    },
}

/// Per-channel, per-system bank configuration document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelSettings {
    pub channel: String,
    pub system: CurrencySystem,
    pub settings: serde_json::Value,
    /// Absent until someone changes the defaults.
    pub updated_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ChannelSettings {
    pub fn is_default(&self) -> bool {
        self.updated_by.is_none()
    }
}

/// Tag describing what kind of mutation an audit record captures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Add,
    Remove,
    RemoveAll,
    Clear,
    Rename,
    RenameMerge,
    Deposit,
    Withdraw,
    WithdrawAll,
    Convert,
    #[serde(rename = "setfee")]
    SetFee,
    #[serde(rename = "setformat")]
    SetFormat,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Add => "add",
            AuditAction::Remove => "remove",
            AuditAction::RemoveAll => "remove_all",
            AuditAction::Clear => "clear",
            AuditAction::Rename => "rename",
            AuditAction::RenameMerge => "rename_merge",
            AuditAction::Deposit => "deposit",
            AuditAction::Withdraw => "withdraw",
            AuditAction::WithdrawAll => "withdraw_all",
            AuditAction::Convert => "convert",
            AuditAction::SetFee => "setfee",
            AuditAction::SetFormat => "setformat",
        }
    }

    pub const ALL: [AuditAction; 12] = [
        AuditAction::Add,
        AuditAction::Remove,
        AuditAction::RemoveAll,
        AuditAction::Clear,
        AuditAction::Rename,
        AuditAction::RenameMerge,
        AuditAction::Deposit,
        AuditAction::Withdraw,
        AuditAction::WithdrawAll,
        AuditAction::Convert,
        AuditAction::SetFee,
        AuditAction::SetFormat,
    ];
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuditAction {
    type Err = TallyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AuditAction::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| TallyError::StorageUnavailable(format!("Unknown audit action: {}", s)))
    }
}

/// The user responsible for a mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub name: String,
}

impl Actor {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// An immutable audit log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: Uuid,
    pub channel: String,
    pub book: Book,
    pub action: AuditAction,
    pub actor: Actor,
    pub details: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}
