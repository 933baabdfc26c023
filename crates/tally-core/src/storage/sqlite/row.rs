//! Raw row types for database queries.

use chrono::{DateTime, Utc};
use rusqlite::Row;
use uuid::Uuid;

use crate::currency::CurrencySystem;
use crate::error::{Result, TallyError};
use crate::storage::types::{Actor, AuditRecord, ChannelSettings, LedgerEntry};

pub(super) const ENTRY_COLUMNS: &str = "id, channel, book, name, amount, created_at, updated_at";

pub(super) const AUDIT_COLUMNS: &str =
    "id, channel, book, action, user_id, username, details_json, timestamp";

pub(super) const SETTINGS_COLUMNS: &str =
    "channel, system, settings_json, updated_by, created_at, updated_at";

/// Raw row data from the ledger_entries table.
#[derive(Debug)]
pub(super) struct EntryRow {
    pub id: String,
    pub channel: String,
    pub book: String,
    pub name: String,
    pub amount: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl EntryRow {
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            channel: row.get(1)?,
            book: row.get(2)?,
            name: row.get(3)?,
            amount: row.get(4)?,
            created_at: row.get(5)?,
            updated_at: row.get(6)?,
        })
    }
}

impl TryFrom<EntryRow> for LedgerEntry {
    type Error = TallyError;

    fn try_from(row: EntryRow) -> Result<Self> {
        Ok(LedgerEntry {
            id: parse_uuid(&row.id)?,
            channel: row.channel,
            book: row.book.parse()?,
            name: row.name,
            amount: row.amount,
            created_at: parse_timestamp(&row.created_at)?,
            updated_at: parse_timestamp(&row.updated_at)?,
        })
    }
}

/// Raw row data from the audit_log table.
#[derive(Debug)]
pub(super) struct AuditRow {
    pub id: String,
    pub channel: String,
    pub book: String,
    pub action: String,
    pub user_id: String,
    pub username: String,
    pub details_json: String,
    pub timestamp: String,
}

impl AuditRow {
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            channel: row.get(1)?,
            book: row.get(2)?,
            action: row.get(3)?,
            user_id: row.get(4)?,
            username: row.get(5)?,
            details_json: row.get(6)?,
            timestamp: row.get(7)?,
        })
    }
}

impl TryFrom<AuditRow> for AuditRecord {
    type Error = TallyError;

    fn try_from(row: AuditRow) -> Result<Self> {
        Ok(AuditRecord {
            id: parse_uuid(&row.id)?,
            channel: row.channel,
            book: row.book.parse()?,
            action: row.action.parse()?,
            actor: Actor::new(row.user_id, row.username),
            details: serde_json::from_str(&row.details_json)?,
            timestamp: parse_timestamp(&row.timestamp)?,
        })
    }
}

/// Raw row data from the bank_settings table.
#[derive(Debug)]
pub(super) struct SettingsRow {
    pub channel: String,
    pub system: String,
    pub settings_json: String,
    pub updated_by: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl SettingsRow {
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            channel: row.get(0)?,
            system: row.get(1)?,
            settings_json: row.get(2)?,
            updated_by: row.get(3)?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }
}

impl TryFrom<SettingsRow> for ChannelSettings {
    type Error = TallyError;

    fn try_from(row: SettingsRow) -> Result<Self> {
        let system = match row.system.as_str() {
            "dnd" => CurrencySystem::Dnd,
            "decimal" => CurrencySystem::Decimal,
            other => {
                return Err(TallyError::StorageUnavailable(format!(
                    "Unknown currency system: {}",
                    other
                )))
            }
        };
        Ok(ChannelSettings {
            channel: row.channel,
            system,
            settings: serde_json::from_str(&row.settings_json)?,
            updated_by: row.updated_by,
            created_at: parse_timestamp(&row.created_at)?,
            updated_at: parse_timestamp(&row.updated_at)?,
        })
    }
}

fn parse_uuid(value: &str) -> Result<Uuid> {
    Uuid::parse_str(value)
        .map_err(|e| TallyError::StorageUnavailable(format!("Invalid UUID: {}", e)))
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| TallyError::StorageUnavailable(format!("Invalid timestamp: {}", e)))
}
