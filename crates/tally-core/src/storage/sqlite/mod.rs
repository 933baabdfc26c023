//! SQLite storage backend.
//!
//! One connection behind a mutex makes the process a single writer; every
//! balance mutation runs as one conditional statement inside a transaction,
//! followed by pruning of non-positive rows in the same transaction.

mod row;

use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use uuid::Uuid;

use crate::currency::CurrencySystem;
use crate::error::{Result, TallyError, ValidationError};
use crate::storage::traits::{AuditLog, LedgerStore};
use crate::storage::types::{
    AuditRecord, BalanceChange, BookScope, ChannelSettings, Decrement, EntryKey, LedgerEntry,
    Rename, Transfer,
};
use crate::validation::MAX_SAFE_INTEGER;

use row::{AuditRow, EntryRow, SettingsRow, AUDIT_COLUMNS, ENTRY_COLUMNS, SETTINGS_COLUMNS};

const FORMAT_VERSION: &str = "1";

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS ledger_entries (
    id TEXT PRIMARY KEY,
    channel TEXT NOT NULL,
    book TEXT NOT NULL,
    name TEXT NOT NULL,
    amount INTEGER NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,

    UNIQUE(channel, book, name)
);

CREATE TABLE IF NOT EXISTS audit_log (
    id TEXT PRIMARY KEY,
    channel TEXT NOT NULL,
    book TEXT NOT NULL,
    action TEXT NOT NULL,
    user_id TEXT NOT NULL,
    username TEXT NOT NULL,
    details_json TEXT NOT NULL,
    timestamp TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS audit_log_scope_time
ON audit_log (channel, book, timestamp);

CREATE TABLE IF NOT EXISTS bank_settings (
    channel TEXT NOT NULL,
    system TEXT NOT NULL,
    settings_json TEXT NOT NULL,
    updated_by TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,

    PRIMARY KEY (channel, system)
);
"#;

/// SQLite-backed ledger and audit storage.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (creating if needed) a database file.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Self::init(conn)
    }

    /// Open a private database that disappears when dropped.
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        conn.execute(
            "INSERT INTO meta (key, value) VALUES ('format_version', ?1)
             ON CONFLICT(key) DO NOTHING",
            [FORMAT_VERSION],
        )?;

        let version: String = conn.query_row(
            "SELECT value FROM meta WHERE key = 'format_version'",
            [],
            |row| row.get(0),
        )?;
        if version != FORMAT_VERSION {
            return Err(TallyError::StorageUnavailable(format!(
                "Unsupported database format version: {}",
                version
            )));
        }

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Lock the database connection, returning an error if the mutex is poisoned.
    fn lock_conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| TallyError::StorageUnavailable("SQLite connection poisoned".to_string()))
    }
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Add `delta`, creating the row if needed. A result above
/// `MAX_SAFE_INTEGER` is rejected and leaves the row unchanged.
fn upsert_add(tx: &Transaction<'_>, key: &EntryKey, delta: i64, at: &str) -> Result<i64> {
    let too_large = || TallyError::from(ValidationError::out_of_range(1, MAX_SAFE_INTEGER));
    if delta > MAX_SAFE_INTEGER {
        return Err(too_large());
    }
    let amount = tx
        .query_row(
            r#"
            INSERT INTO ledger_entries (id, channel, book, name, amount, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
            ON CONFLICT(channel, book, name) DO UPDATE
                SET amount = amount + excluded.amount,
                    updated_at = excluded.updated_at
                WHERE amount + excluded.amount <= ?7
            RETURNING amount
            "#,
            params![
                Uuid::new_v4().to_string(),
                key.channel,
                key.book.as_str(),
                key.name,
                delta,
                at,
                MAX_SAFE_INTEGER
            ],
            |row| row.get(0),
        )
        .optional()?;
    amount.ok_or_else(too_large)
}

fn conditional_subtract(
    tx: &Transaction<'_>,
    key: &EntryKey,
    delta: i64,
    at: &str,
) -> Result<Option<i64>> {
    let amount = tx
        .query_row(
            r#"
            UPDATE ledger_entries
            SET amount = amount - ?1, updated_at = ?2
            WHERE channel = ?3 AND book = ?4 AND name = ?5 AND amount >= ?1
            RETURNING amount
            "#,
            params![delta, at, key.channel, key.book.as_str(), key.name],
            |row| row.get(0),
        )
        .optional()?;
    Ok(amount)
}

fn current_amount(tx: &Transaction<'_>, key: &EntryKey) -> Result<Option<i64>> {
    let amount = tx
        .query_row(
            "SELECT amount FROM ledger_entries WHERE channel = ?1 AND book = ?2 AND name = ?3",
            params![key.channel, key.book.as_str(), key.name],
            |row| row.get(0),
        )
        .optional()?;
    Ok(amount)
}

fn prune(tx: &Transaction<'_>, key: &EntryKey, amount: i64) -> Result<bool> {
    if amount > 0 {
        return Ok(false);
    }
    tx.execute(
        "DELETE FROM ledger_entries WHERE channel = ?1 AND book = ?2 AND name = ?3 AND amount <= 0",
        params![key.channel, key.book.as_str(), key.name],
    )?;
    Ok(true)
}

impl LedgerStore for SqliteStore {
    fn get(&self, key: &EntryKey) -> Result<Option<LedgerEntry>> {
        let conn = self.lock_conn()?;
        let row = conn
            .query_row(
                &format!(
                    "SELECT {} FROM ledger_entries WHERE channel = ?1 AND book = ?2 AND name = ?3",
                    ENTRY_COLUMNS
                ),
                params![key.channel, key.book.as_str(), key.name],
                EntryRow::from_row,
            )
            .optional()?;
        row.map(LedgerEntry::try_from).transpose()
    }

    fn list(&self, scope: &BookScope) -> Result<Vec<LedgerEntry>> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM ledger_entries WHERE channel = ?1 AND book = ?2 ORDER BY name ASC",
            ENTRY_COLUMNS
        ))?;
        let rows = stmt.query_map(
            params![scope.channel, scope.book.as_str()],
            EntryRow::from_row,
        )?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?.try_into()?);
        }
        Ok(entries)
    }

    fn increment(&self, key: &EntryKey, delta: i64) -> Result<BalanceChange> {
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction()?;

        let new_amount = upsert_add(&tx, key, delta, &now())?;
        let removed = prune(&tx, key, new_amount)?;
        tx.commit()?;

        Ok(BalanceChange {
            old_amount: new_amount - delta,
            new_amount,
            removed,
        })
    }

    fn decrement(&self, key: &EntryKey, delta: i64) -> Result<Decrement> {
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction()?;

        match conditional_subtract(&tx, key, delta, &now())? {
            Some(new_amount) => {
                let removed = prune(&tx, key, new_amount)?;
                tx.commit()?;
                Ok(Decrement::Applied(BalanceChange {
                    old_amount: new_amount + delta,
                    new_amount,
                    removed,
                }))
            }
            None => Ok(match current_amount(&tx, key)? {
                Some(available) => Decrement::Insufficient { available },
                None => Decrement::Missing,
            }),
        }
    }

    fn transfer(
        &self,
        from: &EntryKey,
        debit: i64,
        to: &EntryKey,
        credit: i64,
    ) -> Result<Transfer> {
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction()?;
        let at = now();

        let Some(debited) = conditional_subtract(&tx, from, debit, &at)? else {
            let available = current_amount(&tx, from)?.unwrap_or(0);
            return Ok(Transfer::Insufficient { available });
        };
        let credited = upsert_add(&tx, to, credit, &at)?;
        let debit_removed = prune(&tx, from, debited)?;
        let credit_removed = prune(&tx, to, credited)?;
        tx.commit()?;

        Ok(Transfer::Applied {
            debit: BalanceChange {
                old_amount: debited + debit,
                new_amount: debited,
                removed: debit_removed,
            },
            credit: BalanceChange {
                old_amount: credited - credit,
                new_amount: credited,
                removed: credit_removed,
            },
        })
    }

    fn rename(&self, old: &EntryKey, new_name: &str) -> Result<Rename> {
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction()?;
        let at = now();
        let new_key = old.scope().key(new_name);

        let Some(old_amount) = current_amount(&tx, old)? else {
            return Ok(Rename::Missing);
        };

        let outcome = match current_amount(&tx, &new_key)? {
            Some(existing_amount) => {
                let total = upsert_add(&tx, &new_key, old_amount, &at)?;
                tx.execute(
                    "DELETE FROM ledger_entries WHERE channel = ?1 AND book = ?2 AND name = ?3",
                    params![old.channel, old.book.as_str(), old.name],
                )?;
                Rename::Merged {
                    old_amount,
                    existing_amount,
                    total,
                }
            }
            None => {
                tx.execute(
                    r#"
                    UPDATE ledger_entries SET name = ?1, updated_at = ?2
                    WHERE channel = ?3 AND book = ?4 AND name = ?5
                    "#,
                    params![new_name, at, old.channel, old.book.as_str(), old.name],
                )?;
                Rename::Moved { amount: old_amount }
            }
        };
        tx.commit()?;
        Ok(outcome)
    }

    fn clear(&self, scope: &BookScope) -> Result<Vec<LedgerEntry>> {
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction()?;

        let rows = {
            let mut stmt = tx.prepare(&format!(
                "SELECT {} FROM ledger_entries WHERE channel = ?1 AND book = ?2 ORDER BY name ASC",
                ENTRY_COLUMNS
            ))?;
            let mapped = stmt.query_map(
                params![scope.channel, scope.book.as_str()],
                EntryRow::from_row,
            )?;
            mapped.collect::<rusqlite::Result<Vec<_>>>()?
        };

        tx.execute(
            "DELETE FROM ledger_entries WHERE channel = ?1 AND book = ?2",
            params![scope.channel, scope.book.as_str()],
        )?;
        tx.commit()?;

        rows.into_iter().map(LedgerEntry::try_from).collect()
    }

    fn settings(
        &self,
        channel: &str,
        system: CurrencySystem,
        defaults: &serde_json::Value,
    ) -> Result<ChannelSettings> {
        let conn = self.lock_conn()?;
        let at = now();
        conn.execute(
            r#"
            INSERT INTO bank_settings (channel, system, settings_json, updated_by, created_at, updated_at)
            VALUES (?1, ?2, ?3, NULL, ?4, ?4)
            ON CONFLICT(channel, system) DO NOTHING
            "#,
            params![channel, system.as_str(), serde_json::to_string(defaults)?, at],
        )?;

        let row = conn.query_row(
            &format!(
                "SELECT {} FROM bank_settings WHERE channel = ?1 AND system = ?2",
                SETTINGS_COLUMNS
            ),
            params![channel, system.as_str()],
            SettingsRow::from_row,
        )?;
        row.try_into()
    }

    fn put_settings(
        &self,
        channel: &str,
        system: CurrencySystem,
        settings: &serde_json::Value,
        updated_by: &str,
    ) -> Result<ChannelSettings> {
        let conn = self.lock_conn()?;
        let at = now();
        let row = conn.query_row(
            &format!(
                r#"
                INSERT INTO bank_settings (channel, system, settings_json, updated_by, created_at, updated_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?5)
                ON CONFLICT(channel, system) DO UPDATE
                    SET settings_json = excluded.settings_json,
                        updated_by = excluded.updated_by,
                        updated_at = excluded.updated_at
                RETURNING {}
                "#,
                SETTINGS_COLUMNS
            ),
            params![
                channel,
                system.as_str(),
                serde_json::to_string(settings)?,
                updated_by,
                at
            ],
            SettingsRow::from_row,
        )?;
        row.try_into()
    }
}

impl AuditLog for SqliteStore {
    fn append(&self, record: &AuditRecord) -> Result<()> {
        let conn = self.lock_conn()?;
        conn.execute(
            &format!(
                "INSERT INTO audit_log ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                AUDIT_COLUMNS
            ),
            params![
                record.id.to_string(),
                record.channel,
                record.book.as_str(),
                record.action.as_str(),
                record.actor.id,
                record.actor.name,
                serde_json::to_string(&record.details)?,
                record
                    .timestamp
                    .to_rfc3339_opts(SecondsFormat::Micros, true),
            ],
        )?;
        Ok(())
    }

    fn query(&self, scope: &BookScope, limit: usize) -> Result<Vec<AuditRecord>> {
        let conn = self.lock_conn()?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let mut stmt = conn.prepare(&format!(
            r#"
            SELECT {} FROM audit_log
            WHERE channel = ?1 AND book = ?2
            ORDER BY timestamp DESC, rowid DESC
            LIMIT ?3
            "#,
            AUDIT_COLUMNS
        ))?;
        let rows = stmt.query_map(
            params![scope.channel, scope.book.as_str(), limit],
            AuditRow::from_row,
        )?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?.try_into()?);
        }
        Ok(records)
    }
}
