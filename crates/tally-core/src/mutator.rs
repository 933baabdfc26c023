//! Audited balance mutations shared by the tracker and both bank systems.
//!
//! Each call performs one atomic store operation and then records exactly
//! one audit entry. Rejected calls leave the store untouched and write
//! nothing to the audit log.

use serde_json::json;

use crate::audit::AuditRecorder;
use crate::currency::cents_to_decimal;
use crate::error::{Result, TallyError};
use crate::storage::{
    Actor, AuditAction, BalanceChange, Book, BookScope, Decrement, EntryKey, LedgerEntry,
    LedgerStore, Rename,
};

/// Audit tags used for a book's credit, debit and emptying debit.
fn actions(book: Book) -> (AuditAction, AuditAction, AuditAction) {
    match book {
        Book::Tracker => (AuditAction::Add, AuditAction::Remove, AuditAction::RemoveAll),
        Book::Dnd | Book::Decimal => (
            AuditAction::Deposit,
            AuditAction::Withdraw,
            AuditAction::WithdrawAll,
        ),
    }
}

/// An amount as it appears in audit details. The decimal book stores
/// hundredths but logs currency units.
fn audit_amount(book: Book, amount: i64) -> serde_json::Value {
    match book {
        Book::Decimal => json!(cents_to_decimal(amount)),
        Book::Tracker | Book::Dnd => json!(amount),
    }
}

fn change_details(key: &EntryKey, delta: i64, change: &BalanceChange) -> serde_json::Value {
    json!({
        "name": key.name,
        "delta": audit_amount(key.book, delta),
        "old_amount": audit_amount(key.book, change.old_amount),
        "new_amount": audit_amount(key.book, change.new_amount),
    })
}

pub struct BalanceMutator<'a> {
    store: &'a dyn LedgerStore,
    audit: AuditRecorder<'a>,
}

impl<'a> BalanceMutator<'a> {
    pub fn new(store: &'a dyn LedgerStore, audit: AuditRecorder<'a>) -> Self {
        Self { store, audit }
    }

    /// Add `delta` to the entry, creating it if needed.
    pub fn credit(&self, key: &EntryKey, delta: i64, actor: &Actor) -> Result<BalanceChange> {
        let change = self.store.increment(key, delta)?;
        tracing::debug!(key = %key, delta, new_amount = change.new_amount, "credited");

        let (credit, _, emptied) = actions(key.book);
        let action = if change.removed { emptied } else { credit };
        self.audit
            .record(&key.scope(), action, actor, change_details(key, delta, &change));
        Ok(change)
    }

    /// Subtract `delta`, deleting the entry when it reaches zero.
    ///
    /// A missing tracker item is `NotFound`; a missing bank balance is an
    /// insufficient balance of zero.
    pub fn debit(&self, key: &EntryKey, delta: i64, actor: &Actor) -> Result<BalanceChange> {
        let change = match self.store.decrement(key, delta)? {
            Decrement::Applied(change) => change,
            Decrement::Missing if key.book == Book::Tracker => {
                return Err(TallyError::NotFound(key.name.clone()))
            }
            Decrement::Missing => {
                return Err(TallyError::InsufficientBalance {
                    name: key.name.clone(),
                    available: 0,
                    requested: delta,
                })
            }
            Decrement::Insufficient { available } => {
                return Err(TallyError::InsufficientBalance {
                    name: key.name.clone(),
                    available,
                    requested: delta,
                })
            }
        };
        tracing::debug!(key = %key, delta, new_amount = change.new_amount, "debited");

        let (_, debit, emptied) = actions(key.book);
        let action = if change.removed { emptied } else { debit };
        self.audit
            .record(&key.scope(), action, actor, change_details(key, delta, &change));
        Ok(change)
    }

    /// Move an entry to `new_name`, merging into an existing entry.
    pub fn rename(&self, old: &EntryKey, new_name: &str, actor: &Actor) -> Result<Rename> {
        if old.name == new_name {
            return Err(TallyError::SameName);
        }

        let outcome = self.store.rename(old, new_name)?;
        let (action, details) = match outcome {
            Rename::Missing => return Err(TallyError::NotFound(old.name.clone())),
            Rename::Moved { amount } => (
                AuditAction::Rename,
                json!({
                    "old_name": old.name,
                    "new_name": new_name,
                    "amount": amount,
                }),
            ),
            Rename::Merged {
                old_amount,
                existing_amount,
                total,
            } => (
                AuditAction::RenameMerge,
                json!({
                    "old_name": old.name,
                    "new_name": new_name,
                    "old_amount": old_amount,
                    "merged_with_amount": existing_amount,
                    "total_amount": total,
                }),
            ),
        };
        tracing::info!(key = %old, new_name, action = %action, "renamed");

        self.audit.record(&old.scope(), action, actor, details);
        Ok(outcome)
    }

    /// Delete every entry in the book. An empty book writes no audit record.
    pub fn clear(&self, scope: &BookScope, actor: &Actor) -> Result<Vec<LedgerEntry>> {
        let cleared = self.store.clear(scope)?;
        if cleared.is_empty() {
            return Ok(cleared);
        }
        tracing::info!(
            channel = %scope.channel,
            book = %scope.book,
            count = cleared.len(),
            "cleared"
        );

        let entries: Vec<serde_json::Value> = cleared
            .iter()
            .map(|entry| {
                json!({
                    "name": entry.name,
                    "amount": audit_amount(scope.book, entry.amount),
                })
            })
            .collect();
        self.audit.record(
            scope,
            AuditAction::Clear,
            actor,
            json!({ "count": cleared.len(), "entries": entries }),
        );
        Ok(cleared)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{AuditLog, SqliteStore};

    fn actor() -> Actor {
        Actor::new("42", "bob")
    }

    fn latest_actions(store: &SqliteStore, scope: &BookScope) -> Vec<AuditAction> {
        store
            .query(scope, 10)
            .unwrap()
            .into_iter()
            .map(|r| r.action)
            .collect()
    }

    #[test]
    fn test_credit_then_full_debit() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mutator = BalanceMutator::new(&store, AuditRecorder::new(&store));
        let key = BookScope::new("c", Book::Dnd).key("gold");

        mutator.credit(&key, 30, &actor()).unwrap();
        let change = mutator.debit(&key, 30, &actor()).unwrap();
        assert!(change.removed);
        assert_eq!(
            latest_actions(&store, &key.scope()),
            vec![AuditAction::WithdrawAll, AuditAction::Deposit]
        );
    }

    #[test]
    fn test_partial_debit_uses_plain_action() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mutator = BalanceMutator::new(&store, AuditRecorder::new(&store));
        let key = BookScope::new("c", Book::Tracker).key("rope");

        mutator.credit(&key, 3, &actor()).unwrap();
        let change = mutator.debit(&key, 1, &actor()).unwrap();
        assert_eq!((change.old_amount, change.new_amount), (3, 2));

        let records = store.query(&key.scope(), 1).unwrap();
        assert_eq!(records[0].action, AuditAction::Remove);
        assert_eq!(records[0].details["old_amount"], 3);
        assert_eq!(records[0].details["new_amount"], 2);
        assert_eq!(records[0].details["name"], "rope");
    }

    #[test]
    fn test_rejected_debit_writes_nothing() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mutator = BalanceMutator::new(&store, AuditRecorder::new(&store));
        let key = BookScope::new("c", Book::Tracker).key("rope");

        assert!(matches!(
            mutator.debit(&key, 1, &actor()),
            Err(TallyError::NotFound(_))
        ));
        mutator.credit(&key, 2, &actor()).unwrap();
        assert!(matches!(
            mutator.debit(&key, 5, &actor()),
            Err(TallyError::InsufficientBalance {
                available: 2,
                requested: 5,
                ..
            })
        ));
        assert_eq!(latest_actions(&store, &key.scope()), vec![AuditAction::Add]);
    }

    #[test]
    fn test_missing_bank_balance_is_insufficient() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mutator = BalanceMutator::new(&store, AuditRecorder::new(&store));
        let key = BookScope::new("c", Book::Dnd).key("copper");

        assert!(matches!(
            mutator.debit(&key, 3, &actor()),
            Err(TallyError::InsufficientBalance {
                available: 0,
                requested: 3,
                ..
            })
        ));
    }

    #[test]
    fn test_rename_rules() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mutator = BalanceMutator::new(&store, AuditRecorder::new(&store));
        let scope = BookScope::new("c", Book::Tracker);

        assert!(matches!(
            mutator.rename(&scope.key("a"), "a", &actor()),
            Err(TallyError::SameName)
        ));
        assert!(matches!(
            mutator.rename(&scope.key("a"), "b", &actor()),
            Err(TallyError::NotFound(_))
        ));
        assert!(latest_actions(&store, &scope).is_empty());
    }

    #[test]
    fn test_decimal_details_use_currency_units() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mutator = BalanceMutator::new(&store, AuditRecorder::new(&store));
        let key = BookScope::new("c", Book::Decimal).key("decimal");

        mutator.credit(&key, 1235, &actor()).unwrap();
        mutator.debit(&key, 5, &actor()).unwrap();
        mutator.clear(&key.scope(), &actor()).unwrap();

        let records = store.query(&key.scope(), 3).unwrap();
        assert_eq!(records[0].details["entries"][0]["amount"], "12.30");
        assert_eq!(records[1].details["delta"], "0.05");
        assert_eq!(records[1].details["new_amount"], "12.30");
        assert_eq!(records[2].details["old_amount"], "0.00");
        assert_eq!(records[2].details["new_amount"], "12.35");
    }

    #[test]
    fn test_clear_empty_book_is_silent() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mutator = BalanceMutator::new(&store, AuditRecorder::new(&store));
        let scope = BookScope::new("c", Book::Tracker);

        assert!(mutator.clear(&scope, &actor()).unwrap().is_empty());
        assert!(latest_actions(&store, &scope).is_empty());

        mutator.credit(&scope.key("a"), 1, &actor()).unwrap();
        mutator.credit(&scope.key("b"), 2, &actor()).unwrap();
        assert_eq!(mutator.clear(&scope, &actor()).unwrap().len(), 2);

        let records = store.query(&scope, 1).unwrap();
        assert_eq!(records[0].action, AuditAction::Clear);
        assert_eq!(records[0].details["count"], 2);
    }
}
