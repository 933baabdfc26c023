//! End-to-end behaviour of the services over the SQLite backend.

use std::thread;

use rust_decimal::Decimal;
use tally_core::bank::Bank;
use tally_core::currency::CurrencySystem;
use tally_core::fuzzy::{self, MatchOptions, Resolution};
use tally_core::storage::{
    Actor, AuditAction, AuditLog, AuditRecord, Book, BookScope, LedgerStore, Rename,
};
use tally_core::tracker::{Tracker, TrackerOptions};
use tally_core::{SqliteStore, TallyError};

fn actor() -> Actor {
    Actor::new("100", "ranger")
}

fn tracker(store: &SqliteStore) -> Tracker<'_> {
    Tracker::new(store, store, TrackerOptions::default())
}

#[test]
fn deposit_then_withdraw_everything_removes_entry() {
    let store = SqliteStore::open_in_memory().unwrap();
    let bank = Bank::new(&store, &store);

    bank.deposit("c", "gold", 10, &actor()).unwrap();
    let change = bank.withdraw("c", "gold", 10, &actor()).unwrap();
    assert!(change.change.removed);
    assert!(bank.balance("c").unwrap().is_empty());

    let records = bank
        .audit("c", CurrencySystem::Dnd, 10)
        .unwrap();
    let actions: Vec<AuditAction> = records.iter().map(|r| r.action).collect();
    assert_eq!(actions, vec![AuditAction::WithdrawAll, AuditAction::Deposit]);
}

#[test]
fn rejected_withdrawal_changes_nothing() {
    let store = SqliteStore::open_in_memory().unwrap();
    let bank = Bank::new(&store, &store);
    bank.deposit("c", "sp", 5, &actor()).unwrap();

    let err = bank.withdraw("c", "silver", 6, &actor()).unwrap_err();
    match err {
        TallyError::InsufficientBalance {
            available,
            requested,
            ..
        } => {
            assert_eq!(available, 5);
            assert_eq!(requested, 6);
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let balance = bank.balance("c").unwrap();
    assert_eq!(balance.coins.len(), 1);
    assert_eq!(balance.coins[0].amount, 5);
    let scope = BookScope::new("c", Book::Dnd);
    assert_eq!(store.query(&scope, 10).unwrap().len(), 1);
}

#[test]
fn rename_into_existing_item_sums_quantities() {
    let store = SqliteStore::open_in_memory().unwrap();
    let tracker = tracker(&store);
    tracker.add("c", "arrow", 7, &actor()).unwrap();
    tracker.add("c", "arrows", 5, &actor()).unwrap();

    let outcome = tracker.rename("c", "arrow", "arrows", &actor()).unwrap();
    assert_eq!(
        outcome,
        Rename::Merged {
            old_amount: 7,
            existing_amount: 5,
            total: 12
        }
    );
    assert!(tracker.get("c", "arrow").unwrap().is_none());
    assert_eq!(tracker.get("c", "arrows").unwrap().unwrap().amount, 12);

    let latest = &tracker.audit("c", 1).unwrap()[0];
    assert_eq!(latest.action, AuditAction::RenameMerge);
}

#[test]
fn conversion_charges_fee_in_source_currency() {
    let store = SqliteStore::open_in_memory().unwrap();
    let bank = Bank::new(&store, &store);
    bank.deposit("c", "gold", 110, &actor()).unwrap();

    let conversion = bank.convert("c", "gold", "silver", 100, &actor()).unwrap();
    assert_eq!(conversion.fee, 10);
    assert_eq!(conversion.total_deducted, 110);
    assert_eq!(conversion.converted, 1000);

    let balance = bank.balance("c").unwrap();
    assert_eq!(balance.coins.len(), 1);
    assert_eq!(balance.coins[0].amount, 1000);

    let records = bank
        .audit("c", CurrencySystem::Dnd, 1)
        .unwrap();
    assert_eq!(records[0].action, AuditAction::Convert);
    assert_eq!(records[0].details["fee_amount"], 10);
}

#[test]
fn conversion_needs_amount_plus_fee() {
    let store = SqliteStore::open_in_memory().unwrap();
    let bank = Bank::new(&store, &store);
    bank.deposit("c", "gold", 100, &actor()).unwrap();

    let err = bank.convert("c", "gold", "silver", 100, &actor()).unwrap_err();
    assert!(matches!(
        err,
        TallyError::InsufficientBalance {
            available: 100,
            requested: 110,
            ..
        }
    ));
    assert_eq!(bank.balance("c").unwrap().coins[0].amount, 100);
}

#[test]
fn same_currency_conversion_is_rejected() {
    let store = SqliteStore::open_in_memory().unwrap();
    let bank = Bank::new(&store, &store);
    bank.deposit("c", "gold", 50, &actor()).unwrap();

    let err = bank.convert("c", "gold", "gp", 10, &actor()).unwrap_err();
    assert!(matches!(err, TallyError::InvalidArgument(_)));
    assert_eq!(bank.balance("c").unwrap().coins[0].amount, 50);
}

#[test]
fn tracker_scenario_add_remove_get() {
    let store = SqliteStore::open_in_memory().unwrap();
    let tracker = tracker(&store);

    let added = tracker.add("c", "arrows", 50, &actor()).unwrap();
    assert_eq!(added.new_amount, 50);

    let removed = tracker.remove("c", "arrows", 50, &actor()).unwrap();
    assert_eq!(removed.new_amount, 0);
    assert!(removed.removed);

    assert!(tracker.get("c", "arrows").unwrap().is_none());
}

#[test]
fn fuzzy_resolution_ranks_close_names() {
    let candidates = vec!["sword".to_string(), "sworn".to_string(), "axe".to_string()];
    match fuzzy::resolve("sward", &candidates, MatchOptions::default()) {
        Resolution::Suggestions(suggestions) => {
            let names: Vec<&str> = suggestions.iter().map(|s| s.item.as_str()).collect();
            assert_eq!(names, vec!["sword", "sworn"]);
        }
        Resolution::Exact(_) => panic!("no exact match expected"),
    }
}

#[test]
fn file_backed_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("tally.db");

    {
        let store = SqliteStore::open(&path).unwrap();
        tracker(&store).add("c", "torch", 3, &actor()).unwrap();
    }

    let store = SqliteStore::open(&path).unwrap();
    let tracker = tracker(&store);
    assert_eq!(tracker.get("c", "torch").unwrap().unwrap().amount, 3);
    assert_eq!(tracker.audit("c", 10).unwrap().len(), 1);
}

struct UnavailableLog;

impl AuditLog for UnavailableLog {
    fn append(&self, _record: &AuditRecord) -> tally_core::Result<()> {
        Err(TallyError::StorageUnavailable("audit offline".to_string()))
    }

    fn query(&self, _scope: &BookScope, _limit: usize) -> tally_core::Result<Vec<AuditRecord>> {
        Err(TallyError::StorageUnavailable("audit offline".to_string()))
    }
}

#[test]
fn audit_failure_does_not_fail_mutation() {
    let store = SqliteStore::open_in_memory().unwrap();
    let tracker = Tracker::new(&store, &UnavailableLog, TrackerOptions::default());

    let change = tracker.add("c", "rope", 2, &actor()).unwrap();
    assert_eq!(change.new_amount, 2);
    assert_eq!(tracker.get("c", "rope").unwrap().unwrap().amount, 2);
}

#[test]
fn decimal_audit_records_currency_units() {
    let store = SqliteStore::open_in_memory().unwrap();
    let bank = Bank::new(&store, &store);
    bank.decimal_deposit("c", Decimal::new(1235, 2), &actor())
        .unwrap();

    let records = bank.audit("c", CurrencySystem::Decimal, 1).unwrap();
    assert_eq!(records[0].action, AuditAction::Deposit);
    let new_amount: Decimal = records[0].details["new_amount"]
        .as_str()
        .unwrap()
        .parse()
        .unwrap();
    assert_eq!(new_amount, Decimal::new(1235, 2));
    assert_eq!(records[0].details["delta"], "12.35");
}

#[test]
fn concurrent_adds_all_land() {
    const THREADS: usize = 8;
    const ADDS: usize = 25;

    let store = SqliteStore::open_in_memory().unwrap();
    thread::scope(|s| {
        for _ in 0..THREADS {
            s.spawn(|| {
                let tracker = tracker(&store);
                for _ in 0..ADDS {
                    tracker.add("c", "arrows", 1, &actor()).unwrap();
                }
            });
        }
    });

    let tracker = tracker(&store);
    let expected = THREADS * ADDS;
    assert_eq!(
        tracker.get("c", "arrows").unwrap().unwrap().amount,
        expected as i64
    );
    assert_eq!(tracker.audit("c", expected + 10).unwrap().len(), expected);
}
