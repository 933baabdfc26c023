//! JSON shapes for replies and artifacts.

use serde::Serialize;
use serde_json::{json, Map, Value};

use tally_core::bank::DndBalance;
use tally_core::storage::{AuditRecord, LedgerEntry};

/// Serialize any reply payload.
pub fn value<T: Serialize>(payload: &T) -> anyhow::Result<Value> {
    Ok(serde_json::to_value(payload)?)
}

/// Tracker artifact: item name to quantity.
pub fn tracker_json(items: &[LedgerEntry]) -> Value {
    let map: Map<String, Value> = items
        .iter()
        .map(|item| (item.name.clone(), json!(item.amount)))
        .collect();
    Value::Object(map)
}

/// Balance artifact keyed by `"<currency> (<abbr>)"`.
pub fn balance_json(balance: &DndBalance) -> Value {
    let mut map = Map::new();
    for coin in &balance.coins {
        map.insert(
            format!("{} ({})", coin.currency, coin.currency.abbreviation()),
            json!({
                "amount": coin.amount,
                "gold_value": coin.gold_value,
            }),
        );
    }
    map.insert("total_gold".to_string(), json!(balance.total_gold));
    Value::Object(map)
}

/// Audit artifact, newest first as stored.
pub fn audit_json(records: &[AuditRecord]) -> Value {
    Value::Array(
        records
            .iter()
            .map(|record| {
                json!({
                    "timestamp": record.timestamp.to_rfc3339(),
                    "user_id": record.actor.id,
                    "username": record.actor.name,
                    "action": record.action,
                    "details": record.details,
                })
            })
            .collect(),
    )
}
