//! Plain-text replies.

use rust_decimal::Decimal;
use serde_json::Value;

use tally_core::bank::{CoinChange, Conversion, DecimalBalance, DecimalChange, DndBalance, FeeSchedule};
use tally_core::currency::{Currency, DecimalFormat};
use tally_core::dice::RollResult;
use tally_core::reference::{Lookup, ReferenceKind};
use tally_core::storage::{AuditRecord, BalanceChange, LedgerEntry, Rename};
use tally_core::tracker::{SearchOutcome, TrackerListing};

pub fn quantity_change(name: &str, change: &BalanceChange) -> String {
    let mut message = format!(
        "Changed the quantity of {} from {} to {}.",
        name, change.old_amount, change.new_amount
    );
    if change.removed {
        message.push_str(" Removed the item from the tracker.");
    }
    message
}

pub fn tracker_item(name: &str, entry: Option<&LedgerEntry>) -> String {
    match entry {
        Some(entry) => format!("{}: {}", entry.name, entry.amount),
        None => format!("{}: 0 (not in the tracker)", name),
    }
}

pub fn tracker_summary(listing: &TrackerListing) -> String {
    format!(
        "Tracker Contents ({} items, {} total)",
        listing.items.len(),
        listing.total_quantity
    )
}

pub fn tracker_listing(listing: &TrackerListing) -> String {
    if listing.items.is_empty() {
        return "The tracker is empty.".to_string();
    }
    let lines: Vec<String> = listing
        .items
        .iter()
        .enumerate()
        .map(|(i, item)| format!("{}. {}: {}", i + 1, item.name, item.amount))
        .collect();
    format!("{}:\n\n{}", tracker_summary(listing), lines.join("\n"))
}

pub fn search_outcome(term: &str, outcome: &SearchOutcome) -> String {
    match outcome {
        SearchOutcome::Substring(items) => {
            let lines: Vec<String> = items
                .iter()
                .map(|item| format!("- {}: {}", item.name, item.amount))
                .collect();
            format!("Items matching \"{}\":\n{}", term, lines.join("\n"))
        }
        SearchOutcome::Similar(items) if items.is_empty() => {
            format!("No items found matching \"{}\".", term)
        }
        SearchOutcome::Similar(items) => {
            let lines: Vec<String> = items
                .iter()
                .map(|s| {
                    format!(
                        "- {}: {} ({}% match)",
                        s.entry.name,
                        s.entry.amount,
                        percent(s.score)
                    )
                })
                .collect();
            format!(
                "No exact matches for \"{}\". Did you mean:\n{}",
                term,
                lines.join("\n")
            )
        }
    }
}

pub fn rename(old_name: &str, new_name: &str, outcome: &Rename) -> String {
    match outcome {
        Rename::Moved { amount } => format!(
            "Renamed {} to {} (quantity {}).",
            old_name, new_name, amount
        ),
        Rename::Merged {
            old_amount,
            existing_amount,
            total,
        } => format!(
            "Merged {} ({}) into {} ({}). New quantity: {}.",
            old_name, old_amount, new_name, existing_amount, total
        ),
        Rename::Missing => format!("Item \"{}\" not found in the tracker.", old_name),
    }
}

pub fn cleared(what: &str, removed: &[LedgerEntry]) -> String {
    if removed.is_empty() {
        format!("The {} is already empty.", what)
    } else {
        format!("Cleared the {} ({} entries removed).", what, removed.len())
    }
}

/// Render records oldest first; `records` arrive newest first.
///
/// With `money`, amount fields are shown in that decimal display format.
pub fn audit(title: &str, records: &[AuditRecord], money: Option<&DecimalFormat>) -> String {
    if records.is_empty() {
        return format!("No {} entries yet.", title.to_lowercase());
    }
    let lines: Vec<String> = records
        .iter()
        .rev()
        .map(|record| {
            format!(
                "[{}] {} {}: {}",
                record.timestamp.format("%Y-%m-%d %H:%M:%S"),
                record.actor.name,
                record.action,
                details(&record.details, money)
            )
        })
        .collect();
    format!("{}:\n\n{}", audit_summary(title, records), lines.join("\n"))
}

pub fn audit_summary(title: &str, records: &[AuditRecord]) -> String {
    format!("{} ({} recent entries)", title, records.len())
}

const AMOUNT_KEYS: [&str; 4] = ["amount", "delta", "old_amount", "new_amount"];

fn details(value: &Value, money: Option<&DecimalFormat>) -> String {
    match value {
        Value::Object(map) => map
            .iter()
            .map(|(key, value)| {
                let rendered = match (money, value) {
                    (Some(format), Value::String(raw)) if AMOUNT_KEYS.contains(&key.as_str()) => {
                        raw.parse::<Decimal>()
                            .map(|amount| format.format(amount))
                            .unwrap_or_else(|_| raw.clone())
                    }
                    _ => details(value, money),
                };
                format!("{}={}", key, rendered)
            })
            .collect::<Vec<_>>()
            .join(", "),
        Value::String(s) => s.clone(),
        Value::Array(items) => format!(
            "[{}]",
            items
                .iter()
                .map(|item| details(item, money))
                .collect::<Vec<_>>()
                .join("; ")
        ),
        other => other.to_string(),
    }
}

fn coin(currency: Currency, amount: i64) -> String {
    format!("{} {}", amount, currency.abbreviation())
}

pub fn coin_change(verb: &str, change: &CoinChange) -> String {
    format!(
        "{} {}. {} balance: {} (was {}).",
        verb,
        coin(change.currency, change.amount),
        change.currency,
        coin(change.currency, change.change.new_amount),
        change.change.old_amount
    )
}

pub fn balance_summary(balance: &DndBalance) -> String {
    let pieces = balance
        .coins
        .iter()
        .fold(0i64, |total, c| total.saturating_add(c.amount));
    format!(
        "Bank Balance ({} currencies, {} total pieces, {} total gold)",
        balance.coins.len(),
        pieces,
        gold(balance.total_gold)
    )
}

pub fn dnd_balance(balance: &DndBalance) -> String {
    if balance.is_empty() {
        return "The bank is empty.".to_string();
    }
    let lines: Vec<String> = balance
        .coins
        .iter()
        .map(|c| {
            format!(
                "{}: {} ({} gp)",
                c.currency,
                coin(c.currency, c.amount),
                gold(c.gold_value)
            )
        })
        .collect();
    format!("{}:\n\n{}", balance_summary(balance), lines.join("\n"))
}

fn gold(value: Decimal) -> String {
    value.round_dp(2).normalize().to_string()
}

fn rate_percent(rate: Decimal) -> String {
    (rate * Decimal::ONE_HUNDRED).normalize().to_string()
}

fn percent(score: f64) -> i64 {
    (score * 100.0).round() as i64
}

pub fn conversion(conversion: &Conversion) -> String {
    format!(
        "Converted {} {} -> {} {}\nFee: {}% ({} deducted before conversion)",
        conversion.amount,
        conversion.from,
        conversion.converted,
        conversion.to,
        rate_percent(conversion.fee_rate),
        coin(conversion.from, conversion.fee)
    )
}

pub fn fee_schedule(schedule: &FeeSchedule) -> String {
    let mut message = format!(
        "Bank Conversion Fees:\n\nCurrent Fee Rate: {}%",
        rate_percent(schedule.fee_rate)
    );
    if schedule.is_default {
        message.push_str(" (default)");
    }
    if let Some(updated_at) = schedule.updated_at {
        message.push_str(&format!(
            "\nLast Updated: {}",
            updated_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));
    }
    message.push_str("\n\nFee Examples:");
    for example in &schedule.examples {
        message.push_str(&format!(
            "\n- Converting {} -> {}: fee of {}",
            coin(example.from, example.amount),
            example.to.abbreviation(),
            coin(example.from, example.fee)
        ));
    }
    message
}

pub fn fee_set(rate: Decimal) -> String {
    format!("Conversion fee set to {}%.", rate_percent(rate))
}

pub fn decimal_change(verb: &str, change: &DecimalChange) -> String {
    format!(
        "{} {}. Balance: {} (was {}).",
        verb,
        change.format.format(change.delta),
        change.format.format(change.new_amount),
        change.format.format(change.old_amount)
    )
}

pub fn decimal_balance(balance: &DecimalBalance) -> String {
    format!("Balance: {}", balance.formatted())
}

pub fn format_set(format: &DecimalFormat) -> String {
    format!(
        "Decimal format updated. Example: {}",
        format.format(Decimal::new(123456, 2))
    )
}

pub fn roll(result: &RollResult) -> String {
    let results: Vec<String> = result.results.iter().map(u32::to_string).collect();
    format!(
        "Rolling {}...\n{} = {}",
        result.spec,
        results.join(" + "),
        result.total
    )
}

pub fn lookup(kind: ReferenceKind, query: &str, lookup: &Lookup<'_>) -> String {
    match lookup {
        Lookup::Exact(records) => records
            .iter()
            .map(|record| {
                let mut block = record.name.clone();
                if let Some(source) = &record.source {
                    block.push_str(&format!(" ({})", source));
                }
                if let Some(description) = &record.description {
                    block.push_str(&format!("\n{}", description));
                }
                block
            })
            .collect::<Vec<_>>()
            .join("\n\n"),
        Lookup::Suggestions(suggestions) if suggestions.is_empty() => {
            format!("No {} found matching \"{}\".", kind, query)
        }
        Lookup::Suggestions(suggestions) => {
            let lines: Vec<String> = suggestions
                .iter()
                .map(|s| format!("- {} ({}% match)", s.item.name, percent(s.score)))
                .collect();
            format!(
                "No {} named \"{}\". Did you mean:\n{}",
                kind,
                query,
                lines.join("\n")
            )
        }
    }
}
