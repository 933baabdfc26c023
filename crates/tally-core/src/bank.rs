//! Channel bank with two independent currency systems.
//!
//! The D&D system keeps one entry per denomination and charges a fee on
//! conversions. The decimal system keeps a single balance in hundredths and
//! a per-channel display format.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::audit::AuditRecorder;
use crate::convert::{conversion_fee, default_fee_rate, ConversionPlan};
use crate::currency::{cents_to_decimal, Currency, CurrencySystem, DecimalFormat};
use crate::error::{Result, TallyError};
use crate::mutator::BalanceMutator;
use crate::storage::{
    Actor, AuditAction, AuditLog, AuditRecord, BalanceChange, BookScope, ChannelSettings,
    EntryKey, LedgerEntry, LedgerStore, Transfer,
};
use crate::validation::{
    validate_currency, validate_decimal_amount, validate_fee_rate, validate_quantity,
    MAX_SAFE_INTEGER,
};

/// Entry name of the single decimal balance.
const DECIMAL_ENTRY: &str = "decimal";

/// Conversions shown by [`Bank::fees`].
const FEE_EXAMPLES: [(Currency, Currency, i64); 3] = [
    (Currency::Gold, Currency::Silver, 100),
    (Currency::Platinum, Currency::Gold, 50),
    (Currency::Copper, Currency::Gold, 1000),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct DndSettings {
    fee_rate: Decimal,
}

impl Default for DndSettings {
    fn default() -> Self {
        Self {
            fee_rate: default_fee_rate(),
        }
    }
}

/// A deposit or withdrawal of one denomination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CoinChange {
    pub currency: Currency,
    pub amount: i64,
    pub change: BalanceChange,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoinBalance {
    pub currency: Currency,
    pub amount: i64,
    pub gold_value: Decimal,
}

/// Every non-empty denomination, highest value first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DndBalance {
    pub coins: Vec<CoinBalance>,
    pub total_gold: Decimal,
}

impl DndBalance {
    pub fn is_empty(&self) -> bool {
        self.coins.is_empty()
    }
}

/// A completed conversion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Conversion {
    pub from: Currency,
    pub to: Currency,
    pub amount: i64,
    pub fee_rate: Decimal,
    pub fee: i64,
    pub total_deducted: i64,
    pub converted: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeeExample {
    pub from: Currency,
    pub to: Currency,
    pub amount: i64,
    pub fee: i64,
}

/// Current conversion fee and what it costs in practice.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeeSchedule {
    pub fee_rate: Decimal,
    pub is_default: bool,
    pub updated_at: Option<DateTime<Utc>>,
    pub examples: Vec<FeeExample>,
}

/// A deposit or withdrawal on the decimal balance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecimalChange {
    pub delta: Decimal,
    pub old_amount: Decimal,
    pub new_amount: Decimal,
    pub removed: bool,
    pub format: DecimalFormat,
}

impl DecimalChange {
    fn new(delta_cents: i64, change: BalanceChange, format: DecimalFormat) -> Self {
        Self {
            delta: cents_to_decimal(delta_cents),
            old_amount: cents_to_decimal(change.old_amount),
            new_amount: cents_to_decimal(change.new_amount),
            removed: change.removed,
            format,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecimalBalance {
    pub amount: Decimal,
    pub format: DecimalFormat,
}

impl DecimalBalance {
    pub fn formatted(&self) -> String {
        self.format.format(self.amount)
    }
}

/// Fields of the decimal display format to change. Unset fields keep their
/// current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormatUpdate {
    pub prefix: Option<String>,
    pub suffix: Option<String>,
    pub prefix_space_after: Option<bool>,
    pub suffix_space_before: Option<bool>,
}

impl FormatUpdate {
    pub fn is_empty(&self) -> bool {
        self.prefix.is_none()
            && self.suffix.is_none()
            && self.prefix_space_after.is_none()
            && self.suffix_space_before.is_none()
    }

    fn apply(&self, current: &DecimalFormat) -> DecimalFormat {
        DecimalFormat {
            prefix: self.prefix.clone().unwrap_or_else(|| current.prefix.clone()),
            suffix: self.suffix.clone().unwrap_or_else(|| current.suffix.clone()),
            prefix_space_after: self.prefix_space_after.unwrap_or(current.prefix_space_after),
            suffix_space_before: self
                .suffix_space_before
                .unwrap_or(current.suffix_space_before),
        }
    }
}

pub struct Bank<'a> {
    store: &'a dyn LedgerStore,
    audit: AuditRecorder<'a>,
}

impl<'a> Bank<'a> {
    pub fn new(store: &'a dyn LedgerStore, audit: &'a dyn AuditLog) -> Self {
        Self {
            store,
            audit: AuditRecorder::new(audit),
        }
    }

    fn scope(channel: &str, system: CurrencySystem) -> BookScope {
        BookScope::new(channel, system.into())
    }

    fn coin_key(channel: &str, currency: Currency) -> EntryKey {
        Self::scope(channel, CurrencySystem::Dnd).key(currency.as_str())
    }

    fn decimal_key(channel: &str) -> EntryKey {
        Self::scope(channel, CurrencySystem::Decimal).key(DECIMAL_ENTRY)
    }

    fn mutator(&self) -> BalanceMutator<'a> {
        BalanceMutator::new(self.store, self.audit)
    }

    fn dnd_settings(&self, channel: &str) -> Result<(DndSettings, ChannelSettings)> {
        let defaults = serde_json::to_value(DndSettings::default())?;
        let stored = self.store.settings(channel, CurrencySystem::Dnd, &defaults)?;
        let parsed = serde_json::from_value(stored.settings.clone())?;
        Ok((parsed, stored))
    }

    // --- D&D ---

    pub fn deposit(
        &self,
        channel: &str,
        currency: &str,
        amount: i64,
        actor: &Actor,
    ) -> Result<CoinChange> {
        let currency = validate_currency(currency)?;
        let amount = validate_quantity(amount, 1, MAX_SAFE_INTEGER)?;
        let change = self
            .mutator()
            .credit(&Self::coin_key(channel, currency), amount, actor)?;
        Ok(CoinChange {
            currency,
            amount,
            change,
        })
    }

    pub fn withdraw(
        &self,
        channel: &str,
        currency: &str,
        amount: i64,
        actor: &Actor,
    ) -> Result<CoinChange> {
        let currency = validate_currency(currency)?;
        let amount = validate_quantity(amount, 1, MAX_SAFE_INTEGER)?;
        let change = self
            .mutator()
            .debit(&Self::coin_key(channel, currency), amount, actor)?;
        Ok(CoinChange {
            currency,
            amount,
            change,
        })
    }

    pub fn balance(&self, channel: &str) -> Result<DndBalance> {
        let entries = self.store.list(&Self::scope(channel, CurrencySystem::Dnd))?;

        let mut coins = Vec::with_capacity(Currency::ALL.len());
        for currency in Currency::ALL {
            let Some(entry) = entries.iter().find(|e| e.name == currency.as_str()) else {
                continue;
            };
            coins.push(CoinBalance {
                currency,
                amount: entry.amount,
                gold_value: currency.gold_value(entry.amount),
            });
        }
        let total_gold = coins.iter().map(|c| c.gold_value).sum();

        Ok(DndBalance { coins, total_gold })
    }

    /// Convert `amount` coins, charging the channel's fee in the source
    /// denomination.
    pub fn convert(
        &self,
        channel: &str,
        from: &str,
        to: &str,
        amount: i64,
        actor: &Actor,
    ) -> Result<Conversion> {
        let from = validate_currency(from)?;
        let to = validate_currency(to)?;
        let amount = validate_quantity(amount, 1, MAX_SAFE_INTEGER)?;
        let (settings, _) = self.dnd_settings(channel)?;
        let plan = ConversionPlan::new(from, to, amount, settings.fee_rate)?;

        let from_key = Self::coin_key(channel, from);
        let available = self.store.get(&from_key)?.map_or(0, |e| e.amount);
        if available < plan.total_required {
            return Err(TallyError::InsufficientBalance {
                name: from.to_string(),
                available,
                requested: plan.total_required,
            });
        }
        let converted = plan.converted_amount()?;

        let to_key = Self::coin_key(channel, to);
        match self
            .store
            .transfer(&from_key, plan.total_required, &to_key, converted)?
        {
            Transfer::Applied { .. } => {}
            Transfer::Insufficient { available } => {
                return Err(TallyError::InsufficientBalance {
                    name: from.to_string(),
                    available,
                    requested: plan.total_required,
                })
            }
        }
        tracing::info!(channel, %from, %to, amount, converted, fee = plan.fee, "converted");

        let conversion = Conversion {
            from,
            to,
            amount,
            fee_rate: plan.fee_rate,
            fee: plan.fee,
            total_deducted: plan.total_required,
            converted,
        };
        self.audit.record(
            &from_key.scope(),
            AuditAction::Convert,
            actor,
            json!({
                "from": from,
                "to": to,
                "from_amount": amount,
                "fee_amount": plan.fee,
                "total_deducted": plan.total_required,
                "to_amount": converted,
                "fee_rate": plan.fee_rate,
            }),
        );
        Ok(conversion)
    }

    pub fn fees(&self, channel: &str) -> Result<FeeSchedule> {
        let (settings, stored) = self.dnd_settings(channel)?;
        let examples = FEE_EXAMPLES
            .into_iter()
            .map(|(from, to, amount)| {
                Ok(FeeExample {
                    from,
                    to,
                    amount,
                    fee: conversion_fee(amount, settings.fee_rate)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(FeeSchedule {
            fee_rate: settings.fee_rate,
            is_default: stored.is_default(),
            updated_at: (!stored.is_default()).then_some(stored.updated_at),
            examples,
        })
    }

    /// Caller must have checked the elevated permission.
    pub fn set_fee(&self, channel: &str, rate: Decimal, actor: &Actor) -> Result<Decimal> {
        let rate = validate_fee_rate(rate)?;
        let (old, _) = self.dnd_settings(channel)?;
        let new = DndSettings { fee_rate: rate };
        self.store.put_settings(
            channel,
            CurrencySystem::Dnd,
            &serde_json::to_value(&new)?,
            &actor.id,
        )?;
        tracing::info!(channel, old_rate = %old.fee_rate, new_rate = %rate, "fee rate changed");

        self.audit.record(
            &Self::scope(channel, CurrencySystem::Dnd),
            AuditAction::SetFee,
            actor,
            json!({ "old_rate": old.fee_rate, "new_rate": rate }),
        );
        Ok(rate)
    }

    // --- Decimal ---

    pub fn decimal_format(&self, channel: &str) -> Result<DecimalFormat> {
        let defaults = serde_json::to_value(DecimalFormat::default())?;
        let stored = self
            .store
            .settings(channel, CurrencySystem::Decimal, &defaults)?;
        Ok(serde_json::from_value(stored.settings)?)
    }

    pub fn decimal_deposit(
        &self,
        channel: &str,
        amount: Decimal,
        actor: &Actor,
    ) -> Result<DecimalChange> {
        let cents = validate_decimal_amount(amount)?;
        let format = self.decimal_format(channel)?;
        let change = self
            .mutator()
            .credit(&Self::decimal_key(channel), cents, actor)?;
        Ok(DecimalChange::new(cents, change, format))
    }

    pub fn decimal_withdraw(
        &self,
        channel: &str,
        amount: Decimal,
        actor: &Actor,
    ) -> Result<DecimalChange> {
        let cents = validate_decimal_amount(amount)?;
        let format = self.decimal_format(channel)?;
        let change = self
            .mutator()
            .debit(&Self::decimal_key(channel), cents, actor)?;
        Ok(DecimalChange::new(cents, change, format))
    }

    pub fn decimal_balance(&self, channel: &str) -> Result<DecimalBalance> {
        let cents = self
            .store
            .get(&Self::decimal_key(channel))?
            .map_or(0, |e| e.amount);
        Ok(DecimalBalance {
            amount: cents_to_decimal(cents),
            format: self.decimal_format(channel)?,
        })
    }

    /// Caller must have checked the elevated permission.
    pub fn set_format(
        &self,
        channel: &str,
        update: &FormatUpdate,
        actor: &Actor,
    ) -> Result<DecimalFormat> {
        if update.is_empty() {
            return Err(TallyError::InvalidArgument(
                "You must specify at least one formatting option".to_string(),
            ));
        }

        let old = self.decimal_format(channel)?;
        let new = update.apply(&old);
        self.store.put_settings(
            channel,
            CurrencySystem::Decimal,
            &serde_json::to_value(&new)?,
            &actor.id,
        )?;
        tracing::info!(channel, "decimal format changed");

        self.audit.record(
            &Self::scope(channel, CurrencySystem::Decimal),
            AuditAction::SetFormat,
            actor,
            json!({ "old_format": old, "new_format": new }),
        );
        Ok(new)
    }

    // --- Shared ---

    /// Caller must have checked the elevated permission.
    pub fn clear(
        &self,
        channel: &str,
        system: CurrencySystem,
        actor: &Actor,
    ) -> Result<Vec<LedgerEntry>> {
        self.mutator().clear(&Self::scope(channel, system), actor)
    }

    pub fn audit(
        &self,
        channel: &str,
        system: CurrencySystem,
        limit: usize,
    ) -> Result<Vec<AuditRecord>> {
        self.audit.query(&Self::scope(channel, system), limit)
    }
}
