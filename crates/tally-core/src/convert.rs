//! D&D currency conversion.
//!
//! A conversion of `amount` coins charges `ceil(amount * fee_rate)` extra
//! coins of the source denomination and credits
//! `amount * rate[from] / rate[to]` coins of the target denomination. Only
//! whole-coin results are allowed.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::currency::Currency;
use crate::error::{ConversionSuggestion, Result, TallyError, ValidationError};
use crate::validation::MAX_SAFE_INTEGER;

/// Fee charged when a channel has never configured one.
pub fn default_fee_rate() -> Decimal {
    Decimal::new(1, 1)
}

/// Fee in source coins for converting `amount` coins.
pub fn conversion_fee(amount: i64, fee_rate: Decimal) -> Result<i64> {
    (Decimal::from(amount) * fee_rate)
        .ceil()
        .to_i64()
        .ok_or_else(|| ValidationError::out_of_range(1, MAX_SAFE_INTEGER).into())
}

/// A validated conversion request with its fee worked out.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionPlan {
    pub from: Currency,
    pub to: Currency,
    pub amount: i64,
    pub fee_rate: Decimal,
    pub fee: i64,
    pub total_required: i64,
    converted: Decimal,
}

impl ConversionPlan {
    /// Work out the fee and exact target value. Rejects same-currency requests.
    pub fn new(from: Currency, to: Currency, amount: i64, fee_rate: Decimal) -> Result<Self> {
        if from == to {
            return Err(TallyError::InvalidArgument(format!(
                "Cannot convert {} to itself",
                from
            )));
        }

        let fee = conversion_fee(amount, fee_rate)?;
        let total_required = amount
            .checked_add(fee)
            .ok_or(ValidationError::out_of_range(1, MAX_SAFE_INTEGER))?;
        let converted = from.gold_value(amount) / to.gold_rate();

        Ok(Self {
            from,
            to,
            amount,
            fee_rate,
            fee,
            total_required,
            converted,
        })
    }

    /// Target coins credited, or `NonIntegralConversion` with nearby amounts
    /// that would convert cleanly.
    pub fn converted_amount(&self) -> Result<i64> {
        if self.converted.fract().is_zero() {
            if let Some(whole) = self.converted.to_i64() {
                return Ok(whole);
            }
        }
        Err(TallyError::NonIntegralConversion {
            from: self.from.to_string(),
            to: self.to.to_string(),
            amount: self.amount,
            suggestions: self.suggestions(),
        })
    }

    /// Source amounts just below and above the request that yield whole coins.
    pub fn suggestions(&self) -> Vec<ConversionSuggestion> {
        let lower = self.converted.floor();
        let higher = self.converted.ceil();

        let mut out = Vec::with_capacity(2);
        if let Some(suggestion) = self.suggest_for(lower) {
            if suggestion.converted_amount > 0 && suggestion.source_amount != self.amount {
                out.push(suggestion);
            }
        }
        if let Some(suggestion) = self.suggest_for(higher) {
            if suggestion.source_amount != self.amount {
                out.push(suggestion);
            }
        }
        out
    }

    fn suggest_for(&self, target: Decimal) -> Option<ConversionSuggestion> {
        let source = (target * self.to.gold_rate() / self.from.gold_rate())
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        Some(ConversionSuggestion {
            source_amount: source.to_i64()?,
            converted_amount: target.to_i64()?,
        })
    }
}
