//! Currency systems and denominations.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// The two independent bank modes of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurrencySystem {
    /// Five fixed D&D denominations with conversion fees
    Dnd,
    /// A single free-form balance with configurable display
    Decimal,
}

impl CurrencySystem {
    pub fn as_str(&self) -> &'static str {
        match self {
            CurrencySystem::Dnd => "dnd",
            CurrencySystem::Decimal => "decimal",
        }
    }
}

impl fmt::Display for CurrencySystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A D&D coin denomination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Currency {
    Platinum,
    Gold,
    Electrum,
    Silver,
    Copper,
}

impl Currency {
    /// Highest value first.
    pub const ALL: [Currency; 5] = [
        Currency::Platinum,
        Currency::Gold,
        Currency::Electrum,
        Currency::Silver,
        Currency::Copper,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::Platinum => "platinum",
            Currency::Gold => "gold",
            Currency::Electrum => "electrum",
            Currency::Silver => "silver",
            Currency::Copper => "copper",
        }
    }

    pub fn abbreviation(&self) -> &'static str {
        match self {
            Currency::Platinum => "pp",
            Currency::Gold => "gp",
            Currency::Electrum => "ep",
            Currency::Silver => "sp",
            Currency::Copper => "cp",
        }
    }

    /// Value of one coin in gold pieces.
    pub fn gold_rate(&self) -> Decimal {
        match self {
            Currency::Platinum => Decimal::from(10),
            Currency::Gold => Decimal::ONE,
            Currency::Electrum => Decimal::new(5, 1),
            Currency::Silver => Decimal::new(1, 1),
            Currency::Copper => Decimal::new(1, 2),
        }
    }

    /// Gold value of `amount` coins of this denomination.
    pub fn gold_value(&self, amount: i64) -> Decimal {
        Decimal::from(amount) * self.gold_rate()
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Currency {
    type Err = ValidationError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_lowercase();
        Currency::ALL
            .into_iter()
            .find(|c| c.as_str() == normalized || c.abbreviation() == normalized)
            .ok_or(ValidationError::UnknownCurrency(normalized))
    }
}

/// How decimal balances are displayed in a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecimalFormat {
    pub prefix: String,
    pub suffix: String,
    pub prefix_space_after: bool,
    pub suffix_space_before: bool,
}

impl Default for DecimalFormat {
    fn default() -> Self {
        Self {
            prefix: "$".to_string(),
            suffix: String::new(),
            prefix_space_after: false,
            suffix_space_before: true,
        }
    }
}

impl DecimalFormat {
    /// Render an amount with two decimal places.
    pub fn format(&self, amount: Decimal) -> String {
        let mut out = String::new();
        if !self.prefix.is_empty() {
            out.push_str(&self.prefix);
            if self.prefix_space_after {
                out.push(' ');
            }
        }
        out.push_str(&format!("{:.2}", amount));
        if !self.suffix.is_empty() {
            if self.suffix_space_before {
                out.push(' ');
            }
            out.push_str(&self.suffix);
        }
        out
    }

    /// Render an amount stored in hundredths.
    pub fn format_cents(&self, cents: i64) -> String {
        self.format(cents_to_decimal(cents))
    }
}

/// Decimal balances are stored as whole hundredths.
pub fn cents_to_decimal(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}
