//! Dice rolling in `NdS` notation.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::Serialize;

use crate::error::{TallyError, ValidationError};

pub const MAX_DICE_QUANTITY: u32 = 100;
pub const MAX_DICE_SIDES: u32 = 100;

/// A validated number of dice and sides per die.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DiceSpec {
    pub quantity: u32,
    pub sides: u32,
}

impl DiceSpec {
    pub fn new(quantity: u32, sides: u32) -> Result<Self, ValidationError> {
        if !(1..=MAX_DICE_QUANTITY).contains(&quantity) {
            return Err(ValidationError::out_of_range(1, MAX_DICE_QUANTITY));
        }
        if !(1..=MAX_DICE_SIDES).contains(&sides) {
            return Err(ValidationError::out_of_range(1, MAX_DICE_SIDES));
        }
        Ok(Self { quantity, sides })
    }
}

impl fmt::Display for DiceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d{}", self.quantity, self.sides)
    }
}

impl FromStr for DiceSpec {
    type Err = TallyError;

    /// Accepts `NdS` or `dS` (one die), case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        let (quantity, sides) = normalized.split_once('d').ok_or_else(|| {
            TallyError::InvalidArgument(format!("Invalid dice notation: {}", s.trim()))
        })?;

        let quantity = if quantity.is_empty() {
            1
        } else {
            parse_count(quantity)?
        };
        let sides = parse_count(sides)?;
        Ok(DiceSpec::new(quantity, sides)?)
    }
}

fn parse_count(raw: &str) -> Result<u32, ValidationError> {
    if raw.is_empty() {
        return Err(ValidationError::EmptyInput);
    }
    raw.parse().map_err(|_| ValidationError::NotInteger)
}

/// Individual results in roll order and their sum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RollResult {
    pub spec: DiceSpec,
    pub results: Vec<u32>,
    pub total: u64,
}

pub fn roll<R: Rng + ?Sized>(spec: DiceSpec, rng: &mut R) -> RollResult {
    let results: Vec<u32> = (0..spec.quantity)
        .map(|_| rng.gen_range(1..=spec.sides))
        .collect();
    let total = results.iter().map(|&r| u64::from(r)).sum();
    RollResult {
        spec,
        results,
        total,
    }
}
