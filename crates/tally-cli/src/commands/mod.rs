//! Command handlers, one module per command group.

pub mod bank;
pub mod dice;
pub mod lookup;
pub mod tracker;

use tally_core::validation::{parse_quantity, MAX_SAFE_INTEGER};
use tally_core::TallyError;

use crate::errors::CliError;

/// Parse a user-typed positive whole quantity.
pub(crate) fn quantity(raw: &str) -> Result<i64, CliError> {
    parse_quantity(raw, 1, MAX_SAFE_INTEGER).map_err(|e| CliError::from(TallyError::from(e)))
}

/// Normalized display form of a user-typed name.
pub(crate) fn display_name(raw: &str) -> String {
    raw.trim().to_lowercase()
}
