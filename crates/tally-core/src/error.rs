//! Error types for Tally core operations.
//!
//! Validation and business-rule failures carry enough detail for the command
//! layer to produce a specific message. Only `StorageUnavailable` is meant to
//! surface as a generic "try again" reply.

use thiserror::Error;

/// Result type alias for Tally operations.
pub type Result<T> = std::result::Result<T, TallyError>;

/// Malformed caller input. Raised before any mutation is attempted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Input cannot be empty")]
    EmptyInput,

    #[error("Input must be {max} characters or less")]
    TooLong { max: usize },

    #[error("Value must be a whole number")]
    NotInteger,

    #[error("Value must be between {min} and {max}")]
    OutOfRange { min: String, max: String },

    #[error("Unknown currency \"{0}\". Valid currencies are: platinum (pp), gold (gp), electrum (ep), silver (sp), copper (cp)")]
    UnknownCurrency(String),
}

impl ValidationError {
    pub(crate) fn out_of_range(min: impl ToString, max: impl ToString) -> Self {
        ValidationError::OutOfRange {
            min: min.to_string(),
            max: max.to_string(),
        }
    }
}

/// Core error type for Tally operations.
#[derive(Debug, Error)]
pub enum TallyError {
    /// Caller input was malformed
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Referenced ledger entry does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Balance too small for a withdrawal or conversion
    #[error("Insufficient balance for {name}: available {available}, requested {requested}")]
    InsufficientBalance {
        name: String,
        available: i64,
        requested: i64,
    },

    /// Rename to the same name
    #[error("The old name and new name cannot be the same")]
    SameName,

    /// Semantically meaningless request
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// D&D conversion would leave a fractional coin
    #[error("Converting {amount} {from} to {to} would not produce whole coins")]
    NonIntegralConversion {
        from: String,
        to: String,
        amount: i64,
        suggestions: Vec<ConversionSuggestion>,
    },

    /// Persistence failed to connect or respond
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),
}

/// A nearby source amount that would convert to whole coins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversionSuggestion {
    pub source_amount: i64,
    pub converted_amount: i64,
}

impl TallyError {
    /// Whether the message is specific and safe to show to the end user.
    pub fn is_user_facing(&self) -> bool {
        !matches!(self, TallyError::StorageUnavailable(_))
    }
}

impl From<rusqlite::Error> for TallyError {
    fn from(err: rusqlite::Error) -> Self {
        TallyError::StorageUnavailable(err.to_string())
    }
}

impl From<serde_json::Error> for TallyError {
    fn from(err: serde_json::Error) -> Self {
        TallyError::StorageUnavailable(format!("Invalid stored JSON: {}", err))
    }
}

impl From<std::io::Error> for TallyError {
    fn from(err: std::io::Error) -> Self {
        TallyError::StorageUnavailable(err.to_string())
    }
}
