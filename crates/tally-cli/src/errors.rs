//! CLI error types for structured error handling.
//!
//! Core errors are translated here into the reply the user sees and the exit
//! code the process returns. Storage failures are logged in full and shown
//! only as a generic message.

use std::fmt;

use tally_core::TallyError;

use crate::constants::exit_codes;

const STORAGE_MESSAGE: &str = "An error occurred while accessing the database. Please try again.";

/// CLI-specific errors with associated exit codes.
#[derive(Debug)]
pub enum CliError {
    /// Tracker item or reference record not found
    NotFound {
        message: String,
        hint: Option<String>,
    },

    /// Invalid user input or an unsatisfiable request
    InvalidInput(String),

    /// Caller lacks the manage-channels permission
    PermissionDenied(String),

    /// Storage failed; details are logged, not shown
    Storage,
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::NotFound { message, hint } => match hint {
                Some(h) => write!(f, "{}\n{}", message, h),
                None => write!(f, "{}", message),
            },
            CliError::InvalidInput(message) => write!(f, "{}", message),
            CliError::PermissionDenied(message) => write!(f, "{}", message),
            CliError::Storage => write!(f, "{}", STORAGE_MESSAGE),
        }
    }
}

impl std::error::Error for CliError {}

impl CliError {
    pub fn not_found(message: impl Into<String>) -> Self {
        CliError::NotFound {
            message: message.into(),
            hint: None,
        }
    }

    pub fn not_found_with_hint(message: impl Into<String>, hint: impl Into<String>) -> Self {
        CliError::NotFound {
            message: message.into(),
            hint: Some(hint.into()),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        CliError::InvalidInput(message.into())
    }

    pub fn permission_denied(action: &str) -> Self {
        CliError::PermissionDenied(format!(
            "You must have the `MANAGE_CHANNELS` permission to {}.",
            action
        ))
    }

    /// Get the exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::NotFound { .. } => exit_codes::NOT_FOUND,
            CliError::InvalidInput(_) => exit_codes::INVALID_INPUT,
            CliError::PermissionDenied(_) => exit_codes::PERMISSION_DENIED,
            CliError::Storage => exit_codes::STORAGE,
        }
    }

    /// Print error message to stderr and exit with appropriate code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);
        std::process::exit(self.exit_code())
    }
}

impl From<TallyError> for CliError {
    fn from(err: TallyError) -> Self {
        match err {
            TallyError::StorageUnavailable(detail) => {
                tracing::error!(error = %detail, "storage unavailable");
                CliError::Storage
            }
            TallyError::NotFound(name) => CliError::not_found_with_hint(
                format!("Item \"{}\" not found in the tracker", name),
                "Hint: Run `tally tracker search <name>` to find similar items.",
            ),
            TallyError::NonIntegralConversion {
                from,
                to,
                amount,
                suggestions,
            } => {
                let mut message = format!(
                    "Cannot convert {} {} to {}: conversion must result in whole coins.",
                    amount, from, to
                );
                if !suggestions.is_empty() {
                    message.push_str("\n\nTry these amounts instead:");
                    for s in suggestions {
                        message.push_str(&format!(
                            "\n  {} {} -> {} {}",
                            s.source_amount, from, s.converted_amount, to
                        ));
                    }
                }
                CliError::InvalidInput(message)
            }
            other => CliError::InvalidInput(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::error::ConversionSuggestion;
    use tally_core::ValidationError;

    #[test]
    fn test_storage_errors_are_generic() {
        let err = CliError::from(TallyError::StorageUnavailable("disk I/O error".to_string()));
        assert_eq!(err.exit_code(), exit_codes::STORAGE);
        assert!(!err.to_string().contains("disk"));
    }

    #[test]
    fn test_validation_maps_to_invalid_input() {
        let err = CliError::from(TallyError::from(ValidationError::EmptyInput));
        assert_eq!(err.exit_code(), exit_codes::INVALID_INPUT);
        assert_eq!(err.to_string(), "Input cannot be empty");
    }

    #[test]
    fn test_conversion_suggestions_are_listed() {
        let err = CliError::from(TallyError::NonIntegralConversion {
            from: "silver".to_string(),
            to: "gold".to_string(),
            amount: 25,
            suggestions: vec![ConversionSuggestion {
                source_amount: 20,
                converted_amount: 2,
            }],
        });
        assert!(err.to_string().contains("20 silver -> 2 gold"));
    }
}
