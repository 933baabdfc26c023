//! Constants used throughout the CLI.

/// Exit codes for the CLI.
///
/// - 0: Success
/// - 1: General error (used by anyhow for unhandled errors)
/// - 2: Misuse of shell command (reserved by shells and clap)
/// - 3+: Application-specific errors
pub mod exit_codes {
    /// Tracker item or reference record not found.
    pub const NOT_FOUND: i32 = 3;

    /// Invalid user input, or a request the ledger cannot satisfy.
    pub const INVALID_INPUT: i32 = 4;

    /// The caller lacks the manage-channels permission.
    pub const PERMISSION_DENIED: i32 = 5;

    /// Storage could not be opened or did not respond.
    pub const STORAGE: i32 = 6;
}

/// Upper bound for `--limit` on audit commands.
pub const MAX_AUDIT_LIMIT: usize = 100;
