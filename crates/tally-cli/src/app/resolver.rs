//! Path resolution for config and database files.

use std::path::PathBuf;

use crate::cli::Cli;
use crate::config::{default_config_path, default_db_path, TallyConfig};

/// Resolve the config file path. `--config` and `TALLY_CONFIG` arrive
/// through the same clap argument.
pub fn resolve_config_path(cli: &Cli) -> anyhow::Result<PathBuf> {
    if let Some(value) = cli.config.as_deref() {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value));
        }
    }
    default_config_path()
}

/// Resolve the database path from CLI args, then config, then the XDG default.
pub fn resolve_db_path(cli: &Cli, config: &TallyConfig) -> anyhow::Result<PathBuf> {
    if let Some(path) = cli.db.as_deref() {
        if !path.trim().is_empty() {
            return Ok(PathBuf::from(path));
        }
    }
    if let Some(path) = config.storage.path.as_deref() {
        return Ok(PathBuf::from(path));
    }
    default_db_path()
}
