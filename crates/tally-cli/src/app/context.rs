//! Application context for the Tally CLI.
//!
//! Bundles CLI arguments with the lazily-loaded config, database and
//! reference catalogs so handlers take a single parameter.

use std::path::{Path, PathBuf};

use once_cell::unsync::OnceCell;

use tally_core::fuzzy::MatchOptions;
use tally_core::reference::{ReferenceCatalog, ReferenceKind};
use tally_core::storage::Actor;
use tally_core::tracker::TrackerOptions;
use tally_core::SqliteStore;

use crate::cli::Cli;
use crate::config::{read_config, TallyConfig};
use crate::errors::CliError;

use super::resolver::{resolve_config_path, resolve_db_path};

pub struct AppContext<'a> {
    cli: &'a Cli,
    config: OnceCell<TallyConfig>,
    store: OnceCell<SqliteStore>,
    items: OnceCell<ReferenceCatalog>,
    bestiary: OnceCell<ReferenceCatalog>,
    ingredients: OnceCell<ReferenceCatalog>,
}

impl<'a> AppContext<'a> {
    pub fn new(cli: &'a Cli) -> Self {
        Self {
            cli,
            config: OnceCell::new(),
            store: OnceCell::new(),
            items: OnceCell::new(),
            bestiary: OnceCell::new(),
            ingredients: OnceCell::new(),
        }
    }

    pub fn quiet(&self) -> bool {
        self.cli.quiet
    }

    pub fn json(&self) -> bool {
        self.cli.json
    }

    pub fn channel(&self) -> &str {
        &self.cli.channel
    }

    pub fn actor(&self) -> Actor {
        Actor::new(self.cli.user_id.as_str(), self.cli.user.as_str())
    }

    /// Fail unless the caller holds the manage-channels permission.
    pub fn require_manage(&self, action: &str) -> Result<(), CliError> {
        if self.cli.manage_channels {
            Ok(())
        } else {
            tracing::debug!(user = %self.cli.user_id, action, "permission denied");
            Err(CliError::permission_denied(action))
        }
    }

    /// Get the configuration, loading it lazily if needed.
    pub fn config(&self) -> anyhow::Result<&TallyConfig> {
        self.config.get_or_try_init(|| {
            let path = resolve_config_path(self.cli)?;
            read_config(&path)
        })
    }

    /// Open the database on first use.
    pub fn store(&self) -> anyhow::Result<&SqliteStore> {
        self.store.get_or_try_init(|| {
            let path = resolve_db_path(self.cli, self.config()?)?;
            tracing::debug!(path = %path.display(), "opening database");
            SqliteStore::open(&path).map_err(|e| anyhow::Error::new(CliError::from(e)))
        })
    }

    /// Load a reference catalog once; the returned catalog is never mutated.
    pub fn catalog(&self, kind: ReferenceKind) -> anyhow::Result<&ReferenceCatalog> {
        let (cell, configured) = match kind {
            ReferenceKind::Item => (&self.items, &self.config()?.reference.items),
            ReferenceKind::Monster => (&self.bestiary, &self.config()?.reference.bestiary),
            ReferenceKind::Ingredient => {
                (&self.ingredients, &self.config()?.reference.ingredients)
            }
        };
        cell.get_or_try_init(|| {
            let Some(path) = configured.as_deref() else {
                return Err(CliError::invalid_input(format!(
                    "No {} data configured. Set [reference] {} in the config file.",
                    kind,
                    config_key(kind)
                ))
                .into());
            };
            load_catalog(Path::new(path))
        })
    }

    pub fn tracker_options(&self) -> anyhow::Result<TrackerOptions> {
        let config = self.config()?;
        Ok(TrackerOptions {
            max_name_length: config.limits.max_name_length,
            min_search_length: config.limits.min_search_length,
            matching: MatchOptions::default()
                .with_threshold(config.matching.threshold)
                .with_limit(config.matching.tracker_suggestions),
        })
    }

    /// Ingredient lookups suggest as few names as the tracker does.
    pub fn lookup_options(&self, kind: ReferenceKind) -> anyhow::Result<MatchOptions> {
        let config = self.config()?;
        let limit = match kind {
            ReferenceKind::Item | ReferenceKind::Monster => config.matching.lookup_suggestions,
            ReferenceKind::Ingredient => config.matching.tracker_suggestions,
        };
        Ok(MatchOptions::default()
            .with_threshold(config.matching.threshold)
            .with_limit(limit))
    }

    pub fn message_limit(&self) -> anyhow::Result<usize> {
        Ok(self.config()?.limits.message_limit)
    }

    /// Audit page size: the explicit `--limit`, else the configured default.
    pub fn audit_limit(&self, requested: Option<usize>) -> anyhow::Result<usize> {
        let limit = match requested {
            Some(limit) => limit,
            None => self.config()?.limits.audit_limit,
        };
        if limit == 0 || limit > crate::constants::MAX_AUDIT_LIMIT {
            return Err(CliError::invalid_input(format!(
                "--limit must be between 1 and {}",
                crate::constants::MAX_AUDIT_LIMIT
            ))
            .into());
        }
        Ok(limit)
    }

    /// Directory oversized replies are written to.
    pub fn artifact_dir(&self) -> PathBuf {
        self.cli
            .artifact_dir
            .as_deref()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

fn config_key(kind: ReferenceKind) -> &'static str {
    match kind {
        ReferenceKind::Item => "items",
        ReferenceKind::Monster => "bestiary",
        ReferenceKind::Ingredient => "ingredients",
    }
}

fn load_catalog(path: &Path) -> anyhow::Result<ReferenceCatalog> {
    ReferenceCatalog::load(path).map_err(|e| {
        tracing::error!(path = %path.display(), error = %e, "failed to load reference data");
        anyhow::anyhow!("Failed to load reference data from {}: {}", path.display(), e)
    })
}
