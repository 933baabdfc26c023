use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Contents of `config.toml`. Every section is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TallyConfig {
    pub storage: StorageSection,
    pub matching: MatchingSection,
    pub limits: LimitsSection,
    pub reference: ReferenceSection,
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    pub path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingSection {
    /// Suggestions must score strictly above this.
    pub threshold: f64,
    pub tracker_suggestions: usize,
    pub lookup_suggestions: usize,
}

impl Default for MatchingSection {
    fn default() -> Self {
        Self {
            threshold: 0.5,
            tracker_suggestions: 5,
            lookup_suggestions: 9,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsSection {
    pub max_name_length: usize,
    pub min_search_length: usize,
    /// Replies longer than this many characters become JSON artifacts.
    pub message_limit: usize,
    pub audit_limit: usize,
}

impl Default for LimitsSection {
    fn default() -> Self {
        Self {
            max_name_length: 100,
            min_search_length: 2,
            message_limit: 1900,
            audit_limit: 20,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceSection {
    pub items: Option<String>,
    pub bestiary: Option<String>,
    pub ingredients: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// `tracing` filter directive used when `RUST_LOG` is unset.
    pub filter: Option<String>,
}

impl TallyConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        let threshold = self.matching.threshold;
        if !(0.0..=1.0).contains(&threshold) {
            anyhow::bail!("matching.threshold must be between 0 and 1 (got {})", threshold);
        }
        if self.limits.max_name_length == 0 {
            anyhow::bail!("limits.max_name_length must be at least 1");
        }
        if self.limits.message_limit == 0 {
            anyhow::bail!("limits.message_limit must be at least 1");
        }
        Ok(())
    }
}

pub fn default_config_path() -> anyhow::Result<PathBuf> {
    Ok(xdg_config_dir()?.join("config.toml"))
}

pub fn default_db_path() -> anyhow::Result<PathBuf> {
    Ok(xdg_data_dir()?.join("tally.db"))
}

/// Read a config file; a missing file yields the defaults.
pub fn read_config(path: &Path) -> anyhow::Result<TallyConfig> {
    if !path.exists() {
        return Ok(TallyConfig::default());
    }
    let contents = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read config {}: {}", path.display(), e))?;
    let config: TallyConfig = toml::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("Failed to parse config {}: {}", path.display(), e))?;
    config.validate()?;
    Ok(config)
}

pub fn xdg_config_dir() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("XDG_CONFIG_HOME") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value).join("tally"));
        }
    }
    Ok(home_dir()?.join(".config").join("tally"))
}

pub fn xdg_data_dir() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("XDG_DATA_HOME") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value).join("tally"));
        }
    }
    Ok(home_dir()?.join(".local").join("share").join("tally"))
}

fn home_dir() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME")
        .map_err(|_| anyhow::anyhow!("HOME is not set; cannot resolve default paths"))?;
    Ok(PathBuf::from(home))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: TallyConfig = toml::from_str(
            "[matching]\nthreshold = 0.6\n\n[limits]\naudit_limit = 50\n",
        )
        .unwrap();
        assert_eq!(config.matching.threshold, 0.6);
        assert_eq!(config.matching.lookup_suggestions, 9);
        assert_eq!(config.limits.audit_limit, 50);
        assert_eq!(config.limits.message_limit, 1900);
        assert!(config.storage.path.is_none());
    }

    #[test]
    fn test_invalid_threshold_rejected() {
        let mut config = TallyConfig::default();
        config.matching.threshold = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = read_config(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, TallyConfig::default());
    }
}
