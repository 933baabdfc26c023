//! Read-only reference data (D&D items, monsters and alchemy ingredients).
//!
//! A catalog is loaded once and never mutated afterwards, so it can be shared
//! freely between callers.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TallyError};
use crate::fuzzy::{self, MatchOptions, Named, Suggestion};

/// One searchable record. Unknown fields in the source JSON are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawRecord")]
pub struct ReferenceRecord {
    pub name: String,
    pub description: Option<String>,
    pub source: Option<String>,
}

/// Record as stored on disk. Item and bestiary dumps keep their text in an
/// `entries` array of paragraphs instead of `description`.
#[derive(Deserialize)]
struct RawRecord {
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    entries: Vec<serde_json::Value>,
    #[serde(default)]
    source: Option<String>,
}

impl From<RawRecord> for ReferenceRecord {
    fn from(raw: RawRecord) -> Self {
        let description = raw.description.or_else(|| {
            // Nested entry objects (tables, lists) have no plain-text form.
            let paragraphs: Vec<&str> = raw.entries.iter().filter_map(|e| e.as_str()).collect();
            (!paragraphs.is_empty()).then(|| paragraphs.join("\n\n"))
        });
        Self {
            name: raw.name,
            description,
            source: raw.source,
        }
    }
}

/// A catalog file is either a bare array of records or an object whose
/// values are arrays of records, e.g. `{"ingredients": [...]}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogFile {
    Records(Vec<ReferenceRecord>),
    Grouped(BTreeMap<String, Vec<ReferenceRecord>>),
}

impl Named for ReferenceRecord {
    fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    Item,
    Monster,
    Ingredient,
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferenceKind::Item => f.write_str("item"),
            ReferenceKind::Monster => f.write_str("monster"),
            ReferenceKind::Ingredient => f.write_str("ingredient"),
        }
    }
}

/// Result of [`ReferenceCatalog::lookup`].
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<'a> {
    /// Every record whose name matches ignoring case (reprints share names).
    Exact(Vec<&'a ReferenceRecord>),
    /// Ranked near-matches; empty when nothing is close.
    Suggestions(Vec<Suggestion<'a, ReferenceRecord>>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceCatalog {
    records: Vec<ReferenceRecord>,
}

impl ReferenceCatalog {
    pub fn new(records: Vec<ReferenceRecord>) -> Self {
        Self { records }
    }

    /// Parse `{name, description?, entries?, source?}` records, either as a
    /// bare array or grouped under top-level keys.
    pub fn from_json(json: &str) -> Result<Self> {
        let file: CatalogFile = serde_json::from_str(json).map_err(|e| {
            TallyError::InvalidArgument(format!("Invalid reference data: {}", e))
        })?;
        let records = match file {
            CatalogFile::Records(records) => records,
            CatalogFile::Grouped(groups) => groups.into_values().flatten().collect(),
        };
        Ok(Self::new(records))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let catalog = Self::from_json(&json)?;
        tracing::debug!(path = %path.display(), records = catalog.len(), "reference catalog loaded");
        Ok(catalog)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[ReferenceRecord] {
        &self.records
    }

    pub fn lookup(&self, query: &str, options: MatchOptions) -> Lookup<'_> {
        let query = query.trim();
        let exact = fuzzy::exact_matches(query, &self.records);
        if !exact.is_empty() {
            return Lookup::Exact(exact);
        }
        Lookup::Suggestions(fuzzy::suggest(query, &self.records, options))
    }
}
