//! Per-channel inventory tracker.

use serde::Serialize;

use crate::audit::AuditRecorder;
use crate::error::Result;
use crate::fuzzy::{self, MatchOptions, Named};
use crate::mutator::BalanceMutator;
use crate::storage::{
    Actor, AuditLog, AuditRecord, BalanceChange, Book, BookScope, LedgerEntry, LedgerStore, Rename,
};
use crate::validation::{
    validate_name, validate_quantity, validate_search_term, MAX_NAME_LENGTH, MAX_SAFE_INTEGER,
};

impl Named for LedgerEntry {
    fn name(&self) -> &str {
        &self.name
    }
}

/// Limits applied to tracker input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackerOptions {
    pub max_name_length: usize,
    pub min_search_length: usize,
    /// Threshold and cap for fuzzy search fallback.
    pub matching: MatchOptions,
}

impl Default for TrackerOptions {
    fn default() -> Self {
        Self {
            max_name_length: MAX_NAME_LENGTH,
            min_search_length: 2,
            matching: MatchOptions::default().with_limit(5),
        }
    }
}

/// Every item in a channel's tracker.
#[derive(Debug, Clone, Serialize)]
pub struct TrackerListing {
    pub items: Vec<LedgerEntry>,
    pub total_quantity: i64,
}

/// An item found by fuzzy search.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredEntry {
    pub entry: LedgerEntry,
    pub score: f64,
}

/// Result of [`Tracker::search`].
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", content = "items", rename_all = "snake_case")]
pub enum SearchOutcome {
    /// Items whose name contains the term, sorted by name.
    Substring(Vec<LedgerEntry>),
    /// Closest names when no item contains the term; may be empty.
    Similar(Vec<ScoredEntry>),
}

impl SearchOutcome {
    pub fn is_empty(&self) -> bool {
        match self {
            SearchOutcome::Substring(items) => items.is_empty(),
            SearchOutcome::Similar(items) => items.is_empty(),
        }
    }
}

pub struct Tracker<'a> {
    store: &'a dyn LedgerStore,
    audit: AuditRecorder<'a>,
    options: TrackerOptions,
}

impl<'a> Tracker<'a> {
    pub fn new(store: &'a dyn LedgerStore, audit: &'a dyn AuditLog, options: TrackerOptions) -> Self {
        Self {
            store,
            audit: AuditRecorder::new(audit),
            options,
        }
    }

    fn scope(channel: &str) -> BookScope {
        BookScope::new(channel, Book::Tracker)
    }

    fn mutator(&self) -> BalanceMutator<'a> {
        BalanceMutator::new(self.store, self.audit)
    }

    pub fn add(
        &self,
        channel: &str,
        name: &str,
        quantity: i64,
        actor: &Actor,
    ) -> Result<BalanceChange> {
        let name = validate_name(name, self.options.max_name_length)?;
        let quantity = validate_quantity(quantity, 1, MAX_SAFE_INTEGER)?;
        self.mutator()
            .credit(&Self::scope(channel).key(name), quantity, actor)
    }

    pub fn remove(
        &self,
        channel: &str,
        name: &str,
        quantity: i64,
        actor: &Actor,
    ) -> Result<BalanceChange> {
        let name = validate_name(name, self.options.max_name_length)?;
        let quantity = validate_quantity(quantity, 1, MAX_SAFE_INTEGER)?;
        self.mutator()
            .debit(&Self::scope(channel).key(name), quantity, actor)
    }

    /// `None` when the item is not tracked (quantity zero).
    pub fn get(&self, channel: &str, name: &str) -> Result<Option<LedgerEntry>> {
        let name = validate_name(name, self.options.max_name_length)?;
        self.store.get(&Self::scope(channel).key(name))
    }

    pub fn list(&self, channel: &str) -> Result<TrackerListing> {
        let items = self.store.list(&Self::scope(channel))?;
        let total_quantity = items
            .iter()
            .fold(0i64, |total, item| total.saturating_add(item.amount));
        Ok(TrackerListing {
            items,
            total_quantity,
        })
    }

    /// Substring match first, falling back to ranked fuzzy matches.
    pub fn search(&self, channel: &str, term: &str) -> Result<SearchOutcome> {
        let term = validate_search_term(
            term,
            self.options.min_search_length,
            self.options.max_name_length,
        )?;
        let items = self.store.list(&Self::scope(channel))?;

        let contains: Vec<LedgerEntry> = items
            .iter()
            .filter(|item| item.name.contains(&term))
            .cloned()
            .collect();
        if !contains.is_empty() {
            return Ok(SearchOutcome::Substring(contains));
        }

        let similar = fuzzy::suggest(&term, &items, self.options.matching)
            .into_iter()
            .map(|s| ScoredEntry {
                entry: s.item.clone(),
                score: s.score,
            })
            .collect();
        Ok(SearchOutcome::Similar(similar))
    }

    pub fn rename(
        &self,
        channel: &str,
        old_name: &str,
        new_name: &str,
        actor: &Actor,
    ) -> Result<Rename> {
        let old_name = validate_name(old_name, self.options.max_name_length)?;
        let new_name = validate_name(new_name, self.options.max_name_length)?;
        self.mutator()
            .rename(&Self::scope(channel).key(old_name), &new_name, actor)
    }

    /// Caller must have checked the elevated permission.
    pub fn clear(&self, channel: &str, actor: &Actor) -> Result<Vec<LedgerEntry>> {
        self.mutator().clear(&Self::scope(channel), actor)
    }

    pub fn audit(&self, channel: &str, limit: usize) -> Result<Vec<AuditRecord>> {
        self.audit.query(&Self::scope(channel), limit)
    }
}
