//! Fuzzy name resolution.
//!
//! Resolves a user-typed name against a set of named records: an exact
//! case-insensitive hit wins outright, otherwise every candidate is scored
//! with [`similarity`] and those strictly above the threshold are returned
//! best-first, deduplicated by name and optionally capped.

use std::collections::HashSet;

use crate::similarity::similarity;

/// Default minimum score a suggestion must exceed.
pub const DEFAULT_THRESHOLD: f64 = 0.5;

/// Anything that can be looked up by name.
pub trait Named {
    fn name(&self) -> &str;
}

impl Named for String {
    fn name(&self) -> &str {
        self
    }
}

impl Named for &str {
    fn name(&self) -> &str {
        self
    }
}

/// Tuning for a resolution call site.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchOptions {
    /// Suggestions must score strictly greater than this.
    pub threshold: f64,
    /// Maximum number of suggestions returned, if any.
    pub limit: Option<usize>,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            limit: None,
        }
    }
}

impl MatchOptions {
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }
}

/// A scored near-match.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Suggestion<'a, T> {
    pub item: &'a T,
    pub score: f64,
}

/// Outcome of [`resolve`].
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution<'a, T> {
    /// The query named a candidate exactly (ignoring case).
    Exact(&'a T),
    /// Ranked near-matches; empty when nothing cleared the threshold.
    Suggestions(Vec<Suggestion<'a, T>>),
}

impl<'a, T> Resolution<'a, T> {
    pub fn exact(&self) -> Option<&'a T> {
        match self {
            Resolution::Exact(item) => Some(item),
            Resolution::Suggestions(_) => None,
        }
    }
}

/// Resolve `query` against `candidates`.
pub fn resolve<'a, T: Named>(
    query: &str,
    candidates: &'a [T],
    options: MatchOptions,
) -> Resolution<'a, T> {
    match exact_matches(query, candidates).into_iter().next() {
        Some(item) => Resolution::Exact(item),
        None => Resolution::Suggestions(suggest(query, candidates, options)),
    }
}

/// All candidates whose name equals `query` ignoring case, in input order.
pub fn exact_matches<'a, T: Named>(query: &str, candidates: &'a [T]) -> Vec<&'a T> {
    let query = query.to_lowercase();
    candidates
        .iter()
        .filter(|candidate| candidate.name().to_lowercase() == query)
        .collect()
}

/// Score every candidate and return the ranked, deduplicated survivors.
///
/// Ties keep input order. Deduplication compares the stored name exactly and
/// keeps the highest-ranked occurrence.
pub fn suggest<'a, T: Named>(
    query: &str,
    candidates: &'a [T],
    options: MatchOptions,
) -> Vec<Suggestion<'a, T>> {
    let mut scored: Vec<Suggestion<'a, T>> = candidates
        .iter()
        .map(|item| Suggestion {
            item,
            score: similarity(query, item.name()),
        })
        .filter(|suggestion| suggestion.score > options.threshold)
        .collect();

    // stable: equal scores keep their input order
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));

    let mut seen = HashSet::with_capacity(scored.len());
    scored.retain(|suggestion| seen.insert(suggestion.item.name()));

    if let Some(limit) = options.limit {
        scored.truncate(limit);
    }
    scored
}
