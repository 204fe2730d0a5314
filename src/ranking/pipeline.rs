//! Ranking pipeline: score, deduplicate, balance sources, sort.
//!
//! Takes the raw results gathered from every source for one query and
//! returns the caller's own records in ranked order. Scores are computed
//! internally and discarded.

use std::cmp::Ordering;
use std::sync::Arc;

use crate::config::RankingConfig;
use crate::error::Result;
use crate::history::SearchHistory;
use crate::types::{ScoredResult, SearchResult};

use super::dedup::{deduplicate, merge_similar};
use super::diversity::{diversify, source_cap};
use super::scoring::Scorer;

/// Ranks search results for a query.
///
/// # Pipeline
///
/// 1. Score every result against the query
/// 2. Deduplicate by primary identity key, keeping the best-scored member
/// 3. Sort by score (descending, stable) and cap each source's share
/// 4. Sort again by score so backfilled results land in place
/// 5. Truncate to `max_results` if configured
#[derive(Debug, Clone, Default)]
pub struct Ranker {
    scorer: Scorer,
    max_results: Option<usize>,
}

impl Ranker {
    /// Create a ranker after validating `config`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::RankError::Config`] if a weight is negative or not a
    /// number, a source override is out of range, or `max_results` is zero.
    pub fn new(config: RankingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            scorer: Scorer::new(&config),
            max_results: config.max_results,
        })
    }

    /// Attach a search-history lookup for the popularity signal.
    pub fn with_history(mut self, history: Arc<dyn SearchHistory>) -> Self {
        self.scorer = self.scorer.with_history(history);
        self
    }

    /// Replace the scorer, e.g. one with a pinned clock.
    pub fn with_scorer(mut self, scorer: Scorer) -> Self {
        self.scorer = scorer;
        self
    }

    /// The scorer used by this ranker.
    pub fn scorer(&self) -> &Scorer {
        &self.scorer
    }

    /// Rank `results` against `query`.
    ///
    /// Returns a subset of `results`, each logical title at most once,
    /// ordered by descending score with ties in input order. Never fails:
    /// sparse records get default scores and malformed ones are kept as
    /// unique entries.
    pub fn rank(&self, results: Vec<SearchResult>, query: &str) -> Vec<SearchResult> {
        self.rank_scored(results, query)
            .into_iter()
            .map(|scored| scored.result)
            .collect()
    }

    /// Like [`Ranker::rank`] but keeps the scores, for diagnostics.
    pub fn rank_scored(&self, results: Vec<SearchResult>, query: &str) -> Vec<ScoredResult> {
        if results.is_empty() {
            return Vec::new();
        }
        let input = results.len();
        tracing::trace!(query, input, "ranking results");

        let scored = self.scorer.score_all(results, query);

        let mut deduped = deduplicate(scored);
        let unique = deduped.len();
        sort_by_score(&mut deduped);

        let mut ranked = diversify(deduped, source_cap(unique));
        sort_by_score(&mut ranked);

        if let Some(max) = self.max_results {
            ranked.truncate(max);
        }

        tracing::debug!(input, unique, output = ranked.len(), "ranking complete");
        ranked
    }
}

/// Remove duplicates without scoring or reordering.
///
/// Every record gets the same synthetic score, so the first occurrence of
/// each logical title is the one kept. Input order is preserved.
pub fn deduplicate_only(results: Vec<SearchResult>) -> Vec<SearchResult> {
    let unscored: Vec<ScoredResult> = results.into_iter().map(ScoredResult::unscored).collect();
    deduplicate(unscored)
        .into_iter()
        .map(|scored| scored.result)
        .collect()
}

/// Merge visually similar titles (matching acronyms and years) as well as
/// exact duplicates. First occurrence wins; input order is preserved.
pub fn merge_similar_only(results: Vec<SearchResult>) -> Vec<SearchResult> {
    let unscored: Vec<ScoredResult> = results.into_iter().map(ScoredResult::unscored).collect();
    merge_similar(unscored)
        .into_iter()
        .map(|scored| scored.result)
        .collect()
}

/// Stable sort by `final_score`, highest first. NaN compares equal.
fn sort_by_score(results: &mut [ScoredResult]) {
    results.sort_by(|a, b| {
        b.final_score
            .partial_cmp(&a.final_score)
            .unwrap_or(Ordering::Equal)
    });
}
