//! # catalog-rank
//!
//! Ranking, deduplication, and caching for catalog search results gathered
//! from many content sources.
//!
//! Each source may describe the same underlying title under a different
//! identifier, spelling, or level of metadata. This crate scores every
//! record against the user's query, merges records that describe the same
//! title, keeps any one source from crowding out the rest, and memoizes the
//! ranked list per query.
//!
//! ## Design
//!
//! - Five independent signals (title match, year, source quality,
//!   popularity, recency) combined by configurable weights
//! - Linear-time deduplication on external ID or normalised title + year
//! - Per-source diversity cap with a relaxed backfill pass
//! - Bounded TTL cache with oldest-first eviction and a background sweeper
//! - No I/O of its own: search history and cache persistence are injected
//!   collaborators, and their failures degrade to fallbacks
//!
//! ## Logging
//!
//! Queries appear only at trace level. Collaborator fallbacks are logged at
//! debug, storage degradation and corrupt snapshots at warn.

pub mod cache;
pub mod config;
pub mod error;
pub mod history;
pub mod ranking;
pub mod store;
pub mod types;

pub use cache::{CacheKey, ResultCache};
pub use config::{CacheConfig, RankingConfig, WeightOverrides, Weights};
pub use error::{RankError, Result};
pub use history::{MemoryHistory, SearchHistory};
pub use ranking::pipeline::Ranker;
pub use store::{KeyValueStore, MemoryStore};
pub use types::{CacheStats, HistoryEntry, ScoreBreakdown, ScoredResult, SearchResult};

/// Rank search results against a query.
///
/// Scores every result, removes duplicates (keeping the best-scored copy),
/// limits each source's share of the list, and returns the surviving
/// records sorted by descending score. `overrides` replaces individual
/// ranking weights; weights are not renormalised.
///
/// Never fails. Overrides that fail validation (negative or non-finite
/// weights) are logged and the default weights are used instead.
///
/// # Examples
///
/// ```
/// use catalog_rank::SearchResult;
///
/// let results = vec![
///     SearchResult::new("测试视频", "2023", "a"),
///     SearchResult::new("测试视频", "2023", "b"),
///     SearchResult::new("测试视频：终极版", "2023", "c"),
/// ];
/// let ranked = catalog_rank::rank(results, "测试视频", None);
/// assert_eq!(ranked.len(), 2);
/// ```
pub fn rank(
    results: Vec<SearchResult>,
    query: &str,
    overrides: Option<&WeightOverrides>,
) -> Vec<SearchResult> {
    let ranker = match overrides {
        Some(overrides) => Ranker::new(RankingConfig::with_overrides(overrides)).unwrap_or_else(|err| {
            tracing::warn!(error = %err, "ignoring invalid weight overrides");
            Ranker::default()
        }),
        None => Ranker::default(),
    };
    ranker.rank(results, query)
}

/// Remove duplicate titles while keeping the caller's order.
///
/// The first occurrence of each logical title is kept.
///
/// # Examples
///
/// ```
/// use catalog_rank::SearchResult;
///
/// let results = vec![
///     SearchResult::new("Dune", "2021", "tmdb"),
///     SearchResult::new("DUNE", "2021", "youku"),
/// ];
/// let deduped = catalog_rank::deduplicate_only(results);
/// assert_eq!(deduped.len(), 1);
/// assert_eq!(deduped[0].source, "tmdb");
/// ```
pub fn deduplicate_only(results: Vec<SearchResult>) -> Vec<SearchResult> {
    ranking::pipeline::deduplicate_only(results)
}

/// Remove duplicates and also merge visually similar titles: same word
/// acronym and same year. Coarser than [`deduplicate_only`] and prone to
/// false merges on short titles, so it is never part of [`rank`].
///
/// Titles written without spaces (Chinese, Japanese) form a single word, so
/// their acronym is just the first character. Any two such titles from the
/// same year that start with the same character are merged, e.g. `测试视频`
/// and `测验`.
pub fn merge_similar(results: Vec<SearchResult>) -> Vec<SearchResult> {
    ranking::pipeline::merge_similar_only(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_with_valid_overrides() {
        let overrides = WeightOverrides {
            source: Some(0.0),
            ..Default::default()
        };
        let results = vec![
            SearchResult::new("Dune", "2021", "douban"),
            SearchResult::new("Arrival", "2016", "xigua"),
        ];
        let ranked = rank(results, "dune", Some(&overrides));
        assert_eq!(ranked[0].title, "Dune");
    }

    #[test]
    fn rank_with_invalid_overrides_falls_back() {
        let overrides = WeightOverrides {
            title: Some(f64::NAN),
            ..Default::default()
        };
        let results = vec![SearchResult::new("Dune", "2021", "douban")];
        assert_eq!(rank(results, "dune", Some(&overrides)).len(), 1);
    }

    #[test]
    fn rank_empty_input() {
        assert!(rank(vec![], "dune", None).is_empty());
    }

    #[test]
    fn merge_similar_is_coarser_than_deduplicate_only() {
        let results = vec![
            SearchResult::new("Star Wars", "1977", "a"),
            SearchResult::new("Secret Window", "1977", "b"),
        ];
        assert_eq!(deduplicate_only(results.clone()).len(), 2);
        assert_eq!(merge_similar(results).len(), 1);
    }

    #[test]
    fn merge_similar_collapses_unspaced_titles_sharing_first_char() {
        let results = vec![
            SearchResult::new("测试视频", "2023", "a"),
            SearchResult::new("测验", "2023", "b"),
            SearchResult::new("测验", "2022", "c"),
        ];
        assert_eq!(deduplicate_only(results.clone()).len(), 3);
        let merged = merge_similar(results);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].title, "测试视频");
    }
}
