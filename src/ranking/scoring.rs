//! Multi-signal scoring for catalog search results.
//!
//! Each (result, query) pair gets five independent sub-scores in `[0, 100]`:
//!
//! | Signal     | Derived from                                         |
//! |------------|------------------------------------------------------|
//! | title      | exact / substring / edit-distance match to the query |
//! | year       | year mentioned in the query, else plausibility       |
//! | source     | provider quality tier                                |
//! | popularity | search history, else title markers + source tier     |
//! | recency    | age of the release                                   |
//!
//! The combined score is the weighted sum of the five, using
//! [`Weights`] exactly as configured (no renormalisation).

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Datelike, Utc};

use crate::config::{RankingConfig, Weights};
use crate::history::{load_snapshot, HistorySnapshot, SearchHistory};
use crate::types::{ScoreBreakdown, ScoredResult, SearchResult};

use super::normalize::fold;
use super::similarity::similarity;
use super::source::SourceTable;

/// How many history entries are requested per ranking call.
pub const HISTORY_LIMIT: usize = 100;

/// Neutral score for signals that cannot be computed (missing year, etc.).
const NEUTRAL_SCORE: f64 = 50.0;

/// Earliest year accepted as a year mentioned in a query.
const MIN_QUERY_YEAR: i32 = 1900;

/// Earliest release year considered plausible when the query has no year.
const MIN_PLAUSIBLE_YEAR: i32 = 1990;

/// Years beyond the current one that still count as valid (announced titles).
const FUTURE_YEAR_SLACK: i32 = 2;

/// Title markers for trending or recommended items, matched after [`fold`].
const POPULAR_MARKERS: &[&str] = &["popular", "latest", "recommended", "热门", "最新", "推荐"];

/// Title markers for acclaimed items, matched after [`fold`].
const ACCLAIM_MARKERS: &[&str] = &["classic", "award", "经典", "获奖"];

const POPULAR_MARKER_BONUS: f64 = 10.0;
const ACCLAIM_MARKER_BONUS: f64 = 15.0;

/// Share of the source score folded into heuristic popularity.
const SOURCE_POPULARITY_SHARE: f64 = 0.3;

/// Computes sub-scores and combined scores for search results.
///
/// Construct one per ranking call or share one across calls; scoring never
/// mutates the scorer. Unless pinned with [`Scorer::with_now`], the clock is
/// read once at the start of every scoring call.
#[derive(Clone)]
pub struct Scorer {
    weights: Weights,
    sources: SourceTable,
    history: Option<Arc<dyn SearchHistory>>,
    pinned_now: Option<DateTime<Utc>>,
}

impl Scorer {
    /// Create a scorer from `config` without a history lookup.
    pub fn new(config: &RankingConfig) -> Self {
        Self {
            weights: config.weights,
            sources: SourceTable::new(&config.source_overrides),
            history: None,
            pinned_now: None,
        }
    }

    /// Attach a search-history lookup for the popularity signal.
    pub fn with_history(mut self, history: Arc<dyn SearchHistory>) -> Self {
        self.history = Some(history);
        self
    }

    /// Pin the reference time used for the current year and history recency.
    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.pinned_now = Some(now);
        self
    }

    /// The reference time for the next scoring call: the pinned time if any,
    /// else the wall clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.pinned_now.unwrap_or_else(Utc::now)
    }

    /// The calendar year scoring treats as "now".
    pub fn current_year(&self) -> i32 {
        self.now().year()
    }

    /// The weights used by [`Scorer::combine`].
    pub fn weights(&self) -> &Weights {
        &self.weights
    }

    /// Score every result against `query`.
    ///
    /// History is fetched once for the whole batch; a missing or failing
    /// lookup switches every result to the heuristic popularity formula.
    pub fn score_all(&self, results: Vec<SearchResult>, query: &str) -> Vec<ScoredResult> {
        let now = self.now();
        let snapshot = load_snapshot(
            self.history.as_deref(),
            HISTORY_LIMIT,
            now.timestamp_millis(),
        );
        let current_year = now.year();
        results
            .into_iter()
            .map(|result| self.score_in_year(result, query, snapshot.as_ref(), current_year))
            .collect()
    }

    /// Score a single result.
    pub fn score(
        &self,
        result: SearchResult,
        query: &str,
        history: Option<&HistorySnapshot>,
    ) -> ScoredResult {
        self.score_in_year(result, query, history, self.current_year())
    }

    fn score_in_year(
        &self,
        result: SearchResult,
        query: &str,
        history: Option<&HistorySnapshot>,
        current_year: i32,
    ) -> ScoredResult {
        let breakdown = self.breakdown_in_year(&result, query, history, current_year);
        let final_score = self.combine(&breakdown);
        ScoredResult {
            result,
            breakdown,
            final_score,
        }
    }

    /// Compute the five sub-scores for one result.
    pub fn breakdown(
        &self,
        result: &SearchResult,
        query: &str,
        history: Option<&HistorySnapshot>,
    ) -> ScoreBreakdown {
        self.breakdown_in_year(result, query, history, self.current_year())
    }

    fn breakdown_in_year(
        &self,
        result: &SearchResult,
        query: &str,
        history: Option<&HistorySnapshot>,
        current_year: i32,
    ) -> ScoreBreakdown {
        let result_year = result.parsed_year();
        let source = self.sources.score(&result.source);
        let popularity = match history {
            Some(snapshot) => history_popularity(&result.title, snapshot),
            None => heuristic_popularity(&result.title, source),
        };

        ScoreBreakdown {
            title: title_score(&result.title, query),
            year: year_score(result_year, query, current_year),
            source,
            popularity,
            recency: recency_score(result_year, current_year),
        }
    }

    /// Weighted sum of a breakdown. Not clamped.
    pub fn combine(&self, breakdown: &ScoreBreakdown) -> f64 {
        let w = &self.weights;
        breakdown.title * w.title
            + breakdown.year * w.year
            + breakdown.source * w.source
            + breakdown.popularity * w.popularity
            + breakdown.recency * w.recency
    }
}

impl Default for Scorer {
    fn default() -> Self {
        Self::new(&RankingConfig::default())
    }
}

impl fmt::Debug for Scorer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scorer")
            .field("weights", &self.weights)
            .field("sources", &self.sources)
            .field("has_history", &self.history.is_some())
            .field("pinned_now", &self.pinned_now)
            .finish()
    }
}

/// How well `title` matches `query`, in `[0, 100]`.
///
/// - Exact match ignoring case and whitespace: 100.
/// - Query is a substring of the title: 80, plus up to 15 for how much of
///   the title the query covers, plus up to 5 for how early it starts.
/// - Otherwise: `floor(60 * similarity)`.
///
/// An empty title or query scores 0.
pub fn title_score(title: &str, query: &str) -> f64 {
    let title = fold(title);
    let query = fold(query);
    if title.is_empty() || query.is_empty() {
        return 0.0;
    }
    if title == query {
        return 100.0;
    }

    if let Some(byte_pos) = title.find(&query) {
        let title_len = title.chars().count() as f64;
        let query_len = query.chars().count() as f64;
        let position = title[..byte_pos].chars().count() as f64;
        let coverage_bonus = 15.0 * (query_len / title_len);
        let position_bonus = 5.0 * (1.0 - position / title_len);
        return 80.0 + coverage_bonus + position_bonus;
    }

    (60.0 * similarity(&title, &query)).floor()
}

/// First four-digit number in `query` that is a plausible year.
pub fn query_year(query: &str, current_year: i32) -> Option<i32> {
    query
        .split(|c: char| !c.is_ascii_digit())
        .filter(|run| run.len() == 4)
        .filter_map(|run| run.parse::<i32>().ok())
        .find(|year| (MIN_QUERY_YEAR..=current_year + FUTURE_YEAR_SLACK).contains(year))
}

/// Year agreement between the result and the query, in `[0, 100]`.
///
/// With a year in the query, closeness to it is scored. Without one, any
/// year from 1990 up to two years ahead scores 70 and anything else 30.
/// A result without a year scores a neutral 50 either way.
pub fn year_score(result_year: Option<i32>, query: &str, current_year: i32) -> f64 {
    let Some(result_year) = result_year else {
        return NEUTRAL_SCORE;
    };

    match query_year(query, current_year) {
        Some(wanted) => match result_year.abs_diff(wanted) {
            0 => 100.0,
            1 => 90.0,
            2 => 80.0,
            3..=5 => 60.0,
            _ => 30.0,
        },
        None => {
            if (MIN_PLAUSIBLE_YEAR..=current_year + FUTURE_YEAR_SLACK).contains(&result_year) {
                70.0
            } else {
                30.0
            }
        }
    }
}

/// Freshness of the release, in `[0, 100]`. Unknown years score 50.
pub fn recency_score(result_year: Option<i32>, current_year: i32) -> f64 {
    let Some(result_year) = result_year else {
        return NEUTRAL_SCORE;
    };

    match current_year.saturating_sub(result_year) {
        age if age <= 1 => 100.0,
        age if age <= 3 => 85.0,
        age if age <= 5 => 70.0,
        age if age <= 10 => 50.0,
        age if age <= 20 => 30.0,
        _ => 10.0,
    }
}

/// Popularity from title markers and source quality, in `[0, 100]`.
///
/// Used when no search history is available.
pub fn heuristic_popularity(title: &str, source_score: f64) -> f64 {
    let title = fold(title);
    let mut score = NEUTRAL_SCORE;
    if POPULAR_MARKERS.iter().any(|marker| title.contains(marker)) {
        score += POPULAR_MARKER_BONUS;
    }
    if ACCLAIM_MARKERS.iter().any(|marker| title.contains(marker)) {
        score += ACCLAIM_MARKER_BONUS;
    }
    score += source_score * SOURCE_POPULARITY_SHARE;
    score.clamp(0.0, 100.0)
}

/// Popularity from recency-weighted search history, in `[0, 100]`.
pub fn history_popularity(title: &str, snapshot: &HistorySnapshot) -> f64 {
    (NEUTRAL_SCORE + snapshot.bonus(&fold(title))).clamp(0.0, 100.0)
}
