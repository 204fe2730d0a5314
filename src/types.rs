//! Core types for catalog search results and their derived scores.

use serde::{Deserialize, Serialize};

/// Largest release year accepted from a provider.
const MAX_YEAR: i32 = 9999;

/// A single search result returned by one content source.
///
/// Records are owned by the caller and never mutated by the ranking core;
/// ranking and deduplication return a subset of the records they were given.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchResult {
    /// Display title of the item.
    pub title: String,
    /// Release year as text (`"2023"`). Blank when the source did not report one.
    pub year: String,
    /// Identifier of the provider that returned this result.
    pub source: String,
    /// Cross-provider catalog identifier. Empty means absent.
    pub external_id: String,
    /// Source-local identifier. Never used to match records across sources.
    pub id: String,
}

impl SearchResult {
    /// Convenience constructor for a result without an external identifier.
    pub fn new(
        title: impl Into<String>,
        year: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            year: year.into(),
            source: source.into(),
            ..Default::default()
        }
    }

    /// Builder-style setter for [`SearchResult::external_id`].
    pub fn with_external_id(mut self, external_id: impl Into<String>) -> Self {
        self.external_id = external_id.into();
        self
    }

    /// Builder-style setter for [`SearchResult::id`].
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// The release year, if the `year` field holds an integer in `0..=9999`.
    pub fn parsed_year(&self) -> Option<i32> {
        self.year
            .trim()
            .parse()
            .ok()
            .filter(|year| (0..=MAX_YEAR).contains(year))
    }
}

/// The five independent sub-scores computed for one (result, query) pair.
///
/// Every component lies in `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScoreBreakdown {
    pub title: f64,
    pub year: f64,
    pub source: f64,
    pub popularity: f64,
    pub recency: f64,
}

/// A result paired with its sub-scores and combined ranking score.
///
/// Lives only for the duration of one ranking call.
#[derive(Debug, Clone)]
pub struct ScoredResult {
    /// The caller's original record.
    pub result: SearchResult,
    /// Per-signal scores.
    pub breakdown: ScoreBreakdown,
    /// Weighted combination of `breakdown`. Within `[0, 100]` only when the
    /// configured weights sum to 1.0.
    pub final_score: f64,
}

impl ScoredResult {
    /// Wrap a result with a fixed score and an empty breakdown.
    ///
    /// Used where deduplication runs without ranking and every record must
    /// tie, so that first-seen order decides.
    pub fn unscored(result: SearchResult) -> Self {
        Self {
            result,
            breakdown: ScoreBreakdown::default(),
            final_score: 0.0,
        }
    }
}

/// One past query from the search-history collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// The query text as the user typed it.
    pub query: String,
    /// When the query was issued, in Unix epoch milliseconds.
    pub timestamp: i64,
}

/// Snapshot of the result cache's contents.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    /// Number of stored entries, including expired ones not yet swept.
    pub count: usize,
    /// Sum of the JSON-encoded size of every stored result list.
    pub total_size_bytes: usize,
    /// Normalised query keys, oldest first.
    pub keys: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_result_construction() {
        let result = SearchResult::new("Spirited Away", "2001", "douban")
            .with_external_id("tt0245429")
            .with_id("1291561");
        assert_eq!(result.title, "Spirited Away");
        assert_eq!(result.source, "douban");
        assert_eq!(result.external_id, "tt0245429");
        assert_eq!(result.id, "1291561");
    }

    #[test]
    fn search_result_serializes_camel_case() {
        let result = SearchResult::new("Test", "2020", "tmdb").with_external_id("42");
        let json = serde_json::to_string(&result).expect("serialize");
        assert!(json.contains("\"externalId\":\"42\""));
        let decoded: SearchResult = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(decoded, result);
    }

    #[test]
    fn search_result_missing_fields_default_to_empty() {
        let decoded: SearchResult =
            serde_json::from_str(r#"{"title":"Only a title"}"#).expect("deserialize");
        assert_eq!(decoded.title, "Only a title");
        assert!(decoded.year.is_empty());
        assert!(decoded.external_id.is_empty());
    }

    #[test]
    fn parsed_year_handles_blank_and_garbage() {
        assert_eq!(SearchResult::new("a", " 2019 ", "x").parsed_year(), Some(2019));
        assert_eq!(SearchResult::new("a", "", "x").parsed_year(), None);
        assert_eq!(SearchResult::new("a", "unknown", "x").parsed_year(), None);
    }

    #[test]
    fn parsed_year_rejects_out_of_range_values() {
        assert_eq!(SearchResult::new("a", "-2147483648", "x").parsed_year(), None);
        assert_eq!(SearchResult::new("a", "2147483647", "x").parsed_year(), None);
        assert_eq!(SearchResult::new("a", "-1", "x").parsed_year(), None);
        assert_eq!(SearchResult::new("a", "9999", "x").parsed_year(), Some(9999));
    }

    #[test]
    fn unscored_has_zero_score() {
        let scored = ScoredResult::unscored(SearchResult::new("a", "", "x"));
        assert_eq!(scored.final_score, 0.0);
        assert_eq!(scored.breakdown, ScoreBreakdown::default());
    }
}
