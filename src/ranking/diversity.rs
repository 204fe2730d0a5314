//! Per-source diversity balancing.
//!
//! Stops a single dominant provider from crowding every other source out of
//! the ranked list. Works on a list already sorted by score, descending.

use std::collections::HashMap;

use crate::types::ScoredResult;

/// Minimum number of results any one source may contribute.
const MIN_SOURCE_CAP: usize = 3;

/// Share of the list a single source may take in the primary pass.
const SOURCE_SHARE: f64 = 0.3;

/// Per-source cap for a list of `len` results: `max(3, floor(0.3 * len))`.
pub fn source_cap(len: usize) -> usize {
    let share = (len as f64 * SOURCE_SHARE).floor() as usize;
    share.max(MIN_SOURCE_CAP)
}

/// Limit how many results each source contributes.
///
/// 1. Primary pass: walk `sorted` in order, keeping a result while its
///    source has fewer than `cap` kept results.
/// 2. Relaxed pass, only if the primary pass dropped anything: walk the
///    dropped results in order, re-admitting each while its source has fewer
///    than `2 * cap` kept results.
///
/// The output holds the primary picks followed by the backfilled ones; the
/// caller re-sorts by score afterwards.
pub fn diversify(sorted: Vec<ScoredResult>, cap: usize) -> Vec<ScoredResult> {
    let relaxed_cap = cap.saturating_mul(2);
    let mut per_source: HashMap<String, usize> = HashMap::new();
    let mut kept: Vec<ScoredResult> = Vec::with_capacity(sorted.len());
    let mut skipped: Vec<ScoredResult> = Vec::new();

    for candidate in sorted {
        let count = per_source.entry(candidate.result.source.clone()).or_insert(0);
        if *count < cap {
            *count += 1;
            kept.push(candidate);
        } else {
            skipped.push(candidate);
        }
    }

    if skipped.is_empty() {
        return kept;
    }

    let primary = kept.len();
    for candidate in skipped {
        let count = per_source.entry(candidate.result.source.clone()).or_insert(0);
        if *count < relaxed_cap {
            *count += 1;
            kept.push(candidate);
        }
    }

    tracing::debug!(
        cap,
        primary,
        backfilled = kept.len() - primary,
        "diversity pass applied"
    );
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SearchResult;

    fn from(source: &str, score: f64) -> ScoredResult {
        ScoredResult {
            final_score: score,
            ..ScoredResult::unscored(SearchResult::new(format!("{source}-{score}"), "", source))
        }
    }

    fn count(results: &[ScoredResult], source: &str) -> usize {
        results.iter().filter(|r| r.result.source == source).count()
    }

    #[test]
    fn cap_has_floor_of_three() {
        assert_eq!(source_cap(0), 3);
        assert_eq!(source_cap(5), 3);
        assert_eq!(source_cap(12), 3);
        assert_eq!(source_cap(13), 3);
        assert_eq!(source_cap(14), 4);
        assert_eq!(source_cap(100), 30);
    }

    #[test]
    fn balanced_input_untouched() {
        let input = vec![from("a", 9.0), from("b", 8.0), from("c", 7.0)];
        let output = diversify(input, 3);
        assert_eq!(output.len(), 3);
        assert_eq!(output[0].result.source, "a");
    }

    #[test]
    fn dominant_source_capped_at_double_in_backfill() {
        let mut input: Vec<ScoredResult> = (0..10).map(|i| from("x", 100.0 - i as f64)).collect();
        input.push(from("y", 5.0));
        input.push(from("y", 4.0));

        let output = diversify(input, 3);
        assert_eq!(count(&output, "x"), 6);
        assert_eq!(count(&output, "y"), 2);
        assert_eq!(output.len(), 8);
    }

    #[test]
    fn backfill_keeps_highest_scored_overflow() {
        let input: Vec<ScoredResult> = (0..8).map(|i| from("x", 100.0 - i as f64)).collect();
        let output = diversify(input, 3);
        assert_eq!(output.len(), 6);
        let lowest_kept = output
            .iter()
            .map(|r| r.final_score)
            .fold(f64::INFINITY, f64::min);
        assert!((lowest_kept - 95.0).abs() < f64::EPSILON);
    }

    #[test]
    fn primary_picks_precede_backfill() {
        let input = vec![
            from("x", 10.0),
            from("x", 9.0),
            from("x", 8.0),
            from("x", 7.0),
            from("y", 1.0),
        ];
        let output = diversify(input, 3);
        assert_eq!(output.len(), 5);
        assert_eq!(output[3].result.source, "y");
        assert!((output[4].final_score - 7.0).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_input() {
        assert!(diversify(vec![], 3).is_empty());
    }
}
