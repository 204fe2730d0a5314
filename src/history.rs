//! Search-history collaborator used by the popularity signal.
//!
//! The ranking core never owns search history. An embedding application
//! implements [`SearchHistory`] over whatever log it keeps and hands it to
//! [`crate::ranking::scoring::Scorer::with_history`]. When no history is
//! supplied, or the lookup fails, popularity falls back to a title heuristic.

use std::sync::Mutex;

use crate::error::{RankError, Result};
use crate::ranking::normalize::fold;
use crate::types::HistoryEntry;

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Points added per fully weighted history match.
const POINTS_PER_MATCH: f64 = 10.0;

/// A source of recent user queries.
///
/// Implementations should answer from memory: the scorer consults the
/// lookup synchronously once per ranking call.
pub trait SearchHistory: Send + Sync {
    /// Return up to `limit` recent queries, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`RankError::CollaboratorUnavailable`] when the log cannot be
    /// read. The scorer absorbs the error and uses its fallback heuristic.
    fn recent_queries(&self, limit: usize) -> Result<Vec<HistoryEntry>>;
}

/// Simple in-process history log.
#[derive(Debug, Default)]
pub struct MemoryHistory {
    entries: Mutex<Vec<HistoryEntry>>,
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a query issued at `timestamp` (Unix epoch milliseconds).
    pub fn record(&self, query: impl Into<String>, timestamp: i64) {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(HistoryEntry {
                query: query.into(),
                timestamp,
            });
    }

    /// Number of recorded queries.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SearchHistory for MemoryHistory {
    fn recent_queries(&self, limit: usize) -> Result<Vec<HistoryEntry>> {
        let guard = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let mut recent: Vec<HistoryEntry> = guard.clone();
        recent.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        recent.truncate(limit);
        Ok(recent)
    }
}

/// History entries prepared for repeated popularity lookups during one
/// ranking call.
#[derive(Debug, Clone)]
pub struct HistorySnapshot {
    /// `(folded query, recency weight)` pairs; blank queries are dropped.
    weighted: Vec<(String, f64)>,
}

impl HistorySnapshot {
    /// Fold and weight `entries` relative to `now_ms`.
    ///
    /// Returns `None` when no usable entries remain, so that callers take
    /// the heuristic path instead of scoring every title a flat 50.
    pub fn new(entries: &[HistoryEntry], now_ms: i64) -> Option<Self> {
        let weighted: Vec<(String, f64)> = entries
            .iter()
            .filter_map(|entry| {
                let folded = fold(&entry.query);
                (!folded.is_empty()).then(|| (folded, recency_weight(now_ms - entry.timestamp)))
            })
            .collect();
        (!weighted.is_empty()).then_some(Self { weighted })
    }

    /// Popularity bonus for a title that has already been passed through
    /// [`fold`].
    ///
    /// Each history query that contains the title, or is contained by it,
    /// contributes [`POINTS_PER_MATCH`] scaled by its recency weight.
    pub fn bonus(&self, folded_title: &str) -> f64 {
        if folded_title.is_empty() {
            return 0.0;
        }
        self.weighted
            .iter()
            .filter(|(query, _)| query.contains(folded_title) || folded_title.contains(query.as_str()))
            .map(|(_, weight)| weight * POINTS_PER_MATCH)
            .sum()
    }
}

/// Weight of a history entry by age: recent searches count more.
///
/// Entries timestamped in the future are treated as brand new.
fn recency_weight(age_ms: i64) -> f64 {
    match age_ms.max(0) {
        age if age <= MILLIS_PER_DAY => 1.0,
        age if age <= 7 * MILLIS_PER_DAY => 0.5,
        age if age <= 30 * MILLIS_PER_DAY => 0.25,
        _ => 0.1,
    }
}

/// Fetch a snapshot from an optional lookup, absorbing every failure.
pub(crate) fn load_snapshot(
    history: Option<&dyn SearchHistory>,
    limit: usize,
    now_ms: i64,
) -> Option<HistorySnapshot> {
    let history = history?;
    match history.recent_queries(limit) {
        Ok(entries) => {
            let snapshot = HistorySnapshot::new(&entries, now_ms);
            if snapshot.is_none() {
                tracing::debug!("search history empty; using popularity heuristic");
            }
            snapshot
        }
        Err(err) => {
            tracing::debug!(error = %err, "search history unavailable; using popularity heuristic");
            None
        }
    }
}

/// A history lookup that always fails. Handy for exercising fallbacks.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableHistory;

impl SearchHistory for UnavailableHistory {
    fn recent_queries(&self, _limit: usize) -> Result<Vec<HistoryEntry>> {
        Err(RankError::CollaboratorUnavailable(
            "search history not configured".into(),
        ))
    }
}
