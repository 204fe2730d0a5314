//! Ranking and cache configuration with sensible defaults.
//!
//! [`RankingConfig`] controls how the five ranking signals are weighted and
//! how sources are tiered. [`CacheConfig`] controls result-cache lifetime and
//! capacity. Both deserialize with every field optional so an embedding
//! application can keep them in its own config file.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::RankError;

/// Tolerance used when checking whether weights sum to 1.0.
const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Relative weight of each ranking signal in the combined score.
///
/// The combined score is `sum(weight * sub_score)`. Weights are **never**
/// renormalised: the combined score stays within `[0, 100]` only if the
/// weights sum to 1.0, and keeping them that way is the caller's job.
/// Callers that only compare scores against each other may use any
/// non-negative weights.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Weights {
    pub title: f64,
    pub year: f64,
    pub source: f64,
    pub popularity: f64,
    pub recency: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            title: 0.35,
            year: 0.15,
            source: 0.20,
            popularity: 0.15,
            recency: 0.10,
        }
    }
}

impl Weights {
    /// Sum of all five weights.
    pub fn sum(&self) -> f64 {
        self.title + self.year + self.source + self.popularity + self.recency
    }

    /// Return a copy with every `Some` field of `overrides` applied.
    pub fn merged(mut self, overrides: &WeightOverrides) -> Self {
        if let Some(title) = overrides.title {
            self.title = title;
        }
        if let Some(year) = overrides.year {
            self.year = year;
        }
        if let Some(source) = overrides.source {
            self.source = source;
        }
        if let Some(popularity) = overrides.popularity {
            self.popularity = popularity;
        }
        if let Some(recency) = overrides.recency {
            self.recency = recency;
        }
        self
    }

    fn iter(&self) -> impl Iterator<Item = (&'static str, f64)> {
        [
            ("title", self.title),
            ("year", self.year),
            ("source", self.source),
            ("popularity", self.popularity),
            ("recency", self.recency),
        ]
        .into_iter()
    }
}

/// Partial weight override. `None` fields keep the default weight.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WeightOverrides {
    pub title: Option<f64>,
    pub year: Option<f64>,
    pub source: Option<f64>,
    pub popularity: Option<f64>,
    pub recency: Option<f64>,
}

/// Configuration for the ranking pipeline.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    /// Signal weights for the combined score.
    pub weights: Weights,
    /// Extra or replacement entries for the built-in source quality table,
    /// keyed by lowercase source identifier. Values must lie in `[0, 100]`.
    pub source_overrides: HashMap<String, f64>,
    /// Truncate the ranked list to this many results. `None` keeps all.
    pub max_results: Option<usize>,
}

impl RankingConfig {
    /// Default configuration with `overrides` merged over the default weights.
    pub fn with_overrides(overrides: &WeightOverrides) -> Self {
        Self {
            weights: Weights::default().merged(overrides),
            ..Default::default()
        }
    }

    /// Validates this configuration, returning an error if any field is invalid.
    ///
    /// Checks:
    /// - every weight is finite and non-negative
    /// - every source override is finite and within `[0, 100]`
    /// - `max_results`, when set, is greater than 0
    ///
    /// Weights that do not sum to 1.0 are accepted and only logged.
    pub fn validate(&self) -> Result<(), RankError> {
        for (name, weight) in self.weights.iter() {
            if !weight.is_finite() || weight < 0.0 {
                return Err(RankError::Config(format!(
                    "{name} weight must be a non-negative number"
                )));
            }
        }
        for (source, score) in &self.source_overrides {
            if !score.is_finite() || !(0.0..=100.0).contains(score) {
                return Err(RankError::Config(format!(
                    "source override for {source} must be within 0..=100"
                )));
            }
        }
        if self.max_results == Some(0) {
            return Err(RankError::Config(
                "max_results must be greater than 0".into(),
            ));
        }

        let sum = self.weights.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            tracing::warn!(sum, "ranking weights do not sum to 1.0; scores may leave 0..=100");
        }
        Ok(())
    }
}

/// Configuration for [`crate::cache::ResultCache`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// How long an entry stays valid after it is stored, in seconds.
    pub ttl_seconds: u64,
    /// Maximum number of cached queries. Oldest entries are evicted first.
    pub max_entries: usize,
    /// How often the background sweeper runs, in seconds.
    pub sweep_interval_seconds: u64,
    /// Key under which the cache snapshot is kept in the backing store.
    pub storage_key: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: 300,
            max_entries: 50,
            sweep_interval_seconds: 60,
            storage_key: "search_cache".into(),
        }
    }
}

impl CacheConfig {
    /// Validates this configuration, returning an error if any field is invalid.
    pub fn validate(&self) -> Result<(), RankError> {
        if self.ttl_seconds == 0 {
            return Err(RankError::Config(
                "ttl_seconds must be greater than 0".into(),
            ));
        }
        if self.max_entries == 0 {
            return Err(RankError::Config(
                "max_entries must be greater than 0".into(),
            ));
        }
        if self.sweep_interval_seconds == 0 {
            return Err(RankError::Config(
                "sweep_interval_seconds must be greater than 0".into(),
            ));
        }
        if self.storage_key.trim().is_empty() {
            return Err(RankError::Config("storage_key must not be empty".into()));
        }
        Ok(())
    }
}
