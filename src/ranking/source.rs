//! Source quality tiers.
//!
//! Every provider is mapped to a fixed quality score in `[0, 100]`. Curated
//! catalogs with editorial metadata rank highest, general streaming
//! platforms sit in the middle, and anything unrecognised gets a neutral
//! default.

use std::collections::HashMap;

/// Score for a source that is neither built in nor overridden.
pub const UNKNOWN_SOURCE_SCORE: f64 = 50.0;

/// Built-in tiers, highest first. Identifiers are lowercase.
const BUILTIN_TIERS: &[(&str, f64)] = &[
    // Curated catalogs.
    ("douban", 95.0),
    ("imdb", 95.0),
    ("tmdb", 95.0),
    // Streaming platforms.
    ("bilibili", 85.0),
    ("netflix", 85.0),
    ("iqiyi", 80.0),
    ("tencent", 80.0),
    ("youku", 75.0),
    ("mgtv", 70.0),
    ("youtube", 65.0),
    ("xigua", 60.0),
];

/// Lookup table from source identifier to quality score.
#[derive(Debug, Clone, Default)]
pub struct SourceTable {
    overrides: HashMap<String, f64>,
}

impl SourceTable {
    /// Build a table from the built-in tiers plus caller overrides.
    ///
    /// Override keys are matched case-insensitively, like the built-ins.
    pub fn new(overrides: &HashMap<String, f64>) -> Self {
        let overrides = overrides
            .iter()
            .map(|(source, score)| (source.trim().to_lowercase(), *score))
            .collect();
        Self { overrides }
    }

    /// Quality score of `source` in `[0, 100]`.
    pub fn score(&self, source: &str) -> f64 {
        let key = source.trim().to_lowercase();
        if let Some(score) = self.overrides.get(&key) {
            return *score;
        }
        builtin_score(&key).unwrap_or(UNKNOWN_SOURCE_SCORE)
    }
}

/// All built-in `(source, score)` tiers, highest score first.
pub fn builtin_tiers() -> &'static [(&'static str, f64)] {
    BUILTIN_TIERS
}

fn builtin_score(key: &str) -> Option<f64> {
    BUILTIN_TIERS
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, score)| *score)
}
