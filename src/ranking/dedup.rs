//! Result deduplication by identity key.
//!
//! Results from different sources that describe the same title are merged:
//! the entry with the highest `final_score` is kept, the rest are dropped.
//!
//! Two strategies are provided:
//!
//! - [`deduplicate`]: the default, keyed on [`primary_key`]. One linear pass
//!   over a single hash map.
//! - [`merge_similar`]: opt-in and coarser. Also merges titles whose word
//!   acronyms and years agree. Never used by the ranking pipeline.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::types::{ScoredResult, SearchResult};

use super::normalize::{acronym, normalize_title};

/// Identity key used by the default deduplication pass.
///
/// - `ext:<external_id>` when the result carries a cross-provider ID.
/// - `title:<normalised title>|<year>` otherwise (year may be empty).
/// - `raw:<source>:<id>#<position>` when both of the above are empty. The
///   position makes the key unique, so malformed records are never merged.
///
/// ```
/// use catalog_rank::ranking::dedup::primary_key;
/// use catalog_rank::SearchResult;
///
/// let a = SearchResult::new("Alien: Romulus", "2024", "douban");
/// let b = SearchResult::new("alien romulus", "2024", "youku");
/// assert_eq!(primary_key(&a, 0), primary_key(&b, 1));
/// assert_eq!(primary_key(&a, 0), "title:alien romulus|2024");
/// ```
pub fn primary_key(result: &SearchResult, position: usize) -> String {
    let external_id = result.external_id.trim();
    if !external_id.is_empty() {
        return format!("ext:{external_id}");
    }

    let title = normalize_title(&result.title);
    if !title.is_empty() {
        return format!("title:{title}|{}", result.year.trim());
    }

    format!("raw:{}:{}#{position}", result.source, result.id)
}

/// Deduplicate scored results by [`primary_key`].
///
/// Within each group the highest `final_score` wins; on an exact tie the
/// result seen first is kept. Groups are returned in the order their first
/// member appeared, so callers that pass an already ordered list keep that
/// order.
pub fn deduplicate(scored: Vec<ScoredResult>) -> Vec<ScoredResult> {
    let mut slots: HashMap<String, usize> = HashMap::with_capacity(scored.len());
    let mut kept: Vec<ScoredResult> = Vec::with_capacity(scored.len());

    for (position, candidate) in scored.into_iter().enumerate() {
        let key = primary_key(&candidate.result, position);
        match slots.entry(key) {
            Entry::Occupied(slot) => {
                let best = &mut kept[*slot.get()];
                if candidate.final_score > best.final_score {
                    *best = candidate;
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(kept.len());
                kept.push(candidate);
            }
        }
    }

    kept
}

/// Coarse deduplication for "merge visually similar titles" requests.
///
/// Two results belong together when they share a [`primary_key`], or when
/// their title acronyms are equal and non-empty and their years are equal.
/// Matches are transitive. Representative choice and output order follow
/// [`deduplicate`].
pub fn merge_similar(scored: Vec<ScoredResult>) -> Vec<ScoredResult> {
    let mut groups = DisjointSet::new(scored.len());
    let mut by_primary: HashMap<String, usize> = HashMap::with_capacity(scored.len());
    let mut by_acronym: HashMap<(String, String), usize> = HashMap::new();

    for (position, candidate) in scored.iter().enumerate() {
        let key = primary_key(&candidate.result, position);
        match by_primary.entry(key) {
            Entry::Occupied(first) => groups.union(*first.get(), position),
            Entry::Vacant(slot) => {
                slot.insert(position);
            }
        }

        let initials = acronym(&candidate.result.title);
        if initials.is_empty() {
            continue;
        }
        let key = (initials, candidate.result.year.trim().to_string());
        match by_acronym.entry(key) {
            Entry::Occupied(first) => groups.union(*first.get(), position),
            Entry::Vacant(slot) => {
                slot.insert(position);
            }
        }
    }

    let mut slots: HashMap<usize, usize> = HashMap::new();
    let mut kept: Vec<ScoredResult> = Vec::new();
    for (position, candidate) in scored.into_iter().enumerate() {
        let root = groups.find(position);
        match slots.entry(root) {
            Entry::Occupied(slot) => {
                let best = &mut kept[*slot.get()];
                if candidate.final_score > best.final_score {
                    *best = candidate;
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(kept.len());
                kept.push(candidate);
            }
        }
    }

    tracing::trace!(groups = kept.len(), "merged similar titles");
    kept
}

/// Union-find over result positions.
struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
        }
    }

    fn find(&mut self, mut node: usize) -> usize {
        let mut root = node;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        // Path compression.
        while self.parent[node] != root {
            let next = self.parent[node];
            self.parent[node] = root;
            node = next;
        }
        root
    }

    fn union(&mut self, a: usize, b: usize) {
        let root_a = self.find(a);
        let root_b = self.find(b);
        if root_a != root_b {
            let (low, high) = if root_a < root_b {
                (root_a, root_b)
            } else {
                (root_b, root_a)
            };
            self.parent[high] = low;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scored(title: &str, year: &str, source: &str, score: f64) -> ScoredResult {
        ScoredResult {
            final_score: score,
            ..ScoredResult::unscored(SearchResult::new(title, year, source))
        }
    }

    fn with_ext(mut s: ScoredResult, external_id: &str) -> ScoredResult {
        s.result.external_id = external_id.into();
        s
    }

    #[test]
    fn external_id_key_takes_precedence() {
        let result = SearchResult::new("Dune", "2021", "tmdb").with_external_id(" 438631 ");
        assert_eq!(primary_key(&result, 0), "ext:438631");
    }

    #[test]
    fn title_key_includes_year() {
        let result = SearchResult::new("测试视频", "2023", "a");
        assert_eq!(primary_key(&result, 0), "title:测试视频|2023");
        let no_year = SearchResult::new("测试视频", "", "a");
        assert_eq!(primary_key(&no_year, 0), "title:测试视频|");
    }

    #[test]
    fn malformed_records_get_unique_keys() {
        let a = SearchResult::new("", "", "src").with_id("1");
        let b = SearchResult::new("!!!", "", "src").with_id("1");
        assert_ne!(primary_key(&a, 0), primary_key(&b, 1));
        assert!(primary_key(&a, 0).starts_with("raw:src:1#"));
    }

    #[test]
    fn unique_titles_pass_through() {
        let deduped = deduplicate(vec![
            scored("Dune", "2021", "a", 1.0),
            scored("Arrival", "2016", "b", 2.0),
        ]);
        assert_eq!(deduped.len(), 2);
    }

    #[test]
    fn highest_score_kept() {
        let deduped = deduplicate(vec![
            scored("Dune", "2021", "a", 40.0),
            scored("DUNE", "2021", "b", 70.0),
            scored("dune", "2021", "c", 55.0),
        ]);
        assert_eq!(deduped.len(), 1);
        assert_eq!(deduped[0].result.source, "b");
    }

    #[test]
    fn exact_tie_keeps_first_seen() {
        let deduped = deduplicate(vec![
            scored("Dune", "2021", "first", 50.0),
            scored("Dune", "2021", "second", 50.0),
        ]);
        assert_eq!(deduped.len(), 1);
        assert_eq!(deduped[0].result.source, "first");
    }

    #[test]
    fn different_years_not_merged() {
        let deduped = deduplicate(vec![
            scored("Dune", "1984", "a", 1.0),
            scored("Dune", "2021", "b", 1.0),
        ]);
        assert_eq!(deduped.len(), 2);
    }

    #[test]
    fn external_id_on_one_side_only_not_merged() {
        let deduped = deduplicate(vec![
            with_ext(scored("Dune", "2021", "tmdb", 1.0), "12345"),
            scored("Dune", "2021", "youku", 1.0),
        ]);
        assert_eq!(deduped.len(), 2);
    }

    #[test]
    fn shared_external_id_merges_different_titles() {
        let deduped = deduplicate(vec![
            with_ext(scored("沙丘", "2021", "douban", 60.0), "tt1160419"),
            with_ext(scored("Dune", "2021", "imdb", 80.0), "tt1160419"),
        ]);
        assert_eq!(deduped.len(), 1);
        assert_eq!(deduped[0].result.title, "Dune");
    }

    #[test]
    fn group_order_follows_first_appearance() {
        let deduped = deduplicate(vec![
            scored("B", "", "x", 1.0),
            scored("A", "", "x", 1.0),
            scored("B", "", "y", 9.0),
        ]);
        let titles: Vec<&str> = deduped.iter().map(|s| s.result.title.as_str()).collect();
        assert_eq!(titles, vec!["B", "A"]);
        assert_eq!(deduped[0].result.source, "y");
    }

    #[test]
    fn empty_input_returns_empty() {
        assert!(deduplicate(vec![]).is_empty());
        assert!(merge_similar(vec![]).is_empty());
    }

    #[test]
    fn malformed_records_never_collapse() {
        let deduped = deduplicate(vec![
            scored("", "", "src", 1.0),
            scored("", "", "src", 1.0),
            scored("", "", "src", 1.0),
        ]);
        assert_eq!(deduped.len(), 3);
    }

    #[test]
    fn merge_similar_joins_matching_acronyms() {
        let merged = merge_similar(vec![
            scored("The Lord of the Rings", "2001", "a", 10.0),
            scored("The Lord Of The Rings!", "2001", "b", 20.0),
            scored("Tales Lost of Two Realms", "2001", "c", 5.0),
        ]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].result.source, "b");
    }

    #[test]
    fn merge_similar_requires_matching_year() {
        let merged = merge_similar(vec![
            scored("The Lord of the Rings", "2001", "a", 1.0),
            scored("Tales Lost of Two Realms", "2003", "b", 1.0),
        ]);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn merge_similar_is_transitive_across_keys() {
        // a~b by external id, b~c by acronym.
        let merged = merge_similar(vec![
            with_ext(scored("Blade Runner", "1982", "a", 1.0), "78"),
            with_ext(scored("银翼杀手", "1982", "b", 1.0), "78"),
            scored("银色翅膀", "1982", "c", 3.0),
        ]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].result.source, "c");
    }

    #[test]
    fn default_dedup_does_not_use_acronyms() {
        let deduped = deduplicate(vec![
            scored("The Lord of the Rings", "2001", "a", 1.0),
            scored("Tales Lost of Two Realms", "2001", "b", 1.0),
        ]);
        assert_eq!(deduped.len(), 2);
    }
}
