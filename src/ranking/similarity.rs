//! Normalised edit-distance similarity between two strings.
//!
//! Callers are expected to case-fold and trim both inputs first; this module
//! compares characters exactly.

/// Levenshtein similarity in `[0, 1]`.
///
/// ```text
/// similarity = 1 - levenshtein(a, b) / max(chars(a), chars(b))
/// ```
///
/// Two empty strings are identical (1.0); an empty string against a
/// non-empty one shares nothing (0.0). Lengths count Unicode scalar values,
/// so CJK titles compare per character rather than per byte.
///
/// # Examples
///
/// ```
/// use catalog_rank::ranking::similarity::similarity;
///
/// assert_eq!(similarity("kitten", "kitten"), 1.0);
/// assert!((similarity("kitten", "sitting") - (1.0 - 3.0 / 7.0)).abs() < 1e-9);
/// ```
pub fn similarity(a: &str, b: &str) -> f64 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    let distance = strsim::levenshtein(a, b);
    1.0 - distance as f64 / max_len as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_strings_score_one() {
        assert_eq!(similarity("the matrix", "the matrix"), 1.0);
        assert_eq!(similarity("测试视频", "测试视频"), 1.0);
    }

    #[test]
    fn both_empty_score_one() {
        assert_eq!(similarity("", ""), 1.0);
    }

    #[test]
    fn empty_against_non_empty_scores_zero() {
        assert_eq!(similarity("", "abc"), 0.0);
        assert_eq!(similarity("abc", ""), 0.0);
    }

    #[test]
    fn symmetric() {
        let pairs = [
            ("kitten", "sitting"),
            ("inception", "interstellar"),
            ("测试视频", "测试"),
            ("a", "abcdef"),
        ];
        for (a, b) in pairs {
            assert!((similarity(a, b) - similarity(b, a)).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn known_distance() {
        // kitten -> sitting needs 3 edits over 7 chars.
        let expected = 1.0 - 3.0 / 7.0;
        assert!((similarity("kitten", "sitting") - expected).abs() < 1e-9);
    }

    #[test]
    fn counts_chars_not_bytes() {
        // One substitution over four CJK characters.
        assert!((similarity("测试视频", "测试影频") - 0.75).abs() < 1e-9);
    }

    #[test]
    fn completely_different_scores_zero() {
        assert_eq!(similarity("abc", "xyz"), 0.0);
    }

    #[test]
    fn stays_within_unit_interval() {
        for (a, b) in [("a", "bbbbbbbb"), ("hello", "world"), ("x", "x y z")] {
            let s = similarity(a, b);
            assert!((0.0..=1.0).contains(&s), "{a} vs {b} gave {s}");
        }
    }
}
