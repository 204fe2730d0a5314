//! Text normalisation shared by scoring and deduplication.
//!
//! Two strengths are provided:
//!
//! - [`fold`]: case- and whitespace-insensitive comparison form, used when
//!   matching a title against the user's query.
//! - [`normalize_title`]: identity form for deduplication, which additionally
//!   strips punctuation and symbols so that `"Alien: Romulus"` and
//!   `"alien romulus"` collide.

use unicode_normalization::UnicodeNormalization;

/// NFKC-normalise, lowercase, trim, and collapse whitespace runs to one space.
pub fn fold(text: &str) -> String {
    let lowered: String = text.nfkc().flat_map(char::to_lowercase).collect();
    lowered.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Identity form of a title: [`fold`] with everything except letters,
/// digits and whitespace removed.
///
/// Returns an empty string for titles made only of punctuation.
pub fn normalize_title(title: &str) -> String {
    let kept: String = title
        .nfkc()
        .flat_map(char::to_lowercase)
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();
    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// First character of each word of the normalised title.
///
/// `"The Lord of the Rings"` becomes `"tlotr"`. Titles without word
/// boundaries (most CJK titles) reduce to their first character.
pub fn acronym(title: &str) -> String {
    normalize_title(title)
        .split_whitespace()
        .filter_map(|word| word.chars().next())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fold_ignores_case_and_spacing() {
        assert_eq!(fold("  The   MATRIX "), "the matrix");
        assert_eq!(fold("The Matrix"), fold("the matrix"));
    }

    #[test]
    fn fold_keeps_punctuation() {
        assert_eq!(fold("Alien: Romulus"), "alien: romulus");
    }

    #[test]
    fn fold_applies_nfkc() {
        // Full-width Latin letters fold to ASCII.
        assert_eq!(fold("ＡＢＣ"), "abc");
    }

    #[test]
    fn normalize_title_strips_punctuation() {
        assert_eq!(normalize_title("Alien: Romulus!"), "alien romulus");
        assert_eq!(normalize_title("Spider-Man"), "spiderman");
    }

    #[test]
    fn normalize_title_keeps_cjk() {
        assert_eq!(normalize_title("测试视频"), "测试视频");
        assert_eq!(normalize_title("测试视频：终极版"), "测试视频终极版");
    }

    #[test]
    fn normalize_title_of_only_punctuation_is_empty() {
        assert_eq!(normalize_title("?!…"), "");
        assert_eq!(normalize_title(""), "");
    }

    #[test]
    fn acronym_takes_word_initials() {
        assert_eq!(acronym("The Lord of the Rings"), "tlotr");
        assert_eq!(acronym("the lord, of the rings!"), "tlotr");
    }

    #[test]
    fn acronym_of_unspaced_title_is_first_char() {
        assert_eq!(acronym("测试视频"), "测");
    }

    #[test]
    fn acronym_of_empty_title_is_empty() {
        assert_eq!(acronym("---"), "");
    }
}
