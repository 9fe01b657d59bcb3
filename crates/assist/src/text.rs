//! Request text normalization.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Lowercase, turn `_`/`-` into spaces, strip diacritics, collapse whitespace.
pub fn normalize(text: &str) -> String {
    let lowered: String = text
        .to_lowercase()
        .chars()
        .map(|c| if c == '_' || c == '-' { ' ' } else { c })
        .collect();
    let stripped: String = lowered.nfd().filter(|c| !is_combining_mark(*c)).collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Substring match against any needle.
pub fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

/// Whole-word match against any needle (words split on non-alphanumerics).
pub fn has_any_word(haystack: &str, words: &[&str]) -> bool {
    haystack
        .split(|c: char| !c.is_alphanumeric())
        .any(|w| words.contains(&w))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_diacritics() {
        assert_eq!(normalize("Přidej  DPH 21 % do Sloupce C"), "pridej dph 21 % do sloupce c");
        assert_eq!(normalize("Kurz ČNB EUR dnes"), "kurz cnb eur dnes");
        assert_eq!(normalize("run-rate__za 3 měsíce"), "run rate za 3 mesice");
    }

    #[test]
    fn test_normalize_trims() {
        assert_eq!(normalize("  \tSoučet\n"), "soucet");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_word_match() {
        assert!(has_any_word("porovnej mom a yoy", &["mom"]));
        assert!(!has_any_word("momentalne", &["mom"]));
        assert!(contains_any("odstran duplicity", &["duplic"]));
    }
}
