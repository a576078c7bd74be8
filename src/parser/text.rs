//! Text normalization and small shared heuristics.
//!
//! Everything downstream of the scraper works on normalized text: the
//! category extractor leans on brackets and line structure, the name
//! extractor on periods, apostrophes and hyphens, so normalization keeps
//! exactly those markers and collapses the rest to spaces.

use std::sync::LazyLock;

use regex::Regex;

static YEAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b((?:19|20)\d{2})\b").unwrap());

// Words that never appear in a person name but are everywhere in award copy.
// A 2-4 word capitalized span containing one of these is category text, not
// a name ("Best Supporting Actor" capitalizes exactly like "Joe Smith").
const NAME_STOPWORDS: &[&str] = &[
    "best",
    "outstanding",
    "achievement",
    "award",
    "awards",
    "academy",
    "picture",
    "motion",
    "film",
    "feature",
    "actor",
    "actress",
    "director",
    "directing",
    "performance",
    "supporting",
    "leading",
    "winner",
    "nominee",
];

/// Collapse raw scraped text to the alphabet the extractors understand.
/// Keeps alphanumerics, brackets, periods, apostrophes and hyphens; every
/// other character becomes a space. Line breaks survive because the line
/// structure of an award page is itself a signal. Whitespace runs collapse
/// to a single space per line.
pub fn normalize(raw: &str) -> String {
    let mut lines = Vec::new();
    for line in raw.replace("\r\n", "\n").lines() {
        let kept: String = line
            .chars()
            .map(|c| {
                if c.is_alphanumeric()
                    || c.is_whitespace()
                    || matches!(c, '(' | ')' | '[' | ']' | '.' | '\'' | '-')
                {
                    c
                } else {
                    ' '
                }
            })
            .collect();
        lines.push(kept.split_whitespace().collect::<Vec<_>>().join(" "));
    }
    lines.join("\n")
}

/// Non-empty trimmed lines of a normalized mention.
pub fn lines(text: &str) -> Vec<&str> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect()
}

/// Every plausible ceremony year (19xx or 20xx) in the text, in order.
pub fn detect_years(text: &str) -> Vec<i32> {
    YEAR_RE
        .captures_iter(text)
        .filter_map(|caps| caps[1].parse().ok())
        .collect()
}

/// Year closest to the context year; ties go to the earlier year; no
/// candidates at all falls back to the context year itself.
pub fn pick_year(years: &[i32], context_year: i32) -> i32 {
    years
        .iter()
        .copied()
        .min_by_key(|y| ((y - context_year).abs(), *y))
        .unwrap_or(context_year)
}

/// Whether a span reads like a person name: two to four words, each starting
/// with an uppercase letter once surrounding punctuation is stripped, and
/// none of them award vocabulary.
pub fn looks_like_person_name(span: &str) -> bool {
    let words: Vec<&str> = span
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|w| !w.is_empty())
        .collect();
    if !(2..=4).contains(&words.len()) {
        return false;
    }
    words.iter().all(|w| {
        w.chars().next().is_some_and(char::is_uppercase)
            && !NAME_STOPWORDS.contains(&w.to_lowercase().as_str())
    })
}

/// True when the haystack contains any of the needles. Callers lowercase
/// the haystack first; the keyword tables are already lowercase.
pub fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_keeps_structure_markers() {
        let raw = "Academy Award®, Winner!\nBest Actor — (Joe Smith)";
        let got = normalize(raw);
        assert_eq!(got, "Academy Award Winner\nBest Actor (Joe Smith)");
    }

    #[test]
    fn normalize_preserves_initials_and_hyphens() {
        assert_eq!(normalize("Samuel L. Jackson"), "Samuel L. Jackson");
        assert_eq!(normalize("Day-Lewis's   win"), "Day-Lewis's win");
    }

    #[test]
    fn normalize_empty_input() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   \n\t  "), "\n");
    }

    #[test]
    fn lines_skips_blanks() {
        assert_eq!(lines("a\n\n  b  \n"), vec!["a", "b"]);
        assert!(lines("").is_empty());
    }

    #[test]
    fn detect_years_finds_plausible_years_only() {
        assert_eq!(detect_years("won in 1973 and again in 2004"), vec![1973, 2004]);
        assert!(detect_years("room 1234, 3019 credits").is_empty());
        assert!(detect_years("19733 is not a year").is_empty());
    }

    #[test]
    fn pick_year_prefers_closest_to_context() {
        assert_eq!(pick_year(&[1973, 2004], 1972), 1973);
        assert_eq!(pick_year(&[1971, 1995], 1972), 1971);
        assert_eq!(pick_year(&[1990, 2020], 2019), 2020);
    }

    #[test]
    fn pick_year_tie_takes_earlier() {
        assert_eq!(pick_year(&[1995, 1993], 1994), 1993);
    }

    #[test]
    fn pick_year_empty_falls_back_to_context() {
        assert_eq!(pick_year(&[], 1994), 1994);
    }

    #[test]
    fn person_name_heuristic_accepts_names() {
        assert!(looks_like_person_name("Joe Smith"));
        assert!(looks_like_person_name("(Joe Smith)"));
        assert!(looks_like_person_name("Francis Ford Coppola"));
        assert!(looks_like_person_name("Samuel L. Jackson"));
    }

    #[test]
    fn person_name_heuristic_rejects_category_text() {
        assert!(!looks_like_person_name("Best Supporting Actor"));
        assert!(!looks_like_person_name("Outstanding Performance"));
        assert!(!looks_like_person_name("Academy Award Winner"));
    }

    #[test]
    fn person_name_heuristic_rejects_wrong_shape() {
        assert!(!looks_like_person_name("Madonna"));
        assert!(!looks_like_person_name("a very long lowercase phrase here"));
        assert!(!looks_like_person_name("The Lord Of The Rings"));
    }
}
