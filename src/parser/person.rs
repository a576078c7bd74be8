//! Honoree name extraction.
//!
//! Works line by line: lines dominated by award vocabulary are skipped, the
//! rest are probed with a few capitalized-name shapes. A whole-text pass
//! with a stricter filter catches names glued to other copy.

use std::sync::LazyLock;

use regex::Regex;

use super::text;

static NAME_PATTERNS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        // First Last, optionally with a capitalized middle name.
        Regex::new(r"\b([A-Z][a-z]+\s+[A-Z][a-z]+(?:\s+[A-Z][a-z]+)?)\b").unwrap(),
        // First M. Last.
        Regex::new(r"\b([A-Z][a-z]+\s+[A-Z]\.?\s+[A-Z][a-z]+)\b").unwrap(),
        // First de/van/von Last.
        Regex::new(r"\b([A-Z][a-z]+(?:\s+[a-z]+)?\s+[A-Z][a-z]+)\b").unwrap(),
    ]
});

static FALLBACK_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([A-Z][a-z]+\s+[A-Z][a-z]+)\b").unwrap());

// A line containing any of these is award copy, not a name line.
const SKIP_LINE_KEYWORDS: &[&str] = &[
    "winner",
    "nominated",
    "won",
    "year",
    "category",
    "academy",
    "award",
    "best",
];

// Institution phrases that pass the name-shape patterns anyway.
const INSTITUTION_PHRASES: &[&str] = &[
    "motion picture",
    "best picture",
    "academy award",
    "golden globe",
];

// Stricter per-word filter for the whole-text fallback, which sees far more
// false candidates than the line pass.
const FALLBACK_REJECT_WORDS: &[&str] = &["award", "picture", "motion", "academy"];

const MIN_NAME_CHARS: usize = 5;
const MAX_NAME_CHARS: usize = 50;

/// Extract the honoree's name from a normalized mention, if any.
pub fn extract_person_name(text: &str) -> Option<String> {
    let lines = text::lines(text);

    for line in &lines {
        if text::contains_any(&line.to_lowercase(), SKIP_LINE_KEYWORDS) {
            continue;
        }
        for re in NAME_PATTERNS.iter() {
            for caps in re.captures_iter(line) {
                let candidate = caps[1].trim();
                if plausible_name(candidate) {
                    return Some(candidate.to_string());
                }
            }
        }
    }

    // No clean name line; probe the text as one string with the strict
    // two-word pattern.
    let joined = lines.join(" ");
    for caps in FALLBACK_NAME_RE.captures_iter(&joined) {
        let candidate = &caps[1];
        if (MIN_NAME_CHARS..=MAX_NAME_CHARS).contains(&candidate.chars().count())
            && !text::contains_any(&candidate.to_lowercase(), FALLBACK_REJECT_WORDS)
        {
            return Some(candidate.to_string());
        }
    }

    None
}

fn plausible_name(candidate: &str) -> bool {
    (MIN_NAME_CHARS..=MAX_NAME_CHARS).contains(&candidate.chars().count())
        && candidate.contains(' ')
        && !text::contains_any(&candidate.to_lowercase(), INSTITUTION_PHRASES)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_last_on_clean_line() {
        let text = "Academy Award Winner\nBest Actor\nMarlon Brando";
        assert_eq!(extract_person_name(text), Some("Marlon Brando".to_string()));
    }

    #[test]
    fn three_part_name() {
        let text = "Golden Globe\nFrancis Ford Coppola\nfor directing";
        assert_eq!(
            extract_person_name(text),
            Some("Francis Ford Coppola".to_string())
        );
    }

    #[test]
    fn middle_initial_name() {
        let text = "the ceremony\nSamuel L. Jackson attended";
        assert_eq!(
            extract_person_name(text),
            Some("Samuel L. Jackson".to_string())
        );
    }

    #[test]
    fn lowercase_particle_name() {
        let text = "the honoree\nRobert de Niro on stage";
        assert_eq!(extract_person_name(text), Some("Robert de Niro".to_string()));
    }

    #[test]
    fn skips_award_copy_lines() {
        // "Joe Winner" sits on a line with a skip keyword; the name on the
        // following clean line is picked instead.
        let text = "presented to Joe Winner\nJane Smith";
        assert_eq!(extract_person_name(text), Some("Jane Smith".to_string()));
    }

    #[test]
    fn institution_phrases_rejected() {
        let text = "Motion Picture Association";
        assert_eq!(extract_person_name(text), None);
    }

    #[test]
    fn fallback_scans_whole_text() {
        // Every line trips a skip keyword, so only the whole-text pass can
        // find the name.
        let text = "Winner of the year Meryl Streep nominated twice";
        assert_eq!(extract_person_name(text), Some("Meryl Streep".to_string()));
    }

    #[test]
    fn no_name_anywhere() {
        assert_eq!(extract_person_name("a quiet ceremony without names"), None);
        assert_eq!(extract_person_name(""), None);
    }
}
