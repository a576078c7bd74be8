//! Award category extraction.
//!
//! A cascade of independent strategies, tried in order, first hit wins.
//! Each strategy is a plain function so it can be tested on its own and
//! reordered without touching the others.

use std::sync::LazyLock;

use regex::Regex;

use super::text;

/// Sentinel returned when no strategy produced a category.
pub const UNKNOWN_CATEGORY: &str = "Unknown Category";

/// Longest category we will carry; award pages sometimes glue whole
/// paragraphs into one line.
const MAX_CATEGORY_CHARS: usize = 100;

static BRACKET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(([^)\n]*)\)|\[([^\]\n]*)\]").unwrap());

static FOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bfor\s+(.+?)(?:\s+in\s|\s+\(|\s+\[|\n|$)").unwrap()
});

static CANONICAL_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)best\s+[\w\s]+",
        r"(?i)outstanding\s+[\w\s]+",
        r"(?i)achievement\s+in\s+[\w\s]+",
        r"(?i)motion\s+picture\s+[\w\s]*",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

// First line is usually "Academy Awards 1973" or similar; skip it before
// scanning for a category line.
const FIRST_LINE_AWARD_KEYWORDS: &[&str] = &["academy", "oscar", "golden globe", "winner", "won"];

// Lines carrying outcome or ceremony noise rather than a category.
const SCAN_SKIP_KEYWORDS: &[&str] = &["winner", "nominated", "won", "year", "ceremony"];

const STRATEGIES: &[fn(&str) -> Option<String>] = &[
    from_bracketed_span,
    from_for_clause,
    from_line_scan,
    from_canonical_phrase,
    from_first_line,
];

/// Extract the award category from a normalized mention. Always returns
/// something; [`UNKNOWN_CATEGORY`] marks the give-up case.
pub fn extract_category(text: &str) -> String {
    STRATEGIES
        .iter()
        .find_map(|strategy| strategy(text))
        .unwrap_or_else(|| UNKNOWN_CATEGORY.to_string())
}

/// Categories frequently sit in parentheses or brackets right after the
/// award name. Name-like spans are rejected so "(Joe Smith)" falls through
/// to the line scan instead of being misread as a category.
fn from_bracketed_span(text: &str) -> Option<String> {
    let caps = BRACKET_RE.captures(text)?;
    let span = caps.get(1).or_else(|| caps.get(2))?.as_str().trim();
    if span.is_empty() || text::looks_like_person_name(span) {
        return None;
    }
    Some(span.to_string())
}

/// "won for Best Original Score in 1975" style phrasing. The clause runs up
/// to an " in ", an opening bracket, a line break, or the end of the text.
fn from_for_clause(text: &str) -> Option<String> {
    FOR_RE
        .captures(text)?
        .get(1)
        .map(|m| m.as_str().trim().to_string())
}

/// Scan lines below the award header for the first one that is neither
/// outcome noise nor a person name.
fn from_line_scan(text: &str) -> Option<String> {
    let lines = text::lines(text);
    let start = usize::from(
        lines
            .first()
            .is_some_and(|l| text::contains_any(&l.to_lowercase(), FIRST_LINE_AWARD_KEYWORDS)),
    );
    for line in lines.iter().skip(start) {
        if text::contains_any(&line.to_lowercase(), SCAN_SKIP_KEYWORDS) {
            continue;
        }
        if !text::looks_like_person_name(line) {
            return Some(truncate(line));
        }
    }
    None
}

/// Canonical category phrasing anywhere in the text.
fn from_canonical_phrase(text: &str) -> Option<String> {
    CANONICAL_RES
        .iter()
        .find_map(|re| re.find(text))
        .map(|m| m.as_str().trim().to_string())
}

/// Last resort before the sentinel: the first meaningful line, truncated.
fn from_first_line(text: &str) -> Option<String> {
    text::lines(text).first().map(|l| truncate(l))
}

fn truncate(s: &str) -> String {
    s.chars().take(MAX_CATEGORY_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parenthetical_category_wins() {
        let text = "Academy Awards 1973\n(Best Sound Mixing)\nWinner";
        assert_eq!(extract_category(text), "Best Sound Mixing");
    }

    #[test]
    fn bracketed_category_wins() {
        let text = "Golden Globe [Best Screenplay] 1975";
        assert_eq!(extract_category(text), "Best Screenplay");
    }

    #[test]
    fn parenthetical_name_is_not_a_category() {
        // The bracketed span is a name, so the line scan supplies the
        // category instead.
        let text = "Academy Award Winner\nBest Supporting Actor\n(Joe Smith)";
        assert_eq!(extract_category(text), "Best Supporting Actor");
    }

    #[test]
    fn for_clause_stops_at_in() {
        let text = "won the Golden Globe for Best Original Score in 1975";
        assert_eq!(extract_category(text), "Best Original Score");
    }

    #[test]
    fn for_clause_stops_at_line_break() {
        let text = "nominated for Best Cinematography\nCeremony held in March";
        assert_eq!(extract_category(text), "Best Cinematography");
    }

    #[test]
    fn line_scan_skips_header_and_noise() {
        let text = "Oscar ceremony highlights\nWinner announced on stage\nBest Film Editing\nJoe Smith";
        assert_eq!(extract_category(text), "Best Film Editing");
    }

    #[test]
    fn canonical_phrase_found_midline() {
        // Single line containing "winner" is skipped by the line scan, then
        // the canonical pattern picks the phrase out of it.
        let text = "winner achievement in visual effects";
        assert_eq!(extract_category(text), "achievement in visual effects");
    }

    #[test]
    fn first_line_fallback_truncates() {
        let long = "x".repeat(150);
        let got = extract_category(&long);
        assert_eq!(got.chars().count(), 100);
    }

    #[test]
    fn empty_text_yields_sentinel() {
        assert_eq!(extract_category(""), UNKNOWN_CATEGORY);
        assert_eq!(extract_category("\n\n"), UNKNOWN_CATEGORY);
    }
}
