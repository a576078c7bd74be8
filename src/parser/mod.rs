//! Award mention parsing pipeline: raw scraped text → structured candidates.
//!
//! A mention is one award-section fragment tied to a movie. Parsing is pure:
//! normalize, identify the award, pick the ceremony year, extract category
//! and honoree, then classify into movie/director/actor candidates. One
//! mention can legitimately produce several candidates ("won Best Picture
//! and Best Director") and the checks are deliberately independent.

pub mod category;
pub mod person;
pub mod text;

use crate::lexicon::Lexicon;

/// Award subject kind a mention can be classified as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AwardType {
    Movie,
    Director,
    Actor,
}

impl AwardType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AwardType::Movie => "movie",
            AwardType::Director => "director",
            AwardType::Actor => "actor",
        }
    }
}

/// One scraped award fragment, queued for parsing.
#[derive(Debug, Clone)]
pub struct RawMention {
    pub movie_id: i64,
    pub text: String,
    /// Release year of the movie the fragment was scraped for; the year
    /// fallback and the closest-year pick both anchor on it.
    pub context_year: i32,
}

/// A structured award candidate. Persisted through the dedup gate or
/// dropped during person resolution; never mutated after parsing.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedCandidate {
    pub award_type: AwardType,
    pub award_name: &'static str,
    pub year: i32,
    /// None when extraction gave up; stored as the sentinel category.
    pub category: Option<String>,
    /// Only meaningful for director/actor candidates.
    pub person_name: Option<String>,
    pub movie_id: i64,
}

/// Parse one mention into zero or more award candidates.
pub fn parse_mention(lexicon: &Lexicon, mention: &RawMention) -> Vec<ParsedCandidate> {
    let normalized = text::normalize(&mention.text);
    let lower = normalized.to_lowercase();

    let Some(award_name) = lexicon.match_award(&lower) else {
        return Vec::new();
    };

    let year = text::pick_year(&text::detect_years(&normalized), mention.context_year);
    let category = category::extract_category(&normalized);
    let person_name = person::extract_person_name(&normalized);

    let category_opt =
        (category != category::UNKNOWN_CATEGORY).then(|| category.clone());

    // Keyword sets are checked against the category plus the whole text, so
    // a category line and a loose phrase weigh the same.
    let haystack = format!("{} {}", category.to_lowercase(), lower);

    let make = |award_type: AwardType, person: Option<String>| ParsedCandidate {
        award_type,
        award_name,
        year,
        category: category_opt.clone(),
        person_name: person,
        movie_id: mention.movie_id,
    };

    let mut candidates = Vec::new();

    if text::contains_any(&haystack, lexicon.movie_categories) {
        candidates.push(make(AwardType::Movie, None));
    }
    if text::contains_any(&haystack, lexicon.director_categories) {
        candidates.push(make(AwardType::Director, person_name.clone()));
    }
    if text::contains_any(&haystack, lexicon.actor_categories) {
        candidates.push(make(AwardType::Actor, person_name.clone()));
    }

    // Nothing category-shaped matched. With a name in hand, loose cues in
    // the free text decide director vs actor; failing that, a usable
    // category alone still counts as a movie-level award.
    if candidates.is_empty() {
        if person_name.is_some() {
            if text::contains_any(&lower, lexicon.director_cues) {
                candidates.push(make(AwardType::Director, person_name.clone()));
            } else if text::contains_any(&lower, lexicon.actor_cues) {
                candidates.push(make(AwardType::Actor, person_name.clone()));
            }
        }
        if candidates.is_empty() && category_opt.is_some() {
            candidates.push(make(AwardType::Movie, None));
        }
    }

    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(name: &str) -> String {
        std::fs::read_to_string(format!("tests/fixtures/{name}"))
            .unwrap_or_else(|e| panic!("fixture {name}: {e}"))
    }

    fn mention(text: &str, movie_id: i64, context_year: i32) -> RawMention {
        RawMention {
            movie_id,
            text: text.to_string(),
            context_year,
        }
    }

    #[test]
    fn unrecognized_award_produces_nothing() {
        let lex = Lexicon::default();
        let got = parse_mention(&lex, &mention("MTV Movie Award for Best Kiss", 1, 2000));
        assert!(got.is_empty());
    }

    #[test]
    fn empty_text_produces_nothing() {
        let lex = Lexicon::default();
        assert!(parse_mention(&lex, &mention("", 1, 2000)).is_empty());
    }

    #[test]
    fn supporting_actor_with_parenthesized_name() {
        let lex = Lexicon::default();
        let raw = mention(
            "Academy Award Winner\nBest Supporting Actor\n(Joe Smith)",
            42,
            1994,
        );
        let got = parse_mention(&lex, &raw);

        assert_eq!(got.len(), 1);
        let cand = &got[0];
        assert_eq!(cand.award_type, AwardType::Actor);
        assert_eq!(cand.award_name, "Academy Awards");
        assert_eq!(cand.year, 1994);
        assert_eq!(cand.category.as_deref(), Some("Best Supporting Actor"));
        assert_eq!(cand.person_name.as_deref(), Some("Joe Smith"));
        assert_eq!(cand.movie_id, 42);
    }

    #[test]
    fn one_mention_can_emit_movie_and_director() {
        let lex = Lexicon::default();
        let raw = mention(
            "Academy Awards 1973\nBest Picture\nalso won best director honors",
            7,
            1972,
        );
        let got = parse_mention(&lex, &raw);

        let types: Vec<AwardType> = got.iter().map(|c| c.award_type).collect();
        assert_eq!(types, vec![AwardType::Movie, AwardType::Director]);
        assert!(got.iter().all(|c| c.year == 1973));
    }

    #[test]
    fn explicit_year_beats_context_year() {
        let lex = Lexicon::default();
        let raw = mention("Cannes Film Festival 2004\nPalme d'Or", 3, 2003);
        let got = parse_mention(&lex, &raw);

        assert_eq!(got.len(), 1);
        assert_eq!(got[0].award_type, AwardType::Movie);
        assert_eq!(got[0].year, 2004);
    }

    #[test]
    fn director_cue_fallback_needs_a_name() {
        let lex = Lexicon::default();

        let named = mention(
            "Golden Globe goes to the directing of\nSteven Spielberg",
            5,
            1993,
        );
        let got = parse_mention(&lex, &named);
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].award_type, AwardType::Director);
        assert_eq!(got[0].person_name.as_deref(), Some("Steven Spielberg"));

        // Same cue without an extractable name demotes the candidate to a
        // movie-level award.
        let anonymous = mention("BAFTA nod for superb directing work", 5, 1993);
        let got = parse_mention(&lex, &anonymous);
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].award_type, AwardType::Movie);
    }

    #[test]
    fn actor_cue_fallback() {
        let lex = Lexicon::default();
        let raw = mention(
            "SAG Award Winner for her performance\nViola Davis",
            9,
            2016,
        );
        let got = parse_mention(&lex, &raw);
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].award_type, AwardType::Actor);
        assert_eq!(got[0].person_name.as_deref(), Some("Viola Davis"));
    }

    #[test]
    fn category_alone_defaults_to_movie() {
        let lex = Lexicon::default();
        let raw = mention("BAFTA Awards\n(Outstanding British Film)", 11, 2010);
        let got = parse_mention(&lex, &raw);

        assert_eq!(got.len(), 1);
        assert_eq!(got[0].award_type, AwardType::Movie);
        assert_eq!(
            got[0].category.as_deref(),
            Some("Outstanding British Film")
        );
    }

    #[test]
    fn parses_academy_fixture() {
        let lex = Lexicon::default();
        let raw = mention(&fixture("academy_supporting.txt"), 42, 1994);
        let got = parse_mention(&lex, &raw);

        assert_eq!(got.len(), 1);
        assert_eq!(got[0].award_type, AwardType::Actor);
        assert_eq!(got[0].category.as_deref(), Some("Best Supporting Actor"));
        assert_eq!(got[0].person_name.as_deref(), Some("Joe Smith"));
        assert_eq!(got[0].year, 1994);
    }

    #[test]
    fn parses_globe_director_fixture() {
        let lex = Lexicon::default();
        let raw = mention(&fixture("globe_director.txt"), 7, 1974);
        let got = parse_mention(&lex, &raw);

        assert_eq!(got.len(), 1);
        assert_eq!(got[0].award_type, AwardType::Director);
        assert_eq!(got[0].award_name, "Golden Globe Awards");
        assert_eq!(got[0].person_name.as_deref(), Some("Francis Ford Coppola"));
        assert_eq!(got[0].year, 1975);
    }

    #[test]
    fn parses_cannes_fixture() {
        let lex = Lexicon::default();
        let raw = mention(&fixture("cannes_palme.txt"), 3, 2019);
        let got = parse_mention(&lex, &raw);

        assert_eq!(got.len(), 1);
        assert_eq!(got[0].award_type, AwardType::Movie);
        assert_eq!(got[0].award_name, "Cannes Film Festival");
        assert_eq!(got[0].year, 2019);
    }
}
