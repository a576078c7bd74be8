//! Keyword tables that drive award classification.
//!
//! Everything here is data, no logic beyond lookups. The tables cover the
//! major film awards we recognize, the category phrases that mark a mention
//! as movie-, director-, or actor-level, and the ceremony calendar used to
//! turn a release year into an award year.

/// One recognized award plus the alias keywords that identify it in raw text.
#[derive(Debug, Clone, Copy)]
pub struct AwardDef {
    /// Canonical name stored in the database.
    pub name: &'static str,
    /// Case-insensitive substrings that mark a mention as this award.
    pub aliases: &'static [&'static str],
    /// Years between a film's release and its ceremony. Festivals award in
    /// the release year, season awards the year after.
    pub year_offset: i32,
}

impl AwardDef {
    /// Award year for a film released in `release_year`.
    pub fn ceremony_year(&self, release_year: i32) -> i32 {
        release_year + self.year_offset
    }
}

const AWARDS: &[AwardDef] = &[
    AwardDef {
        name: "Academy Awards",
        aliases: &["academy award", "oscar"],
        year_offset: 1,
    },
    AwardDef {
        name: "Golden Globe Awards",
        aliases: &["golden globe"],
        year_offset: 1,
    },
    AwardDef {
        name: "BAFTA Awards",
        aliases: &["bafta", "british academy"],
        year_offset: 1,
    },
    AwardDef {
        name: "Screen Actors Guild Awards",
        aliases: &["screen actors guild", "sag award"],
        year_offset: 1,
    },
    AwardDef {
        name: "Critics Choice Awards",
        aliases: &["critics choice", "critics' choice"],
        year_offset: 1,
    },
    AwardDef {
        name: "Cannes Film Festival",
        aliases: &["cannes", "palme d'or"],
        year_offset: 0,
    },
    AwardDef {
        name: "Venice International Film Festival",
        aliases: &["venice", "golden lion"],
        year_offset: 0,
    },
    AwardDef {
        name: "Berlin International Film Festival",
        aliases: &["berlin", "berlinale", "golden bear"],
        year_offset: 0,
    },
    AwardDef {
        name: "Independent Spirit Awards",
        aliases: &["independent spirit"],
        year_offset: 1,
    },
];

// Category phrases checked against the extracted category plus the full
// mention text. A hit on any set emits a candidate of that type, so one
// mention can produce several candidates.
const MOVIE_CATEGORIES: &[&str] = &[
    "best picture",
    "best film",
    "best motion picture",
    "best movie",
    "outstanding picture",
    "best cinematography",
    "best editing",
    "best sound",
    "best music",
    "best score",
    "best song",
    "best visual effects",
    "best production design",
    "best costume design",
    "best makeup",
    "best documentary",
    "palme d'or",
    "golden lion",
    "golden bear",
];

const DIRECTOR_CATEGORIES: &[&str] = &[
    "best director",
    "best directing",
    "outstanding directing",
];

const ACTOR_CATEGORIES: &[&str] = &[
    "best actor",
    "best actress",
    "best supporting actor",
    "best supporting actress",
    "outstanding performance",
    "best male lead",
    "best female lead",
    "best male supporting",
    "best female supporting",
];

// Looser cues used only when no category phrase matched but a person name
// was extracted. Checked against the free text.
const DIRECTOR_CUES: &[&str] = &["director", "directing", "direction"];

const ACTOR_CUES: &[&str] = &["actor", "actress", "performance", "leading", "supporting"];

/// Immutable keyword tables shared by the extraction pipeline.
#[derive(Debug, Clone, Copy)]
pub struct Lexicon {
    pub awards: &'static [AwardDef],
    pub movie_categories: &'static [&'static str],
    pub director_categories: &'static [&'static str],
    pub actor_categories: &'static [&'static str],
    pub director_cues: &'static [&'static str],
    pub actor_cues: &'static [&'static str],
}

impl Default for Lexicon {
    fn default() -> Self {
        Lexicon {
            awards: AWARDS,
            movie_categories: MOVIE_CATEGORIES,
            director_categories: DIRECTOR_CATEGORIES,
            actor_categories: ACTOR_CATEGORIES,
            director_cues: DIRECTOR_CUES,
            actor_cues: ACTOR_CUES,
        }
    }
}

impl Lexicon {
    /// Canonical award name for a mention, or None when no alias matches.
    /// Table order decides ties, so "Academy Award and Golden Globe winner"
    /// resolves to the Academy Awards.
    pub fn match_award(&self, lower_text: &str) -> Option<&'static str> {
        self.awards
            .iter()
            .find(|a| a.aliases.iter().any(|alias| lower_text.contains(alias)))
            .map(|a| a.name)
    }

    /// Definition for a canonical award name.
    pub fn award(&self, name: &str) -> Option<&'static AwardDef> {
        self.awards.iter().find(|a| a.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_award_by_alias() {
        let lex = Lexicon::default();
        assert_eq!(
            lex.match_award("winner of the oscar for best picture"),
            Some("Academy Awards")
        );
        assert_eq!(
            lex.match_award("palme d'or winner at cannes"),
            Some("Cannes Film Festival")
        );
        assert_eq!(
            lex.match_award("won the golden bear"),
            Some("Berlin International Film Festival")
        );
    }

    #[test]
    fn first_table_entry_wins_on_multiple_aliases() {
        let lex = Lexicon::default();
        assert_eq!(
            lex.match_award("academy award and golden globe winner"),
            Some("Academy Awards")
        );
    }

    #[test]
    fn no_alias_no_award() {
        let lex = Lexicon::default();
        assert_eq!(lex.match_award("a critically acclaimed film"), None);
    }

    #[test]
    fn ceremony_year_applies_offset() {
        let lex = Lexicon::default();
        let oscars = lex.award("Academy Awards").unwrap();
        assert_eq!(oscars.ceremony_year(1972), 1973);

        let cannes = lex.award("Cannes Film Festival").unwrap();
        assert_eq!(cannes.ceremony_year(2019), 2019);
    }

    #[test]
    fn every_award_has_aliases() {
        for award in Lexicon::default().awards {
            assert!(!award.aliases.is_empty(), "{} has no aliases", award.name);
            assert!((0..=1).contains(&award.year_offset));
        }
    }
}
