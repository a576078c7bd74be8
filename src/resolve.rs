//! Person resolution: extracted names → canonical people.
//!
//! Two paths. Mention-driven candidates resolve inside a movie's cast or
//! director list, where the scope is small enough for exact-then-partial
//! matching. Externally sourced names (curated winners) resolve against the
//! whole person table and must survive a birth-date cross-check before a
//! fuzzy name score is trusted.

use chrono::NaiveDate;
use strsim::normalized_levenshtein;

/// Fuzzy scores at or below this never produce a match.
pub const SIMILARITY_THRESHOLD: f64 = 0.85;

/// Which role table a movie-scoped lookup goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleType {
    Actor,
    Director,
}

/// A person holding a role on one specific movie. `role_id` is the actor or
/// director row, which is what award associations reference.
#[derive(Debug, Clone)]
pub struct RolePerson {
    pub person_id: i64,
    pub role_id: i64,
    pub first_name: String,
    pub last_name: String,
}

/// A canonical person with a known birth date.
#[derive(Debug, Clone)]
pub struct BirthPerson {
    pub person_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub birth_date: NaiveDate,
}

/// Movie-scoped resolution result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PersonMatch {
    pub person_id: i64,
    pub role_id: i64,
    pub similarity: f64,
}

/// Birth-date-verified resolution result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VerifiedPerson {
    pub person_id: i64,
    pub similarity: f64,
}

/// Case-insensitive name similarity in [0, 1].
pub fn similarity(a: &str, b: &str) -> f64 {
    normalized_levenshtein(&a.to_lowercase(), &b.to_lowercase())
}

/// Split "First [Middle ...] Last" into first name and the rest. A single
/// token becomes the first name with an empty last name.
pub fn split_name(name: &str) -> (String, String) {
    let mut parts = name.split_whitespace();
    let first = parts.next().unwrap_or("").to_string();
    let rest = parts.collect::<Vec<_>>().join(" ");
    (first, rest)
}

/// Resolve a name within one movie's cast or director list. Exact
/// case-insensitive match on both name parts first, then a substring match
/// on either part. First hit wins; the slice preserves billing order.
pub fn match_in_cast(name: &str, cast: &[RolePerson]) -> Option<PersonMatch> {
    let (first, last) = split_name(name);
    if first.is_empty() || last.is_empty() {
        return None;
    }
    let first = first.to_lowercase();
    let last = last.to_lowercase();

    let exact = cast.iter().find(|p| {
        p.first_name.to_lowercase() == first && p.last_name.to_lowercase() == last
    });
    let hit = exact.or_else(|| {
        cast.iter().find(|p| {
            p.first_name.to_lowercase().contains(&first)
                || p.last_name.to_lowercase().contains(&last)
        })
    })?;

    Some(PersonMatch {
        person_id: hit.person_id,
        role_id: hit.role_id,
        similarity: similarity(name, &format!("{} {}", hit.first_name, hit.last_name)),
    })
}

/// Resolve a name against the full person table, cross-verified by birth
/// date. Without an external birth date nothing can be verified, so there is
/// no match. An exact name-and-date hit short-circuits; otherwise the best
/// fuzzy score strictly above [`SIMILARITY_THRESHOLD`] wins, and only
/// candidates whose stored birth date equals the external one can advance
/// the running best. A perfect name score with a mismatched date loses.
pub fn match_by_birth_date(
    name: &str,
    birth_date: Option<NaiveDate>,
    people: &[BirthPerson],
) -> Option<VerifiedPerson> {
    let birth_date = birth_date?;

    let (first, last) = split_name(name);
    let first = first.to_lowercase();
    let last = last.to_lowercase();

    if let Some(p) = people.iter().find(|p| {
        p.birth_date == birth_date
            && p.first_name.to_lowercase() == first
            && p.last_name.to_lowercase() == last
    }) {
        return Some(VerifiedPerson {
            person_id: p.person_id,
            similarity: 1.0,
        });
    }

    let mut best: Option<VerifiedPerson> = None;
    let mut best_ratio = SIMILARITY_THRESHOLD;
    for p in people {
        let full_name = format!("{} {}", p.first_name, p.last_name);
        let ratio = similarity(name, &full_name);
        if ratio > best_ratio && p.birth_date == birth_date {
            best_ratio = ratio;
            best = Some(VerifiedPerson {
                person_id: p.person_id,
                similarity: ratio,
            });
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn role(person_id: i64, role_id: i64, first: &str, last: &str) -> RolePerson {
        RolePerson {
            person_id,
            role_id,
            first_name: first.to_string(),
            last_name: last.to_string(),
        }
    }

    fn person(person_id: i64, first: &str, last: &str, birth: NaiveDate) -> BirthPerson {
        BirthPerson {
            person_id,
            first_name: first.to_string(),
            last_name: last.to_string(),
            birth_date: birth,
        }
    }

    #[test]
    fn split_name_handles_middle_names() {
        assert_eq!(
            split_name("Francis Ford Coppola"),
            ("Francis".to_string(), "Ford Coppola".to_string())
        );
        assert_eq!(split_name("Cher"), ("Cher".to_string(), String::new()));
    }

    #[test]
    fn similarity_is_case_insensitive() {
        assert_eq!(similarity("Marlon Brando", "marlon brando"), 1.0);
        assert!(similarity("Marlon Brando", "Marlin Brando") > 0.9);
    }

    #[test]
    fn cast_exact_match_wins_over_partial() {
        let cast = vec![
            role(1, 10, "Al", "Pacino"),
            role(2, 20, "Alan", "Smithee"),
        ];
        let got = match_in_cast("Al Pacino", &cast).unwrap();
        assert_eq!(got.person_id, 1);
        assert_eq!(got.role_id, 10);
        assert_eq!(got.similarity, 1.0);
    }

    #[test]
    fn cast_partial_match_on_last_name() {
        let cast = vec![role(3, 30, "Robert", "De Niro")];
        let got = match_in_cast("Bob De Niro", &cast).unwrap();
        assert_eq!(got.person_id, 3);
    }

    #[test]
    fn cast_match_needs_two_name_parts() {
        let cast = vec![role(1, 10, "Al", "Pacino")];
        assert_eq!(match_in_cast("Pacino", &cast), None);
        assert_eq!(match_in_cast("", &cast), None);
    }

    #[test]
    fn cast_match_empty_cast() {
        assert_eq!(match_in_cast("Al Pacino", &[]), None);
    }

    #[test]
    fn birth_date_exact_match() {
        let d = date(1924, 4, 3);
        let people = vec![person(5, "Marlon", "Brando", d)];
        let got = match_by_birth_date("marlon brando", Some(d), &people).unwrap();
        assert_eq!(got.person_id, 5);
        assert_eq!(got.similarity, 1.0);
    }

    #[test]
    fn missing_external_birth_date_never_matches() {
        let people = vec![person(5, "Marlon", "Brando", date(1924, 4, 3))];
        assert_eq!(match_by_birth_date("Marlon Brando", None, &people), None);
    }

    #[test]
    fn perfect_name_with_wrong_date_is_rejected() {
        let people = vec![person(5, "Steven", "Spielberg", date(1946, 12, 18))];
        let got = match_by_birth_date(
            "Steven Spielberg",
            Some(date(1947, 12, 18)),
            &people,
        );
        assert_eq!(got, None);
    }

    #[test]
    fn fuzzy_match_above_threshold_with_matching_date() {
        let d = date(1946, 12, 18);
        let people = vec![person(5, "Steven", "Spielberg", d)];
        // One transposition-ish difference, ratio ~0.88.
        let got = match_by_birth_date("Stephen Spielberg", Some(d), &people).unwrap();
        assert_eq!(got.person_id, 5);
        assert!(got.similarity > SIMILARITY_THRESHOLD);
    }

    #[test]
    fn ratio_exactly_at_threshold_is_rejected() {
        let d = date(1950, 1, 1);
        // 20 chars, 3 substitutions: ratio is exactly 0.85.
        let people = vec![person(9, "Abcdefghi", "Klmnopqxxx", d)];
        let query = "Abcdefghi Klmnopqrst";
        assert!((similarity(query, "Abcdefghi Klmnopqxxx") - 0.85).abs() < 1e-9);
        assert_eq!(match_by_birth_date(query, Some(d), &people), None);
    }

    #[test]
    fn best_verified_ratio_wins() {
        let d = date(1946, 12, 18);
        let people = vec![
            person(1, "Stevan", "Spielberg", d),
            person(2, "Steven", "Spielberg", d),
        ];
        // Neither is exact for the query; the closer name must win even
        // though it is listed second.
        let got = match_by_birth_date("Stevens Spielberg", Some(d), &people).unwrap();
        assert_eq!(got.person_id, 2);
    }
}
