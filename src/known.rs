//! Curated known winners, written through the same dedup gate as scraped
//! mentions. Person entries only land when TMDb's birthday for the name
//! matches a stored person; an unverifiable name is skipped, never guessed.

use anyhow::Result;
use rusqlite::Connection;
use tracing::{info, warn};

use crate::db::{self, GateOutcome};
use crate::lexicon::Lexicon;
use crate::parser::AwardType;
use crate::resolve;
use crate::tmdb::{self, TmdbClient};

/// One curated award line for a film.
struct KnownAward {
    award: &'static str,
    category: &'static str,
    kind: AwardType,
    person: Option<&'static str>,
}

/// A film and the major awards it is known to have won.
struct KnownEntry {
    title: &'static str,
    year: i32,
    awards: &'static [KnownAward],
}

const KNOWN_WINNERS: &[KnownEntry] = &[
    KnownEntry {
        title: "The Godfather",
        year: 1972,
        awards: &[
            KnownAward {
                award: "Academy Awards",
                category: "Best Picture",
                kind: AwardType::Movie,
                person: None,
            },
            KnownAward {
                award: "Academy Awards",
                category: "Best Actor",
                kind: AwardType::Actor,
                person: Some("Marlon Brando"),
            },
            KnownAward {
                award: "Academy Awards",
                category: "Best Adapted Screenplay",
                kind: AwardType::Movie,
                person: None,
            },
        ],
    },
    KnownEntry {
        title: "The Godfather Part II",
        year: 1974,
        awards: &[
            KnownAward {
                award: "Academy Awards",
                category: "Best Picture",
                kind: AwardType::Movie,
                person: None,
            },
            KnownAward {
                award: "Academy Awards",
                category: "Best Director",
                kind: AwardType::Director,
                person: Some("Francis Ford Coppola"),
            },
        ],
    },
    KnownEntry {
        title: "Casablanca",
        year: 1942,
        awards: &[
            KnownAward {
                award: "Academy Awards",
                category: "Best Picture",
                kind: AwardType::Movie,
                person: None,
            },
            KnownAward {
                award: "Academy Awards",
                category: "Best Director",
                kind: AwardType::Director,
                person: Some("Michael Curtiz"),
            },
        ],
    },
    KnownEntry {
        title: "Schindler's List",
        year: 1993,
        awards: &[
            KnownAward {
                award: "Academy Awards",
                category: "Best Picture",
                kind: AwardType::Movie,
                person: None,
            },
            KnownAward {
                award: "Academy Awards",
                category: "Best Director",
                kind: AwardType::Director,
                person: Some("Steven Spielberg"),
            },
        ],
    },
];

/// Counters for one backfill run.
pub struct BackfillStats {
    pub applied: usize,
    pub duplicates: usize,
    pub skipped: usize,
}

/// Write every curated entry through the gate. Films missing from the store
/// are pulled from TMDb first; most curated winners predate the seed window.
pub async fn backfill_known_winners(
    conn: &Connection,
    client: &TmdbClient,
) -> Result<BackfillStats> {
    let lexicon = Lexicon::default();
    let mut stats = BackfillStats {
        applied: 0,
        duplicates: 0,
        skipped: 0,
    };

    for entry in KNOWN_WINNERS {
        let movie_id = match db::find_movie_by_title_year(conn, entry.title, entry.year)? {
            Some(id) => id,
            None => match tmdb::ingest_known_movie(conn, client, entry.title, entry.year).await? {
                Some(id) => id,
                None => {
                    warn!(
                        "No TMDb match for known winner {} ({})",
                        entry.title, entry.year
                    );
                    stats.skipped += entry.awards.len();
                    continue;
                }
            },
        };

        for known in entry.awards {
            match apply_award(conn, client, &lexicon, movie_id, entry.year, known).await? {
                Some(GateOutcome::Inserted) => {
                    info!(
                        "Backfilled {} {} for {} ({})",
                        known.award, known.category, entry.title, entry.year
                    );
                    stats.applied += 1;
                }
                Some(GateOutcome::Duplicate) => stats.duplicates += 1,
                None => stats.skipped += 1,
            }
        }
    }

    info!(
        "Known winners: {} applied, {} duplicates, {} skipped",
        stats.applied, stats.duplicates, stats.skipped
    );
    Ok(stats)
}

async fn apply_award(
    conn: &Connection,
    client: &TmdbClient,
    lexicon: &Lexicon,
    movie_id: i64,
    release_year: i32,
    known: &KnownAward,
) -> Result<Option<GateOutcome>> {
    let Some(def) = lexicon.award(known.award) else {
        warn!("Curated award not in the lexicon: {}", known.award);
        return Ok(None);
    };
    let award_year = def.ceremony_year(release_year);

    match known.kind {
        AwardType::Movie => {
            let award_id = db::get_or_create_award(conn, known.award, award_year)?;
            Ok(Some(db::insert_movie_award(
                conn,
                award_id,
                movie_id,
                known.category,
            )?))
        }
        AwardType::Director => {
            let Some(person_id) = verified_person(conn, client, known.person).await? else {
                return Ok(None);
            };
            let Some(director_id) = db::director_id_for_person(conn, person_id)? else {
                warn!("Person {} is not stored as a director", person_id);
                return Ok(None);
            };
            let award_id = db::get_or_create_award(conn, known.award, award_year)?;
            Ok(Some(db::insert_director_award(
                conn,
                award_id,
                director_id,
                movie_id,
                known.category,
            )?))
        }
        AwardType::Actor => {
            let Some(person_id) = verified_person(conn, client, known.person).await? else {
                return Ok(None);
            };
            let Some(actor_id) = db::actor_id_for_person(conn, person_id)? else {
                warn!("Person {} is not stored as an actor", person_id);
                return Ok(None);
            };
            let award_id = db::get_or_create_award(conn, known.award, award_year)?;
            Ok(Some(db::insert_actor_award(
                conn,
                award_id,
                actor_id,
                movie_id,
                known.category,
            )?))
        }
    }
}

/// TMDb person search → birthday → birth-date-verified match against the
/// store. Any missing link in the chain means no person.
async fn verified_person(
    conn: &Connection,
    client: &TmdbClient,
    name: Option<&'static str>,
) -> Result<Option<i64>> {
    let Some(name) = name else {
        return Ok(None);
    };
    let Some(hit) = client.search_person(name).await? else {
        warn!("TMDb has no result for known winner '{}'", name);
        return Ok(None);
    };
    let birthday = client.person_birthday(hit.id).await?;
    let people = db::persons_with_birth_date(conn)?;
    let Some(verified) = resolve::match_by_birth_date(name, birthday, &people) else {
        warn!("No birth-date-verified match for known winner '{}'", name);
        return Ok(None);
    };
    info!(
        "Verified '{}' as person {} (similarity {:.2})",
        name, verified.person_id, verified.similarity
    );
    Ok(Some(verified.person_id))
}
