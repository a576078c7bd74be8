use anyhow::Result;
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use crate::parser::category::UNKNOWN_CATEGORY;
use crate::parser::{AwardType, ParsedCandidate, RawMention};
use crate::resolve::{self, BirthPerson, RolePerson, RoleType};

pub const DB_PATH: &str = "data/amdb.sqlite";

pub fn connect() -> Result<Connection> {
    if let Some(dir) = std::path::Path::new(DB_PATH).parent() {
        std::fs::create_dir_all(dir)?;
    }
    let conn = Connection::open(DB_PATH)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        -- Reference store: movies, people and their roles, seeded externally.
        CREATE TABLE IF NOT EXISTS movies (
            movie_id     INTEGER PRIMARY KEY,
            title        TEXT NOT NULL,
            release_date TEXT,
            release_year INTEGER,
            rating       REAL,
            votes        INTEGER,
            popularity   REAL,
            scraped_at   TEXT,
            created_at   TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_movies_year ON movies(release_year);

        CREATE TABLE IF NOT EXISTS persons (
            person_id  INTEGER PRIMARY KEY,
            first_name TEXT NOT NULL,
            last_name  TEXT NOT NULL DEFAULT '',
            birth_date TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_persons_birth ON persons(birth_date);

        CREATE TABLE IF NOT EXISTS actors (
            actor_id  INTEGER PRIMARY KEY,
            person_id INTEGER NOT NULL UNIQUE REFERENCES persons(person_id)
        );

        CREATE TABLE IF NOT EXISTS directors (
            director_id INTEGER PRIMARY KEY,
            person_id   INTEGER NOT NULL UNIQUE REFERENCES persons(person_id)
        );

        CREATE TABLE IF NOT EXISTS roles (
            role_id        INTEGER PRIMARY KEY,
            movie_id       INTEGER NOT NULL REFERENCES movies(movie_id),
            actor_id       INTEGER NOT NULL REFERENCES actors(actor_id),
            character_name TEXT,
            billing        INTEGER,
            UNIQUE(movie_id, actor_id)
        );
        CREATE INDEX IF NOT EXISTS idx_roles_movie ON roles(movie_id);

        CREATE TABLE IF NOT EXISTS movie_directors (
            movie_director_id INTEGER PRIMARY KEY,
            movie_id          INTEGER NOT NULL REFERENCES movies(movie_id),
            director_id       INTEGER NOT NULL REFERENCES directors(director_id),
            UNIQUE(movie_id, director_id)
        );
        CREATE INDEX IF NOT EXISTS idx_movie_directors_movie ON movie_directors(movie_id);

        -- Scraped award fragments, queued for parsing.
        CREATE TABLE IF NOT EXISTS mentions (
            mention_id   INTEGER PRIMARY KEY,
            movie_id     INTEGER NOT NULL REFERENCES movies(movie_id),
            source_url   TEXT,
            text         TEXT NOT NULL,
            context_year INTEGER NOT NULL,
            processed    BOOLEAN NOT NULL DEFAULT 0,
            scraped_at   TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_mentions_processed ON mentions(processed);

        -- Award identity and its three association tables. The unique
        -- indexes are the dedup gate: INSERT OR IGNORE against them makes
        -- re-processing idempotent.
        CREATE TABLE IF NOT EXISTS awards (
            award_id INTEGER PRIMARY KEY,
            name     TEXT NOT NULL COLLATE NOCASE,
            year     INTEGER NOT NULL,
            UNIQUE(name, year)
        );

        CREATE TABLE IF NOT EXISTS award_movies (
            award_movie_id INTEGER PRIMARY KEY,
            award_id       INTEGER NOT NULL REFERENCES awards(award_id),
            movie_id       INTEGER NOT NULL REFERENCES movies(movie_id),
            category       TEXT NOT NULL COLLATE NOCASE,
            UNIQUE(award_id, movie_id, category)
        );

        CREATE TABLE IF NOT EXISTS award_actors (
            award_actor_id INTEGER PRIMARY KEY,
            award_id       INTEGER NOT NULL REFERENCES awards(award_id),
            actor_id       INTEGER NOT NULL REFERENCES actors(actor_id),
            movie_id       INTEGER NOT NULL REFERENCES movies(movie_id),
            category       TEXT NOT NULL COLLATE NOCASE,
            UNIQUE(award_id, actor_id, movie_id, category)
        );

        CREATE TABLE IF NOT EXISTS award_directors (
            award_director_id INTEGER PRIMARY KEY,
            award_id          INTEGER NOT NULL REFERENCES awards(award_id),
            director_id       INTEGER NOT NULL REFERENCES directors(director_id),
            movie_id          INTEGER NOT NULL REFERENCES movies(movie_id),
            category          TEXT NOT NULL COLLATE NOCASE,
            UNIQUE(award_id, director_id, movie_id, category)
        );
        ",
    )?;
    Ok(())
}

// ── Reference store ──

pub struct MovieRow {
    pub movie_id: i64,
    pub title: String,
    pub release_date: Option<NaiveDate>,
    pub release_year: Option<i32>,
    pub rating: Option<f64>,
    pub votes: Option<i64>,
    pub popularity: Option<f64>,
}

pub fn upsert_movie(conn: &Connection, movie: &MovieRow) -> Result<()> {
    conn.execute(
        "INSERT INTO movies (movie_id, title, release_date, release_year, rating, votes, popularity)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(movie_id) DO UPDATE SET
             title = excluded.title,
             release_date = excluded.release_date,
             release_year = excluded.release_year,
             rating = excluded.rating,
             votes = excluded.votes,
             popularity = excluded.popularity",
        params![
            movie.movie_id,
            movie.title,
            movie.release_date,
            movie.release_year,
            movie.rating,
            movie.votes,
            movie.popularity,
        ],
    )?;
    Ok(())
}

pub struct PersonRow {
    pub person_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub birth_date: Option<NaiveDate>,
}

pub fn person_exists(conn: &Connection, person_id: i64) -> Result<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT person_id FROM persons WHERE person_id = ?1",
            params![person_id],
            |r| r.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

pub fn ensure_person(conn: &Connection, person: &PersonRow) -> Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO persons (person_id, first_name, last_name, birth_date)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            person.person_id,
            person.first_name,
            person.last_name,
            person.birth_date,
        ],
    )?;
    Ok(())
}

pub fn ensure_actor(conn: &Connection, person_id: i64) -> Result<i64> {
    conn.execute(
        "INSERT OR IGNORE INTO actors (person_id) VALUES (?1)",
        params![person_id],
    )?;
    let id = conn.query_row(
        "SELECT actor_id FROM actors WHERE person_id = ?1",
        params![person_id],
        |r| r.get(0),
    )?;
    Ok(id)
}

pub fn ensure_director(conn: &Connection, person_id: i64) -> Result<i64> {
    conn.execute(
        "INSERT OR IGNORE INTO directors (person_id) VALUES (?1)",
        params![person_id],
    )?;
    let id = conn.query_row(
        "SELECT director_id FROM directors WHERE person_id = ?1",
        params![person_id],
        |r| r.get(0),
    )?;
    Ok(id)
}

pub fn ensure_role(
    conn: &Connection,
    movie_id: i64,
    actor_id: i64,
    character_name: Option<&str>,
    billing: i64,
) -> Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO roles (movie_id, actor_id, character_name, billing)
         VALUES (?1, ?2, ?3, ?4)",
        params![movie_id, actor_id, character_name, billing],
    )?;
    Ok(())
}

pub fn ensure_movie_director(conn: &Connection, movie_id: i64, director_id: i64) -> Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO movie_directors (movie_id, director_id) VALUES (?1, ?2)",
        params![movie_id, director_id],
    )?;
    Ok(())
}

pub fn find_movie_by_title_year(conn: &Connection, title: &str, year: i32) -> Result<Option<i64>> {
    let id = conn
        .query_row(
            "SELECT movie_id FROM movies
             WHERE LOWER(title) = LOWER(?1) AND release_year = ?2
             ORDER BY movie_id LIMIT 1",
            params![title, year],
            |r| r.get(0),
        )
        .optional()?;
    Ok(id)
}

pub fn actor_id_for_person(conn: &Connection, person_id: i64) -> Result<Option<i64>> {
    let id = conn
        .query_row(
            "SELECT actor_id FROM actors WHERE person_id = ?1",
            params![person_id],
            |r| r.get(0),
        )
        .optional()?;
    Ok(id)
}

pub fn director_id_for_person(conn: &Connection, person_id: i64) -> Result<Option<i64>> {
    let id = conn
        .query_row(
            "SELECT director_id FROM directors WHERE person_id = ?1",
            params![person_id],
            |r| r.get(0),
        )
        .optional()?;
    Ok(id)
}

// ── Scraping queue ──

pub struct MovieToScrape {
    pub movie_id: i64,
    pub title: String,
    pub release_year: i32,
}

pub fn fetch_unscraped(
    conn: &Connection,
    limit: Option<usize>,
    notable_only: bool,
) -> Result<Vec<MovieToScrape>> {
    let mut sql = String::from(
        "SELECT movie_id, title, release_year
         FROM movies
         WHERE scraped_at IS NULL AND release_year IS NOT NULL",
    );
    if notable_only {
        // Heuristic filter: only movies likely to carry major awards.
        sql.push_str(
            " AND (rating > 7.5 OR (rating > 7.0 AND votes > 1000) OR popularity > 50)",
        );
    }
    sql.push_str(" ORDER BY popularity DESC, movie_id");
    if let Some(n) = limit {
        sql.push_str(&format!(" LIMIT {}", n));
    }

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], |row| {
            Ok(MovieToScrape {
                movie_id: row.get(0)?,
                title: row.get(1)?,
                release_year: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn insert_mentions(
    conn: &Connection,
    movie_id: i64,
    source_url: &str,
    fragments: &[String],
    context_year: i32,
) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;
    let mut count = 0;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO mentions (movie_id, source_url, text, context_year)
             VALUES (?1, ?2, ?3, ?4)",
        )?;
        for fragment in fragments {
            count += stmt.execute(params![movie_id, source_url, fragment, context_year])?;
        }
    }
    tx.commit()?;
    Ok(count)
}

pub fn mark_movie_scraped(conn: &Connection, movie_id: i64) -> Result<()> {
    conn.execute(
        "UPDATE movies SET scraped_at = datetime('now') WHERE movie_id = ?1",
        params![movie_id],
    )?;
    Ok(())
}

// ── Processing queue ──

pub struct MentionRow {
    pub mention_id: i64,
    pub mention: RawMention,
}

pub fn fetch_unprocessed(conn: &Connection, limit: Option<usize>) -> Result<Vec<MentionRow>> {
    let sql = format!(
        "SELECT mention_id, movie_id, text, context_year
         FROM mentions
         WHERE processed = 0
         ORDER BY mention_id{}",
        match limit {
            Some(n) => format!(" LIMIT {}", n),
            None => String::new(),
        }
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], |row| {
            Ok(MentionRow {
                mention_id: row.get(0)?,
                mention: RawMention {
                    movie_id: row.get(1)?,
                    text: row.get(2)?,
                    context_year: row.get(3)?,
                },
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn mark_mention_processed(conn: &Connection, mention_id: i64) -> Result<()> {
    conn.execute(
        "UPDATE mentions SET processed = 1 WHERE mention_id = ?1",
        params![mention_id],
    )?;
    Ok(())
}

// ── Resolution queries ──

/// People holding a given role on one movie, billing order first. The slice
/// feeds `resolve::match_in_cast`, so `role_id` is the actor or director row
/// an award association will reference.
pub fn persons_by_role(
    conn: &Connection,
    movie_id: i64,
    role: RoleType,
) -> Result<Vec<RolePerson>> {
    let sql = match role {
        RoleType::Actor => {
            "SELECT p.person_id, a.actor_id, p.first_name, p.last_name
             FROM roles r
             JOIN actors a ON a.actor_id = r.actor_id
             JOIN persons p ON p.person_id = a.person_id
             WHERE r.movie_id = ?1
             ORDER BY r.billing, r.role_id"
        }
        RoleType::Director => {
            "SELECT p.person_id, d.director_id, p.first_name, p.last_name
             FROM movie_directors md
             JOIN directors d ON d.director_id = md.director_id
             JOIN persons p ON p.person_id = d.person_id
             WHERE md.movie_id = ?1
             ORDER BY md.movie_director_id"
        }
    };
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params![movie_id], |row| {
            Ok(RolePerson {
                person_id: row.get(0)?,
                role_id: row.get(1)?,
                first_name: row.get(2)?,
                last_name: row.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Every person with a stored birth date, the candidate set for
/// birth-date-verified matching.
pub fn persons_with_birth_date(conn: &Connection) -> Result<Vec<BirthPerson>> {
    let mut stmt = conn.prepare(
        "SELECT person_id, first_name, last_name, birth_date
         FROM persons
         WHERE birth_date IS NOT NULL",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok(BirthPerson {
                person_id: row.get(0)?,
                first_name: row.get(1)?,
                last_name: row.get(2)?,
                birth_date: row.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ── Dedup gate ──

/// Whether the gate wrote a new association or found it already present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    Inserted,
    Duplicate,
}

impl GateOutcome {
    fn from_changes(changed: usize) -> Self {
        if changed == 0 {
            GateOutcome::Duplicate
        } else {
            GateOutcome::Inserted
        }
    }
}

pub fn find_award(conn: &Connection, name: &str, year: i32) -> Result<Option<i64>> {
    let id = conn
        .query_row(
            "SELECT award_id FROM awards WHERE name = ?1 AND year = ?2",
            params![name, year],
            |r| r.get(0),
        )
        .optional()?;
    Ok(id)
}

/// Reuse the award row for (name, year) or create it. The NOCASE unique
/// index makes a racing second insert a no-op, so the re-select always
/// lands on the same row.
pub fn get_or_create_award(conn: &Connection, name: &str, year: i32) -> Result<i64> {
    if let Some(id) = find_award(conn, name, year)? {
        return Ok(id);
    }
    conn.execute(
        "INSERT OR IGNORE INTO awards (name, year) VALUES (?1, ?2)",
        params![name, year],
    )?;
    find_award(conn, name, year)?
        .ok_or_else(|| anyhow::anyhow!("award ({name}, {year}) missing after insert"))
}

pub fn insert_movie_award(
    conn: &Connection,
    award_id: i64,
    movie_id: i64,
    category: &str,
) -> Result<GateOutcome> {
    let changed = conn.execute(
        "INSERT OR IGNORE INTO award_movies (award_id, movie_id, category)
         VALUES (?1, ?2, ?3)",
        params![award_id, movie_id, category],
    )?;
    Ok(GateOutcome::from_changes(changed))
}

pub fn insert_actor_award(
    conn: &Connection,
    award_id: i64,
    actor_id: i64,
    movie_id: i64,
    category: &str,
) -> Result<GateOutcome> {
    let changed = conn.execute(
        "INSERT OR IGNORE INTO award_actors (award_id, actor_id, movie_id, category)
         VALUES (?1, ?2, ?3, ?4)",
        params![award_id, actor_id, movie_id, category],
    )?;
    Ok(GateOutcome::from_changes(changed))
}

pub fn insert_director_award(
    conn: &Connection,
    award_id: i64,
    director_id: i64,
    movie_id: i64,
    category: &str,
) -> Result<GateOutcome> {
    let changed = conn.execute(
        "INSERT OR IGNORE INTO award_directors (award_id, director_id, movie_id, category)
         VALUES (?1, ?2, ?3, ?4)",
        params![award_id, director_id, movie_id, category],
    )?;
    Ok(GateOutcome::from_changes(changed))
}

/// Result of pushing one parsed candidate through resolution and the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Inserted,
    Duplicate,
    /// Person-typed candidate whose name did not resolve to anyone in the
    /// movie's cast or director list; dropped without writing anything.
    Unresolved,
}

/// Persist one candidate: resolve the honoree where the type needs one,
/// then write the association through the gate. Award rows are shared
/// across candidates via (name, year).
pub fn save_candidate(conn: &Connection, cand: &ParsedCandidate) -> Result<SaveOutcome> {
    let category = cand.category.as_deref().unwrap_or(UNKNOWN_CATEGORY);

    let gate = match cand.award_type {
        AwardType::Movie => {
            let award_id = get_or_create_award(conn, cand.award_name, cand.year)?;
            insert_movie_award(conn, award_id, cand.movie_id, category)?
        }
        AwardType::Director => {
            let Some(name) = cand.person_name.as_deref() else {
                return Ok(SaveOutcome::Unresolved);
            };
            let directors = persons_by_role(conn, cand.movie_id, RoleType::Director)?;
            let Some(m) = resolve::match_in_cast(name, &directors) else {
                debug!(
                    "no director match for '{}' on movie {}",
                    name, cand.movie_id
                );
                return Ok(SaveOutcome::Unresolved);
            };
            debug!(
                "resolved director '{}' -> person {} (similarity {:.2})",
                name, m.person_id, m.similarity
            );
            let award_id = get_or_create_award(conn, cand.award_name, cand.year)?;
            insert_director_award(conn, award_id, m.role_id, cand.movie_id, category)?
        }
        AwardType::Actor => {
            let Some(name) = cand.person_name.as_deref() else {
                return Ok(SaveOutcome::Unresolved);
            };
            let cast = persons_by_role(conn, cand.movie_id, RoleType::Actor)?;
            let Some(m) = resolve::match_in_cast(name, &cast) else {
                debug!("no actor match for '{}' on movie {}", name, cand.movie_id);
                return Ok(SaveOutcome::Unresolved);
            };
            debug!(
                "resolved actor '{}' -> person {} (similarity {:.2})",
                name, m.person_id, m.similarity
            );
            let award_id = get_or_create_award(conn, cand.award_name, cand.year)?;
            insert_actor_award(conn, award_id, m.role_id, cand.movie_id, category)?
        }
    };

    Ok(match gate {
        GateOutcome::Inserted => SaveOutcome::Inserted,
        GateOutcome::Duplicate => SaveOutcome::Duplicate,
    })
}

// ── Overview ──

pub struct AwardOverviewRow {
    pub award: String,
    pub year: i32,
    pub category: String,
    pub recipient: String,
    pub kind: String,
    pub movie: String,
}

pub fn fetch_award_overview(
    conn: &Connection,
    award: Option<&str>,
    year: Option<i32>,
    limit: usize,
) -> Result<Vec<AwardOverviewRow>> {
    let mut conditions = Vec::new();
    let mut params_vec: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

    if let Some(a) = award {
        conditions.push(format!("award LIKE ?{}", params_vec.len() + 1));
        params_vec.push(Box::new(format!("%{}%", a)));
    }
    if let Some(y) = year {
        conditions.push(format!("year = ?{}", params_vec.len() + 1));
        params_vec.push(Box::new(y));
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    };

    let sql = format!(
        "SELECT award, year, category, recipient, kind, movie FROM (
            SELECT a.name AS award, a.year AS year, am.category AS category,
                   m.title AS recipient, 'movie' AS kind, m.title AS movie
              FROM award_movies am
              JOIN awards a ON a.award_id = am.award_id
              JOIN movies m ON m.movie_id = am.movie_id
            UNION ALL
            SELECT a.name, a.year, aa.category,
                   TRIM(p.first_name || ' ' || p.last_name), 'actor', m.title
              FROM award_actors aa
              JOIN awards a ON a.award_id = aa.award_id
              JOIN actors ac ON ac.actor_id = aa.actor_id
              JOIN persons p ON p.person_id = ac.person_id
              JOIN movies m ON m.movie_id = aa.movie_id
            UNION ALL
            SELECT a.name, a.year, ad.category,
                   TRIM(p.first_name || ' ' || p.last_name), 'director', m.title
              FROM award_directors ad
              JOIN awards a ON a.award_id = ad.award_id
              JOIN directors d ON d.director_id = ad.director_id
              JOIN persons p ON p.person_id = d.person_id
              JOIN movies m ON m.movie_id = ad.movie_id
         ){}
         ORDER BY year, award, kind, recipient
         LIMIT {}",
        where_clause, limit
    );

    let mut stmt = conn.prepare(&sql)?;
    let param_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();
    let rows = stmt
        .query_map(param_refs.as_slice(), |row| {
            Ok(AwardOverviewRow {
                award: row.get(0)?,
                year: row.get(1)?,
                category: row.get(2)?,
                recipient: row.get(3)?,
                kind: row.get(4)?,
                movie: row.get(5)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ── Stats ──

pub struct Stats {
    pub movies: usize,
    pub scraped: usize,
    pub persons: usize,
    pub mentions: usize,
    pub unprocessed: usize,
    pub awards: usize,
    pub movie_awards: usize,
    pub actor_awards: usize,
    pub director_awards: usize,
}

pub fn get_stats(conn: &Connection) -> Result<Stats> {
    let count = |sql: &str| -> Result<usize> {
        Ok(conn.query_row(sql, [], |r| r.get(0))?)
    };
    Ok(Stats {
        movies: count("SELECT COUNT(*) FROM movies")?,
        scraped: count("SELECT COUNT(*) FROM movies WHERE scraped_at IS NOT NULL")?,
        persons: count("SELECT COUNT(*) FROM persons")?,
        mentions: count("SELECT COUNT(*) FROM mentions")?,
        unprocessed: count("SELECT COUNT(*) FROM mentions WHERE processed = 0")?,
        awards: count("SELECT COUNT(*) FROM awards")?,
        movie_awards: count("SELECT COUNT(*) FROM award_movies")?,
        actor_awards: count("SELECT COUNT(*) FROM award_actors")?,
        director_awards: count("SELECT COUNT(*) FROM award_directors")?,
    })
}
