//! TMDb API client plus the seeding pass that fills the reference store:
//! movie rows, top-billed cast as actors with roles, directing crew as
//! directors, and person birth dates where TMDb knows them.

use std::sync::LazyLock;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use indicatif::{ProgressBar, ProgressStyle};
use regex::Regex;
use reqwest::Client;
use rusqlite::Connection;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::db::{self, MovieRow, PersonRow};
use crate::resolve;

const BASE_URL: &str = "https://api.themoviedb.org/3";
const REQUEST_TIMEOUT_SECS: u64 = 10;

// Discover window. Anything released outside it is skipped at validation
// too, since details sometimes disagree with the discover listing.
const RELEASE_DATE_GTE: &str = "1990-01-01";
const RELEASE_DATE_LTE: &str = "2025-12-31";
const MIN_RELEASE_YEAR: i32 = 1990;
const MAX_RELEASE_YEAR: i32 = 2025;

/// TMDb discover pages carry 20 results.
const DISCOVER_PAGE_SIZE: u64 = 20;
/// Billing cutoff: only the top of the cast list becomes actor rows.
const TOP_CAST: usize = 10;
/// Title similarity floor when matching search results.
const TITLE_MATCH_THRESHOLD: f64 = 0.8;
/// Pause between per-movie API bursts.
const SEED_DELAY_MS: u64 = 250;

static VALID_TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9 ,.':\-()&!?]+$").unwrap());
static VALID_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z .'\-]+$").unwrap());

pub struct TmdbClient {
    http: Client,
    api_key: String,
}

#[derive(Debug, Deserialize)]
pub struct DiscoverPage {
    #[serde(default)]
    pub results: Vec<MovieSummary>,
}

#[derive(Debug, Deserialize)]
pub struct MovieSummary {
    pub id: i64,
    pub title: Option<String>,
    pub release_date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MovieDetails {
    pub id: i64,
    pub title: Option<String>,
    pub release_date: Option<String>,
    pub vote_average: Option<f64>,
    pub vote_count: Option<i64>,
    pub popularity: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct Credits {
    #[serde(default)]
    pub cast: Vec<CastMember>,
    #[serde(default)]
    pub crew: Vec<CrewMember>,
}

#[derive(Debug, Deserialize)]
pub struct CastMember {
    pub id: i64,
    pub name: Option<String>,
    pub character: Option<String>,
    pub order: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CrewMember {
    pub id: i64,
    pub name: Option<String>,
    pub job: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PersonDetails {
    pub id: i64,
    pub name: Option<String>,
    pub birthday: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PersonSummary {
    pub id: i64,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PersonSearchPage {
    #[serde(default)]
    results: Vec<PersonSummary>,
}

impl TmdbClient {
    /// Build a client from the `TMDB_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("TMDB_API_KEY")
            .map_err(|_| anyhow::anyhow!("TMDB_API_KEY environment variable must be set"))?;
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to build TMDb HTTP client")?;
        Ok(TmdbClient { http, api_key })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T> {
        let url = format!("{}/{}", BASE_URL, path);
        let response = self
            .http
            .get(&url)
            .query(&[("api_key", self.api_key.as_str()), ("language", "en-US")])
            .query(query)
            .send()
            .await
            .with_context(|| format!("GET {} failed", path))?
            .error_for_status()
            .with_context(|| format!("GET {} returned an error status", path))?;
        Ok(response.json::<T>().await?)
    }

    /// One page of popular movies in the release window.
    pub async fn discover_movies(&self, page: i32) -> Result<DiscoverPage> {
        let page = page.to_string();
        self.get(
            "discover/movie",
            &[
                ("sort_by", "popularity.desc"),
                ("include_adult", "false"),
                ("include_video", "false"),
                ("primary_release_date.gte", RELEASE_DATE_GTE),
                ("primary_release_date.lte", RELEASE_DATE_LTE),
                ("page", &page),
            ],
        )
        .await
    }

    pub async fn movie_details(&self, movie_id: i64) -> Result<MovieDetails> {
        self.get(&format!("movie/{}", movie_id), &[]).await
    }

    pub async fn movie_credits(&self, movie_id: i64) -> Result<Credits> {
        self.get(&format!("movie/{}/credits", movie_id), &[]).await
    }

    pub async fn person_details(&self, person_id: i64) -> Result<PersonDetails> {
        self.get(&format!("person/{}", person_id), &[]).await
    }

    /// First (most relevant) search hit for a person name.
    pub async fn search_person(&self, name: &str) -> Result<Option<PersonSummary>> {
        let page: PersonSearchPage = self.get("search/person", &[("query", name)]).await?;
        Ok(page.results.into_iter().next())
    }

    /// Best search hit for a title: release year must match and the title
    /// similarity must clear the floor. Ties go to the higher score.
    pub async fn search_movie(&self, title: &str, year: i32) -> Result<Option<MovieSummary>> {
        let year_param = year.to_string();
        let page: DiscoverPage = self
            .get(
                "search/movie",
                &[("query", title), ("year", &year_param)],
            )
            .await?;

        let mut best: Option<MovieSummary> = None;
        let mut best_score = TITLE_MATCH_THRESHOLD;
        for movie in page.results {
            if release_year(movie.release_date.as_deref()) != Some(year) {
                continue;
            }
            let Some(found) = movie.title.as_deref() else {
                continue;
            };
            let score = resolve::similarity(title, found);
            if score > best_score {
                best_score = score;
                best = Some(movie);
            }
        }
        Ok(best)
    }

    /// Birth date for a person when TMDb has one. Missing or unparseable
    /// birthdays come back as None, never a guess.
    pub async fn person_birthday(&self, person_id: i64) -> Result<Option<NaiveDate>> {
        let details = self.person_details(person_id).await?;
        Ok(details.birthday.as_deref().and_then(parse_date))
    }
}

/// Counters for one seeding run.
#[derive(Default)]
pub struct SeedStats {
    pub movies: usize,
    pub skipped: usize,
    pub persons: usize,
}

/// Pull `pages` of popular movies into the reference store.
pub async fn seed_movies(conn: &Connection, client: &TmdbClient, pages: i32) -> Result<SeedStats> {
    let mut stats = SeedStats::default();

    let pb = ProgressBar::new(pages.max(0) as u64 * DISCOVER_PAGE_SIZE);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")?
            .progress_chars("=> "),
    );

    for page in 1..=pages {
        let discovered = client.discover_movies(page).await?;
        if discovered.results.is_empty() {
            info!("Discover page {} is empty, stopping early", page);
            break;
        }

        for summary in discovered.results {
            if let Err(e) = seed_one_movie(conn, client, summary.id, &mut stats).await {
                warn!("Seeding movie {} failed: {}", summary.id, e);
                stats.skipped += 1;
            }
            pb.inc(1);
            tokio::time::sleep(Duration::from_millis(SEED_DELAY_MS)).await;
        }
    }

    pb.finish_and_clear();
    info!(
        "Seeded {} movies, {} new people ({} skipped)",
        stats.movies, stats.persons, stats.skipped
    );
    Ok(stats)
}

async fn seed_one_movie(
    conn: &Connection,
    client: &TmdbClient,
    movie_id: i64,
    stats: &mut SeedStats,
) -> Result<()> {
    let details = client.movie_details(movie_id).await?;
    let Some(movie) = validate_movie(&details) else {
        debug!("Skipping movie {}: failed validation", movie_id);
        stats.skipped += 1;
        return Ok(());
    };
    db::upsert_movie(conn, &movie)?;
    stats.movies += 1;

    seed_credits(conn, client, movie.movie_id, stats).await
}

/// Pull one curated title into the store, bypassing the discover window
/// (most curated winners predate it). Returns the movie id when TMDb has a
/// match for (title, year).
pub async fn ingest_known_movie(
    conn: &Connection,
    client: &TmdbClient,
    title: &str,
    year: i32,
) -> Result<Option<i64>> {
    let Some(hit) = client.search_movie(title, year).await? else {
        return Ok(None);
    };
    let details = client.movie_details(hit.id).await?;
    let Some(movie) = movie_row(&details) else {
        return Ok(None);
    };
    db::upsert_movie(conn, &movie)?;

    let mut stats = SeedStats::default();
    seed_credits(conn, client, movie.movie_id, &mut stats).await?;
    info!(
        "Ingested {} ({}) with {} new people",
        movie.title, year, stats.persons
    );
    Ok(Some(movie.movie_id))
}

/// Store the top-billed cast as actors with roles and the directing crew as
/// directors for an already-inserted movie.
async fn seed_credits(
    conn: &Connection,
    client: &TmdbClient,
    movie_id: i64,
    stats: &mut SeedStats,
) -> Result<()> {
    let credits = client.movie_credits(movie_id).await?;

    for member in credits.cast.iter().take(TOP_CAST) {
        let Some(name) = member.name.as_deref() else {
            continue;
        };
        if !valid_person_name(name) {
            continue;
        }
        seed_person(conn, client, member.id, name, stats).await?;
        let actor_id = db::ensure_actor(conn, member.id)?;
        let character = member.character.as_deref().filter(|c| !c.trim().is_empty());
        db::ensure_role(conn, movie_id, actor_id, character, member.order.unwrap_or(0))?;
    }

    for member in &credits.crew {
        if !member
            .job
            .as_deref()
            .is_some_and(|j| j.eq_ignore_ascii_case("director"))
        {
            continue;
        }
        let Some(name) = member.name.as_deref() else {
            continue;
        };
        if !valid_person_name(name) {
            continue;
        }
        seed_person(conn, client, member.id, name, stats).await?;
        let director_id = db::ensure_director(conn, member.id)?;
        db::ensure_movie_director(conn, movie_id, director_id)?;
    }

    Ok(())
}

/// Insert a person row, fetching their birthday first unless the person is
/// already stored. A failed details call degrades to a dateless row.
async fn seed_person(
    conn: &Connection,
    client: &TmdbClient,
    person_id: i64,
    name: &str,
    stats: &mut SeedStats,
) -> Result<()> {
    if db::person_exists(conn, person_id)? {
        return Ok(());
    }
    let birth_date = match client.person_birthday(person_id).await {
        Ok(date) => date,
        Err(e) => {
            debug!("No details for person {} ({}): {}", person_id, name, e);
            None
        }
    };
    let (first_name, last_name) = resolve::split_name(name);
    db::ensure_person(
        conn,
        &PersonRow {
            person_id,
            first_name,
            last_name,
            birth_date,
        },
    )?;
    stats.persons += 1;
    Ok(())
}

/// Movie row from details when the title and release year are usable.
fn movie_row(details: &MovieDetails) -> Option<MovieRow> {
    let title = details.title.as_deref()?.trim();
    if title.is_empty() {
        return None;
    }
    let release = details.release_date.as_deref()?;
    let year = release_year(Some(release))?;
    Some(MovieRow {
        movie_id: details.id,
        title: title.to_string(),
        release_date: parse_date(release),
        release_year: Some(year),
        rating: details.vote_average,
        votes: details.vote_count,
        popularity: details.popularity,
    })
}

/// Seed-path validation on top of [`movie_row`]: title charset and the
/// release-year window.
fn validate_movie(details: &MovieDetails) -> Option<MovieRow> {
    let movie = movie_row(details)?;
    if !VALID_TITLE_RE.is_match(&movie.title) {
        return None;
    }
    if !movie
        .release_year
        .is_some_and(|y| (MIN_RELEASE_YEAR..=MAX_RELEASE_YEAR).contains(&y))
    {
        return None;
    }
    Some(movie)
}

fn valid_person_name(name: &str) -> bool {
    let trimmed = name.trim();
    !trimmed.is_empty() && VALID_NAME_RE.is_match(trimmed)
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

fn release_year(date: Option<&str>) -> Option<i32> {
    date?.get(..4)?.parse().ok()
}
