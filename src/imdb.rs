//! IMDb mention source: resolve a film to its title page through the find
//! page, fetch the awards page, and queue the award-section fragments worth
//! parsing.

use std::sync::LazyLock;
use std::time::Duration;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use regex::Regex;
use reqwest::{Client, StatusCode, Url};
use rusqlite::Connection;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, warn};

use crate::db::{self, MovieToScrape};

const FIND_URL: &str = "https://www.imdb.com/find/";
const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:129.0) Gecko/20100101 Firefox/129.0";
const REQUEST_TIMEOUT_SECS: u64 = 20;
const MAX_RETRIES: u32 = 3;
const BASE_BACKOFF_MS: u64 = 2000;
/// Pause between movies. IMDb tolerates far less traffic than TMDb.
const SCRAPE_DELAY_MS: u64 = 3000;

/// Only the top of the result list is worth checking.
const MAX_RESULTS: usize = 5;
/// Fragments shorter than this never carry a parseable award line.
const MIN_FRAGMENT_CHARS: usize = 20;
/// A fragment counts as a mention only when it signals an actual win.
const WINNER_INDICATORS: &[&str] = &["winner", "won", "awarded", "recipient"];

// Find-page result containers, current layout first, legacy ones after.
const RESULT_SELECTORS: &[&str] = &[
    ".ipc-metadata-list-summary-item",
    "li[data-testid='find-result']",
    ".findResult",
    ".titleColumn",
];

// Awards-page section containers, same fallback idea.
const AWARD_SELECTORS: &[&str] = &[
    ".event",
    ".awards-event",
    ".titleAwardsSection",
    "[data-testid='awards-section']",
    ".ipc-metadata-list-summary-item",
];

static PAREN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*\([^)]*\)\s*").unwrap());
static ARTICLE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^(the|a|an)\s+").unwrap());
static NON_WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s]").unwrap());
static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

pub struct ImdbClient {
    http: Client,
}

impl ImdbClient {
    pub fn new() -> Result<Self> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to build IMDb HTTP client")?;
        Ok(ImdbClient { http })
    }

    /// GET with exponential backoff on 429 and 5xx responses.
    async fn fetch_with_retry(&self, url: &Url) -> Result<String> {
        for attempt in 0..=MAX_RETRIES {
            match self.http.get(url.clone()).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return Ok(response.text().await?);
                    }
                    let retryable =
                        status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error();
                    if !retryable || attempt == MAX_RETRIES {
                        anyhow::bail!("GET {} returned {}", url, status);
                    }
                }
                Err(e) => {
                    if attempt == MAX_RETRIES {
                        return Err(e).with_context(|| format!("GET {} failed", url));
                    }
                }
            }
            let backoff = Duration::from_millis(BASE_BACKOFF_MS * 2u64.pow(attempt));
            warn!(
                "Retrying {} (attempt {}/{}), backing off {:.1}s",
                url,
                attempt + 1,
                MAX_RETRIES,
                backoff.as_secs_f64()
            );
            tokio::time::sleep(backoff).await;
        }
        anyhow::bail!("GET {} exhausted retries", url)
    }

    /// Resolve (title, year) to a title-page URL via the find page. Tries
    /// the plain query, a cleaned title, then a year-first query.
    pub async fn find_title_url(&self, title: &str, year: i32) -> Result<Option<String>> {
        for url in find_urls(title, year)? {
            let html = self.fetch_with_retry(&url).await?;
            if let Some(found) = extract_title_url(&html, year) {
                debug!("Title page for '{}' ({}): {}", title, year, found);
                return Ok(Some(found));
            }
        }
        Ok(None)
    }

    /// Award-section text fragments from a film's awards page.
    pub async fn fetch_award_fragments(&self, title_url: &str) -> Result<Vec<String>> {
        let awards_url = if title_url.ends_with('/') {
            format!("{}awards/", title_url)
        } else {
            format!("{}/awards/", title_url)
        };
        let url = Url::parse(&awards_url)?;
        let html = self.fetch_with_retry(&url).await?;
        Ok(extract_award_fragments(&html))
    }
}

/// Scrape stats returned after completion.
pub struct ScrapeStats {
    pub total: usize,
    pub ok: usize,
    pub errors: usize,
    pub mentions: usize,
}

/// Scrape each movie's awards page, queueing mentions as they land. Runs
/// sequentially with a polite delay. A failed movie is logged and marked so
/// it cannot wedge the queue.
pub async fn scrape_awards(
    conn: &Connection,
    client: &ImdbClient,
    movies: Vec<MovieToScrape>,
) -> Result<ScrapeStats> {
    let mut stats = ScrapeStats {
        total: movies.len(),
        ok: 0,
        errors: 0,
        mentions: 0,
    };

    let pb = ProgressBar::new(stats.total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")?
            .progress_chars("=> "),
    );

    for movie in movies {
        match scrape_one(conn, client, &movie).await {
            Ok(queued) => {
                stats.ok += 1;
                stats.mentions += queued;
            }
            Err(e) => {
                warn!(
                    "Scrape failed for {} ({}): {}",
                    movie.title, movie.release_year, e
                );
                stats.errors += 1;
            }
        }
        db::mark_movie_scraped(conn, movie.movie_id)?;
        pb.inc(1);
        tokio::time::sleep(Duration::from_millis(SCRAPE_DELAY_MS)).await;
    }

    pb.finish_and_clear();
    info!(
        "Scraped {} movies ({} ok, {} errors), queued {} mentions",
        stats.total, stats.ok, stats.errors, stats.mentions
    );
    Ok(stats)
}

async fn scrape_one(
    conn: &Connection,
    client: &ImdbClient,
    movie: &MovieToScrape,
) -> Result<usize> {
    let Some(title_url) = client
        .find_title_url(&movie.title, movie.release_year)
        .await?
    else {
        debug!("No IMDb title page for {} ({})", movie.title, movie.release_year);
        return Ok(0);
    };
    let fragments = client.fetch_award_fragments(&title_url).await?;
    if fragments.is_empty() {
        return Ok(0);
    }
    db::insert_mentions(
        conn,
        movie.movie_id,
        &title_url,
        &fragments,
        movie.release_year,
    )
}

fn find_urls(title: &str, year: i32) -> Result<Vec<Url>> {
    let mut urls = vec![find_url(&format!("{} {}", title, year), true)?];
    let cleaned = clean_title(title);
    if cleaned != title {
        urls.push(find_url(&format!("{} {}", cleaned, year), true)?);
    }
    urls.push(find_url(&format!("{} {}", year, title), false)?);
    Ok(urls)
}

fn find_url(query: &str, film_only: bool) -> Result<Url> {
    let mut params = vec![("q", query), ("s", "tt")];
    if film_only {
        params.push(("ttype", "ft"));
    }
    Ok(Url::parse_with_params(FIND_URL, &params)?)
}

/// Strip parentheticals, a leading article, and punctuation; collapse runs.
/// Helps when the stored title carries qualifiers IMDb search chokes on.
fn clean_title(title: &str) -> String {
    let t = PAREN_RE.replace_all(title, " ");
    let t = ARTICLE_RE.replace(&t, "");
    let t = NON_WORD_RE.replace_all(&t, " ");
    WS_RE.replace_all(&t, " ").trim().to_string()
}

/// Pull a title-page URL out of find-page HTML. The current page embeds the
/// result list as JSON; the CSS route covers older layouts.
fn extract_title_url(html: &str, year: i32) -> Option<String> {
    let doc = Html::parse_document(html);
    title_url_from_next_data(&doc, year).or_else(|| title_url_from_results(&doc, year))
}

fn title_url_from_next_data(doc: &Html, year: i32) -> Option<String> {
    let sel = Selector::parse("script#__NEXT_DATA__").ok()?;
    let raw = doc.select(&sel).next()?.text().collect::<String>();
    let data: serde_json::Value = serde_json::from_str(&raw).ok()?;

    let results = data
        .get("props")?
        .get("pageProps")?
        .get("titleResults")?
        .get("results")?
        .as_array()?;

    let year_text = year.to_string();
    for result in results.iter().take(MAX_RESULTS) {
        let year_matches = result
            .get("titleReleaseText")
            .and_then(|v| v.as_str())
            .is_some_and(|t| t.contains(&year_text));
        if !year_matches {
            continue;
        }
        if let Some(id) = result.get("id").and_then(|v| v.as_str()) {
            if id.starts_with("tt") {
                return Some(format!("https://www.imdb.com/title/{}/", id));
            }
        }
    }
    None
}

fn title_url_from_results(doc: &Html, year: i32) -> Option<String> {
    let link_sel = Selector::parse("a[href*='/title/tt']").ok()?;
    let year_text = year.to_string();

    for selector in RESULT_SELECTORS {
        let Ok(sel) = Selector::parse(selector) else {
            continue;
        };
        for result in doc.select(&sel).take(MAX_RESULTS) {
            let text = result.text().collect::<Vec<_>>().join(" ");
            if !text.contains(&year_text) {
                continue;
            }
            let Some(link) = result.select(&link_sel).next() else {
                continue;
            };
            if let Some(url) = link.value().attr("href").and_then(normalize_title_href) {
                return Some(url);
            }
        }
    }
    None
}

/// Absolute, query-free title URL with a trailing slash, or None when the
/// href is not a title link at all.
fn normalize_title_href(href: &str) -> Option<String> {
    let path = href.split('?').next().unwrap_or(href);
    if !path.contains("/title/tt") {
        return None;
    }
    let mut url = if path.starts_with("http") {
        path.to_string()
    } else {
        format!("https://www.imdb.com{}", path)
    };
    if !url.ends_with('/') {
        url.push('/');
    }
    Some(url)
}

/// Award-section fragments: long enough to parse and carrying a winner
/// indicator. The first selector that yields anything wins; mixing layouts
/// would double-count sections.
fn extract_award_fragments(html: &str) -> Vec<String> {
    let doc = Html::parse_document(html);

    for selector in AWARD_SELECTORS {
        let Ok(sel) = Selector::parse(selector) else {
            continue;
        };
        let mut fragments = Vec::new();
        for section in doc.select(&sel) {
            let text = section_text(&section);
            if text.chars().count() <= MIN_FRAGMENT_CHARS {
                continue;
            }
            let lower = text.to_lowercase();
            if WINNER_INDICATORS.iter().any(|w| lower.contains(w)) {
                fragments.push(text);
            }
        }
        if !fragments.is_empty() {
            return fragments;
        }
    }
    Vec::new()
}

/// Section text with one line per text node, blanks dropped. Keeps the
/// line structure the mention parser leans on.
fn section_text(section: &ElementRef) -> String {
    section
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cleans_articles_and_punctuation() {
        assert_eq!(clean_title("The Matrix"), "Matrix");
        assert_eq!(clean_title("Godfather (1972 film)"), "Godfather");
        assert_eq!(clean_title("A Beautiful Mind"), "Beautiful Mind");
        assert_eq!(
            clean_title("The Lord of the Rings: The Return of the King"),
            "Lord of the Rings The Return of the King"
        );
    }

    #[test]
    fn clean_title_untouched_when_already_plain() {
        assert_eq!(clean_title("Parasite"), "Parasite");
    }

    #[test]
    fn builds_three_search_urls() {
        let urls = find_urls("The Matrix", 1999).unwrap();
        assert_eq!(urls.len(), 3);
        assert!(urls[0].as_str().contains("q=The+Matrix+1999"));
        assert!(urls[0].as_str().contains("ttype=ft"));
        assert!(urls[1].as_str().contains("q=Matrix+1999"));
        // Year-first query keeps every title type in play.
        assert!(urls[2].as_str().contains("q=1999+The+Matrix"));
        assert!(!urls[2].as_str().contains("ttype"));
    }

    #[test]
    fn two_urls_when_cleaning_changes_nothing() {
        let urls = find_urls("Parasite", 2019).unwrap();
        assert_eq!(urls.len(), 2);
    }

    #[test]
    fn normalizes_relative_title_href() {
        assert_eq!(
            normalize_title_href("/title/tt0068646/?ref_=fn_tt_tt_1").as_deref(),
            Some("https://www.imdb.com/title/tt0068646/")
        );
        assert_eq!(
            normalize_title_href("https://www.imdb.com/title/tt0071562").as_deref(),
            Some("https://www.imdb.com/title/tt0071562/")
        );
        assert_eq!(normalize_title_href("/name/nm0000338/"), None);
    }

    #[test]
    fn finds_title_in_embedded_json() {
        let html = r#"<html><body>
            <script id="__NEXT_DATA__" type="application/json">
            {"props":{"pageProps":{"titleResults":{"results":[
                {"id":"tt0111161","titleNameText":"The Shawshank Redemption","titleReleaseText":"1994"},
                {"id":"tt0068646","titleNameText":"The Godfather","titleReleaseText":"1972"}
            ]}}}}
            </script></body></html>"#;
        assert_eq!(
            extract_title_url(html, 1972).as_deref(),
            Some("https://www.imdb.com/title/tt0068646/")
        );
        assert_eq!(extract_title_url(html, 1980), None);
    }

    #[test]
    fn falls_back_to_result_markup() {
        let html = r#"<html><body><ul>
            <li class="ipc-metadata-list-summary-item">
                <a href="/title/tt0071562/?ref_=fn_t_1">The Godfather Part II</a>
                <span>1974</span>
            </li>
        </ul></body></html>"#;
        assert_eq!(
            extract_title_url(html, 1974).as_deref(),
            Some("https://www.imdb.com/title/tt0071562/")
        );
    }

    #[test]
    fn fragments_need_length_and_winner_indicator() {
        let html = r#"<html><body>
            <div class="event">Academy Awards 1975 Winner Best Picture The Godfather Part II</div>
            <div class="event">Won 1975</div>
            <div class="event">Academy Awards 1975 Nominee Best Sound for a long mix</div>
        </body></html>"#;
        let fragments = extract_award_fragments(html);
        assert_eq!(fragments.len(), 1);
        assert!(fragments[0].contains("Best Picture"));
    }

    #[test]
    fn fragment_text_keeps_line_structure() {
        let html = r#"<html><body>
            <div class="event">
                <h3>Academy Awards, USA</h3>
                <span>Winner</span>
                <span>Best Supporting Actor</span>
                <span>Robert De Niro</span>
            </div>
        </body></html>"#;
        let fragments = extract_award_fragments(html);
        assert_eq!(fragments.len(), 1);
        assert_eq!(
            fragments[0],
            "Academy Awards, USA\nWinner\nBest Supporting Actor\nRobert De Niro"
        );
    }

    #[test]
    fn no_fragments_from_barren_page() {
        assert!(extract_award_fragments("<html><body><p>No awards here</p></body></html>")
            .is_empty());
    }
}
