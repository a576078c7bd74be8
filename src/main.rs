mod db;
mod imdb;
mod known;
mod lexicon;
mod parser;
mod resolve;
mod tmdb;

use std::time::Instant;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "award_scraper", about = "Film award extraction into the AMDB store")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database schema
    Init,
    /// Seed movies, people and roles from TMDb
    Seed {
        /// Discover pages to ingest (20 movies per page)
        #[arg(short = 'n', long, default_value = "5")]
        pages: i32,
    },
    /// Scrape IMDb award fragments for seeded movies
    Scrape {
        /// Max movies to scrape (default: all unscraped)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        /// Only movies whose rating or popularity suggests award wins
        #[arg(long)]
        notable: bool,
    },
    /// Parse queued mentions into award records
    Process {
        /// Max mentions to process (default: all unprocessed)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Scrape + process in one pipeline
    Run {
        /// Max movies to scrape+process
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        /// Only movies whose rating or popularity suggests award wins
        #[arg(long)]
        notable: bool,
    },
    /// Backfill curated known winners through birth-date verification
    Known,
    /// Show pipeline statistics
    Stats,
    /// Award records table
    Overview {
        /// Filter by award name substring (e.g. "academy")
        #[arg(short, long)]
        award: Option<String>,
        /// Filter by ceremony year
        #[arg(short, long)]
        year: Option<i32>,
        /// Max rows to display
        #[arg(short = 'n', long, default_value = "50")]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            println!("Schema ready at {}", db::DB_PATH);
            Ok(())
        }
        Commands::Seed { pages } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let client = tmdb::TmdbClient::from_env()?;
            println!("Seeding {} discover pages from TMDb...", pages);
            let stats = tmdb::seed_movies(&conn, &client, pages).await?;
            println!(
                "Done: {} movies, {} new people ({} skipped).",
                stats.movies, stats.persons, stats.skipped
            );
            Ok(())
        }
        Commands::Scrape { limit, notable } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let movies = db::fetch_unscraped(&conn, limit, notable)?;
            if movies.is_empty() {
                println!("No unscraped movies. Run 'seed' first or all movies are scraped.");
                return Ok(());
            }
            let client = imdb::ImdbClient::new()?;
            println!("Scraping award pages for {} movies...", movies.len());
            let stats = imdb::scrape_awards(&conn, &client, movies).await?;
            println!(
                "Done: {} scraped ({} ok, {} errors), {} mentions queued.",
                stats.total, stats.ok, stats.errors, stats.mentions
            );
            Ok(())
        }
        Commands::Process { limit } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let mentions = db::fetch_unprocessed(&conn, limit)?;
            if mentions.is_empty() {
                println!("No unprocessed mentions. Run 'scrape' first.");
                return Ok(());
            }
            println!("Processing {} mentions...", mentions.len());
            let counts = process_mentions(&conn, &mentions)?;
            counts.print();
            Ok(())
        }
        Commands::Run { limit, notable } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let movies = db::fetch_unscraped(&conn, limit, notable)?;
            if movies.is_empty() {
                println!("No unscraped movies. Run 'seed' first.");
                return Ok(());
            }

            // Phase 1: scrape award fragments into the mention queue
            let t_scrape = Instant::now();
            let client = imdb::ImdbClient::new()?;
            println!(
                "Pipeline: scraping award pages for {} movies...",
                movies.len()
            );
            let stats = imdb::scrape_awards(&conn, &client, movies).await?;
            println!(
                "Scraped {} movies ({} ok, {} errors) in {:.1}s",
                stats.total,
                stats.ok,
                stats.errors,
                t_scrape.elapsed().as_secs_f64()
            );

            // Phase 2: parse and persist
            let t_process = Instant::now();
            let mentions = db::fetch_unprocessed(&conn, None)?;
            if mentions.is_empty() {
                println!("Nothing to process (no fragments survived the filters).");
                return Ok(());
            }
            println!("Processing {} mentions...", mentions.len());
            let counts = process_mentions(&conn, &mentions)?;
            println!("Processed in {:.1}s", t_process.elapsed().as_secs_f64());
            counts.print();
            Ok(())
        }
        Commands::Known => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let client = tmdb::TmdbClient::from_env()?;
            println!("Backfilling curated known winners...");
            let stats = known::backfill_known_winners(&conn, &client).await?;
            println!(
                "Done: {} applied, {} duplicates, {} skipped.",
                stats.applied, stats.duplicates, stats.skipped
            );
            Ok(())
        }
        Commands::Stats => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let s = db::get_stats(&conn)?;
            println!("Movies:        {}", s.movies);
            println!("Scraped:       {}", s.scraped);
            println!("Persons:       {}", s.persons);
            println!("Mentions:      {}", s.mentions);
            println!("Unprocessed:   {}", s.unprocessed);
            println!("Awards:        {}", s.awards);
            println!("Movie wins:    {}", s.movie_awards);
            println!("Actor wins:    {}", s.actor_awards);
            println!("Director wins: {}", s.director_awards);
            Ok(())
        }
        Commands::Overview { award, year, limit } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let rows = db::fetch_award_overview(&conn, award.as_deref(), year, limit)?;
            if rows.is_empty() {
                println!("No award records found.");
                return Ok(());
            }

            // Compact, readable table
            println!(
                "{:>3} | {:<4} | {:<24} | {:<24} | {:<8} | {:<20} | {:<20}",
                "#", "Year", "Award", "Category", "Kind", "Recipient", "Movie"
            );
            println!("{}", "-".repeat(120));

            for (i, r) in rows.iter().enumerate() {
                println!(
                    "{:>3} | {:<4} | {:<24} | {:<24} | {:<8} | {:<20} | {:<20}",
                    i + 1,
                    r.year,
                    truncate(&r.award, 24),
                    truncate(&r.category, 24),
                    r.kind,
                    truncate(&r.recipient, 20),
                    truncate(&r.movie, 20),
                );
            }

            println!("\n{} award records", rows.len());
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

struct ProcessCounts {
    mentions: usize,
    candidates: usize,
    inserted: usize,
    duplicates: usize,
    unresolved: usize,
    errors: usize,
}

impl ProcessCounts {
    fn print(&self) {
        println!(
            "Parsed {} mentions into {} candidates: {} inserted, {} duplicates, {} unresolved, {} errors.",
            self.mentions,
            self.candidates,
            self.inserted,
            self.duplicates,
            self.unresolved,
            self.errors,
        );
    }
}

fn process_mentions(
    conn: &rusqlite::Connection,
    rows: &[db::MentionRow],
) -> anyhow::Result<ProcessCounts> {
    use indicatif::{ProgressBar, ProgressStyle};
    use rayon::prelude::*;

    let lexicon = lexicon::Lexicon::default();

    let pb = ProgressBar::new(rows.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")
            .unwrap()
            .progress_chars("#>-"),
    );

    let mut counts = ProcessCounts {
        mentions: rows.len(),
        candidates: 0,
        inserted: 0,
        duplicates: 0,
        unresolved: 0,
        errors: 0,
    };

    for chunk in rows.chunks(500) {
        // Parsing is pure, so it parallelizes; persistence stays on this
        // thread behind the single writer.
        let parsed: Vec<_> = chunk
            .par_iter()
            .map(|row| (row.mention_id, parser::parse_mention(&lexicon, &row.mention)))
            .collect();

        for (mention_id, candidates) in parsed {
            counts.candidates += candidates.len();
            for cand in &candidates {
                match db::save_candidate(conn, cand) {
                    Ok(db::SaveOutcome::Inserted) => counts.inserted += 1,
                    Ok(db::SaveOutcome::Duplicate) => counts.duplicates += 1,
                    Ok(db::SaveOutcome::Unresolved) => counts.unresolved += 1,
                    Err(e) => {
                        tracing::warn!(
                            "Saving a candidate from mention {} failed: {}",
                            mention_id,
                            e
                        );
                        counts.errors += 1;
                    }
                }
            }
            db::mark_mention_processed(conn, mention_id)?;
            pb.inc(1);
        }
    }

    pb.finish_and_clear();
    Ok(counts)
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
