//! Run configuration: command-line flags with environment fallbacks

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use url::Url;

use crate::fetcher::DelayPolicy;
use crate::scrapers::books::{DEFAULT_CATALOGUE_URL, DEFAULT_LISTING_MARKER};

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Scrape the books.toscrape.com catalogue to CSV and JSON")]
pub struct Args {
    /// First listing page to scrape
    #[arg(long, env = "BOOKS_START_PAGE", default_value_t = 1)]
    pub start_page: u32,

    /// Last listing page to scrape (inclusive)
    #[arg(long, env = "BOOKS_END_PAGE", default_value_t = 2)]
    pub end_page: u32,

    /// Catalogue root that listing and book links are resolved against
    #[arg(long, env = "BOOKS_CATALOGUE_URL", default_value = DEFAULT_CATALOGUE_URL)]
    pub catalogue_url: String,

    /// Directory receiving the CSV and JSON files
    #[arg(long, env = "BOOKS_OUTPUT_DIR", default_value = "scraped_data")]
    pub output_dir: PathBuf,

    #[arg(long, env = "BOOKS_CSV_FILE", default_value = "books_data.csv")]
    pub csv_file: String,

    #[arg(long, env = "BOOKS_JSON_FILE", default_value = "books_data.json")]
    pub json_file: String,

    /// Log file, appended to alongside console output
    #[arg(long, env = "BOOKS_LOG_FILE", default_value = "books_scraper.log")]
    pub log_file: PathBuf,

    /// Element whose presence means a listing page has rendered
    #[arg(long, env = "BOOKS_LISTING_MARKER", default_value = DEFAULT_LISTING_MARKER)]
    pub listing_marker: String,

    /// Ceiling on a single page load
    #[arg(long, env = "BOOKS_LOAD_TIMEOUT_SECS", default_value_t = 30)]
    pub load_timeout_secs: u64,

    /// Ceiling on waiting for a page's readiness marker
    #[arg(long, env = "BOOKS_MARKER_TIMEOUT_SECS", default_value_t = 10)]
    pub marker_timeout_secs: u64,

    /// Shortest politeness delay before a fetch
    #[arg(long, env = "BOOKS_DELAY_MIN_SECS", default_value_t = 0.5)]
    pub delay_min_secs: f64,

    /// Longest politeness delay before a fetch
    #[arg(long, env = "BOOKS_DELAY_MAX_SECS", default_value_t = 2.0)]
    pub delay_max_secs: f64,

    /// Also pause before each book detail page, not just listing pages
    #[arg(long, env = "BOOKS_DELAY_DETAILS", default_value_t = false)]
    pub delay_details: bool,
}

/// Validated settings for one scraping run
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    pub start_page: u32,
    pub end_page: u32,
    pub catalogue_url: Url,
    pub output_dir: PathBuf,
    pub csv_file: String,
    pub json_file: String,
    pub log_file: PathBuf,
    pub listing_marker: String,
    pub load_timeout: Duration,
    pub marker_timeout: Duration,
    pub delay: DelayPolicy,
}

impl ScrapeConfig {
    pub fn from_args(args: &Args) -> Result<Self> {
        if args.start_page == 0 {
            bail!("start page must be at least 1");
        }
        if args.start_page > args.end_page {
            bail!(
                "start page {} is after end page {}",
                args.start_page,
                args.end_page
            );
        }

        let delay_min = delay_duration("minimum", args.delay_min_secs)?;
        let delay_max = delay_duration("maximum", args.delay_max_secs)?;
        if delay_min > delay_max {
            bail!(
                "minimum delay {}s exceeds maximum delay {}s",
                args.delay_min_secs,
                args.delay_max_secs
            );
        }

        Ok(Self {
            start_page: args.start_page,
            end_page: args.end_page,
            catalogue_url: catalogue_root(&args.catalogue_url)?,
            output_dir: args.output_dir.clone(),
            csv_file: args.csv_file.clone(),
            json_file: args.json_file.clone(),
            log_file: args.log_file.clone(),
            listing_marker: args.listing_marker.clone(),
            load_timeout: Duration::from_secs(args.load_timeout_secs),
            marker_timeout: Duration::from_secs(args.marker_timeout_secs),
            delay: DelayPolicy {
                min: delay_min,
                max: delay_max,
                before_listings: true,
                before_details: args.delay_details,
            },
        })
    }
}

/// Convert a delay bound in seconds, rejecting negative, non-finite and
/// out-of-range values
fn delay_duration(name: &str, secs: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(secs).map_err(|e| {
        anyhow::anyhow!("{name} delay must be a non-negative number of seconds, got {secs}: {e}")
    })
}

/// Parse the catalogue URL, making sure relative links resolve beneath it
fn catalogue_root(raw: &str) -> Result<Url> {
    let mut root = raw.trim().to_string();
    if !root.ends_with('/') {
        root.push('/');
    }
    Url::parse(&root).with_context(|| format!("invalid catalogue URL `{raw}`"))
}
