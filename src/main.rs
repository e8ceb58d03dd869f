use anyhow::Result;
use clap::Parser;
use tracing::info;

mod book_scraper;
mod browser;
mod config;
mod error;
mod fetcher;
#[cfg(test)]
mod fixtures;
mod logging;
mod models;
mod scrapers;
mod storage;
mod traits;

use book_scraper::BookScraper;
use browser::HttpSession;
use config::{Args, ScrapeConfig};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    let config = ScrapeConfig::from_args(&args)?;
    logging::init(&config.log_file)?;

    info!(
        "Scraping pages {} to {} of {}",
        config.start_page, config.end_page, config.catalogue_url
    );

    let session = HttpSession::new()?;
    let summary = BookScraper::new(session, &config).run().await;

    if summary.stopped_early {
        info!(
            "Stopped after {} of {} pages",
            summary.pages_scraped,
            config.end_page - config.start_page + 1
        );
    }

    Ok(())
}
