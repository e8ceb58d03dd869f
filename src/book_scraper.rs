use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::{Duration, Instant};

use futures::FutureExt;
use tracing::{error, info};

use crate::config::ScrapeConfig;
use crate::fetcher::{FetchKind, PageFetcher};
use crate::models::Book;
use crate::scrapers::BooksToScrape;
use crate::storage::Storage;
use crate::traits::BrowserSession;

/// What a finished run produced
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub books: usize,
    pub pages_scraped: u32,
    /// The range ended on a failed or empty page instead of running out
    pub stopped_early: bool,
    pub elapsed: Duration,
}

/// Drives one scraping run: owns the browser session for its lifetime and
/// the books collected so far.
pub struct BookScraper<S: BrowserSession> {
    session: S,
    site: BooksToScrape,
    fetcher: PageFetcher,
    storage: Storage,
    start_page: u32,
    end_page: u32,
    books: Vec<Book>,
}

impl<S: BrowserSession> BookScraper<S> {
    pub fn new(session: S, config: &ScrapeConfig) -> Self {
        Self {
            session,
            site: BooksToScrape::new(config.catalogue_url.clone())
                .with_listing_marker(&config.listing_marker),
            fetcher: PageFetcher::new(
                config.delay.clone(),
                config.load_timeout,
                config.marker_timeout,
            ),
            storage: Storage::new(&config.output_dir, &config.csv_file, &config.json_file),
            start_page: config.start_page,
            end_page: config.end_page,
            books: Vec::new(),
        }
    }

    /// Scrape the configured page range, then save, release the session and
    /// report. Saving and releasing happen whatever the scrape did, including
    /// panicking.
    pub async fn run(mut self) -> RunSummary {
        info!("Starting book scraper on {}", self.site.config().name);
        let started = Instant::now();
        let mut summary = RunSummary {
            books: 0,
            pages_scraped: 0,
            stopped_early: false,
            elapsed: Duration::ZERO,
        };

        let scrape = AssertUnwindSafe(self.scrape_pages(&mut summary))
            .catch_unwind()
            .await;
        if let Err(panic) = scrape {
            error!("Scraping failed: {}", panic_message(&*panic));
            summary.stopped_early = true;
        }

        self.save();

        if let Err(e) = self.session.quit().await {
            error!("Failed to release browser session: {}", e);
        }

        summary.books = self.books.len();
        summary.elapsed = started.elapsed();
        info!(
            "Scraping complete. Scraped {} books in {:.2} seconds.",
            summary.books,
            summary.elapsed.as_secs_f64()
        );
        summary
    }

    async fn scrape_pages(&mut self, summary: &mut RunSummary) {
        for page_num in self.start_page..=self.end_page {
            let Some(books) = self.scrape_page(page_num).await else {
                summary.stopped_early = true;
                break;
            };

            self.books.extend(books);
            summary.pages_scraped += 1;
        }
    }

    /// Books from one listing page, or `None` if the range should stop here
    async fn scrape_page(&mut self, page_num: u32) -> Option<Vec<Book>> {
        let page_url = match self.site.config().page_url(page_num) {
            Ok(url) => url,
            Err(e) => {
                error!("Cannot build URL for page {}: {}", page_num, e);
                return None;
            }
        };
        info!("Scraping page {}: {}", page_num, page_url);

        let marker = &self.site.config().selectors.listing_marker;
        let markup = match self
            .fetcher
            .fetch(&mut self.session, page_url.as_str(), marker, FetchKind::Listing)
            .await
        {
            Ok(markup) => markup,
            Err(e) => {
                error!("Failed to fetch {}: {}", page_url, e);
                return None;
            }
        };

        match self
            .site
            .extract_listing(&mut self.session, &self.fetcher, &markup, page_num)
            .await
        {
            Ok(listing) if listing.is_empty() => None,
            Ok(listing) => Some(listing.books),
            Err(e) => {
                error!("Error processing page {}: {}", page_num, e);
                None
            }
        }
    }

    /// Run both writers; a failure in one does not stop the other
    fn save(&self) {
        if let Err(e) = self.storage.save_csv(&self.books) {
            error!("Failed to save CSV: {}", e);
        }
        if let Err(e) = self.storage.save_json(&self.books) {
            error!("Failed to save JSON: {}", e);
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
