//! Traits and configuration shared by the browser session and the extractors

use std::time::Duration;

use async_trait::async_trait;
use scraper::{Html, Selector};
use url::Url;

use crate::error::{ScrapeError, ScrapeResult};

/// How often `wait_for_element` re-reads the page source
const MARKER_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Configuration for a catalogue website
#[derive(Debug, Clone)]
pub struct ScraperConfig {
    /// Display name for the website
    pub name: String,
    /// Base URL every catalogue link is resolved against. Always ends with `/`.
    pub catalogue_url: Url,
    /// Listing page pattern relative to the catalogue, with a {page} placeholder
    pub page_url_pattern: String,
    /// CSS selectors for extracting data
    pub selectors: SiteSelectors,
}

/// CSS selectors for the listing and detail pages
#[derive(Debug, Clone)]
pub struct SiteSelectors {
    /// Element whose presence means a listing page has rendered
    pub listing_marker: String,
    /// Element whose presence means a detail page has rendered
    pub detail_marker: String,
    /// Container selector for individual book summaries
    pub product_container: String,
    /// Link carrying both the title attribute and the detail href
    pub title_link: String,
    /// Price text within a summary
    pub price: String,
    /// Stock status within a summary
    pub availability: String,
    /// Element whose second class token is the star rating
    pub rating: String,
    /// Main container on the detail page
    pub detail_container: String,
    /// Meta tag holding the book description
    pub description: String,
}

impl ScraperConfig {
    /// Build the absolute URL of a listing page
    pub fn page_url(&self, page: u32) -> ScrapeResult<Url> {
        let relative = self.page_url_pattern.replace("{page}", &page.to_string());
        self.resolve(&relative)
    }

    /// Resolve a link found on a catalogue page into an absolute URL
    pub fn resolve(&self, href: &str) -> ScrapeResult<Url> {
        self.catalogue_url
            .join(href)
            .map_err(|source| ScrapeError::InvalidUrl {
                href: href.to_string(),
                source,
            })
    }
}

/// Parse a CSS selector, keeping the offending text in the error
pub fn selector(css: &str) -> ScrapeResult<Selector> {
    Selector::parse(css).map_err(|e| ScrapeError::Selector {
        selector: css.to_string(),
        reason: format!("{e:?}"),
    })
}

/// Whether the markup contains at least one element matching `css`
pub fn contains_element(markup: &str, css: &str) -> ScrapeResult<bool> {
    let selector = selector(css)?;
    let document = Html::parse_document(markup);
    let found = document.select(&selector).next().is_some();
    Ok(found)
}

/// A page-loading session the scraper drives, one navigation at a time
#[async_trait]
pub trait BrowserSession: Send {
    /// Load `url`, giving up once `load_timeout` has elapsed
    async fn navigate(&mut self, url: &str, load_timeout: Duration) -> ScrapeResult<()>;

    /// Markup of the page currently loaded
    fn page_source(&self) -> ScrapeResult<String>;

    /// Release the session. Nothing may be loaded through it afterwards.
    async fn quit(&mut self) -> ScrapeResult<()>;

    /// Block until an element matching `css` is present on the current page
    ///
    /// # Arguments
    /// * `css` - Readiness marker selector
    /// * `timeout` - Ceiling on the wait
    ///
    /// # Returns
    /// * `ScrapeResult<()>` - `MarkerMissing` if the marker never appeared
    async fn wait_for_element(&mut self, css: &str, timeout: Duration) -> ScrapeResult<()> {
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            if contains_element(&self.page_source()?, css)? {
                return Ok(());
            }

            if tokio::time::Instant::now() >= deadline {
                return Err(ScrapeError::MarkerMissing {
                    marker: css.to_string(),
                    timeout,
                });
            }

            tokio::time::sleep(MARKER_POLL_INTERVAL).await;
        }
    }
}
