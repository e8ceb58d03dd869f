//! books.toscrape.com listing and detail extraction

use scraper::{ElementRef, Html, Selector};
use tracing::{error, warn};
use url::Url;

use crate::error::{ScrapeError, ScrapeResult};
use crate::fetcher::{FetchKind, PageFetcher};
use crate::models::{Book, BookDetails, Rating};
use crate::traits::{BrowserSession, ScraperConfig, SiteSelectors, selector};

pub const DEFAULT_CATALOGUE_URL: &str = "https://books.toscrape.com/catalogue/";
pub const DEFAULT_LISTING_MARKER: &str = ".product_pod";

/// Mis-decoded bytes that show up around the pound sign
const CURRENCY_ARTIFACTS: [char; 2] = ['£', 'Â'];

/// Table rows read from a detail page
const LABEL_UPC: &str = "UPC";
const LABEL_PRODUCT_TYPE: &str = "Product Type";
const LABEL_TAX: &str = "Tax";
const LABEL_REVIEWS: &str = "Number of reviews";

/// Books parsed from one listing page
#[derive(Debug, Default)]
pub struct Listing {
    /// Summary blocks present on the page, parseable or not
    pub blocks: usize,
    pub books: Vec<Book>,
}

impl Listing {
    /// A page with no summary blocks marks the end of the catalogue
    pub fn is_empty(&self) -> bool {
        self.blocks == 0
    }
}

/// Scraper for the books.toscrape.com catalogue
#[derive(Debug, Clone)]
pub struct BooksToScrape {
    config: ScraperConfig,
}

impl BooksToScrape {
    /// Create a scraper rooted at `catalogue_url` with the storefront's selectors
    pub fn new(catalogue_url: Url) -> Self {
        let config = ScraperConfig {
            name: "Books to Scrape".to_string(),
            catalogue_url,
            page_url_pattern: "page-{page}.html".to_string(),
            selectors: SiteSelectors {
                listing_marker: DEFAULT_LISTING_MARKER.to_string(),
                detail_marker: ".product_page".to_string(),
                product_container: ".product_pod".to_string(),
                title_link: "h3 a".to_string(),
                price: ".price_color".to_string(),
                availability: ".availability".to_string(),
                rating: "p".to_string(),
                detail_container: "article.product_page".to_string(),
                description: r#"meta[name="description"]"#.to_string(),
            },
        };

        Self { config }
    }

    /// Wait for `marker` instead of the first book block before reading a
    /// listing page
    pub fn with_listing_marker(mut self, marker: &str) -> Self {
        self.config.selectors.listing_marker = marker.to_string();
        self
    }

    pub fn config(&self) -> &ScraperConfig {
        &self.config
    }

    /// Parse a listing page and enrich every book with its detail page
    ///
    /// # Arguments
    /// * `markup` - Rendered listing page
    /// * `page_num` - Page number, for log context
    pub async fn extract_listing<S>(
        &self,
        session: &mut S,
        fetcher: &PageFetcher,
        markup: &str,
        page_num: u32,
    ) -> ScrapeResult<Listing>
    where
        S: BrowserSession + ?Sized,
    {
        let mut listing = self.parse_listing(markup, page_num)?;

        if listing.is_empty() {
            warn!("No books found on page {}", page_num);
            return Ok(listing);
        }

        for book in &mut listing.books {
            book.details = self.extract_details(&mut *session, fetcher, &book.url).await;
        }

        Ok(listing)
    }

    /// Fetch a book's own page and read its extra attributes
    ///
    /// Returns `None` when the page has no detail container or anything on
    /// the way fails; the summary fields are still usable.
    pub async fn extract_details<S>(
        &self,
        session: &mut S,
        fetcher: &PageFetcher,
        book_url: &str,
    ) -> Option<BookDetails>
    where
        S: BrowserSession + ?Sized,
    {
        let marker = &self.config.selectors.detail_marker;
        let result = fetcher
            .fetch(session, book_url, marker, FetchKind::Detail)
            .await
            .and_then(|markup| self.parse_details(&markup));

        match result {
            Ok(details) => details,
            Err(e) => {
                error!("Error scraping book details from {}: {}", book_url, e);
                None
            }
        }
    }

    /// Extract summary fields from every block on a listing page.
    ///
    /// A block that fails to parse is logged and skipped.
    pub fn parse_listing(&self, markup: &str, page_num: u32) -> ScrapeResult<Listing> {
        let selectors = &self.config.selectors;
        let product_selector = selector(&selectors.product_container)?;
        let block = BlockSelectors {
            title_link: selector(&selectors.title_link)?,
            price: selector(&selectors.price)?,
            availability: selector(&selectors.availability)?,
            rating: selector(&selectors.rating)?,
        };

        let document = Html::parse_document(markup);
        let mut listing = Listing::default();

        for product in document.select(&product_selector) {
            listing.blocks += 1;
            match self.parse_block(product, &block) {
                Ok(book) => listing.books.push(book),
                Err(e) => error!("Error processing book on page {}: {}", page_num, e),
            }
        }

        Ok(listing)
    }

    fn parse_block(&self, product: ElementRef<'_>, block: &BlockSelectors) -> ScrapeResult<Book> {
        let link = product
            .select(&block.title_link)
            .next()
            .ok_or(ScrapeError::MissingField("title link"))?;
        let title = link
            .value()
            .attr("title")
            .ok_or(ScrapeError::MissingField("title"))?
            .to_string();

        let raw_price =
            first_text(product, &block.price).ok_or(ScrapeError::MissingField("price"))?;
        let price = parse_price(&raw_price)?;

        let availability = first_text(product, &block.availability)
            .ok_or(ScrapeError::MissingField("availability"))?;

        // First class token is the "star-rating" decorator
        let rating = product
            .select(&block.rating)
            .next()
            .and_then(|p| p.value().attr("class"))
            .and_then(|classes| classes.split_whitespace().nth(1))
            .ok_or(ScrapeError::MissingField("rating"))?
            .parse::<Rating>()?;

        let href = link
            .value()
            .attr("href")
            .ok_or(ScrapeError::MissingField("link"))?;
        let url = self.config.resolve(href)?.to_string();

        Ok(Book {
            title,
            price,
            availability,
            rating,
            url,
            details: None,
        })
    }

    /// Read the detail attributes from a book page.
    ///
    /// `Ok(None)` means the page has no detail container at all.
    pub fn parse_details(&self, markup: &str) -> ScrapeResult<Option<BookDetails>> {
        let selectors = &self.config.selectors;
        let container_selector = selector(&selectors.detail_container)?;
        let description_selector = selector(&selectors.description)?;
        let header_selector = selector("th")?;

        let document = Html::parse_document(markup);
        let Some(container) = document.select(&container_selector).next() else {
            return Ok(None);
        };

        // The storefront renders the description meta tag in <head>
        let description = container
            .select(&description_selector)
            .next()
            .or_else(|| document.select(&description_selector).next())
            .and_then(|meta| meta.value().attr("content"))
            .ok_or(ScrapeError::MissingField("description"))?
            .trim()
            .to_string();

        Ok(Some(BookDetails {
            description,
            upc: row_value(container, &header_selector, LABEL_UPC)?,
            product_type: row_value(container, &header_selector, LABEL_PRODUCT_TYPE)?,
            tax: row_value(container, &header_selector, LABEL_TAX)?,
            reviews: row_value(container, &header_selector, LABEL_REVIEWS)?,
        }))
    }
}

struct BlockSelectors {
    title_link: Selector,
    price: Selector,
    availability: Selector,
    rating: Selector,
}

fn first_text(element: ElementRef<'_>, selector: &Selector) -> Option<String> {
    element
        .select(selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
}

/// Value cell following the header cell whose text is exactly `label`
fn row_value(container: ElementRef<'_>, header: &Selector, label: &str) -> ScrapeResult<String> {
    let th = container
        .select(header)
        .find(|th| th.text().collect::<String>().trim() == label)
        .ok_or_else(|| ScrapeError::MissingLabel(label.to_string()))?;

    let td = th
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .find(|cell| cell.value().name() == "td")
        .ok_or_else(|| ScrapeError::MissingLabel(format!("{label} value")))?;

    Ok(td.text().collect::<String>().trim().to_string())
}

/// Parse a listing price such as `£51.77` into a non-negative number
pub fn parse_price(raw: &str) -> ScrapeResult<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !CURRENCY_ARTIFACTS.contains(c))
        .collect();

    let price: f64 = cleaned
        .trim()
        .parse()
        .map_err(|_| ScrapeError::InvalidPrice(raw.to_string()))?;

    if !price.is_finite() || price < 0.0 {
        return Err(ScrapeError::InvalidPrice(raw.to_string()));
    }

    Ok(price)
}
