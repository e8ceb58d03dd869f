//! Test doubles: an in-memory browser session and storefront markup

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{ScrapeError, ScrapeResult};
use crate::traits::BrowserSession;

pub const CATALOGUE: &str = "https://books.toscrape.com/catalogue/";

#[derive(Default)]
struct MockState {
    pages: HashMap<String, String>,
    visits: Vec<String>,
    quits: usize,
    panic_on: Option<String>,
}

/// Session serving canned pages. Clones share the recorded state, so a test
/// can keep one while the scraper owns another.
#[derive(Clone, Default)]
pub struct MockSession {
    state: Arc<Mutex<MockState>>,
    current: Option<String>,
}

impl MockSession {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn serve(&mut self, url: &str, markup: &str) {
        self.state().pages.insert(url.to_string(), markup.to_string());
    }

    pub fn panic_on(&mut self, url: &str) {
        self.state().panic_on = Some(url.to_string());
    }

    pub fn visits(&self) -> Vec<String> {
        self.state().visits.clone()
    }

    pub fn quits(&self) -> usize {
        self.state().quits
    }
}

#[async_trait]
impl BrowserSession for MockSession {
    async fn navigate(&mut self, url: &str, _load_timeout: Duration) -> ScrapeResult<()> {
        let (page, explode) = {
            let mut state = self.state();
            state.visits.push(url.to_string());
            (
                state.pages.get(url).cloned(),
                state.panic_on.as_deref() == Some(url),
            )
        };

        if explode {
            panic!("browser crashed while loading {url}");
        }

        self.current = None;
        match page {
            Some(markup) => {
                self.current = Some(markup);
                Ok(())
            }
            None => Err(ScrapeError::Status {
                url: url.to_string(),
                status: reqwest::StatusCode::NOT_FOUND,
            }),
        }
    }

    fn page_source(&self) -> ScrapeResult<String> {
        self.current.clone().ok_or(ScrapeError::SessionClosed)
    }

    async fn quit(&mut self) -> ScrapeResult<()> {
        self.state().quits += 1;
        self.current = None;
        Ok(())
    }
}

/// One book as it appears on the storefront
pub struct FixtureBook {
    pub slug: String,
    pub title: String,
    pub price: String,
    pub rating: String,
}

impl FixtureBook {
    pub fn new(slug: &str, title: &str, price: &str, rating: &str) -> Self {
        Self {
            slug: slug.to_string(),
            title: title.to_string(),
            price: price.to_string(),
            rating: rating.to_string(),
        }
    }

    pub fn href(&self) -> String {
        format!("{}/index.html", self.slug)
    }

    pub fn url(&self) -> String {
        format!("{CATALOGUE}{}", self.href())
    }
}

pub fn product_pod(book: &FixtureBook) -> String {
    format!(
        r#"<li class="col-xs-6 col-sm-4 col-md-3 col-lg-3">
<article class="product_pod">
  <div class="image_container">
    <a href="{href}"><img src="../media/cache/x.jpg" alt="{title}" class="thumbnail"></a>
  </div>
  <p class="star-rating {rating}"><i class="icon-star"></i></p>
  <h3><a href="{href}" title="{title}">{title}</a></h3>
  <div class="product_price">
    <p class="price_color">{price}</p>
    <p class="instock availability">
        <i class="icon-ok"></i>
        In stock
    </p>
  </div>
</article>
</li>"#,
        href = book.href(),
        title = book.title,
        rating = book.rating,
        price = book.price,
    )
}

pub fn listing_page(pods: &[String]) -> String {
    format!(
        r#"<!DOCTYPE html><html lang="en-us">
<head><title>All products | Books to Scrape</title></head>
<body><section><ol class="row">{}</ol></section></body></html>"#,
        pods.join("\n")
    )
}

pub fn detail_page(book: &FixtureBook) -> String {
    format!(
        r#"<!DOCTYPE html><html lang="en-us"><head>
<title>{title} | Books to Scrape</title>
<meta name="description" content="
    A book called {title}, reviewed by nobody.
">
</head><body>
<article class="product_page">
  <div class="product_main"><h1>{title}</h1><p class="price_color">{price}</p></div>
  <table class="table table-striped">
    <tr><th>UPC</th><td>upc-{slug}</td></tr>
    <tr><th>Product Type</th><td>Books</td></tr>
    <tr><th>Price (excl. tax)</th><td>{price}</td></tr>
    <tr><th>Tax</th><td>£0.00</td></tr>
    <tr><th>Availability</th><td>In stock (22 available)</td></tr>
    <tr><th>Number of reviews</th><td>0</td></tr>
  </table>
</article>
</body></html>"#,
        title = book.title,
        price = book.price,
        slug = book.slug,
    )
}

/// Serve `pages` listing pages of `per_page` books each, with detail pages
pub fn serve_catalogue(session: &mut MockSession, pages: u32, per_page: u32) {
    for page in 1..=pages {
        let books: Vec<FixtureBook> = (0..per_page)
            .map(|i| {
                let n = (page - 1) * per_page + i;
                FixtureBook::new(
                    &format!("book-{n}_{n}"),
                    &format!("Book {n}"),
                    &format!("£{}.{:02}", 10 + n, n % 100),
                    "Four",
                )
            })
            .collect();

        let pods: Vec<String> = books.iter().map(product_pod).collect();
        session.serve(&format!("{CATALOGUE}page-{page}.html"), &listing_page(&pods));
        for book in &books {
            session.serve(&book.url(), &detail_page(book));
        }
    }
}
