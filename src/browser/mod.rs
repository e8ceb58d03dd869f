use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::error::{ScrapeError, ScrapeResult};
use crate::traits::{BrowserSession, contains_element};

const USER_AGENT: &str = concat!(
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 ",
    "(KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36"
);

/// Browser session backed by plain HTTP requests.
///
/// The catalogue is rendered server-side, so the response body is the same
/// markup a browser would show once loaded.
pub struct HttpSession {
    client: Option<Client>,
    current_page: Option<String>,
}

impl HttpSession {
    pub fn new() -> ScrapeResult<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(ScrapeError::Client)?;

        Ok(Self {
            client: Some(client),
            current_page: None,
        })
    }
}

#[async_trait]
impl BrowserSession for HttpSession {
    async fn navigate(&mut self, url: &str, load_timeout: Duration) -> ScrapeResult<()> {
        let client = self.client.as_ref().ok_or(ScrapeError::SessionClosed)?;
        self.current_page = None;

        let load = async {
            let response = client
                .get(url)
                .send()
                .await
                .map_err(|source| ScrapeError::Navigation {
                    url: url.to_string(),
                    source,
                })?;

            if !response.status().is_success() {
                return Err(ScrapeError::Status {
                    url: url.to_string(),
                    status: response.status(),
                });
            }

            response
                .text()
                .await
                .map_err(|source| ScrapeError::Navigation {
                    url: url.to_string(),
                    source,
                })
        };

        let body = tokio::time::timeout(load_timeout, load)
            .await
            .map_err(|_| ScrapeError::Timeout {
                url: url.to_string(),
                timeout: load_timeout,
            })??;

        debug!("Loaded {} ({} bytes)", url, body.len());
        self.current_page = Some(body);
        Ok(())
    }

    fn page_source(&self) -> ScrapeResult<String> {
        self.current_page.clone().ok_or(ScrapeError::SessionClosed)
    }

    /// A loaded body never changes, so one look is enough
    async fn wait_for_element(&mut self, css: &str, timeout: Duration) -> ScrapeResult<()> {
        let page = self
            .current_page
            .as_deref()
            .ok_or(ScrapeError::SessionClosed)?;

        if contains_element(page, css)? {
            Ok(())
        } else {
            Err(ScrapeError::MarkerMissing {
                marker: css.to_string(),
                timeout,
            })
        }
    }

    async fn quit(&mut self) -> ScrapeResult<()> {
        self.client = None;
        self.current_page = None;
        debug!("HTTP session released");
        Ok(())
    }
}
