//! Page fetching on top of a [`BrowserSession`]: politeness delay, load,
//! readiness wait, markup.

use std::time::Duration;

use rand::Rng;
use tracing::debug;

use crate::error::ScrapeResult;
use crate::traits::BrowserSession;

/// Which fetches get a random pause beforehand, and how long it may be
#[derive(Debug, Clone, PartialEq)]
pub struct DelayPolicy {
    pub min: Duration,
    pub max: Duration,
    pub before_listings: bool,
    pub before_details: bool,
}

impl DelayPolicy {
    /// Never pause
    #[cfg(test)]
    pub fn none() -> Self {
        Self {
            min: Duration::ZERO,
            max: Duration::ZERO,
            before_listings: false,
            before_details: false,
        }
    }

    fn applies_to(&self, kind: FetchKind) -> bool {
        match kind {
            FetchKind::Listing => self.before_listings,
            FetchKind::Detail => self.before_details,
        }
    }

    fn sample(&self) -> Duration {
        if self.max <= self.min {
            return self.min;
        }
        let secs = rand::thread_rng().gen_range(self.min.as_secs_f64()..=self.max.as_secs_f64());
        Duration::from_secs_f64(secs)
    }
}

impl Default for DelayPolicy {
    fn default() -> Self {
        Self {
            min: Duration::from_millis(500),
            max: Duration::from_secs(2),
            before_listings: true,
            before_details: false,
        }
    }
}

/// What kind of page is being loaded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    Listing,
    Detail,
}

/// Loads pages through a session and hands back their markup once the
/// readiness marker is present
#[derive(Debug, Clone)]
pub struct PageFetcher {
    delay: DelayPolicy,
    load_timeout: Duration,
    marker_timeout: Duration,
}

impl PageFetcher {
    pub fn new(delay: DelayPolicy, load_timeout: Duration, marker_timeout: Duration) -> Self {
        Self {
            delay,
            load_timeout,
            marker_timeout,
        }
    }

    /// Fetch `url` and wait for `marker`
    ///
    /// # Returns
    /// * `ScrapeResult<String>` - Page markup, or why it could not be loaded
    pub async fn fetch<S>(
        &self,
        session: &mut S,
        url: &str,
        marker: &str,
        kind: FetchKind,
    ) -> ScrapeResult<String>
    where
        S: BrowserSession + ?Sized,
    {
        if self.delay.applies_to(kind) {
            let pause = self.delay.sample();
            debug!("Waiting {:.2}s before {}", pause.as_secs_f64(), url);
            tokio::time::sleep(pause).await;
        }

        session.navigate(url, self.load_timeout).await?;
        session.wait_for_element(marker, self.marker_timeout).await?;
        session.page_source()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScrapeError;
    use crate::fixtures::MockSession;

    fn fetcher() -> PageFetcher {
        PageFetcher::new(
            DelayPolicy::none(),
            Duration::from_secs(1),
            Duration::from_millis(50),
        )
    }

    #[test]
    fn test_delay_samples_within_bounds() {
        let policy = DelayPolicy::default();
        for _ in 0..100 {
            let pause = policy.sample();
            assert!(pause >= Duration::from_millis(500));
            assert!(pause <= Duration::from_secs(2));
        }
    }

    #[test]
    fn test_default_delay_skips_details() {
        let policy = DelayPolicy::default();
        assert!(policy.applies_to(FetchKind::Listing));
        assert!(!policy.applies_to(FetchKind::Detail));
    }

    #[tokio::test]
    async fn test_fetch_returns_markup_when_marker_present() {
        let mut session = MockSession::new();
        session.serve(
            "https://example.com/page-1.html",
            "<article class=\"product_pod\"></article>",
        );

        let markup = fetcher()
            .fetch(
                &mut session,
                "https://example.com/page-1.html",
                ".product_pod",
                FetchKind::Listing,
            )
            .await
            .unwrap();

        assert!(markup.contains("product_pod"));
    }

    #[tokio::test]
    async fn test_fetch_fails_when_marker_never_appears() {
        let mut session = MockSession::new();
        session.serve("https://example.com/page-1.html", "<p>maintenance</p>");

        let result = fetcher()
            .fetch(
                &mut session,
                "https://example.com/page-1.html",
                ".product_pod",
                FetchKind::Listing,
            )
            .await;

        assert!(matches!(result, Err(ScrapeError::MarkerMissing { .. })));
    }

    #[tokio::test]
    async fn test_fetch_propagates_navigation_failure() {
        let mut session = MockSession::new();

        let result = fetcher()
            .fetch(
                &mut session,
                "https://example.com/missing.html",
                ".product_pod",
                FetchKind::Listing,
            )
            .await;

        assert!(matches!(result, Err(ScrapeError::Status { .. })));
        assert_eq!(session.visits(), ["https://example.com/missing.html"]);
    }
}
