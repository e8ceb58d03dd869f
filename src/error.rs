//! Failure taxonomy shared by every stage of the scrape

use std::time::Duration;

use thiserror::Error;

/// Anything that can go wrong while fetching, extracting or saving books.
///
/// None of these are fatal to a run. The call site that decides a failure
/// is survivable logs it and carries on with fewer results.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("navigation to {url} failed: {source}")]
    Navigation {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("{url} answered with status {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("page load for {url} exceeded {timeout:?}")]
    Timeout { url: String, timeout: Duration },

    #[error("marker `{marker}` did not appear within {timeout:?}")]
    MarkerMissing { marker: String, timeout: Duration },

    #[error("invalid selector `{selector}`: {reason}")]
    Selector { selector: String, reason: String },

    #[error("missing field: {0}")]
    MissingField(&'static str),

    #[error("missing table row `{0}`")]
    MissingLabel(String),

    #[error("invalid price `{0}`")]
    InvalidPrice(String),

    #[error("unknown rating label `{0}`")]
    InvalidRating(String),

    #[error("cannot resolve `{href}`: {source}")]
    InvalidUrl {
        href: String,
        #[source]
        source: url::ParseError,
    },

    #[error("browser session has no page loaded")]
    SessionClosed,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type ScrapeResult<T> = Result<T, ScrapeError>;
