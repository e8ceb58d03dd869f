//! Data models for scraped book information

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ScrapeError;

/// A book listing scraped from the catalogue, optionally enriched from its
/// detail page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub title: String,
    pub price: f64,
    pub availability: String,
    pub rating: Rating,
    pub url: String,
    #[serde(flatten)]
    pub details: Option<BookDetails>,
}

/// Extra attributes only available on a book's own page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookDetails {
    pub description: String,
    pub upc: String,
    pub product_type: String,
    pub tax: String,
    pub reviews: String,
}

/// Star rating, encoded on the listing as a CSS class name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rating {
    One,
    Two,
    Three,
    Four,
    Five,
}

impl Rating {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::One => "One",
            Self::Two => "Two",
            Self::Three => "Three",
            Self::Four => "Four",
            Self::Five => "Five",
        }
    }
}

impl FromStr for Rating {
    type Err = ScrapeError;

    fn from_str(label: &str) -> Result<Self, Self::Err> {
        match label {
            "One" => Ok(Self::One),
            "Two" => Ok(Self::Two),
            "Three" => Ok(Self::Three),
            "Four" => Ok(Self::Four),
            "Five" => Ok(Self::Five),
            other => Err(ScrapeError::InvalidRating(other.to_string())),
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
