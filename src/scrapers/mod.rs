//! Site-specific scrapers

pub mod books;

pub use books::BooksToScrape;
