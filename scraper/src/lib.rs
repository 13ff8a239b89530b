//! Graduate job scraping for GradConnection, Seek and Prosple.
//!
//! The streaming path ([`Aggregator::search`]) drives the per-source
//! scrapers one after another and merges their progress into one event
//! stream. The batch path ([`batch::collect_gradconnection`]) fetches
//! concurrently and feeds [`export::write_json`].

pub mod aggregate;
pub mod batch;
pub mod config;
pub mod dates;
pub mod error;
pub mod export;
pub mod http;
pub mod identity;
pub mod location;
pub mod progress;
pub mod selectors;
pub mod sources;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use aggregate::Aggregator;
pub use config::ScrapeConfig;
pub use error::{ExportError, FetchError, ScrapeError};
pub use http::{HttpFetcher, PageFetcher};
pub use location::normalize_location;
pub use sources::{SearchQuery, SourceScraper};
