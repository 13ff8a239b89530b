//! Per-board scrapers.
//!
//! Each scraper turns a [`SearchQuery`] into a stream of progress events on
//! its own 0–100 scale, ending with a `Results` event that carries every
//! record it kept. A stream item of `Err` means the whole source failed.

pub mod gradconnection;
pub mod pagination;
pub mod prosple;
pub mod seek;

use common::{JobLevel, ProgressEvent, SearchRequest, Source};
use futures::stream::BoxStream;
use url::Url;

use crate::error::ScrapeError;

pub use gradconnection::GradConnectionScraper;
pub use prosple::ProspleScraper;
pub use seek::SeekScraper;

pub type EventStream = BoxStream<'static, Result<ProgressEvent, ScrapeError>>;

/// What to search for, independent of the board.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub job_level: JobLevel,
    pub discipline: String,
    pub location: String,
}

impl SearchQuery {
    pub fn new(
        job_level: JobLevel,
        discipline: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        Self {
            job_level,
            discipline: discipline.into(),
            location: location.into(),
        }
    }
}

impl From<&SearchRequest> for SearchQuery {
    fn from(request: &SearchRequest) -> Self {
        Self::new(request.job_level, request.discipline.clone(), request.location.clone())
    }
}

pub trait SourceScraper: Send + Sync {
    fn source(&self) -> Source;

    fn scrape(&self, query: &SearchQuery) -> EventStream;
}

pub(crate) fn parse_site(base_url: &str) -> Result<Url, ScrapeError> {
    Url::parse(base_url).map_err(|e| ScrapeError::InvalidUrl {
        url: base_url.to_string(),
        reason: e.to_string(),
    })
}

/// Absolute form of `href` on `site`. Absolute hrefs pass through untouched.
pub fn resolve_link(site: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') || href.starts_with("javascript:") {
        return None;
    }
    if href.starts_with("http://") || href.starts_with("https://") {
        return Some(href.to_string());
    }
    site.join(href).ok().map(|url| url.to_string())
}

/// Adds a `page` parameter for pages after the first.
pub fn with_page(url: &str, page: u32) -> String {
    if page <= 1 {
        url.to_string()
    } else if url.contains('?') {
        format!("{url}&page={page}")
    } else {
        format!("{url}?page={page}")
    }
}

/// Case-insensitive match against a board's skip-list.
pub fn is_skipped_company(company: &str, skip_list: &[String]) -> bool {
    let company = company.trim();
    skip_list
        .iter()
        .any(|skipped| skipped.trim().eq_ignore_ascii_case(company))
}

/// "graduate-software-engineer" -> "Graduate Software Engineer".
pub fn title_from_slug(slug: &str) -> String {
    slug.split(['-', '_'])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
