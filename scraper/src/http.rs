//! The network seam every scraper goes through.
//!
//! Scrapers only see [`PageFetcher`]; production code plugs in
//! [`HttpFetcher`] (reqwest with a cookie jar) and tests plug in
//! `testing::MockFetcher`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::cookie::Jar;
use tracing::{debug, warn};

use crate::error::FetchError;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// A GET request for one page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
    pub timeout: Duration,
}

impl PageRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
            query: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_headers(mut self, headers: Vec<(String, String)>) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.retain(|(existing, _)| !existing.eq_ignore_ascii_case(name));
        self.headers.push((name.to_string(), value.into()));
        self
    }

    pub fn with_query(mut self, query: Vec<(String, String)>) -> Self {
        self.query = query;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// A response that made it back, whatever its status.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub url: String,
    pub status: u16,
    pub body: String,
}

impl FetchedPage {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch a single page. Non-2xx statuses are returned, not turned into errors.
    async fn fetch(&self, request: &PageRequest) -> Result<FetchedPage, FetchError>;

    /// Pre-load a cookie for `url` into the session, if the fetcher keeps one.
    fn seed_cookie(&self, _url: &str, _cookie: &str) {}
}

/// reqwest-backed fetcher. Cookies persist for the lifetime of the fetcher.
pub struct HttpFetcher {
    client: reqwest::Client,
    jar: Arc<Jar>,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, FetchError> {
        let jar = Arc::new(Jar::default());
        let client = reqwest::Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self { client, jar })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, request: &PageRequest) -> Result<FetchedPage, FetchError> {
        let mut builder = self.client.get(&request.url).timeout(request.timeout);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let url = response.url().to_string();
        let body = response.text().await?;
        debug!(url = %url, status, bytes = body.len(), "Fetched page");

        Ok(FetchedPage { url, status, body })
    }

    fn seed_cookie(&self, url: &str, cookie: &str) {
        match reqwest::Url::parse(url) {
            Ok(url) => self.jar.add_cookie_str(cookie, &url),
            Err(e) => warn!(url, error = %e, "Cannot seed cookie for invalid url"),
        }
    }
}

/// Exponential backoff for the plain page fetches of GradConnection.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_secs(2),
        }
    }
}

/// Fetches `request`, retrying failures and non-2xx statuses.
///
/// Sleeps `initial_backoff` after the first failure and doubles it after each
/// further one. Returns the last failure once attempts run out.
pub async fn fetch_with_retry(
    fetcher: &dyn PageFetcher,
    request: &PageRequest,
    retry: &RetryConfig,
) -> Result<FetchedPage, FetchError> {
    let attempts = retry.max_attempts.max(1);
    let mut delay = retry.initial_backoff;
    let mut last_error = None;

    for attempt in 1..=attempts {
        match fetcher.fetch(request).await {
            Ok(page) if page.is_success() => return Ok(page),
            Ok(page) => {
                warn!(
                    url = %request.url,
                    status = page.status,
                    attempt,
                    "Request failed with status code"
                );
                last_error = Some(FetchError::Status {
                    status: page.status,
                    url: request.url.clone(),
                });
            }
            Err(e) => {
                warn!(url = %request.url, error = %e, attempt, "Request failed");
                last_error = Some(e);
            }
        }

        if attempt < attempts {
            tokio::time::sleep(delay).await;
            delay *= 2;
        }
    }

    Err(last_error
        .unwrap_or_else(|| FetchError::Other(format!("no attempt made for {}", request.url))))
}
