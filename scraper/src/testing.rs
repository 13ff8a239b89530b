//! Test doubles for the fetcher seam plus small HTML fixtures.
//!
//! Compiled for this crate's unit tests and, through the `test-support`
//! feature, for the integration tests in `tests/`.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::FetchError;
use crate::http::{FetchedPage, PageFetcher, PageRequest};

/// A canned answer for one request.
#[derive(Debug, Clone)]
pub enum MockReply {
    Page(u16, String),
    Timeout,
    ConnectError,
}

impl MockReply {
    pub fn page(body: impl Into<String>) -> Self {
        MockReply::Page(200, body.into())
    }

    pub fn status(status: u16) -> Self {
        MockReply::Page(status, String::new())
    }
}

/// Serves canned replies keyed by exact URL and records every request.
///
/// A URL registered with a sequence answers with each reply in turn and keeps
/// repeating the last one. Unknown URLs get the fallback (404 by default).
pub struct MockFetcher {
    routes: Mutex<HashMap<String, Vec<MockReply>>>,
    fallback: MockReply,
    requests: Mutex<Vec<PageRequest>>,
    cookies: Mutex<Vec<(String, String)>>,
}

impl Default for MockFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl MockFetcher {
    pub fn new() -> Self {
        Self {
            routes: Mutex::new(HashMap::new()),
            fallback: MockReply::status(404),
            requests: Mutex::new(Vec::new()),
            cookies: Mutex::new(Vec::new()),
        }
    }

    pub fn on_page(self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.on_sequence(url, vec![MockReply::page(body)])
    }

    pub fn on_status(self, url: impl Into<String>, status: u16) -> Self {
        self.on_sequence(url, vec![MockReply::status(status)])
    }

    pub fn on_timeout(self, url: impl Into<String>) -> Self {
        self.on_sequence(url, vec![MockReply::Timeout])
    }

    pub fn on_sequence(self, url: impl Into<String>, replies: Vec<MockReply>) -> Self {
        self.routes.lock().unwrap().insert(url.into(), replies);
        self
    }

    pub fn with_fallback(mut self, reply: MockReply) -> Self {
        self.fallback = reply;
        self
    }

    /// Every requested URL, in request order.
    pub fn requested_urls(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|request| request.url.clone())
            .collect()
    }

    pub fn requests(&self) -> Vec<PageRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self, url: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|request| request.url == url)
            .count()
    }

    pub fn seeded_cookies(&self) -> Vec<(String, String)> {
        self.cookies.lock().unwrap().clone()
    }

    fn next_reply(&self, url: &str) -> MockReply {
        let mut routes = self.routes.lock().unwrap();
        match routes.get_mut(url) {
            Some(replies) if replies.len() > 1 => replies.remove(0),
            Some(replies) => replies.first().cloned().unwrap_or_else(|| self.fallback.clone()),
            None => self.fallback.clone(),
        }
    }
}

#[async_trait]
impl PageFetcher for MockFetcher {
    async fn fetch(&self, request: &PageRequest) -> Result<FetchedPage, FetchError> {
        self.requests.lock().unwrap().push(request.clone());
        match self.next_reply(&request.url) {
            MockReply::Page(status, body) => Ok(FetchedPage {
                url: request.url.clone(),
                status,
                body,
            }),
            MockReply::Timeout => Err(FetchError::Timeout(request.url.clone())),
            MockReply::ConnectError => Err(FetchError::Connect(format!(
                "connection refused: {}",
                request.url
            ))),
        }
    }

    fn seed_cookie(&self, url: &str, cookie: &str) {
        self.cookies
            .lock()
            .unwrap()
            .push((url.to_string(), cookie.to_string()));
    }
}

/// GradConnection search results linking to each of `hrefs`, with pagination
/// links for `pages`.
pub fn gradconnection_listing(hrefs: &[&str], pages: &[u32]) -> String {
    let jobs: String = hrefs
        .iter()
        .map(|href| format!(r#"<div class="box-header"><a class="box-header-title" href="{href}">Job</a></div>"#))
        .collect();
    let pagination: String = pages
        .iter()
        .map(|page| format!(r#"<a href="?page={page}">{page}</a>"#))
        .collect();
    format!(
        r#"<html><body><div class="jobs-container">{jobs}</div><div class="pagination">{pagination}</div></body></html>"#
    )
}

/// A GradConnection detail page in the `box-content-catagories` markup.
pub fn gradconnection_detail(title: &str, company: &str, location: &str, closing: &str) -> String {
    format!(
        r#"<html><head><title>{title} | GradConnection</title></head><body>
        <h1 class="employers-panel-title">{company}</h1>
        <h1 class="employers-profile-h1">{title}</h1>
        <ul>
          <li class="box-content-catagories catagories-list"><strong class="box-content-catagories-bold">Job type</strong> Graduate Job</li>
          <li class="box-content-catagories catagories-list"><strong class="box-content-catagories-bold">Disciplines</strong> Computer Science, IT</li>
          <li class="box-content-catagories catagories-list"><strong class="box-content-catagories-bold">Locations</strong> {location}</li>
          <li class="box-content-catagories catagories-list"><strong class="box-content-catagories-bold">ACCEPTS INTERNATIONAL</strong></li>
          <li class="box-content-catagories catagories-list"><strong class="box-content-catagories-bold">Closing Date</strong> {closing}</li>
          <li class="box-content-catagories catagories-list"><strong class="box-content-catagories-bold">Position Start Date</strong> February 2026</li>
        </ul></body></html>"#
    )
}

/// One Seek result card.
pub struct SeekCard<'a> {
    pub title: &'a str,
    pub href: &'a str,
    pub company: &'a str,
    pub location: &'a str,
    pub listed: &'a str,
}

/// Seek search results made of `article` cards.
pub fn seek_listing(cards: &[SeekCard<'_>], pages: &[u32]) -> String {
    let articles: String = cards
        .iter()
        .map(|card| {
            format!(
                r#"<article data-automation="normalJob">
                  <h3><a data-automation="jobTitle" href="{}">{}</a></h3>
                  <a data-automation="jobCompany">{}</a>
                  <span data-automation="jobLocation">{}</span>
                  <span data-automation="jobListingDate">{}</span>
                  <span data-automation="jobWorkType">Full time</span>
                </article>"#,
                card.href, card.title, card.company, card.location, card.listed
            )
        })
        .collect();
    let pagination: String = pages
        .iter()
        .map(|page| format!(r#"<a data-automation="page-link" href="?page={page}">{page}</a>"#))
        .collect();
    format!(r#"<html><body>{articles}<nav>{pagination}</nav></body></html>"#)
}
