//! Seek: every field is read from the result cards, no detail fetches.

use std::collections::HashSet;
use std::sync::{Arc, LazyLock};

use async_stream::stream;
use chrono::{Local, NaiveDate};
use common::{JobRecord, ProgressEvent, Source};
use scraper::{ElementRef, Html};
use tracing::{debug, info, warn};
use url::Url;

use super::pagination::{ListingCheck, PageAdvance, Pagination};
use super::{is_skipped_company, parse_site, resolve_link, with_page};
use super::{EventStream, SearchQuery, SourceScraper};
use crate::config::SeekConfig;
use crate::dates::estimate_seek_closing_date;
use crate::error::FetchError;
use crate::http::{PageFetcher, PageRequest};
use crate::identity::browser_headers;
use crate::progress::ProgressTracker;
use crate::selectors::{element_text, page_numbers, Ancestor, Css, SelectorChain, TextContains};

const UNTITLED: &str = "Untitled Position";
const NO_COMPANY: &str = "Not specified";

/// Seek classification codes for a discipline key.
pub fn classification_codes(discipline: &str) -> &'static str {
    match discipline.trim().to_lowercase().as_str() {
        "computer-science" | "information-technology" => "1223",
        "data-science-and-analytics" => "1223%2C6281",
        "engineering" => "9201",
        "finance" | "accounting" => "1201",
        "mathematics" => "6281",
        "marketing" => "1205",
        "business" => "1202%2C1203",
        "health-sciences" => "2206%2C2712",
        _ => "1223%2C6281",
    }
}

/// "australia" -> "All-Australia", "gold coast" -> "gold-coast".
pub fn seek_location(location: &str) -> String {
    let location = location.trim();
    if location.is_empty() || location.eq_ignore_ascii_case("australia") {
        "All-Australia".to_string()
    } else {
        location.split_whitespace().collect::<Vec<_>>().join("-")
    }
}

/// The URL templates tried in order when one fails or finds nothing.
pub fn search_urls(base_url: &str, query: &SearchQuery) -> Vec<String> {
    let base = base_url.trim_end_matches('/');
    let keyword = query.job_level.keyword();
    let location = seek_location(&query.location);
    let codes = classification_codes(&query.discipline);
    vec![
        format!("{base}/{keyword}-jobs/in-{location}?classification={codes}"),
        format!(
            "{base}/{keyword}-jobs/{}?classification={codes}",
            location.to_lowercase()
        ),
        format!("{base}/jobs?keywords={keyword}&where={location}&classification={codes}"),
    ]
}

static CARDS: LazyLock<SelectorChain> = LazyLock::new(|| {
    SelectorChain::css(
        "seek cards",
        &[
            "article",
            "div[data-automation=\"normalJob\"]",
            "[data-card-type=\"JobCard\"]",
            ".job-card",
        ],
    )
    .then(Ancestor::new("a[data-automation=\"jobTitle\"]", "div", &["job"]))
});

static TITLE: LazyLock<SelectorChain> = LazyLock::new(|| {
    SelectorChain::css(
        "seek title",
        &[
            "a[data-automation=\"jobTitle\"]",
            "a[class*=\"title\"], a[class*=\"Title\"]",
            "h3, h2, h1",
        ],
    )
});

static ANY_LINK: LazyLock<Css> = LazyLock::new(|| Css::new("a[href]"));

static COMPANY: LazyLock<SelectorChain> = LazyLock::new(|| {
    SelectorChain::css(
        "seek company",
        &[
            "a[data-automation=\"jobCompany\"]",
            "a[data-type=\"company\"]",
            ".company-name, .job-company, [data-automation=\"jobCompany\"]",
            "span[class*=\"company\"]",
        ],
    )
});

static LOCATION: LazyLock<SelectorChain> = LazyLock::new(|| {
    SelectorChain::css(
        "seek location",
        &[
            "span[data-automation=\"jobLocation\"]",
            ".location, .job-location, [data-automation=\"jobLocation\"]",
        ],
    )
    .then(TextContains::new(
        "span",
        &["melbourne", "sydney", "brisbane", "perth", "australia"],
    ))
});

static LISTED: LazyLock<SelectorChain> = LazyLock::new(|| {
    SelectorChain::css(
        "seek listing date",
        &[
            "span[data-automation=\"jobListingDate\"]",
            ".date, .listing-date, [data-automation=\"jobListingDate\"]",
            "time",
        ],
    )
    .then(TextContains::new("span", &["day", "hour", "min"]))
});

static WORK_TYPE: LazyLock<SelectorChain> = LazyLock::new(|| {
    SelectorChain::css(
        "seek work type",
        &[
            "span[data-automation=\"jobWorkType\"]",
            ".work-type, .job-type, [data-automation=\"jobWorkType\"]",
        ],
    )
    .then(TextContains::new(
        "span",
        &["full time", "part time", "casual", "contract"],
    ))
});

static PAGINATION: LazyLock<Css> = LazyLock::new(|| {
    Css::new("a[data-automation=\"page-link\"], .pagination a, a.page-number")
});

/// What one Seek results page yielded.
#[derive(Debug, Clone, Default)]
pub struct SeekPage {
    /// Cards found, including ones without a usable link.
    pub card_count: usize,
    pub records: Vec<JobRecord>,
    pub advertised_pages: Vec<u32>,
}

/// Reads every card on a results page. Cards without a link are dropped.
pub fn parse_listing_page(html: &str, site: &Url, today: NaiveDate) -> SeekPage {
    let document = Html::parse_document(html);
    let root = document.root_element();
    let cards = CARDS.matches(root).unwrap_or_default();

    SeekPage {
        card_count: cards.len(),
        records: cards
            .into_iter()
            .filter_map(|card| parse_card(card, site, today))
            .collect(),
        advertised_pages: page_numbers(root, &PAGINATION),
    }
}

fn parse_card(card: ElementRef<'_>, site: &Url, today: NaiveDate) -> Option<JobRecord> {
    let title_elem = TITLE.first(card);
    let title = title_elem
        .map(element_text)
        .filter(|text| !text.is_empty())
        .unwrap_or_else(|| UNTITLED.to_string());

    let href = title_elem
        .filter(|el| el.value().name() == "a")
        .and_then(|el| el.value().attr("href"))
        .or_else(|| {
            ANY_LINK
                .select(card)
                .next()
                .and_then(|a| a.value().attr("href"))
        })?;
    let link = resolve_link(site, href)?;

    let company = COMPANY
        .first_text(card)
        .unwrap_or_else(|| NO_COMPANY.to_string());

    let mut record = JobRecord::new(title, company, link, Source::Seek);
    record.location = LOCATION.first_text(card);
    record.job_type = WORK_TYPE.first_text(card);
    record.date_posted = LISTED.first_text(card);
    record.closing_date = record
        .date_posted
        .as_deref()
        .and_then(|listed| estimate_seek_closing_date(listed, today))
        .map(|date| date.format("%Y-%m-%d").to_string());
    Some(record)
}

pub struct SeekScraper {
    fetcher: Arc<dyn PageFetcher>,
    config: SeekConfig,
}

impl SeekScraper {
    pub fn new(fetcher: Arc<dyn PageFetcher>, config: SeekConfig) -> Self {
        Self { fetcher, config }
    }
}

impl SourceScraper for SeekScraper {
    fn source(&self) -> Source {
        Source::Seek
    }

    fn scrape(&self, query: &SearchQuery) -> EventStream {
        let fetcher = Arc::clone(&self.fetcher);
        let config = self.config.clone();
        let urls = search_urls(&config.base_url, query);

        Box::pin(stream! {
            let site = match parse_site(&config.base_url) {
                Ok(site) => site,
                Err(e) => {
                    yield Err(e);
                    return;
                }
            };
            let today = Local::now().date_naive();
            let mut pages = Pagination::new(config.initial_max_pages, config.page_ceiling_cap);
            let mut tracker = ProgressTracker::new();
            let mut jobs: Vec<JobRecord> = Vec::new();
            // a later URL format usually serves the same listings again
            let mut seen: HashSet<String> = HashSet::new();
            let mut url_index = 0usize;
            let mut total_found = 0usize;
            let mut processed = 0usize;

            while pages.has_more() {
                let page_num = pages.page_num;
                yield Ok(ProgressEvent::progress(
                    tracker.current(),
                    format!("Connecting to Seek (attempt {})...", url_index + 1),
                ));

                let url = with_page(&urls[url_index], page_num);
                let request = PageRequest::get(&url)
                    .with_headers(browser_headers(&config.user_agent))
                    .with_timeout(config.request_timeout);
                let fetched = match fetcher.fetch(&request).await {
                    Ok(page) if page.is_success() => Ok(page),
                    Ok(page) => Err(FetchError::Status { status: page.status, url: url.clone() }),
                    Err(e) => Err(e),
                };
                let page = match fetched {
                    Ok(page) => page,
                    Err(e) => {
                        warn!(url = %url, error = %e, "Failed to retrieve Seek page");
                        if url_index + 1 < urls.len() {
                            url_index += 1;
                            pages.restart();
                            continue;
                        }
                        yield Ok(ProgressEvent::warning(format!(
                            "Failed to retrieve Seek listings with any URL format. {e}"
                        )));
                        break;
                    }
                };

                let listing = parse_listing_page(&page.body, &site, today);
                match pages.check_listing(listing.card_count) {
                    ListingCheck::Fresh => {}
                    ListingCheck::Empty if page_num == 1 => {
                        debug!(url = %url, "No Seek cards with this URL format");
                        if url_index + 1 < urls.len() {
                            url_index += 1;
                            pages.restart();
                            continue;
                        }
                        yield Ok(ProgressEvent::warning(format!(
                            "No job listings found on Seek page {page_num} using any selector."
                        )));
                        break;
                    }
                    ListingCheck::Empty | ListingCheck::Repeated => {
                        yield Ok(ProgressEvent::warning(format!(
                            "No more job listings found after Seek page {}.",
                            page_num - 1
                        )));
                        break;
                    }
                }

                let count = listing.card_count;
                total_found += count;
                info!(page = page_num, jobs = count, "Found Seek jobs");
                yield Ok(ProgressEvent::progress(
                    tracker.advance((page_num as f64 * 10.0).min(50.0)),
                    format!("Found {count} jobs on Seek page {page_num}"),
                ));

                for (index, record) in listing.records.into_iter().enumerate() {
                    processed += 1;
                    let estimate = processed as f64 / (total_found as f64 * 1.5) * 100.0;
                    yield Ok(ProgressEvent::progress(
                        tracker.advance(estimate),
                        format!("Scraping Seek page {page_num}, job {}/{count}", index + 1),
                    ));
                    if is_skipped_company(&record.company, &config.skip_companies) {
                        debug!(company = %record.company, "Skipping company");
                        continue;
                    }
                    if seen.insert(record.link.clone()) {
                        jobs.push(record);
                    }
                }

                if pages.advance(&listing.advertised_pages) == PageAdvance::LastPage {
                    yield Ok(ProgressEvent::warning(format!(
                        "Reached the last available Seek page: {page_num}"
                    )));
                    break;
                }
                tokio::time::sleep(config.page_delay).await;
            }

            info!(jobs = jobs.len(), "Completed Seek scraping");
            yield Ok(ProgressEvent::results(tracker.finish(), "Completed Seek scraping", jobs));
        })
    }
}
