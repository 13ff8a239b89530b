//! Prosple: the board that fights back.
//!
//! Search pages are fetched with a warmed-up session, per-attempt browser
//! identities and classified backoff. When search is blocked (retries
//! exhausted on every URL format, CAPTCHA or login wall) the scraper falls
//! back to crawling employer profiles.
//!
//! Not part of a live search; run it through the CLI.

pub mod blocking;
pub mod employers;
pub mod retry;
pub mod warmup;

use std::collections::HashSet;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use async_stream::stream;
use chrono::Utc;
use common::{JobRecord, ProgressEvent, Source};
use scraper::{ElementRef, Html};
use tracing::{debug, info, warn};
use url::Url;

use self::blocking::detect_blocker;
use self::retry::{AttemptOutcome, RetryDecision, RetryPolicy};
use super::pagination::{ListingCheck, PageAdvance, Pagination};
use super::{is_skipped_company, parse_site, resolve_link, title_from_slug, with_page};
use super::{EventStream, SearchQuery, SourceScraper};
use crate::config::ProspleConfig;
use crate::dates::closing_date_or_raw;
use crate::http::{FetchedPage, PageFetcher, PageRequest};
use crate::identity::{chance, chromium_headers, jitter, pick};
use crate::progress::ProgressTracker;
use crate::selectors::{element_text, page_numbers, Ancestor, Css, SelectorChain};

/// Share of the progress scale given to search mode; employer mode gets the rest.
const SEARCH_SHARE: f64 = 70.0;

pub fn prosple_discipline(discipline: &str) -> &'static str {
    match discipline.trim().to_lowercase().as_str() {
        "computer-science" => "computer-science-information-technology",
        "data-science-and-analytics" => "data-science-analytics",
        "engineering" => "engineering",
        "finance" => "finance-accounting-economics",
        "mathematics" => "mathematics-statistics",
        _ => "all-disciplines",
    }
}

pub fn prosple_location(location: &str) -> String {
    let location = location.trim().to_lowercase();
    if location.is_empty() {
        "australia".to_string()
    } else {
        location.split_whitespace().collect::<Vec<_>>().join("-")
    }
}

/// Search URL formats, tried in order.
pub fn search_urls(base_url: &str, query: &SearchQuery) -> Vec<String> {
    let base = base_url.trim_end_matches('/');
    let level = query.job_level.keyword();
    let discipline = prosple_discipline(&query.discipline);
    let location = prosple_location(&query.location);
    vec![
        format!("{base}/jobs/{level}/{discipline}/{location}"),
        format!("{base}/jobs/{level}/{discipline}"),
        format!("{base}/search-jobs?opportunity_types={level}&disciplines={discipline}"),
        format!("{base}/jobs/{level}-jobs/{discipline}/{location}"),
        format!("{base}/jobs"),
    ]
}

pub fn directory_urls(base_url: &str) -> Vec<String> {
    let base = base_url.trim_end_matches('/');
    ["employers", "employers/popular", "employers/featured"]
        .iter()
        .map(|path| format!("{base}/{path}"))
        .collect()
}

static CARDS: LazyLock<SelectorChain> = LazyLock::new(|| {
    SelectorChain::css(
        "prosple cards",
        &[
            ".opportunity-list-item, .job-card, .listing-item, article",
            ".job-listing, .card, [data-testid=\"job-card\"], .search-result-card",
        ],
    )
    .then(Ancestor::new(
        "a[href*=\"/job/\"], a[href*=\"/opportunity/\"]",
        "div",
        &["card", "job", "listing"],
    ))
});

static CARD_TITLE: LazyLock<Css> = LazyLock::new(|| Css::new(".job-title, .title, h2, h3, .name"));
static CARD_LINK: LazyLock<SelectorChain> = LazyLock::new(|| {
    SelectorChain::css(
        "prosple card link",
        &["a[href*=\"/job/\"], a[href*=\"/opportunity/\"]", "a[href]"],
    )
});
static CARD_COMPANY: LazyLock<Css> =
    LazyLock::new(|| Css::new(".company-name, .employer, .organization"));
static CARD_LOCATION: LazyLock<Css> = LazyLock::new(|| Css::new(".location, .job-location"));
static CARD_TYPE: LazyLock<Css> =
    LazyLock::new(|| Css::new(".job-type, .work-type, .employment-type"));
static CARD_CLOSING: LazyLock<Css> = LazyLock::new(|| Css::new(".closing-date, .deadline"));
static PAGINATION: LazyLock<Css> =
    LazyLock::new(|| Css::new(".pagination a, .page-link, [class*=\"pager\"] a"));

#[derive(Debug, Clone, Default)]
pub struct ProsplePage {
    pub card_count: usize,
    pub records: Vec<JobRecord>,
    pub advertised_pages: Vec<u32>,
}

pub fn parse_search_page(html: &str, site: &Url, disciplines: &str) -> ProsplePage {
    let document = Html::parse_document(html);
    let root = document.root_element();
    let cards = CARDS.matches(root).unwrap_or_default();

    let records = cards
        .iter()
        .filter_map(|card| {
            let href = CARD_LINK.first(*card)?.value().attr("href")?;
            let link = resolve_link(site, href)?;
            let title =
                text_of(&CARD_TITLE, *card).unwrap_or_else(|| "Untitled Position".to_string());
            let company =
                text_of(&CARD_COMPANY, *card).unwrap_or_else(|| "Unknown Company".to_string());

            let mut record = JobRecord::new(title, company, link, Source::Prosple);
            record.location = text_of(&CARD_LOCATION, *card);
            record.job_type = text_of(&CARD_TYPE, *card);
            record.closing_date =
                text_of(&CARD_CLOSING, *card).and_then(|text| closing_date_or_raw(&text));
            record.disciplines = Some(disciplines.to_string());
            Some(record)
        })
        .collect();

    ProsplePage {
        card_count: cards.len(),
        records,
        advertised_pages: page_numbers(root, &PAGINATION),
    }
}

fn text_of(css: &Css, scope: ElementRef<'_>) -> Option<String> {
    css.select(scope)
        .next()
        .map(element_text)
        .filter(|text| !text.is_empty())
}

/// Where the scraper is in its search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Search { url_index: usize },
    Employers,
    Done,
}

/// Picks the phase after search URL `url_index` stopped yielding jobs.
fn next_format(url_index: usize, format_count: usize) -> Phase {
    if url_index + 1 < format_count {
        Phase::Search {
            url_index: url_index + 1,
        }
    } else {
        Phase::Employers
    }
}

fn tracking_query() -> Vec<(String, String)> {
    vec![
        (
            "source".to_string(),
            pick(&["direct", "search", "linkedin", "recommendation"]).to_string(),
        ),
        (
            "utm_medium".to_string(),
            pick(&["organic", "referral", "social"]).to_string(),
        ),
        ("_".to_string(), Utc::now().timestamp_millis().to_string()),
    ]
}

pub struct ProspleScraper {
    fetcher: Arc<dyn PageFetcher>,
    config: ProspleConfig,
}

impl ProspleScraper {
    pub fn new(fetcher: Arc<dyn PageFetcher>, config: ProspleConfig) -> Self {
        Self { fetcher, config }
    }
}

/// Request for one search attempt: an external referrer on the first attempt
/// and sometimes later, otherwise an internal one.
fn search_request(
    config: &ProspleConfig,
    url: &str,
    user_agent: &str,
    attempt: u32,
) -> PageRequest {
    let base = config.base_url.trim_end_matches('/');
    let referrer = match config.identities.pick_referrer() {
        Some(external) if attempt == 0 || chance(0.5) => external.to_string(),
        _ => format!("{base}/{}", pick(&["", "about", "employers", "jobs"])),
    };
    let mut request = PageRequest::get(url)
        .with_headers(chromium_headers(user_agent))
        .with_header("Referer", referrer)
        .with_timeout(config.request_timeout);
    if chance(config.tracking_param_probability) {
        request = request.with_query(tracking_query());
    }
    request
}

fn employer_request(config: &ProspleConfig, url: &str, referrer: String) -> PageRequest {
    let mut request = PageRequest::get(url)
        .with_headers(chromium_headers(config.identities.pick_user_agent()))
        .with_header("Referer", referrer)
        .with_timeout(config.warm_up_timeout);
    if chance(config.tracking_param_probability) {
        request = request.with_query(tracking_query());
    }
    request
}

impl SourceScraper for ProspleScraper {
    fn source(&self) -> Source {
        Source::Prosple
    }

    fn scrape(&self, query: &SearchQuery) -> EventStream {
        let fetcher = Arc::clone(&self.fetcher);
        let config = self.config.clone();
        let formats = search_urls(&config.base_url, query);
        let directories = directory_urls(&config.base_url);
        let disciplines = title_from_slug(prosple_discipline(&query.discipline));
        let policy = RetryPolicy::new(config.max_attempts);

        Box::pin(stream! {
            let site = match parse_site(&config.base_url) {
                Ok(site) => site,
                Err(e) => {
                    yield Err(e);
                    return;
                }
            };

            warmup::seed_session(fetcher.as_ref(), &config);
            if config.warm_up {
                match warmup::warm_up(fetcher.as_ref(), &config).await {
                    Ok(visited) => debug!(visited, "Prosple session warmed up"),
                    Err(e) => {
                        warn!(error = %e, "Error initializing Prosple session");
                        yield Ok(ProgressEvent::warning(format!(
                            "Error initializing session: {e}"
                        )));
                    }
                }
            }

            let mut phase = Phase::Search { url_index: 0 };
            let mut pages = Pagination::new(config.max_pages, config.max_pages);
            let mut tracker = ProgressTracker::new();
            let mut jobs: Vec<JobRecord> = Vec::new();
            let mut seen: HashSet<String> = HashSet::new();
            let mut total_found = 0usize;
            let mut processed = 0usize;

            while let Phase::Search { url_index } = phase {
                let page_num = pages.page_num;
                let url = with_page(&formats[url_index], page_num);
                let mut user_agent = config.identities.pick_user_agent().to_string();
                let mut attempt = 0u32;

                let page: Option<FetchedPage> = loop {
                    yield Ok(ProgressEvent::progress(
                        tracker.current(),
                        format!("Connecting to Prosple (attempt {})...", attempt + 1),
                    ));
                    let pause = config.attempt_pause.sample()
                        + Duration::from_secs(u64::from(attempt));
                    tokio::time::sleep(pause).await;

                    let request = search_request(&config, &url, &user_agent, attempt);
                    let result = fetcher.fetch(&request).await;
                    let Some(outcome) = AttemptOutcome::classify(&result) else {
                        break result.ok();
                    };

                    attempt += 1;
                    warn!(url = %url, attempt, ?outcome, "Prosple request failed");
                    yield Ok(ProgressEvent::warning(outcome.warning(attempt, policy.max_attempts)));
                    match policy.decide(attempt, &outcome, jitter()) {
                        RetryDecision::RetryAfter { delay, rotate_identity } => {
                            if rotate_identity {
                                user_agent = config.identities.pick_user_agent().to_string();
                            }
                            tokio::time::sleep(delay).await;
                        }
                        RetryDecision::GiveUp => break None,
                    }
                };

                let Some(page) = page else {
                    phase = next_format(url_index, formats.len());
                    pages.restart();
                    yield Ok(ProgressEvent::warning(match phase {
                        Phase::Search { url_index } => format!(
                            "Trying alternative Prosple URL format {}/{}...",
                            url_index + 1,
                            formats.len()
                        ),
                        _ => "Could not access Prosple job listings. Switching to employer browsing mode...".to_string(),
                    }));
                    continue;
                };

                if let Some(blocker) = detect_blocker(&page.body) {
                    info!(url = %url, ?blocker, "Prosple search blocked");
                    yield Ok(ProgressEvent::warning(blocker.warning()));
                    phase = Phase::Employers;
                    continue;
                }

                let listing = parse_search_page(&page.body, &site, &disciplines);
                match pages.check_listing(listing.card_count) {
                    ListingCheck::Fresh => {}
                    ListingCheck::Empty | ListingCheck::Repeated => {
                        yield Ok(ProgressEvent::warning(format!(
                            "No more job listings found after Prosple page {}.",
                            page_num.saturating_sub(1)
                        )));
                        phase = next_format(url_index, formats.len());
                        pages.restart();
                        yield Ok(ProgressEvent::warning(match phase {
                            Phase::Search { url_index } => format!(
                                "Trying alternative Prosple URL format {}/{}...",
                                url_index + 1,
                                formats.len()
                            ),
                            _ => "No more job listings. Switching to employer browsing mode...".to_string(),
                        }));
                        continue;
                    }
                }

                let count = listing.card_count;
                total_found += count;
                info!(page = page_num, jobs = count, "Found Prosple jobs");
                yield Ok(ProgressEvent::progress(
                    tracker.current(),
                    format!("Found {count} jobs on Prosple page {page_num}"),
                ));

                for (index, record) in listing.records.into_iter().enumerate() {
                    processed += 1;
                    let estimate = processed as f64 / (total_found as f64 * 1.5) * SEARCH_SHARE;
                    yield Ok(ProgressEvent::progress(
                        tracker.advance(estimate),
                        format!("Scraping Prosple page {page_num}, job {}/{count}", index + 1),
                    ));
                    if !is_skipped_company(&record.company, &config.skip_companies)
                        && seen.insert(record.link.clone())
                    {
                        jobs.push(record);
                    }
                }

                if pages.advance(&listing.advertised_pages) == PageAdvance::LastPage {
                    info!(page = page_num, "Reached the last Prosple page");
                    phase = Phase::Done;
                    continue;
                }
                tokio::time::sleep(config.page_pause.sample()).await;
            }

            if phase == Phase::Employers {
                let mut employer_list: Vec<String> = Vec::new();
                for directory in &directories {
                    yield Ok(ProgressEvent::progress(
                        tracker.advance(SEARCH_SHARE),
                        "Browsing employers on Prosple...",
                    ));
                    tokio::time::sleep(config.employer_pause.sample()).await;

                    let referrer =
                        config.identities.pick_referrer().unwrap_or_default().to_string();
                    let request = employer_request(&config, directory, referrer);
                    match fetcher.fetch(&request).await {
                        Ok(page) if page.is_success() => {
                            for employer in employers::parse_directory(&page.body, &site) {
                                if !employer_list.contains(&employer) {
                                    employer_list.push(employer);
                                }
                            }
                        }
                        Ok(page) => debug!(
                            url = %directory,
                            status = page.status,
                            "Employer directory unavailable"
                        ),
                        Err(e) => warn!(url = %directory, error = %e, "Error fetching employers"),
                    }
                    if !employer_list.is_empty() {
                        yield Ok(ProgressEvent::progress(
                            tracker.current(),
                            format!("Found {} employers on Prosple", employer_list.len()),
                        ));
                        break;
                    }
                }

                let employer_count = employer_list.len();
                for (index, employer) in employer_list.iter().enumerate() {
                    let remaining = 100.0 - SEARCH_SHARE;
                    yield Ok(ProgressEvent::progress(
                        tracker.advance(
                            SEARCH_SHARE + remaining * index as f64 / employer_count as f64,
                        ),
                        format!("Checking employer {}/{employer_count} on Prosple...", index + 1),
                    ));
                    tokio::time::sleep(config.employer_pause.sample()).await;

                    let referrer = match config.identities.pick_referrer() {
                        Some(external) if chance(0.7) => external.to_string(),
                        _ => directories[0].clone(),
                    };
                    let request = employer_request(&config, employer, referrer);
                    let page = match fetcher.fetch(&request).await {
                        Ok(page) if page.is_success() => page,
                        Ok(page) => {
                            debug!(
                                url = %employer,
                                status = page.status,
                                "Employer page unavailable"
                            );
                            continue;
                        }
                        Err(e) => {
                            warn!(url = %employer, error = %e, "Error processing employer");
                            continue;
                        }
                    };

                    let found = employers::parse_employer_page(&page.body, &site, &disciplines);
                    for record in found {
                        if jobs.len() >= config.employer_job_cap {
                            break;
                        }
                        if !is_skipped_company(&record.company, &config.skip_companies)
                            && seen.insert(record.link.clone())
                        {
                            jobs.push(record);
                        }
                    }
                    if !jobs.is_empty() {
                        yield Ok(ProgressEvent::progress(
                            tracker.current(),
                            format!("Found {} jobs from Prosple employers", jobs.len()),
                        ));
                    }
                    if jobs.len() >= config.employer_job_cap {
                        info!(jobs = jobs.len(), "Employer job cap reached");
                        break;
                    }
                }
            }

            if jobs.is_empty() {
                yield Ok(ProgressEvent::warning(
                    "Could not retrieve any jobs from Prosple. They may have implemented stronger protections against automated access.",
                ));
            }
            info!(jobs = jobs.len(), "Completed Prosple scraping");
            yield Ok(ProgressEvent::results(tracker.finish(), "Completed Prosple scraping", jobs));
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::IdentityPool;
    use crate::testing::{MockFetcher, MockReply};
    use common::JobLevel;
    use futures::StreamExt;

    const BASE: &str = "https://prosple.test";
    const FIRST: &str = "https://prosple.test/jobs/graduate/computer-science-information-technology/australia";

    fn query() -> SearchQuery {
        SearchQuery::new(JobLevel::GraduateJobs, "computer-science", "australia")
    }

    fn config() -> ProspleConfig {
        ProspleConfig::default()
            .with_base_url(BASE)
            .with_identities(IdentityPool::single("TestAgent/1.0", "https://referrer.test/"))
            .with_warm_up(false)
            .deterministic()
    }

    fn search_page(titles: &[&str]) -> String {
        let cards: String = titles
            .iter()
            .enumerate()
            .map(|(i, title)| {
                format!(
                    r#"<div class="opportunity-list-item"><h3 class="job-title">{title}</h3>
                    <a href="/job/{i}">View</a><span class="company-name">Company {i}</span>
                    <span class="location">Sydney</span></div>"#
                )
            })
            .collect();
        format!("<html><body>{cards}</body></html>")
    }

    async fn run(fetcher: Arc<MockFetcher>, config: ProspleConfig) -> Vec<ProgressEvent> {
        ProspleScraper::new(fetcher, config)
            .scrape(&query())
            .map(Result::unwrap)
            .collect()
            .await
    }

    fn warnings(events: &[ProgressEvent]) -> Vec<String> {
        events
            .iter()
            .filter_map(|e| match e {
                ProgressEvent::Warning { warning } => Some(warning.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_url_formats() {
        let query = SearchQuery::new(JobLevel::Internships, "finance", "gold coast");
        let urls = search_urls("https://au.prosple.com", &query);
        assert_eq!(urls.len(), 5);
        assert_eq!(
            urls[0],
            "https://au.prosple.com/jobs/internship/finance-accounting-economics/gold-coast"
        );
        assert_eq!(
            urls[2],
            "https://au.prosple.com/search-jobs?opportunity_types=internship&disciplines=finance-accounting-economics"
        );
        assert_eq!(urls[4], "https://au.prosple.com/jobs");
        assert_eq!(prosple_discipline("law"), "all-disciplines");
    }

    #[test]
    fn test_search_page_cards() {
        let site = Url::parse(BASE).unwrap();
        let page = parse_search_page(&search_page(&["Graduate Developer"]), &site, "Engineering");
        assert_eq!(page.card_count, 1);
        let record = &page.records[0];
        assert_eq!(record.title, "Graduate Developer");
        assert_eq!(record.company, "Company 0");
        assert_eq!(record.link, "https://prosple.test/job/0");
        assert_eq!(record.disciplines.as_deref(), Some("Engineering"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_success_stops_at_page_ceiling() {
        let fetcher = Arc::new(MockFetcher::new().on_page(FIRST, search_page(&["A", "B"])));
        let events = run(Arc::clone(&fetcher), config().with_max_pages(1)).await;

        assert_eq!(fetcher.requested_urls(), vec![FIRST.to_string()]);
        let records = events.last().and_then(ProgressEvent::records).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(
            records[0].disciplines.as_deref(),
            Some("Computer Science Information Technology")
        );
        assert!(warnings(&events).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_forbidden_and_rate_limited() {
        let fetcher = MockFetcher::new().on_sequence(
            FIRST,
            vec![
                MockReply::status(403),
                MockReply::status(429),
                MockReply::page(search_page(&["A"])),
            ],
        );
        let fetcher = Arc::new(fetcher);
        let events = run(Arc::clone(&fetcher), config().with_max_pages(1)).await;

        assert_eq!(fetcher.request_count(FIRST), 3);
        let warnings = warnings(&events);
        assert!(warnings[0].starts_with("Access denied by Prosple (403)"));
        assert!(warnings[1].starts_with("Rate limited by Prosple (429)"));
        assert_eq!(events.last().and_then(ProgressEvent::records).map(<[_]>::len), Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_captcha_switches_to_employers_and_caps_jobs() {
        let employer_page = |name: &str, slugs: &[&str]| {
            let jobs: String = slugs
                .iter()
                .map(|slug| format!(r#"<a href="/job/{slug}">{slug}</a>"#))
                .collect();
            format!("<html><body><h1>{name}</h1>{jobs}</body></html>")
        };
        let fetcher = MockFetcher::new()
            .on_page(FIRST, r#"<html><body><div class="captcha-wall"></div></body></html>"#)
            .on_page(
                "https://prosple.test/employers",
                r#"<html><body><a href="/employer/one">One</a><a href="/employer/two">Two</a><a href="/employer/three">Three</a></body></html>"#,
            )
            .on_page("https://prosple.test/employer/one", employer_page("One", &["a", "b"]))
            .on_page("https://prosple.test/employer/two", employer_page("Two", &["c", "d"]))
            .on_page("https://prosple.test/employer/three", employer_page("Three", &["e"]));
        let fetcher = Arc::new(fetcher);
        let events = run(Arc::clone(&fetcher), config().with_employer_job_cap(3)).await;

        assert!(warnings(&events).contains(
            &"Detected CAPTCHA on Prosple. Switching to employer browsing mode...".to_string()
        ));
        let records = events.last().and_then(ProgressEvent::records).unwrap();
        let links: Vec<_> = records.iter().map(|r| r.link.as_str()).collect();
        assert_eq!(
            links,
            vec![
                "https://prosple.test/job/a",
                "https://prosple.test/job/b",
                "https://prosple.test/job/c"
            ]
        );
        assert_eq!(records[2].company, "Two");
        assert_eq!(fetcher.request_count("https://prosple.test/employer/three"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_format_switch_does_not_repeat_jobs() {
        let second = "https://prosple.test/jobs/graduate/computer-science-information-technology";
        let fetcher = MockFetcher::new()
            .on_page(FIRST, search_page(&["A", "B"]))
            .on_page(second, search_page(&["A", "B"]))
            .with_fallback(MockReply::status(403));
        let fetcher = Arc::new(fetcher);
        let events = run(Arc::clone(&fetcher), config().with_max_pages(2)).await;

        assert_eq!(fetcher.request_count(&format!("{FIRST}?page=2")), 4);
        assert_eq!(fetcher.request_count(second), 1);
        let records = events.last().and_then(ProgressEvent::records).unwrap();
        let links: Vec<_> = records.iter().map(|r| r.link.as_str()).collect();
        assert_eq!(links, vec!["https://prosple.test/job/0", "https://prosple.test/job/1"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_skip_listed_company_dropped_from_search() {
        let html = r#"<html><body>
            <div class="opportunity-list-item"><h3 class="job-title">Graduate Program</h3>
              <a href="/job/rg">View</a><span class="company-name">ReadyGrad</span></div>
            <div class="opportunity-list-item"><h3 class="job-title">Graduate Developer</h3>
              <a href="/job/acme">View</a><span class="company-name">Acme</span></div>
        </body></html>"#;
        let fetcher = Arc::new(MockFetcher::new().on_page(FIRST, html));
        let events = run(fetcher, config().with_max_pages(1)).await;

        let records = events.last().and_then(ProgressEvent::records).unwrap();
        let companies: Vec<_> = records.iter().map(|r| r.company.as_str()).collect();
        assert_eq!(companies, vec!["Acme"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_skip_listed_employer_dropped() {
        let fetcher = MockFetcher::new()
            .on_page(FIRST, r#"<html><body><form action="/captcha"></form></body></html>"#)
            .on_page(
                "https://prosple.test/employers",
                r#"<html><body><a href="/employer/readygrad">ReadyGrad</a><a href="/employer/acme">Acme</a></body></html>"#,
            )
            .on_page(
                "https://prosple.test/employer/readygrad",
                r#"<html><body><h1>ReadyGrad</h1><a href="/job/rg">Placement Program</a></body></html>"#,
            )
            .on_page(
                "https://prosple.test/employer/acme",
                r#"<html><body><h1>Acme</h1><a href="/job/acme">Graduate Engineer</a></body></html>"#,
            );
        let events = run(Arc::new(fetcher), config()).await;

        let records = events.last().and_then(ProgressEvent::records).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].company, "Acme");
        assert_eq!(records[0].link, "https://prosple.test/job/acme");
    }

    #[tokio::test(start_paused = true)]
    async fn test_everything_blocked_ends_with_no_jobs_warning() {
        let fetcher = Arc::new(MockFetcher::new().with_fallback(MockReply::status(403)));
        let events = run(Arc::clone(&fetcher), config()).await;

        // four attempts on each of five formats, then the three directories
        assert_eq!(fetcher.requested_urls().len(), 23);
        let warnings = warnings(&events);
        assert!(warnings.contains(&"Trying alternative Prosple URL format 5/5...".to_string()));
        assert!(warnings.contains(
            &"Could not access Prosple job listings. Switching to employer browsing mode..."
                .to_string()
        ));
        assert!(warnings.last().unwrap().starts_with("Could not retrieve any jobs from Prosple"));

        let mut last = 0.0;
        for value in events.iter().filter_map(ProgressEvent::progress_value) {
            assert!(value >= last);
            last = value;
        }
        assert_eq!(last, 100.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_warm_up_precedes_search() {
        let fetcher = Arc::new(MockFetcher::new().on_page(FIRST, search_page(&["A"])));
        run(Arc::clone(&fetcher), config().with_warm_up(true).with_max_pages(1)).await;

        let urls = fetcher.requested_urls();
        assert_eq!(
            &urls[..3],
            [
                "https://prosple.test/",
                "https://prosple.test/about",
                "https://prosple.test/employers"
            ]
        );
        assert_eq!(urls[3], FIRST);
        assert_eq!(fetcher.seeded_cookies().len(), 4);
    }
}
