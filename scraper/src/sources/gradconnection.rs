//! GradConnection: paginated search results, one detail page per job.

use std::sync::{Arc, LazyLock};

use async_stream::stream;
use common::{JobLevel, JobRecord, ProgressEvent, Source};
use scraper::{ElementRef, Html};
use tracing::{debug, info, warn};

use super::pagination::{ListingCheck, PageAdvance, Pagination};
use super::{is_skipped_company, parse_site, resolve_link, title_from_slug, with_page};
use super::{EventStream, SearchQuery, SourceScraper};
use crate::config::GradConnectionConfig;
use crate::dates::closing_date_or_raw;
use crate::error::FetchError;
use crate::http::{fetch_with_retry, PageFetcher, PageRequest};
use crate::identity::browser_headers;
use crate::progress::ProgressTracker;
use crate::selectors::{
    collapse_whitespace, element_text, page_numbers, Css, HrefContains, SelectorChain,
};

static LISTING_LINKS: LazyLock<SelectorChain> = LazyLock::new(|| {
    SelectorChain::css(
        "gradconnection listing",
        &[
            "a.box-header-title",
            "a.job-title",
            ".job-listing a[href*=\"/job/\"]",
            "article a[href*=\"/job/\"]",
            ".box a[href*=\"/graduate-program/\"]",
            ".box a[href*=\"/internship/\"]",
        ],
    )
    .then(
        HrefContains::new(&["/job/", "/jobs/", "/graduate-program/", "/internship/"])
            .excluding(&["notifyme"]),
    )
});

static PAGINATION: LazyLock<Css> = LazyLock::new(|| Css::new(".pagination a"));

static DETAIL_ITEMS: LazyLock<SelectorChain> = LazyLock::new(|| {
    SelectorChain::css(
        "gradconnection detail items",
        &[
            "li.box-content-catagories.catagories-list",
            ".job-details li",
            ".opportunity-elements__item",
        ],
    )
});

static ITEM_LABEL: LazyLock<SelectorChain> = LazyLock::new(|| {
    SelectorChain::css(
        "gradconnection item label",
        &["strong.box-content-catagories-bold", "strong", ".opportunity-elements__label"],
    )
});

static ITEM_VALUE: LazyLock<Css> = LazyLock::new(|| Css::new(".opportunity-elements__value"));

static COMPANY: LazyLock<SelectorChain> = LazyLock::new(|| {
    SelectorChain::css(
        "gradconnection company",
        &[
            "h1.employers-panel-title",
            "h1.employer-name",
            ".company-name",
            ".m-employer-logo h1",
            ".employer-branding__title h1",
        ],
    )
});

static TITLE: LazyLock<SelectorChain> = LazyLock::new(|| {
    SelectorChain::css(
        "gradconnection title",
        &["h1.employers-profile-h1", "h1.job-header__title", ".job-title", "h1.page-header"],
    )
});

static SITE_NAME: LazyLock<Css> = LazyLock::new(|| Css::new("meta[property=\"og:site_name\"]"));
static PAGE_TITLE: LazyLock<Css> = LazyLock::new(|| Css::new("title"));

/// Job hrefs (as written in the page) and the page numbers it links to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingPage {
    pub job_links: Vec<String>,
    pub advertised_pages: Vec<u32>,
}

pub fn listing_url(base_url: &str, query: &SearchQuery) -> String {
    format!(
        "{}/{}/{}/{}/",
        base_url.trim_end_matches('/'),
        query.job_level.slug(),
        query.discipline.trim(),
        query.location.trim()
    )
}

pub fn parse_listing_page(html: &str) -> ListingPage {
    let document = Html::parse_document(html);
    let root = document.root_element();

    let job_links = LISTING_LINKS
        .matches(root)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|a| a.value().attr("href"))
        .filter(|href| !href.contains("notifyme"))
        .map(str::to_string)
        .collect();

    ListingPage {
        job_links,
        advertised_pages: page_numbers(root, &PAGINATION),
    }
}

/// Label and value of one detail list item.
fn item_fields(item: ElementRef<'_>) -> (String, String) {
    let full = element_text(item);
    if let Some(value) = ITEM_VALUE.select(item).next() {
        let value = element_text(value);
        let label = full.replace(&value, "");
        return (collapse_whitespace(&label), value);
    }
    match ITEM_LABEL.first_text(item) {
        Some(label) => {
            let value = full.replacen(&label, "", 1);
            (label, collapse_whitespace(&value))
        }
        None => (String::new(), full),
    }
}

fn non_empty(text: String) -> Option<String> {
    let text = text.trim().to_string();
    (!text.is_empty()).then_some(text)
}

/// Builds a record from a detail page. Never fails: fields that cannot be
/// found stay empty and title/company fall back to page title, URL or
/// placeholder text.
pub fn parse_detail_page(html: &str, link: &str, job_level: JobLevel) -> JobRecord {
    let document = Html::parse_document(html);
    let root = document.root_element();

    let title = TITLE
        .first_text(root)
        .or_else(|| {
            PAGE_TITLE
                .select(root)
                .next()
                .map(element_text)
                .and_then(|text| {
                    non_empty(text.split(" | ").next().unwrap_or_default().to_string())
                })
        })
        .or_else(|| {
            link.trim_end_matches('/')
                .rsplit('/')
                .next()
                .map(title_from_slug)
                .filter(|title| !title.is_empty())
        })
        .unwrap_or_else(|| "Unknown Title".to_string());

    let company = COMPANY
        .first_text(root)
        .or_else(|| {
            SITE_NAME
                .select(root)
                .next()
                .and_then(|meta| meta.value().attr("content"))
                .and_then(|content| non_empty(content.to_string()))
        })
        .or_else(|| employer_from_link(link))
        .unwrap_or_else(|| "Unknown Company".to_string());

    let mut record = JobRecord::new(title, company, link, Source::GradConnection);

    for item in DETAIL_ITEMS.matches(root).unwrap_or_default() {
        let (label, value) = item_fields(item);
        let label = label.to_lowercase();
        if label.contains("job type") {
            record.job_type = non_empty(value);
        } else if label.contains("disciplin") {
            record.disciplines = non_empty(value);
        } else if label.contains("location") {
            record.location = non_empty(value.replace("...show more", "").replace("show more", ""));
        } else if label.contains("international") {
            let accepted = !value.trim().to_lowercase().starts_with("no");
            record.international = Some(if accepted { "Yes" } else { "No" }.to_string());
        } else if label.contains("closing date") {
            record.closing_date = closing_date_or_raw(&value);
        } else if label.contains("start date") {
            record.position_start_date = non_empty(value);
        }
    }

    if record.job_type.is_none() {
        record.job_type = Some(job_level.display_name().to_string());
    }
    record
}

/// ".../employers/acme-corp/jobs/..." -> "Acme Corp".
fn employer_from_link(link: &str) -> Option<String> {
    let mut segments = link.split('/');
    segments.find(|segment| *segment == "employers")?;
    segments
        .next()
        .map(title_from_slug)
        .filter(|name| !name.is_empty())
}

/// Fetches and parses one job. `Ok(None)` for non-2xx pages and skip-listed
/// companies.
pub(crate) async fn fetch_detail(
    fetcher: &dyn PageFetcher,
    config: &GradConnectionConfig,
    link: &str,
    job_level: JobLevel,
) -> Result<Option<JobRecord>, FetchError> {
    let request = PageRequest::get(link)
        .with_headers(browser_headers(&config.user_agent))
        .with_timeout(config.request_timeout);
    let page = fetcher.fetch(&request).await?;
    if !page.is_success() {
        warn!(url = link, status = page.status, "Failed to retrieve job details");
        return Ok(None);
    }

    let record = parse_detail_page(&page.body, link, job_level);
    if is_skipped_company(&record.company, &config.skip_companies) {
        debug!(company = %record.company, url = link, "Skipping company");
        return Ok(None);
    }
    Ok(Some(record))
}

pub struct GradConnectionScraper {
    fetcher: Arc<dyn PageFetcher>,
    config: GradConnectionConfig,
}

impl GradConnectionScraper {
    pub fn new(fetcher: Arc<dyn PageFetcher>, config: GradConnectionConfig) -> Self {
        Self { fetcher, config }
    }
}

impl SourceScraper for GradConnectionScraper {
    fn source(&self) -> Source {
        Source::GradConnection
    }

    fn scrape(&self, query: &SearchQuery) -> EventStream {
        let fetcher = Arc::clone(&self.fetcher);
        let config = self.config.clone();
        let query = query.clone();

        Box::pin(stream! {
            let site = match parse_site(&config.base_url) {
                Ok(site) => site,
                Err(e) => {
                    yield Err(e);
                    return;
                }
            };
            let base_url = listing_url(&config.base_url, &query);
            let mut pages = Pagination::new(config.initial_max_pages, config.page_ceiling_cap);
            let mut tracker = ProgressTracker::new();
            let mut jobs: Vec<JobRecord> = Vec::new();
            let mut total_found = 0usize;
            let mut processed = 0usize;

            info!(url = %base_url, "Starting GradConnection scrape");

            while pages.has_more() {
                let page_num = pages.page_num;
                yield Ok(ProgressEvent::progress(
                    tracker.current(),
                    format!("Connecting to GradConnection page {page_num}..."),
                ));

                let request = PageRequest::get(with_page(&base_url, page_num))
                    .with_headers(browser_headers(&config.user_agent))
                    .with_timeout(config.request_timeout);
                let page = match fetch_with_retry(fetcher.as_ref(), &request, &config.retry).await {
                    Ok(page) => page,
                    Err(e) => {
                        warn!(
                            page = page_num,
                            error = %e,
                            "Failed to retrieve GradConnection page"
                        );
                        yield Ok(ProgressEvent::warning(format!(
                            "Failed to retrieve GradConnection page {page_num}. {e}"
                        )));
                        break;
                    }
                };

                let listing = parse_listing_page(&page.body);
                let count = listing.job_links.len();
                match pages.check_listing(count) {
                    ListingCheck::Fresh => {}
                    ListingCheck::Empty => {
                        info!(page = page_num, "No job listings found");
                        yield Ok(ProgressEvent::warning(format!(
                            "No job listings found on GradConnection page {page_num}."
                        )));
                        break;
                    }
                    ListingCheck::Repeated => {
                        info!(page = page_num, "Listing repeated previous page");
                        yield Ok(ProgressEvent::warning(format!(
                            "No more job listings found after GradConnection page {}.",
                            page_num - 1
                        )));
                        break;
                    }
                }

                total_found += count;
                info!(page = page_num, jobs = count, "Found GradConnection jobs");
                yield Ok(ProgressEvent::progress(
                    tracker.current(),
                    format!("Found {count} jobs on GradConnection page {page_num}"),
                ));

                for (index, href) in listing.job_links.iter().enumerate() {
                    processed += 1;
                    // a detail fetch per job plus its share of the listing fetches
                    let estimate = processed as f64 / (total_found as f64 * 1.5) * 100.0;
                    yield Ok(ProgressEvent::progress(
                        tracker.advance(estimate),
                        format!(
                            "Scraping GradConnection page {page_num}, job {}/{count}",
                            index + 1
                        ),
                    ));

                    let Some(link) = resolve_link(&site, href) else {
                        continue;
                    };
                    match fetch_detail(fetcher.as_ref(), &config, &link, query.job_level).await {
                        Ok(Some(record)) => jobs.push(record),
                        Ok(None) => {}
                        Err(e) => warn!(url = %link, error = %e, "Error processing job"),
                    }
                    tokio::time::sleep(config.job_delay).await;
                }

                if pages.advance(&listing.advertised_pages) == PageAdvance::LastPage {
                    yield Ok(ProgressEvent::warning(format!(
                        "Reached the last available GradConnection page: {page_num}"
                    )));
                    break;
                }
                tokio::time::sleep(config.page_delay).await;
            }

            info!(jobs = jobs.len(), "Completed GradConnection scraping");
            yield Ok(ProgressEvent::results(
                tracker.finish(),
                "Completed GradConnection scraping",
                jobs,
            ));
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{gradconnection_detail, gradconnection_listing, MockFetcher, MockReply};
    use futures::StreamExt;

    const BASE: &str = "https://gc.test";
    const PAGE_1: &str = "https://gc.test/graduate-jobs/computer-science/australia/";
    const PAGE_2: &str = "https://gc.test/graduate-jobs/computer-science/australia/?page=2";

    fn query() -> SearchQuery {
        SearchQuery::new(JobLevel::GraduateJobs, "computer-science", "australia")
    }

    fn scraper(fetcher: Arc<MockFetcher>, max_pages: u32) -> GradConnectionScraper {
        let config = GradConnectionConfig::default()
            .with_base_url(BASE)
            .with_initial_max_pages(max_pages)
            .without_delays();
        GradConnectionScraper::new(fetcher, config)
    }

    async fn collect(scraper: &GradConnectionScraper) -> Vec<ProgressEvent> {
        scraper
            .scrape(&query())
            .map(|event| event.expect("source failed"))
            .collect()
            .await
    }

    #[test]
    fn test_listing_skips_notifyme_links() {
        let html = r#"<html><body>
            <a class="box-header-title" href="/job/one">One</a>
            <a class="box-header-title" href="/notifyme/two">Two</a>
            <div class="pagination"><a>1</a><a>2</a><a>Next</a></div>
        </body></html>"#;
        let listing = parse_listing_page(html);
        assert_eq!(listing.job_links, vec!["/job/one"]);
        assert_eq!(listing.advertised_pages, vec![1, 2]);
    }

    #[test]
    fn test_listing_falls_back_to_href_patterns() {
        let html = r#"<html><body>
            <div><a href="/graduate-program/acme-2026">Acme</a></div>
            <div><a href="/internship/notifyme">Alert</a></div>
            <div><a href="/about">About</a></div>
        </body></html>"#;
        let listing = parse_listing_page(html);
        assert_eq!(listing.job_links, vec!["/graduate-program/acme-2026"]);
    }

    #[test]
    fn test_detail_page_fields() {
        let html = gradconnection_detail(
            "Software Graduate",
            "Atlassian",
            "Sydney ...show more",
            "1st April 2026",
        );
        let record = parse_detail_page(&html, "https://gc.test/job/1", JobLevel::GraduateJobs);

        assert_eq!(record.title, "Software Graduate");
        assert_eq!(record.company, "Atlassian");
        assert_eq!(record.job_type.as_deref(), Some("Graduate Job"));
        assert_eq!(record.disciplines.as_deref(), Some("Computer Science, IT"));
        assert_eq!(record.location.as_deref(), Some("Sydney"));
        assert_eq!(record.international.as_deref(), Some("Yes"));
        assert_eq!(record.closing_date.as_deref(), Some("2026-04-01"));
        assert_eq!(record.position_start_date.as_deref(), Some("February 2026"));
        assert_eq!(record.source, Source::GradConnection);
    }

    #[test]
    fn test_detail_page_opportunity_markup() {
        let html = r#"<html><body>
            <h1 class="employer-name">Canva</h1>
            <h1 class="job-header__title">Data Intern</h1>
            <div class="opportunity-elements__item"><span>Locations</span><span class="opportunity-elements__value">Melbourne, Sydney</span></div>
            <div class="opportunity-elements__item"><span>Accepts International</span><span class="opportunity-elements__value">No</span></div>
            <div class="opportunity-elements__item"><span>Closing Date</span><span class="opportunity-elements__value">Rolling applications</span></div>
        </body></html>"#;
        let record = parse_detail_page(html, "https://gc.test/job/2", JobLevel::Internships);

        assert_eq!(record.title, "Data Intern");
        assert_eq!(record.company, "Canva");
        assert_eq!(record.location.as_deref(), Some("Melbourne, Sydney"));
        assert_eq!(record.international.as_deref(), Some("No"));
        assert_eq!(record.closing_date.as_deref(), Some("Rolling applications"));
        assert_eq!(record.job_type.as_deref(), Some("Internship"));
    }

    #[test]
    fn test_detail_page_falls_back_to_title_and_url() {
        let html = "<html><head><title>Cyber Graduate | GradConnection</title></head><body></body></html>";
        let record = parse_detail_page(
            html,
            "https://gc.test/employers/acme-corp/jobs/cyber-graduate",
            JobLevel::GraduateJobs,
        );
        assert_eq!(record.title, "Cyber Graduate");
        assert_eq!(record.company, "Acme Corp");

        let bare = parse_detail_page(
            "<html></html>",
            "https://gc.test/jobs/cloud-engineer/",
            JobLevel::GraduateJobs,
        );
        assert_eq!(bare.title, "Cloud Engineer");
        assert_eq!(bare.company, "Unknown Company");
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_first_page_warns_once_without_detail_fetch() {
        let fetcher =
            Arc::new(MockFetcher::new().on_page(PAGE_1, gradconnection_listing(&[], &[])));
        let events = collect(&scraper(Arc::clone(&fetcher), 10)).await;

        let warnings: Vec<_> = events.iter().filter(|e| e.is_warning()).collect();
        assert_eq!(warnings.len(), 1);
        assert_eq!(fetcher.requested_urls(), vec![PAGE_1.to_string()]);
        assert!(matches!(
            events.last(),
            Some(ProgressEvent::Results { results, .. }) if results.is_empty()
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_scrapes_details_until_empty_page() {
        let fetcher = MockFetcher::new()
            .on_page(
                PAGE_1,
                gradconnection_listing(&["/job/a", "/job/b", "https://gc.test/job/c"], &[]),
            )
            .on_page(PAGE_2, gradconnection_listing(&[], &[]))
            .on_page(
                "https://gc.test/job/a",
                gradconnection_detail("A", "Acme", "Sydney NSW", "12 March 2026"),
            )
            .on_page(
                "https://gc.test/job/b",
                gradconnection_detail("B", "ReadyGrad", "Perth", "12 March 2026"),
            )
            .on_page(
                "https://gc.test/job/c",
                gradconnection_detail("C", "Canva", "Melbourne", "12 March 2026"),
            );
        let fetcher = Arc::new(fetcher);
        let events = collect(&scraper(Arc::clone(&fetcher), 10)).await;

        let Some(ProgressEvent::Results { progress, results, .. }) = events.last() else {
            panic!("last event should carry results: {events:?}");
        };
        assert_eq!(*progress, 100.0);
        let titles: Vec<_> = results.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["A", "C"]);
        assert_eq!(results[1].link, "https://gc.test/job/c");

        let mut last = 0.0;
        for value in events.iter().filter_map(ProgressEvent::progress_value) {
            assert!(value >= last, "progress went backwards in {events:?}");
            last = value;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_ceiling_grows_then_stops_at_last_page() {
        let fetcher = MockFetcher::new()
            .on_page(PAGE_1, gradconnection_listing(&["/job/a"], &[1, 2]))
            .on_page(PAGE_2, gradconnection_listing(&["/job/b", "/job/c"], &[1, 2]))
            .with_fallback(MockReply::page(gradconnection_detail("X", "Acme", "Sydney", "")));
        let fetcher = Arc::new(fetcher);
        let events = collect(&scraper(Arc::clone(&fetcher), 1)).await;

        assert!(events.iter().any(|e| matches!(
            e,
            ProgressEvent::Warning { warning }
                if warning == "Reached the last available GradConnection page: 2"
        )));
        assert_eq!(fetcher.request_count(PAGE_2), 1);
        assert_eq!(events.last().and_then(ProgressEvent::records).map(<[_]>::len), Some(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeated_listing_count_ends_pagination() {
        let fetcher = MockFetcher::new()
            .on_page(PAGE_1, gradconnection_listing(&["/job/a"], &[]))
            .on_page(PAGE_2, gradconnection_listing(&["/job/a"], &[]))
            .with_fallback(MockReply::page(gradconnection_detail("X", "Acme", "Sydney", "")));
        let events = collect(&scraper(Arc::new(fetcher), 10)).await;

        assert!(events.iter().any(|e| matches!(
            e,
            ProgressEvent::Warning { warning }
                if warning == "No more job listings found after GradConnection page 1."
        )));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unreachable_detail_page_is_skipped() {
        let fetcher = MockFetcher::new()
            .on_page(PAGE_1, gradconnection_listing(&["/job/a", "/job/b"], &[]))
            .on_page(PAGE_2, gradconnection_listing(&[], &[]))
            .on_page(
                "https://gc.test/job/a",
                gradconnection_detail("A", "Acme", "Sydney", "12 March 2026"),
            )
            .on_sequence("https://gc.test/job/b", vec![MockReply::ConnectError]);
        let fetcher = Arc::new(fetcher);
        let events = collect(&scraper(Arc::clone(&fetcher), 10)).await;

        let Some(ProgressEvent::Results { results, .. }) = events.last() else {
            panic!("last event should carry results: {events:?}");
        };
        let titles: Vec<_> = results.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["A"]);
        assert_eq!(fetcher.request_count("https://gc.test/job/b"), 1);
        // only the empty second page warns
        assert_eq!(events.iter().filter(|e| e.is_warning()).count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_listing_page_warns_and_ends_source() {
        let fetcher = Arc::new(MockFetcher::new().on_status(PAGE_1, 500));
        let events = collect(&scraper(Arc::clone(&fetcher), 10)).await;

        assert_eq!(events.iter().filter(|e| e.is_warning()).count(), 1);
        assert_eq!(fetcher.request_count(PAGE_1), 3);
        assert!(matches!(events.last(), Some(ProgressEvent::Results { .. })));
    }
}
