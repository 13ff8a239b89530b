//! Non-streaming GradConnection collection for exports.
//!
//! Listing pages and detail pages are each fetched through a bounded pool.
//! Result order follows completion, not the site's ordering.

use std::collections::HashSet;

use common::JobRecord;
use futures::stream::{self, StreamExt};
use tracing::{error, info, warn};

use crate::config::{BatchConfig, GradConnectionConfig};
use crate::http::{fetch_with_retry, PageFetcher, PageRequest};
use crate::identity::browser_headers;
use crate::sources::gradconnection::{fetch_detail, listing_url, parse_listing_page};
use crate::sources::{parse_site, resolve_link, with_page, SearchQuery};

/// Collects up to `batch.max_jobs` GradConnection jobs. Returns an empty list
/// when the site root cannot be reached; failed pages and jobs are skipped.
pub async fn collect_gradconnection(
    fetcher: &dyn PageFetcher,
    config: &GradConnectionConfig,
    batch: &BatchConfig,
    query: &SearchQuery,
) -> Vec<JobRecord> {
    let site = match parse_site(&config.base_url) {
        Ok(site) => site,
        Err(e) => {
            error!(error = %e, "Cannot collect GradConnection jobs");
            return Vec::new();
        }
    };

    if !check_connection(fetcher, config, batch).await {
        return Vec::new();
    }

    let base_url = listing_url(&config.base_url, query);
    let pages: Vec<Vec<String>> = stream::iter(1..=batch.max_pages)
        .map(|page_num| listing_links(fetcher, config, with_page(&base_url, page_num)))
        .buffer_unordered(batch.page_concurrency.max(1))
        .collect()
        .await;

    let mut seen = HashSet::new();
    let links: Vec<String> = pages
        .into_iter()
        .flatten()
        .filter_map(|href| resolve_link(&site, &href))
        .filter(|link| seen.insert(link.clone()))
        .take(batch.max_jobs)
        .collect();
    info!(links = links.len(), "Collected GradConnection job links");

    let job_level = query.job_level;
    let jobs: Vec<JobRecord> = stream::iter(links)
        .map(|link| async move {
            match fetch_detail(fetcher, config, &link, job_level).await {
                Ok(record) => record,
                Err(e) => {
                    warn!(url = %link, error = %e, "Error processing job");
                    None
                }
            }
        })
        .buffer_unordered(batch.detail_concurrency.max(1))
        .filter_map(|record| async move { record })
        .collect()
        .await;

    info!(jobs = jobs.len(), "Collected GradConnection jobs");
    jobs
}

async fn check_connection(
    fetcher: &dyn PageFetcher,
    config: &GradConnectionConfig,
    batch: &BatchConfig,
) -> bool {
    let root = format!("{}/", config.base_url.trim_end_matches('/'));
    let request = PageRequest::get(&root)
        .with_headers(browser_headers(&config.user_agent))
        .with_timeout(batch.connect_timeout);
    match fetcher.fetch(&request).await {
        Ok(page) if page.is_success() => {
            info!(url = %root, "Connected to GradConnection");
            true
        }
        Ok(page) => {
            error!(url = %root, status = page.status, "GradConnection is not reachable");
            false
        }
        Err(e) => {
            error!(url = %root, error = %e, "GradConnection is not reachable");
            false
        }
    }
}

async fn listing_links(
    fetcher: &dyn PageFetcher,
    config: &GradConnectionConfig,
    url: String,
) -> Vec<String> {
    let request = PageRequest::get(&url)
        .with_headers(browser_headers(&config.user_agent))
        .with_timeout(config.request_timeout);
    match fetch_with_retry(fetcher, &request, &config.retry).await {
        Ok(page) => {
            let links = parse_listing_page(&page.body).job_links;
            info!(url = %url, jobs = links.len(), "Fetched GradConnection listing");
            links
        }
        Err(e) => {
            warn!(url = %url, error = %e, "Failed to retrieve GradConnection listing");
            Vec::new()
        }
    }
}
