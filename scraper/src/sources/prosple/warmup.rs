//! Browses a few ordinary pages before searching so the session carries the
//! cookies and history a real visitor would have.

use chrono::Utc;
use rand::Rng;
use tracing::debug;

use crate::config::ProspleConfig;
use crate::error::FetchError;
use crate::http::{PageFetcher, PageRequest};
use crate::identity::{chance, chromium_headers, pick};

const OPTIONAL_PAGES: &[&str] = &["help", "contact", "industries"];

/// One warm-up page view.
#[derive(Debug, Clone, PartialEq)]
pub struct Visit {
    pub url: String,
    pub referrer: Option<String>,
}

/// Home, about and employers in that order, each referring to the previous
/// one, then a random subset of the optional pages.
pub fn plan_visits(config: &ProspleConfig) -> Vec<Visit> {
    let base = config.base_url.trim_end_matches('/');
    let home = format!("{base}/");
    let about = format!("{base}/about");
    let mut visits = vec![
        Visit {
            url: home.clone(),
            referrer: None,
        },
        Visit {
            url: about.clone(),
            referrer: Some(home),
        },
        Visit {
            url: format!("{base}/employers"),
            referrer: Some(about),
        },
    ];
    for page in OPTIONAL_PAGES {
        if chance(config.warm_up_extra_probability) {
            visits.push(Visit {
                url: format!("{base}/{page}"),
                referrer: Some(format!("{base}/{}", pick(&["about", "employers", ""]))),
            });
        }
    }
    visits
}

/// Cookies a returning browser would already hold.
pub fn session_cookies() -> Vec<String> {
    let visitor = format!(
        "{}-{}",
        Utc::now().timestamp(),
        rand::rng().random_range(10000..100000)
    );
    vec![
        "cookieconsent_status=allow".to_string(),
        "session_visited=true".to_string(),
        "timezone=Australia/Sydney".to_string(),
        format!("visitor_id={visitor}"),
    ]
}

pub fn seed_session(fetcher: &dyn PageFetcher, config: &ProspleConfig) {
    for cookie in session_cookies() {
        fetcher.seed_cookie(&config.base_url, &cookie);
    }
}

/// Visits the planned pages. Statuses are ignored; a transport error aborts
/// the warm-up. Returns the number of pages visited.
pub async fn warm_up(
    fetcher: &dyn PageFetcher,
    config: &ProspleConfig,
) -> Result<usize, FetchError> {
    let visits = plan_visits(config);
    let user_agent = config.identities.pick_user_agent().to_string();

    for (index, visit) in visits.iter().enumerate() {
        tokio::time::sleep(config.warm_up_pause.sample()).await;

        // optional pages present a fresh identity
        let agent = if index < 3 {
            user_agent.clone()
        } else {
            config.identities.pick_user_agent().to_string()
        };
        let mut request = PageRequest::get(&visit.url)
            .with_headers(chromium_headers(&agent))
            .with_timeout(config.warm_up_timeout);
        if let Some(referrer) = &visit.referrer {
            request = request.with_header("Referer", referrer.as_str());
        }

        let page = fetcher.fetch(&request).await?;
        debug!(url = %visit.url, status = page.status, "Warm-up visit");
    }
    Ok(visits.len())
}
