//! Employer-directory pages, the fallback when search listings are blocked.

use std::sync::LazyLock;

use common::{JobRecord, Source};
use scraper::Html;
use url::Url;

use crate::dates::closing_date_or_raw;
use crate::selectors::{element_text, enclosing, Css, SelectorChain};
use crate::sources::resolve_link;

static EMPLOYER_LINKS: LazyLock<SelectorChain> = LazyLock::new(|| {
    SelectorChain::css(
        "prosple employer links",
        &[
            "a[href*=\"/employer/\"], a[href*=\"/organization/\"]",
            ".employer-card a, .organization-card a, .employer-listing a",
            "a[class*=\"employer\"], a[class*=\"organization\"], .card a",
        ],
    )
});

static JOB_LINKS: LazyLock<SelectorChain> = LazyLock::new(|| {
    SelectorChain::css(
        "prosple employer jobs",
        &[
            "a[href*=\"/job/\"], a[href*=\"/opportunity/\"]",
            ".job-listing a, .opportunity-listing a, .position-card a",
            "a[class*=\"job\"], a[class*=\"opportunity\"], .card a",
        ],
    )
});

static EMPLOYER_NAME: LazyLock<Css> =
    LazyLock::new(|| Css::new("h1, .employer-name, .organization-name, .company-name"));
static LINK_TITLE: LazyLock<Css> =
    LazyLock::new(|| Css::new("h2, h3, .job-title, .opportunity-title"));
static LOCATION: LazyLock<Css> =
    LazyLock::new(|| Css::new(".location, .job-location, .opportunity-location"));
static JOB_TYPE: LazyLock<Css> =
    LazyLock::new(|| Css::new(".job-type, .work-type, .employment-type"));
static CLOSING: LazyLock<Css> =
    LazyLock::new(|| Css::new(".closing-date, .deadline, .application-close"));

/// Absolute employer profile URLs on a directory page, first occurrence kept.
pub fn parse_directory(html: &str, site: &Url) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut employers: Vec<String> = Vec::new();
    for link in EMPLOYER_LINKS.matches(document.root_element()).unwrap_or_default() {
        let Some(url) = link.value().attr("href").and_then(|href| resolve_link(site, href)) else {
            continue;
        };
        if !employers.contains(&url) {
            employers.push(url);
        }
    }
    employers
}

/// Jobs advertised on an employer profile. Every record carries the
/// employer's name and the searched discipline.
pub fn parse_employer_page(html: &str, site: &Url, disciplines: &str) -> Vec<JobRecord> {
    let document = Html::parse_document(html);
    let root = document.root_element();

    let company = EMPLOYER_NAME
        .select(root)
        .next()
        .map(element_text)
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "Unknown Company".to_string());

    JOB_LINKS
        .matches(root)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|link| {
            let url = resolve_link(site, link.value().attr("href")?)?;
            let title = LINK_TITLE
                .select(link)
                .next()
                .map(element_text)
                .filter(|text| !text.is_empty())
                .or_else(|| Some(element_text(link)).filter(|text| !text.is_empty()))
                .unwrap_or_else(|| "Untitled Position".to_string());

            let mut record = JobRecord::new(title, company.clone(), url, Source::Prosple);
            record.disciplines = Some(disciplines.to_string());
            if let Some(card) = enclosing(link, "div", &["card", "job", "listing", "opportunity"]) {
                let field = |css: &Css| {
                    css.select(card)
                        .next()
                        .map(element_text)
                        .filter(|text| !text.is_empty())
                };
                record.location = field(&LOCATION);
                record.job_type = field(&JOB_TYPE);
                record.closing_date = field(&CLOSING).and_then(|text| closing_date_or_raw(&text));
            }
            Some(record)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site() -> Url {
        Url::parse("https://prosple.test").unwrap()
    }

    #[test]
    fn test_directory_links_are_deduplicated() {
        let html = r#"<html><body>
            <a href="/employer/atlassian">Atlassian</a>
            <a href="/employer/atlassian">Atlassian logo</a>
            <a href="https://prosple.test/organization/canva">Canva</a>
        </body></html>"#;
        assert_eq!(
            parse_directory(html, &site()),
            vec![
                "https://prosple.test/employer/atlassian".to_string(),
                "https://prosple.test/organization/canva".to_string()
            ]
        );
    }

    #[test]
    fn test_directory_falls_back_to_cards() {
        let html = r#"<html><body><div class="employer-card"><a href="/e/xero">Xero</a></div></body></html>"#;
        assert_eq!(parse_directory(html, &site()), vec!["https://prosple.test/e/xero".to_string()]);
    }

    #[test]
    fn test_employer_page_jobs() {
        let html = r#"<html><body>
            <h1>Atlassian</h1>
            <div class="opportunity-card">
              <a href="/job/grad-dev"><h3>Graduate Developer</h3></a>
              <span class="location">Sydney NSW</span>
              <span class="job-type">Graduate Job</span>
              <span class="closing-date">Closing date: 12 March 2026</span>
            </div>
            <a href="/opportunity/intern">Summer Intern</a>
        </body></html>"#;
        let jobs = parse_employer_page(html, &site(), "Engineering");

        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].title, "Graduate Developer");
        assert_eq!(jobs[0].company, "Atlassian");
        assert_eq!(jobs[0].link, "https://prosple.test/job/grad-dev");
        assert_eq!(jobs[0].location.as_deref(), Some("Sydney NSW"));
        assert_eq!(jobs[0].closing_date.as_deref(), Some("2026-03-12"));
        assert_eq!(jobs[0].disciplines.as_deref(), Some("Engineering"));
        assert_eq!(jobs[1].title, "Summer Intern");
        assert_eq!(jobs[1].location, None);
        assert_eq!(jobs[1].source, Source::Prosple);
    }
}
