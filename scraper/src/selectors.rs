//! Tiered selector fallback.
//!
//! Job board markup changes without notice, so every lookup is an ordered
//! [`SelectorChain`]: strategies are tried in order and the first one that
//! matches anything wins.

use scraper::element_ref::Select;
use scraper::{ElementRef, Selector};
use tracing::debug;

/// One way of finding elements inside a scope.
pub trait Strategy: Send + Sync {
    fn apply<'a>(&self, scope: ElementRef<'a>) -> Vec<ElementRef<'a>>;

    fn describe(&self) -> String;
}

/// Elements matching a CSS selector.
pub struct Css {
    source: &'static str,
    selector: Selector,
}

impl Css {
    /// Panics on an invalid selector; only call with literals.
    pub fn new(source: &'static str) -> Self {
        let selector = Selector::parse(source)
            .unwrap_or_else(|e| panic!("invalid selector {source:?}: {e:?}"));
        Self { source, selector }
    }

    pub fn select<'a, 's>(&'s self, scope: ElementRef<'a>) -> Select<'a, 's> {
        scope.select(&self.selector)
    }
}

impl Strategy for Css {
    fn apply<'a>(&self, scope: ElementRef<'a>) -> Vec<ElementRef<'a>> {
        scope.select(&self.selector).collect()
    }

    fn describe(&self) -> String {
        self.source.to_string()
    }
}

/// Anchors whose href contains one of `include` and none of `exclude`.
pub struct HrefContains {
    anchors: Css,
    include: Vec<&'static str>,
    exclude: Vec<&'static str>,
}

impl HrefContains {
    pub fn new(include: &[&'static str]) -> Self {
        Self {
            anchors: Css::new("a[href]"),
            include: include.to_vec(),
            exclude: Vec::new(),
        }
    }

    pub fn excluding(mut self, exclude: &[&'static str]) -> Self {
        self.exclude = exclude.to_vec();
        self
    }
}

impl Strategy for HrefContains {
    fn apply<'a>(&self, scope: ElementRef<'a>) -> Vec<ElementRef<'a>> {
        self.anchors
            .select(scope)
            .filter(|a| {
                let href = a.value().attr("href").unwrap_or_default();
                self.include.iter().any(|frag| href.contains(frag))
                    && !self.exclude.iter().any(|frag| href.contains(frag))
            })
            .collect()
    }

    fn describe(&self) -> String {
        format!("a[href] containing {:?}", self.include)
    }
}

/// Elements matching `selector` whose text mentions one of `keywords`
/// (case-insensitive).
pub struct TextContains {
    inner: Css,
    keywords: Vec<&'static str>,
}

impl TextContains {
    pub fn new(selector: &'static str, keywords: &[&'static str]) -> Self {
        Self {
            inner: Css::new(selector),
            keywords: keywords.to_vec(),
        }
    }
}

impl Strategy for TextContains {
    fn apply<'a>(&self, scope: ElementRef<'a>) -> Vec<ElementRef<'a>> {
        self.inner
            .select(scope)
            .filter(|el| {
                let text = element_text(*el).to_lowercase();
                self.keywords.iter().any(|kw| text.contains(kw))
            })
            .collect()
    }

    fn describe(&self) -> String {
        format!("{} mentioning {:?}", self.inner.source, self.keywords)
    }
}

/// The nearest `tag` ancestor, with a class mentioning one of `class_keywords`,
/// of each element `inner` matches. Used to climb from a title link to its card.
pub struct Ancestor {
    inner: Css,
    tag: &'static str,
    class_keywords: Vec<&'static str>,
}

impl Ancestor {
    pub fn new(inner: &'static str, tag: &'static str, class_keywords: &[&'static str]) -> Self {
        Self {
            inner: Css::new(inner),
            tag,
            class_keywords: class_keywords.to_vec(),
        }
    }
}

impl Strategy for Ancestor {
    fn apply<'a>(&self, scope: ElementRef<'a>) -> Vec<ElementRef<'a>> {
        let mut containers: Vec<ElementRef<'a>> = Vec::new();
        for el in self.inner.select(scope) {
            if let Some(container) = enclosing(el, self.tag, &self.class_keywords) {
                if !containers.iter().any(|seen| seen.id() == container.id()) {
                    containers.push(container);
                }
            }
        }
        containers
    }

    fn describe(&self) -> String {
        format!("{} inside {}{:?}", self.inner.source, self.tag, self.class_keywords)
    }
}

/// Nearest `tag` ancestor of `el` with a class mentioning one of `class_keywords`.
pub fn enclosing<'a>(
    el: ElementRef<'a>,
    tag: &str,
    class_keywords: &[&str],
) -> Option<ElementRef<'a>> {
    el.ancestors().filter_map(ElementRef::wrap).find(|parent| {
        parent.value().name() == tag
            && parent.value().classes().any(|class| {
                let class = class.to_lowercase();
                class_keywords.iter().any(|kw| class.contains(kw))
            })
    })
}

/// Ordered strategies; the first non-empty result wins.
pub struct SelectorChain {
    name: &'static str,
    strategies: Vec<Box<dyn Strategy>>,
}

impl SelectorChain {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            strategies: Vec::new(),
        }
    }

    /// One CSS tier per entry.
    pub fn css(name: &'static str, selectors: &[&'static str]) -> Self {
        selectors
            .iter()
            .fold(Self::new(name), |chain, selector| chain.then(Css::new(selector)))
    }

    pub fn then(mut self, strategy: impl Strategy + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    /// Result of the first strategy that matches anything, `None` when none do.
    pub fn matches<'a>(&self, scope: ElementRef<'a>) -> Option<Vec<ElementRef<'a>>> {
        for (tier, strategy) in self.strategies.iter().enumerate() {
            let found = strategy.apply(scope);
            if !found.is_empty() {
                if tier > 0 {
                    debug!(
                        chain = self.name,
                        tier,
                        strategy = %strategy.describe(),
                        count = found.len(),
                        "Fallback selector matched"
                    );
                }
                return Some(found);
            }
        }
        None
    }

    pub fn first<'a>(&self, scope: ElementRef<'a>) -> Option<ElementRef<'a>> {
        self.matches(scope).and_then(|found| found.into_iter().next())
    }

    /// Collapsed text of the first match; `None` when it is blank.
    pub fn first_text(&self, scope: ElementRef<'_>) -> Option<String> {
        self.first(scope)
            .map(element_text)
            .filter(|text| !text.is_empty())
    }
}

/// All text under `el` with whitespace runs collapsed to single spaces.
pub fn element_text(el: ElementRef<'_>) -> String {
    collapse_whitespace(&el.text().collect::<String>())
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Page numbers printed on pagination links ("Page 7" counts as 7).
pub fn page_numbers(scope: ElementRef<'_>, links: &Css) -> Vec<u32> {
    links
        .select(scope)
        .filter_map(|link| {
            let digits: String = element_text(link)
                .chars()
                .filter(|c| c.is_ascii_digit())
                .collect();
            digits.parse().ok()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    const PAGE: &str = r#"
        <html><body>
          <div class="job-card-wrapper">
            <h3><a data-automation="jobTitle" href="/job/1">Graduate Analyst</a></h3>
            <span>Full Time</span>
          </div>
          <div class="job-card-wrapper">
            <h3><a data-automation="jobTitle" href="/job/2">Data Intern</a></h3>
            <span>Casual</span>
          </div>
          <a href="/notifyme/job/3">Notify me</a>
          <ul class="pagination"><a>1</a><a>2</a><a>Page 7</a><a>Next</a></ul>
        </body></html>
    "#;

    #[test]
    fn test_first_matching_tier_wins() {
        let doc = Html::parse_document(PAGE);
        let chain = SelectorChain::css(
            "cards",
            &["article", ".job-card", "a[data-automation=\"jobTitle\"]"],
        );

        let found = chain.matches(doc.root_element()).unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(element_text(found[0]), "Graduate Analyst");
    }

    #[test]
    fn test_css_matches_outlive_the_selector() {
        let doc = Html::parse_document(PAGE);
        let titles: Vec<ElementRef<'_>> = {
            let css = Css::new("a[data-automation=\"jobTitle\"]");
            css.select(doc.root_element()).collect()
        };
        let text: Vec<_> = titles.into_iter().map(element_text).collect();
        assert_eq!(text, vec!["Graduate Analyst", "Data Intern"]);
    }

    #[test]
    fn test_exhausted_chain_is_none() {
        let doc = Html::parse_document(PAGE);
        let chain = SelectorChain::css("missing", &["article", "table tr"]);
        assert!(chain.matches(doc.root_element()).is_none());
        assert!(chain.first_text(doc.root_element()).is_none());
    }

    #[test]
    fn test_href_contains_respects_exclusions() {
        let doc = Html::parse_document(PAGE);
        let strategy = HrefContains::new(&["/job/"]).excluding(&["notifyme"]);
        let found = strategy.apply(doc.root_element());
        let hrefs: Vec<_> = found.iter().filter_map(|a| a.value().attr("href")).collect();
        assert_eq!(hrefs, vec!["/job/1", "/job/2"]);
    }

    #[test]
    fn test_text_contains_is_case_insensitive() {
        let doc = Html::parse_document(PAGE);
        let strategy = TextContains::new("span", &["full time", "part time"]);
        let found = strategy.apply(doc.root_element());
        assert_eq!(found.len(), 1);
        assert_eq!(element_text(found[0]), "Full Time");
    }

    #[test]
    fn test_ancestor_climbs_to_card() {
        let doc = Html::parse_document(PAGE);
        let strategy = Ancestor::new("a[data-automation=\"jobTitle\"]", "div", &["job"]);
        let cards = strategy.apply(doc.root_element());
        assert_eq!(cards.len(), 2);
        assert!(element_text(cards[1]).contains("Casual"));
    }

    #[test]
    fn test_page_numbers_reads_digits() {
        let doc = Html::parse_document(PAGE);
        let pages = page_numbers(doc.root_element(), &Css::new(".pagination a"));
        assert_eq!(pages, vec![1, 2, 7]);
    }

    #[test]
    fn test_whitespace_is_collapsed() {
        assert_eq!(collapse_whitespace("  Sydney,\n\t  NSW  "), "Sydney, NSW");
    }
}
