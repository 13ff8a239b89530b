use std::sync::LazyLock;

use regex::Regex;
use scraper::Html;

use crate::selectors::Css;

static CAPTCHA_MARKUP: LazyLock<Css> = LazyLock::new(|| {
    Css::new(
        "form[action*=\"captcha\"], div[class*=\"captcha\"], img[src*=\"captcha\"], div[class*=\"recaptcha\"]",
    )
});

static LOGIN_MARKUP: LazyLock<Css> =
    LazyLock::new(|| Css::new("form[action*=\"login\"], input[name=\"password\"]"));

static CAPTCHA_TEXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)captcha|robot|verification").expect("captcha regex"));

static LOGIN_TEXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)please log ?in|sign ?in required").expect("login regex"));

/// Why a page cannot be scraped even though it came back 200.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Blocker {
    Captcha,
    LoginWall,
}

impl Blocker {
    pub fn warning(self) -> &'static str {
        match self {
            Blocker::Captcha => "Detected CAPTCHA on Prosple. Switching to employer browsing mode...",
            Blocker::LoginWall => "Login wall detected on Prosple. Switching to employer browsing mode...",
        }
    }
}

/// CAPTCHA markers win over login markers.
pub fn detect_blocker(html: &str) -> Option<Blocker> {
    let document = Html::parse_document(html);
    let root = document.root_element();
    let text = visible_text(&document);

    if CAPTCHA_MARKUP.select(root).next().is_some() || CAPTCHA_TEXT.is_match(&text) {
        return Some(Blocker::Captcha);
    }
    if LOGIN_MARKUP.select(root).next().is_some() || LOGIN_TEXT.is_match(&text) {
        return Some(Blocker::LoginWall);
    }
    None
}

/// Text nodes outside `script`, `style` and `noscript`.
fn visible_text(document: &Html) -> String {
    document
        .root_element()
        .descendants()
        .filter_map(|node| {
            let text = node.value().as_text()?;
            let parent = node.parent()?;
            let tag = parent.value().as_element()?.name();
            (!matches!(tag, "script" | "style" | "noscript")).then(|| text.trim().to_string())
        })
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_captcha_markup() {
        let html = r#"<html><body><div class="g-recaptcha-box"></div></body></html>"#;
        assert_eq!(detect_blocker(html), Some(Blocker::Captcha));
    }

    #[test]
    fn test_captcha_text() {
        let html = "<html><body><p>Please confirm you are not a Robot</p></body></html>";
        assert_eq!(detect_blocker(html), Some(Blocker::Captcha));
    }

    #[test]
    fn test_login_wall() {
        let html = r#"<html><body><form action="/user/login"><input name="password"></form></body></html>"#;
        assert_eq!(detect_blocker(html), Some(Blocker::LoginWall));
        let html = "<html><body><h2>Sign in required</h2></body></html>";
        assert_eq!(detect_blocker(html), Some(Blocker::LoginWall));
    }

    #[test]
    fn test_script_text_is_ignored() {
        let html = r#"<html><head><script>window.recaptchaKey = "robot";</script></head>
            <body><article class="job-card"><h3>Graduate Developer</h3></article></body></html>"#;
        assert_eq!(detect_blocker(html), None);
    }
}
