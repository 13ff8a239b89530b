//! Browser identities presented to the job boards.

use rand::seq::IndexedRandom;
use rand::Rng;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36 Edg/119.0.0.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:109.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (iPhone; CPU iPhone OS 17_1_1 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Mobile/15E148 Safari/604.1",
    "Mozilla/5.0 (iPad; CPU OS 17_1 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) CriOS/120.0.6099.101 Mobile/15E148 Safari/604.1",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36 OPR/106.0.0.0",
];

const REFERRERS: &[&str] = &[
    "https://www.google.com/search?q=graduate+jobs+australia",
    "https://www.bing.com/search?q=internships+australia+tech+companies",
    "https://au.indeed.com/jobs?q=graduate&l=Australia",
    "https://www.seek.com.au/graduate-jobs",
    "https://www.linkedin.com/jobs/search/?keywords=graduate&location=Australia",
    "https://gradaustralia.com.au/graduate-jobs",
];

/// Candidate user agents and referrers. Each request picks one of each.
///
/// A pool with a single entry in each list makes every choice deterministic.
#[derive(Debug, Clone, PartialEq)]
pub struct IdentityPool {
    pub user_agents: Vec<String>,
    pub referrers: Vec<String>,
}

impl IdentityPool {
    pub fn single(user_agent: impl Into<String>, referrer: impl Into<String>) -> Self {
        Self {
            user_agents: vec![user_agent.into()],
            referrers: vec![referrer.into()],
        }
    }

    pub fn pick_user_agent(&self) -> &str {
        self.user_agents
            .choose(&mut rand::rng())
            .map(String::as_str)
            .unwrap_or(DEFAULT_USER_AGENT)
    }

    pub fn pick_referrer(&self) -> Option<&str> {
        self.referrers.choose(&mut rand::rng()).map(String::as_str)
    }
}

impl Default for IdentityPool {
    fn default() -> Self {
        Self {
            user_agents: USER_AGENTS.iter().map(|s| s.to_string()).collect(),
            referrers: REFERRERS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Headers a desktop browser sends on a plain navigation.
pub fn browser_headers(user_agent: &str) -> Vec<(String, String)> {
    [
        ("User-Agent", user_agent),
        (
            "Accept",
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
        ),
        ("Accept-Language", "en-US,en;q=0.5"),
        ("Connection", "keep-alive"),
        ("Upgrade-Insecure-Requests", "1"),
    ]
    .iter()
    .map(|(name, value)| (name.to_string(), value.to_string()))
    .collect()
}

/// The fuller header set of a recent Chromium, including client hints.
pub fn chromium_headers(user_agent: &str) -> Vec<(String, String)> {
    [
        ("User-Agent", user_agent),
        (
            "Accept",
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8",
        ),
        ("Accept-Language", "en-US,en;q=0.9"),
        ("Connection", "keep-alive"),
        ("Upgrade-Insecure-Requests", "1"),
        (
            "Sec-Ch-Ua",
            "\"Not_A Brand\";v=\"8\", \"Chromium\";v=\"120\", \"Google Chrome\";v=\"120\"",
        ),
        ("Sec-Ch-Ua-Mobile", "?0"),
        ("Sec-Ch-Ua-Platform", "\"Windows\""),
        ("Sec-Fetch-Dest", "document"),
        ("Sec-Fetch-Mode", "navigate"),
        ("Sec-Fetch-Site", "none"),
        ("Sec-Fetch-User", "?1"),
        ("Cache-Control", "max-age=0"),
    ]
    .iter()
    .map(|(name, value)| (name.to_string(), value.to_string()))
    .collect()
}

/// True with probability `p`.
pub fn chance(p: f64) -> bool {
    rand::rng().random_bool(p.clamp(0.0, 1.0))
}

/// Uniform sample in `[0, 1)`.
pub fn jitter() -> f64 {
    rand::rng().random::<f64>()
}

/// Picks one of `options` at random.
pub fn pick<'a>(options: &[&'a str]) -> &'a str {
    options.choose(&mut rand::rng()).copied().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_pool_is_deterministic() {
        let pool = IdentityPool::single("TestAgent/1.0", "https://referrer.test/");
        for _ in 0..10 {
            assert_eq!(pool.pick_user_agent(), "TestAgent/1.0");
            assert_eq!(pool.pick_referrer(), Some("https://referrer.test/"));
        }
    }

    #[test]
    fn test_empty_pool_falls_back_to_default_agent() {
        let pool = IdentityPool {
            user_agents: vec![],
            referrers: vec![],
        };
        assert_eq!(pool.pick_user_agent(), DEFAULT_USER_AGENT);
        assert_eq!(pool.pick_referrer(), None);
    }

    #[test]
    fn test_browser_headers_carry_user_agent() {
        let headers = browser_headers("Agent/2");
        assert!(headers.contains(&("User-Agent".to_string(), "Agent/2".to_string())));
        assert!(chromium_headers("Agent/3")
            .iter()
            .any(|(name, value)| name == "Sec-Fetch-Mode" && value == "navigate"));
    }

    #[test]
    fn test_chance_extremes() {
        assert!(chance(1.0));
        assert!(!chance(0.0));
    }
}
