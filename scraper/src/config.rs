use std::time::Duration;

use crate::http::RetryConfig;
use crate::identity::{jitter, IdentityPool, DEFAULT_USER_AGENT};

/// A courtesy delay: a fixed base plus up to `jitter` of random extra.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pause {
    pub base: Duration,
    pub jitter: Duration,
}

impl Pause {
    pub const fn fixed(base: Duration) -> Self {
        Self {
            base,
            jitter: Duration::ZERO,
        }
    }

    pub const fn between(base: Duration, jitter: Duration) -> Self {
        Self { base, jitter }
    }

    pub fn sample(&self) -> Duration {
        if self.jitter.is_zero() {
            self.base
        } else {
            self.base + self.jitter.mul_f64(jitter())
        }
    }
}

/// Settings for every source scraper.
#[derive(Debug, Clone, Default)]
pub struct ScrapeConfig {
    pub gradconnection: GradConnectionConfig,
    pub seek: SeekConfig,
    pub prosple: ProspleConfig,
}

#[derive(Debug, Clone)]
pub struct GradConnectionConfig {
    pub base_url: String,
    pub initial_max_pages: u32,
    /// Advertised page numbers never raise the ceiling beyond this.
    pub page_ceiling_cap: u32,
    pub request_timeout: Duration,
    pub retry: RetryConfig,
    pub job_delay: Duration,
    pub page_delay: Duration,
    pub user_agent: String,
    pub skip_companies: Vec<String>,
}

impl Default for GradConnectionConfig {
    fn default() -> Self {
        Self {
            base_url: "https://au.gradconnection.com".to_string(),
            initial_max_pages: 10,
            page_ceiling_cap: 50,
            request_timeout: Duration::from_secs(15),
            retry: RetryConfig::default(),
            job_delay: Duration::from_millis(500),
            page_delay: Duration::from_secs(1),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            skip_companies: [
                "readygrad",
                "gradconnection",
                "careerdc",
                "premium graduate placements",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

impl GradConnectionConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_initial_max_pages(mut self, pages: u32) -> Self {
        self.initial_max_pages = pages;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn without_delays(mut self) -> Self {
        self.job_delay = Duration::ZERO;
        self.page_delay = Duration::ZERO;
        self.retry.initial_backoff = Duration::ZERO;
        self
    }
}

#[derive(Debug, Clone)]
pub struct SeekConfig {
    pub base_url: String,
    pub initial_max_pages: u32,
    pub page_ceiling_cap: u32,
    pub request_timeout: Duration,
    pub page_delay: Duration,
    pub user_agent: String,
    pub skip_companies: Vec<String>,
}

impl Default for SeekConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.seek.com.au".to_string(),
            initial_max_pages: 20,
            page_ceiling_cap: 50,
            request_timeout: Duration::from_secs(15),
            page_delay: Duration::from_secs(1),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            skip_companies: vec!["readygrad".to_string(), "gradconnection".to_string()],
        }
    }
}

impl SeekConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_initial_max_pages(mut self, pages: u32) -> Self {
        self.initial_max_pages = pages;
        self
    }

    pub fn without_delays(mut self) -> Self {
        self.page_delay = Duration::ZERO;
        self
    }
}

#[derive(Debug, Clone)]
pub struct ProspleConfig {
    pub base_url: String,
    /// Initial ceiling and hard cap; Prosple blocks long crawls.
    pub max_pages: u32,
    pub max_attempts: u32,
    pub request_timeout: Duration,
    pub warm_up: bool,
    pub warm_up_timeout: Duration,
    /// Chance of visiting each optional page during warm-up.
    pub warm_up_extra_probability: f64,
    /// Chance of adding tracking parameters to a request.
    pub tracking_param_probability: f64,
    /// Employer browsing ends once this many jobs are held.
    pub employer_job_cap: usize,
    pub identities: IdentityPool,
    pub skip_companies: Vec<String>,
    pub warm_up_pause: Pause,
    pub attempt_pause: Pause,
    pub page_pause: Pause,
    pub employer_pause: Pause,
}

impl Default for ProspleConfig {
    fn default() -> Self {
        Self {
            base_url: "https://au.prosple.com".to_string(),
            max_pages: 5,
            max_attempts: 4,
            request_timeout: Duration::from_secs(30),
            warm_up: true,
            warm_up_timeout: Duration::from_secs(20),
            warm_up_extra_probability: 0.5,
            tracking_param_probability: 0.5,
            employer_job_cap: 20,
            identities: IdentityPool::default(),
            skip_companies: vec!["readygrad".to_string(), "gradconnection".to_string()],
            warm_up_pause: Pause::between(Duration::from_millis(1500), Duration::from_secs(3)),
            attempt_pause: Pause::between(Duration::from_secs(3), Duration::from_secs(3)),
            page_pause: Pause::between(Duration::from_secs(3), Duration::from_secs(4)),
            employer_pause: Pause::between(Duration::from_secs(2), Duration::from_secs(3)),
        }
    }
}

impl ProspleConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_identities(mut self, identities: IdentityPool) -> Self {
        self.identities = identities;
        self
    }

    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn with_employer_job_cap(mut self, cap: usize) -> Self {
        self.employer_job_cap = cap;
        self
    }

    pub fn with_warm_up(mut self, warm_up: bool) -> Self {
        self.warm_up = warm_up;
        self
    }

    /// Removes every random element: no optional warm-up pages, no tracking
    /// parameters, no jitter on pauses.
    pub fn deterministic(mut self) -> Self {
        self.warm_up_extra_probability = 0.0;
        self.tracking_param_probability = 0.0;
        for pause in [
            &mut self.warm_up_pause,
            &mut self.attempt_pause,
            &mut self.page_pause,
            &mut self.employer_pause,
        ] {
            *pause = Pause::fixed(pause.base);
        }
        self
    }
}

/// Settings for the non-streaming GradConnection collector.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub max_pages: u32,
    pub page_concurrency: usize,
    pub detail_concurrency: usize,
    pub max_jobs: usize,
    pub connect_timeout: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_pages: 3,
            page_concurrency: 5,
            detail_concurrency: 10,
            max_jobs: 100,
            connect_timeout: Duration::from_secs(10),
        }
    }
}
