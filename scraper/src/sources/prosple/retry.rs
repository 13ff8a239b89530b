use std::time::Duration;

use crate::error::FetchError;
use crate::http::FetchedPage;

/// How a single Prosple request went wrong.
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome {
    Status(u16),
    Timeout,
    Failed(String),
}

impl AttemptOutcome {
    /// `None` for a usable page.
    pub fn classify(result: &Result<FetchedPage, FetchError>) -> Option<Self> {
        match result {
            Ok(page) if page.is_success() => None,
            Ok(page) => Some(AttemptOutcome::Status(page.status)),
            Err(FetchError::Timeout(_)) => Some(AttemptOutcome::Timeout),
            Err(e) => Some(AttemptOutcome::Failed(e.to_string())),
        }
    }

    /// Warning shown after failed attempt number `attempt`.
    pub fn warning(&self, attempt: u32, max_attempts: u32) -> String {
        match self {
            AttemptOutcome::Status(403) => format!(
                "Access denied by Prosple (403), retrying with different parameters (attempt {attempt}/{max_attempts})..."
            ),
            AttemptOutcome::Status(429) => format!(
                "Rate limited by Prosple (429), backing off and retrying (attempt {attempt}/{max_attempts})..."
            ),
            AttemptOutcome::Status(status) => format!(
                "Received status {status} from Prosple, retrying (attempt {attempt}/{max_attempts})..."
            ),
            AttemptOutcome::Timeout => format!(
                "Timeout connecting to Prosple, retrying (attempt {attempt}/{max_attempts})..."
            ),
            AttemptOutcome::Failed(reason) => format!(
                "Error accessing Prosple: {reason}, retrying (attempt {attempt}/{max_attempts})..."
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RetryDecision {
    RetryAfter {
        delay: Duration,
        /// Present a different browser identity on the next attempt.
        rotate_identity: bool,
    },
    GiveUp,
}

/// Backoff per failure class, kept free of I/O.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self { max_attempts }
    }

    /// `attempt` counts failed attempts so far, starting at 1. `jitter` is a
    /// uniform sample in `[0, 1)`.
    ///
    /// 403 backs off `2^n` seconds and rotates identity, 429 backs off `3^n`,
    /// other statuses and timeouts wait `2n`, transport errors `2 + n`.
    pub fn decide(&self, attempt: u32, outcome: &AttemptOutcome, jitter: f64) -> RetryDecision {
        if attempt >= self.max_attempts {
            return RetryDecision::GiveUp;
        }
        let n = f64::from(attempt);
        let jitter = jitter.clamp(0.0, 1.0);
        let (seconds, rotate_identity) = match outcome {
            AttemptOutcome::Status(403) => (2f64.powf(n) + jitter * 2.0, true),
            AttemptOutcome::Status(429) => (3f64.powf(n) + jitter * 5.0, false),
            AttemptOutcome::Status(_) | AttemptOutcome::Timeout => (2.0 * n, false),
            AttemptOutcome::Failed(_) => (2.0 + n, false),
        };
        RetryDecision::RetryAfter {
            delay: Duration::from_secs_f64(seconds),
            rotate_identity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delay(decision: RetryDecision) -> Duration {
        match decision {
            RetryDecision::RetryAfter { delay, .. } => delay,
            RetryDecision::GiveUp => panic!("expected a retry"),
        }
    }

    #[test]
    fn test_forbidden_backs_off_exponentially_and_rotates() {
        let policy = RetryPolicy::new(4);
        assert_eq!(
            policy.decide(1, &AttemptOutcome::Status(403), 0.0),
            RetryDecision::RetryAfter {
                delay: Duration::from_secs(2),
                rotate_identity: true
            }
        );
        assert_eq!(
            delay(policy.decide(3, &AttemptOutcome::Status(403), 0.5)),
            Duration::from_secs(9)
        );
    }

    #[test]
    fn test_rate_limit_backs_off_longer() {
        let policy = RetryPolicy::new(4);
        assert_eq!(
            delay(policy.decide(2, &AttemptOutcome::Status(429), 0.0)),
            Duration::from_secs(9)
        );
        assert_eq!(
            delay(policy.decide(3, &AttemptOutcome::Status(429), 0.2)),
            Duration::from_secs(28)
        );
    }

    #[test]
    fn test_linear_backoff_for_other_failures() {
        let policy = RetryPolicy::new(4);
        assert_eq!(
            delay(policy.decide(2, &AttemptOutcome::Status(500), 0.9)),
            Duration::from_secs(4)
        );
        assert_eq!(delay(policy.decide(3, &AttemptOutcome::Timeout, 0.9)), Duration::from_secs(6));
        assert_eq!(
            delay(policy.decide(1, &AttemptOutcome::Failed("reset".into()), 0.9)),
            Duration::from_secs(3)
        );
    }

    #[test]
    fn test_gives_up_after_max_attempts() {
        let policy = RetryPolicy::new(4);
        assert_eq!(policy.decide(4, &AttemptOutcome::Status(403), 0.0), RetryDecision::GiveUp);
        assert_eq!(policy.decide(5, &AttemptOutcome::Timeout, 0.0), RetryDecision::GiveUp);
    }

    #[test]
    fn test_classify_results() {
        let ok = Ok(FetchedPage {
            url: "https://p.test".into(),
            status: 200,
            body: String::new(),
        });
        assert_eq!(AttemptOutcome::classify(&ok), None);

        let forbidden = Ok(FetchedPage {
            url: "https://p.test".into(),
            status: 403,
            body: String::new(),
        });
        assert_eq!(AttemptOutcome::classify(&forbidden), Some(AttemptOutcome::Status(403)));
        assert_eq!(
            AttemptOutcome::classify(&Err(FetchError::Timeout("https://p.test".into()))),
            Some(AttemptOutcome::Timeout)
        );
    }

    #[test]
    fn test_warning_text() {
        assert_eq!(
            AttemptOutcome::Status(429).warning(2, 4),
            "Rate limited by Prosple (429), backing off and retrying (attempt 2/4)..."
        );
    }
}
