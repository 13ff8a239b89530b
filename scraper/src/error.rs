use thiserror::Error;

/// Failure to get a usable page from a job board.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {0} timed out")]
    Timeout(String),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("status code {status} from {url}")]
    Status { status: u16, url: String },

    #[error("request failed: {0}")]
    Other(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        let url = err
            .url()
            .map(|u| u.to_string())
            .unwrap_or_else(|| "unknown url".to_string());
        if err.is_timeout() {
            FetchError::Timeout(url)
        } else if err.is_connect() {
            FetchError::Connect(err.to_string())
        } else {
            FetchError::Other(err.to_string())
        }
    }
}

/// Failure that ends a whole source, as opposed to a single page or job.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("invalid base url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write export: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize jobs: {0}")]
    Json(#[from] serde_json::Error),
}
