use thiserror::Error;

/// Failure of a single event stream connection attempt
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server responded with {0}")]
    Status(reqwest::StatusCode),

    #[error("unexpected content type {0:?}")]
    ContentType(String),
}

/// Failure of the health check
#[derive(Debug, Error)]
pub enum HealthError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("malformed health response: {0}")]
    Body(#[from] serde_json::Error),
}
