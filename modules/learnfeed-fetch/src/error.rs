/// Result type alias for fetch operations.
pub type Result<T> = std::result::Result<T, FetchError>;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("network error fetching {url}: {source}")]
    NetworkError { url: String, source: reqwest::Error },

    #[error("HTTP error fetching {url}: status {status}")]
    HttpError { url: String, status: u16 },

    #[error("timed out fetching {0}")]
    Timeout(String),

    #[error("response for {url} exceeded {limit_bytes} bytes")]
    TooLarge { url: String, limit_bytes: usize },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
