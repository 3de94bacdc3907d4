//! Content Fetcher — bounded HTTP GET for a source URL.
//!
//! Retrieves HTML or RSS/Atom bytes with a bounded redirect count, a total
//! deadline, and a response-size cap. Truncation past the cap is signaled,
//! not treated as an error.

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::redirect::Policy;
use tracing::{debug, warn};

use crate::error::{FetchError, Result};

const MAX_REDIRECTS: usize = 10;
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_BYTES: usize = 2_000_000;

/// Narrow seam over `ContentFetcher::fetch` so the Ingestion Job's tests can
/// substitute a fake backend instead of a real HTTP call.
#[async_trait]
pub trait FetchBackend: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedContent>;
}

/// Outcome of a single `fetch` call.
#[derive(Debug, Clone)]
pub struct FetchedContent {
    pub bytes: Vec<u8>,
    pub status: u16,
    pub content_type: Option<String>,
    pub truncated: bool,
}

pub struct ContentFetcher {
    client: reqwest::Client,
    max_bytes: usize,
}

impl ContentFetcher {
    pub fn new(timeout_secs: u64, max_bytes: usize) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .redirect(Policy::limited(MAX_REDIRECTS))
            .user_agent("learnfeed-worker/0.1")
            .build()
            .expect("failed to build fetcher HTTP client");

        Self { client, max_bytes }
    }

    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_TIMEOUT_SECS, DEFAULT_MAX_BYTES)
    }

    /// Fetch `url`, following redirects up to a small bound, enforcing the
    /// configured deadline and size cap. Truncation is signaled via
    /// `FetchedContent::truncated`, not returned as an error.
    pub async fn fetch(&self, url: &str) -> Result<FetchedContent> {
        debug!(url, "fetching content");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| classify_send_error(url, source))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpError {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let mut bytes = Vec::new();
        let mut truncated = false;
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|source| classify_send_error(url, source))?;
            if bytes.len() + chunk.len() > self.max_bytes {
                let remaining = self.max_bytes.saturating_sub(bytes.len());
                bytes.extend_from_slice(&chunk[..remaining]);
                truncated = true;
                warn!(url, limit_bytes = self.max_bytes, "response truncated");
                break;
            }
            bytes.extend_from_slice(&chunk);
        }

        Ok(FetchedContent {
            bytes,
            status: status.as_u16(),
            content_type,
            truncated,
        })
    }
}

#[async_trait]
impl FetchBackend for ContentFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedContent> {
        ContentFetcher::fetch(self, url).await
    }
}

fn classify_send_error(url: &str, source: reqwest::Error) -> FetchError {
    if source.is_timeout() {
        FetchError::Timeout(url.to_string())
    } else {
        FetchError::NetworkError {
            url: url.to_string(),
            source,
        }
    }
}

/// Sniff whether fetched bytes look like an RSS/Atom feed rather than HTML,
/// from the declared content type or a prefix of the body.
pub fn looks_like_feed(content_type: Option<&str>, bytes: &[u8]) -> bool {
    if let Some(ct) = content_type {
        if ct.contains("rss") || ct.contains("atom") || ct.contains("xml") {
            return true;
        }
    }
    let head = String::from_utf8_lossy(&bytes[..bytes.len().min(512)]);
    head.contains("<rss") || head.contains("<feed")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn looks_like_feed_detects_rss_content_type() {
        assert!(looks_like_feed(Some("application/rss+xml"), b"<rss></rss>"));
    }

    #[test]
    fn looks_like_feed_sniffs_atom_tag_without_content_type() {
        assert!(looks_like_feed(None, b"<?xml version=\"1.0\"?><feed></feed>"));
    }

    #[test]
    fn looks_like_feed_rejects_plain_html() {
        assert!(!looks_like_feed(
            Some("text/html"),
            b"<html><body>hi</body></html>"
        ));
    }
}
