use std::time::Duration;

use ai_client::OpenAi;
use async_trait::async_trait;
use learnfeed_common::{Candidate, ResourceKind};
use tracing::{debug, warn};

use crate::error::{ExtractError, Result};
use crate::parse::parse_candidates;
use crate::prompt::{system_prompt, user_prompt};

/// Narrow seam over the chat-completion call so tests can substitute a fake
/// backend instead of talking to a real LLM provider.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    async fn complete(&self, system: &str, user: &str) -> anyhow::Result<String>;
}

#[async_trait]
impl LlmBackend for OpenAi {
    async fn complete(&self, system: &str, user: &str) -> anyhow::Result<String> {
        self.chat_completion(system, user).await
    }
}

pub struct ExtractionClient<B: LlmBackend> {
    backend: B,
    timeout: Duration,
}

impl<B: LlmBackend> ExtractionClient<B> {
    pub fn new(backend: B, timeout: Duration) -> Self {
        Self { backend, timeout }
    }

    /// Translate raw content bytes plus the source's URL/category into a
    /// structured list of candidate resources (§4.2).
    ///
    /// Malformed JSON from the LLM is not fatal — it yields an empty list, the
    /// caller's signal that "source produced nothing this run". Transport and
    /// auth failures are surfaced as typed errors; transport failures are
    /// non-fatal at the Ingestion Job unit boundary, auth failures are fatal.
    pub async fn extract(
        &self,
        source_url: &str,
        content: &str,
        source_category: ResourceKind,
    ) -> Result<Vec<Candidate>> {
        let system = system_prompt();
        let user = user_prompt(source_url, content, &source_category.to_string());

        let raw = tokio::time::timeout(self.timeout, self.backend.complete(&system, &user))
            .await
            .map_err(|_| ExtractError::TransportError(format!("extraction timed out for {source_url}")))?
            .map_err(classify_backend_error)?;

        let mut candidates = parse_candidates(&raw, source_url);
        for candidate in &mut candidates {
            if candidate.kind.is_none() {
                candidate.kind = Some(source_category);
            }
        }

        debug!(source_url, count = candidates.len(), "extraction complete");
        Ok(candidates)
    }
}

fn classify_backend_error(err: anyhow::Error) -> ExtractError {
    let text = err.to_string();
    let lower = text.to_lowercase();
    if lower.contains("401") || lower.contains("unauthorized") || lower.contains("invalid api key") {
        warn!(error = %text, "LLM extraction auth failure");
        ExtractError::AuthError(text)
    } else {
        ExtractError::TransportError(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct FixedBackend(Mutex<Option<anyhow::Result<String>>>);

    #[async_trait]
    impl LlmBackend for FixedBackend {
        async fn complete(&self, _system: &str, _user: &str) -> anyhow::Result<String> {
            self.0.lock().unwrap().take().unwrap()
        }
    }

    #[tokio::test]
    async fn extract_fills_missing_kind_from_source_category() {
        let backend = FixedBackend(Mutex::new(Some(Ok(
            r#"{"resources":[{"title":"T","url":"https://x.com/1"}]}"#.to_string(),
        ))));
        let client = ExtractionClient::new(backend, Duration::from_secs(5));
        let candidates = client
            .extract("https://x.com/feed", "ignored", ResourceKind::Video)
            .await
            .unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].kind, Some(ResourceKind::Video));
    }

    #[tokio::test]
    async fn extract_classifies_auth_errors() {
        let backend = FixedBackend(Mutex::new(Some(Err(anyhow::anyhow!(
            "OpenAI API error (401 Unauthorized): invalid api key"
        )))));
        let client = ExtractionClient::new(backend, Duration::from_secs(5));
        let err = client
            .extract("https://x.com/feed", "ignored", ResourceKind::Video)
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::AuthError(_)));
    }

    #[tokio::test]
    async fn extract_returns_empty_on_malformed_json_without_erroring() {
        let backend = FixedBackend(Mutex::new(Some(Ok("I cannot answer.".to_string()))));
        let client = ExtractionClient::new(backend, Duration::from_secs(5));
        let candidates = client
            .extract("https://x.com/feed", "ignored", ResourceKind::BlogPost)
            .await
            .unwrap();
        assert!(candidates.is_empty());
    }
}
