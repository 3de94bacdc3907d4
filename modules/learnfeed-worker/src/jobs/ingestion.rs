//! Ingestion Job (§4.10): per-active-source, fetch -> extract -> dedupe ->
//! persist -> embed -> index, with per-source timeout isolation so one
//! stalled source never starves the rest of the batch.

use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use learnfeed_common::{Resource, Source, VectorDocument};
use learnfeed_embed::{EmbedBackend, EmbedItem, EmbeddingClient};
use learnfeed_extract::{ExtractionClient, LlmBackend};
use learnfeed_fetch::FetchBackend;
use learnfeed_store::{ResourceStore, SourceStore, StoreError};
use learnfeed_vector::VectorIndex;

const MAX_CONTENT_CHARS: usize = 50_000;

/// Counters accumulated over one ingestion run, logged in a single `info!`
/// span at the end (§4.10 expansion).
#[derive(Debug, Default)]
pub struct IngestionStats {
    pub sources_processed: usize,
    pub sources_failed: usize,
    pub resources_added: usize,
    pub duplicates_skipped: usize,
}

impl std::fmt::Display for IngestionStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "sources_processed={} sources_failed={} resources_added={} duplicates_skipped={}",
            self.sources_processed, self.sources_failed, self.resources_added, self.duplicates_skipped
        )
    }
}

struct SourceOutcome {
    added: usize,
    duplicates: usize,
}

pub struct IngestionJob<F: FetchBackend, L: LlmBackend, E: EmbedBackend> {
    fetcher: F,
    extraction: ExtractionClient<L>,
    embed: EmbeddingClient<E>,
    source_store: SourceStore,
    resource_store: ResourceStore,
    vector_index: VectorIndex,
    batch_size: usize,
    source_deadline: Duration,
}

impl<F: FetchBackend, L: LlmBackend, E: EmbedBackend> IngestionJob<F, L, E> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        fetcher: F,
        extraction: ExtractionClient<L>,
        embed: EmbeddingClient<E>,
        source_store: SourceStore,
        resource_store: ResourceStore,
        vector_index: VectorIndex,
        batch_size: usize,
        source_deadline: Duration,
    ) -> Self {
        Self {
            fetcher,
            extraction,
            embed,
            source_store,
            resource_store,
            vector_index,
            batch_size,
            source_deadline,
        }
    }

    /// Run one full pass over every active source, in batches of
    /// `batch_size` (serial within a batch). A source that errors or blows
    /// its deadline is logged and skipped; it never aborts the run (§4.10).
    pub async fn run(&self) -> anyhow::Result<IngestionStats> {
        let sources = self.source_store.get_active().await?;
        let mut stats = IngestionStats::default();

        for batch in sources.chunks(self.batch_size.max(1)) {
            for source in batch {
                match tokio::time::timeout(self.source_deadline, self.process_source(source)).await {
                    Ok(Ok(outcome)) => {
                        stats.sources_processed += 1;
                        stats.resources_added += outcome.added;
                        stats.duplicates_skipped += outcome.duplicates;
                    }
                    Ok(Err(err)) => {
                        stats.sources_failed += 1;
                        warn!(source_url = %source.url, error = %err, "ingestion failed for source");
                    }
                    Err(_) => {
                        stats.sources_failed += 1;
                        warn!(
                            source_url = %source.url,
                            deadline_secs = self.source_deadline.as_secs(),
                            "ingestion timed out for source"
                        );
                    }
                }
            }
        }

        info!(%stats, "ingestion run complete");
        Ok(stats)
    }

    async fn process_source(&self, source: &Source) -> anyhow::Result<SourceOutcome> {
        let fetched = self.fetcher.fetch(&source.url).await?;
        let text = learnfeed_fetch::extraction_text(
            fetched.content_type.as_deref(),
            &fetched.bytes,
            MAX_CONTENT_CHARS,
        );

        let candidates = self.extraction.extract(&source.url, &text, source.category).await?;

        let now = Utc::now();
        let mut new_resources = Vec::new();
        let mut duplicates = 0usize;

        for candidate in candidates {
            if candidate.url.trim().is_empty() {
                continue;
            }
            if self.resource_store.exists_by_url(&candidate.url).await? {
                duplicates += 1;
                continue;
            }

            let resource = Resource {
                id: Uuid::new_v4(),
                kind: candidate.kind.unwrap_or(source.category),
                title: candidate.title,
                description: candidate.description,
                url: candidate.url,
                source_id: Some(source.id),
                published_date: None,
                created_at: now,
                updated_at: now,
            };

            match self.resource_store.add(&resource).await {
                Ok(added) => new_resources.push(added),
                Err(StoreError::DuplicateUrl(url)) => {
                    warn!(url, "duplicate url detected on add, treating as benign race");
                    duplicates += 1;
                }
                Err(err) => return Err(err.into()),
            }
        }

        let added = new_resources.len();
        if !new_resources.is_empty() {
            self.embed_and_index(&new_resources).await?;
        }

        Ok(SourceOutcome { added, duplicates })
    }

    /// Embed the whole newly-added batch in one call and upsert the
    /// resulting vectors. `published_date` falls back to `created_at` so
    /// the 90-day recency filter always has a value (§4.10 step 5).
    async fn embed_and_index(&self, resources: &[Resource]) -> anyhow::Result<()> {
        let items: Vec<EmbedItem> = resources
            .iter()
            .map(|r| EmbedItem::new(r.embedding_text(), r.title.clone()))
            .collect();
        let vectors = self.embed.embed_batch(&items).await?;

        let docs: Vec<VectorDocument> = resources
            .iter()
            .zip(vectors)
            .map(|(r, embedding)| VectorDocument {
                id: r.id,
                embedding,
                kind: r.kind,
                source_id: r.source_id,
                published_date: Some(r.created_at.date_naive()),
                created_at: r.created_at,
                updated_at: r.updated_at,
                title: r.title.clone(),
                description: r.description.clone(),
                url: r.url.clone(),
            })
            .collect();

        let report = self.vector_index.upsert(&docs).await?;
        for (id, reason) in &report.failed {
            warn!(resource_id = %id, error = %reason, "vector upsert failed for resource");
        }
        Ok(())
    }
}
