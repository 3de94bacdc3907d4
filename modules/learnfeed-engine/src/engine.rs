//! Recommendation Engine (§4.8): hybrid candidate retrieval, heuristic
//! scoring, fusion, diversity filtering, and top-N selection.

use std::collections::{HashMap, HashSet};

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use uuid::Uuid;

use learnfeed_common::{Resource, ResourceKind, UserProfile, VoteWithResource};
use learnfeed_store::ResourceStore;
use learnfeed_vector::{SearchFilters, SearchRequest, VectorIndex};

use crate::error::Result;
use crate::scoring::{heuristic_score, recency_score, vote_sentiment_by_source};
use crate::weights::EngineWeights;

/// A vector-search multiplier applied to the target count to build a
/// candidate pool large enough to survive the diversity filter (§4.8
/// Phase 1: `k = 10*N`).
const CANDIDATE_POOL_MULTIPLIER: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scored {
    pub resource_id: Uuid,
    pub score: f64,
}

pub struct EngineContext<'a> {
    pub user_id: Uuid,
    pub feed_type: ResourceKind,
    pub date: NaiveDate,
    pub count: usize,
    pub profile: &'a UserProfile,
    pub seen_ids: HashSet<Uuid>,
    pub recently_recommended_ids: HashSet<Uuid>,
    pub votes: &'a [VoteWithResource],
}

pub struct RecommendationEngine {
    vector_index: VectorIndex,
    resource_store: ResourceStore,
    weights: EngineWeights,
}

struct RankedCandidate {
    resource_id: Uuid,
    source_id: Option<Uuid>,
    base_score: f64,
}

impl RecommendationEngine {
    pub fn new(vector_index: VectorIndex, resource_store: ResourceStore, weights: EngineWeights) -> Self {
        Self {
            vector_index,
            resource_store,
            weights,
        }
    }

    /// Run all five phases of §4.8 and return up to `ctx.count` scored
    /// resources, ordered by final (post-diversity-penalty) score.
    pub async fn recommend(&self, ctx: EngineContext<'_>) -> Result<Vec<Scored>> {
        let mut exclude: Vec<Uuid> = ctx.seen_ids.iter().chain(ctx.recently_recommended_ids.iter()).copied().collect();
        exclude.sort();
        exclude.dedup();

        let since = ctx.date - Duration::days(self.weights.recency_window_days);
        let pool_size = CANDIDATE_POOL_MULTIPLIER * ctx.count.max(1);

        let raw_candidates = match self.retrieve_candidates(&ctx, since, pool_size, &exclude).await {
            Ok(candidates) => candidates,
            Err(err) => {
                tracing::warn!(
                    user_id = %ctx.user_id, feed_type = %ctx.feed_type, error = %err,
                    "candidate retrieval failed, returning empty recommendation set"
                );
                return Ok(Vec::new());
            }
        };

        if raw_candidates.is_empty() {
            return Ok(Vec::new());
        }

        let vote_sentiment = vote_sentiment_by_source(ctx.votes);

        let mut scored: Vec<RankedCandidate> = raw_candidates
            .into_iter()
            .map(|c| {
                let source_pref = c
                    .source_id
                    .and_then(|s| ctx.profile.source_preference.get(&s).copied())
                    .unwrap_or(0.5);
                let sentiment = c
                    .source_id
                    .and_then(|s| vote_sentiment.get(&s).copied())
                    .unwrap_or(0.5);
                let recency = recency_score(c.created_at, ctx.date);
                let heuristic = heuristic_score(
                    source_pref,
                    recency,
                    sentiment,
                    self.weights.source_pref_weight,
                    self.weights.recency_weight,
                    self.weights.vote_sentiment_weight,
                );
                let base_score =
                    self.weights.vector_weight * c.vector_similarity + self.weights.heuristic_weight * heuristic;
                RankedCandidate {
                    resource_id: c.resource_id,
                    source_id: c.source_id,
                    base_score,
                }
            })
            .collect();

        scored.sort_by(|a, b| b.base_score.partial_cmp(&a.base_score).unwrap_or(std::cmp::Ordering::Equal));

        let admitted = apply_diversity_filter(scored, &self.weights);

        Ok(admitted.into_iter().take(ctx.count).collect())
    }

    /// Phase 1: vector search when the user has a preference embedding,
    /// otherwise a recency-ordered fallback from the Resource Store.
    async fn retrieve_candidates(
        &self,
        ctx: &EngineContext<'_>,
        since: NaiveDate,
        pool_size: usize,
        exclude: &[Uuid],
    ) -> Result<Vec<RawCandidate>> {
        if let Some(embedding) = &ctx.profile.user_embedding {
            let hits = self
                .vector_index
                .search(&SearchRequest {
                    query_vector: embedding.clone(),
                    k: pool_size,
                    filters: SearchFilters {
                        kind: Some(ctx.feed_type),
                        published_date_gte: Some(since),
                        exclude_ids: exclude.to_vec(),
                        ..Default::default()
                    },
                })
                .await?;

            if hits.is_empty() {
                return Ok(Vec::new());
            }

            let ids: Vec<Uuid> = hits.iter().map(|h| h.id).collect();
            let resources = self.resource_store.get_by_ids(&ids).await?;
            let by_id: HashMap<Uuid, Resource> = resources.into_iter().map(|r| (r.id, r)).collect();

            Ok(hits
                .into_iter()
                .filter_map(|hit| {
                    let resource = by_id.get(&hit.id)?;
                    Some(RawCandidate {
                        resource_id: hit.id,
                        source_id: resource.source_id,
                        created_at: resource.created_at.date_naive(),
                        vector_similarity: hit.score,
                    })
                })
                .collect())
        } else {
            let since_at = Utc.from_utc_datetime(&since.and_hms_opt(0, 0, 0).expect("valid midnight"));
            let exclude_set: HashSet<Uuid> = exclude.iter().copied().collect();
            let resources = self.resource_store.recent_by_kind(ctx.feed_type, since_at).await?;

            Ok(resources
                .into_iter()
                .filter(|r| !exclude_set.contains(&r.id))
                .take(pool_size)
                .map(|r| RawCandidate {
                    resource_id: r.id,
                    source_id: r.source_id,
                    created_at: r.created_at.date_naive(),
                    vector_similarity: 0.5,
                })
                .collect())
        }
    }

}

struct RawCandidate {
    resource_id: Uuid,
    source_id: Option<Uuid>,
    created_at: NaiveDate,
    vector_similarity: f64,
}

/// Phase 4: scan `scored` (already sorted by `base_score` descending) once,
/// admitting up to `diversity_cap_per_source` per `source_id` and
/// subtracting a per-occurrence penalty from the admitted item's score. The
/// scan order itself is the final order — penalties are applied for
/// transparency in the persisted score, not to trigger a re-sort.
fn apply_diversity_filter(scored: Vec<RankedCandidate>, weights: &EngineWeights) -> Vec<Scored> {
    let mut per_source_count: HashMap<Uuid, usize> = HashMap::new();
    let mut out = Vec::with_capacity(scored.len());

    for candidate in scored {
        let Some(source_id) = candidate.source_id else {
            out.push(Scored {
                resource_id: candidate.resource_id,
                score: candidate.base_score,
            });
            continue;
        };

        let occurrence = per_source_count.entry(source_id).or_insert(0);
        if *occurrence >= weights.diversity_cap_per_source {
            continue;
        }
        let penalty = if *occurrence == 0 {
            0.0
        } else {
            weights.diversity_penalties.get(*occurrence - 1).copied().unwrap_or(0.0)
        };
        *occurrence += 1;

        out.push(Scored {
            resource_id: candidate.resource_id,
            score: candidate.base_score - penalty,
        });
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(resource_id: Uuid, source_id: Option<Uuid>, base_score: f64) -> RankedCandidate {
        RankedCandidate {
            resource_id,
            source_id,
            base_score,
        }
    }

    #[test]
    fn diversity_filter_caps_per_source_and_penalizes_repeats() {
        let source = Uuid::new_v4();
        let scored = vec![
            candidate(Uuid::new_v4(), Some(source), 0.9),
            candidate(Uuid::new_v4(), Some(source), 0.8),
            candidate(Uuid::new_v4(), Some(source), 0.7),
            candidate(Uuid::new_v4(), Some(source), 0.6),
        ];
        let out = apply_diversity_filter(scored, &EngineWeights::default());
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].score, 0.9);
        assert_eq!(out[1].score, 0.8 - 0.02);
        assert_eq!(out[2].score, 0.7 - 0.04);
    }

    #[test]
    fn diversity_filter_always_admits_sourceless_candidates() {
        let scored = vec![
            candidate(Uuid::new_v4(), None, 0.9),
            candidate(Uuid::new_v4(), None, 0.8),
            candidate(Uuid::new_v4(), None, 0.7),
            candidate(Uuid::new_v4(), None, 0.6),
        ];
        let out = apply_diversity_filter(scored, &EngineWeights::default());
        assert_eq!(out.len(), 4);
    }
}
