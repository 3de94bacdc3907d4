//! Feed Generator (§4.9): orchestrates one idempotent recommendation run
//! per `(user, feed_type, date)`, plus the `generate_all` convenience that
//! iterates every feed type with per-type failure isolation.

use std::collections::HashSet;

use chrono::{Duration, NaiveDate, Utc};
use uuid::Uuid;

use learnfeed_common::{Recommendation, ResourceKind};
use learnfeed_embed::EmbedBackend;
use learnfeed_store::{RecommendationStore, VoteStore};

use crate::engine::{EngineContext, RecommendationEngine};
use crate::error::Result;
use crate::profile::ProfileBuilder;

/// Default window (inclusive) over which prior recommendations count as
/// "recently recommended" and are excluded from a fresh run (§4.9 step 3).
const DEFAULT_RECENT_RECOMMENDATION_WINDOW_DAYS: i64 = 7;

pub struct FeedGenerator<B: EmbedBackend> {
    recommendation_store: RecommendationStore,
    vote_store: VoteStore,
    profile_builder: ProfileBuilder<B>,
    engine: RecommendationEngine,
    recent_recommendation_window_days: i64,
}

impl<B: EmbedBackend> FeedGenerator<B> {
    pub fn new(
        recommendation_store: RecommendationStore,
        vote_store: VoteStore,
        profile_builder: ProfileBuilder<B>,
        engine: RecommendationEngine,
    ) -> Self {
        Self::with_recent_window(
            recommendation_store,
            vote_store,
            profile_builder,
            engine,
            DEFAULT_RECENT_RECOMMENDATION_WINDOW_DAYS,
        )
    }

    /// Same as `new`, but with the "recently recommended" exclusion window
    /// (§4.9 step 3) taken from config rather than the default.
    pub fn with_recent_window(
        recommendation_store: RecommendationStore,
        vote_store: VoteStore,
        profile_builder: ProfileBuilder<B>,
        engine: RecommendationEngine,
        recent_recommendation_window_days: i64,
    ) -> Self {
        Self {
            recommendation_store,
            vote_store,
            profile_builder,
            engine,
            recent_recommendation_window_days,
        }
    }

    /// §4.9: idempotent per `(user, date, feed_type)` — a second call with
    /// the same arguments returns the first call's rows unchanged (§8
    /// Idempotency property).
    pub async fn generate(
        &self,
        user_id: Uuid,
        feed_type: ResourceKind,
        date: NaiveDate,
        n: usize,
    ) -> Result<Vec<Recommendation>> {
        let existing = self
            .recommendation_store
            .get_by_user_date_type(user_id, date, feed_type)
            .await?;
        if !existing.is_empty() {
            return Ok(existing);
        }

        let profile = self.profile_builder.build(user_id).await?;
        let votes = self.vote_store.get_by_user(user_id).await?;

        let seen_ids: HashSet<Uuid> = votes.iter().map(|v| v.vote.resource_id).collect();
        let recently_recommended_ids: HashSet<Uuid> = self
            .recommendation_store
            .get_recent_by_user(user_id, date - Duration::days(self.recent_recommendation_window_days), date)
            .await?
            .into_iter()
            .map(|r| r.resource_id)
            .collect();

        let scored = self
            .engine
            .recommend(EngineContext {
                user_id,
                feed_type,
                date,
                count: n,
                profile: &profile,
                seen_ids,
                recently_recommended_ids,
                votes: &votes,
            })
            .await?;

        if scored.is_empty() {
            return Ok(Vec::new());
        }

        let now = Utc::now();
        let recommendations: Vec<Recommendation> = scored
            .into_iter()
            .enumerate()
            .map(|(idx, s)| Recommendation {
                id: Uuid::new_v4(),
                user_id,
                resource_id: s.resource_id,
                feed_type,
                date,
                position: (idx + 1) as i32,
                score: s.score,
                generated_at: now,
            })
            .collect();

        self.recommendation_store.add_all(&recommendations).await.map_err(Into::into)
    }

    /// Iterate every enumerated feed type for `user_id`; a failure on one
    /// type is logged and does not prevent the remaining types from running
    /// (§4.9 Auxiliary).
    pub async fn generate_all(&self, user_id: Uuid, date: NaiveDate, n: usize) -> Vec<Recommendation> {
        let mut out = Vec::new();
        for feed_type in ResourceKind::ALL {
            match self.generate(user_id, feed_type, date, n).await {
                Ok(mut recs) => out.append(&mut recs),
                Err(err) => {
                    tracing::error!(user_id = %user_id, %feed_type, error = %err, "feed generation failed for this feed type");
                }
            }
        }
        out
    }
}
