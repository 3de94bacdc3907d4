//! User Profile Builder (§4.7): from a user's vote history, produce a
//! unit-normalized preference embedding and a per-source preference map.

use std::collections::HashMap;

use uuid::Uuid;

use learnfeed_common::{Polarity, UserProfile};
use learnfeed_embed::{mean, l2_normalize, EmbedBackend, EmbedItem, EmbeddingClient};
use learnfeed_store::VoteStore;

use crate::error::Result;

pub struct ProfileBuilder<B: EmbedBackend> {
    vote_store: VoteStore,
    embed_client: EmbeddingClient<B>,
}

impl<B: EmbedBackend> ProfileBuilder<B> {
    pub fn new(vote_store: VoteStore, embed_client: EmbeddingClient<B>) -> Self {
        Self {
            vote_store,
            embed_client,
        }
    }

    /// Build `user_id`'s profile (§4.7 steps 1-4). Upvotes without any votes
    /// at all yield `user_embedding = None`; a single source, or a vote
    /// history where every source's sentiment sum ties, yields a uniform
    /// `0.5` source preference.
    pub async fn build(&self, user_id: Uuid) -> Result<UserProfile> {
        let votes = self.vote_store.get_by_user(user_id).await?;

        let upvoted_resources: Vec<_> = votes
            .iter()
            .filter(|v| v.vote.polarity == Polarity::Upvote)
            .map(|v| &v.resource)
            .collect();

        let user_embedding = if upvoted_resources.is_empty() {
            None
        } else {
            let items: Vec<EmbedItem> = upvoted_resources
                .iter()
                .map(|r| EmbedItem::new(r.embedding_text(), r.title.clone()))
                .collect();
            let vectors = self.embed_client.embed_batch(&items).await?;
            let mut centroid = mean(&vectors);
            l2_normalize(&mut centroid);
            Some(centroid)
        };

        let source_preference = source_preference_map(&votes);

        Ok(UserProfile {
            user_embedding,
            source_preference,
            total_interactions: votes.len(),
        })
    }
}

/// Per-source sentiment sums (+1 upvote, -0.5 downvote), min-max normalized
/// into `[0, 1]`. A single source, or a tie across all sources, maps every
/// present source to `0.5` uniformly (§4.7 step 3).
fn source_preference_map(votes: &[learnfeed_common::VoteWithResource]) -> HashMap<Uuid, f64> {
    let mut sums: HashMap<Uuid, f64> = HashMap::new();
    for v in votes {
        let Some(source_id) = v.resource.source_id else {
            continue;
        };
        let delta = match v.vote.polarity {
            Polarity::Upvote => 1.0,
            Polarity::Downvote => -0.5,
        };
        *sums.entry(source_id).or_insert(0.0) += delta;
    }

    if sums.is_empty() {
        return HashMap::new();
    }
    if sums.len() == 1 {
        return sums.keys().map(|id| (*id, 0.5)).collect();
    }

    let min = sums.values().cloned().fold(f64::INFINITY, f64::min);
    let max = sums.values().cloned().fold(f64::NEG_INFINITY, f64::max);
    if (max - min).abs() < f64::EPSILON {
        return sums.keys().map(|id| (*id, 0.5)).collect();
    }

    sums.into_iter()
        .map(|(id, sum)| (id, (sum - min) / (max - min)))
        .collect()
}
