//! Pure scoring functions for the hybrid Recommendation Engine (§4.8).

use std::collections::HashMap;

use chrono::NaiveDate;
use uuid::Uuid;

use learnfeed_common::{Polarity, VoteWithResource};

/// Recency half-life in days (§ GLOSSARY).
const RECENCY_HALF_LIFE_DAYS: f64 = 30.0;

/// `exp(-age_days / 30)`, clamped to `[0, 1]`. Negative ages (a resource
/// created after `date`, which shouldn't happen but isn't worth a panic
/// over) clamp to the maximum recency score instead of exceeding 1.0.
pub fn recency_score(resource_created_at: NaiveDate, date: NaiveDate) -> f64 {
    let age_days = (date - resource_created_at).num_days().max(0) as f64;
    (-age_days / RECENCY_HALF_LIFE_DAYS).exp().clamp(0.0, 1.0)
}

/// Per-source `upvote_count / (upvote_count + downvote_count)` over the
/// user's whole vote history, for resources sharing that `source_id`.
/// Sources with no votes are absent from the map; callers default to `0.5`.
pub fn vote_sentiment_by_source(votes: &[VoteWithResource]) -> HashMap<Uuid, f64> {
    let mut counts: HashMap<Uuid, (u32, u32)> = HashMap::new();
    for v in votes {
        let Some(source_id) = v.resource.source_id else {
            continue;
        };
        let entry = counts.entry(source_id).or_insert((0, 0));
        match v.vote.polarity {
            Polarity::Upvote => entry.0 += 1,
            Polarity::Downvote => entry.1 += 1,
        }
    }
    counts
        .into_iter()
        .map(|(id, (up, down))| (id, up as f64 / (up + down) as f64))
        .collect()
}

/// `0.5*source_pref + 0.3*recency + 0.2*vote_sentiment`, with the three
/// weights as configured (defaults match §4.8).
#[allow(clippy::too_many_arguments)]
pub fn heuristic_score(
    source_pref: f64,
    recency: f64,
    vote_sentiment: f64,
    source_pref_weight: f64,
    recency_weight: f64,
    vote_sentiment_weight: f64,
) -> f64 {
    source_pref_weight * source_pref + recency_weight * recency + vote_sentiment_weight * vote_sentiment
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recency_score_is_one_at_zero_age() {
        let d = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        assert!((recency_score(d, d) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn recency_score_decays_with_age() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 31).unwrap();
        let created = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let score = recency_score(created, date);
        assert!(score > 0.0 && score < 0.4);
    }

    #[test]
    fn recency_score_clamps_future_created_at() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let created = NaiveDate::from_ymd_opt(2026, 1, 31).unwrap();
        assert_eq!(recency_score(created, date), 1.0);
    }
}
