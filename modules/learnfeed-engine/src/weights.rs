//! Hybrid-score tuning knobs (§4.8, Open Question in SPEC_FULL §9: the
//! 70/30 vector/heuristic blend has no tuning hook in the source — it is
//! exposed here as configuration rather than hard-coded).

use learnfeed_common::Config;

#[derive(Debug, Clone, Copy)]
pub struct EngineWeights {
    pub vector_weight: f64,
    pub heuristic_weight: f64,
    pub source_pref_weight: f64,
    pub recency_weight: f64,
    pub vote_sentiment_weight: f64,
    pub diversity_cap_per_source: usize,
    pub diversity_penalties: [f64; 3],
    /// Candidate recency window in days (§4.8 Phase 1, §8 "Recency window"
    /// property). Exposed as config alongside the blend weights above.
    pub recency_window_days: i64,
}

impl Default for EngineWeights {
    fn default() -> Self {
        Self {
            vector_weight: 0.7,
            heuristic_weight: 0.3,
            source_pref_weight: 0.5,
            recency_weight: 0.3,
            vote_sentiment_weight: 0.2,
            diversity_cap_per_source: 3,
            diversity_penalties: [0.02, 0.04, 0.05],
            recency_window_days: 90,
        }
    }
}

impl From<&Config> for EngineWeights {
    fn from(cfg: &Config) -> Self {
        Self {
            vector_weight: cfg.vector_weight,
            heuristic_weight: cfg.heuristic_weight,
            source_pref_weight: cfg.source_pref_weight,
            recency_weight: cfg.recency_weight,
            vote_sentiment_weight: cfg.vote_sentiment_weight,
            diversity_cap_per_source: cfg.diversity_cap_per_source,
            diversity_penalties: cfg.diversity_penalties,
            recency_window_days: cfg.recency_window_days,
        }
    }
}
