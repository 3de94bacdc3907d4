//! Search request/result types (§4.4).

use chrono::NaiveDate;
use uuid::Uuid;

use learnfeed_common::ResourceKind;

/// Metadata filters applied by `VectorIndex::search`. All filter fields are
/// conjunctive (AND'd together); absent fields impose no restriction.
#[derive(Debug, Clone, Default)]
pub struct SearchFilters {
    pub kind: Option<ResourceKind>,
    pub source_id_in: Option<Vec<Uuid>>,
    pub published_date_gte: Option<NaiveDate>,
    pub published_date_lte: Option<NaiveDate>,
    pub exclude_ids: Vec<Uuid>,
}

#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub query_vector: Vec<f32>,
    pub k: usize,
    pub filters: SearchFilters,
}

/// A single ranked hit. `score` is cosine similarity mapped to `[0, 1]`;
/// callers must rely only on its monotonicity, not an absolute scale (§4.4).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredId {
    pub id: Uuid,
    pub score: f64,
}
