use chrono::{DateTime, NaiveDate, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// ResourceKind
// =============================================================================

/// Discriminator for a learning resource. Also used as a feed type when the
/// user browses recommendations by channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Paper,
    Video,
    BlogPost,
    SocialMediaPost,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 4] = [
        ResourceKind::Paper,
        ResourceKind::Video,
        ResourceKind::BlogPost,
        ResourceKind::SocialMediaPost,
    ];
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceKind::Paper => write!(f, "paper"),
            ResourceKind::Video => write!(f, "video"),
            ResourceKind::BlogPost => write!(f, "blog_post"),
            ResourceKind::SocialMediaPost => write!(f, "social_media_post"),
        }
    }
}

impl std::str::FromStr for ResourceKind {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "paper" => Ok(Self::Paper),
            "video" => Ok(Self::Video),
            "blog_post" => Ok(Self::BlogPost),
            "social_media_post" => Ok(Self::SocialMediaPost),
            other => Err(format!("unknown ResourceKind: {other}")),
        }
    }
}

// =============================================================================
// Resource
// =============================================================================

/// Immutable content reference. Created by the Ingestion Job on first sighting
/// of a URL; never deleted by the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: Uuid,
    pub kind: ResourceKind,
    pub title: String,
    pub description: Option<String>,
    pub url: String,
    pub source_id: Option<Uuid>,
    pub published_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Resource {
    /// Text passed to the Embedding Client: `"{title} {description}"`.
    pub fn embedding_text(&self) -> String {
        match &self.description {
            Some(d) if !d.is_empty() => format!("{} {}", self.title, d),
            _ => self.title.clone(),
        }
    }
}

// =============================================================================
// Source
// =============================================================================

/// User-configured ingestion endpoint. Core reads only; writes come from the
/// (out-of-scope) API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub id: Uuid,
    pub owner_user_id: Uuid,
    pub name: String,
    pub url: String,
    pub category: ResourceKind,
    pub is_active: bool,
}

// =============================================================================
// User
// =============================================================================

/// Identity anchor. Core reads only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
}

// =============================================================================
// Vote
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Polarity {
    Upvote,
    Downvote,
}

impl Polarity {
    pub fn as_i32(&self) -> i32 {
        match self {
            Polarity::Upvote => 1,
            Polarity::Downvote => -1,
        }
    }

    pub fn from_i32(v: i32) -> Option<Self> {
        match v {
            1 => Some(Polarity::Upvote),
            -1 => Some(Polarity::Downvote),
            _ => None,
        }
    }
}

/// User's polarity signal on a resource. At most one vote per (user, resource).
/// Core reads only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vote {
    pub id: Uuid,
    pub user_id: Uuid,
    pub resource_id: Uuid,
    pub polarity: Polarity,
    pub created_at: DateTime<Utc>,
}

/// A vote together with its eagerly-loaded resource, as required by the
/// User Profile Builder and Recommendation Engine (both need `source_id`).
#[derive(Debug, Clone, PartialEq)]
pub struct VoteWithResource {
    pub vote: Vote,
    pub resource: Resource,
}

// =============================================================================
// Recommendation
// =============================================================================

/// Persisted output of the Feed Generation Pipeline. Historical — never
/// updated, never deleted by the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub id: Uuid,
    pub user_id: Uuid,
    pub resource_id: Uuid,
    pub feed_type: ResourceKind,
    pub date: NaiveDate,
    pub position: i32,
    pub score: f64,
    pub generated_at: DateTime<Utc>,
}

// =============================================================================
// VectorDocument
// =============================================================================

/// Mirrored entry in the Vector Index. `id` equals the Resource `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorDocument {
    pub id: Uuid,
    pub embedding: Vec<f32>,
    pub kind: ResourceKind,
    pub source_id: Option<Uuid>,
    pub published_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub title: String,
    pub description: Option<String>,
    pub url: String,
}

// =============================================================================
// UserProfile (transient; never persisted)
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct UserProfile {
    /// L2-normalized mean embedding of the user's upvoted resources.
    /// `None` when the user has no upvotes.
    pub user_embedding: Option<Vec<f32>>,
    /// Per-source preference in `[0, 1]`, min-max normalized over the user's
    /// vote history.
    pub source_preference: std::collections::HashMap<Uuid, f64>,
    pub total_interactions: usize,
}

// =============================================================================
// Candidate (pre-persistence, from the LLM Extraction Client)
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct Candidate {
    pub title: String,
    pub url: String,
    pub description: Option<String>,
    pub kind: Option<ResourceKind>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_kind_round_trips_through_display_and_from_str() {
        for kind in ResourceKind::ALL {
            let parsed: ResourceKind = kind.to_string().parse().unwrap();
            assert_eq!(parsed, kind);
        }
    }

    #[test]
    fn embedding_text_falls_back_to_title_when_description_missing() {
        let resource = Resource {
            id: Uuid::new_v4(),
            kind: ResourceKind::BlogPost,
            title: "Title".to_string(),
            description: None,
            url: "https://example.com".to_string(),
            source_id: None,
            published_date: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(resource.embedding_text(), "Title");
    }

    #[test]
    fn embedding_text_joins_title_and_description() {
        let resource = Resource {
            id: Uuid::new_v4(),
            kind: ResourceKind::Paper,
            title: "Title".to_string(),
            description: Some("Description".to_string()),
            url: "https://example.com".to_string(),
            source_id: None,
            published_date: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(resource.embedding_text(), "Title Description");
    }
}
