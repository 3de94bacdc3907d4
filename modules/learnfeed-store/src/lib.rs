//! Resource Store, Vote/Recommendation Store, and the read-only
//! Source/User stores (§4.5, §4.6, §6). Plain `sqlx` over Postgres.

pub mod error;
pub mod recommendation_store;
pub mod resource_store;
pub mod source_store;
pub mod testutil;
pub mod user_store;
pub mod vote_store;

pub use error::{Result, StoreError};
pub use recommendation_store::RecommendationStore;
pub use resource_store::ResourceStore;
pub use source_store::SourceStore;
pub use user_store::UserStore;
pub use vote_store::VoteStore;
