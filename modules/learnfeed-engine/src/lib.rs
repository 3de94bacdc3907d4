//! User Profile Builder (§4.7), Recommendation Engine (§4.8), and Feed
//! Generator (§4.9) — the hybrid ranking core of the Daily Feed Generation
//! Pipeline.

pub mod engine;
pub mod error;
pub mod generator;
pub mod profile;
pub mod scoring;
pub mod weights;

pub use engine::{EngineContext, RecommendationEngine, Scored};
pub use error::{EngineError, Result};
pub use generator::FeedGenerator;
pub use profile::ProfileBuilder;
pub use weights::EngineWeights;
