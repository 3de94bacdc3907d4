pub mod feed;
pub mod ingestion;
pub mod reindex;

pub use feed::{FeedJob, FeedStats};
pub use ingestion::{IngestionJob, IngestionStats};
pub use reindex::{ReindexJob, ReindexStats};
