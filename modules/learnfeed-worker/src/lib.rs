//! Ingestion Job (§4.10), Reindex (§4.11), Feed Generation Job (§4.12), and
//! the Scheduler / Worker Loop (§4.13) that drives both on wall-clock
//! intervals. The binary entrypoint (`main.rs`) wires these to a
//! `learnfeed_common::Config` and a `clap`-derived CLI.

pub mod error;
pub mod jobs;
pub mod scheduler;

pub use error::{Result, WorkerError};
pub use jobs::{FeedJob, FeedStats, IngestionJob, IngestionStats, ReindexJob, ReindexStats};
pub use scheduler::Scheduler;
