//! LLM Extraction Client (§4.2): turns raw fetched content into a list of
//! candidate resources via a structured-JSON prompt contract.

pub mod client;
pub mod error;
pub mod parse;
pub mod prompt;

pub use client::{ExtractionClient, LlmBackend};
pub use error::{ExtractError, Result};
