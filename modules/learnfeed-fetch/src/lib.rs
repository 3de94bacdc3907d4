pub mod error;
pub mod fetcher;
pub mod feed_text;

pub use error::{FetchError, Result};
pub use fetcher::{looks_like_feed, ContentFetcher, FetchBackend, FetchedContent};
pub use feed_text::extraction_text;
