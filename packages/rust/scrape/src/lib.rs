//! Source fetching and merging for TrainSet.
//!
//! [`fetcher`] turns one URL into cleaned text; [`aggregator`] walks the
//! discovered URLs in order, tolerates per-source failures, and merges what
//! succeeded into a single [`MergedDocument`](trainset_shared::MergedDocument).

pub mod aggregator;
pub mod fetcher;

pub use aggregator::{
    ScrapeProgress, ScrapeResult, SilentScrapeProgress, SourceFailure, scrape_and_merge,
};
pub use fetcher::{FetchError, HttpFetcher, PageFetcher};
