//! Scrape every discovered source and merge the successes.

use tracing::{info, instrument, warn};

use trainset_shared::{MergedDocument, ScrapedExtract};

use crate::fetcher::{FetchError, PageFetcher};

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

/// Per-source progress callbacks.
pub trait ScrapeProgress: Send + Sync {
    /// Called before fetching source `index` (0-based) of `total`.
    fn source_started(&self, index: usize, total: usize, url: &str);

    /// Called when a source fails. The run continues.
    fn source_failed(&self, url: &str, error: &FetchError);
}

/// No-op progress.
pub struct SilentScrapeProgress;

impl ScrapeProgress for SilentScrapeProgress {
    fn source_started(&self, _index: usize, _total: usize, _url: &str) {}
    fn source_failed(&self, _url: &str, _error: &FetchError) {}
}

// ---------------------------------------------------------------------------
// Result
// ---------------------------------------------------------------------------

/// A source that contributed nothing, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFailure {
    pub url: String,
    pub error: FetchError,
}

/// Outcome of scraping all sources.
#[derive(Debug, Clone, Default)]
pub struct ScrapeResult {
    pub document: MergedDocument,
    /// Successful extracts in source order.
    pub extracts: Vec<ScrapedExtract>,
    pub failures: Vec<SourceFailure>,
}

impl ScrapeResult {
    pub fn succeeded(&self) -> usize {
        self.extracts.len()
    }
}

// ---------------------------------------------------------------------------
// scrape_and_merge
// ---------------------------------------------------------------------------

/// Fetch each URL in order and merge the cleaned texts.
///
/// A failing source is logged, reported to `progress`, recorded in
/// [`ScrapeResult::failures`], and otherwise skipped. If every source fails
/// the document is empty; that is not an error here.
#[instrument(skip_all, fields(sources = urls.len()))]
pub async fn scrape_and_merge(
    fetcher: &dyn PageFetcher,
    urls: &[String],
    progress: &dyn ScrapeProgress,
) -> ScrapeResult {
    let total = urls.len();
    let mut extracts = Vec::with_capacity(total);
    let mut failures = Vec::new();

    for (index, url) in urls.iter().enumerate() {
        progress.source_started(index, total, url);

        match fetcher.fetch_text(url).await {
            Ok(text) => {
                extracts.push(ScrapedExtract {
                    source: url.clone(),
                    text,
                });
            }
            Err(error) => {
                warn!(%url, %error, "source failed, skipping");
                progress.source_failed(url, &error);
                failures.push(SourceFailure {
                    url: url.clone(),
                    error,
                });
            }
        }
    }

    let document = MergedDocument::from_extracts(&extracts);

    info!(
        succeeded = extracts.len(),
        failed = failures.len(),
        merged_len = document.len(),
        "scraping complete"
    );

    ScrapeResult {
        document,
        extracts,
        failures,
    }
}
