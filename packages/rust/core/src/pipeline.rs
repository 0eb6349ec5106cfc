//! End-to-end `run` pipeline: topic → discovery → scrape → chunk → annotate → export.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tracing::{info, instrument, warn};

use trainset_discovery::DiscoveryOptions;
use trainset_llm::LanguageModel;
use trainset_scrape::{FetchError, PageFetcher, ScrapeProgress, SourceFailure};
use trainset_shared::{
    Dataset, MergedDocument, PipelineConfig, Result, RunId, TrainSetError, Topic, TrainingPair,
};

use crate::annotation::{self, AnnotationFailure, AnnotationProgress};
use crate::chunker::chunk_text;
use crate::dataset::to_table;
use crate::export::{
    ArtifactKind, ArtifactMeta, ExportSink, dataset_filename, diagnostic_filename,
    merged_filename,
};

/// Result of one pipeline run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: RunId,
    pub topic: Topic,
    pub started_at: DateTime<Utc>,
    /// URLs returned by discovery, in order.
    pub urls: Vec<String>,
    /// Sources that could not be fetched.
    pub source_failures: Vec<SourceFailure>,
    /// The merged text, or `None` when nothing was scraped.
    pub merged: Option<MergedDocument>,
    pub chunk_count: usize,
    pub dataset: Dataset,
    /// The first `preview_count` pairs, normalized for display.
    pub preview: Vec<TrainingPair>,
    /// Chunks that contributed no pairs.
    pub annotation_failures: Vec<AnnotationFailure>,
    pub total_tokens_in: u64,
    pub total_tokens_out: u64,
    pub artifacts: Vec<ArtifactMeta>,
    pub elapsed: Duration,
}

impl RunReport {
    pub fn pair_count(&self) -> usize {
        self.dataset.len()
    }

    /// First artifact of the given kind.
    pub fn artifact(&self, kind: ArtifactKind) -> Option<&ArtifactMeta> {
        self.artifacts.iter().find(|a| a.kind == kind)
    }
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called before fetching a source (1-based `current`).
    fn source_progress(&self, url: &str, current: usize, total: usize);
    /// Called when a source is skipped.
    fn source_failed(&self, url: &str, error: &FetchError);
    /// Called before annotating a chunk (1-based `current`).
    fn chunk_progress(&self, current: usize, total: usize);
    /// Diagnostic event for a skipped chunk.
    fn chunk_failed(&self, failure: &AnnotationFailure);
    /// Called when the pipeline completes.
    fn done(&self, report: &RunReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn source_progress(&self, _url: &str, _current: usize, _total: usize) {}
    fn source_failed(&self, _url: &str, _error: &FetchError) {}
    fn chunk_progress(&self, _current: usize, _total: usize) {}
    fn chunk_failed(&self, _failure: &AnnotationFailure) {}
    fn done(&self, _report: &RunReport) {}
}

/// Run the full pipeline for one topic.
///
/// 1. Validate configuration (before any network activity)
/// 2. Discover source URLs; none is fatal
/// 3. Scrape and merge; write the merged text
/// 4. Chunk the merged text
/// 5. Annotate each chunk; write diagnostics for malformed ones
/// 6. Serialize the dataset and write it
///
/// Partial data never fails a run: skipped sources and chunks are reported,
/// and zero pairs after a successful scrape is still `Ok`.
#[instrument(skip_all, fields(topic = %topic, model = model.name()))]
pub async fn run(
    topic: &Topic,
    config: &PipelineConfig,
    model: &dyn LanguageModel,
    fetcher: &dyn PageFetcher,
    sink: &mut dyn ExportSink,
    progress: &dyn ProgressReporter,
) -> Result<RunReport> {
    config.validate()?;

    let start = Instant::now();
    let started_at = Utc::now();
    let run_id = RunId::new();
    let mut artifacts = Vec::new();

    info!(%run_id, "starting run");

    // --- Phase 1: Discovery ---
    progress.phase("Discovering sources");
    let opts = DiscoveryOptions {
        url_count: config.url_count,
    };
    let urls = trainset_discovery::discover_urls(model, topic, &opts).await?;
    if urls.is_empty() {
        return Err(TrainSetError::NoUrlsDiscovered {
            topic: topic.to_string(),
        });
    }

    // --- Phase 2: Scrape ---
    progress.phase("Scraping sources");
    let scrape_progress = PipelineScrapeProgress { inner: progress };
    let scraped = trainset_scrape::scrape_and_merge(fetcher, &urls, &scrape_progress).await;
    if scraped.document.is_empty() {
        warn!("no source produced any content");
    }

    artifacts.push(sink.write(
        ArtifactKind::MergedText,
        &merged_filename(topic),
        scraped.document.as_str(),
    )?);

    // --- Phase 3: Chunk ---
    progress.phase("Chunking text");
    let chunks = chunk_text(scraped.document.as_str(), config.max_chunk_chars)?;
    info!(chunks = chunks.len(), "text chunked");

    // --- Phase 4: Annotate ---
    progress.phase("Annotating chunks");
    let annotation_progress = PipelineAnnotationProgress { inner: progress };
    let annotated = annotation::annotate(model, &chunks, &annotation_progress).await;

    if config.write_diagnostics {
        for failure in &annotated.failures {
            if let Some(raw) = failure.raw_output() {
                artifacts.push(sink.write(
                    ArtifactKind::Diagnostic,
                    &diagnostic_filename(failure.chunk_index),
                    raw,
                )?);
            }
        }
    }

    let annotation_failures = annotated.failures.clone();
    let total_tokens_in = annotated.total_tokens_in;
    let total_tokens_out = annotated.total_tokens_out;
    let dataset = annotated.into_dataset();

    // --- Phase 5: Export ---
    progress.phase("Writing dataset");
    let table = to_table(&dataset)?;
    artifacts.push(sink.write(ArtifactKind::Dataset, &dataset_filename(topic), &table)?);

    if dataset.is_empty() {
        warn!("run produced no training pairs");
    }

    let chunk_count = chunks.len();
    let report = RunReport {
        run_id,
        topic: topic.clone(),
        started_at,
        urls,
        source_failures: scraped.failures,
        merged: (!scraped.document.is_empty()).then_some(scraped.document),
        chunk_count,
        preview: dataset
            .preview(config.preview_count)
            .iter()
            .map(TrainingPair::normalized)
            .collect(),
        dataset,
        annotation_failures,
        total_tokens_in,
        total_tokens_out,
        artifacts,
        elapsed: start.elapsed(),
    };

    info!(
        run_id = %report.run_id,
        pairs = report.pair_count(),
        skipped_sources = report.source_failures.len(),
        skipped_chunks = report.annotation_failures.len(),
        elapsed_ms = report.elapsed.as_millis() as u64,
        "run complete"
    );

    progress.done(&report);
    Ok(report)
}

// ---------------------------------------------------------------------------
// Progress adapters
// ---------------------------------------------------------------------------

/// Adapts a `ProgressReporter` to the `ScrapeProgress` interface.
struct PipelineScrapeProgress<'a> {
    inner: &'a dyn ProgressReporter,
}

impl ScrapeProgress for PipelineScrapeProgress<'_> {
    fn source_started(&self, index: usize, total: usize, url: &str) {
        self.inner.source_progress(url, index + 1, total);
    }

    fn source_failed(&self, url: &str, error: &FetchError) {
        self.inner.source_failed(url, error);
    }
}

/// Adapts a `ProgressReporter` to the `AnnotationProgress` interface.
struct PipelineAnnotationProgress<'a> {
    inner: &'a dyn ProgressReporter,
}

impl AnnotationProgress for PipelineAnnotationProgress<'_> {
    fn chunk_started(&self, index: usize, total: usize) {
        self.inner.chunk_progress(index + 1, total);
    }

    fn chunk_failed(&self, failure: &AnnotationFailure) {
        self.inner.chunk_failed(failure);
    }
}
