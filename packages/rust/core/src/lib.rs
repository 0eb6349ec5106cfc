//! Core pipeline orchestration and domain logic for TrainSet.
//!
//! This crate ties together discovery, scraping, chunking, annotation, and
//! export into the end-to-end [`pipeline::run`] workflow.

pub mod annotation;
pub mod chunker;
pub mod dataset;
pub mod export;
pub mod pipeline;

pub use annotation::{
    AnnotationFailure, AnnotationFailureKind, AnnotationProgress, AnnotationResults,
    SilentAnnotationProgress, annotate,
};
pub use chunker::chunk_text;
pub use dataset::{from_table, to_table};
pub use export::{ArtifactKind, ArtifactMeta, DirectorySink, ExportSink, MemorySink};
pub use pipeline::{ProgressReporter, RunReport, SilentProgress, run};
