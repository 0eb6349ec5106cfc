//! Export sinks for run artifacts.
//!
//! A run produces up to three kinds of artifact: the merged source text, the
//! CSV dataset, and one diagnostic file per malformed chunk. Where they go is
//! decided by an [`ExportSink`]: [`DirectorySink`] writes files atomically,
//! [`MemorySink`] keeps them in memory.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, instrument};

use trainset_shared::{Result, TrainSetError, Topic};

// ---------------------------------------------------------------------------
// Artifact naming
// ---------------------------------------------------------------------------

/// What an artifact contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    MergedText,
    Dataset,
    Diagnostic,
}

impl ArtifactKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MergedText => "merged_text",
            Self::Dataset => "dataset",
            Self::Diagnostic => "diagnostic",
        }
    }
}

/// `<stem>_merged_data.txt`
pub fn merged_filename(topic: &Topic) -> String {
    format!("{}_merged_data.txt", topic.file_stem())
}

/// `<stem>_training_data.csv`
pub fn dataset_filename(topic: &Topic) -> String {
    format!("{}_training_data.csv", topic.file_stem())
}

/// `debug_chunk_<n>.txt`, numbered from 1.
pub fn diagnostic_filename(chunk_index: usize) -> String {
    format!("debug_chunk_{}.txt", chunk_index + 1)
}

// ---------------------------------------------------------------------------
// ArtifactMeta
// ---------------------------------------------------------------------------

/// Metadata for a single written artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactMeta {
    pub kind: ArtifactKind,
    pub filename: String,
    /// Where the artifact ended up (a path, or a `memory://` name).
    pub location: String,
    pub sha256: String,
    pub size_bytes: usize,
}

impl ArtifactMeta {
    fn new(kind: ArtifactKind, filename: &str, location: String, content: &str) -> Self {
        Self {
            kind,
            filename: filename.to_string(),
            location,
            sha256: sha256_hex(content),
            size_bytes: content.len(),
        }
    }
}

fn sha256_hex(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

// ---------------------------------------------------------------------------
// ExportSink
// ---------------------------------------------------------------------------

/// Destination for run artifacts. Writing the same filename twice replaces it.
pub trait ExportSink: Send {
    fn write(&mut self, kind: ArtifactKind, filename: &str, content: &str) -> Result<ArtifactMeta>;
}

/// Writes artifacts as files under one directory.
///
/// Each file is written to a hidden temp file first and then renamed into
/// place, so a reader never sees a partial artifact.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    root: PathBuf,
}

impl DirectorySink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ExportSink for DirectorySink {
    #[instrument(skip(self, content), fields(root = %self.root.display(), size = content.len()))]
    fn write(&mut self, kind: ArtifactKind, filename: &str, content: &str) -> Result<ArtifactMeta> {
        if filename.is_empty() || filename.contains(['/', '\\']) {
            return Err(TrainSetError::validation(format!(
                "artifact filename must be a plain file name: '{filename}'"
            )));
        }

        std::fs::create_dir_all(&self.root).map_err(|e| TrainSetError::io(&self.root, e))?;

        let target = self.root.join(filename);
        let temp = self.root.join(format!(".{filename}.tmp"));

        std::fs::write(&temp, content).map_err(|e| TrainSetError::io(&temp, e))?;
        std::fs::rename(&temp, &target).map_err(|e| TrainSetError::io(&target, e))?;

        debug!(kind = kind.as_str(), path = %target.display(), "wrote artifact");

        Ok(ArtifactMeta::new(
            kind,
            filename,
            target.display().to_string(),
            content,
        ))
    }
}

/// Keeps artifacts in memory, keyed by filename.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    files: BTreeMap<String, String>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, filename: &str) -> Option<&str> {
        self.files.get(filename).map(String::as_str)
    }

    /// Stored filenames in sorted order.
    pub fn filenames(&self) -> Vec<&str> {
        self.files.keys().map(String::as_str).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl ExportSink for MemorySink {
    fn write(&mut self, kind: ArtifactKind, filename: &str, content: &str) -> Result<ArtifactMeta> {
        self.files.insert(filename.to_string(), content.to_string());
        Ok(ArtifactMeta::new(
            kind,
            filename,
            format!("memory://{filename}"),
            content,
        ))
    }
}
