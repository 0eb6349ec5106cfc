//! Core domain types for TrainSet runs.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, TrainSetError};

// ---------------------------------------------------------------------------
// RunId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper identifying one pipeline run (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Generate a new time-sortable run identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Topic
// ---------------------------------------------------------------------------

/// The user's topic of interest. Never empty, surrounding whitespace removed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Topic(String);

impl Topic {
    /// Validate and wrap a topic string.
    pub fn new(raw: impl AsRef<str>) -> Result<Self> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TrainSetError::invalid_config("topic must not be empty"));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Stem used for export filenames.
    ///
    /// Spaces, path separators, characters reserved on common filesystems
    /// and control characters all become underscores, so any topic yields a
    /// plain file name.
    pub fn file_stem(&self) -> String {
        self.0
            .chars()
            .map(|c| match c {
                ' ' | '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
                c if c.is_control() => '_',
                c => c,
            })
            .collect()
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Scraped content
// ---------------------------------------------------------------------------

/// Cleaned text from one successfully fetched source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScrapedExtract {
    /// The source URL, verbatim as discovered.
    pub source: String,
    /// Normalized text (trimmed lines, no blank lines). May be empty.
    pub text: String,
}

/// All extracts concatenated in discovery order, each behind a source separator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergedDocument {
    text: String,
    sources: Vec<String>,
}

impl MergedDocument {
    /// Build the document from extracts, preserving their order.
    pub fn from_extracts(extracts: &[ScrapedExtract]) -> Self {
        let mut merged = String::new();
        for extract in extracts {
            merged.push_str(&format!(
                "\n--- Content from: {} ---\n{}\n",
                extract.source, extract.text
            ));
        }

        Self {
            text: merged.trim().to_string(),
            sources: extracts.iter().map(|e| e.source.clone()).collect(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Sources that contributed a block, in document order.
    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }
}

// ---------------------------------------------------------------------------
// TrainingPair / Dataset
// ---------------------------------------------------------------------------

/// One supervised example: a prompt/question and its answer/explanation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingPair {
    pub input: String,
    pub output: String,
}

impl TrainingPair {
    pub fn new(input: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
        }
    }

    /// Export form: line breaks become single spaces, ends trimmed.
    pub fn normalized(&self) -> Self {
        Self {
            input: normalize_field(&self.input),
            output: normalize_field(&self.output),
        }
    }
}

/// Replace each CRLF, CR, or LF with one space, then trim.
pub fn normalize_field(value: &str) -> String {
    value
        .replace("\r\n", " ")
        .replace(['\r', '\n'], " ")
        .trim()
        .to_string()
}

/// Ordered collection of training pairs: chunk order, then response order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dataset {
    pairs: Vec<TrainingPair>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one chunk's pairs after everything already collected.
    pub fn extend_chunk(&mut self, pairs: impl IntoIterator<Item = TrainingPair>) {
        self.pairs.extend(pairs);
    }

    pub fn pairs(&self) -> &[TrainingPair] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// The first `n` pairs (fewer if the dataset is smaller).
    pub fn preview(&self, n: usize) -> &[TrainingPair] {
        &self.pairs[..n.min(self.pairs.len())]
    }
}

impl From<Vec<TrainingPair>> for Dataset {
    fn from(pairs: Vec<TrainingPair>) -> Self {
        Self { pairs }
    }
}

impl FromIterator<TrainingPair> for Dataset {
    fn from_iter<I: IntoIterator<Item = TrainingPair>>(iter: I) -> Self {
        Self {
            pairs: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topic_rejects_blank() {
        assert!(Topic::new("").is_err());
        assert!(Topic::new("   \t").is_err());
        let err = Topic::new(" ").unwrap_err();
        assert!(matches!(err, TrainSetError::InvalidConfiguration { .. }));
    }

    #[test]
    fn topic_file_stem_replaces_spaces() {
        let topic = Topic::new("  rust async runtimes ").unwrap();
        assert_eq!(topic.as_str(), "rust async runtimes");
        assert_eq!(topic.file_stem(), "rust_async_runtimes");
    }

    #[test]
    fn topic_file_stem_is_a_plain_name() {
        assert_eq!(Topic::new("TCP/IP").unwrap().file_stem(), "TCP_IP");
        assert_eq!(Topic::new("C:\\tmp\\x").unwrap().file_stem(), "C__tmp_x");
        assert_eq!(Topic::new("a\tb?").unwrap().file_stem(), "a_b_");
        assert_eq!(Topic::new("café über").unwrap().file_stem(), "café_über");
    }

    #[test]
    fn merged_document_orders_blocks() {
        let extracts = vec![
            ScrapedExtract {
                source: "http://a.example".into(),
                text: "alpha\nbeta".into(),
            },
            ScrapedExtract {
                source: "http://c.example".into(),
                text: "gamma".into(),
            },
        ];
        let doc = MergedDocument::from_extracts(&extracts);

        assert_eq!(
            doc.as_str(),
            "--- Content from: http://a.example ---\nalpha\nbeta\n\n\
             --- Content from: http://c.example ---\ngamma"
        );
        assert_eq!(doc.sources(), ["http://a.example", "http://c.example"]);
    }

    #[test]
    fn merged_document_empty_when_no_extracts() {
        let doc = MergedDocument::from_extracts(&[]);
        assert!(doc.is_empty());
        assert!(doc.sources().is_empty());
    }

    #[test]
    fn normalize_field_flattens_line_breaks() {
        assert_eq!(normalize_field("  a\nb\r\nc\rd  "), "a b c d");
        assert_eq!(normalize_field("\n\n"), "");
    }

    #[test]
    fn dataset_preview_is_bounded() {
        let dataset: Dataset = (0..5)
            .map(|i| TrainingPair::new(format!("q{i}"), format!("a{i}")))
            .collect();
        assert_eq!(dataset.preview(3).len(), 3);
        assert_eq!(dataset.preview(10).len(), 5);
        assert_eq!(dataset.preview(3)[0].input, "q0");
        assert!(Dataset::new().preview(3).is_empty());
    }

    #[test]
    fn dataset_extend_keeps_chunk_order() {
        let mut dataset = Dataset::new();
        dataset.extend_chunk(vec![TrainingPair::new("1", "a"), TrainingPair::new("2", "b")]);
        dataset.extend_chunk(vec![TrainingPair::new("3", "c")]);
        let inputs: Vec<&str> = dataset.pairs().iter().map(|p| p.input.as_str()).collect();
        assert_eq!(inputs, ["1", "2", "3"]);
    }

    #[test]
    fn dataset_serializes_as_array() {
        let dataset = Dataset::from(vec![TrainingPair::new("Q1", "A1")]);
        let json = serde_json::to_string(&dataset).unwrap();
        assert_eq!(json, r#"[{"input":"Q1","output":"A1"}]"#);
    }
}
