//! Chunk annotation: turn raw text chunks into training pairs.
//!
//! Each chunk is sent to the language model with a fixed annotator prompt.
//! The answer should be a JSON array of `{"input", "output"}` objects; code
//! fences are stripped before parsing. A chunk whose answer cannot be used is
//! recorded as an [`AnnotationFailure`] and skipped, never aborting the run.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};
use tracing::{debug, info, instrument, warn};

use trainset_llm::{CompletionRequest, LanguageModel};
use trainset_shared::{Dataset, TrainingPair};

/// Matches a code fence with an optional attached language tag (```json).
static CODE_FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```[A-Za-z0-9_+-]*").expect("code fence regex"));

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

/// Why a chunk produced no pairs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnnotationFailureKind {
    /// The model answered, but not with a JSON array of objects.
    #[error("malformed response: {message}")]
    Malformed { raw: String, message: String },

    /// The model call itself failed.
    #[error("model call failed: {message}")]
    Model { message: String },
}

/// A skipped chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationFailure {
    /// 0-based position of the chunk.
    pub chunk_index: usize,
    pub kind: AnnotationFailureKind,
}

impl AnnotationFailure {
    /// The cleaned model output, when there was one.
    pub fn raw_output(&self) -> Option<&str> {
        match &self.kind {
            AnnotationFailureKind::Malformed { raw, .. } => Some(raw),
            AnnotationFailureKind::Model { .. } => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Outcome of annotating every chunk.
#[derive(Debug, Clone, Default)]
pub struct AnnotationResults {
    /// Pairs per chunk, one entry per input chunk (empty for failed chunks).
    pub per_chunk: Vec<Vec<TrainingPair>>,
    pub failures: Vec<AnnotationFailure>,
    pub total_tokens_in: u64,
    pub total_tokens_out: u64,
}

impl AnnotationResults {
    pub fn pair_count(&self) -> usize {
        self.per_chunk.iter().map(Vec::len).sum()
    }

    /// Flatten into a dataset: chunk order, then response order.
    pub fn into_dataset(self) -> Dataset {
        let mut dataset = Dataset::new();
        for pairs in self.per_chunk {
            dataset.extend_chunk(pairs);
        }
        dataset
    }
}

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

/// Progress callback for annotation.
pub trait AnnotationProgress: Send + Sync {
    /// Called before chunk `index` (0-based) of `total` is sent.
    fn chunk_started(&self, index: usize, total: usize);

    /// Diagnostic event: called exactly once per skipped chunk.
    fn chunk_failed(&self, failure: &AnnotationFailure);
}

/// No-op progress for headless/test usage.
pub struct SilentAnnotationProgress;

impl AnnotationProgress for SilentAnnotationProgress {
    fn chunk_started(&self, _index: usize, _total: usize) {}
    fn chunk_failed(&self, _failure: &AnnotationFailure) {}
}

// ---------------------------------------------------------------------------
// Prompt and response handling
// ---------------------------------------------------------------------------

/// Build the annotator prompt for one chunk.
pub fn annotation_prompt(chunk: &str) -> String {
    format!(
        r#"You are an expert data annotator preparing training data for a language model.
Convert the following raw scraped text into a JSON array of high-quality supervised examples.
Each example should be a JSON object with two keys: "input" and "output".
- "input": a question or prompt about the data,
- "output": the correct answer or explanation.

IMPORTANT: Return ONLY a valid JSON array. No extra text or explanation.

Raw scraped text:
"""
{chunk}
"""
"#
    )
}

/// Remove every code-fence marker (and its attached language tag), then trim.
pub fn strip_code_fences(raw: &str) -> String {
    CODE_FENCE_RE.replace_all(raw, "").trim().to_string()
}

/// Parse a cleaned model answer into pairs.
///
/// The answer must be a JSON array whose elements are all objects. Missing or
/// `null` fields become empty strings, strings are taken verbatim, and any
/// other value is kept as compact JSON text.
pub fn parse_pairs(cleaned: &str) -> std::result::Result<Vec<TrainingPair>, String> {
    let value: Value = serde_json::from_str(cleaned).map_err(|e| e.to_string())?;

    let Value::Array(items) = value else {
        return Err(format!("expected a JSON array, got {}", json_kind(&value)));
    };

    items
        .iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::Object(obj) => Ok(TrainingPair::new(
                field_text(obj, "input"),
                field_text(obj, "output"),
            )),
            other => Err(format!(
                "element {i} is {}, expected an object",
                json_kind(other)
            )),
        })
        .collect()
}

fn field_text(obj: &Map<String, Value>, key: &str) -> String {
    match obj.get(key) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ---------------------------------------------------------------------------
// Main entry point
// ---------------------------------------------------------------------------

/// Annotate every chunk in order, one model call each, no retries.
#[instrument(skip_all, fields(model = model.name(), chunks = chunks.len()))]
pub async fn annotate(
    model: &dyn LanguageModel,
    chunks: &[&str],
    progress: &dyn AnnotationProgress,
) -> AnnotationResults {
    let total = chunks.len();
    let mut results = AnnotationResults {
        per_chunk: Vec::with_capacity(total),
        ..AnnotationResults::default()
    };

    for (index, chunk) in chunks.iter().enumerate() {
        progress.chunk_started(index, total);

        let request = CompletionRequest::new(annotation_prompt(chunk));
        let outcome = match model.complete(&request).await {
            Ok(completion) => {
                results.total_tokens_in += completion.tokens_in;
                results.total_tokens_out += completion.tokens_out;

                let cleaned = strip_code_fences(&completion.text);
                parse_pairs(&cleaned).map_err(|message| AnnotationFailureKind::Malformed {
                    raw: cleaned,
                    message,
                })
            }
            Err(e) => Err(AnnotationFailureKind::Model {
                message: e.to_string(),
            }),
        };

        match outcome {
            Ok(pairs) => {
                debug!(chunk = index + 1, pairs = pairs.len(), "chunk annotated");
                results.per_chunk.push(pairs);
            }
            Err(kind) => {
                let failure = AnnotationFailure {
                    chunk_index: index,
                    kind,
                };
                warn!(chunk = index + 1, error = %failure.kind, "chunk skipped");
                progress.chunk_failed(&failure);
                results.failures.push(failure);
                results.per_chunk.push(Vec::new());
            }
        }
    }

    info!(
        pairs = results.pair_count(),
        failed_chunks = results.failures.len(),
        tokens_in = results.total_tokens_in,
        tokens_out = results.total_tokens_out,
        "annotation complete"
    );

    results
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use trainset_llm::Completion;
    use trainset_shared::{Result, TrainSetError};

    use super::*;

    /// Pops one scripted answer per call.
    struct ScriptedModel {
        answers: Mutex<VecDeque<std::result::Result<&'static str, &'static str>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedModel {
        fn new(answers: Vec<std::result::Result<&'static str, &'static str>>) -> Self {
            Self {
                answers: Mutex::new(answers.into()),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LanguageModel for ScriptedModel {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn complete(&self, request: &CompletionRequest) -> Result<Completion> {
            self.prompts.lock().unwrap().push(request.prompt.clone());
            match self.answers.lock().unwrap().pop_front() {
                Some(Ok(text)) => Ok(Completion {
                    text: text.to_string(),
                    tokens_in: 10,
                    tokens_out: 5,
                    ..Completion::default()
                }),
                Some(Err(msg)) => Err(TrainSetError::Model(msg.to_string())),
                None => Err(TrainSetError::Model("script exhausted".into())),
            }
        }
    }

    #[derive(Default)]
    struct RecordingProgress {
        started: Mutex<Vec<(usize, usize)>>,
        failed: Mutex<Vec<AnnotationFailure>>,
    }

    impl AnnotationProgress for RecordingProgress {
        fn chunk_started(&self, index: usize, total: usize) {
            self.started.lock().unwrap().push((index, total));
        }

        fn chunk_failed(&self, failure: &AnnotationFailure) {
            self.failed.lock().unwrap().push(failure.clone());
        }
    }

    #[test]
    fn prompt_embeds_chunk() {
        let prompt = annotation_prompt("Ownership moves values.");
        assert!(prompt.contains("\"\"\"\nOwnership moves values.\n\"\"\""));
        assert!(prompt.contains("\"input\" and \"output\""));
        assert!(prompt.contains("Return ONLY a valid JSON array"));
    }

    #[test]
    fn strips_fences_with_language_tags() {
        assert_eq!(strip_code_fences("```json\n[]\n```"), "[]");
        assert_eq!(strip_code_fences("  ```JSON\n[1]```  "), "[1]");
        assert_eq!(strip_code_fences("[]"), "[]");
    }

    #[test]
    fn parses_pairs_in_order() {
        let pairs = parse_pairs(r#"[{"input":"Q1","output":"A1"},{"input":"Q2","output":"A2"}]"#)
            .unwrap();
        assert_eq!(pairs, vec![TrainingPair::new("Q1", "A1"), TrainingPair::new("Q2", "A2")]);
    }

    #[test]
    fn missing_null_and_non_string_fields() {
        let pairs = parse_pairs(
            r#"[{"input":"Q"},{"input":null,"output":42},{"input":["a",1],"output":{"k":true},"extra":"x"}]"#,
        )
        .unwrap();
        assert_eq!(pairs[0], TrainingPair::new("Q", ""));
        assert_eq!(pairs[1], TrainingPair::new("", "42"));
        assert_eq!(pairs[2], TrainingPair::new(r#"["a",1]"#, r#"{"k":true}"#));
    }

    #[test]
    fn empty_array_is_zero_pairs() {
        assert!(parse_pairs("[]").unwrap().is_empty());
    }

    #[test]
    fn rejects_non_array_and_non_object_elements() {
        let err = parse_pairs(r#"{"input":"Q","output":"A"}"#).unwrap_err();
        assert!(err.contains("expected a JSON array"));

        let err = parse_pairs(r#"[{"input":"Q"}, "loose"]"#).unwrap_err();
        assert!(err.contains("element 1"));

        assert!(parse_pairs("Here are your examples!").is_err());
    }

    #[tokio::test]
    async fn malformed_chunk_is_skipped_with_one_diagnostic() {
        let model = ScriptedModel::new(vec![
            Ok("```json\n[{\"input\":\"Q1\",\"output\":\"A1\"}]\n```"),
            Ok("Sure! Here is a summary of the text."),
        ]);
        let progress = RecordingProgress::default();

        let results = annotate(&model, &["chunk one", "chunk two"], &progress).await;

        let failed = progress.failed.lock().unwrap();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].chunk_index, 1);
        assert_eq!(failed[0].raw_output(), Some("Sure! Here is a summary of the text."));
        assert_eq!(*progress.started.lock().unwrap(), vec![(0, 2), (1, 2)]);

        assert_eq!(results.failures.len(), 1);
        assert_eq!(results.per_chunk.len(), 2);
        assert_eq!(results.total_tokens_in, 20);
        assert_eq!(results.total_tokens_out, 10);

        let dataset = results.into_dataset();
        assert_eq!(dataset.pairs(), [TrainingPair::new("Q1", "A1")]);
    }

    #[tokio::test]
    async fn model_error_is_a_skipped_chunk() {
        let model = ScriptedModel::new(vec![
            Err("HTTP 503"),
            Ok(r#"[{"input":"Q2","output":"A2"}]"#),
        ]);
        let progress = RecordingProgress::default();

        let results = annotate(&model, &["a", "b"], &progress).await;

        assert_eq!(results.failures.len(), 1);
        assert_eq!(results.failures[0].chunk_index, 0);
        assert!(matches!(
            results.failures[0].kind,
            AnnotationFailureKind::Model { .. }
        ));
        assert!(results.failures[0].raw_output().is_none());
        assert_eq!(results.into_dataset().pairs(), [TrainingPair::new("Q2", "A2")]);
    }

    #[tokio::test]
    async fn one_call_per_chunk_in_order() {
        let model = ScriptedModel::new(vec![Ok("[]"), Ok("[]"), Ok("[]")]);
        let results = annotate(&model, &["first", "second", "third"], &SilentAnnotationProgress).await;

        let prompts = model.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 3);
        assert!(prompts[0].contains("first"));
        assert!(prompts[2].contains("third"));
        assert!(results.failures.is_empty());
        assert_eq!(results.pair_count(), 0);
    }

    #[tokio::test]
    async fn no_chunks_no_calls() {
        let model = ScriptedModel::new(vec![]);
        let results = annotate(&model, &[], &SilentAnnotationProgress).await;
        assert!(model.prompts.lock().unwrap().is_empty());
        assert!(results.into_dataset().is_empty());
    }
}
