//! Language-model access for TrainSet.
//!
//! The pipeline only ever talks to a [`LanguageModel`]: one prompt in, one
//! text completion out. [`GeminiClient`] is the production implementation
//! over the Generative Language REST API; tests substitute scripted models.

mod gemini;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use trainset_shared::Result;

pub use gemini::GeminiClient;

// ---------------------------------------------------------------------------
// Request / response
// ---------------------------------------------------------------------------

/// A single-turn prompt for the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    pub prompt: String,
    /// Allow the model to consult live web search while answering.
    pub grounded: bool,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            grounded: false,
        }
    }

    /// Enable search grounding for this request.
    pub fn with_grounding(mut self) -> Self {
        self.grounded = true;
        self
    }
}

/// The model's text answer plus usage accounting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Completion {
    pub text: String,
    pub tokens_in: u64,
    pub tokens_out: u64,
    pub model: String,
    pub latency_ms: u64,
}

impl Completion {
    /// A completion carrying only text, with zeroed usage.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// LanguageModel trait
// ---------------------------------------------------------------------------

/// Anything that can turn a prompt into text.
///
/// Errors are `TrainSetError::Model` for transport, API status, and empty
/// responses. Callers decide whether a failure ends the run.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Model identifier, for logs and reports.
    fn name(&self) -> &str;

    async fn complete(&self, request: &CompletionRequest) -> Result<Completion>;
}
