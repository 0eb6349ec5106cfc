//! Source URL discovery.
//!
//! TrainSet does not crawl. It asks a search-grounded language model for a
//! handful of direct, scrape-friendly links about the topic and parses them
//! out of the answer. Everything downstream consumes the returned list once,
//! in order.

mod parser;

use tracing::{debug, info, instrument, warn};

use trainset_llm::{CompletionRequest, LanguageModel};
use trainset_shared::{Result, Topic};

pub use parser::parse_url_list;

/// Default number of links requested.
const DEFAULT_URL_COUNT: usize = 3;

// ---------------------------------------------------------------------------
// Discovery options
// ---------------------------------------------------------------------------

/// Configuration for the discovery request.
#[derive(Debug, Clone)]
pub struct DiscoveryOptions {
    /// How many links to ask the model for.
    pub url_count: usize,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            url_count: DEFAULT_URL_COUNT,
        }
    }
}

// ---------------------------------------------------------------------------
// Prompt
// ---------------------------------------------------------------------------

/// Build the discovery prompt for `topic`, asking for exactly `url_count` links.
pub fn discovery_prompt(topic: &Topic, url_count: usize) -> String {
    format!(
        r#"I want to collect data for training a language model about the topic: "{topic}".

Return ONLY high-quality, direct links that are suitable for scraping.
Each link should:
- Be directly accessible (no redirects or shortened URLs).
- Contain rich technical data: documentation, code, or detailed tutorials.
- Be scrape-friendly (avoid heavily JavaScript-based or anti-scraping protected sites).

IMPORTANT:
- Do NOT include any descriptions, titles, or explanations.
- Output should ONLY be clean, full URLs.
- Each URL should be on a separate line.
- Return exactly {url_count} links.
"#
    )
}

// ---------------------------------------------------------------------------
// Main entry point
// ---------------------------------------------------------------------------

/// Ask the model for source URLs about `topic`.
///
/// Model failures propagate. An answer containing no usable URL yields an
/// empty list; the caller decides whether that ends the run.
#[instrument(skip_all, fields(topic = %topic, url_count = opts.url_count))]
pub async fn discover_urls(
    model: &dyn LanguageModel,
    topic: &Topic,
    opts: &DiscoveryOptions,
) -> Result<Vec<String>> {
    let request = CompletionRequest::new(discovery_prompt(topic, opts.url_count)).with_grounding();
    let completion = model.complete(&request).await?;
    debug!(answer_len = completion.text.len(), "discovery answer received");

    let urls = parse_url_list(&completion.text);

    if urls.is_empty() {
        warn!("model answer contained no usable URLs");
    } else {
        info!(count = urls.len(), "discovered source URLs");
    }
    if urls.len() != opts.url_count {
        debug!(
            requested = opts.url_count,
            returned = urls.len(),
            "model returned a different number of links than requested"
        );
    }

    Ok(urls)
}
