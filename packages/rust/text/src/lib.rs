//! HTML-to-plain-text extraction and line cleanup.
//!
//! Turns a fetched page into readable text: every text node in document
//! order, one per line, with script/style payloads left out. The result is
//! then run through [`normalize_lines`] so callers get trimmed, non-blank lines.

mod cleanup;

use scraper::{Html, Node};
use tracing::{debug, instrument};

pub use cleanup::normalize_lines;

/// Elements whose text content is never readable prose.
const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Extract the readable text of an HTML document, one text node per line.
///
/// Line structure is preserved as found in the text nodes; no trimming or
/// blank-line removal happens here (see [`normalize_lines`]).
#[instrument(skip_all, fields(html_len = html.len()))]
pub fn extract_text(html: &str) -> String {
    let doc = Html::parse_document(html);

    let mut parts: Vec<&str> = Vec::new();
    for node in doc.tree.root().descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };

        let skipped = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|el| SKIPPED_ELEMENTS.contains(&el.name()))
        });
        if skipped {
            continue;
        }

        parts.push(&**text);
    }

    let extracted = parts.join("\n");
    debug!(text_nodes = parts.len(), text_len = extracted.len(), "text extracted");
    extracted
}

/// Extract and clean in one step.
pub fn extract_clean_text(html: &str) -> String {
    normalize_lines(&extract_text(html))
}
