//! Parser for the model's URL-list answer.
//!
//! The model is asked for bare URLs, one per line, but routinely decorates
//! them anyway:
//! - List markers: `- `, `* `, `1. `, `2) `
//! - Markdown links: `[Docs](https://example.com/docs)`
//! - Angle brackets: `<https://example.com>`
//!
//! Anything that is not an absolute http(s) URL after this cleanup is dropped.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

// ---------------------------------------------------------------------------
// Regex patterns (compiled once)
// ---------------------------------------------------------------------------

/// Matches a leading bullet or ordered-list marker.
static LIST_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[-*+•]|\d+[.)])\s+").expect("list marker regex"));

/// Matches a whole-line Markdown link `[text](url)`.
static MD_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[[^\]]*\]\(([^)\s]+)\)$").expect("markdown link regex"));

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

/// Extract usable http(s) URLs from free-form model output, in order.
///
/// Surviving URLs are returned exactly as written (after decoration is
/// removed); they are validated with [`Url::parse`] but not normalized.
pub fn parse_url_list(text: &str) -> Vec<String> {
    text.lines().filter_map(clean_line).collect()
}

fn clean_line(line: &str) -> Option<String> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let line = LIST_MARKER_RE.replace(line, "");
    let line = line.trim();

    let candidate = match MD_LINK_RE.captures(line) {
        Some(caps) => caps.get(1).map_or("", |m| m.as_str()),
        None => line,
    };

    let candidate = candidate
        .trim_start_matches('<')
        .trim_end_matches('>')
        .trim();

    if is_http_url(candidate) {
        Some(candidate.to_string())
    } else {
        None
    }
}

fn is_http_url(candidate: &str) -> bool {
    Url::parse(candidate)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some())
        .unwrap_or(false)
}
