//! Line-level cleanup passes for extracted page text.
//!
//! Each pass is a function `&str -> String` applied in sequence.

/// Run the full cleanup pipeline: trim every line, drop blank lines.
pub fn normalize_lines(text: &str) -> String {
    let mut result = trim_lines(text);
    result = drop_blank_lines(&result);
    result
}

// ---------------------------------------------------------------------------
// Pass 1: Trim each line
// ---------------------------------------------------------------------------

fn trim_lines(text: &str) -> String {
    text.lines().map(str::trim).collect::<Vec<_>>().join("\n")
}

// ---------------------------------------------------------------------------
// Pass 2: Drop blank lines
// ---------------------------------------------------------------------------

fn drop_blank_lines(text: &str) -> String {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
