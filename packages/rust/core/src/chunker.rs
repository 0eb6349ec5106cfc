//! Split merged text into model-sized chunks.
//!
//! Boundaries prefer a line break, then the start of a sentence end
//! (`". "`), then fall back to a hard cut at `max_chars`. Chunks are trimmed
//! borrowed slices of the input; segments that trim to nothing are dropped.

use tracing::debug;

use trainset_shared::{Result, TrainSetError};

/// Split `text` into chunks of at most `max_chars` characters.
///
/// `max_chars` counts `char`s, not bytes. Fails only when `max_chars` is zero.
pub fn chunk_text(text: &str, max_chars: usize) -> Result<Vec<&str>> {
    if max_chars == 0 {
        return Err(TrainSetError::invalid_config(
            "max_chunk_chars must be a positive integer",
        ));
    }

    let mut chunks = Vec::new();
    let mut offset = 0;

    while offset < text.len() {
        let rest = &text[offset..];
        let end = match rest.char_indices().nth(max_chars) {
            // More than max_chars remain: look for a softer boundary.
            Some((hard, _)) => offset + soft_boundary(&rest[..hard]).unwrap_or(hard),
            None => text.len(),
        };

        let segment = text[offset..end].trim();
        if !segment.is_empty() {
            chunks.push(segment);
        }
        offset = end;
    }

    debug!(chunks = chunks.len(), text_len = text.len(), max_chars, "text chunked");
    Ok(chunks)
}

/// Relative byte position of the preferred cut inside `window`, if any.
///
/// The last newline wins; only without one is the last `". "` used, cutting
/// in front of it. A position at the very start of the window would make no
/// progress and is rejected.
fn soft_boundary(window: &str) -> Option<usize> {
    let pos = match window.rfind('\n') {
        Some(newline) => newline,
        None => window.rfind(". ")?,
    };
    (pos > 0).then_some(pos)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strip_ws(s: &str) -> String {
        s.chars().filter(|c| !c.is_whitespace()).collect()
    }

    #[test]
    fn hard_boundaries_without_separators() {
        assert_eq!(chunk_text("abcdefghij", 4).unwrap(), ["abcd", "efgh", "ij"]);
    }

    #[test]
    fn short_text_is_one_chunk() {
        assert_eq!(chunk_text("hello world", 3000).unwrap(), ["hello world"]);
        assert_eq!(chunk_text("abcd", 4).unwrap(), ["abcd"]);
    }

    #[test]
    fn empty_and_blank_input() {
        assert!(chunk_text("", 10).unwrap().is_empty());
        assert!(chunk_text("   \n\n  ", 3).unwrap().is_empty());
    }

    #[test]
    fn zero_max_is_invalid_configuration() {
        let err = chunk_text("abc", 0).unwrap_err();
        assert!(matches!(err, TrainSetError::InvalidConfiguration { .. }));
    }

    #[test]
    fn prefers_last_newline_in_window() {
        let text = "aa\nbb\ncc dd ee";
        // window "aa\nbb\ncc " -> cut at second newline
        assert_eq!(chunk_text(text, 9).unwrap(), ["aa\nbb", "cc dd ee"]);
    }

    #[test]
    fn newline_beats_sentence_end() {
        let text = "one\ntwo. three four";
        // Second window starts on the newline, so no soft cut is taken there.
        assert_eq!(chunk_text(text, 12).unwrap(), ["one", "two. three", "four"]);
    }

    #[test]
    fn falls_back_to_sentence_end() {
        let text = "First one. Second one. Third";
        let chunks = chunk_text(text, 15).unwrap();
        assert_eq!(chunks, ["First one", ". Second one", ". Third"]);
    }

    #[test]
    fn sentence_end_at_window_start_forces_hard_cut() {
        // Second window begins with ". ", which would be an empty cut.
        let text = "abcd. efghij";
        assert_eq!(chunk_text(text, 4).unwrap(), ["abcd", ". ef", "ghij"]);
    }

    #[test]
    fn separator_at_window_start_forces_hard_cut() {
        // The only newline sits exactly at the chunk start.
        let text = "abcd\nefghijklmn";
        assert_eq!(chunk_text(text, 4).unwrap(), ["abcd", "efg", "hijk", "lmn"]);
    }

    #[test]
    fn counts_chars_not_bytes() {
        let text = "ééééé";
        let chunks = chunk_text(text, 2).unwrap();
        assert_eq!(chunks, ["éé", "éé", "é"]);
    }

    #[test]
    fn totality_and_bounds() {
        let text = "--- Content from: http://a.example ---\n\
                    Rust has ownership. Borrowing is checked at compile time.\n\
                    A long line without any sentence breaks whatsoever that keeps going on\n\
                    short\n\n\
                    --- Content from: http://c.example ---\n\
                    Lifetimes. Traits. Generics. Closures and iterators.";

        for max in [1, 2, 7, 16, 40, 100, 10_000] {
            let chunks = chunk_text(text, max).unwrap();
            let joined: String = chunks.concat();
            assert_eq!(strip_ws(&joined), strip_ws(text), "max = {max}");
            for chunk in &chunks {
                assert!(chunk.chars().count() <= max, "chunk {chunk:?} exceeds {max}");
                assert!(!chunk.is_empty());
                assert_eq!(chunk.trim(), *chunk);
            }
        }
    }

    #[test]
    fn deterministic() {
        let text = "alpha beta. gamma\ndelta epsilon. zeta eta theta\niota";
        assert_eq!(chunk_text(text, 11).unwrap(), chunk_text(text, 11).unwrap());
    }
}
