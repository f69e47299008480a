//! Paragraph-oriented chunking for scraped page content.
//!
//! Scraped markdown is split on blank lines and paragraphs are packed greedily into chunks
//! under a character budget derived from a token estimate (one token is approximated as four
//! bytes). Highlights:
//!
//! - The budget check compares the accumulated buffer plus the incoming paragraph, so the
//!   paragraph separators appended afterwards are not counted against the budget. Chunks may
//!   therefore exceed it by a few separator bytes; downstream prompts tolerate this slack.
//! - A single paragraph larger than the whole budget is passed through as one oversized chunk
//!   rather than being split mid-sentence.
//! - No empty chunks are ever produced, and empty input yields an empty vector.

use std::mem;

/// Token budget applied per chunk when no override is configured.
pub const DEFAULT_MAX_CHUNK_TOKENS: usize = 3000;

/// Rough bytes-per-token estimate used to convert the token budget into characters.
pub const APPROX_CHARS_PER_TOKEN: usize = 4;

/// Split text into paragraph-aligned chunks of roughly `max_tokens` tokens each.
///
/// Paragraphs keep their original order and each emitted chunk carries a trailing blank-line
/// separator after every paragraph, mirroring the layout of the source document. A zero
/// budget degrades to one paragraph per chunk.
pub fn split_text(text: &str, max_tokens: usize) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }

    let budget = max_tokens.saturating_mul(APPROX_CHARS_PER_TOKEN);
    let mut chunks = Vec::new();
    let mut current = String::new();

    for paragraph in text.split("\n\n") {
        if !current.is_empty() && current.len() + paragraph.len() > budget {
            chunks.push(mem::take(&mut current));
        }
        current.push_str(paragraph);
        current.push_str("\n\n");
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}
