//! Fixed-size character chunking with overlap.

use tracing::debug;

/// Default chunk length in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 800;

/// Default overlap between consecutive chunks in characters.
pub const DEFAULT_CHUNK_OVERLAP: usize = 120;

/// One chunk and its character span in the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkWindow {
    pub index: usize,

    /// Start offset in characters (inclusive)
    pub start: usize,

    /// End offset in characters (exclusive)
    pub end: usize,
    pub text: String,
}

/// Split `text` into windows of at most `chunk_size` characters, each
/// starting `chunk_overlap` characters before the previous one ended.
///
/// The final window always ends at the end of the text. When the overlap is
/// not smaller than the chunk size the next window starts where the previous
/// one ended, so the walk always advances.
pub fn chunk_windows(text: &str, chunk_size: usize, chunk_overlap: usize) -> Vec<ChunkWindow> {
    if text.is_empty() || chunk_size == 0 {
        return Vec::new();
    }

    // Byte offset of every char, plus the end of the string.
    let offsets: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let len = offsets.len() - 1;

    let mut windows = Vec::new();
    let mut start = 0;
    loop {
        let end = (start + chunk_size).min(len);
        windows.push(ChunkWindow {
            index: windows.len(),
            start,
            end,
            text: text[offsets[start]..offsets[end]].to_string(),
        });

        if end == len {
            break;
        }

        let next = end.saturating_sub(chunk_overlap);
        start = if next > start { next } else { end };
    }

    debug!(
        "Chunked {} chars into {} chunks (size: {}, overlap: {})",
        len,
        windows.len(),
        chunk_size,
        chunk_overlap
    );

    windows
}

/// Chunk text into overlapping segments.
pub fn chunk_text(text: &str, chunk_size: usize, chunk_overlap: usize) -> Vec<String> {
    chunk_windows(text, chunk_size, chunk_overlap)
        .into_iter()
        .map(|w| w.text)
        .collect()
}
