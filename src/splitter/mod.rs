// Chunk splitter module
// Breaks oversized documents into length-bounded chunks while preserving
// the many-to-one relationship back to the originating document. Every
// source document is tagged with a fresh parent identifier before
// splitting, and every chunk inherits that identifier plus its position.

#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::documents::{ContentDocument, META_CHUNK_INDEX, META_PARENT_ID, MetaValue};

/// Separators tried in priority order when splitting prose. The final
/// fallback (character boundary) is implicit.
const PROSE_SEPARATORS: [&str; 4] = ["\n\n", "\n", ". ", " "];

/// Configuration for document splitting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitterConfig {
    /// Maximum chunk length in characters.
    pub chunk_size: usize,
    /// Overlap in characters between consecutive prose chunks. Code
    /// chunks never overlap.
    pub chunk_overlap: usize,
}

impl Default for SplitterConfig {
    #[inline]
    fn default() -> Self {
        Self {
            chunk_size: 500,
            chunk_overlap: 50,
        }
    }
}

/// Split prose documents (explanation modality) by recursively trying
/// paragraph, line, sentence, and word boundaries, with overlap between
/// consecutive chunks for cross-chunk context continuity.
///
/// Each source document is mutated in place to carry its new parent
/// identifier, so the caller can persist the tagged originals as the
/// document store entries.
#[inline]
pub fn split_prose_documents(
    documents: &mut [ContentDocument],
    config: &SplitterConfig,
) -> Vec<ContentDocument> {
    let mut chunks = Vec::new();

    for doc in documents.iter_mut() {
        assign_parent_id(doc);

        if char_len(&doc.page_content) <= config.chunk_size {
            chunks.push(make_chunk(doc, doc.page_content.clone(), 0));
            continue;
        }

        let pieces = split_recursive(&doc.page_content, &PROSE_SEPARATORS, config.chunk_size);
        let merged = merge_pieces(pieces, config.chunk_size, config.chunk_overlap);
        chunks.extend(emit_chunks(doc, merged));
    }

    debug!(
        "Split {} prose documents into {} chunks",
        documents.len(),
        chunks.len()
    );
    chunks
}

/// Split code documents strictly on line boundaries, accumulating lines
/// until adding the next one would exceed the threshold. A single line
/// longer than the threshold is kept intact. No overlap: overlapping
/// partial lines would corrupt code semantics.
#[inline]
pub fn split_code_documents(
    documents: &mut [ContentDocument],
    config: &SplitterConfig,
) -> Vec<ContentDocument> {
    let mut chunks = Vec::new();

    for doc in documents.iter_mut() {
        assign_parent_id(doc);

        if char_len(&doc.page_content) <= config.chunk_size {
            chunks.push(make_chunk(doc, doc.page_content.clone(), 0));
            continue;
        }

        let pieces = split_lines(&doc.page_content, config.chunk_size);
        chunks.extend(emit_chunks(doc, pieces));
    }

    debug!(
        "Split {} code documents into {} chunks",
        documents.len(),
        chunks.len()
    );
    chunks
}

/// Generate a parent identifier and write it into the document's own
/// metadata. The identifier never changes once assigned and is inherited
/// unmodified by every chunk split from the document.
fn assign_parent_id(doc: &mut ContentDocument) {
    doc.metadata.insert(
        META_PARENT_ID.to_string(),
        MetaValue::from(Uuid::new_v4().to_string()),
    );
}

fn make_chunk(parent: &ContentDocument, text: String, index: usize) -> ContentDocument {
    let mut metadata = parent.metadata.clone();
    metadata.insert(META_CHUNK_INDEX.to_string(), MetaValue::from(index));
    ContentDocument::new(text, metadata)
}

fn emit_chunks(parent: &ContentDocument, pieces: Vec<String>) -> Vec<ContentDocument> {
    pieces
        .into_iter()
        .filter(|piece| !piece.trim().is_empty())
        .enumerate()
        .map(|(index, piece)| make_chunk(parent, piece, index))
        .collect()
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Recursively split text on the first separator present, descending to
/// finer-grained separators for any piece still over the threshold. When
/// no separator is left, falls back to character-boundary splitting.
fn split_recursive(text: &str, separators: &[&str], chunk_size: usize) -> Vec<String> {
    let Some(position) = separators.iter().position(|sep| text.contains(sep)) else {
        return split_chars(text, chunk_size);
    };

    let separator = separators[position];
    let mut pieces = Vec::new();

    // split_inclusive keeps the separator attached to the preceding
    // piece, so concatenating pieces reproduces the input exactly.
    for piece in text.split_inclusive(separator) {
        if char_len(piece) <= chunk_size {
            pieces.push(piece.to_string());
        } else {
            pieces.extend(split_recursive(
                piece,
                &separators[position + 1..],
                chunk_size,
            ));
        }
    }

    pieces
}

/// Character-boundary fallback for text with no usable separator.
fn split_chars(text: &str, chunk_size: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(chunk_size.max(1))
        .map(|window| window.iter().collect())
        .collect()
}

/// Merge fine-grained pieces back into chunks at or under the threshold,
/// carrying the last `overlap` characters' worth of pieces into the next
/// chunk.
fn merge_pieces(pieces: Vec<String>, chunk_size: usize, overlap: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut window: Vec<String> = Vec::new();
    let mut window_len = 0usize;

    for piece in pieces {
        let piece_len = char_len(&piece);

        if window_len + piece_len > chunk_size && !window.is_empty() {
            chunks.push(window.concat().trim().to_string());

            // Retain a tail of the window as overlap for the next chunk.
            while window_len > overlap
                || (window_len + piece_len > chunk_size && window_len > 0)
            {
                let front = window.remove(0);
                window_len -= char_len(&front);
            }
        }

        window_len += piece_len;
        window.push(piece);
    }

    if !window.is_empty() {
        chunks.push(window.concat().trim().to_string());
    }

    chunks.retain(|chunk| !chunk.is_empty());
    chunks
}

/// Accumulate whole lines into chunks, never splitting a single line.
fn split_lines(text: &str, chunk_size: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut buffer = String::new();
    let mut buffer_len = 0usize;

    for line in text.split_inclusive('\n') {
        let line_len = char_len(line);

        if buffer_len + line_len > chunk_size && !buffer.trim().is_empty() {
            chunks.push(buffer.trim_end().to_string());
            buffer.clear();
            buffer_len = 0;
        }

        buffer.push_str(line);
        buffer_len += line_len;
    }

    if !buffer.trim().is_empty() {
        chunks.push(buffer.trim_end().to_string());
    }

    chunks
}
