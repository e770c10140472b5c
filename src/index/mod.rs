// Vector index module
// Embedding-backed nearest-neighbor search over chunks. The index owns
// chunk embeddings plus enough metadata to map a hit back to its parent
// identifier; it never owns canonical document content.

#[cfg(test)]
mod tests;

use tracing::debug;

use crate::documents::ContentDocument;
use crate::embeddings::EmbeddingProvider;
use crate::{RagError, Result};

/// A ranked hit from nearest-neighbor search. Lower distance means a
/// closer match.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredHit {
    pub document: ContentDocument,
    pub distance: f32,
}

/// Black-box nearest-neighbor index over chunk documents.
pub trait VectorIndex {
    /// Embed and add chunk documents to the index.
    fn add(&mut self, documents: &[ContentDocument]) -> Result<()>;

    /// Return up to `k` hits ranked by similarity, closest first. An
    /// empty index yields an empty result, not an error; a failure to
    /// embed the query propagates.
    fn search(&self, query: &str, k: usize) -> Result<Vec<ScoredHit>>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Brute-force in-memory index using cosine distance. Built once, in
/// full, before the retriever is constructed; read-only afterwards.
pub struct EmbeddingIndex {
    embedder: Box<dyn EmbeddingProvider>,
    entries: Vec<(Vec<f32>, ContentDocument)>,
}

impl EmbeddingIndex {
    #[inline]
    pub fn new(embedder: Box<dyn EmbeddingProvider>) -> Self {
        Self {
            embedder,
            entries: Vec::new(),
        }
    }
}

impl VectorIndex for EmbeddingIndex {
    #[inline]
    fn add(&mut self, documents: &[ContentDocument]) -> Result<()> {
        if documents.is_empty() {
            return Ok(());
        }

        let texts: Vec<String> = documents
            .iter()
            .map(|doc| doc.page_content.clone())
            .collect();
        let embeddings = self.embedder.embed_batch(&texts)?;

        if embeddings.len() != documents.len() {
            return Err(RagError::Embedding(format!(
                "embedded {} texts but received {} vectors",
                documents.len(),
                embeddings.len()
            )));
        }

        for (embedding, doc) in embeddings.into_iter().zip(documents.iter()) {
            self.entries.push((embedding, doc.clone()));
        }

        debug!("Index now holds {} chunk embeddings", self.entries.len());
        Ok(())
    }

    #[inline]
    fn search(&self, query: &str, k: usize) -> Result<Vec<ScoredHit>> {
        if self.entries.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let query_vector = self.embedder.embed(query)?;

        let mut hits: Vec<ScoredHit> = self
            .entries
            .iter()
            .filter_map(|(vector, doc)| {
                cosine_distance(&query_vector, vector).map(|distance| ScoredHit {
                    document: doc.clone(),
                    distance,
                })
            })
            .collect();

        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits.truncate(k);

        debug!("Search returned {} hits for k={}", hits.len(), k);
        Ok(hits)
    }

    #[inline]
    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Cosine distance between two vectors, or `None` when the vectors are
/// incomparable (mismatched dimensions or zero magnitude).
fn cosine_distance(a: &[f32], b: &[f32]) -> Option<f32> {
    if a.len() != b.len() || a.is_empty() {
        return None;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += f64::from(*x) * f64::from(*y);
        norm_a += f64::from(*x) * f64::from(*x);
        norm_b += f64::from(*y) * f64::from(*y);
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return None;
    }

    let similarity = dot / (norm_a.sqrt() * norm_b.sqrt());
    Some((1.0 - similarity) as f32)
}
