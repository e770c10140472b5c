// Embeddings module
// Defines the embedding seam and the Ollama-backed implementation.

pub mod ollama;

use crate::Result;

/// Produces fixed-length vectors for arbitrary text. Implementations are
/// constructed from configuration and injected into the components that
/// need them; there are no ambient clients.
pub trait EmbeddingProvider {
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|text| self.embed(text)).collect()
    }
}
