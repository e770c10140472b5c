use super::*;
use crate::documents::{META_PARENT_ID, MetaValue, Metadata};

/// Deterministic embedder for tests: maps known phrases to fixed unit
/// vectors so distances are predictable.
struct FixedEmbedder;

impl EmbeddingProvider for FixedEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if text.contains("pandas") {
            Ok(vec![1.0, 0.0, 0.0])
        } else if text.contains("model") {
            Ok(vec![0.0, 1.0, 0.0])
        } else {
            Ok(vec![0.0, 0.0, 1.0])
        }
    }
}

/// Embedder that always fails, for error propagation tests.
struct FailingEmbedder;

impl EmbeddingProvider for FailingEmbedder {
    fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(RagError::Embedding("backend unavailable".to_string()))
    }
}

fn doc(parent_id: &str, content: &str) -> ContentDocument {
    let mut metadata = Metadata::new();
    metadata.insert(META_PARENT_ID.to_string(), MetaValue::from(parent_id));
    ContentDocument::new(content.to_string(), metadata)
}

#[test]
fn empty_index_returns_no_hits() {
    let index = EmbeddingIndex::new(Box::new(FixedEmbedder));
    let hits = index.search("anything", 5).expect("search should succeed");

    assert!(hits.is_empty());
    assert!(index.is_empty());
}

#[test]
fn zero_k_returns_no_hits() {
    let mut index = EmbeddingIndex::new(Box::new(FixedEmbedder));
    index
        .add(&[doc("p1", "import pandas as pd")])
        .expect("add should succeed");

    let hits = index.search("pandas", 0).expect("search should succeed");
    assert!(hits.is_empty());
}

#[test]
fn closest_match_ranks_first() {
    let mut index = EmbeddingIndex::new(Box::new(FixedEmbedder));
    index
        .add(&[
            doc("p1", "import pandas as pd"),
            doc("p2", "model.fit(X, y)"),
            doc("p3", "plt.show()"),
        ])
        .expect("add should succeed");

    let hits = index.search("pandas dataframe", 3).expect("search should succeed");

    assert_eq!(hits.len(), 3);
    assert_eq!(hits[0].document.parent_id(), Some("p1"));
    assert!(hits[0].distance < hits[1].distance);
    assert!((hits[0].distance).abs() < 1e-6); // identical direction
}

#[test]
fn k_caps_the_hit_count() {
    let mut index = EmbeddingIndex::new(Box::new(FixedEmbedder));
    index
        .add(&[
            doc("p1", "import pandas as pd"),
            doc("p2", "model.fit(X, y)"),
            doc("p3", "plt.show()"),
        ])
        .expect("add should succeed");

    let hits = index.search("model training", 2).expect("search should succeed");
    assert_eq!(hits.len(), 2);
    assert_eq!(index.len(), 3);
}

#[test]
fn embed_failure_propagates_from_add() {
    let mut index = EmbeddingIndex::new(Box::new(FailingEmbedder));
    let result = index.add(&[doc("p1", "x = 1")]);

    assert!(matches!(result, Err(RagError::Embedding(_))));
}

#[test]
fn embed_failure_propagates_from_search() {
    // An empty index short-circuits, so seed one entry to force the
    // query embedding.
    let mut failing = EmbeddingIndex::new(Box::new(FailingEmbedder));
    failing.entries.push((vec![1.0, 0.0], doc("p1", "x")));

    assert!(matches!(
        failing.search("query", 1),
        Err(RagError::Embedding(_))
    ));
}

#[test]
fn adding_no_documents_is_a_no_op() {
    let mut index = EmbeddingIndex::new(Box::new(FailingEmbedder));
    index.add(&[]).expect("empty add should not touch the embedder");
    assert_eq!(index.len(), 0);
}

#[test]
fn cosine_distance_basics() {
    let d = cosine_distance(&[1.0, 0.0], &[1.0, 0.0]).expect("comparable vectors");
    assert!(d.abs() < 1e-6);

    let d = cosine_distance(&[1.0, 0.0], &[0.0, 1.0]).expect("comparable vectors");
    assert!((d - 1.0).abs() < 1e-6);

    let d = cosine_distance(&[1.0, 0.0], &[-1.0, 0.0]).expect("comparable vectors");
    assert!((d - 2.0).abs() < 1e-6);
}

#[test]
fn cosine_distance_rejects_incomparable_vectors() {
    assert_eq!(cosine_distance(&[1.0, 0.0], &[1.0]), None);
    assert_eq!(cosine_distance(&[], &[]), None);
    assert_eq!(cosine_distance(&[0.0, 0.0], &[1.0, 1.0]), None);
}
