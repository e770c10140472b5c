use super::*;
use crate::documents::{META_CELL_ID, Metadata};
use std::collections::HashSet;

fn doc(content: &str) -> ContentDocument {
    let mut metadata = Metadata::new();
    metadata.insert(META_CELL_ID.to_string(), MetaValue::from(0i64));
    ContentDocument::new(content.to_string(), metadata)
}

fn config(chunk_size: usize, chunk_overlap: usize) -> SplitterConfig {
    SplitterConfig {
        chunk_size,
        chunk_overlap,
    }
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[test]
fn short_document_becomes_a_single_chunk() {
    let mut docs = vec![doc("short explanation")];
    let chunks = split_prose_documents(&mut docs, &config(500, 50));

    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].page_content, "short explanation");
    assert_eq!(
        chunks[0].metadata.get(META_CHUNK_INDEX),
        Some(&MetaValue::Int(0))
    );
}

#[test]
fn every_document_gets_a_parent_id_even_when_unsplit() {
    let mut docs = vec![doc("a"), doc("b")];
    let chunks = split_prose_documents(&mut docs, &config(500, 50));

    for source in &docs {
        assert!(source.parent_id().is_some());
    }
    for chunk in &chunks {
        assert!(chunk.parent_id().is_some());
    }
}

#[test]
fn parent_ids_are_unique_per_document() {
    let mut docs = vec![doc("first"), doc("second"), doc("third")];
    split_prose_documents(&mut docs, &config(500, 50));

    let ids: HashSet<&str> = docs.iter().filter_map(ContentDocument::parent_id).collect();
    assert_eq!(ids.len(), 3);
}

#[test]
fn chunks_inherit_the_parent_id_unmodified() {
    let paragraphs = vec!["word ".repeat(30); 5].join("\n\n");
    let mut docs = vec![doc(&paragraphs)];
    let chunks = split_prose_documents(&mut docs, &config(100, 20));

    assert!(chunks.len() > 1);
    let parent_id = docs[0].parent_id().expect("source should be tagged").to_string();
    for chunk in &chunks {
        assert_eq!(chunk.parent_id(), Some(parent_id.as_str()));
        assert_eq!(chunk.cell_id().as_deref(), Some("0"));
    }
}

#[test]
fn chunk_indices_increase_from_zero() {
    let paragraphs = vec!["word ".repeat(30); 5].join("\n\n");
    let mut docs = vec![doc(&paragraphs)];
    let chunks = split_prose_documents(&mut docs, &config(100, 20));

    for (i, chunk) in chunks.iter().enumerate() {
        assert_eq!(
            chunk.metadata.get(META_CHUNK_INDEX),
            Some(&MetaValue::Int(i as i64))
        );
    }
}

#[test]
fn prose_chunks_respect_the_size_bound() {
    let text = "Sentence one is here. ".repeat(60);
    let mut docs = vec![doc(&text)];
    let chunks = split_prose_documents(&mut docs, &config(120, 30));

    assert!(chunks.len() > 1);
    for chunk in &chunks {
        assert!(chunk.page_content.chars().count() <= 120);
    }
}

#[test]
fn prose_split_preserves_content_modulo_overlap_and_whitespace() {
    let text = "The quick brown fox jumps over the lazy dog. ".repeat(20);
    let mut docs = vec![doc(&text)];
    let chunks = split_prose_documents(&mut docs, &config(120, 0));

    // With zero overlap the concatenated chunks reproduce the text up to
    // whitespace trimming at chunk edges.
    let rejoined = chunks
        .iter()
        .map(|c| c.page_content.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    assert_eq!(normalize_whitespace(&rejoined), normalize_whitespace(&text));
}

#[test]
fn consecutive_prose_chunks_share_overlap() {
    let text = "alpha bravo charlie delta echo foxtrot golf hotel ".repeat(10);
    let mut docs = vec![doc(&text)];
    let chunks = split_prose_documents(&mut docs, &config(100, 40));

    assert!(chunks.len() > 1);
    for pair in chunks.windows(2) {
        let prev_tail: String = pair[0]
            .page_content
            .chars()
            .rev()
            .take(10)
            .collect::<String>()
            .chars()
            .rev()
            .collect();
        // The next chunk starts inside the previous chunk's tail region.
        assert!(
            pair[1].page_content.contains(prev_tail.trim()),
            "chunk {:?} should overlap with tail {:?}",
            pair[1].page_content,
            prev_tail
        );
    }
}

#[test]
fn text_without_separators_falls_back_to_character_boundaries() {
    let text = "x".repeat(250);
    let mut docs = vec![doc(&text)];
    let chunks = split_prose_documents(&mut docs, &config(100, 0));

    assert_eq!(chunks.len(), 3);
    assert!(chunks.iter().all(|c| c.page_content.chars().count() <= 100));
    let rejoined: String = chunks.iter().map(|c| c.page_content.as_str()).collect();
    assert_eq!(rejoined, text);
}

#[test]
fn code_splits_only_on_line_boundaries() {
    let lines: Vec<String> = (0..40).map(|i| format!("value_{i} = compute({i})")).collect();
    let text = lines.join("\n");
    let mut docs = vec![doc(&text)];
    let chunks = split_code_documents(&mut docs, &config(120, 50));

    assert!(chunks.len() > 1);
    let original_lines: HashSet<&str> = text.lines().collect();
    for chunk in &chunks {
        for line in chunk.page_content.lines() {
            assert!(
                original_lines.contains(line),
                "line {line:?} was split mid-way"
            );
        }
    }
}

#[test]
fn code_chunks_never_overlap() {
    let lines: Vec<String> = (0..40).map(|i| format!("value_{i} = compute({i})")).collect();
    let text = lines.join("\n");
    let mut docs = vec![doc(&text)];
    let chunks = split_code_documents(&mut docs, &config(120, 50));

    let mut seen: HashSet<&str> = HashSet::new();
    for chunk in &chunks {
        for line in chunk.page_content.lines() {
            assert!(seen.insert(line), "line {line:?} appears in two chunks");
        }
    }
}

#[test]
fn oversized_single_code_line_is_kept_intact() {
    let long_line = format!("result = transform({})", "x, ".repeat(80));
    let text = format!("import numpy as np\n{long_line}\ny = result");
    let mut docs = vec![doc(&text)];
    let chunks = split_code_documents(&mut docs, &config(100, 0));

    assert!(chunks.iter().any(|c| c.page_content.contains(&long_line)));
}

#[test]
fn short_code_document_is_not_split() {
    let mut docs = vec![doc("import pandas as pd")];
    let chunks = split_code_documents(&mut docs, &config(500, 50));

    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].page_content, "import pandas as pd");
}

#[test]
fn whitespace_only_pieces_are_dropped() {
    let text = format!("{}\n\n   \n\n{}", "a".repeat(120), "b".repeat(120));
    let mut docs = vec![doc(&text)];
    let chunks = split_prose_documents(&mut docs, &config(100, 0));

    for chunk in &chunks {
        assert!(!chunk.page_content.trim().is_empty());
    }
}
