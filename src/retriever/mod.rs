// Relational retriever module
// Maps chunk hits back to their parent documents, then to their owning
// cells, and reassembles de-duplicated multi-modality context bundles.


use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::documents::Modality;
use crate::index::{ScoredHit, VectorIndex};
use crate::store::DocumentStore;
use crate::Result;

/// A modality-tagged vector index handled by the retriever.
pub struct ModalityIndex {
    pub modality: Modality,
    pub index: Box<dyn VectorIndex>,
}

/// The reassembled, multi-modality context for one cell. A modality with
/// no recoverable text is an empty string, never a partial placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellBundle {
    pub cell_id: String,
    pub code: String,
    pub explanation: String,
}

/// Retrieval layer that joins partial chunk matches back to full cell
/// context through the document store.
///
/// The store and the derived cell index are built fully in memory at
/// construction and treated as read-only for the retriever's lifetime;
/// updating the underlying documents requires constructing a new
/// retriever.
pub struct RelationalRetriever {
    store: DocumentStore,
    indices: Vec<ModalityIndex>,
    cell_index: HashMap<String, Vec<String>>,
}

impl RelationalRetriever {
    /// Construct a retriever over an already-loaded document store.
    #[inline]
    pub fn new(store: DocumentStore, indices: Vec<ModalityIndex>) -> Self {
        let cell_index = build_cell_index(&store);
        info!(
            "Retriever ready: {} store entries, {} unique cells, {} indices",
            store.len(),
            cell_index.len(),
            indices.len()
        );

        Self {
            store,
            indices,
            cell_index,
        }
    }

    /// Construct a retriever by loading the document store from disk.
    /// A missing store file is fatal: the retriever cannot serve any
    /// query without its reconstruction source of truth.
    #[inline]
    pub fn load<P: AsRef<Path>>(store_path: P, indices: Vec<ModalityIndex>) -> Result<Self> {
        let store = DocumentStore::load(store_path)?;
        Ok(Self::new(store, indices))
    }

    /// Retrieve up to `k` cell-context bundles for a query.
    ///
    /// Hits are resolved chunk -> parent -> cell in ranked order. A hit
    /// without a parent identifier, or whose parent is missing from the
    /// store, is skipped as a soft inconsistency. Each cell appears at
    /// most once, with the full content of every modality the store
    /// holds for it.
    #[inline]
    pub fn retrieve(&self, query: &str, k: usize) -> Result<Vec<CellBundle>> {
        debug!("Retrieving context for query (k={})", k);

        let mut hits: Vec<ScoredHit> = Vec::new();
        for modality_index in &self.indices {
            hits.extend(modality_index.index.search(query, k)?);
        }
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));

        debug!("Collected {} chunk hits across modalities", hits.len());

        let mut bundles = Vec::new();
        let mut seen_cells: HashSet<String> = HashSet::new();

        for hit in &hits {
            if bundles.len() == k {
                break;
            }

            let Some(parent_id) = hit.document.parent_id() else {
                warn!("Skipping chunk hit with no parent identifier");
                continue;
            };

            let Some(anchor) = self.store.get(parent_id) else {
                warn!(
                    "Skipping hit: parent {} is not in the document store",
                    parent_id
                );
                continue;
            };

            let Some(cell_id) = anchor.cell_id() else {
                warn!(
                    "Skipping hit: parent {} has no cell identifier",
                    parent_id
                );
                continue;
            };

            if !seen_cells.insert(cell_id.clone()) {
                continue;
            }

            bundles.push(self.assemble_bundle(cell_id));
        }

        debug!("Assembled {} bundles", bundles.len());
        Ok(bundles)
    }

    /// Gather every modality's full content for a cell from the document
    /// store, concatenating multiple documents of the same modality.
    fn assemble_bundle(&self, cell_id: String) -> CellBundle {
        let mut code_parts: Vec<&str> = Vec::new();
        let mut explanation_parts: Vec<&str> = Vec::new();

        let parent_ids = self
            .cell_index
            .get(&cell_id)
            .map(Vec::as_slice)
            .unwrap_or_default();

        for parent_id in parent_ids {
            let Some(doc) = self.store.get(parent_id) else {
                warn!("Cell index references missing parent {}", parent_id);
                continue;
            };

            match doc.modality() {
                Some(Modality::Code) => code_parts.push(&doc.page_content),
                Some(Modality::Explanation) => explanation_parts.push(&doc.page_content),
                None => {
                    warn!("Parent {} has no modality tag, skipping", parent_id);
                }
            }
        }

        CellBundle {
            cell_id,
            code: code_parts.join("\n"),
            explanation: explanation_parts.join("\n"),
        }
    }

    #[inline]
    pub fn cell_count(&self) -> usize {
        self.cell_index.len()
    }
}

/// Derived mapping from cell identifier to every parent identifier that
/// originated from that cell, across all modalities. Built once by
/// scanning the whole store; read-only during query serving.
fn build_cell_index(store: &DocumentStore) -> HashMap<String, Vec<String>> {
    let mut cell_index: HashMap<String, Vec<String>> = HashMap::new();

    for (parent_id, doc) in store.iter() {
        let Some(cell_id) = doc.cell_id() else {
            warn!("Store entry {} has no cell identifier", parent_id);
            continue;
        };

        cell_index
            .entry(cell_id)
            .or_default()
            .push(parent_id.clone());
    }

    cell_index
}

/// Render bundles into a flat text block grouped by cell identifier,
/// ready for prompt injection.
#[inline]
pub fn format_for_llm(bundles: &[CellBundle]) -> String {
    let mut context = String::new();

    for bundle in bundles {
        let _ = writeln!(context, "--- CONTEXT FOR CELL {} ---", bundle.cell_id);
        if !bundle.code.trim().is_empty() {
            let _ = writeln!(context, "[CODE IMPLEMENTATION]:\n{}", bundle.code);
        }
        if !bundle.explanation.trim().is_empty() {
            let _ = writeln!(context, "[EXPLANATION]:\n{}", bundle.explanation);
        }
        context.push_str("------------------------------------------\n\n");
    }

    context
}
