// Document store module
// Persistent mapping from parent identifier to the full, unsplit document.
// Chunks exist only to be embedded and matched; retrieval always resolves
// back through this store to recover complete context.


use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use tracing::{debug, info};

use crate::documents::ContentDocument;
use crate::{RagError, Result};

/// In-memory document store with JSON persistence, keyed by parent
/// identifier. Last write wins; no versioning.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentStore {
    entries: BTreeMap<String, ContentDocument>,
}

impl DocumentStore {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from parent-tagged documents. Every document must
    /// already carry the parent identifier the splitter assigned;
    /// anything else is a pipeline bug and fails loudly.
    #[inline]
    pub fn from_documents<'a, I>(documents: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a ContentDocument>,
    {
        let mut store = Self::new();
        for doc in documents {
            let parent_id = doc.parent_id().ok_or_else(|| {
                RagError::Storage("document is missing a parent identifier".to_string())
            })?;
            store.put(parent_id.to_string(), doc.clone());
        }
        Ok(store)
    }

    /// Insert or overwrite the entry for a parent identifier.
    #[inline]
    pub fn put(&mut self, parent_id: String, document: ContentDocument) {
        self.entries.insert(parent_id, document);
    }

    /// Look up the full document for a parent identifier.
    #[inline]
    pub fn get(&self, parent_id: &str) -> Option<&ContentDocument> {
        self.entries.get(parent_id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&String, &ContentDocument)> {
        self.entries.iter()
    }

    /// Serialize the store to a JSON file, creating parent directories as
    /// needed.
    #[inline]
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create store directory: {}", parent.display())
            })?;
        }

        let json = serde_json::to_string_pretty(&self.entries)
            .context("Failed to serialize document store")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write document store: {}", path.display()))?;

        info!("Saved document store with {} entries to {}", self.len(), path.display());
        Ok(())
    }

    /// Load a store from a JSON file. A missing file is an error: the
    /// retriever cannot function without its reconstruction source of
    /// truth.
    #[inline]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(RagError::Storage(format!(
                "document store not found at {}",
                path.display()
            )));
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read document store: {}", path.display()))?;
        let entries: BTreeMap<String, ContentDocument> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse document store: {}", path.display()))?;

        debug!("Loaded document store with {} entries from {}", entries.len(), path.display());
        Ok(Self { entries })
    }
}

/// Persist a document list (chunk collections, modality document lists)
/// as a JSON array of `{page_content, metadata}` entries.
#[inline]
pub fn save_documents<P: AsRef<Path>>(documents: &[ContentDocument], path: P) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let json =
        serde_json::to_string_pretty(documents).context("Failed to serialize documents")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write documents: {}", path.display()))?;

    debug!("Saved {} documents to {}", documents.len(), path.display());
    Ok(())
}

/// Load a document list saved by [`save_documents`].
#[inline]
pub fn load_documents<P: AsRef<Path>>(path: P) -> Result<Vec<ContentDocument>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read documents: {}", path.display()))?;
    let documents: Vec<ContentDocument> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse documents: {}", path.display()))?;

    debug!("Loaded {} documents from {}", documents.len(), path.display());
    Ok(documents)
}
