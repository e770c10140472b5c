// Document builder module
// Converts enriched notebook cells into per-modality content documents
// carrying flat, scalar-only metadata.


use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::notebook::{Cell, CellType};
use crate::{RagError, Result};

pub const META_CELL_ID: &str = "cell_id";
pub const META_CELL_INDEX: &str = "cell_index";
pub const META_SECTION: &str = "section";
pub const META_INTENT: &str = "intent";
pub const META_HAS_ERROR: &str = "has_error";
pub const META_DEPENDENCY_SCORE: &str = "dependency_score";
pub const META_MODALITY: &str = "modality";
pub const META_PARENT_ID: &str = "parent_id";
pub const META_CHUNK_INDEX: &str = "chunk_index";

/// A flat scalar metadata value. Nested structures are rejected at the
/// builder boundary so that everything downstream (the document store,
/// the vector index) can rely on scalar-only metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetaValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl MetaValue {
    /// Coerce a JSON value into a flat scalar. Arrays and objects are a
    /// contract violation and fail loudly rather than being dropped.
    #[inline]
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        match value {
            serde_json::Value::Null => Ok(Self::Null),
            serde_json::Value::Bool(b) => Ok(Self::Bool(*b)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Self::Int(i))
                } else if let Some(f) = n.as_f64() {
                    Ok(Self::Float(f))
                } else {
                    Err(RagError::Metadata(format!(
                        "unrepresentable numeric metadata value: {n}"
                    )))
                }
            }
            serde_json::Value::String(s) => Ok(Self::Str(s.clone())),
            serde_json::Value::Array(_) | serde_json::Value::Object(_) => Err(RagError::Metadata(
                format!("non-scalar metadata value: {value}"),
            )),
        }
    }

    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    #[inline]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Render the scalar as a string key. Cell identifiers may be stored
    /// as integers or strings depending on the notebook source; keys must
    /// compare equal either way.
    #[inline]
    pub fn as_key(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Bool(b) => b.to_string(),
            Self::Int(i) => i.to_string(),
            Self::Float(f) => f.to_string(),
            Self::Str(s) => s.clone(),
        }
    }
}

impl From<&str> for MetaValue {
    #[inline]
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for MetaValue {
    #[inline]
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for MetaValue {
    #[inline]
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<usize> for MetaValue {
    #[inline]
    fn from(value: usize) -> Self {
        Self::Int(value as i64)
    }
}

impl From<bool> for MetaValue {
    #[inline]
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Option<String>> for MetaValue {
    #[inline]
    fn from(value: Option<String>) -> Self {
        value.map_or(Self::Null, Self::Str)
    }
}

pub type Metadata = BTreeMap<String, MetaValue>;

/// The content type a document was derived from. Written into metadata at
/// build time; retrieval reassembly relies on this tag and never on
/// content sniffing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modality {
    Code,
    Explanation,
}

impl Modality {
    #[inline]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Code => "code",
            Self::Explanation => "explanation",
        }
    }

    #[inline]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "code" => Some(Self::Code),
            "explanation" => Some(Self::Explanation),
            _ => None,
        }
    }
}

/// A single modality's renderable text derived from one cell.
///
/// Serializes to the `{page_content, metadata}` shape used by every
/// persisted artifact (document store entries and chunk collections).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentDocument {
    pub page_content: String,
    pub metadata: Metadata,
}

impl ContentDocument {
    #[inline]
    pub fn new(page_content: String, metadata: Metadata) -> Self {
        Self {
            page_content,
            metadata,
        }
    }

    /// The parent identifier, if the splitter has assigned one.
    #[inline]
    pub fn parent_id(&self) -> Option<&str> {
        self.metadata.get(META_PARENT_ID).and_then(MetaValue::as_str)
    }

    /// The identifier of the owning cell, rendered as a string key.
    #[inline]
    pub fn cell_id(&self) -> Option<String> {
        self.metadata.get(META_CELL_ID).map(MetaValue::as_key)
    }

    /// The modality tag written by the document builder.
    #[inline]
    pub fn modality(&self) -> Option<Modality> {
        self.metadata
            .get(META_MODALITY)
            .and_then(MetaValue::as_str)
            .and_then(Modality::parse)
    }
}

fn base_metadata(cell: &Cell, modality: Modality) -> Metadata {
    let mut metadata = Metadata::new();
    metadata.insert(META_CELL_ID.to_string(), MetaValue::from(cell.id));
    metadata.insert(META_CELL_INDEX.to_string(), MetaValue::from(cell.index));
    metadata.insert(META_SECTION.to_string(), MetaValue::from(cell.section.clone()));
    metadata.insert(META_INTENT.to_string(), MetaValue::from(cell.intent.clone()));
    metadata.insert(META_HAS_ERROR.to_string(), MetaValue::from(cell.has_error));
    metadata.insert(
        META_MODALITY.to_string(),
        MetaValue::from(modality.as_str()),
    );
    metadata
}

/// Build the code-modality document for a cell, or `None` when the cell is
/// not code or its source is empty after trimming.
#[inline]
pub fn build_code_document(cell: &Cell) -> Option<ContentDocument> {
    if cell.cell_type != CellType::Code {
        return None;
    }

    let code = cell.source.trim();
    if code.is_empty() {
        return None;
    }

    let mut metadata = base_metadata(cell, Modality::Code);
    metadata.insert(
        META_DEPENDENCY_SCORE.to_string(),
        MetaValue::from(cell.dependency_score),
    );

    Some(ContentDocument::new(code.to_string(), metadata))
}

/// Build the explanation-modality document for a cell.
///
/// A failed upstream explanation suppresses the document entirely; an
/// error placeholder must never be embedded.
#[inline]
pub fn build_explanation_document(cell: &Cell) -> Option<ContentDocument> {
    if cell.cell_type != CellType::Code || cell.explanation_error {
        return None;
    }

    let purpose = cell.purpose.trim();
    let explanation = cell.explanation.trim();
    if purpose.is_empty() && explanation.is_empty() {
        return None;
    }

    let text = format!("WHAT:\n{purpose}\n\nWHY:\n{explanation}")
        .trim()
        .to_string();

    Some(ContentDocument::new(
        text,
        base_metadata(cell, Modality::Explanation),
    ))
}

/// Build both modality document lists for a notebook's cells.
///
/// Pure transformation: cells contribute a code document when they hold
/// non-empty code and an explanation document when explanation generation
/// succeeded; a cell may contribute neither, one, or both.
#[inline]
pub fn build_documents(cells: &[Cell]) -> (Vec<ContentDocument>, Vec<ContentDocument>) {
    let mut code_docs = Vec::new();
    let mut explanation_docs = Vec::new();

    for cell in cells {
        if cell.cell_type != CellType::Code {
            continue;
        }

        if let Some(doc) = build_code_document(cell) {
            code_docs.push(doc);
        }

        if let Some(doc) = build_explanation_document(cell) {
            explanation_docs.push(doc);
        }
    }

    debug!(
        "Built {} code documents and {} explanation documents from {} cells",
        code_docs.len(),
        explanation_docs.len(),
        cells.len()
    );

    (code_docs, explanation_docs)
}
