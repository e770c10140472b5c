// Notebook module
// Loads an .ipynb file (plain JSON) into a flat, ordered list of cell
// records and attaches section labels from markdown headings.


use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellType {
    Code,
    Markdown,
    Raw,
}

/// One unit of notebook content, enriched in place by the analysis and
/// explanation stages. Immutable once the index pipeline has run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub id: i64,
    pub cell_type: CellType,
    pub index: usize,
    pub exec_order: Option<i64>,
    pub source: String,
    #[serde(default)]
    pub outputs: Vec<serde_json::Value>,
    #[serde(default)]
    pub metadata: serde_json::Value,
    #[serde(default)]
    pub section: Option<String>,
    #[serde(default = "default_intent")]
    pub intent: String,
    #[serde(default)]
    pub has_error: bool,
    #[serde(default)]
    pub used: Vec<String>,
    #[serde(default)]
    pub defined: Vec<String>,
    #[serde(default)]
    pub called_symbols: Vec<String>,
    #[serde(default)]
    pub dependency_score: usize,
    #[serde(default)]
    pub purpose: String,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub explanation_error: bool,
}

fn default_intent() -> String {
    "other".to_string()
}

/// Notebook cell source can be a single string or a list of lines.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawSource {
    Joined(String),
    Lines(Vec<String>),
}

impl RawSource {
    fn join(self) -> String {
        match self {
            Self::Joined(s) => s,
            Self::Lines(lines) => lines.concat(),
        }
    }
}

impl Default for RawSource {
    fn default() -> Self {
        Self::Joined(String::new())
    }
}

#[derive(Debug, Deserialize)]
struct RawCell {
    cell_type: String,
    #[serde(default)]
    source: RawSource,
    #[serde(default)]
    outputs: Vec<serde_json::Value>,
    #[serde(default)]
    metadata: serde_json::Value,
    #[serde(default)]
    execution_count: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct RawNotebook {
    #[serde(default)]
    cells: Vec<RawCell>,
}

/// Parse a notebook file into ordered cell records.
#[inline]
pub fn parse_notebook<P: AsRef<Path>>(path: P) -> Result<Vec<Cell>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read notebook file: {}", path.display()))?;

    let cells = parse_notebook_json(&content)?;
    info!("Parsed {} cells from {}", cells.len(), path.display());
    Ok(cells)
}

/// Parse notebook JSON into ordered cell records.
#[inline]
pub fn parse_notebook_json(content: &str) -> Result<Vec<Cell>> {
    let raw: RawNotebook =
        serde_json::from_str(content).context("Failed to parse notebook JSON")?;

    let mut cells = Vec::with_capacity(raw.cells.len());
    for (index, raw_cell) in raw.cells.into_iter().enumerate() {
        let cell_type = match raw_cell.cell_type.as_str() {
            "code" => CellType::Code,
            "markdown" => CellType::Markdown,
            other => {
                debug!("Treating cell {} of type '{}' as raw", index, other);
                CellType::Raw
            }
        };

        let has_error = raw_cell
            .outputs
            .iter()
            .any(|output| output.get("output_type").and_then(|t| t.as_str()) == Some("error"));

        let exec_order = raw_cell.execution_count.or(Some(index as i64));

        cells.push(Cell {
            id: index as i64,
            cell_type,
            index,
            exec_order,
            source: raw_cell.source.join().trim().to_string(),
            outputs: raw_cell.outputs,
            metadata: raw_cell.metadata,
            section: None,
            intent: default_intent(),
            has_error,
            used: Vec::new(),
            defined: Vec::new(),
            called_symbols: Vec::new(),
            dependency_score: 0,
            purpose: String::new(),
            explanation: String::new(),
            explanation_error: false,
        });
    }

    Ok(cells)
}

/// Attach section labels to cells. A markdown cell whose first line is a
/// heading sets the current section for itself and every following cell
/// until the next heading.
#[inline]
pub fn assign_sections(cells: &mut [Cell]) {
    let mut current: Option<String> = None;

    for cell in cells.iter_mut() {
        if cell.cell_type == CellType::Markdown {
            if let Some(first_line) = cell.source.lines().next() {
                let first_line = first_line.trim();
                if first_line.starts_with('#') {
                    current = Some(first_line.trim_start_matches('#').trim().to_string());
                }
            }
        }
        cell.section = current.clone();
    }
}
