// Explainer module
// Generates a keyword-rich WHAT/WHY/TAG explanation for each code cell
// through an Ollama chat model and parses the structured response. A
// response that cannot be parsed marks the cell with an explanation
// error so no explanation document is ever built from it.


use anyhow::Context;
use fancy_regex::Regex;
use tracing::{debug, warn};

use crate::embeddings::ollama::OllamaClient;
use crate::notebook::{Cell, CellType};
use crate::Result;

const SYSTEM_PROMPT: &str = "\
You are a precise static code analyzer preparing documentation for a semantic vector search engine.

Analyze the provided Python code cell and generate a detailed, keyword-rich explanation.

WHAT:
Describe the exact operation, algorithm, or technique implemented.
- Name the specific library, function, or class used.
- Mention key variables defined in this cell and their roles.
- State the real-world concept or dataset these variables represent, inferred from their names.

WHY:
Explain the technical purpose of this cell in context.
- Use actual variable names from the code.
- Explain why these steps are necessary for the overall pipeline and how they affect later computation.

TAG:
Choose exactly one:
[data_loading, preprocessing, feature_engineering, model_training, evaluation, visualization, utility, other]

FORMAT EXACTLY:
WHAT:
<multi-line text>

WHY:
<multi-line text>

TAG: <single_word>

STRICT RULES:
- Use only information visible in the provided code and variable lists.
- Do not invent variable names.
- If no executable code exists:
  WHAT: No code present in this cell
  WHY: No code present in this cell
  TAG: other";

/// Parsed fields of a well-formed explanation response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedExplanation {
    pub purpose: String,
    pub explanation: String,
    pub intent: String,
}

/// Generates explanations for code cells through an Ollama chat model.
pub struct Explainer {
    client: OllamaClient,
    model: String,
    what_re: Regex,
    why_re: Regex,
    tag_re: Regex,
}

impl Explainer {
    #[inline]
    pub fn new(client: OllamaClient, model: String) -> Result<Self> {
        Ok(Self {
            client,
            model,
            what_re: Regex::new(r"(?is)WHAT:\s*(.*?)(?=WHY:|$)")
                .context("Failed to compile WHAT pattern")?,
            why_re: Regex::new(r"(?is)WHY:\s*(.*?)(?=TAG:|$)")
                .context("Failed to compile WHY pattern")?,
            tag_re: Regex::new(r"(?i)TAG:\s*(\w+)").context("Failed to compile TAG pattern")?,
        })
    }

    /// Fill a cell's purpose, explanation, and intent fields in place.
    ///
    /// Narrative cells get a fixed summary without a model call. A model
    /// failure or an unparseable response sets `explanation_error` and
    /// degrades the cell to no explanation modality; it never aborts the
    /// pipeline.
    #[inline]
    pub fn explain_cell(&self, cell: &mut Cell) {
        if cell.cell_type != CellType::Code {
            cell.purpose = "Narrative or section heading".to_string();
            cell.explanation = truncate_chars(&cell.source, 200);
            cell.intent = "narrative".to_string();
            return;
        }

        let prompt = build_prompt(cell);

        let response = match self.client.generate(&self.model, SYSTEM_PROMPT, &prompt) {
            Ok(response) => response,
            Err(e) => {
                warn!("Explanation generation failed for cell {}: {}", cell.id, e);
                self.mark_failed(cell);
                return;
            }
        };

        match self.parse_response(&response) {
            Some(parsed) => {
                cell.purpose = parsed.purpose;
                cell.explanation = parsed.explanation;
                cell.intent = parsed.intent;
                cell.explanation_error = false;
                debug!("Explained cell {} with intent '{}'", cell.id, cell.intent);
            }
            None => {
                warn!("Unparseable explanation response for cell {}", cell.id);
                self.mark_failed(cell);
            }
        }
    }

    /// Extract the WHAT/WHY/TAG fields, or `None` when any is missing.
    #[inline]
    pub fn parse_response(&self, content: &str) -> Option<ParsedExplanation> {
        let content = content.trim();

        let purpose = first_capture(&self.what_re, content)?;
        let explanation = first_capture(&self.why_re, content)?;
        let intent = first_capture(&self.tag_re, content)?.to_lowercase();

        if purpose.is_empty() || explanation.is_empty() {
            return None;
        }

        Some(ParsedExplanation {
            purpose,
            explanation,
            intent,
        })
    }

    fn mark_failed(&self, cell: &mut Cell) {
        cell.purpose = "Unclear code block".to_string();
        cell.explanation = String::new();
        cell.intent = "other".to_string();
        cell.explanation_error = true;
    }
}

fn build_prompt(cell: &Cell) -> String {
    format!(
        "Code:\n```python\n{}\n```\n\nVariables used: {}\nVariables defined: {}\nCalled symbols: {}",
        cell.source,
        cell.used.join(", "),
        cell.defined.join(", "),
        cell.called_symbols.join(", ")
    )
}

fn first_capture(re: &Regex, content: &str) -> Option<String> {
    re.captures(content)
        .ok()
        .flatten()
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
}

fn truncate_chars(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let truncated: String = text.chars().take(limit).collect();
    format!("{truncated}...")
}
