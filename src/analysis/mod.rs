// Static analysis module
// Best-effort extraction of per-cell code signals: defined names, used
// external names, called symbols, and a dependency score. Heuristic and
// regex-based; it does not need to be a full parser to produce useful
// retrieval metadata.


use std::collections::BTreeSet;

use anyhow::Context;
use fancy_regex::Regex;
use tracing::debug;

use crate::notebook::{Cell, CellType};
use crate::Result;

const PYTHON_KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global",
    "if", "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return",
    "try", "while", "with", "yield",
];

const PYTHON_BUILTINS: &[&str] = &[
    "abs", "all", "any", "bool", "bytes", "callable", "chr", "dict", "dir", "enumerate",
    "filter", "float", "format", "frozenset", "getattr", "hasattr", "hash", "help", "hex",
    "id", "input", "int", "isinstance", "issubclass", "iter", "len", "list", "map", "max",
    "min", "next", "object", "open", "ord", "pow", "print", "range", "repr", "reversed",
    "round", "set", "setattr", "slice", "sorted", "str", "sum", "super", "tuple", "type",
    "vars", "zip",
];

/// Regex-based extractor for code cell signals. Compile once, use for
/// every cell.
pub struct CodeAnalyzer {
    assign_re: Regex,
    def_re: Regex,
    class_re: Regex,
    import_re: Regex,
    from_import_re: Regex,
    call_re: Regex,
    ident_re: Regex,
}

impl CodeAnalyzer {
    #[inline]
    pub fn new() -> Result<Self> {
        Ok(Self {
            assign_re: compile(r"(?m)^\s*([A-Za-z_]\w*)\s*(?::[^=\n]+)?=(?!=)")?,
            def_re: compile(r"(?m)^\s*def\s+([A-Za-z_]\w*)")?,
            class_re: compile(r"(?m)^\s*class\s+([A-Za-z_]\w*)")?,
            import_re: compile(r"(?m)^\s*import\s+(.+)$")?,
            from_import_re: compile(r"(?m)^\s*from\s+[\w.]+\s+import\s+(.+)$")?,
            call_re: compile(r"([A-Za-z_][\w.]*)\s*\(")?,
            ident_re: compile(r"(?<![\w.])[A-Za-z_]\w*")?,
        })
    }

    /// Populate a code cell's static signals in place. Non-code cells
    /// are left untouched.
    #[inline]
    pub fn analyze(&self, cell: &mut Cell) -> Result<()> {
        if cell.cell_type != CellType::Code {
            return Ok(());
        }

        let code = strip_comments_and_strings(&cell.source);

        let defined = self.defined_names(&code)?;
        let called = self.called_symbols(&code)?;
        let used = self.used_names(&code, &defined)?;

        cell.dependency_score = used.len() + called.len();
        cell.defined = defined.into_iter().collect();
        cell.used = used.into_iter().collect();
        cell.called_symbols = called.into_iter().collect();

        debug!(
            "Cell {}: {} defined, {} used, {} called",
            cell.id,
            cell.defined.len(),
            cell.used.len(),
            cell.called_symbols.len()
        );

        Ok(())
    }

    fn defined_names(&self, code: &str) -> Result<BTreeSet<String>> {
        let mut defined = BTreeSet::new();

        for re in [&self.assign_re, &self.def_re, &self.class_re] {
            for capture in re.captures_iter(code) {
                let capture = capture.context("Failed to match definition pattern")?;
                if let Some(name) = capture.get(1) {
                    defined.insert(name.as_str().to_string());
                }
            }
        }

        for capture in self.import_re.captures_iter(code) {
            let capture = capture.context("Failed to match import pattern")?;
            if let Some(items) = capture.get(1) {
                for item in items.as_str().split(',') {
                    if let Some(name) = imported_name(item) {
                        defined.insert(name);
                    }
                }
            }
        }

        for capture in self.from_import_re.captures_iter(code) {
            let capture = capture.context("Failed to match from-import pattern")?;
            if let Some(items) = capture.get(1) {
                for item in items.as_str().split(',') {
                    if let Some(name) = imported_name(item) {
                        defined.insert(name);
                    }
                }
            }
        }

        Ok(defined)
    }

    fn called_symbols(&self, code: &str) -> Result<BTreeSet<String>> {
        let mut called = BTreeSet::new();

        for capture in self.call_re.captures_iter(code) {
            let capture = capture.context("Failed to match call pattern")?;
            if let Some(name) = capture.get(1) {
                let name = name.as_str();
                if !PYTHON_KEYWORDS.contains(&name) {
                    called.insert(name.to_string());
                }
            }
        }

        Ok(called)
    }

    /// Names read but not defined in this cell, minus keywords and
    /// builtins: the cell's external inputs.
    fn used_names(&self, code: &str, defined: &BTreeSet<String>) -> Result<BTreeSet<String>> {
        let mut used = BTreeSet::new();

        for found in self.ident_re.find_iter(code) {
            let name = found.context("Failed to match identifier")?.as_str();
            if defined.contains(name)
                || PYTHON_KEYWORDS.contains(&name)
                || PYTHON_BUILTINS.contains(&name)
            {
                continue;
            }
            used.insert(name.to_string());
        }

        Ok(used)
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Ok(Regex::new(pattern)
        .with_context(|| format!("Failed to compile analyzer pattern: {pattern}"))?)
}

/// The bound name introduced by one item of an import list:
/// the alias if present, otherwise the first dotted segment.
fn imported_name(item: &str) -> Option<String> {
    let item = item.trim();
    if item.is_empty() || item == "*" {
        return None;
    }

    if let Some((_, alias)) = item.split_once(" as ") {
        return Some(alias.trim().to_string());
    }

    item.split('.')
        .next()
        .map(|segment| segment.trim().to_string())
        .filter(|segment| !segment.is_empty())
}

/// Blank out comments and string literal contents so identifier matching
/// only sees code. Positions are preserved; literal contents become
/// spaces.
fn strip_comments_and_strings(code: &str) -> String {
    let mut out = String::with_capacity(code.len());
    let mut chars = code.chars().peekable();
    let mut in_string: Option<char> = None;

    while let Some(c) = chars.next() {
        match in_string {
            Some(quote) => {
                if c == '\\' {
                    // Skip the escaped character entirely.
                    chars.next();
                    out.push(' ');
                    out.push(' ');
                } else if c == quote {
                    in_string = None;
                    out.push(' ');
                } else if c == '\n' {
                    out.push('\n');
                } else {
                    out.push(' ');
                }
            }
            None => match c {
                '\'' | '"' => {
                    in_string = Some(c);
                    out.push(' ');
                }
                '#' => {
                    for next in chars.by_ref() {
                        if next == '\n' {
                            out.push('\n');
                            break;
                        }
                    }
                }
                _ => out.push(c),
            },
        }
    }

    out
}
