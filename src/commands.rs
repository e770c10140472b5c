// Command orchestration: the index pipeline, question answering, and
// status reporting.

use std::io::{BufRead, Write as _};
use std::path::Path;

use anyhow::{Context, Result};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use itertools::Itertools;
use tracing::info;

use crate::analysis::CodeAnalyzer;
use crate::config::Config;
use crate::documents::{Modality, build_documents};
use crate::embeddings::ollama::{OllamaClient, OllamaEmbedder};
use crate::explainer::Explainer;
use crate::index::{EmbeddingIndex, VectorIndex};
use crate::notebook::{CellType, assign_sections, parse_notebook};
use crate::retriever::{ModalityIndex, RelationalRetriever, format_for_llm};
use crate::splitter::{split_code_documents, split_prose_documents};
use crate::store::{DocumentStore, load_documents, save_documents};

const QA_SYSTEM_PROMPT: &str = "\
You are an expert data scientist analyzing a Jupyter notebook.
Use the provided context, which contains actual code cells and their explanations, to answer the user's question.

RULES:
1. Base your answer strictly on the provided context.
2. If the answer is not in the context, say \"I don't see that in the notebook's code.\"
3. Reference specific variable names, datasets, or algorithms when they appear in the code.";

/// Run the full index pipeline for a notebook: parse, analyze, explain,
/// build documents, split into chunks, and persist every artifact.
#[inline]
pub fn run_index(config: &Config, notebook_path: &Path) -> Result<()> {
    let mut cells = parse_notebook(notebook_path)?;
    assign_sections(&mut cells);

    let analyzer = CodeAnalyzer::new()?;
    for cell in &mut cells {
        analyzer.analyze(cell)?;
    }

    let client = OllamaClient::new(&config.ollama)?;
    client
        .ping()
        .context("Ollama server is not reachable; explanations require it")?;
    let explainer = Explainer::new(client, config.ollama.chat_model.clone())?;

    let progress = progress_bar(cells.len() as u64, "Explaining cells");
    for cell in &mut cells {
        explainer.explain_cell(cell);
        progress.inc(1);
    }
    progress.finish_and_clear();

    let failed = cells.iter().filter(|c| c.explanation_error).count();
    if failed > 0 {
        println!(
            "{} {} cells have no explanation (generation failed); they will be indexed by code only",
            style("warning:").yellow().bold(),
            failed
        );
    }

    let cells_json = serde_json::to_string_pretty(&cells).context("Failed to serialize cells")?;
    if let Some(parent) = config.cells_path().parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(config.cells_path(), cells_json)
        .with_context(|| format!("Failed to write {}", config.cells_path().display()))?;

    let (mut code_docs, mut text_docs) = build_documents(&cells);

    // Splitting tags each source document with its parent id, so the
    // mutated originals become the document store entries.
    let code_chunks = split_code_documents(&mut code_docs, &config.splitter);
    let text_chunks = split_prose_documents(&mut text_docs, &config.splitter);

    let store = DocumentStore::from_documents(code_docs.iter().chain(text_docs.iter()))?;
    store.save(config.doc_store_path())?;

    save_documents(&code_chunks, config.code_chunks_path())?;
    save_documents(&text_chunks, config.text_chunks_path())?;

    info!(
        "Indexed {} cells into {} store entries and {} chunks",
        cells.len(),
        store.len(),
        code_chunks.len() + text_chunks.len()
    );

    println!(
        "{} {} cells -> {} documents, {} chunks ({} code, {} explanation)",
        style("Indexed:").green().bold(),
        cells.iter().filter(|c| c.cell_type == CellType::Code).count(),
        store.len(),
        code_chunks.len() + text_chunks.len(),
        code_chunks.len(),
        text_chunks.len()
    );

    Ok(())
}

/// Build the retriever from persisted artifacts: load the document
/// store, embed every chunk collection, and wire up one index per
/// modality. Embedding is a one-shot batch; the index is queryable only
/// after it completes.
#[inline]
pub fn build_retriever(config: &Config) -> Result<RelationalRetriever> {
    let client = OllamaClient::new(&config.ollama)?;

    let modalities = [
        (
            Modality::Code,
            config.code_chunks_path(),
            config.ollama.code_model.clone(),
        ),
        (
            Modality::Explanation,
            config.text_chunks_path(),
            config.ollama.text_model.clone(),
        ),
    ];

    let mut indices = Vec::new();

    for (modality, chunks_path, model) in modalities {
        let chunks = load_documents(&chunks_path).with_context(|| {
            format!(
                "Missing chunk collection {}; run `notebook-rag index` first",
                chunks_path.display()
            )
        })?;

        let embedder = OllamaEmbedder::new(client.clone(), model);
        let mut index = EmbeddingIndex::new(Box::new(embedder));

        let progress = progress_bar(
            chunks.len() as u64,
            match modality {
                Modality::Code => "Embedding code chunks",
                Modality::Explanation => "Embedding explanation chunks",
            },
        );
        for batch in chunks.chunks(config.ollama.batch_size as usize) {
            index.add(batch)?;
            progress.inc(batch.len() as u64);
        }
        progress.finish_and_clear();

        indices.push(ModalityIndex {
            modality,
            index: Box::new(index),
        });
    }

    RelationalRetriever::load(config.doc_store_path(), indices).map_err(Into::into)
}

/// Answer a single question over the indexed notebook.
#[inline]
pub fn run_ask(config: &Config, question: &str, top_k: Option<usize>) -> Result<()> {
    let retriever = build_retriever(config)?;
    let client = OllamaClient::new(&config.ollama)?;

    let answer = answer_question(
        config,
        &client,
        &retriever,
        question,
        top_k.unwrap_or(config.retrieval.top_k),
    )?;

    println!("{answer}");
    Ok(())
}

/// Interactive question-answering loop over the indexed notebook.
#[inline]
pub fn run_chat(config: &Config) -> Result<()> {
    let retriever = build_retriever(config)?;
    let client = OllamaClient::new(&config.ollama)?;

    println!(
        "Ask questions about the indexed notebook. Type {} to exit.",
        style("q").cyan()
    );

    let stdin = std::io::stdin();
    loop {
        print!("{} ", style("You:").cyan().bold());
        std::io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        let question = line.trim();
        if question.eq_ignore_ascii_case("q") {
            break;
        }
        if question.is_empty() {
            continue;
        }

        match answer_question(config, &client, &retriever, question, config.retrieval.top_k) {
            Ok(answer) => println!("{} {answer}\n", style("AI:").green().bold()),
            Err(e) => println!("{} {e:#}\n", style("error:").red().bold()),
        }
    }

    Ok(())
}

fn answer_question(
    config: &Config,
    client: &OllamaClient,
    retriever: &RelationalRetriever,
    question: &str,
    top_k: usize,
) -> Result<String> {
    let bundles = retriever.retrieve(question, top_k)?;

    if bundles.is_empty() {
        return Ok("No relevant cells were found in the indexed notebook.".to_string());
    }

    let context = format_for_llm(&bundles);
    let system = format!("{QA_SYSTEM_PROMPT}\n\nNOTEBOOK CONTEXT:\n{context}");

    client
        .generate(&config.ollama.chat_model, &system, question)
        .context("Failed to generate answer")
}

/// Print a summary of the persisted artifacts.
#[inline]
pub fn run_status(config: &Config) -> Result<()> {
    let store_path = config.doc_store_path();

    if !store_path.exists() {
        println!("No notebook has been indexed yet.");
        println!("Use 'notebook-rag index <notebook.ipynb>' to build the corpus.");
        return Ok(());
    }

    let store = DocumentStore::load(&store_path)?;
    let code_chunks = load_documents(config.code_chunks_path()).unwrap_or_default();
    let text_chunks = load_documents(config.text_chunks_path()).unwrap_or_default();

    let cell_count = store
        .iter()
        .filter_map(|(_, doc)| doc.cell_id())
        .unique()
        .count();

    println!("{}", style("Corpus status").bold());
    println!("  Artifacts directory: {}", config.storage.artifacts_dir.display());
    println!("  Document store entries: {}", store.len());
    println!("  Unique cells: {cell_count}");
    println!("  Code chunks: {}", code_chunks.len());
    println!("  Explanation chunks: {}", text_chunks.len());

    Ok(())
}

fn progress_bar(len: u64, message: &'static str) -> ProgressBar {
    let bar = ProgressBar::new(len);
    bar.set_style(
        ProgressStyle::with_template("{msg} [{bar:30}] {pos}/{len}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    bar.set_message(message);
    bar
}
