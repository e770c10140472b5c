use std::path::PathBuf;

use clap::{Parser, Subcommand};
use notebook_rag::Result;
use notebook_rag::commands::{run_ask, run_chat, run_index, run_status};
use notebook_rag::config::{Config, run_interactive_config, show_config};

#[derive(Parser)]
#[command(name = "notebook-rag")]
#[command(about = "Relational retrieval over Jupyter notebooks with local LLM explanations")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure Ollama connection and settings
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// Index a notebook: analyze, explain, chunk, and persist artifacts
    Index {
        /// Path to the .ipynb notebook file
        notebook: PathBuf,
    },
    /// Ask a single question about the indexed notebook
    Ask {
        /// The question to answer
        question: String,
        /// Number of cell contexts to retrieve
        #[arg(long)]
        top_k: Option<usize>,
    },
    /// Start an interactive question-answering session
    Chat,
    /// Show a summary of the persisted artifacts
    Status,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Config { show } => {
            if show {
                show_config()?;
            } else {
                run_interactive_config()?;
            }
        }
        Commands::Index { notebook } => {
            run_index(&Config::load()?, &notebook)?;
        }
        Commands::Ask { question, top_k } => {
            run_ask(&Config::load()?, &question, top_k)?;
        }
        Commands::Chat => {
            run_chat(&Config::load()?)?;
        }
        Commands::Status => {
            run_status(&Config::load()?)?;
        }
    }

    Ok(())
}
