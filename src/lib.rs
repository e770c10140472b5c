use thiserror::Error;

pub type Result<T> = std::result::Result<T, RagError>;

#[derive(Error, Debug)]
pub enum RagError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Notebook error: {0}")]
    Notebook(String),

    #[error("Metadata error: {0}")]
    Metadata(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub mod analysis;
pub mod commands;
pub mod config;
pub mod documents;
pub mod embeddings;
pub mod explainer;
pub mod index;
pub mod notebook;
pub mod retriever;
pub mod splitter;
pub mod store;
