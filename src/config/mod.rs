// Configuration module
// TOML-backed settings with validation and an interactive setup flow.

#[cfg(test)]
mod tests;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dialoguer::{Confirm, Input};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::splitter::SplitterConfig;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub ollama: OllamaConfig,
    #[serde(default)]
    pub splitter: SplitterConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OllamaConfig {
    pub protocol: String,
    pub host: String,
    pub port: u16,
    /// Embedding model for explanation (prose) chunks.
    pub text_model: String,
    /// Embedding model for code chunks.
    pub code_model: String,
    /// Chat model used for cell explanations and question answering.
    pub chat_model: String,
    pub batch_size: u32,
}

impl Default for OllamaConfig {
    #[inline]
    fn default() -> Self {
        Self {
            protocol: "http".to_string(),
            host: "localhost".to_string(),
            port: 11434,
            text_model: "nomic-embed-text:latest".to_string(),
            code_model: "nomic-embed-text:latest".to_string(),
            chat_model: "llama3:8b".to_string(),
            batch_size: 16,
        }
    }
}

impl OllamaConfig {
    /// Base URL of the Ollama server.
    #[inline]
    pub fn url(&self) -> Result<Url> {
        let url = format!("{}://{}:{}", self.protocol, self.host, self.port);
        Url::parse(&url).with_context(|| format!("Invalid Ollama URL: {url}"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Default fan-out for nearest-neighbor search.
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    #[inline]
    fn default() -> Self {
        Self { top_k: 3 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding every pipeline artifact.
    pub artifacts_dir: PathBuf,
}

impl Default for StorageConfig {
    #[inline]
    fn default() -> Self {
        Self {
            artifacts_dir: PathBuf::from("artifacts"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration directory not found or could not be created")]
    DirectoryError,
    #[error("Invalid port: {0} (must be non-zero)")]
    InvalidPort(u16),
    #[error("Invalid protocol: {0} (must be 'http' or 'https')")]
    InvalidProtocol(String),
    #[error("Invalid batch size: {0} (must be between 1 and 1000)")]
    InvalidBatchSize(u32),
    #[error("Invalid model name: model names cannot be empty")]
    InvalidModel,
    #[error("Invalid chunk size: {0} (must be at least 50)")]
    InvalidChunkSize(usize),
    #[error("Chunk overlap ({0}) must be smaller than chunk size ({1})")]
    OverlapTooLarge(usize, usize),
    #[error("Invalid top_k: must be at least 1")]
    InvalidTopK,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl Default for Config {
    #[inline]
    fn default() -> Self {
        Self {
            ollama: OllamaConfig::default(),
            splitter: SplitterConfig::default(),
            retrieval: RetrievalConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default config directory, falling back
    /// to defaults when no config file exists yet.
    #[inline]
    pub fn load() -> Result<Self> {
        Self::load_from(get_config_dir()?)
    }

    /// Load configuration from a specific directory.
    #[inline]
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join("config.toml");

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;

        config
            .validate()
            .context("Configuration validation failed")?;

        Ok(config)
    }

    /// Persist configuration to a directory as `config.toml`.
    #[inline]
    pub fn save_to<P: AsRef<Path>>(&self, config_dir: P) -> Result<()> {
        self.validate()
            .context("Configuration validation failed before saving")?;

        let config_dir = config_dir.as_ref();
        fs::create_dir_all(config_dir).with_context(|| {
            format!("Failed to create config directory: {}", config_dir.display())
        })?;

        let content = toml::to_string_pretty(self).map_err(ConfigError::TomlSerialize)?;
        let config_path = config_dir.join("config.toml");
        fs::write(&config_path, content)
            .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;

        Ok(())
    }

    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ollama.port == 0 {
            return Err(ConfigError::InvalidPort(self.ollama.port));
        }

        if self.ollama.protocol != "http" && self.ollama.protocol != "https" {
            return Err(ConfigError::InvalidProtocol(self.ollama.protocol.clone()));
        }

        if self.ollama.batch_size == 0 || self.ollama.batch_size > 1000 {
            return Err(ConfigError::InvalidBatchSize(self.ollama.batch_size));
        }

        if self.ollama.text_model.trim().is_empty()
            || self.ollama.code_model.trim().is_empty()
            || self.ollama.chat_model.trim().is_empty()
        {
            return Err(ConfigError::InvalidModel);
        }

        if self.splitter.chunk_size < 50 {
            return Err(ConfigError::InvalidChunkSize(self.splitter.chunk_size));
        }

        if self.splitter.chunk_overlap >= self.splitter.chunk_size {
            return Err(ConfigError::OverlapTooLarge(
                self.splitter.chunk_overlap,
                self.splitter.chunk_size,
            ));
        }

        if self.retrieval.top_k == 0 {
            return Err(ConfigError::InvalidTopK);
        }

        Ok(())
    }

    // Artifact path helpers. Every stage of the pipeline reads and
    // writes through these so the layout is defined in one place.

    #[inline]
    pub fn cells_path(&self) -> PathBuf {
        self.storage.artifacts_dir.join("cells.json")
    }

    #[inline]
    pub fn doc_store_path(&self) -> PathBuf {
        self.storage.artifacts_dir.join("doc_store.json")
    }

    #[inline]
    pub fn code_chunks_path(&self) -> PathBuf {
        self.storage.artifacts_dir.join("split_code_docs.json")
    }

    #[inline]
    pub fn text_chunks_path(&self) -> PathBuf {
        self.storage.artifacts_dir.join("split_text_docs.json")
    }
}

/// Default configuration directory, e.g. `~/.config/notebook-rag`.
#[inline]
pub fn get_config_dir() -> Result<PathBuf> {
    let base = dirs::config_dir().ok_or(ConfigError::DirectoryError)?;
    Ok(base.join("notebook-rag"))
}

/// Interactively prompt for the most commonly changed settings and save
/// the result.
#[inline]
pub fn run_interactive_config() -> Result<()> {
    let config_dir = get_config_dir()?;
    let mut config = Config::load_from(&config_dir)?;

    println!("Configuring notebook-rag (press Enter to keep current values)\n");

    config.ollama.host = Input::new()
        .with_prompt("Ollama host")
        .default(config.ollama.host)
        .interact_text()?;

    config.ollama.port = Input::new()
        .with_prompt("Ollama port")
        .default(config.ollama.port)
        .validate_with(|input: &u16| -> Result<(), &str> {
            if *input == 0 {
                Err("Port must be greater than 0")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    config.ollama.text_model = Input::new()
        .with_prompt("Embedding model for explanations")
        .default(config.ollama.text_model)
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.trim().is_empty() {
                Err("Model name cannot be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    config.ollama.code_model = Input::new()
        .with_prompt("Embedding model for code")
        .default(config.ollama.code_model)
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.trim().is_empty() {
                Err("Model name cannot be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    config.ollama.chat_model = Input::new()
        .with_prompt("Chat model")
        .default(config.ollama.chat_model)
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.trim().is_empty() {
                Err("Model name cannot be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    let artifacts_dir: String = Input::new()
        .with_prompt("Artifacts directory")
        .default(config.storage.artifacts_dir.display().to_string())
        .interact_text()?;
    config.storage.artifacts_dir = PathBuf::from(artifacts_dir);

    if Confirm::new()
        .with_prompt("Save configuration?")
        .default(true)
        .interact()?
    {
        config.save_to(&config_dir)?;
        println!("Configuration saved to {}", config_dir.join("config.toml").display());
    }

    Ok(())
}

/// Print the active configuration.
#[inline]
pub fn show_config() -> Result<()> {
    let config = Config::load()?;
    let rendered = toml::to_string_pretty(&config).map_err(ConfigError::TomlSerialize)?;
    println!("{rendered}");
    Ok(())
}
