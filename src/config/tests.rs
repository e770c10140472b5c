use super::*;
use std::fs;
use tempfile::TempDir;

#[test]
fn default_config_is_valid() {
    let config = Config::default();
    assert!(config.validate().is_ok());
    assert_eq!(config.ollama.port, 11434);
    assert_eq!(config.ollama.batch_size, 16);
    assert_eq!(config.splitter.chunk_size, 500);
    assert_eq!(config.splitter.chunk_overlap, 50);
    assert_eq!(config.retrieval.top_k, 3);
}

#[test]
fn config_file_persistence() {
    let temp_dir = TempDir::new().expect("should create TempDir successfully");

    let mut original_config = Config::default();
    original_config.ollama.host = "test-host".to_string();
    original_config.ollama.port = 8080;
    original_config.ollama.chat_model = "test-chat".to_string();
    original_config.storage.artifacts_dir = PathBuf::from("custom-artifacts");

    original_config
        .save_to(temp_dir.path())
        .expect("should save config successfully");

    let loaded_config = Config::load_from(temp_dir.path()).expect("should load config");
    assert_eq!(original_config, loaded_config);
}

#[test]
fn missing_config_file_falls_back_to_defaults() {
    let temp_dir = TempDir::new().expect("should create TempDir successfully");
    let config = Config::load_from(temp_dir.path()).expect("should load defaults");
    assert_eq!(config, Config::default());
}

#[test]
fn partial_config_fills_defaults() {
    let temp_dir = TempDir::new().expect("should create TempDir successfully");
    let partial_toml = r#"
        [ollama]
        host = "custom-host"

        [splitter]
        chunk_size = 800
    "#;
    fs::write(temp_dir.path().join("config.toml"), partial_toml)
        .expect("should write config file");

    let config = Config::load_from(temp_dir.path()).expect("should parse partial config");
    assert_eq!(config.ollama.host, "custom-host");
    assert_eq!(config.ollama.port, 11434);
    assert_eq!(config.splitter.chunk_size, 800);
    assert_eq!(config.splitter.chunk_overlap, 50);
}

#[test]
fn invalid_toml_handling() {
    let temp_dir = TempDir::new().expect("should create TempDir successfully");
    let invalid_toml = r#"
        [ollama
        host = "localhost"
        port = "invalid_port"
    "#;
    fs::write(temp_dir.path().join("config.toml"), invalid_toml)
        .expect("should write config file");

    assert!(Config::load_from(temp_dir.path()).is_err());
}

#[test]
fn port_validation() {
    let mut config = Config::default();
    config.ollama.port = 0;
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidPort(0))
    ));
}

#[test]
fn protocol_validation() {
    let mut config = Config::default();
    config.ollama.protocol = "ftp".to_string();
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidProtocol(_))
    ));
}

#[test]
fn batch_size_boundary_validation() {
    let mut config = Config::default();

    config.ollama.batch_size = 1;
    assert!(config.validate().is_ok());
    config.ollama.batch_size = 1000;
    assert!(config.validate().is_ok());
    config.ollama.batch_size = 0;
    assert!(config.validate().is_err());
    config.ollama.batch_size = 1001;
    assert!(config.validate().is_err());
}

#[test]
fn model_name_validation() {
    let mut config = Config::default();
    config.ollama.code_model = "   ".to_string();
    assert!(matches!(config.validate(), Err(ConfigError::InvalidModel)));
}

#[test]
fn chunk_size_validation() {
    let mut config = Config::default();
    config.splitter.chunk_size = 10;
    config.splitter.chunk_overlap = 5;
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidChunkSize(10))
    ));
}

#[test]
fn overlap_must_be_smaller_than_chunk_size() {
    let mut config = Config::default();
    config.splitter.chunk_size = 100;
    config.splitter.chunk_overlap = 100;
    assert!(matches!(
        config.validate(),
        Err(ConfigError::OverlapTooLarge(100, 100))
    ));
}

#[test]
fn top_k_validation() {
    let mut config = Config::default();
    config.retrieval.top_k = 0;
    assert!(matches!(config.validate(), Err(ConfigError::InvalidTopK)));
}

#[test]
fn ollama_url_generation() {
    let configs = vec![
        ("http", "localhost", 11434, "http://localhost:11434/"),
        ("http", "127.0.0.1", 8080, "http://127.0.0.1:8080/"),
        ("https", "secure.example.com", 443, "https://secure.example.com/"),
    ];

    for (protocol, host, port, expected_url) in configs {
        let config = OllamaConfig {
            protocol: protocol.to_string(),
            host: host.to_string(),
            port,
            ..OllamaConfig::default()
        };

        let url = config.url().expect("url is ok");
        assert_eq!(url.as_str(), expected_url);
    }
}

#[test]
fn artifact_paths_share_the_artifacts_dir() {
    let mut config = Config::default();
    config.storage.artifacts_dir = PathBuf::from("/tmp/out");

    assert_eq!(config.cells_path(), PathBuf::from("/tmp/out/cells.json"));
    assert_eq!(
        config.doc_store_path(),
        PathBuf::from("/tmp/out/doc_store.json")
    );
    assert_eq!(
        config.code_chunks_path(),
        PathBuf::from("/tmp/out/split_code_docs.json")
    );
    assert_eq!(
        config.text_chunks_path(),
        PathBuf::from("/tmp/out/split_text_docs.json")
    );
}

#[test]
fn error_display_messages() {
    let errors = vec![
        ConfigError::InvalidProtocol("ftp".to_string()),
        ConfigError::InvalidPort(0),
        ConfigError::InvalidBatchSize(0),
        ConfigError::InvalidModel,
        ConfigError::InvalidChunkSize(10),
        ConfigError::InvalidTopK,
    ];

    for error in errors {
        let message = format!("{error}");
        assert!(!message.is_empty());
        assert!(message.len() > 10); // Ensure meaningful error messages
    }
}
