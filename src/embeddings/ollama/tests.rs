use super::*;

#[test]
fn client_configuration() {
    let config = OllamaConfig {
        protocol: "http".to_string(),
        host: "test-host".to_string(),
        port: 1234,
        batch_size: 128,
        ..OllamaConfig::default()
    };
    let client = OllamaClient::new(&config).expect("Failed to create client");

    assert_eq!(client.batch_size, 128);
    assert_eq!(client.base_url.host_str(), Some("test-host"));
    assert_eq!(client.base_url.port(), Some(1234));
    // Note: timeout is part of the agent configuration
    assert_eq!(client.retry_attempts, DEFAULT_RETRY_ATTEMPTS);
}

#[test]
fn client_builder_methods() {
    let config = OllamaConfig::default();
    let client = OllamaClient::new(&config)
        .expect("Failed to create client")
        .with_timeout(Duration::from_secs(60))
        .with_retry_attempts(5);

    // Note: timeout is part of the agent configuration
    assert_eq!(client.retry_attempts, 5);
}

#[test]
fn invalid_host_fails_client_creation() {
    let config = OllamaConfig {
        host: "not a valid host".to_string(),
        ..OllamaConfig::default()
    };

    assert!(OllamaClient::new(&config).is_err());
}

#[test]
fn embed_batch_with_no_texts_makes_no_requests() {
    // Points at a port nothing listens on; an empty input must succeed
    // without touching the network.
    let config = OllamaConfig {
        port: 1,
        ..OllamaConfig::default()
    };
    let client = OllamaClient::new(&config).expect("Failed to create client");

    let embeddings = client
        .embed_batch("any-model", &[])
        .expect("empty batch should succeed");
    assert!(embeddings.is_empty());
}

#[test]
fn embedder_binds_a_model_to_the_client() {
    let config = OllamaConfig::default();
    let client = OllamaClient::new(&config).expect("Failed to create client");
    let embedder = OllamaEmbedder::new(client, "nomic-embed-text:latest".to_string());

    assert_eq!(embedder.model, "nomic-embed-text:latest");
}

#[test]
fn request_payload_shapes() {
    let single = EmbedRequest {
        model: "m".to_string(),
        prompt: "text".to_string(),
    };
    let json = serde_json::to_value(&single).expect("should serialize");
    assert_eq!(json["model"], "m");
    assert_eq!(json["prompt"], "text");

    let batch = BatchEmbedRequest {
        model: "m".to_string(),
        inputs: vec!["a".to_string(), "b".to_string()],
    };
    let json = serde_json::to_value(&batch).expect("should serialize");
    assert_eq!(json["input"].as_array().map(Vec::len), Some(2));

    let generate = GenerateRequest {
        model: "m".to_string(),
        system: "sys".to_string(),
        prompt: "q".to_string(),
        stream: false,
    };
    let json = serde_json::to_value(&generate).expect("should serialize");
    assert_eq!(json["stream"], false);
}
