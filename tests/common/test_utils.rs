use axum::{body::Body, http::Response};
use serde_json::Value;
use sqli_sentinel::{
    config::GatewayConfig,
    inference::{KerasTokenizer, SequenceShape},
};
use tempfile::TempDir;

/// A tokenizer document in the shape Keras `Tokenizer.to_json()` writes.
pub const TOKENIZER_JSON: &str = r##"{
    "class_name": "Tokenizer",
    "config": {
        "num_words": 10,
        "filters": "!\"#$%&()*+,-./:;<=>?@[\\]^_`{|}~\t\n",
        "lower": true,
        "split": " ",
        "char_level": false,
        "oov_token": "<OOV>",
        "document_count": 4,
        "index_docs": "{}",
        "index_word": "{}",
        "word_counts": "{}",
        "word_docs": "{}",
        "word_index": "{\"<OOV>\": 1, \"or\": 2, \"1\": 3, \"select\": 4, \"from\": 5, \"union\": 6, \"'\": 7, \"users\": 8, \"where\": 9, \"drop\": 10}"
    }
}"##;

pub fn test_tokenizer() -> KerasTokenizer {
    KerasTokenizer::from_json(TOKENIZER_JSON).unwrap()
}

pub fn default_shape() -> SequenceShape {
    SequenceShape::default()
}

/// Write the fixture tokenizer to a temp directory, returning its path.
pub fn write_tokenizer(dir: &TempDir) -> String {
    let path = dir.path().join("tokenizer.json");
    std::fs::write(&path, TOKENIZER_JSON).unwrap();
    path.to_string_lossy().to_string()
}

pub fn create_temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp directory")
}

pub fn gateway_config(model_service_url: &str, upstream_url: &str) -> GatewayConfig {
    GatewayConfig {
        model_service_url: model_service_url.to_string(),
        upstream_url: upstream_url.to_string(),
        ..Default::default()
    }
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
