#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use findings::config::IndexConfig;
use findings::embedding::{Embedder, EmbeddingOutput, EmbeddingProvider, ExtractOptions};
use findings::index::PineconeClient;
use serde_json::{json, Value};
use wiremock::MockServer;

/// Provider that returns a canned output (or error) for every text.
pub struct StubProvider {
    output: Result<EmbeddingOutput, String>,
}

impl StubProvider {
    pub fn returning(output: EmbeddingOutput) -> Self {
        Self { output: Ok(output) }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            output: Err(message.to_string()),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for StubProvider {
    async fn extract(&self, _text: &str, _options: &ExtractOptions) -> anyhow::Result<EmbeddingOutput> {
        match &self.output {
            Ok(output) => Ok(output.clone()),
            Err(message) => Err(anyhow::anyhow!("{message}")),
        }
    }

    fn model_id(&self) -> &str {
        "stub"
    }
}

/// Deterministic 8-dim unit vector with a spike at `seed`.
pub fn test_embedding(seed: usize) -> Vec<f32> {
    let mut v = vec![0.0f32; 8];
    v[seed % 8] = 1.0;
    v
}

/// Embedder over a provider that always yields [`test_embedding`]`(0)`.
pub fn test_embedder() -> Embedder {
    embedder_with(EmbeddingOutput::Flat(test_embedding(0)))
}

pub fn embedder_with(output: EmbeddingOutput) -> Embedder {
    Embedder::with_provider(
        ExtractOptions::default(),
        Arc::new(StubProvider::returning(output)),
    )
}

pub fn failing_embedder(message: &str) -> Embedder {
    Embedder::with_provider(ExtractOptions::default(), Arc::new(StubProvider::failing(message)))
}

pub const API_KEY: &str = "pc-test-key";

/// Index config pointing at `server`, with the data-plane host pinned to it.
pub fn index_config(server: &MockServer) -> IndexConfig {
    IndexConfig {
        api_key: API_KEY.into(),
        controller_url: server.uri(),
        host: Some(server.uri()),
        timeout_secs: 5,
        ..IndexConfig::default()
    }
}

/// Client that talks to `server` for both control and data plane.
pub fn pinecone_client(server: &MockServer) -> PineconeClient {
    PineconeClient::new(&index_config(server)).unwrap()
}

/// Query response body with one match per chunk, scores descending.
pub fn query_body(chunks: &[&str]) -> Value {
    let matches: Vec<Value> = chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| {
            json!({
                "id": format!("note-{i}"),
                "score": 0.95 - 0.1 * i as f64,
                "values": [],
                "metadata": { "chunk": chunk, "source": "discharge-summary" }
            })
        })
        .collect();
    json!({ "matches": matches, "namespace": "cardiology", "usage": { "readUnits": 5 } })
}
