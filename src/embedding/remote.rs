//! Remote feature-extraction provider.
//!
//! Talks to any endpoint that accepts `{"inputs": ..., "normalize": ...}` and
//! answers with a JSON array of floats (Hugging Face Inference, TEI). The
//! response body is handed back untouched as [`EmbeddingOutput::Json`].

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;

use super::{EmbeddingOutput, EmbeddingProvider, ExtractOptions, Pooling};
use crate::config::EmbeddingConfig;

pub struct RemoteEmbeddingProvider {
    http: reqwest::Client,
    endpoint: String,
    api_token: Option<String>,
    model_id: String,
}

#[derive(Serialize)]
struct FeatureExtractionRequest<'a> {
    inputs: &'a str,
    normalize: bool,
}

impl RemoteEmbeddingProvider {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        anyhow::ensure!(
            !config.endpoint.is_empty(),
            "embedding.endpoint must be set when embedding.provider = \"remote\""
        );

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
            api_token: config.api_token.clone(),
            model_id: config.model.clone(),
        })
    }
}

#[async_trait]
impl EmbeddingProvider for RemoteEmbeddingProvider {
    async fn extract(&self, text: &str, options: &ExtractOptions) -> Result<EmbeddingOutput> {
        if options.pooling != Pooling::Mean {
            // Pooling happens server-side; the endpoint decides.
            tracing::warn!(pooling = %options.pooling, "remote provider ignores pooling option");
        }

        let mut request = self.http.post(&self.endpoint).json(&FeatureExtractionRequest {
            inputs: text,
            normalize: options.normalize,
        });
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("HTTP request failed for {}", self.endpoint))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("feature extraction failed with HTTP {status}: {body}");
        }

        let body: serde_json::Value = response
            .json()
            .await
            .context("feature extraction response is not JSON")?;
        Ok(EmbeddingOutput::Json(body))
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}
