//! Text-to-vector embedding pipeline.
//!
//! Provides the [`EmbeddingProvider`] trait, the lazily-initialized [`Embedder`]
//! service that owns one provider handle per process, and two providers:
//! a local ONNX Runtime model ([`local`]) and a remote feature-extraction
//! endpoint ([`remote`]). Providers are created via [`create_provider`] from
//! configuration.

pub mod local;
pub mod output;
pub mod remote;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::OnceCell;

pub use output::{validate_embedding, EmbeddingOutput};

use crate::config::EmbeddingConfig;
use crate::error::{Result, RetrievalError};

/// How token embeddings are collapsed into one sentence vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pooling {
    /// Attention-masked mean over all tokens.
    #[default]
    Mean,
    /// Hidden state of the first (`[CLS]`) token.
    Cls,
}

impl std::fmt::Display for Pooling {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Mean => "mean",
            Self::Cls => "cls",
        })
    }
}

/// Options passed to every extraction call.
///
/// These must match the settings used when the index was populated, or the
/// similarity scores it returns are meaningless.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractOptions {
    pub pooling: Pooling,
    pub normalize: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            pooling: Pooling::Mean,
            normalize: true,
        }
    }
}

impl From<&EmbeddingConfig> for ExtractOptions {
    fn from(config: &EmbeddingConfig) -> Self {
        Self {
            pooling: config.pooling,
            normalize: config.normalize,
        }
    }
}

/// A feature-extraction pipeline: text in, some numeric shape out.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Run the model on a single text.
    async fn extract(&self, text: &str, options: &ExtractOptions)
        -> anyhow::Result<EmbeddingOutput>;

    /// Identifier of the underlying model, for logs and diagnostics.
    fn model_id(&self) -> &str;
}

/// Create an embedding provider from config.
///
/// `"local"` loads ONNX model files from the cache directory (run
/// `findings model download` first); `"remote"` calls `embedding.endpoint`.
pub fn create_provider(config: &EmbeddingConfig) -> anyhow::Result<Arc<dyn EmbeddingProvider>> {
    match config.provider.as_str() {
        "local" => {
            let provider = local::LocalEmbeddingProvider::new(config)?;
            Ok(Arc::new(provider))
        }
        "remote" => {
            let provider = remote::RemoteEmbeddingProvider::new(config)?;
            Ok(Arc::new(provider))
        }
        other => anyhow::bail!("unknown embedding provider: {other}. Supported: local, remote"),
    }
}

type ProviderFactory = Arc<dyn Fn() -> anyhow::Result<Arc<dyn EmbeddingProvider>> + Send + Sync>;

/// Owns the process-wide embedding provider.
///
/// The provider is built on first use. Concurrent first callers wait on the
/// same initialization, so the factory runs at most once per `Embedder`
/// unless it fails, in which case the next call tries again. Initialization
/// runs on its own task and finishes even if the caller that started it is
/// dropped.
pub struct Embedder {
    provider: Arc<OnceCell<Arc<dyn EmbeddingProvider>>>,
    factory: Option<ProviderFactory>,
    options: ExtractOptions,
}

impl Embedder {
    /// Lazily create the provider described by `config`.
    pub fn new(config: &EmbeddingConfig) -> Self {
        let config = config.clone();
        let options = ExtractOptions::from(&config);
        Self::with_factory(options, move || create_provider(&config))
    }

    /// Lazily create the provider with a custom factory. The factory runs on a
    /// blocking thread.
    pub fn with_factory<F>(options: ExtractOptions, factory: F) -> Self
    where
        F: Fn() -> anyhow::Result<Arc<dyn EmbeddingProvider>> + Send + Sync + 'static,
    {
        let factory: ProviderFactory = Arc::new(factory);
        Self {
            provider: Arc::new(OnceCell::new()),
            factory: Some(factory),
            options,
        }
    }

    /// Wrap an already-constructed provider.
    pub fn with_provider(options: ExtractOptions, provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            provider: Arc::new(OnceCell::new_with(Some(provider))),
            factory: None,
            options,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.provider.initialized()
    }

    async fn provider(&self) -> Result<Arc<dyn EmbeddingProvider>> {
        if let Some(provider) = self.provider.get() {
            return Ok(Arc::clone(provider));
        }

        let cell = Arc::clone(&self.provider);
        let factory = self.factory.clone();
        tokio::spawn(async move {
            cell.get_or_try_init(|| async move {
                let factory = factory.ok_or_else(|| {
                    RetrievalError::Embedding("no embedding provider configured".into())
                })?;
                tracing::info!("initializing embedding provider");
                let provider = tokio::task::spawn_blocking(move || factory())
                    .await?
                    .map_err(|e| RetrievalError::Embedding(format!("{e:#}")))?;
                tracing::info!(model = provider.model_id(), "embedding provider ready");
                Ok::<_, RetrievalError>(provider)
            })
            .await
            .map(Arc::clone)
        })
        .await?
    }

    /// Embed `query` and return a validated, flat vector.
    pub async fn embedding_vector(&self, query: &str) -> Result<Vec<f32>> {
        tracing::info!(query, "generating embedding for query");
        let provider = self.provider().await?;

        let output = provider
            .extract(query, &self.options)
            .await
            .map_err(|e| RetrievalError::Embedding(format!("{e:#}")))?;

        let vector = output.into_vector()?;
        tracing::debug!(
            len = vector.len(),
            sample = ?&vector[..vector.len().min(5)],
            "generated embedding"
        );

        validate_embedding(vector)
    }
}
