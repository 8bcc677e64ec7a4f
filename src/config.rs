use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::embedding::Pooling;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct FindingsConfig {
    pub server: ServerConfig,
    pub embedding: EmbeddingConfig,
    pub index: IndexConfig,
    pub retrieval: RetrievalConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub transport: String,
    pub log_level: String,
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// `"local"` (ONNX Runtime) or `"remote"` (feature-extraction HTTP endpoint).
    pub provider: String,
    pub model: String,
    pub revision: String,
    pub quantized: bool,
    pub pooling: Pooling,
    pub normalize: bool,
    pub cache_dir: String,
    /// Feature-extraction URL, only used by the remote provider.
    pub endpoint: String,
    pub api_token: Option<String>,
    /// Request timeout for the remote provider.
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct IndexConfig {
    pub api_key: String,
    pub controller_url: String,
    pub api_version: String,
    pub index_name: String,
    pub namespace: String,
    /// Data-plane host. When set, index host resolution is skipped.
    pub host: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RetrievalConfig {
    pub top_k: usize,
    pub finding_label: String,
    pub placeholder: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            transport: "stdio".into(),
            log_level: "info".into(),
            host: "127.0.0.1".into(),
            port: 8765,
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        let cache_dir = default_findings_dir()
            .join("models")
            .to_string_lossy()
            .into_owned();
        Self {
            provider: "local".into(),
            model: "mixedbread-ai/mxbai-embed-large-v1".into(),
            revision: "main".into(),
            quantized: false,
            pooling: Pooling::Mean,
            normalize: true,
            cache_dir,
            endpoint: String::new(),
            api_token: None,
            timeout_secs: 120,
        }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            controller_url: "https://api.pinecone.io".into(),
            api_version: "2024-07".into(),
            index_name: String::new(),
            namespace: String::new(),
            host: None,
            timeout_secs: 60,
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: crate::retrieval::DEFAULT_TOP_K,
            finding_label: "Clinical Finding".into(),
            placeholder: "No chunk content".into(),
        }
    }
}

/// Returns `~/.findings/`
pub fn default_findings_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(".findings")
}

/// Returns the default config file path: `~/.findings/config.toml`
pub fn default_config_path() -> PathBuf {
    default_findings_dir().join("config.toml")
}

impl FindingsConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            FindingsConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("FINDINGS_LOG_LEVEL") {
            self.server.log_level = val;
        }
        if let Ok(val) = std::env::var("PINECONE_API_KEY") {
            self.index.api_key = val;
        }
        if let Ok(val) = std::env::var("PINECONE_INDEX_NAME") {
            self.index.index_name = val;
        }
        if let Ok(val) = std::env::var("PINECONE_NAMESPACE") {
            self.index.namespace = val;
        }
        if let Ok(val) = std::env::var("PINECONE_INDEX_HOST") {
            self.index.host = Some(val);
        }
        if let Ok(val) = std::env::var("HF_TOKEN") {
            self.embedding.api_token = Some(val);
        }
    }
}

impl EmbeddingConfig {
    /// Directory holding `model.onnx` and `tokenizer.json` for the configured model and revision.
    pub fn model_dir(&self) -> PathBuf {
        expand_tilde(&self.cache_dir)
            .join(self.model.replace('/', "--"))
            .join(&self.revision)
    }

    /// File name of the ONNX graph inside the model repository's `onnx/` folder.
    pub fn onnx_file_name(&self) -> &'static str {
        if self.quantized {
            "model_quantized.onnx"
        } else {
            "model.onnx"
        }
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}
