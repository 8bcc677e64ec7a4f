//! Query → ranked evidence passages.
//!
//! [`query_vector_store`] composes the three stages (embed, query, render)
//! and never fails: embedding and index errors come back as an
//! `<error: ...>` string, an empty result as `<nomatches>`.

pub mod render;

use crate::config::FindingsConfig;
use crate::embedding::Embedder;
use crate::error::{Result, RetrievalError};
use crate::index::{Match, PineconeClient, QueryRequest};

pub use render::{render, RenderStyle, NO_MATCHES, SEPARATOR};

/// Default number of neighbours requested from the index.
pub const DEFAULT_TOP_K: usize = 5;

/// Embed `query`, search `namespace` of `index_name`, and render the top `top_k`
/// matches as numbered clinical findings.
pub async fn query_vector_store(
    client: &PineconeClient,
    embedder: &Embedder,
    index_name: &str,
    namespace: &str,
    query: &str,
    top_k: usize,
) -> String {
    let style = RenderStyle::default();
    run(client, embedder, index_name, namespace, query, top_k, &style).await
}

async fn run(
    client: &PineconeClient,
    embedder: &Embedder,
    index_name: &str,
    namespace: &str,
    query: &str,
    top_k: usize,
    style: &RenderStyle,
) -> String {
    match try_query(client, embedder, index_name, namespace, query, top_k).await {
        Ok(matches) => render(&matches, style),
        Err(e) => {
            tracing::error!(error = %e, index = index_name, namespace, "error in vector store query");
            error_sentinel(&e)
        }
    }
}

async fn try_query(
    client: &PineconeClient,
    embedder: &Embedder,
    index_name: &str,
    namespace: &str,
    query: &str,
    top_k: usize,
) -> Result<Vec<Match>> {
    if index_name.is_empty() {
        return Err(RetrievalError::Config("no index name given".into()));
    }

    let vector = embedder.embedding_vector(query).await?;

    let response = client
        .index(index_name)
        .namespace(namespace)
        .query(&QueryRequest::new(vector, top_k))
        .await?;

    tracing::info!(matches = response.matches.len(), "query response received");
    tracing::trace!(response = %response.raw, "full query response");
    log_matches(&response.matches);

    Ok(response.matches)
}

fn log_matches(matches: &[Match]) {
    for (i, m) in matches.iter().enumerate() {
        tracing::debug!(
            chunk = i + 1,
            id = %m.probe_id(),
            score = %m.probe_score(),
            metadata = ?m.metadata,
            content = m.chunk().unwrap_or("No chunk content"),
            "fetched chunk"
        );
    }
}

/// Textual form of a failure, as returned to callers.
pub fn error_sentinel(err: &RetrievalError) -> String {
    format!("<error: {err}>")
}

/// Per-call adjustments to the configured query target.
#[derive(Debug, Clone, Default)]
pub struct QueryOverrides {
    pub index_name: Option<String>,
    pub namespace: Option<String>,
    pub top_k: Option<usize>,
}

/// Long-lived retrieval service: one index client, one embedder, and the
/// configured defaults.
pub struct Retriever {
    client: PineconeClient,
    embedder: Embedder,
    index_name: String,
    namespace: String,
    top_k: usize,
    style: RenderStyle,
}

impl Retriever {
    pub fn new(client: PineconeClient, embedder: Embedder, config: &FindingsConfig) -> Self {
        Self {
            client,
            embedder,
            index_name: config.index.index_name.clone(),
            namespace: config.index.namespace.clone(),
            top_k: config.retrieval.top_k,
            style: RenderStyle::from(&config.retrieval),
        }
    }

    /// Build the index client and a lazily-initialized embedder from config.
    pub fn from_config(config: &FindingsConfig) -> Result<Self> {
        let client = PineconeClient::new(&config.index)?;
        let embedder = Embedder::new(&config.embedding);
        Ok(Self::new(client, embedder, config))
    }

    /// Run the pipeline against the configured target. Always returns a string.
    pub async fn retrieve(&self, query: &str, overrides: &QueryOverrides) -> String {
        let index_name = overrides.index_name.as_deref().unwrap_or(&self.index_name);
        let namespace = overrides.namespace.as_deref().unwrap_or(&self.namespace);
        let top_k = overrides.top_k.unwrap_or(self.top_k);

        run(
            &self.client,
            &self.embedder,
            index_name,
            namespace,
            query,
            top_k,
            &self.style,
        )
        .await
    }
}
