//! Error type for the retrieval pipeline.
//!
//! Every variant is eventually rendered into the `<error: ...>` sentinel by
//! [`crate::retrieval::query_vector_store`], so the `Display` text is what callers see.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RetrievalError {
    /// The normalized embedding had one or zero dimensions.
    #[error("Invalid embedding generated: dimension too small")]
    InvalidEmbedding { dimensions: usize },

    /// Provider output could not be coerced into a flat numeric vector.
    #[error("unexpected embedding output shape: {0}")]
    EmbeddingShape(String),

    /// Provider initialization or inference failed.
    #[error("embedding failed: {0}")]
    Embedding(String),

    /// The vector index answered with a non-success status.
    #[error("vector index returned HTTP {status}: {body}")]
    Index { status: u16, body: String },

    /// A successful query answered with a body that is not a query response.
    #[error("malformed query response from vector index: {0}")]
    MalformedResponse(String),

    /// The index description did not carry a data-plane host.
    #[error("no host available for index '{0}'")]
    IndexHost(String),

    #[error("request to vector index failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

pub type Result<T, E = RetrievalError> = std::result::Result<T, E>;
