//! Clinical evidence retrieval over a Pinecone index.
//!
//! `findings` embeds a natural-language query, asks a managed vector index for
//! its nearest neighbours, and renders the matched passages as numbered
//! "Clinical Finding" entries ready to paste into a prompt.
//!
//! # Pipeline
//!
//! 1. **Embed**: [`embedding::Embedder`] lazily loads one feature-extraction
//!    model per process (local ONNX Runtime or a remote endpoint), runs it with
//!    mean pooling and normalization, and flattens whatever shape comes back.
//! 2. **Query**: [`index::PineconeClient`] resolves the index host and queries
//!    a namespace for the top-k matches with metadata.
//! 3. **Render**: [`retrieval::render`] joins each match's `metadata.chunk`.
//!
//! [`retrieval::query_vector_store`] runs all three and always yields a
//! `String`: passages, `<nomatches>`, or `<error: ...>`.
//!
//! # Modules
//!
//! - [`config`] — Configuration loading from TOML files and environment variables
//! - [`embedding`] — Embedding providers and the lazily-initialized embedder
//! - [`error`] — The [`error::RetrievalError`] type
//! - [`index`] — Pinecone client, namespace-scoped queries, match probing
//! - [`retrieval`] — The end-to-end query → formatted passages pipeline

pub mod config;
pub mod embedding;
pub mod error;
pub mod index;
pub mod retrieval;

pub use error::RetrievalError;
pub use retrieval::{query_vector_store, Retriever};
