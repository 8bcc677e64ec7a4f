//! MCP `query_vector_store` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use findings::retrieval::QueryOverrides;

/// Upper bound on `top_k` accepted from tool callers.
pub const MAX_TOP_K: usize = 50;

/// Parameters for the `query_vector_store` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct QueryVectorStoreParams {
    /// Natural-language query describing the findings to retrieve.
    #[schemars(description = "Natural-language query describing the clinical findings to retrieve")]
    pub query: String,

    #[schemars(description = "Pinecone index name. Defaults to the configured index.")]
    pub index_name: Option<String>,

    #[schemars(description = "Namespace within the index. Defaults to the configured namespace.")]
    pub namespace: Option<String>,

    /// Number of passages to return (1–50). Defaults to 5.
    #[schemars(description = "Number of passages to return (1-50). Defaults to 5.")]
    pub top_k: Option<usize>,
}

impl QueryVectorStoreParams {
    pub fn overrides(&self) -> QueryOverrides {
        QueryOverrides {
            index_name: self.index_name.clone(),
            namespace: self.namespace.clone(),
            top_k: self.top_k.map(|k| k.clamp(1, MAX_TOP_K)),
        }
    }
}
