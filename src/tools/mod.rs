pub mod query_vector_store;

use query_vector_store::QueryVectorStoreParams;
use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::{tool, tool_handler, tool_router, ServerHandler};
use std::sync::Arc;

use findings::retrieval::Retriever;

/// The findings MCP tool handler. Holds the shared retriever and exposes
/// the retrieval pipeline via the `#[tool_router]` macro.
#[derive(Clone)]
pub struct FindingsTools {
    tool_router: ToolRouter<Self>,
    retriever: Arc<Retriever>,
}

#[tool_router]
impl FindingsTools {
    pub fn new(retriever: Arc<Retriever>) -> Self {
        Self {
            tool_router: Self::tool_router(),
            retriever,
        }
    }

    /// Retrieve the passages most relevant to a query as numbered clinical findings.
    #[tool(description = "Search the clinical evidence index with a natural-language query. Returns numbered 'Clinical Finding' passages, '<nomatches>' when nothing matched, or '<error: ...>' on failure.")]
    async fn query_vector_store(
        &self,
        Parameters(params): Parameters<QueryVectorStoreParams>,
    ) -> Result<String, String> {
        tracing::info!(
            query_len = params.query.len(),
            index = ?params.index_name,
            namespace = ?params.namespace,
            top_k = ?params.top_k,
            "query_vector_store called"
        );

        let answer = self
            .retriever
            .retrieve(&params.query, &params.overrides())
            .await;
        Ok(answer)
    }
}

#[tool_handler]
impl ServerHandler for FindingsTools {
    fn get_info(&self) -> rmcp::model::ServerInfo {
        rmcp::model::ServerInfo {
            instructions: Some(
                "findings retrieves clinical evidence passages from a vector index. \
                 Call query_vector_store with a natural-language question and cite the \
                 returned findings in your answer."
                    .into(),
            ),
            capabilities: rmcp::model::ServerCapabilities::builder()
                .enable_tools()
                .build(),
            ..Default::default()
        }
    }
}
