//! Pinecone vector index client.
//!
//! Queries are issued through scoped handles that mirror the service's own
//! model: `client.index(name).namespace(ns).query(request)`. The namespace is
//! a property of the handle, never a per-call argument.

pub mod matches;

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;

pub use matches::{probe_field, FieldProbe, Match, ID_FIELDS, SCORE_FIELDS};

use crate::config::IndexConfig;
use crate::error::{Result, RetrievalError};

/// Parameters of a nearest-neighbour query.
#[derive(Debug, Clone)]
pub struct QueryRequest {
    pub vector: Vec<f32>,
    pub top_k: usize,
    pub include_metadata: bool,
}

impl QueryRequest {
    pub fn new(vector: Vec<f32>, top_k: usize) -> Self {
        Self {
            vector,
            top_k,
            include_metadata: true,
        }
    }
}

/// Matches in the order the index ranked them.
#[derive(Debug, Clone)]
pub struct QueryResponse {
    pub matches: Vec<Match>,
    pub namespace: Option<String>,
    /// Body as received, kept for diagnostics.
    pub raw: Value,
}

/// Subset of the control-plane index description.
#[derive(Debug, Clone, Deserialize)]
pub struct IndexDescription {
    pub name: String,
    pub dimension: Option<usize>,
    pub metric: Option<String>,
    pub host: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireQuery<'a> {
    namespace: &'a str,
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
    include_values: bool,
}

#[derive(Deserialize)]
struct WireQueryResponse {
    #[serde(default)]
    matches: Vec<Value>,
    namespace: Option<String>,
}

pub struct PineconeClient {
    http: reqwest::Client,
    api_key: String,
    api_version: String,
    controller_url: String,
    host_override: Option<String>,
    hosts: RwLock<HashMap<String, String>>,
}

impl PineconeClient {
    pub fn new(config: &IndexConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(RetrievalError::Config(
                "Pinecone API key is not set (index.api_key or PINECONE_API_KEY)".into(),
            ));
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            api_key: config.api_key.clone(),
            api_version: config.api_version.clone(),
            controller_url: config.controller_url.trim_end_matches('/').to_string(),
            host_override: config.host.clone(),
            hosts: RwLock::new(HashMap::new()),
        })
    }

    /// Handle for the named index. No request is made until it is used.
    pub fn index(&self, name: &str) -> Index<'_> {
        Index {
            client: self,
            name: name.to_string(),
        }
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, url)
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", &self.api_version)
    }

    async fn describe(&self, name: &str) -> Result<IndexDescription> {
        let url = format!("{}/indexes/{}", self.controller_url, name);
        let response = self.request(reqwest::Method::GET, &url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RetrievalError::Index {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json().await?)
    }

    async fn resolve_host(&self, name: &str) -> Result<String> {
        if let Some(host) = &self.host_override {
            return Ok(normalize_host(host));
        }
        if let Some(host) = self.hosts.read().await.get(name) {
            return Ok(host.clone());
        }

        let description = self.describe(name).await?;
        let host = description
            .host
            .as_deref()
            .filter(|h| !h.is_empty())
            .map(normalize_host)
            .ok_or_else(|| RetrievalError::IndexHost(name.to_string()))?;

        tracing::debug!(index = name, host = %host, "resolved index host");
        self.hosts
            .write()
            .await
            .insert(name.to_string(), host.clone());
        Ok(host)
    }
}

/// Prefix scheme-less hosts with `https://` and drop trailing slashes.
fn normalize_host(host: &str) -> String {
    let host = host.trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{host}")
    }
}

/// A named index.
pub struct Index<'a> {
    client: &'a PineconeClient,
    name: String,
}

impl<'a> Index<'a> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Scope subsequent operations to `namespace`.
    pub fn namespace(&self, namespace: &str) -> Namespace<'a> {
        Namespace {
            client: self.client,
            index: self.name.clone(),
            namespace: namespace.to_string(),
        }
    }

    /// Fetch the control-plane description of this index.
    pub async fn describe(&self) -> Result<IndexDescription> {
        self.client.describe(&self.name).await
    }
}

/// A namespace within an index.
pub struct Namespace<'a> {
    client: &'a PineconeClient,
    index: String,
    namespace: String,
}

impl Namespace<'_> {
    pub fn name(&self) -> &str {
        &self.namespace
    }

    /// Nearest-neighbour query. Matches come back unmodified and in ranked order.
    pub async fn query(&self, request: &QueryRequest) -> Result<QueryResponse> {
        let host = self.client.resolve_host(&self.index).await?;
        let url = format!("{host}/query");

        let body = WireQuery {
            namespace: &self.namespace,
            vector: &request.vector,
            top_k: request.top_k,
            include_metadata: request.include_metadata,
            include_values: false,
        };

        let response = self
            .client
            .request(reqwest::Method::POST, &url)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RetrievalError::Index {
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await?;
        let raw: Value = serde_json::from_str(&text)
            .map_err(|e| RetrievalError::MalformedResponse(e.to_string()))?;
        let wire: WireQueryResponse = serde_json::from_value(raw.clone())
            .map_err(|e| RetrievalError::MalformedResponse(e.to_string()))?;

        if let Some(read_units) = raw.pointer("/usage/readUnits") {
            tracing::debug!(%read_units, "query usage");
        }

        Ok(QueryResponse {
            matches: wire.matches.into_iter().map(Match::from_value).collect(),
            namespace: wire.namespace,
            raw,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hosts_get_a_scheme() {
        assert_eq!(
            normalize_host("notes-abc123.svc.us-east-1.pinecone.io"),
            "https://notes-abc123.svc.us-east-1.pinecone.io"
        );
        assert_eq!(normalize_host("http://127.0.0.1:9000/"), "http://127.0.0.1:9000");
    }

    #[test]
    fn wire_query_uses_camel_case() {
        let vector = [0.1f32, 0.2];
        let body = serde_json::to_value(WireQuery {
            namespace: "cardiology",
            vector: &vector,
            top_k: 5,
            include_metadata: true,
            include_values: false,
        })
        .unwrap();
        assert_eq!(body["topK"], 5);
        assert_eq!(body["includeMetadata"], true);
        assert_eq!(body["includeValues"], false);
        assert_eq!(body["namespace"], "cardiology");
    }

    #[test]
    fn missing_api_key_is_a_config_error() {
        let err = PineconeClient::new(&IndexConfig::default()).err().unwrap();
        assert!(matches!(err, RetrievalError::Config(_)));
    }
}
