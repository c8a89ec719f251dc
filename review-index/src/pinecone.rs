//! Pinecone REST client (data-plane query + control-plane describe).
//!
//! - `POST https://{host}/query` with `Api-Key` and `X-Pinecone-API-Version`
//! - `GET {controller}/indexes/{index}` to resolve the host and to probe readiness
//!
//! The data-plane host is resolved lazily and cached for the process lifetime.

use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::{debug, info, instrument, warn};

use crate::config::IndexConfig;
use crate::errors::{IndexError, snippet};
use crate::mappers::to_neighbor;
use crate::record::{IndexHealth, NeighborRecord};

const API_VERSION: &str = "2024-07";

pub struct PineconeClient {
    http: reqwest::Client,
    controller_url: String,
    index: String,
    namespace: String,
    host: OnceCell<String>,
}

impl PineconeClient {
    /// Builds the client; auth headers are attached to every request.
    ///
    /// # Errors
    /// `IndexError::Config` when the API key is missing or not a valid header value.
    pub fn new(cfg: &IndexConfig) -> Result<Self, IndexError> {
        let key = cfg
            .pinecone_api_key
            .as_deref()
            .ok_or_else(|| IndexError::Config("PINECONE_API_KEY is not set".into()))?;

        let mut key_value = HeaderValue::from_str(key)
            .map_err(|_| IndexError::Config("PINECONE_API_KEY contains invalid characters".into()))?;
        key_value.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert("Api-Key", key_value);
        headers.insert("X-Pinecone-API-Version", HeaderValue::from_static(API_VERSION));

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .default_headers(headers)
            .build()?;

        let host = OnceCell::new_with(cfg.pinecone_index_host.as_deref().map(normalize_host));

        Ok(Self {
            http,
            controller_url: cfg.pinecone_controller_url.trim_end_matches('/').to_string(),
            index: cfg.index.clone(),
            namespace: cfg.namespace.clone(),
            host,
        })
    }

    /// Queries the index for the `top_k` nearest neighbors with metadata.
    #[instrument(skip_all, fields(index = %self.index, namespace = %self.namespace, top_k = top_k))]
    pub async fn query(&self, vector: &[f32], top_k: u64) -> Result<Vec<NeighborRecord>, IndexError> {
        let host = self.host().await?;
        let url = format!("{host}/query");

        let body = QueryRequest {
            vector,
            top_k,
            include_metadata: true,
            include_values: false,
            namespace: &self.namespace,
        };

        debug!(dim = vector.len(), "POST {}", url);
        let resp = self.http.post(&url).json(&body).send().await?;
        if !resp.status().is_success() {
            return Err(status_error(resp, url).await);
        }

        let out: QueryResponse = resp
            .json()
            .await
            .map_err(|e| IndexError::Decode(format!("pinecone query: {e}")))?;

        let records: Vec<NeighborRecord> = out
            .matches
            .into_iter()
            .map(|m| to_neighbor(m.id, m.score, m.metadata))
            .collect();

        debug!(hits = records.len(), "pinecone query completed");
        Ok(records)
    }

    /// Describes the index and requires `status.ready`. Never fails.
    pub async fn health(&self) -> IndexHealth {
        let start = Instant::now();
        let res = self.describe().await;
        let latency_ms = start.elapsed().as_millis();

        let (ok, message) = match res {
            Ok(desc) if desc.status.ready => {
                info!(index = %self.index, latency_ms, "pinecone index ready");
                (true, "index is ready".to_string())
            }
            Ok(desc) => {
                let state = desc.status.state.unwrap_or_else(|| "unknown".into());
                warn!(index = %self.index, %state, "pinecone index not ready");
                (false, format!("index is not ready (state: {state})"))
            }
            Err(e) => {
                warn!(index = %self.index, error = %e, "pinecone describe failed");
                (false, e.to_string())
            }
        };

        IndexHealth {
            provider: "Pinecone".into(),
            endpoint: self.controller_url.clone(),
            index: self.index.clone(),
            ok,
            latency_ms,
            message,
        }
    }

    async fn host(&self) -> Result<&str, IndexError> {
        let host = self
            .host
            .get_or_try_init(|| async {
                let desc = self.describe().await?;
                let host = desc
                    .host
                    .filter(|h| !h.trim().is_empty())
                    .ok_or_else(|| IndexError::Decode("describe index: missing `host`".into()))?;
                info!(index = %self.index, %host, "resolved pinecone index host");
                Ok::<_, IndexError>(normalize_host(&host))
            })
            .await?;
        Ok(host.as_str())
    }

    async fn describe(&self) -> Result<DescribeIndexResponse, IndexError> {
        let url = format!("{}/indexes/{}", self.controller_url, self.index);
        debug!("GET {}", url);

        let resp = self.http.get(&url).send().await?;
        if !resp.status().is_success() {
            return Err(status_error(resp, url).await);
        }
        resp.json()
            .await
            .map_err(|e| IndexError::Decode(format!("describe index: {e}")))
    }
}

/// Accepts bare hosts as returned by the control plane as well as full URLs.
fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{host}")
    }
}

async fn status_error(resp: reqwest::Response, url: String) -> IndexError {
    let status = resp.status().as_u16();
    let text = resp.text().await.unwrap_or_default();
    IndexError::HttpStatus {
        status,
        url,
        snippet: snippet(&text),
    }
}

/* ==========================
HTTP payloads
========================== */

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: u64,
    include_metadata: bool,
    include_values: bool,
    namespace: &'a str,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Debug, Deserialize)]
struct QueryMatch {
    id: String,
    #[serde(default)]
    score: f32,
    #[serde(default)]
    metadata: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct DescribeIndexResponse {
    host: Option<String>,
    #[serde(default)]
    status: IndexStatus,
}

#[derive(Debug, Default, Deserialize)]
struct IndexStatus {
    #[serde(default)]
    ready: bool,
    state: Option<String>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn query_body_uses_wire_names() {
        let v = [0.1_f32, 0.2];
        let body = serde_json::to_value(QueryRequest {
            vector: &v,
            top_k: 3,
            include_metadata: true,
            include_values: false,
            namespace: "ns1",
        })
        .unwrap();

        assert_eq!(body["topK"], json!(3));
        assert_eq!(body["includeMetadata"], json!(true));
        assert_eq!(body["includeValues"], json!(false));
        assert_eq!(body["namespace"], json!("ns1"));
        assert_eq!(body["vector"].as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn decodes_matches_without_metadata() {
        let out: QueryResponse = serde_json::from_value(json!({
            "matches": [
                {"id": "Dr. A", "score": 0.9, "metadata": {"review": "great"}},
                {"id": "Dr. B", "score": 0.5}
            ],
            "namespace": "ns1"
        }))
        .unwrap();
        assert_eq!(out.matches.len(), 2);
        assert!(out.matches[1].metadata.is_none());

        let empty: QueryResponse = serde_json::from_value(json!({"namespace": "ns1"})).unwrap();
        assert!(empty.matches.is_empty());
    }

    #[test]
    fn host_normalization() {
        assert_eq!(normalize_host("rag-x.svc.pinecone.io"), "https://rag-x.svc.pinecone.io");
        assert_eq!(normalize_host("http://localhost:5080/"), "http://localhost:5080");
    }

    #[test]
    fn describe_status_defaults_to_not_ready() {
        let d: DescribeIndexResponse =
            serde_json::from_value(json!({"name": "rag", "host": "h"})).unwrap();
        assert!(!d.status.ready);
        assert_eq!(d.host.as_deref(), Some("h"));
    }
}
