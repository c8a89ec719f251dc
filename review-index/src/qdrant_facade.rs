//! Thin adapter around `qdrant-client` to isolate API usage.
//!
//! Only the read path lives here: namespaced nearest-neighbor search and a
//! collection probe for health checks.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use qdrant_client::Qdrant;
use qdrant_client::qdrant::{
    PointId, SearchPointsBuilder, Value as QValue, point_id::PointIdOptions, value::Kind,
};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::config::IndexConfig;
use crate::errors::IndexError;
use crate::filters::namespace_filter;
use crate::mappers::to_neighbor_from_payload;
use crate::record::{IndexHealth, NeighborRecord};

/// A facade over the Qdrant client scoped to one collection and namespace.
pub struct QdrantFacade {
    client: Qdrant,
    url: String,
    collection: String,
    namespace: String,
}

impl QdrantFacade {
    /// Creates a new facade from the given configuration.
    ///
    /// Supports optional API key authentication.
    pub fn new(cfg: &IndexConfig) -> Result<Self, IndexError> {
        let mut builder =
            Qdrant::from_url(&cfg.qdrant_url).timeout(Duration::from_secs(cfg.timeout_secs));
        if let Some(key) = &cfg.qdrant_api_key {
            builder = builder.api_key(key.clone());
        }
        let client = builder
            .build()
            .map_err(|e| IndexError::Qdrant(e.to_string()))?;

        Ok(Self {
            client,
            url: cfg.qdrant_url.clone(),
            collection: cfg.index.clone(),
            namespace: cfg.namespace.clone(),
        })
    }

    /// Performs a similarity search restricted to the configured namespace.
    ///
    /// Payloads are always requested; results come back in Qdrant's order.
    pub async fn search(
        &self,
        vector: &[f32],
        top_k: u64,
    ) -> Result<Vec<NeighborRecord>, IndexError> {
        debug!(
            collection = %self.collection,
            namespace = %self.namespace,
            top_k,
            dim = vector.len(),
            "qdrant search"
        );

        let builder = SearchPointsBuilder::new(&self.collection, vector.to_vec(), top_k)
            .with_payload(true)
            .filter(namespace_filter(&self.namespace));

        let res = self
            .client
            .search_points(builder)
            .await
            .map_err(|e| IndexError::Qdrant(e.to_string()))?;

        let out: Vec<NeighborRecord> = res
            .result
            .into_iter()
            .map(|p| {
                let id = p.id.and_then(point_id_text);
                to_neighbor_from_payload(id, p.score, payload_to_json(p.payload))
            })
            .collect();

        debug!(hits = out.len(), "qdrant search completed");
        Ok(out)
    }

    /// Probes the collection. Never fails; errors become `ok = false`.
    pub async fn health(&self) -> IndexHealth {
        let start = Instant::now();
        let res = self.client.collection_info(&self.collection).await;
        let latency_ms = start.elapsed().as_millis();

        let (ok, message) = match res {
            Ok(info) => {
                let points = info.result.and_then(|r| r.points_count);
                info!(collection = %self.collection, ?points, latency_ms, "qdrant collection reachable");
                (
                    true,
                    match points {
                        Some(n) => format!("collection reachable ({n} points)"),
                        None => "collection reachable".to_string(),
                    },
                )
            }
            Err(e) => {
                warn!(collection = %self.collection, error = %e, "qdrant collection probe failed");
                (false, e.to_string())
            }
        };

        IndexHealth {
            provider: "Qdrant".into(),
            endpoint: self.url.clone(),
            index: self.collection.clone(),
            ok,
            latency_ms,
            message,
        }
    }
}

fn point_id_text(id: PointId) -> Option<String> {
    match id.point_id_options? {
        PointIdOptions::Num(n) => Some(n.to_string()),
        PointIdOptions::Uuid(u) => Some(u),
    }
}

/// Converts a Qdrant payload (`HashMap<String, qdrant::Value>`) into a JSON object.
fn payload_to_json(payload: HashMap<String, QValue>) -> Value {
    Value::Object(
        payload
            .into_iter()
            .map(|(k, v)| (k, qvalue_to_json(v)))
            .collect::<Map<_, _>>(),
    )
}

fn qvalue_to_json(v: QValue) -> Value {
    match v.kind {
        Some(Kind::StringValue(s)) => Value::String(s),
        Some(Kind::IntegerValue(i)) => Value::Number(i.into()),
        Some(Kind::DoubleValue(f)) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        Some(Kind::BoolValue(b)) => Value::Bool(b),
        Some(Kind::ListValue(list)) => {
            Value::Array(list.values.into_iter().map(qvalue_to_json).collect())
        }
        Some(Kind::StructValue(st)) => payload_to_json(st.fields),
        Some(Kind::NullValue(_)) | None => Value::Null,
    }
}
