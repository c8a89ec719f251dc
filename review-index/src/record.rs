//! Core data models returned by the index.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

/// One nearest neighbor: a professor with the review that matched.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NeighborRecord {
    /// Professor name (or the point id when no name is stored).
    pub id: String,
    /// Similarity score as reported by the index; higher is closer.
    pub score: f32,
    pub metadata: ReviewMetadata,
}

/// Review metadata stored alongside each vector.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ReviewMetadata {
    pub review: String,
    pub subject: String,
    /// `None` when the record carries no usable rating.
    pub stars: Option<f64>,
    /// Any other payload fields, kept for diagnostics.
    pub extra: BTreeMap<String, Value>,
}

/// Result of probing the index backend.
#[derive(Clone, Debug, Serialize)]
pub struct IndexHealth {
    /// "Pinecone" or "Qdrant".
    pub provider: String,
    pub endpoint: String,
    pub index: String,
    pub ok: bool,
    pub latency_ms: u128,
    pub message: String,
}
