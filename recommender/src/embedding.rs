//! Query text → embedding vector, with shape validation.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::RecommendError;
use crate::ports::EmbeddingBackend;

/// Reported in place of the provider error, which may carry URLs and response bodies.
pub(crate) const EMBEDDING_FAILED: &str = "embedding provider unavailable";

pub struct EmbeddingClient {
    backend: Arc<dyn EmbeddingBackend>,
}

impl EmbeddingClient {
    pub fn new(backend: Arc<dyn EmbeddingBackend>) -> Self {
        Self { backend }
    }

    /// Embeds `text` with one backend call.
    ///
    /// # Errors
    /// - `InvalidInput` for blank text (no call is made)
    /// - `MalformedEmbedding` when the payload is not a non-empty array of numbers
    /// - `Retrieval` with `EMBEDDING_FAILED` when the provider call itself fails
    ///   (embedding is the first half of retrieval); the cause is only logged
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, RecommendError> {
        if text.trim().is_empty() {
            return Err(RecommendError::InvalidInput(
                "cannot embed empty text".into(),
            ));
        }

        let raw = self
            .backend
            .embed(text)
            .await
            .map_err(|e| {
                warn!(error = %e, "embedding provider call failed");
                RecommendError::Retrieval(EMBEDDING_FAILED.into())
            })?;

        let vector = to_vector(raw)?;
        debug!(dim = vector.len(), "embedding received");
        Ok(vector)
    }
}

/// Accepts only a flat, non-empty array whose elements are all JSON numbers.
fn to_vector(raw: Value) -> Result<Vec<f32>, RecommendError> {
    let Value::Array(items) = raw else {
        return Err(RecommendError::MalformedEmbedding(format!(
            "expected an array of numbers, got {}",
            kind_of(&raw)
        )));
    };
    if items.is_empty() {
        return Err(RecommendError::MalformedEmbedding("embedding is empty".into()));
    }

    items
        .iter()
        .enumerate()
        .map(|(i, v)| {
            v.as_f64().map(|f| f as f32).ok_or_else(|| {
                RecommendError::MalformedEmbedding(format!(
                    "element {i} is {}, expected a number",
                    kind_of(v)
                ))
            })
        })
        .collect()
}

fn kind_of(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
