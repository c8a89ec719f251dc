//! One-operation backend traits the pipeline depends on.
//!
//! Futures are boxed so the traits stay object-safe and can be shared as
//! `Arc<dyn ...>` across concurrent requests.

use std::future::Future;
use std::pin::Pin;

use review_index::NeighborRecord;
use serde_json::Value;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Error type crossing the backend seam; the clients log it and surface a stage-level reason.
pub type BackendError = Box<dyn std::error::Error + Send + Sync>;

/// Text → raw provider embedding payload (validated by `EmbeddingClient`).
pub trait EmbeddingBackend: Send + Sync {
    fn embed<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<Value, BackendError>>;
}

/// Vector → nearest review records, metadata included.
pub trait SearchBackend: Send + Sync {
    fn query<'a>(
        &'a self,
        vector: &'a [f32],
        top_k: u64,
    ) -> BoxFuture<'a, Result<Vec<NeighborRecord>, BackendError>>;
}

/// Prompt → generated text.
pub trait GenerationBackend: Send + Sync {
    fn generate<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<String, BackendError>>;
}
