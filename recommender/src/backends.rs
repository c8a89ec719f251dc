//! Production bindings of the backend traits.

use ai_llm_service::LlmServiceProfiles;
use review_index::{NeighborRecord, ReviewIndex};
use serde_json::Value;

use crate::ports::{BackendError, BoxFuture, EmbeddingBackend, GenerationBackend, SearchBackend};

impl EmbeddingBackend for LlmServiceProfiles {
    fn embed<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<Value, BackendError>> {
        Box::pin(async move { LlmServiceProfiles::embed(self, text).await.map_err(Into::into) })
    }
}

impl GenerationBackend for LlmServiceProfiles {
    fn generate<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<String, BackendError>> {
        Box::pin(async move {
            LlmServiceProfiles::generate(self, prompt)
                .await
                .map_err(Into::into)
        })
    }
}

impl SearchBackend for ReviewIndex {
    fn query<'a>(
        &'a self,
        vector: &'a [f32],
        top_k: u64,
    ) -> BoxFuture<'a, Result<Vec<NeighborRecord>, BackendError>> {
        Box::pin(async move {
            ReviewIndex::query(self, vector, top_k)
                .await
                .map_err(Into::into)
        })
    }
}
