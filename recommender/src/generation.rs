//! Composed prompt → recommendation text.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::RecommendError;
use crate::ports::GenerationBackend;
use crate::prompt::GenerationRequest;

pub(crate) const GENERATION_FAILED: &str = "generation provider unavailable";

pub struct GenerationClient {
    backend: Arc<dyn GenerationBackend>,
}

impl GenerationClient {
    pub fn new(backend: Arc<dyn GenerationBackend>) -> Self {
        Self { backend }
    }

    /// # Errors
    /// `Generation` on provider failure (`GENERATION_FAILED`, cause logged) or
    /// when the model returns blank text.
    pub async fn generate(&self, request: &GenerationRequest) -> Result<String, RecommendError> {
        debug!(prompt_chars = request.as_str().len(), "requesting generation");

        let text = self
            .backend
            .generate(request.as_str())
            .await
            .map_err(|e| {
                warn!(error = %e, "generation provider call failed");
                RecommendError::Generation(GENERATION_FAILED.into())
            })?;

        if text.trim().is_empty() {
            return Err(RecommendError::Generation("model returned empty text".into()));
        }
        Ok(text)
    }
}
