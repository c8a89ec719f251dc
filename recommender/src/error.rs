//! Typed error for the recommender crate.

use thiserror::Error;

use crate::pipeline::Stage;

/// Why a recommendation could not be produced.
///
/// Every variant aborts the pipeline; nothing is retried.
#[derive(Debug, Error)]
pub enum RecommendError {
    /// Empty query, empty transcript, or a non-positive `k`.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The embedding model answered with something other than a flat numeric vector.
    #[error("malformed embedding: {0}")]
    MalformedEmbedding(String),

    /// The vector index could not be queried.
    #[error("retrieval failed: {0}")]
    Retrieval(String),

    /// The generation model failed or produced no text.
    #[error("generation failed: {0}")]
    Generation(String),

    /// Bad or missing startup configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The request deadline passed while `stage` was in flight.
    #[error("deadline exceeded during {stage}")]
    Timeout { stage: Stage },
}

impl RecommendError {
    /// Stable machine-readable code for transport layers.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::MalformedEmbedding(_) => "MALFORMED_EMBEDDING",
            Self::Retrieval(_) => "RETRIEVAL_ERROR",
            Self::Generation(_) => "GENERATION_ERROR",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::Timeout { .. } => "TIMEOUT",
        }
    }
}
