//! Retrieval-augmented professor recommendations.
//!
//! Public entry point: [`Pipeline::recommend`]. It embeds the student's query,
//! fetches the top-K most similar professor reviews, renders them as grounding
//! context, and asks the generation model for a recommendation.
//!
//! Providers sit behind the traits in [`ports`]; production bindings for
//! `ai_llm_service::LlmServiceProfiles` and `review_index::ReviewIndex` live in
//! `backends`.

mod api_types;
mod backends;
mod cfg;
mod context;
mod embedding;
mod error;
mod generation;
mod pipeline;
pub mod ports;
mod prompt;
mod retrieval;

pub use api_types::{ChatMessage, Query, RecommendOptions};
pub use cfg::{DEFAULT_TOP_K, RecommenderConfig};
pub use context::{ContextBlock, assemble};
pub use embedding::EmbeddingClient;
pub use error::RecommendError;
pub use generation::GenerationClient;
pub use pipeline::{Pipeline, Stage};
pub use prompt::{DEFAULT_SYSTEM, GenerationRequest, build};
pub use retrieval::SimilaritySearchClient;
