//! Shared LLM service with two active profiles: `embedding` and `generation`.
//!
//! - Lives in the same Tokio runtime as the application.
//! - Construct once at startup, wrap in `Arc`, and pass clones to dependents.
//! - Provider clients are built eagerly, so bad credentials/endpoints surface
//!   as startup errors rather than on the first request.
//!
//! # Example
//! ```no_run
//! use std::sync::Arc;
//! use ai_llm_service::{LlmProfilesConfig, LlmServiceProfiles};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cfg = LlmProfilesConfig::from_env()?;
//! let svc = Arc::new(LlmServiceProfiles::new(cfg, Some(10))?);
//!
//! let raw = svc.embed("lenient grader").await?;
//! println!("embedding payload = {raw}");
//!
//! let txt = svc.generate("Recommend a professor.").await?;
//! println!("{txt}");
//! # Ok(()) }
//! ```

use std::sync::Arc;

use serde_json::Value;

use crate::{
    config::{
        default_config::LlmProfilesConfig, llm_model_config::LlmModelConfig,
        llm_provider::LlmProvider,
    },
    error_handler::AiLlmError,
    health_service::{HealthService, HealthStatus},
    services::{gemini_service::GeminiService, ollama_service::OllamaService},
};

/// Provider client bound to exactly one model profile.
enum ProfileClient {
    Gemini(Arc<GeminiService>),
    Ollama(Arc<OllamaService>),
}

impl ProfileClient {
    fn build(cfg: &LlmModelConfig) -> Result<Self, AiLlmError> {
        Ok(match cfg.provider {
            LlmProvider::Gemini => Self::Gemini(Arc::new(GeminiService::new(cfg.clone())?)),
            LlmProvider::Ollama => Self::Ollama(Arc::new(OllamaService::new(cfg.clone())?)),
        })
    }
}

/// Shared service that manages the **embedding** and **generation** profiles.
pub struct LlmServiceProfiles {
    embedding: LlmModelConfig,
    generation: LlmModelConfig,

    embedding_client: ProfileClient,
    generation_client: ProfileClient,

    health: HealthService,
}

impl LlmServiceProfiles {
    /// Creates the service and its provider clients.
    ///
    /// - `cfg`: validated embedding + generation profiles.
    /// - `health_timeout_secs`: optional timeout for the health checker.
    ///
    /// # Errors
    /// Returns [`AiLlmError`] if a provider client cannot be constructed.
    pub fn new(cfg: LlmProfilesConfig, health_timeout_secs: Option<u64>) -> Result<Self, AiLlmError> {
        let embedding_client = ProfileClient::build(&cfg.embedding)?;
        let generation_client = ProfileClient::build(&cfg.generation)?;

        Ok(Self {
            embedding: cfg.embedding,
            generation: cfg.generation,
            embedding_client,
            generation_client,
            health: HealthService::new(health_timeout_secs)?,
        })
    }

    /// Generates text using the **generation** profile.
    ///
    /// # Errors
    /// Returns [`AiLlmError`] if generation fails or the model returns no text.
    pub async fn generate(&self, prompt: &str) -> Result<String, AiLlmError> {
        match &self.generation_client {
            ProfileClient::Gemini(cli) => cli.generate_content(prompt).await,
            ProfileClient::Ollama(cli) => cli.generate(prompt).await,
        }
    }

    /// Computes an embedding using the **embedding** profile.
    ///
    /// Returns the provider's raw vector payload; shape validation is up to the caller.
    ///
    /// # Errors
    /// Returns [`AiLlmError`] on transport/provider failure.
    pub async fn embed(&self, input: &str) -> Result<Value, AiLlmError> {
        match &self.embedding_client {
            ProfileClient::Gemini(cli) => cli.embed_content(input).await,
            ProfileClient::Ollama(cli) => cli.embeddings(input).await,
        }
    }

    /// Returns a health snapshot for both profiles.
    pub async fn health_all(&self) -> Vec<HealthStatus> {
        self.health
            .check_many(&[self.embedding.clone(), self.generation.clone()])
            .await
    }

    /// Returns references to the current profiles `(embedding, generation)`.
    pub fn profiles(&self) -> (&LlmModelConfig, &LlmModelConfig) {
        (&self.embedding, &self.generation)
    }
}
