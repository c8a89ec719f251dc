use std::fmt;

use crate::config::llm_provider::LlmProvider;

/// Configuration for a single model profile (embedding or generation).
///
/// # Fields
///
/// - `provider`: Which backend to use (Gemini, Ollama).
/// - `model`: The model identifier (e.g., `"gemini-1.5-flash"`, `"text-embedding-004"`).
/// - `endpoint`: Base URL of the provider API.
/// - `api_key`: API key for providers that require authentication.
/// - `max_tokens`: Maximum number of tokens to generate (generation only).
/// - `temperature`: Controls randomness (0.0 = deterministic).
/// - `top_p`: Nucleus sampling cutoff.
/// - `timeout_secs`: Per-request timeout in seconds.
#[derive(Clone, PartialEq)]
pub struct LlmModelConfig {
    pub provider: LlmProvider,
    pub model: String,
    pub endpoint: String,
    pub api_key: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub timeout_secs: Option<u64>,
}

// Hand-written so the API key never reaches logs.
impl fmt::Debug for LlmModelConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmModelConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("top_p", &self.top_p)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}
