//! Model profiles resolved from environment variables.
//!
//! Two profiles are built at startup and never re-read afterwards:
//!
//! - **Embedding**  → turns query text into a vector
//! - **Generation** → writes the final recommendation
//!
//! # Environment variables
//!
//! Common:
//! - `LLM_KIND`          = `gemini` (default) or `ollama`
//! - `EMBEDDING_MODEL`   = embedding model (default `text-embedding-004` on Gemini)
//! - `GENERATION_MODEL`  = generation model (default `gemini-1.5-flash` on Gemini)
//! - `LLM_MAX_TOKENS`    = optional max output tokens (u32)
//! - `LLM_TEMPERATURE`   = optional sampling temperature (0.0..=2.0)
//! - `LLM_TIMEOUT_SECS`  = optional per-request timeout (default 60)
//!
//! Gemini-specific:
//! - `GEMINI_API_KEY` (mandatory)
//! - `GEMINI_URL` (default `https://generativelanguage.googleapis.com`)
//!
//! Ollama-specific:
//! - `OLLAMA_URL` or `OLLAMA_PORT` (mandatory), models have no defaults

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{
        AiLlmError, ConfigError, must_var, opt_f32, opt_u32, opt_u64, opt_var,
        validate_http_endpoint, validate_range_f32,
    },
};

pub const DEFAULT_GEMINI_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_EMBEDDING_MODEL: &str = "text-embedding-004";
pub const DEFAULT_GEMINI_GENERATION_MODEL: &str = "gemini-1.5-flash";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Embedding + generation profiles, validated and ready for client construction.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmProfilesConfig {
    pub embedding: LlmModelConfig,
    pub generation: LlmModelConfig,
}

impl LlmProfilesConfig {
    /// Reads both profiles from the process environment.
    ///
    /// # Errors
    /// Any [`ConfigError`] from [`LlmProfilesConfig::from_lookup`].
    pub fn from_env() -> Result<Self, AiLlmError> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Builds both profiles from an arbitrary key lookup.
    ///
    /// # Errors
    /// - [`ConfigError::UnsupportedProvider`] for an unknown `LLM_KIND`
    /// - [`ConfigError::MissingVar`] when a provider credential/endpoint/model is absent
    /// - [`ConfigError::InvalidNumber`] / [`ConfigError::OutOfRange`] for bad knobs
    pub fn from_lookup<L>(lookup: L) -> Result<Self, AiLlmError>
    where
        L: Fn(&str) -> Option<String>,
    {
        let provider = match opt_var(&lookup, "LLM_KIND") {
            Some(kind) => kind.parse::<LlmProvider>()?,
            None => LlmProvider::Gemini,
        };

        let max_tokens = opt_u32(&lookup, "LLM_MAX_TOKENS")?;
        let temperature = opt_f32(&lookup, "LLM_TEMPERATURE")?;
        if let Some(t) = temperature {
            validate_range_f32("temperature", t, 0.0, 2.0)?;
        }
        let timeout_secs = opt_u64(&lookup, "LLM_TIMEOUT_SECS")?.or(Some(DEFAULT_TIMEOUT_SECS));

        let (endpoint, api_key, embedding_model, generation_model) = match provider {
            LlmProvider::Gemini => {
                let endpoint = opt_var(&lookup, "GEMINI_URL")
                    .unwrap_or_else(|| DEFAULT_GEMINI_URL.to_string());
                validate_http_endpoint("GEMINI_URL", &endpoint)?;
                let api_key = must_var(&lookup, "GEMINI_API_KEY")?;
                (
                    endpoint,
                    Some(api_key),
                    opt_var(&lookup, "EMBEDDING_MODEL")
                        .unwrap_or_else(|| DEFAULT_GEMINI_EMBEDDING_MODEL.to_string()),
                    opt_var(&lookup, "GENERATION_MODEL")
                        .unwrap_or_else(|| DEFAULT_GEMINI_GENERATION_MODEL.to_string()),
                )
            }
            LlmProvider::Ollama => (
                ollama_endpoint(&lookup)?,
                None,
                must_var(&lookup, "EMBEDDING_MODEL")?,
                must_var(&lookup, "GENERATION_MODEL")?,
            ),
        };

        let embedding = LlmModelConfig {
            provider,
            model: embedding_model,
            endpoint: endpoint.clone(),
            api_key: api_key.clone(),
            max_tokens: None,
            temperature: None,
            top_p: None,
            timeout_secs,
        };

        let generation = LlmModelConfig {
            provider,
            model: generation_model,
            endpoint,
            api_key,
            max_tokens,
            temperature,
            top_p: None,
            timeout_secs,
        };

        Ok(Self {
            embedding,
            generation,
        })
    }
}

/// Resolves the Ollama endpoint.
///
/// Precedence:
/// 1. `OLLAMA_URL` if present and non-empty
/// 2. `OLLAMA_PORT` → `http://localhost:{port}`
fn ollama_endpoint<L>(lookup: &L) -> Result<String, AiLlmError>
where
    L: Fn(&str) -> Option<String>,
{
    if let Some(url) = opt_var(lookup, "OLLAMA_URL") {
        validate_http_endpoint("OLLAMA_URL", &url)?;
        return Ok(url);
    }
    if let Some(port) = opt_var(lookup, "OLLAMA_PORT") {
        port.parse::<u16>().map_err(|_| ConfigError::InvalidNumber {
            var: "OLLAMA_PORT",
            reason: "expected u16 (1..=65535)",
        })?;
        return Ok(format!("http://localhost:{port}"));
    }
    Err(ConfigError::MissingVar("OLLAMA_URL or OLLAMA_PORT").into())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn gemini_defaults_match_the_review_index() {
        let cfg = LlmProfilesConfig::from_lookup(lookup_from(&[("GEMINI_API_KEY", "k")])).unwrap();

        assert_eq!(cfg.embedding.provider, LlmProvider::Gemini);
        assert_eq!(cfg.embedding.model, "text-embedding-004");
        assert_eq!(cfg.generation.model, "gemini-1.5-flash");
        assert_eq!(cfg.generation.endpoint, DEFAULT_GEMINI_URL);
        assert_eq!(cfg.generation.api_key.as_deref(), Some("k"));
        assert_eq!(cfg.generation.timeout_secs, Some(60));
    }

    #[test]
    fn gemini_requires_api_key() {
        let err = LlmProfilesConfig::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(matches!(
            err,
            AiLlmError::Config(ConfigError::MissingVar("GEMINI_API_KEY"))
        ));
    }

    #[test]
    fn ollama_uses_port_fallback_and_explicit_models() {
        let cfg = LlmProfilesConfig::from_lookup(lookup_from(&[
            ("LLM_KIND", "ollama"),
            ("OLLAMA_PORT", "11434"),
            ("EMBEDDING_MODEL", "nomic-embed-text"),
            ("GENERATION_MODEL", "qwen3:14b"),
            ("LLM_MAX_TOKENS", "512"),
        ]))
        .unwrap();

        assert_eq!(cfg.embedding.endpoint, "http://localhost:11434");
        assert_eq!(cfg.embedding.api_key, None);
        assert_eq!(cfg.generation.max_tokens, Some(512));
        assert_eq!(cfg.embedding.max_tokens, None);
    }

    #[test]
    fn rejects_unknown_provider_and_bad_temperature() {
        let err = LlmProfilesConfig::from_lookup(lookup_from(&[("LLM_KIND", "bard")])).unwrap_err();
        assert!(matches!(
            err,
            AiLlmError::Config(ConfigError::UnsupportedProvider(_))
        ));

        let err = LlmProfilesConfig::from_lookup(lookup_from(&[
            ("GEMINI_API_KEY", "k"),
            ("LLM_TEMPERATURE", "3.5"),
        ]))
        .unwrap_err();
        assert!(matches!(err, AiLlmError::Config(ConfigError::OutOfRange { .. })));
    }
}
