//! Gemini (Google Generative Language API) service for embeddings and text generation.
//!
//! Minimal, non-streaming client around the REST API. Endpoints are derived from
//! `LlmModelConfig::endpoint`:
//! - POST {endpoint}/v1beta/models/{model}:embedContent    — single embedding
//! - POST {endpoint}/v1beta/models/{model}:generateContent — single completion
//!
//! Constructor validation:
//! - `cfg.provider` must be `LlmProvider::Gemini`
//! - `cfg.api_key` must be present (sent as `x-goog-api-key`, never in the URL)
//! - `cfg.endpoint` must start with http:// or https://

use std::time::{Duration, Instant};

use reqwest::header;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info, instrument};

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{AiLlmError, HttpError, ProviderError, ProviderErrorKind, make_snippet},
};

/// Thin client for one Gemini model.
///
/// High-level operations:
/// - [`GeminiService::embed_content`]    — raw embedding payload for one text
/// - [`GeminiService::generate_content`] — one non-streaming completion
#[derive(Debug)]
pub struct GeminiService {
    client: reqwest::Client,
    cfg: LlmModelConfig,
    timeout: Duration,
    url_embed: String,
    url_generate: String,
}

impl GeminiService {
    /// Creates a new [`GeminiService`] from the given config.
    ///
    /// # Errors
    /// - [`AiLlmError::Provider`] with `InvalidProvider`, `MissingApiKey` or `InvalidEndpoint`
    /// - [`AiLlmError::HttpTransport`] if the HTTP client cannot be built
    pub fn new(cfg: LlmModelConfig) -> Result<Self, AiLlmError> {
        if cfg.provider != LlmProvider::Gemini {
            return Err(
                ProviderError::new(LlmProvider::Gemini, ProviderErrorKind::InvalidProvider).into(),
            );
        }

        let api_key = cfg.api_key.clone().ok_or_else(|| {
            ProviderError::new(LlmProvider::Gemini, ProviderErrorKind::MissingApiKey)
        })?;

        let endpoint = cfg.endpoint.trim();
        if endpoint.is_empty()
            || !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
        {
            return Err(ProviderError::new(
                LlmProvider::Gemini,
                ProviderErrorKind::InvalidEndpoint(cfg.endpoint.clone()),
            )
            .into());
        }

        let timeout = cfg
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(60));

        let mut key_header = header::HeaderValue::from_str(&api_key).map_err(|e| {
            ProviderError::new(
                LlmProvider::Gemini,
                ProviderErrorKind::Decode(format!("invalid API key header: {e}")),
            )
        })?;
        key_header.set_sensitive(true);

        let mut headers = header::HeaderMap::new();
        headers.insert("x-goog-api-key", key_header);
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        let model_path = model_path(&cfg.model);
        let base = endpoint.trim_end_matches('/');
        let url_embed = format!("{base}/v1beta/{model_path}:embedContent");
        let url_generate = format!("{base}/v1beta/{model_path}:generateContent");

        info!(
            provider = ?cfg.provider,
            model = %cfg.model,
            endpoint = %cfg.endpoint,
            timeout_secs = timeout.as_secs(),
            "GeminiService initialized"
        );

        Ok(Self {
            client,
            cfg,
            timeout,
            url_embed,
            url_generate,
        })
    }

    /// Embeds `input` and returns the untouched `embedding.values` payload.
    ///
    /// Shape validation (flat, non-empty, numeric) is the caller's job, so a
    /// malformed answer is reported as such instead of as a transport failure.
    ///
    /// # Errors
    /// - [`AiLlmError::Provider`] with `HttpStatus` for non-2xx responses
    /// - [`AiLlmError::HttpTransport`] for client/network failures
    /// - [`AiLlmError::Provider`] with `Decode` if the body is not JSON
    ///
    /// A JSON body without `embedding.values` yields `Value::Null`.
    #[instrument(skip_all, fields(model = %self.cfg.model))]
    pub async fn embed_content(&self, input: &str) -> Result<Value, AiLlmError> {
        let started = Instant::now();
        let model_path = model_path(&self.cfg.model);
        let body = EmbedContentRequest {
            model: &model_path,
            content: Content::user_text(input),
        };

        debug!(input_len = input.len(), "POST {}", self.url_embed);
        let out: Value = self.post_json(&self.url_embed, &body, started).await?;

        let values = extract_embedding_values(out);
        info!(
            latency_ms = started.elapsed().as_millis(),
            "embedContent completed"
        );
        Ok(values)
    }

    /// Performs a single non-streaming `generateContent` call.
    ///
    /// Mapped options from config: `temperature`, `top_p`, `max_tokens`.
    ///
    /// # Errors
    /// - [`AiLlmError::Provider`] with `HttpStatus` for non-2xx responses
    /// - [`AiLlmError::HttpTransport`] for client/network failures
    /// - [`AiLlmError::Provider`] with `Decode` if the JSON cannot be parsed
    /// - [`AiLlmError::Provider`] with `EmptyResponse` if no candidate text came back
    #[instrument(skip_all, fields(model = %self.cfg.model))]
    pub async fn generate_content(&self, prompt: &str) -> Result<String, AiLlmError> {
        let started = Instant::now();
        let body = GenerateContentRequest::from_cfg(&self.cfg, prompt);

        debug!(prompt_len = prompt.len(), "POST {}", self.url_generate);
        let raw: Value = self.post_json(&self.url_generate, &body, started).await?;

        let out: GenerateContentResponse = serde_json::from_value(raw).map_err(|e| {
            ProviderError::new(
                LlmProvider::Gemini,
                ProviderErrorKind::Decode(format!(
                    "serde error: {e}; expected `candidates[0].content.parts[*].text`"
                )),
            )
        })?;

        let text = out.into_text()?;
        info!(
            latency_ms = started.elapsed().as_millis(),
            output_len = text.len(),
            "generateContent completed"
        );
        Ok(text)
    }

    async fn post_json<B: Serialize>(
        &self,
        url: &str,
        body: &B,
        started: Instant,
    ) -> Result<Value, AiLlmError> {
        let resp = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| AiLlmError::from_send(e, self.timeout))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            let snippet = make_snippet(&text);

            error!(
                %status,
                %url,
                %snippet,
                latency_ms = started.elapsed().as_millis(),
                "Gemini returned non-success status"
            );

            return Err(ProviderError::new(
                LlmProvider::Gemini,
                ProviderErrorKind::HttpStatus(HttpError {
                    status,
                    url: url.to_string(),
                    snippet,
                }),
            )
            .into());
        }

        resp.json::<Value>().await.map_err(|e| {
            error!(error = %e, %url, "failed to decode Gemini response body");
            ProviderError::new(
                LlmProvider::Gemini,
                ProviderErrorKind::Decode(format!("response is not JSON: {e}")),
            )
            .into()
        })
    }
}

/// `text-embedding-004` and `models/text-embedding-004` both address the same model.
pub(crate) fn model_path(model: &str) -> String {
    let m = model.trim();
    if m.starts_with("models/") {
        m.to_string()
    } else {
        format!("models/{m}")
    }
}

fn extract_embedding_values(mut out: Value) -> Value {
    out.pointer_mut("/embedding/values")
        .map(Value::take)
        .unwrap_or(Value::Null)
}

/* ===========================================================================
HTTP payloads
======================================================================== */

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<Part<'a>>,
}

impl<'a> Content<'a> {
    fn user_text(text: &'a str) -> Self {
        Self {
            role: "user",
            parts: vec![Part { text }],
        }
    }
}

#[derive(Debug, Serialize)]
struct EmbedContentRequest<'a> {
    model: &'a str,
    content: Content<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

impl<'a> GenerateContentRequest<'a> {
    fn from_cfg(cfg: &LlmModelConfig, prompt: &'a str) -> Self {
        let gc = GenerationConfig {
            temperature: cfg.temperature,
            top_p: cfg.top_p,
            max_output_tokens: cfg.max_tokens,
        };
        let generation_config = (gc.temperature.is_some()
            || gc.top_p.is_some()
            || gc.max_output_tokens.is_some())
        .then_some(gc);

        Self {
            contents: vec![Content::user_text(prompt)],
            generation_config,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenates the text parts of the first candidate.
    fn into_text(self) -> Result<String, AiLlmError> {
        let block_reason = self.prompt_feedback.and_then(|p| p.block_reason);

        let Some(first) = self.candidates.into_iter().next() else {
            let reason = block_reason
                .map(|r| format!("prompt blocked: {r}"))
                .unwrap_or_else(|| "no candidates returned".to_string());
            return Err(
                ProviderError::new(LlmProvider::Gemini, ProviderErrorKind::EmptyResponse(reason))
                    .into(),
            );
        };

        let text: String = first
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            let reason = first
                .finish_reason
                .map(|r| format!("candidate has no text (finishReason={r})"))
                .unwrap_or_else(|| "candidate has no text".to_string());
            return Err(
                ProviderError::new(LlmProvider::Gemini, ProviderErrorKind::EmptyResponse(reason))
                    .into(),
            );
        }

        Ok(text)
    }
}
