//! Health probes for the model providers (Gemini, Ollama).
//!
//! - Gemini: `GET {endpoint}/v1beta/models/{model}` with `x-goog-api-key`
//! - Ollama: `GET {endpoint}/api/tags` (best-effort model existence check)
//!
//! The returned [`HealthStatus`] is JSON-serializable and suitable for a `/health` endpoint.
//! [`HealthService::check`] never fails (errors mapped to `ok=false`).
//! Provider-specific probes (`try_*`) return strict `Result`.

use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::config::llm_model_config::LlmModelConfig;
use crate::config::llm_provider::LlmProvider;
use crate::error_handler::{AiLlmError, HealthError, HttpError, make_snippet};
use crate::services::gemini_service::model_path;

/// A serializable health snapshot for a single dependency.
#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    /// Backend/provider (e.g., "Gemini", "Ollama", "Pinecone").
    pub provider: String,
    /// Target endpoint base URL.
    pub endpoint: String,
    /// Model or index identifier relevant to the probe (if any).
    pub model: Option<String>,
    /// Overall health flag.
    pub ok: bool,
    /// Measured HTTP latency in milliseconds for the main probe.
    pub latency_ms: u128,
    /// Short human-readable message with details.
    pub message: String,
}

impl HealthStatus {
    pub fn ok(
        provider: impl Into<String>,
        endpoint: &str,
        model: Option<&str>,
        latency_ms: u128,
        message: impl Into<String>,
    ) -> Self {
        Self {
            provider: provider.into(),
            endpoint: endpoint.to_string(),
            model: model.map(str::to_string),
            ok: true,
            latency_ms,
            message: message.into(),
        }
    }

    pub fn fail(
        provider: impl Into<String>,
        endpoint: &str,
        model: Option<&str>,
        latency_ms: u128,
        message: impl Into<String>,
    ) -> Self {
        Self {
            ok: false,
            ..Self::ok(provider, endpoint, model, latency_ms, message)
        }
    }
}

/// Health checker that reuses a single HTTP client.
pub struct HealthService {
    client: reqwest::Client,
    default_timeout: Duration,
}

impl HealthService {
    /// Creates a new health service with an optional client timeout (seconds).
    ///
    /// # Errors
    /// Returns [`AiLlmError::HttpTransport`] if the HTTP client cannot be built.
    pub fn new(timeout_secs: Option<u64>) -> Result<Self, AiLlmError> {
        let timeout = Duration::from_secs(timeout_secs.unwrap_or(10));
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        info!(
            default_timeout_secs = timeout.as_secs(),
            "HealthService initialized"
        );

        Ok(Self {
            client,
            default_timeout: timeout,
        })
    }

    /// Checks health for a single model config, routing to the provider-specific probe.
    ///
    /// Never returns an error: any failure becomes `HealthStatus { ok: false, .. }`.
    pub async fn check(&self, cfg: &LlmModelConfig) -> HealthStatus {
        let provider = format!("{:?}", cfg.provider);
        let start = Instant::now();
        let result = match cfg.provider {
            LlmProvider::Gemini => self.try_probe_gemini(cfg).await,
            LlmProvider::Ollama => self.try_probe_ollama(cfg).await,
        };

        match result {
            Ok(status) => {
                info!(
                    provider = %status.provider,
                    model = %status.model.as_deref().unwrap_or("n/a"),
                    ok = status.ok,
                    latency_ms = status.latency_ms,
                    "health probe completed"
                );
                status
            }
            Err(err) => {
                let status = HealthStatus::fail(
                    provider,
                    &cfg.endpoint,
                    Some(&cfg.model),
                    start.elapsed().as_millis(),
                    err.to_string(),
                );
                warn!(
                    provider = %status.provider,
                    endpoint = %status.endpoint,
                    latency_ms = status.latency_ms,
                    message = %status.message,
                    "health probe failed"
                );
                status
            }
        }
    }

    /// Checks several configs; identical configs are probed once.
    pub async fn check_many(&self, configs: &[LlmModelConfig]) -> Vec<HealthStatus> {
        debug!(count = configs.len(), "running batch health probes");
        let mut out = Vec::with_capacity(configs.len());
        for (i, cfg) in configs.iter().enumerate() {
            if configs[..i].contains(cfg) {
                continue;
            }
            out.push(self.check(cfg).await);
        }
        out
    }

    fn timeout_for(&self, cfg: &LlmModelConfig) -> Duration {
        cfg.timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(self.default_timeout)
            .min(self.default_timeout)
    }

    /// Strict Gemini probe: the model must be resolvable with the configured key.
    async fn try_probe_gemini(&self, cfg: &LlmModelConfig) -> Result<HealthStatus, AiLlmError> {
        let url = format!(
            "{}/v1beta/{}",
            cfg.endpoint.trim_end_matches('/'),
            model_path(&cfg.model)
        );
        let api_key = cfg
            .api_key
            .as_deref()
            .ok_or_else(|| HealthError::Decode("missing Gemini API key".into()))?;

        let start = Instant::now();
        debug!(provider = "Gemini", model = %cfg.model, "GET {}", url);

        let resp = self
            .client
            .get(&url)
            .timeout(self.timeout_for(cfg))
            .header("x-goog-api-key", api_key)
            .send()
            .await?;
        let latency = start.elapsed().as_millis();

        if !resp.status().is_success() {
            let status = resp.status();
            let snippet = make_snippet(&resp.text().await.unwrap_or_default());
            error!(provider = "Gemini", %url, %status, %snippet, "model lookup failed");
            return Err(HealthError::HttpStatus(HttpError {
                status,
                url,
                snippet,
            })
            .into());
        }

        Ok(HealthStatus::ok(
            "Gemini",
            &cfg.endpoint,
            Some(&cfg.model),
            latency,
            "Gemini is reachable; model is available",
        ))
    }

    /// Strict Ollama probe.
    ///
    /// - `GET {endpoint}/api/tags`, ensure 2xx
    /// - Best-effort: verify `cfg.model` exists in the returned tags
    async fn try_probe_ollama(&self, cfg: &LlmModelConfig) -> Result<HealthStatus, AiLlmError> {
        let url = format!("{}/api/tags", cfg.endpoint.trim_end_matches('/'));

        let start = Instant::now();
        debug!(provider = "Ollama", model = %cfg.model, "GET {}", url);

        let resp = self
            .client
            .get(&url)
            .timeout(self.timeout_for(cfg))
            .send()
            .await?;
        let latency = start.elapsed().as_millis();

        if !resp.status().is_success() {
            let status = resp.status();
            let snippet = make_snippet(&resp.text().await.unwrap_or_default());
            error!(provider = "Ollama", %url, %status, %snippet, "GET /api/tags failed");
            return Err(HealthError::HttpStatus(HttpError {
                status,
                url,
                snippet,
            })
            .into());
        }

        // Expected minimal JSON: { "models": [ { "name": "<model>" }, ... ] }
        #[derive(serde::Deserialize)]
        struct Tag {
            name: String,
        }
        #[derive(serde::Deserialize)]
        struct Tags {
            models: Option<Vec<Tag>>,
        }

        let tags: Tags = resp
            .json()
            .await
            .map_err(|e| HealthError::Decode(format!("/api/tags: {e}")))?;

        let listed = tags
            .models
            .map(|models| models.iter().any(|m| m.name == cfg.model))
            .unwrap_or(true);

        Ok(if listed {
            HealthStatus::ok(
                "Ollama",
                &cfg.endpoint,
                Some(&cfg.model),
                latency,
                "Ollama is healthy; model is available",
            )
        } else {
            HealthStatus::fail(
                "Ollama",
                &cfg.endpoint,
                Some(&cfg.model),
                latency,
                "Ollama is up, but model not found in /api/tags",
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fail_keeps_details() {
        let s = HealthStatus::fail("Ollama", "http://x", Some("m"), 12, "down");
        assert!(!s.ok);
        assert_eq!(s.provider, "Ollama");
        assert_eq!(s.model.as_deref(), Some("m"));
        assert_eq!(s.latency_ms, 12);
    }

    #[tokio::test]
    async fn unreachable_provider_reports_not_ok() {
        let svc = HealthService::new(Some(1)).unwrap();
        let cfg = LlmModelConfig {
            provider: LlmProvider::Ollama,
            model: "m".into(),
            // Port 9 (discard) on loopback: connection refused, no external traffic.
            endpoint: "http://127.0.0.1:9".into(),
            api_key: None,
            max_tokens: None,
            temperature: None,
            top_p: None,
            timeout_secs: Some(1),
        };

        let statuses = svc.check_many(&[cfg.clone(), cfg]).await;
        assert_eq!(statuses.len(), 1);
        assert!(!statuses[0].ok);
    }
}
