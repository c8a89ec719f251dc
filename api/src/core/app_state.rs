use std::{future::Future, pin::Pin, sync::Arc, time::Duration};

use ai_llm_service::{HealthStatus, LlmProfilesConfig, LlmServiceProfiles};
use recommender::{Pipeline, RecommenderConfig};
use review_index::{IndexConfig, ReviewIndex};
use tracing::info;

use crate::error_handler::AppError;

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
const HEALTH_TIMEOUT_SECS: u64 = 10;

/// Listener settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiConfig {
    /// Bind address, e.g. `0.0.0.0:3000`.
    pub address: String,
    /// Upper bound for a whole `/api/chat` request.
    pub request_timeout: Duration,
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    pub fn from_lookup<L>(lookup: L) -> Result<Self, AppError>
    where
        L: Fn(&str) -> Option<String>,
    {
        let address = lookup("API_ADDRESS")
            .filter(|v| !v.trim().is_empty())
            .ok_or(AppError::MissingEnv("API_ADDRESS"))?;

        let secs = match lookup("REQUEST_TIMEOUT_SECS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(AppError::Config(format!(
                        "REQUEST_TIMEOUT_SECS must be a positive integer, got `{raw}`"
                    )));
                }
            },
            None => DEFAULT_REQUEST_TIMEOUT_SECS,
        };

        Ok(Self {
            address: address.trim().to_string(),
            request_timeout: Duration::from_secs(secs),
        })
    }
}

pub type HealthFuture<'a> = Pin<Box<dyn Future<Output = Vec<HealthStatus>> + Send + 'a>>;

/// Source of dependency health snapshots for `/health`.
pub trait HealthProbe: Send + Sync {
    fn check_all(&self) -> HealthFuture<'_>;
}

/// Probes both model profiles and the review index.
pub struct ServiceHealth {
    llm: Arc<LlmServiceProfiles>,
    index: Arc<ReviewIndex>,
}

impl HealthProbe for ServiceHealth {
    fn check_all(&self) -> HealthFuture<'_> {
        Box::pin(async move {
            let mut out = self.llm.health_all().await;
            let idx = self.index.health().await;
            out.push(HealthStatus {
                provider: idx.provider,
                endpoint: idx.endpoint,
                model: Some(idx.index),
                ok: idx.ok,
                latency_ms: idx.latency_ms,
                message: idx.message,
            });
            out
        })
    }
}

/// Shared state for all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub health: Arc<dyn HealthProbe>,
    pub request_timeout: Duration,
}

impl AppState {
    /// Builds every provider client from the environment.
    ///
    /// # Errors
    /// `AppError::Config` when any provider config is missing or invalid.
    pub fn from_env(cfg: &ApiConfig) -> Result<Self, AppError> {
        let llm = Arc::new(LlmServiceProfiles::new(
            LlmProfilesConfig::from_env()?,
            Some(HEALTH_TIMEOUT_SECS),
        )?);
        let index = Arc::new(ReviewIndex::new(IndexConfig::from_env()?)?);
        let rec_cfg =
            RecommenderConfig::from_env().map_err(|e| AppError::Config(e.to_string()))?;

        let (embedding, generation) = llm.profiles();
        info!(
            embedding_model = %embedding.model,
            generation_model = %generation.model,
            top_k = rec_cfg.top_k,
            request_timeout_secs = cfg.request_timeout.as_secs(),
            "application state ready"
        );

        Ok(Self {
            pipeline: Arc::new(Pipeline::from_services(rec_cfg, llm.clone(), index.clone())),
            health: Arc::new(ServiceHealth { llm, index }),
            request_timeout: cfg.request_timeout,
        })
    }
}
