//! Embedding and text-generation providers behind one shared service.
//!
//! Build [`LlmProfilesConfig`] once at startup, hand it to
//! [`LlmServiceProfiles::new`], wrap the result in `Arc`, and share it.

pub mod config;
pub mod error_handler;
pub mod health_service;
pub mod service_profiles;
pub mod services;

pub use config::default_config::LlmProfilesConfig;
pub use config::llm_model_config::LlmModelConfig;
pub use config::llm_provider::LlmProvider;
pub use error_handler::{AiLlmError, ConfigError};
pub use health_service::{HealthService, HealthStatus};
pub use service_profiles::LlmServiceProfiles;
