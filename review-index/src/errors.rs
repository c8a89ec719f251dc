//! Unified error types for the crate.

use thiserror::Error;

/// Top-level error for review-index operations.
#[derive(Debug, Error)]
pub enum IndexError {
    /// Invalid or missing configuration.
    #[error("config error: {0}")]
    Config(String),

    /// Network/TLS/timeout failures talking to the index provider.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-2xx answer from a REST endpoint.
    #[error("HTTP {status} from {url}: {snippet}")]
    HttpStatus {
        status: u16,
        url: String,
        snippet: String,
    },

    /// Response body did not have the expected shape.
    #[error("decode error: {0}")]
    Decode(String),

    /// Qdrant client errors (wrapped).
    #[error("qdrant error: {0}")]
    Qdrant(String),
}

/// Produces a single-line, bounded excerpt of an upstream body for messages and logs.
pub(crate) fn snippet(body: &str) -> String {
    const MAX: usize = 240;
    let flat = body.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= MAX {
        return flat;
    }
    let mut cut: String = flat.chars().take(MAX).collect();
    cut.push('…');
    cut
}
