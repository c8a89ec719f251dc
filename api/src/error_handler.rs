use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use recommender::RecommendError;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Public application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // --- Boot / config ---
    #[error("missing required environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("configuration error: {0}")]
    Config(String),

    // --- IO / network / server ---
    #[error("failed to bind listener: {0}")]
    Bind(#[source] std::io::Error),

    #[error("server error: {0}")]
    Server(#[source] std::io::Error),

    // --- Request ---
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Recommend(#[from] RecommendError),
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) | AppError::Recommend(RecommendError::InvalidInput(_)) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Recommend(RecommendError::Timeout { .. }) => StatusCode::GATEWAY_TIMEOUT,
            AppError::Recommend(_)
            | AppError::MissingEnv(_)
            | AppError::Config(_)
            | AppError::Bind(_)
            | AppError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            AppError::MissingEnv(_) => "MISSING_ENV",
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::Bind(_) => "BIND_ERROR",
            AppError::Server(_) => "SERVER_ERROR",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::Recommend(e) => e.code(),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    code: &'static str,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(%status, error = %self, "request failed");
        }
        let body = ErrorBody {
            error: self.to_string(),
            code: self.error_code(),
        };
        (status, Json(body)).into_response()
    }
}

/// Handy result alias used across handlers.
pub type AppResult<T> = Result<T, AppError>;

impl From<JsonRejection> for AppError {
    fn from(err: JsonRejection) -> Self {
        AppError::BadRequest(err.body_text())
    }
}

impl From<ai_llm_service::AiLlmError> for AppError {
    fn from(err: ai_llm_service::AiLlmError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<review_index::IndexError> for AppError {
    fn from(err: review_index::IndexError) -> Self {
        AppError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use recommender::Stage;

    use super::*;

    #[test]
    fn status_mapping() {
        let cases = [
            (AppError::BadRequest("x".into()), StatusCode::BAD_REQUEST),
            (
                RecommendError::InvalidInput("empty".into()).into(),
                StatusCode::BAD_REQUEST,
            ),
            (
                RecommendError::Retrieval("down".into()).into(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                RecommendError::MalformedEmbedding("bad".into()).into(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                RecommendError::Timeout {
                    stage: Stage::Generation,
                }
                .into(),
                StatusCode::GATEWAY_TIMEOUT,
            ),
        ];
        for (err, want) in cases {
            assert_eq!(err.status_code(), want, "{err}");
        }
    }

    #[test]
    fn codes_come_from_the_pipeline() {
        let err: AppError = RecommendError::Generation("empty".into()).into();
        assert_eq!(err.error_code(), "GENERATION_ERROR");
        assert_eq!(err.to_string(), "generation failed: empty");
    }
}
