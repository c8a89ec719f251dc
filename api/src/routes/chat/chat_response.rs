use serde::Serialize;

/// Response payload for `POST /api/chat`.
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    /// The model's recommendation (plain text).
    pub text: String,
}
