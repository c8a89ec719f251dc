//! Public API types re-used by external crates (e.g., the HTTP API layer).

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::error::RecommendError;

/// One entry of the chat transcript sent by the UI.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(default)]
    pub role: String,
    pub content: String,
}

/// A validated, non-blank query.
///
/// # Example
/// ```
/// use recommender::{ChatMessage, Query};
/// let msgs = vec![ChatMessage { role: "user".into(), content: "lenient grader".into() }];
/// let q = Query::from_messages(&msgs).unwrap();
/// assert_eq!(q.as_str(), "lenient grader");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Query(String);

impl Query {
    /// Accepts any text that is not empty after trimming.
    pub fn new(text: impl Into<String>) -> Result<Self, RecommendError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(RecommendError::InvalidInput("query text is empty".into()));
        }
        Ok(Self(text))
    }

    /// Takes the most recent message; earlier turns do not influence retrieval.
    pub fn from_messages(messages: &[ChatMessage]) -> Result<Self, RecommendError> {
        let last = messages
            .last()
            .ok_or_else(|| RecommendError::InvalidInput("message list is empty".into()))?;
        Self::new(last.content.clone())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Per-invocation knobs.
#[derive(Clone, Copy, Debug, Default)]
pub struct RecommendOptions {
    /// Absolute deadline shared by all external stages. `None` waits indefinitely.
    pub deadline: Option<Instant>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(content: &str) -> ChatMessage {
        ChatMessage {
            role: "user".into(),
            content: content.into(),
        }
    }

    #[test]
    fn blank_query_is_invalid() {
        assert!(matches!(Query::new("  \n"), Err(RecommendError::InvalidInput(_))));
    }

    #[test]
    fn last_message_wins() {
        let q = Query::from_messages(&[msg("old question"), msg("new question")]).unwrap();
        assert_eq!(q.as_str(), "new question");
    }

    #[test]
    fn empty_transcript_or_blank_tail_is_invalid() {
        assert!(Query::from_messages(&[]).is_err());
        assert!(Query::from_messages(&[msg("fine"), msg("")]).is_err());
    }

    #[test]
    fn role_is_optional_on_the_wire() {
        let m: ChatMessage = serde_json::from_str(r#"{"content":"hi"}"#).unwrap();
        assert_eq!(m.role, "");
    }
}
