use serde_json::Value;
use thiserror::Error;

/// Failure of a single upstream call. Never retried.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum UpstreamError {
    #[error("upstream returned HTTP {status}: {message}")]
    Status { status: u16, message: String },
    #[error("upstream request timed out after {timeout_ms} ms")]
    Timeout { timeout_ms: u128 },
    #[error("upstream request failed: {0}")]
    Network(String),
    #[error("upstream response was not valid JSON: {0}")]
    Decode(String),
}

impl UpstreamError {
    pub fn status(&self) -> Option<u16> {
        match self {
            UpstreamError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Build a status error, preferring the message carried in the response body.
    pub fn from_status(status: u16, reason: Option<&str>, body: &str) -> Self {
        let message = extract_upstream_message(body)
            .or_else(|| reason.map(str::to_string))
            .unwrap_or_else(|| "request failed".to_string());
        UpstreamError::Status { status, message }
    }
}

const MAX_MESSAGE_LEN: usize = 500;

/// Pull a human-readable message out of an upstream error body.
///
/// JSON bodies are searched for `message`, `error.message`, `error` and
/// `title`; anything else falls back to the trimmed text.
fn extract_upstream_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        let candidates = [
            value.get("message"),
            value.get("error").and_then(|error| error.get("message")),
            value.get("error"),
            value.get("title"),
        ];
        if let Some(message) = candidates.into_iter().flatten().find_map(Value::as_str) {
            return Some(message.to_string());
        }
    }
    Some(trimmed.chars().take(MAX_MESSAGE_LEN).collect())
}
