use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// Fallback message when a failed response carries no usable body.
pub fn fallback_message(status: StatusCode) -> String {
    format!("Request failed with status {}", status.as_u16())
}

/// The only failure the API client reports: "the request failed, here is a
/// human message". Display is the message verbatim so callers can show it.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{message}")]
    Status { status: StatusCode, message: String },

    #[error("{0}")]
    Network(String),

    #[error("{0}")]
    Decode(String),

    #[error("{0}")]
    Session(String),
}

impl ApiError {
    /// The display message carried by this error.
    pub fn message(&self) -> &str {
        match self {
            ApiError::Status { message, .. } => message,
            ApiError::Network(m) | ApiError::Decode(m) | ApiError::Session(m) => m,
        }
    }

    /// HTTP status for failures that reached the server.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status(), Some(StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN))
    }

    /// Build the error for a non-2xx response from its raw body text.
    ///
    /// Order: JSON `message`/`error` field (either casing, or nested
    /// `error.message`), then the raw text, then the fixed fallback.
    pub fn from_response_body(status: StatusCode, body: &str) -> Self {
        let message = extract_error_message(body).unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                fallback_message(status)
            } else {
                trimmed.to_string()
            }
        });
        ApiError::Status { status, message }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ApiError::Decode(format!("malformed response: {}", e))
        } else {
            ApiError::Network(format!("network error: {}", e))
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::Decode(format!("malformed response: {}", e))
    }
}

fn extract_error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let obj = value.as_object()?;

    for key in ["message", "Message", "error", "Error", "title", "Title"] {
        match obj.get(key) {
            Some(Value::String(s)) if !s.trim().is_empty() => return Some(s.clone()),
            Some(Value::Object(inner)) => {
                if let Some(Value::String(s)) = inner.get("message").or_else(|| inner.get("Message")) {
                    if !s.trim().is_empty() {
                        return Some(s.clone());
                    }
                }
            }
            _ => {}
        }
    }
    None
}
