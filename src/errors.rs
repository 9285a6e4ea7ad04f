use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;

/// Why the model output could not be turned into lead records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseFailure {
    /// Not valid JSON even after sanitizing.
    InvalidJson,
    /// Valid JSON, but not an array of objects.
    UnexpectedFormat,
}

/// Application-specific error types.
///
/// Every variant is terminal for the request that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    /// Missing or empty input (400).
    Validation(String),
    /// Body could not be read; carries the status axum reported (e.g. 413).
    Rejected(StatusCode, String),
    /// Client exceeded its request window (429).
    RateLimited,
    /// The search engine served a bot-detection page.
    BlockingDetected,
    /// Network error, timeout or non-2xx from an outbound fetch.
    Fetch(String),
    /// The language model call failed or returned no text.
    Model(String),
    /// The model output could not be parsed into leads.
    Parse(ParseFailure),
    /// Anything else.
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Rejected(status, _) => *status,
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message placed in the `{"error": ...}` envelope.
    ///
    /// Never contains raw model output.
    pub fn client_message(&self) -> String {
        match self {
            AppError::Validation(msg) | AppError::Rejected(_, msg) => msg.clone(),
            AppError::RateLimited => "Rate limit exceeded. Please try again later.".to_string(),
            AppError::Parse(ParseFailure::InvalidJson) => {
                "Failed to parse the generated data. Please try again.".to_string()
            }
            AppError::Parse(ParseFailure::UnexpectedFormat) => {
                "Unexpected data format. Please try again.".to_string()
            }
            other => format!("Failed to generate leads. Error: {}", other.detail()),
        }
    }

    fn detail(&self) -> String {
        match self {
            AppError::BlockingDetected => {
                "Google has detected unusual traffic. Please try again later.".to_string()
            }
            AppError::Validation(msg)
            | AppError::Rejected(_, msg)
            | AppError::Fetch(msg)
            | AppError::Model(msg)
            | AppError::Internal(msg) => msg.clone(),
            AppError::RateLimited => "rate limit exceeded".to_string(),
            AppError::Parse(ParseFailure::InvalidJson) => "invalid JSON from model".to_string(),
            AppError::Parse(ParseFailure::UnexpectedFormat) => {
                "model output is not an array of objects".to_string()
            }
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(msg) => write!(f, "Validation error: {}", msg),
            AppError::Rejected(status, msg) => write!(f, "Request rejected ({}): {}", status, msg),
            AppError::RateLimited => write!(f, "Rate limit exceeded"),
            AppError::BlockingDetected => write!(f, "Blocked by search engine: {}", self.detail()),
            AppError::Fetch(msg) => write!(f, "Fetch error: {}", msg),
            AppError::Model(msg) => write!(f, "Language model error: {}", msg),
            AppError::Parse(_) => write!(f, "Parse error: {}", self.detail()),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    /// Maps each variant to its status code and the `{"error": ...}` body.
    /// Server-side failures are logged here; client errors are not.
    fn into_response(self) -> Response {
        let status = self.status();

        match &self {
            AppError::Validation(msg) | AppError::Rejected(_, msg) => {
                tracing::debug!("Rejected lead request: {}", msg)
            }
            AppError::RateLimited => {}
            AppError::BlockingDetected => tracing::warn!("{}", self),
            other => tracing::error!("API error: {}", other),
        }

        let body = Json(json!({
            "error": self.client_message(),
        }));

        (status, body).into_response()
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AppError::Fetch(format!("request timed out: {}", err))
        } else {
            AppError::Fetch(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::Validation("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::RateLimited.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            AppError::Rejected(StatusCode::PAYLOAD_TOO_LARGE, "too big".into()).status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            AppError::BlockingDetected.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::Fetch("timeout".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::Parse(ParseFailure::InvalidJson).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_client_messages() {
        assert_eq!(
            AppError::RateLimited.client_message(),
            "Rate limit exceeded. Please try again later."
        );
        assert_eq!(
            AppError::Parse(ParseFailure::InvalidJson).client_message(),
            "Failed to parse the generated data. Please try again."
        );
        assert_eq!(
            AppError::Parse(ParseFailure::UnexpectedFormat).client_message(),
            "Unexpected data format. Please try again."
        );
        assert_eq!(
            AppError::BlockingDetected.client_message(),
            "Failed to generate leads. Error: Google has detected unusual traffic. Please try again later."
        );
        assert_eq!(
            AppError::Fetch("connection refused".into()).client_message(),
            "Failed to generate leads. Error: connection refused"
        );
    }

    #[tokio::test]
    async fn test_into_response_uses_error_envelope() {
        let response = AppError::Validation("missing keyword".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, json!({ "error": "missing keyword" }));
    }
}
