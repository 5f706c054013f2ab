use std::fmt;

use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Error as JsonError;

#[derive(Debug)]
pub enum BotApiError {
    Request(reqwest::Error),
    Status(StatusCode, String),
    StreamChunk(String),
    Serde(JsonError),
    Cancelled,
    Unknown(String),
}

impl fmt::Display for BotApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Request(error) => write!(f, "request error: {error}"),
            Self::Status(status, message) => write!(f, "HTTP {status} {message}"),
            Self::StreamChunk(message) => write!(f, "stream chunk failure: {message}"),
            Self::Serde(error) => write!(f, "serialization error: {error}"),
            Self::Cancelled => write!(f, "request was cancelled"),
            Self::Unknown(message) => write!(f, "{message}"),
        }
    }
}

impl std::error::Error for BotApiError {}

impl From<reqwest::Error> for BotApiError {
    fn from(error: reqwest::Error) -> Self {
        Self::Request(error)
    }
}

impl From<JsonError> for BotApiError {
    fn from(error: JsonError) -> Self {
        Self::Serde(error)
    }
}

impl BotApiError {
    /// True when the failure is cooperative cancellation rather than a
    /// genuine transport error.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

#[derive(Debug, Deserialize)]
struct ErrorPayload {
    error: Option<ErrorPayloadFields>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorPayloadFields {
    message: Option<String>,
}

/// Extracts a human-readable message from an error response body, falling
/// back to the body itself, then to the HTTP reason phrase.
pub fn parse_error_message(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ErrorPayload>(body) {
        if let Some(message) = payload
            .error
            .and_then(|fields| fields.message)
            .or(payload.message)
            .filter(|message| !message.trim().is_empty())
        {
            return message;
        }
    }

    if body.trim().is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;

    use super::parse_error_message;

    #[test]
    fn nested_error_message_wins() {
        let message = parse_error_message(
            StatusCode::BAD_REQUEST,
            r#"{"error":{"message":"bad bot id"}}"#,
        );
        assert_eq!(message, "bad bot id");
    }

    #[test]
    fn top_level_message_is_used_when_error_object_is_absent() {
        let message =
            parse_error_message(StatusCode::BAD_REQUEST, r#"{"message":"missing query"}"#);
        assert_eq!(message, "missing query");
    }

    #[test]
    fn non_json_body_is_returned_verbatim() {
        let message = parse_error_message(StatusCode::BAD_GATEWAY, "upstream exploded");
        assert_eq!(message, "upstream exploded");
    }

    #[test]
    fn empty_body_falls_back_to_reason_phrase() {
        let message = parse_error_message(StatusCode::NOT_FOUND, "");
        assert_eq!(message, "Not Found");
    }
}
