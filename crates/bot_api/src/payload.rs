use serde::{Deserialize, Serialize};

/// Request body for opening a chat stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatStreamRequest {
    pub query: String,
}

impl ChatStreamRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
        }
    }
}

/// Response body from session creation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SessionResponse {
    pub session_id: String,
}
