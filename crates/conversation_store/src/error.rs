use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConversationStoreError {
    #[error("I/O error while {operation} at {path}: {source}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize conversation record for bot '{bot_id}': {source}")]
    Serialize {
        bot_id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to format message timestamp as RFC 3339: {0}")]
    TimestampFormat(#[source] time::error::Format),
}

impl ConversationStoreError {
    #[must_use]
    pub fn io(operation: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    #[must_use]
    pub fn serialize(bot_id: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Serialize {
            bot_id: bot_id.into(),
            source,
        }
    }
}
