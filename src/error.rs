use conversation_store::ConversationStoreError;
use thiserror::Error;

/// Precondition and infrastructure failures surfaced by [`crate::ChatSession`].
///
/// Stream-time transport failures are not returned here; they finalize the
/// in-flight message and are readable via `ChatSession::last_error`.
#[derive(Debug, Error)]
pub enum ChatSessionError {
    #[error("a chat stream is already active")]
    StreamActive,

    #[error("message text is empty")]
    EmptyMessage,

    #[error("no bot is selected")]
    NoBotSelected,

    #[error("failed to spawn stream worker: {0}")]
    WorkerSpawn(String),

    #[error(transparent)]
    Store(#[from] ConversationStoreError),
}
