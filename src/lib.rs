//! Incremental chat-stream assembly engine.
//!
//! Consumes a server-sent sequence of typed events describing an
//! in-progress response (text tokens, reasoning tokens, tool invocations,
//! sub-agent boundaries) and reduces them, in order, into a structured
//! message of ordered content blocks.
//!
//! Layering, leaf-first:
//!
//! - `chat_events` — event contract, `data:` line demuxing, payload
//!   decoding with plain-text fallback
//! - `chat_model` — content blocks, messages, conversations, and the
//!   [`BlockReducer`] state machine
//! - `bot_api` — cancelable HTTP transport for session creation and chat
//!   streaming
//! - `conversation_store` — durable conversation storage keyed by bot
//!   identity
//! - this crate — the [`ChatSession`] coordinator owning one active stream
//!   at a time, plus the [`StreamTransport`] seam
//!
//! Streams survive interruption: on transport error or abort, the
//! assistant message keeps whatever blocks were completed; nothing is
//! rolled back. A restored conversation never resumes mid-stream.

pub mod error;
pub mod session;
pub mod transport;

pub use bot_api::{BotApiConfig, BotApiError, CancellationSignal};
pub use chat_events::{EventKind, StreamEvent};
pub use chat_model::{BlockReducer, ChatMessage, ContentBlock, Conversation, Role};
pub use conversation_store::{
    ConversationStore, ConversationStoreError, FileConversationStore, MemoryConversationStore,
};
pub use error::ChatSessionError;
pub use session::{ChatSession, ObserverId, StreamId};
pub use transport::{HttpStreamTransport, StreamTransport};
