//! Durable storage for conversations, keyed by bot identity.
//!
//! Writes are whole-record overwrites; a malformed stored record is treated
//! as absent rather than surfaced as a decode error, and a restored
//! conversation never resumes mid-stream.

mod error;
mod file;
mod memory;
mod paths;
mod schema;
mod store;

pub use error::ConversationStoreError;
pub use file::FileConversationStore;
pub use memory::MemoryConversationStore;
pub use paths::{conversation_file_name, sanitize_bot_id};
pub use schema::{ConversationRecord, MalformedRecord, MessageRecord, CONVERSATION_SCHEMA_VERSION};
pub use store::ConversationStore;
