//! Message data model and the block-assembly state machine.
//!
//! A streamed assistant response is an ordered sequence of content blocks;
//! [`BlockReducer`] applies decoded stream events to the in-flight message
//! one at a time, in arrival order.

pub mod message;
pub mod reducer;

pub use message::{ChatMessage, ContentBlock, Conversation, Role};
pub use reducer::BlockReducer;
