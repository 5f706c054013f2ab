//! Stream-event contract shared by the chat transport and the assembly engine.
//!
//! This crate intentionally defines only the decoded event shape and the
//! line-level decoding behavior for `data:`-framed streams. It excludes
//! transport details and message-assembly state.

pub mod decoder;
pub mod event;
pub mod sse;

pub use decoder::{decode_line, decode_payload, DATA_PREFIX, DONE_SENTINEL};
pub use event::{EventKind, StreamEvent};
pub use sse::SseLineParser;
