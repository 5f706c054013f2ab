//! Transport-only bot API client primitives.
//!
//! This crate owns session creation and chat-stream consumption against the
//! bot backend. It intentionally contains no message-assembly state and no
//! persistence coupling; decoded events are handed to the caller in arrival
//! order.

pub mod client;
pub mod config;
pub mod error;
pub mod payload;
pub mod url;

pub use client::{BotApiClient, CancellationSignal};
pub use config::BotApiConfig;
pub use error::BotApiError;
