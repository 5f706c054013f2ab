use serde_json::Value;

use crate::event::StreamEvent;

/// Marker prefix for event-data lines.
pub const DATA_PREFIX: &str = "data:";

/// Payload signaling end of stream; never treated as content.
pub const DONE_SENTINEL: &str = "[DONE]";

/// Decodes one line into zero or one event.
///
/// Lines without the data marker, empty payloads, and the end-of-stream
/// sentinel yield no event.
#[must_use]
pub fn decode_line(line: &str) -> Option<StreamEvent> {
    let payload = line.trim().strip_prefix(DATA_PREFIX)?.trim();
    if payload.is_empty() || payload == DONE_SENTINEL {
        return None;
    }

    Some(decode_payload(payload))
}

/// Decodes a non-empty payload into an event.
///
/// A payload that is not valid JSON is re-classified as a synthetic
/// `text_delta` carrying the payload verbatim; upstream producers
/// occasionally emit plain text frames instead of structured envelopes.
#[must_use]
pub fn decode_payload(payload: &str) -> StreamEvent {
    match serde_json::from_str::<Value>(payload) {
        Ok(value) => StreamEvent::from_value(value),
        Err(_) => StreamEvent::text_delta(payload),
    }
}
