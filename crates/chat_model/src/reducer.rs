use chat_events::{EventKind, StreamEvent};
use serde_json::Value;

use crate::message::{ChatMessage, ContentBlock};

/// Applies decoded stream events to the ordered block sequence of one
/// in-flight message.
///
/// Cursors are indices into the block sequence, not references: blocks live
/// in an externally observable list whose elements may be inspected by a
/// renderer between transitions. A cursor is stale once the block at that
/// index is no longer the expected kind (a tool call interrupts any open
/// text run), and deltas re-open a fresh block rather than write into a
/// block of the wrong kind.
#[derive(Debug, Default)]
pub struct BlockReducer {
    text_cursor: Option<usize>,
    reasoning_cursor: Option<usize>,
}

impl BlockReducer {
    /// Applies one event, in arrival order, to `message`.
    pub fn apply(&mut self, message: &mut ChatMessage, event: &StreamEvent) {
        match event.kind {
            Some(EventKind::TextStart) => {
                self.text_cursor = Some(push_block(message, ContentBlock::text()));
            }
            Some(EventKind::TextDelta) => {
                if let Some(delta) = event.delta.as_deref() {
                    self.append_text(message, delta);
                }
            }
            Some(EventKind::TextEnd) => {
                self.text_cursor = None;
            }
            Some(EventKind::ReasoningStart) => {
                self.reasoning_cursor = Some(push_block(message, ContentBlock::reasoning()));
            }
            Some(EventKind::ReasoningDelta) => {
                if let Some(delta) = event.delta.as_deref() {
                    self.append_reasoning(message, delta);
                }
            }
            Some(EventKind::ReasoningEnd) => {
                self.close_reasoning(message);
            }
            Some(EventKind::ToolCallStart) => {
                let tool_name = event
                    .tool_name
                    .clone()
                    .unwrap_or_else(|| "unknown".to_string());
                let input = event.input.clone().unwrap_or(Value::Null);
                push_block(message, ContentBlock::tool_call(tool_name, input));
                // A tool call always interrupts any open text run.
                self.text_cursor = None;
            }
            Some(EventKind::ToolCallEnd) => {
                close_tool_call(message, event);
            }
            // Reserved for nested-agent visualization; currently inert.
            Some(EventKind::AgentStart) | Some(EventKind::AgentEnd) => {}
            None => {
                if let Some(text) = event.fallback_text() {
                    self.append_text(message, text);
                }
            }
        }
    }

    fn append_text(&mut self, message: &mut ChatMessage, delta: &str) {
        let index = match self.text_cursor {
            Some(index) if message.blocks.get(index).is_some_and(ContentBlock::is_text) => index,
            _ => {
                let index = push_block(message, ContentBlock::text());
                self.text_cursor = Some(index);
                index
            }
        };

        if let Some(ContentBlock::Text { content }) = message.blocks.get_mut(index) {
            content.push_str(delta);
        }
    }

    fn append_reasoning(&mut self, message: &mut ChatMessage, delta: &str) {
        let index = match self.reasoning_cursor {
            Some(index) if message.blocks.get(index).is_some_and(ContentBlock::is_reasoning) => {
                index
            }
            _ => {
                let index = push_block(message, ContentBlock::reasoning());
                self.reasoning_cursor = Some(index);
                index
            }
        };

        if let Some(ContentBlock::Reasoning { content, .. }) = message.blocks.get_mut(index) {
            content.push_str(delta);
        }
    }

    fn close_reasoning(&mut self, message: &mut ChatMessage) {
        match self.reasoning_cursor.take() {
            Some(index) => {
                if let Some(ContentBlock::Reasoning { done, .. }) = message.blocks.get_mut(index) {
                    *done = true;
                }
            }
            None => {
                tracing::debug!("dropping reasoning_end with no open reasoning block");
            }
        }
    }
}

fn push_block(message: &mut ChatMessage, block: ContentBlock) -> usize {
    message.blocks.push(block);
    message.blocks.len() - 1
}

/// Closes the first not-yet-done tool-call block matching the event's tool
/// name, scanning in arrival order. A close with no matching open block is
/// tolerated and silently dropped.
fn close_tool_call(message: &mut ChatMessage, event: &StreamEvent) {
    for block in &mut message.blocks {
        if let ContentBlock::ToolCall {
            tool_name,
            result,
            done,
            ..
        } = block
        {
            if !*done && Some(tool_name.as_str()) == event.tool_name.as_deref() {
                *result = event.result.clone();
                *done = true;
                return;
            }
        }
    }

    tracing::debug!(
        tool_name = event.tool_name.as_deref().unwrap_or("<absent>"),
        "dropping tool_call_end with no matching open block"
    );
}
