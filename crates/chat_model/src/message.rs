use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

/// One unit of a message's rendered output.
///
/// A block's content is only mutated while it is the most-recently-opened
/// block of its kind that is still incomplete; once closed it is immutable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        content: String,
    },
    #[serde(rename = "thinking")]
    Reasoning {
        content: String,
        done: bool,
    },
    ToolCall {
        tool_name: String,
        input: Value,
        result: Option<Value>,
        done: bool,
    },
}

impl ContentBlock {
    #[must_use]
    pub fn text() -> Self {
        Self::Text {
            content: String::new(),
        }
    }

    #[must_use]
    pub fn reasoning() -> Self {
        Self::Reasoning {
            content: String::new(),
            done: false,
        }
    }

    #[must_use]
    pub fn tool_call(tool_name: impl Into<String>, input: Value) -> Self {
        Self::ToolCall {
            tool_name: tool_name.into(),
            input,
            result: None,
            done: false,
        }
    }

    #[must_use]
    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text { .. })
    }

    #[must_use]
    pub fn is_reasoning(&self) -> bool {
        matches!(self, Self::Reasoning { .. })
    }
}

/// One message in a conversation. Block order is arrival order and is never
/// reordered.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub id: String,
    pub role: Role,
    pub blocks: Vec<ContentBlock>,
    pub created_at: OffsetDateTime,
    pub streaming: bool,
}

impl ChatMessage {
    /// A user message always has exactly one closed text block.
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            id: next_message_id(),
            role: Role::User,
            blocks: vec![ContentBlock::Text {
                content: text.into(),
            }],
            created_at: OffsetDateTime::now_utc(),
            streaming: false,
        }
    }

    /// An assistant message starts empty; blocks are appended only while it
    /// is streaming.
    #[must_use]
    pub fn assistant_placeholder() -> Self {
        Self {
            id: next_message_id(),
            role: Role::Assistant,
            blocks: Vec::new(),
            created_at: OffsetDateTime::now_utc(),
            streaming: true,
        }
    }
}

/// The persisted unit pairing a server-assigned session identifier with an
/// ordered message history for one bot context.
#[derive(Debug, Clone, PartialEq)]
pub struct Conversation {
    pub bot_id: String,
    /// Created lazily on first send; cleared only by an explicit reset.
    pub session_id: Option<String>,
    pub messages: Vec<ChatMessage>,
}

impl Conversation {
    #[must_use]
    pub fn new(bot_id: impl Into<String>) -> Self {
        Self {
            bot_id: bot_id.into(),
            session_id: None,
            messages: Vec::new(),
        }
    }
}

fn next_message_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{ChatMessage, ContentBlock, Conversation, Role};

    #[test]
    fn user_message_has_one_closed_text_block() {
        let message = ChatMessage::user("hello");

        assert_eq!(message.role, Role::User);
        assert!(!message.streaming);
        assert_eq!(
            message.blocks,
            vec![ContentBlock::Text {
                content: "hello".to_string(),
            }]
        );
    }

    #[test]
    fn assistant_placeholder_starts_empty_and_streaming() {
        let message = ChatMessage::assistant_placeholder();

        assert_eq!(message.role, Role::Assistant);
        assert!(message.streaming);
        assert!(message.blocks.is_empty());
    }

    #[test]
    fn message_ids_are_unique() {
        assert_ne!(ChatMessage::user("a").id, ChatMessage::user("a").id);
    }

    #[test]
    fn new_conversation_has_no_session() {
        let conversation = Conversation::new("bot-1");

        assert_eq!(conversation.bot_id, "bot-1");
        assert!(conversation.session_id.is_none());
        assert!(conversation.messages.is_empty());
    }

    #[test]
    fn content_block_serde_layout_is_tagged() {
        let block = ContentBlock::tool_call("search", json!({ "query": "rust" }));
        let value = serde_json::to_value(&block).expect("block should serialize");

        assert_eq!(value["type"], "tool_call");
        assert_eq!(value["tool_name"], "search");
        assert_eq!(value["done"], false);
        assert_eq!(value["result"], serde_json::Value::Null);

        let reasoning = serde_json::to_value(ContentBlock::reasoning())
            .expect("reasoning block should serialize");
        assert_eq!(reasoning["type"], "thinking");
    }
}
