use chat_model::{ChatMessage, ContentBlock, Conversation, Role};
use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::error::ConversationStoreError;

pub const CONVERSATION_SCHEMA_VERSION: u32 = 1;

/// Persisted conversation layout. Timestamps are RFC 3339 strings and the
/// streaming flag is always written as `false`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConversationRecord {
    pub version: u32,
    pub session_id: Option<String>,
    pub messages: Vec<MessageRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MessageRecord {
    pub id: String,
    pub role: Role,
    pub blocks: Vec<ContentBlock>,
    pub created_at: String,
    pub streaming: bool,
}

/// A stored record that fails validation. Never surfaced to callers; the
/// record is treated as absent.
#[derive(Debug)]
pub struct MalformedRecord {
    pub reason: String,
}

impl ConversationRecord {
    pub fn from_conversation(
        conversation: &Conversation,
    ) -> Result<Self, ConversationStoreError> {
        let messages = conversation
            .messages
            .iter()
            .map(|message| {
                Ok(MessageRecord {
                    id: message.id.clone(),
                    role: message.role,
                    blocks: message.blocks.clone(),
                    created_at: message
                        .created_at
                        .format(&Rfc3339)
                        .map_err(ConversationStoreError::TimestampFormat)?,
                    streaming: false,
                })
            })
            .collect::<Result<Vec<_>, ConversationStoreError>>()?;

        Ok(Self {
            version: CONVERSATION_SCHEMA_VERSION,
            session_id: conversation.session_id.clone(),
            messages,
        })
    }

    pub fn into_conversation(self, bot_id: &str) -> Result<Conversation, MalformedRecord> {
        if self.version != CONVERSATION_SCHEMA_VERSION {
            return Err(MalformedRecord {
                reason: format!(
                    "unsupported record version {}; expected {CONVERSATION_SCHEMA_VERSION}",
                    self.version
                ),
            });
        }

        let messages = self
            .messages
            .into_iter()
            .map(|record| {
                let created_at =
                    OffsetDateTime::parse(&record.created_at, &Rfc3339).map_err(|_| {
                        MalformedRecord {
                            reason: format!(
                                "invalid RFC 3339 timestamp '{}' on message '{}'",
                                record.created_at, record.id
                            ),
                        }
                    })?;

                Ok(ChatMessage {
                    id: record.id,
                    role: record.role,
                    blocks: record.blocks,
                    created_at,
                    streaming: false,
                })
            })
            .collect::<Result<Vec<_>, MalformedRecord>>()?;

        Ok(Conversation {
            bot_id: bot_id.to_string(),
            session_id: self.session_id,
            messages,
        })
    }
}

#[cfg(test)]
mod tests {
    use chat_model::{ChatMessage, ContentBlock, Conversation};
    use serde_json::json;

    use super::{ConversationRecord, MessageRecord, CONVERSATION_SCHEMA_VERSION};

    fn sample_conversation() -> Conversation {
        let mut conversation = Conversation::new("bot-1");
        conversation.session_id = Some("sess-9".to_string());
        conversation.messages.push(ChatMessage::user("hello"));

        let mut assistant = ChatMessage::assistant_placeholder();
        assistant.blocks.push(ContentBlock::Text {
            content: "hi".to_string(),
        });
        assistant.blocks.push(ContentBlock::ToolCall {
            tool_name: "search".to_string(),
            input: json!({ "q": "x" }),
            result: Some(json!("X")),
            done: true,
        });
        conversation.messages.push(assistant);
        conversation
    }

    #[test]
    fn round_trip_preserves_blocks_and_forces_streaming_false() {
        let conversation = sample_conversation();
        assert!(conversation.messages[1].streaming);

        let record = ConversationRecord::from_conversation(&conversation)
            .expect("record conversion should succeed");
        assert!(record.messages.iter().all(|message| !message.streaming));

        let restored = record
            .into_conversation("bot-1")
            .expect("record should decode");
        assert_eq!(restored.session_id.as_deref(), Some("sess-9"));
        assert_eq!(restored.messages.len(), 2);
        for (restored_msg, original) in restored.messages.iter().zip(&conversation.messages) {
            assert_eq!(restored_msg.blocks, original.blocks);
            assert!(!restored_msg.streaming);
        }
    }

    #[test]
    fn unsupported_version_is_malformed() {
        let record = ConversationRecord {
            version: CONVERSATION_SCHEMA_VERSION + 1,
            session_id: None,
            messages: Vec::new(),
        };

        assert!(record.into_conversation("bot-1").is_err());
    }

    #[test]
    fn invalid_timestamp_is_malformed() {
        let record = ConversationRecord {
            version: CONVERSATION_SCHEMA_VERSION,
            session_id: None,
            messages: vec![MessageRecord {
                id: "m-1".to_string(),
                role: chat_model::Role::User,
                blocks: Vec::new(),
                created_at: "yesterday".to_string(),
                streaming: false,
            }],
        };

        assert!(record.into_conversation("bot-1").is_err());
    }
}
