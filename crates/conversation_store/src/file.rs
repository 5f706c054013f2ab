use std::fs;
use std::path::{Path, PathBuf};

use chat_model::Conversation;

use crate::error::ConversationStoreError;
use crate::paths::conversation_file_name;
use crate::schema::ConversationRecord;
use crate::store::ConversationStore;

/// One JSON file per bot id under a root directory.
#[derive(Debug)]
pub struct FileConversationStore {
    root: PathBuf,
}

impl FileConversationStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn conversation_path(&self, bot_id: &str) -> PathBuf {
        self.root.join(conversation_file_name(bot_id))
    }
}

impl ConversationStore for FileConversationStore {
    fn load(&self, bot_id: &str) -> Result<Option<Conversation>, ConversationStoreError> {
        let path = self.conversation_path(bot_id);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(error) => {
                return Err(ConversationStoreError::io(
                    "reading conversation file",
                    path,
                    error,
                ))
            }
        };

        let record = match serde_json::from_str::<ConversationRecord>(&raw) {
            Ok(record) => record,
            Err(error) => {
                discard_malformed(&path, bot_id, &error.to_string());
                return Ok(None);
            }
        };

        match record.into_conversation(bot_id) {
            Ok(conversation) => Ok(Some(conversation)),
            Err(malformed) => {
                discard_malformed(&path, bot_id, &malformed.reason);
                Ok(None)
            }
        }
    }

    fn save(
        &self,
        bot_id: &str,
        conversation: &Conversation,
    ) -> Result<(), ConversationStoreError> {
        fs::create_dir_all(&self.root).map_err(|error| {
            ConversationStoreError::io("creating store directory", &self.root, error)
        })?;

        let record = ConversationRecord::from_conversation(conversation)?;
        let serialized = serde_json::to_string(&record)
            .map_err(|error| ConversationStoreError::serialize(bot_id, error))?;

        let path = self.conversation_path(bot_id);
        fs::write(&path, serialized)
            .map_err(|error| ConversationStoreError::io("writing conversation file", path, error))
    }

    fn remove(&self, bot_id: &str) -> Result<(), ConversationStoreError> {
        let path = self.conversation_path(bot_id);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(ConversationStoreError::io(
                "removing conversation file",
                path,
                error,
            )),
        }
    }
}

fn discard_malformed(path: &Path, bot_id: &str, reason: &str) {
    tracing::warn!(bot_id, path = %path.display(), reason, "discarding malformed conversation record");
    let _ = fs::remove_file(path);
}

#[cfg(test)]
mod tests {
    use chat_model::{ChatMessage, ContentBlock, Conversation};
    use serde_json::json;

    use super::FileConversationStore;
    use crate::store::ConversationStore;

    fn store() -> (tempfile::TempDir, FileConversationStore) {
        let dir = tempfile::tempdir().expect("temp dir should be created");
        let store = FileConversationStore::new(dir.path());
        (dir, store)
    }

    fn mixed_conversation() -> Conversation {
        let mut conversation = Conversation::new("bot-1");
        conversation.session_id = Some("sess-1".to_string());
        conversation.messages.push(ChatMessage::user("question"));

        let mut assistant = ChatMessage::assistant_placeholder();
        assistant.blocks.push(ContentBlock::Reasoning {
            content: "let me think".to_string(),
            done: true,
        });
        assistant.blocks.push(ContentBlock::Text {
            content: "answer".to_string(),
        });
        assistant.blocks.push(ContentBlock::ToolCall {
            tool_name: "search".to_string(),
            input: json!({}),
            result: None,
            done: false,
        });
        conversation.messages.push(assistant);
        conversation
    }

    #[test]
    fn load_missing_conversation_is_none() {
        let (_dir, store) = store();
        assert!(store
            .load("bot-1")
            .expect("load should not fail")
            .is_none());
    }

    #[test]
    fn save_then_load_round_trips_blocks_with_streaming_false() {
        let (_dir, store) = store();
        let conversation = mixed_conversation();

        store
            .save("bot-1", &conversation)
            .expect("save should succeed");
        let restored = store
            .load("bot-1")
            .expect("load should not fail")
            .expect("conversation should be present");

        assert_eq!(restored.session_id.as_deref(), Some("sess-1"));
        assert_eq!(restored.messages.len(), 2);
        for (restored_msg, original) in restored.messages.iter().zip(&conversation.messages) {
            assert_eq!(restored_msg.blocks, original.blocks);
            assert!(!restored_msg.streaming);
        }
    }

    #[test]
    fn malformed_record_is_treated_as_absent_and_discarded() {
        let (dir, store) = store();
        let path = dir.path().join("bot-1.json");
        std::fs::write(&path, "{ not json").expect("fixture write should succeed");

        assert!(store
            .load("bot-1")
            .expect("malformed record should not error")
            .is_none());
        assert!(!path.exists());
    }

    #[test]
    fn unsupported_version_is_treated_as_absent() {
        let (dir, store) = store();
        std::fs::write(
            dir.path().join("bot-1.json"),
            r#"{"version":99,"session_id":null,"messages":[]}"#,
        )
        .expect("fixture write should succeed");

        assert!(store
            .load("bot-1")
            .expect("unsupported version should not error")
            .is_none());
    }

    #[test]
    fn remove_is_idempotent() {
        let (_dir, store) = store();
        store
            .save("bot-1", &mixed_conversation())
            .expect("save should succeed");

        store.remove("bot-1").expect("remove should succeed");
        store
            .remove("bot-1")
            .expect("removing a missing record should succeed");
        assert!(store
            .load("bot-1")
            .expect("load should not fail")
            .is_none());
    }

    #[test]
    fn save_overwrites_whole_record() {
        let (_dir, store) = store();
        store
            .save("bot-1", &mixed_conversation())
            .expect("save should succeed");

        let replacement = Conversation::new("bot-1");
        store
            .save("bot-1", &replacement)
            .expect("overwrite should succeed");

        let restored = store
            .load("bot-1")
            .expect("load should not fail")
            .expect("conversation should be present");
        assert!(restored.messages.is_empty());
        assert!(restored.session_id.is_none());
    }
}
