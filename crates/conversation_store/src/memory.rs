use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chat_model::Conversation;

use crate::error::ConversationStoreError;
use crate::schema::ConversationRecord;
use crate::store::ConversationStore;

/// In-memory store for tests and embedders without a durable backend.
///
/// Records pass through the persisted schema, so the streaming flag is
/// forced to `false` on load exactly like the file-backed store.
#[derive(Debug, Default)]
pub struct MemoryConversationStore {
    records: Mutex<HashMap<String, ConversationRecord>>,
}

impl MemoryConversationStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_records(&self) -> MutexGuard<'_, HashMap<String, ConversationRecord>> {
        match self.records.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl ConversationStore for MemoryConversationStore {
    fn load(&self, bot_id: &str) -> Result<Option<Conversation>, ConversationStoreError> {
        let record = self.lock_records().get(bot_id).cloned();
        let Some(record) = record else {
            return Ok(None);
        };

        match record.into_conversation(bot_id) {
            Ok(conversation) => Ok(Some(conversation)),
            Err(malformed) => {
                tracing::warn!(
                    bot_id,
                    reason = malformed.reason,
                    "discarding malformed conversation record"
                );
                self.lock_records().remove(bot_id);
                Ok(None)
            }
        }
    }

    fn save(
        &self,
        bot_id: &str,
        conversation: &Conversation,
    ) -> Result<(), ConversationStoreError> {
        let record = ConversationRecord::from_conversation(conversation)?;
        self.lock_records().insert(bot_id.to_string(), record);
        Ok(())
    }

    fn remove(&self, bot_id: &str) -> Result<(), ConversationStoreError> {
        self.lock_records().remove(bot_id);
        Ok(())
    }
}
