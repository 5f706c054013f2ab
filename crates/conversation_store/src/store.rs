use chat_model::Conversation;

use crate::error::ConversationStoreError;

/// Durable store keyed by bot identity.
///
/// `load` returns `Ok(None)` both for missing and for malformed records;
/// decode failures never propagate. `save` is a whole-record overwrite.
pub trait ConversationStore: Send + Sync {
    fn load(&self, bot_id: &str) -> Result<Option<Conversation>, ConversationStoreError>;

    fn save(
        &self,
        bot_id: &str,
        conversation: &Conversation,
    ) -> Result<(), ConversationStoreError>;

    fn remove(&self, bot_id: &str) -> Result<(), ConversationStoreError>;
}
