//! Durable transcript of every turn in a conversation.
//!
//! The transcript is the operator's record: it keeps user, model and system
//! turns forever. The model only ever sees a recent window of it.

use async_trait::async_trait;

use crate::error::MemoryError;
use crate::message::{ConversationId, Turn};

#[async_trait]
pub trait TranscriptStore: Send + Sync {
    fn name(&self) -> &str;

    /// Append a turn to a conversation's log.
    async fn append(&self, conversation_id: &ConversationId, turn: Turn) -> Result<(), MemoryError>;

    /// All turns of a conversation, oldest first. Unknown IDs yield an empty log.
    async fn load(&self, conversation_id: &ConversationId) -> Result<Vec<Turn>, MemoryError>;
}
