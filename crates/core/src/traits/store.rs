//! Storage traits for cached answers and session transcripts

use crate::{ChatTurn, Result};
use async_trait::async_trait;

/// String key-value store
#[async_trait]
pub trait KeyValueStore: Send + Sync + 'static {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> Result<()>;

    async fn delete(&self, key: &str) -> Result<()>;
}

/// Per-session ordered transcript
#[async_trait]
pub trait ConversationStore: Send + Sync + 'static {
    /// All turns of a session, oldest first
    async fn messages(&self, session_id: &str) -> Result<Vec<ChatTurn>>;

    /// Append turns in order
    async fn append(&self, session_id: &str, turns: &[ChatTurn]) -> Result<()>;

    /// Remove the whole transcript
    async fn clear(&self, session_id: &str) -> Result<()>;

    /// Whether data survives restarts
    fn is_persistent(&self) -> bool {
        false
    }
}
