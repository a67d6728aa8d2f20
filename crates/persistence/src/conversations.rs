//! Session transcripts in ScyllaDB

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use postal_assistant_core::{ChatTurn, ConversationStore, TurnRole};

use crate::client::ScyllaClient;
use crate::error::PersistenceError;

/// Transcript store over `chat_messages`.
///
/// Turns are clustered by `position`, the append time in microseconds plus
/// the turn's offset within the batch, so a single append keeps its order.
#[derive(Clone)]
pub struct ScyllaConversationStore {
    client: ScyllaClient,
}

impl ScyllaConversationStore {
    pub fn new(client: ScyllaClient) -> Self {
        Self { client }
    }

    async fn load(&self, session_id: &str) -> Result<Vec<ChatTurn>, PersistenceError> {
        let query = format!(
            "SELECT role, content, created_at FROM {}.chat_messages WHERE session_id = ?",
            self.client.keyspace()
        );

        let result = self
            .client
            .session()
            .query_unpaged(query, (session_id,))
            .await?;

        let mut turns = Vec::new();
        if let Some(rows) = result.rows {
            for row in rows {
                let (role, content, created_at): (String, String, i64) = row
                    .into_typed()
                    .map_err(|e| PersistenceError::InvalidData(e.to_string()))?;

                let role = TurnRole::parse(&role).ok_or_else(|| {
                    PersistenceError::InvalidData(format!("Unknown turn role: {}", role))
                })?;

                turns.push(ChatTurn {
                    role,
                    content,
                    timestamp: DateTime::from_timestamp_millis(created_at)
                        .unwrap_or_else(Utc::now),
                });
            }
        }

        Ok(turns)
    }

    async fn insert(&self, session_id: &str, turns: &[ChatTurn]) -> Result<(), PersistenceError> {
        let query = format!(
            "INSERT INTO {}.chat_messages (session_id, position, role, content, created_at) VALUES (?, ?, ?, ?, ?)",
            self.client.keyspace()
        );

        let base = Utc::now().timestamp_micros();
        for (offset, turn) in turns.iter().enumerate() {
            self.client
                .session()
                .query_unpaged(
                    query.clone(),
                    (
                        session_id,
                        base + offset as i64,
                        turn.role.as_str(),
                        &turn.content,
                        turn.timestamp.timestamp_millis(),
                    ),
                )
                .await?;
        }

        tracing::debug!(session_id = %session_id, count = turns.len(), "Appended chat turns");
        Ok(())
    }

    async fn remove(&self, session_id: &str) -> Result<(), PersistenceError> {
        let query = format!(
            "DELETE FROM {}.chat_messages WHERE session_id = ?",
            self.client.keyspace()
        );

        self.client
            .session()
            .query_unpaged(query, (session_id,))
            .await?;

        tracing::info!(session_id = %session_id, "Cleared chat transcript");
        Ok(())
    }
}

#[async_trait]
impl ConversationStore for ScyllaConversationStore {
    async fn messages(&self, session_id: &str) -> postal_assistant_core::Result<Vec<ChatTurn>> {
        Ok(self.load(session_id).await?)
    }

    async fn append(&self, session_id: &str, turns: &[ChatTurn]) -> postal_assistant_core::Result<()> {
        Ok(self.insert(session_id, turns).await?)
    }

    async fn clear(&self, session_id: &str) -> postal_assistant_core::Result<()> {
        Ok(self.remove(session_id).await?)
    }

    fn is_persistent(&self) -> bool {
        true
    }
}
