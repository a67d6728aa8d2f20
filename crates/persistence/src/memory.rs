//! In-process stores for development and tests

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::RwLock;
use postal_assistant_core::{ChatTurn, ConversationStore, KeyValueStore, Result};
use std::collections::HashMap;

#[derive(Default)]
pub struct InMemoryKeyValueStore {
    entries: DashMap<String, String>,
}

impl InMemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for InMemoryKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryConversationStore {
    sessions: RwLock<HashMap<String, Vec<ChatTurn>>>,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.read().len()
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn messages(&self, session_id: &str) -> Result<Vec<ChatTurn>> {
        Ok(self
            .sessions
            .read()
            .get(session_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn append(&self, session_id: &str, turns: &[ChatTurn]) -> Result<()> {
        self.sessions
            .write()
            .entry(session_id.to_string())
            .or_default()
            .extend_from_slice(turns);
        Ok(())
    }

    async fn clear(&self, session_id: &str) -> Result<()> {
        self.sessions.write().remove(session_id);
        Ok(())
    }
}
