//! ScyllaDB persistence layer for the postal assistant
//!
//! Provides persistent storage for:
//! - Key-value entries (cached answers, cached embeddings), namespaced
//! - Session chat transcripts
//!
//! In-memory implementations of the same traits are used when persistence
//! is disabled.

pub mod client;
pub mod conversations;
pub mod error;
pub mod kv;
pub mod memory;
pub mod schema;

pub use client::{ScyllaClient, ScyllaConfig};
pub use conversations::ScyllaConversationStore;
pub use error::PersistenceError;
pub use kv::ScyllaKeyValueStore;
pub use memory::{InMemoryConversationStore, InMemoryKeyValueStore};

use postal_assistant_core::{ConversationStore, KeyValueStore};
use std::sync::Arc;

/// Connect, ensure the schema and build the ScyllaDB-backed stores
pub async fn init(config: ScyllaConfig) -> Result<PersistenceLayer, PersistenceError> {
    let client = ScyllaClient::connect(config).await?;
    client.ensure_schema().await?;

    Ok(PersistenceLayer {
        client: Some(client.clone()),
        conversations: Arc::new(ScyllaConversationStore::new(client)),
    })
}

/// Stores shared by the application
#[derive(Clone)]
pub struct PersistenceLayer {
    client: Option<ScyllaClient>,
    pub conversations: Arc<dyn ConversationStore>,
}

impl PersistenceLayer {
    /// Process-local stores
    pub fn in_memory() -> Self {
        Self {
            client: None,
            conversations: Arc::new(InMemoryConversationStore::new()),
        }
    }

    /// Key-value store scoped to `namespace`
    pub fn key_value(&self, namespace: &str) -> Arc<dyn KeyValueStore> {
        match &self.client {
            Some(client) => Arc::new(ScyllaKeyValueStore::new(client.clone(), namespace)),
            None => Arc::new(InMemoryKeyValueStore::new()),
        }
    }

    pub fn is_persistent(&self) -> bool {
        self.client.is_some()
    }
}
