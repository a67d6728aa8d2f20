//! Key-value entries in ScyllaDB

use async_trait::async_trait;
use chrono::Utc;
use postal_assistant_core::KeyValueStore;

use crate::client::ScyllaClient;
use crate::error::PersistenceError;

/// Namespace-scoped key-value store over `kv_entries`
#[derive(Clone)]
pub struct ScyllaKeyValueStore {
    client: ScyllaClient,
    namespace: String,
}

impl ScyllaKeyValueStore {
    pub fn new(client: ScyllaClient, namespace: impl Into<String>) -> Self {
        Self {
            client,
            namespace: namespace.into(),
        }
    }

    /// Same connection, different namespace
    pub fn with_namespace(&self, namespace: impl Into<String>) -> Self {
        Self::new(self.client.clone(), namespace)
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    async fn fetch(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        let query = format!(
            "SELECT value FROM {}.kv_entries WHERE namespace = ? AND key = ?",
            self.client.keyspace()
        );

        let result = self
            .client
            .session()
            .query_unpaged(query, (&self.namespace, key))
            .await?;

        if let Some(rows) = result.rows {
            if let Some(row) = rows.into_iter().next() {
                let (value,): (String,) = row
                    .into_typed()
                    .map_err(|e| PersistenceError::InvalidData(e.to_string()))?;
                return Ok(Some(value));
            }
        }

        Ok(None)
    }

    async fn store(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        let query = format!(
            "INSERT INTO {}.kv_entries (namespace, key, value, updated_at) VALUES (?, ?, ?, ?)",
            self.client.keyspace()
        );

        self.client
            .session()
            .query_unpaged(
                query,
                (&self.namespace, key, value, Utc::now().timestamp_millis()),
            )
            .await?;

        tracing::debug!(namespace = %self.namespace, "Stored key-value entry");
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), PersistenceError> {
        let query = format!(
            "DELETE FROM {}.kv_entries WHERE namespace = ? AND key = ?",
            self.client.keyspace()
        );

        self.client
            .session()
            .query_unpaged(query, (&self.namespace, key))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for ScyllaKeyValueStore {
    async fn get(&self, key: &str) -> postal_assistant_core::Result<Option<String>> {
        Ok(self.fetch(key).await?)
    }

    async fn set(&self, key: &str, value: &str) -> postal_assistant_core::Result<()> {
        Ok(self.store(key, value).await?)
    }

    async fn delete(&self, key: &str) -> postal_assistant_core::Result<()> {
        Ok(self.remove(key).await?)
    }
}
