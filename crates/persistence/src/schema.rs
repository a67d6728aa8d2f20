//! ScyllaDB schema creation

use crate::error::PersistenceError;
use scylla::Session;

/// Create the keyspace if it doesn't exist
pub async fn create_keyspace(
    session: &Session,
    keyspace: &str,
    replication_factor: u8,
) -> Result<(), PersistenceError> {
    let query = format!(
        "CREATE KEYSPACE IF NOT EXISTS {} WITH replication = {{'class': 'SimpleStrategy', 'replication_factor': {}}}",
        keyspace, replication_factor
    );

    session
        .query_unpaged(query, &[])
        .await
        .map_err(|e| PersistenceError::SchemaError(format!("Failed to create keyspace: {}", e)))?;

    Ok(())
}

/// Create all required tables
pub async fn create_tables(
    session: &Session,
    keyspace: &str,
    transcript_ttl_secs: u64,
) -> Result<(), PersistenceError> {
    // Cached answers and embeddings; entries never expire
    let kv_table = format!(
        r#"
        CREATE TABLE IF NOT EXISTS {}.kv_entries (
            namespace TEXT,
            key TEXT,
            value TEXT,
            updated_at BIGINT,
            PRIMARY KEY ((namespace, key))
        )
    "#,
        keyspace
    );

    session
        .query_unpaged(kv_table, &[])
        .await
        .map_err(|e| PersistenceError::SchemaError(format!("Failed to create kv_entries table: {}", e)))?;

    let messages_table = format!(
        r#"
        CREATE TABLE IF NOT EXISTS {}.chat_messages (
            session_id TEXT,
            position BIGINT,
            role TEXT,
            content TEXT,
            created_at BIGINT,
            PRIMARY KEY ((session_id), position)
        ) WITH CLUSTERING ORDER BY (position ASC)
          AND default_time_to_live = {}
    "#,
        keyspace, transcript_ttl_secs
    );

    session
        .query_unpaged(messages_table, &[])
        .await
        .map_err(|e| {
            PersistenceError::SchemaError(format!("Failed to create chat_messages table: {}", e))
        })?;

    Ok(())
}
