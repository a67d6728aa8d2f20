//! ScyllaDB client and connection management

use crate::error::PersistenceError;
use crate::schema;
use postal_assistant_config::PersistenceConfig;
use scylla::{Session, SessionBuilder};
use std::sync::Arc;

/// ScyllaDB configuration
#[derive(Debug, Clone)]
pub struct ScyllaConfig {
    pub hosts: Vec<String>,
    pub keyspace: String,
    pub replication_factor: u8,
    /// Default TTL of the transcript table
    pub transcript_ttl_secs: u64,
}

impl ScyllaConfig {
    pub fn from_settings(config: &PersistenceConfig, transcript_ttl_secs: u64) -> Self {
        Self {
            hosts: config.scylla_hosts.clone(),
            keyspace: config.keyspace.clone(),
            replication_factor: config.replication_factor,
            transcript_ttl_secs,
        }
    }
}

impl Default for ScyllaConfig {
    fn default() -> Self {
        Self::from_settings(
            &PersistenceConfig::default(),
            postal_assistant_config::constants::conversation::TRANSCRIPT_TTL_SECS,
        )
    }
}

/// ScyllaDB client wrapper
#[derive(Clone)]
pub struct ScyllaClient {
    session: Arc<Session>,
    config: ScyllaConfig,
}

impl ScyllaClient {
    /// Connect to ScyllaDB cluster
    pub async fn connect(config: ScyllaConfig) -> Result<Self, PersistenceError> {
        tracing::info!(hosts = ?config.hosts, keyspace = %config.keyspace, "Connecting to ScyllaDB");

        let session = SessionBuilder::new()
            .known_nodes(&config.hosts)
            .build()
            .await?;

        Ok(Self {
            session: Arc::new(session),
            config,
        })
    }

    /// Ensure keyspace and tables exist
    pub async fn ensure_schema(&self) -> Result<(), PersistenceError> {
        schema::create_keyspace(
            &self.session,
            &self.config.keyspace,
            self.config.replication_factor,
        )
        .await?;
        schema::create_tables(
            &self.session,
            &self.config.keyspace,
            self.config.transcript_ttl_secs,
        )
        .await?;
        tracing::info!(keyspace = %self.config.keyspace, "Schema ensured");
        Ok(())
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn keyspace(&self) -> &str {
        &self.config.keyspace
    }
}
