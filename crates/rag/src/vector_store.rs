//! Vector store using Qdrant
//!
//! Collections use cosine distance, so the returned score is the cosine
//! similarity itself.

use async_trait::async_trait;
use qdrant_client::{
    qdrant::{
        point_id::PointIdOptions, value::Kind, CountPointsBuilder, CreateCollectionBuilder,
        Distance, PointStruct, SearchPointsBuilder, UpsertPointsBuilder, VectorParamsBuilder,
    },
    Qdrant,
};
use std::collections::HashMap;

use postal_assistant_config::VectorStoreConfig;
use postal_assistant_core::{VectorIndex, VectorMatch, VectorRecord};

use crate::RagError;

/// Payload key holding the indexed text
const CONTENT_KEY: &str = "content";

/// Qdrant-backed [`VectorIndex`]
pub struct QdrantVectorIndex {
    client: Qdrant,
}

impl QdrantVectorIndex {
    pub fn new(config: &VectorStoreConfig) -> Result<Self, RagError> {
        let mut builder = Qdrant::from_url(&config.endpoint);

        if let Some(ref api_key) = config.api_key {
            builder = builder.api_key(api_key.clone());
            tracing::info!("Qdrant connection using API key authentication");
        }

        let client = builder
            .build()
            .map_err(|e| RagError::Connection(e.to_string()))?;

        tracing::info!(endpoint = %config.endpoint, "Connected to Qdrant");
        Ok(Self { client })
    }

    async fn exists(&self, collection: &str) -> Result<bool, RagError> {
        self.client
            .collection_exists(collection)
            .await
            .map_err(|e| RagError::VectorStore(e.to_string()))
    }
}

#[async_trait]
impl VectorIndex for QdrantVectorIndex {
    async fn ensure_collection(
        &self,
        collection: &str,
        dimension: usize,
    ) -> postal_assistant_core::Result<()> {
        if self.exists(collection).await? {
            return Ok(());
        }

        self.client
            .create_collection(
                CreateCollectionBuilder::new(collection)
                    .vectors_config(VectorParamsBuilder::new(dimension as u64, Distance::Cosine)),
            )
            .await
            .map_err(|e| RagError::VectorStore(e.to_string()))?;

        tracing::info!(collection, dimension, "Created Qdrant collection");
        Ok(())
    }

    async fn delete_collection(&self, collection: &str) -> postal_assistant_core::Result<()> {
        if !self.exists(collection).await? {
            return Ok(());
        }

        self.client
            .delete_collection(collection)
            .await
            .map_err(|e| RagError::VectorStore(e.to_string()))?;

        tracing::info!(collection, "Deleted Qdrant collection");
        Ok(())
    }

    async fn upsert(
        &self,
        collection: &str,
        records: Vec<VectorRecord>,
    ) -> postal_assistant_core::Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let points: Vec<PointStruct> = records
            .into_iter()
            .map(|record| {
                let mut payload: HashMap<String, qdrant_client::qdrant::Value> = HashMap::new();
                payload.insert(CONTENT_KEY.to_string(), record.content.into());
                for (k, v) in record.metadata {
                    payload.insert(k, v.into());
                }
                PointStruct::new(record.id, record.vector, payload)
            })
            .collect();

        self.client
            .upsert_points(UpsertPointsBuilder::new(collection, points).wait(true))
            .await
            .map_err(|e| RagError::VectorStore(e.to_string()))?;

        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        vector: &[f32],
        k: usize,
    ) -> postal_assistant_core::Result<Vec<VectorMatch>> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let results = self
            .client
            .search_points(
                SearchPointsBuilder::new(collection, vector.to_vec(), k as u64).with_payload(true),
            )
            .await
            .map_err(|e| RagError::Search(e.to_string()))?;

        let matches = results
            .result
            .into_iter()
            .map(|point| {
                let mut metadata = HashMap::new();
                let mut content = String::new();

                for (k, v) in point.payload {
                    if let Some(Kind::StringValue(s)) = v.kind {
                        if k == CONTENT_KEY {
                            content = s;
                        } else {
                            metadata.insert(k, s);
                        }
                    }
                }

                let id = point
                    .id
                    .and_then(|pid| pid.point_id_options)
                    .map(|options| match options {
                        PointIdOptions::Uuid(u) => u,
                        PointIdOptions::Num(n) => n.to_string(),
                    })
                    .unwrap_or_default();

                VectorMatch {
                    id,
                    content,
                    similarity: point.score,
                    metadata,
                }
            })
            .collect();

        Ok(matches)
    }

    async fn count(&self, collection: &str) -> postal_assistant_core::Result<u64> {
        if !self.exists(collection).await? {
            return Ok(0);
        }

        let response = self
            .client
            .count(CountPointsBuilder::new(collection).exact(true))
            .await
            .map_err(|e| RagError::VectorStore(e.to_string()))?;

        Ok(response.result.map(|r| r.count).unwrap_or(0))
    }
}
