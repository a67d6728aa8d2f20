//! Text embeddings
//!
//! Remote embedders for OpenAI-compatible and Ollama servers, plus a hashing
//! embedder that needs no model at all.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use postal_assistant_config::{EmbeddingConfig, ModelProvider};
use postal_assistant_core::Embedder;

use crate::RagError;

fn http_client(timeout_secs: u64) -> Result<Client, RagError> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| RagError::Embedding(format!("Failed to create HTTP client: {}", e)))
}

async fn check_status(response: reqwest::Response, provider: &str) -> Result<reqwest::Response, RagError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    Err(RagError::Embedding(format!(
        "{} embedding failed: {} - {}",
        provider, status, text
    )))
}

/// Embedder for `/embeddings` on OpenAI-compatible servers
pub struct OpenAIEmbedder {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
    dimension: usize,
    batch_size: usize,
}

#[derive(Debug, Serialize)]
struct OpenAIEmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct OpenAIEmbeddingResponse {
    data: Vec<OpenAIEmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct OpenAIEmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

impl OpenAIEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Result<Self, RagError> {
        Ok(Self {
            client: http_client(config.timeout_secs)?,
            endpoint: config.endpoint().trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            dimension: config.dimension,
            batch_size: config.batch_size.max(1),
        })
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RagError> {
        let mut request = self
            .client
            .post(format!("{}/embeddings", self.endpoint))
            .json(&OpenAIEmbeddingRequest {
                model: &self.model,
                input: texts,
            });
        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key);
        }

        let response = check_status(request.send().await?, "OpenAI").await?;
        let mut body: OpenAIEmbeddingResponse = response
            .json()
            .await
            .map_err(|e| RagError::Embedding(format!("Failed to parse OpenAI response: {}", e)))?;

        if body.data.len() != texts.len() {
            return Err(RagError::Embedding(format!(
                "Expected {} embeddings, got {}",
                texts.len(),
                body.data.len()
            )));
        }

        body.data.sort_by_key(|d| d.index);
        Ok(body.data.into_iter().map(|d| d.embedding).collect())
    }
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    async fn embed_query(&self, text: &str) -> postal_assistant_core::Result<Vec<f32>> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| RagError::Embedding("No embedding returned".to_string()).into())
    }

    async fn embed_documents(&self, texts: &[String]) -> postal_assistant_core::Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(self.batch_size) {
            vectors.extend(self.embed_batch(chunk).await?);
        }
        Ok(vectors)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Embedder for Ollama's `/api/embed`
pub struct OllamaEmbedder {
    client: Client,
    endpoint: String,
    model: String,
    dimension: usize,
    batch_size: usize,
}

#[derive(Debug, Serialize)]
struct OllamaEmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct OllamaEmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

impl OllamaEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Result<Self, RagError> {
        Ok(Self {
            client: http_client(config.timeout_secs)?,
            endpoint: config.endpoint().trim_end_matches('/').to_string(),
            model: config.model.clone(),
            dimension: config.dimension,
            batch_size: config.batch_size.max(1),
        })
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RagError> {
        let response = self
            .client
            .post(format!("{}/api/embed", self.endpoint))
            .json(&OllamaEmbedRequest {
                model: &self.model,
                input: texts,
            })
            .send()
            .await
            .map_err(|e| RagError::Embedding(format!("Ollama request failed: {}", e)))?;

        let body: OllamaEmbedResponse = check_status(response, "Ollama")
            .await?
            .json()
            .await
            .map_err(|e| RagError::Embedding(format!("Failed to parse Ollama response: {}", e)))?;

        if body.embeddings.len() != texts.len() {
            return Err(RagError::Embedding(format!(
                "Expected {} embeddings, got {}",
                texts.len(),
                body.embeddings.len()
            )));
        }
        Ok(body.embeddings)
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    async fn embed_query(&self, text: &str) -> postal_assistant_core::Result<Vec<f32>> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| RagError::Embedding("No embedding returned".to_string()).into())
    }

    async fn embed_documents(&self, texts: &[String]) -> postal_assistant_core::Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(self.batch_size) {
            vectors.extend(self.embed_batch(chunk).await?);
        }
        Ok(vectors)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Bag-of-words embedder: each lower-cased word is hashed into a bucket
///
/// Texts sharing words get similar vectors. Useful offline and in tests.
pub struct HashingEmbedder {
    dimension: usize,
}

impl HashingEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    pub fn embed(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0f32; self.dimension];

        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let idx = (fnv1a(&word.to_lowercase()) % self.dimension as u64) as usize;
            embedding[idx] += 1.0;
        }

        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut embedding {
                *v /= norm;
            }
        }
        embedding
    }
}

fn fnv1a(text: &str) -> u64 {
    text.bytes().fold(0xcbf2_9ce4_8422_2325, |hash, byte| {
        (hash ^ byte as u64).wrapping_mul(0x0100_0000_01b3)
    })
}

#[async_trait]
impl Embedder for HashingEmbedder {
    async fn embed_query(&self, text: &str) -> postal_assistant_core::Result<Vec<f32>> {
        Ok(self.embed(text))
    }

    async fn embed_documents(&self, texts: &[String]) -> postal_assistant_core::Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed(t)).collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        "hashing"
    }
}

/// Build the embedder described by `config`
pub fn create_embedder(config: &EmbeddingConfig) -> Result<Arc<dyn Embedder>, RagError> {
    let embedder: Arc<dyn Embedder> = match config.provider {
        ModelProvider::OpenAi => Arc::new(OpenAIEmbedder::new(config)?),
        ModelProvider::Ollama => Arc::new(OllamaEmbedder::new(config)?),
    };

    tracing::info!(
        provider = ?config.provider,
        model = %config.model,
        dimension = config.dimension,
        "Created embedder"
    );
    Ok(embedder)
}
