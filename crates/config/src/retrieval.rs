//! Knowledge base, retrieval and cache configuration

use serde::{Deserialize, Serialize};

use crate::constants::{cache, endpoints, retrieval};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum VectorStoreBackend {
    #[default]
    Qdrant,
    /// Process-local index, lost on restart
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorStoreConfig {
    #[serde(default)]
    pub backend: VectorStoreBackend,

    #[serde(default = "default_qdrant_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_qdrant_key")]
    pub api_key: Option<String>,
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            backend: VectorStoreBackend::Qdrant,
            endpoint: default_qdrant_endpoint(),
            api_key: default_qdrant_key(),
        }
    }
}

fn default_qdrant_endpoint() -> String {
    endpoints::QDRANT_DEFAULT.to_string()
}

fn default_qdrant_key() -> Option<String> {
    std::env::var("QDRANT_API_KEY").ok().filter(|k| !k.is_empty())
}

/// Knowledge directory: one subdirectory per collection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeConfig {
    #[serde(default = "default_knowledge_dir")]
    pub base_dir: String,

    /// Extension of document files, without the dot
    #[serde(default = "default_extension")]
    pub extension: String,

    /// Re-ingest every collection before serving
    #[serde(default)]
    pub ingest_on_startup: bool,
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            base_dir: default_knowledge_dir(),
            extension: default_extension(),
            ingest_on_startup: false,
        }
    }
}

fn default_knowledge_dir() -> String {
    "knowledge".to_string()
}

fn default_extension() -> String {
    "txt".to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    /// BM25 over the lexical index
    Lexical,
    /// Embedding similarity over the vector index
    Semantic,
}

/// One retrieval strategy over a collection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyConfig {
    pub kind: StrategyKind,

    #[serde(default = "default_k")]
    pub k: usize,

    /// Minimum similarity for semantic results
    #[serde(default)]
    pub score_threshold: Option<f32>,

    /// Weight in rank fusion
    #[serde(default = "default_weight")]
    pub weight: f32,
}

impl StrategyConfig {
    pub fn lexical(k: usize) -> Self {
        Self {
            kind: StrategyKind::Lexical,
            k,
            score_threshold: None,
            weight: default_weight(),
        }
    }

    pub fn semantic(k: usize, score_threshold: Option<f32>) -> Self {
        Self {
            kind: StrategyKind::Semantic,
            k,
            score_threshold,
            weight: default_weight(),
        }
    }
}

fn default_k() -> usize {
    3
}

fn default_weight() -> f32 {
    1.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionConfig {
    pub name: String,
    pub strategies: Vec<StrategyConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Collections in merge order
    #[serde(default = "default_collections")]
    pub collections: Vec<CollectionConfig>,

    #[serde(default = "default_rrf_k")]
    pub rrf_k: f32,

    /// "ukrainian" (default) or a tantivy snowball language such as "english";
    /// null disables stemming
    #[serde(default = "default_stemmer")]
    pub stemmer: Option<String>,

    #[serde(default = "default_max_token_length")]
    pub max_token_length: usize,
}

impl RetrievalConfig {
    pub fn collection(&self, name: &str) -> Option<&CollectionConfig> {
        self.collections.iter().find(|c| c.name == name)
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            collections: default_collections(),
            rrf_k: default_rrf_k(),
            stemmer: default_stemmer(),
            max_token_length: default_max_token_length(),
        }
    }
}

fn default_collections() -> Vec<CollectionConfig> {
    vec![
        CollectionConfig {
            name: retrieval::INFO_COLLECTION.to_string(),
            strategies: vec![
                StrategyConfig::lexical(1),
                StrategyConfig::semantic(3, Some(retrieval::SCORE_THRESHOLD)),
            ],
        },
        CollectionConfig {
            name: retrieval::LINKS_COLLECTION.to_string(),
            strategies: vec![StrategyConfig::semantic(1, None)],
        },
    ]
}

fn default_rrf_k() -> f32 {
    retrieval::RRF_K
}

fn default_stemmer() -> Option<String> {
    Some(retrieval::STEMMER.to_string())
}

fn default_max_token_length() -> usize {
    retrieval::MAX_TOKEN_LENGTH
}

/// Semantic completion cache
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_collection")]
    pub collection: String,

    /// Cosine distance below which a cached question matches
    #[serde(default = "default_cache_threshold")]
    pub score_threshold: f32,

    #[serde(default = "default_cache_namespace")]
    pub namespace: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            collection: default_cache_collection(),
            score_threshold: default_cache_threshold(),
            namespace: default_cache_namespace(),
        }
    }
}

fn default_cache_collection() -> String {
    cache::QUESTIONS_COLLECTION.to_string()
}

fn default_cache_threshold() -> f32 {
    cache::SCORE_THRESHOLD
}

fn default_cache_namespace() -> String {
    cache::ANSWER_NAMESPACE.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_collections() {
        let config = RetrievalConfig::default();
        let info = config.collection("info").unwrap();
        assert_eq!(info.strategies.len(), 2);
        assert_eq!(info.strategies[0].kind, StrategyKind::Lexical);
        assert_eq!(info.strategies[1].k, 3);
        assert_eq!(info.strategies[1].score_threshold, Some(0.35));

        let links = config.collection("links").unwrap();
        assert_eq!(links.strategies.len(), 1);
        assert!(config.collection("faq").is_none());
    }

    #[test]
    fn test_strategy_from_yaml() {
        let yaml = "kind: semantic\nk: 5\nscore_threshold: 0.4\n";
        let strategy: StrategyConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(strategy.kind, StrategyKind::Semantic);
        assert_eq!(strategy.k, 5);
        assert_eq!(strategy.weight, 1.0);
    }
}
