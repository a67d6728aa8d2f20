//! Agent, conversation and postal tool configuration

use serde::{Deserialize, Serialize};

use crate::constants::{conversation, endpoints, tariff, timeouts};

/// Tool-calling agent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Model/tool round trips per message
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// Per-tool execution timeout
    #[serde(default = "default_tool_timeout")]
    pub tool_timeout_secs: u64,
}

impl AgentConfig {
    /// Timeout for the question-answering tool, which chains model calls
    pub fn question_answering_timeout_secs(&self) -> u64 {
        self.tool_timeout_secs.max(timeouts::QUESTION_ANSWERING_SECS)
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            tool_timeout_secs: default_tool_timeout(),
        }
    }
}

fn default_max_iterations() -> usize {
    conversation::MAX_AGENT_ITERATIONS
}

fn default_tool_timeout() -> u64 {
    timeouts::TOOL_DEFAULT_SECS
}

/// History windows, in exchanges
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationConfig {
    #[serde(default = "default_condense_window")]
    pub condense_window: usize,

    #[serde(default = "default_chat_window")]
    pub chat_window: usize,

    /// Transcript retention in the persistent store
    #[serde(default = "default_transcript_ttl")]
    pub transcript_ttl_secs: u64,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            condense_window: default_condense_window(),
            chat_window: default_chat_window(),
            transcript_ttl_secs: default_transcript_ttl(),
        }
    }
}

fn default_condense_window() -> usize {
    conversation::CONDENSE_WINDOW
}

fn default_chat_window() -> usize {
    conversation::CHAT_WINDOW
}

fn default_transcript_ttl() -> u64 {
    conversation::TRANSCRIPT_TTL_SECS
}

/// Nova Poshta API access
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostalApiConfig {
    #[serde(default = "default_postal_endpoint")]
    pub endpoint: String,

    /// API key (falls back to NOVA_POST_API_KEY)
    #[serde(default = "default_postal_key")]
    pub api_key: String,

    #[serde(default = "default_postal_timeout")]
    pub timeout_secs: u64,
}

impl Default for PostalApiConfig {
    fn default() -> Self {
        Self {
            endpoint: default_postal_endpoint(),
            api_key: default_postal_key(),
            timeout_secs: default_postal_timeout(),
        }
    }
}

fn default_postal_endpoint() -> String {
    endpoints::NOVA_POSHTA_API.to_string()
}

fn default_postal_key() -> String {
    std::env::var("NOVA_POST_API_KEY").unwrap_or_default()
}

fn default_postal_timeout() -> u64 {
    timeouts::POSTAL_API_SECS
}

/// Price multiplier for one package type
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PackageTariff {
    pub package_type: String,
    pub multiplier: f64,
}

impl PackageTariff {
    fn new(package_type: &str, multiplier: f64) -> Self {
        Self {
            package_type: package_type.to_string(),
            multiplier,
        }
    }
}

/// Delivery cost estimate parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TariffConfig {
    #[serde(default = "default_base_fee")]
    pub base_fee: f64,

    /// Price per billable kilogram
    #[serde(default = "default_per_kg")]
    pub per_kg: f64,

    /// Share of the declared value charged as insurance
    #[serde(default = "default_declared_value_rate")]
    pub declared_value_rate: f64,

    /// cm³ per volumetric kilogram
    #[serde(default = "default_volumetric_divisor")]
    pub volumetric_divisor: f64,

    /// Accepted package types, in the order presented to the model
    #[serde(default = "default_package_types")]
    pub package_types: Vec<PackageTariff>,
}

impl TariffConfig {
    pub fn multiplier(&self, package_type: &str) -> Option<f64> {
        self.package_types
            .iter()
            .find(|p| p.package_type == package_type)
            .map(|p| p.multiplier)
    }

    pub fn package_type_names(&self) -> Vec<String> {
        self.package_types
            .iter()
            .map(|p| p.package_type.clone())
            .collect()
    }
}

impl Default for TariffConfig {
    fn default() -> Self {
        Self {
            base_fee: default_base_fee(),
            per_kg: default_per_kg(),
            declared_value_rate: default_declared_value_rate(),
            volumetric_divisor: default_volumetric_divisor(),
            package_types: default_package_types(),
        }
    }
}

fn default_base_fee() -> f64 {
    tariff::BASE_FEE
}

fn default_per_kg() -> f64 {
    tariff::PER_KG
}

fn default_declared_value_rate() -> f64 {
    tariff::DECLARED_VALUE_RATE
}

fn default_volumetric_divisor() -> f64 {
    tariff::VOLUMETRIC_DIVISOR
}

fn default_package_types() -> Vec<PackageTariff> {
    vec![
        PackageTariff::new("Вантажі", 1.0),
        PackageTariff::new("Документи", 0.8),
        PackageTariff::new("Шини та диски", 1.2),
        PackageTariff::new("Палети", 2.5),
    ]
}
