//! Function-calling tools for the postal assistant
//!
//! Postal tools call the carrier's JSON API; question answering delegates to
//! the cached retrieval chain. All tools are registered in a [`ToolRegistry`]
//! that applies per-tool timeouts.

pub mod arguments;
pub mod delivery_cost;
pub mod delivery_date;
pub mod package_info;
pub mod postal_api;
pub mod question_answering;
pub mod registry;

use std::sync::Arc;

use postal_assistant_config::{AgentConfig, PostalApiConfig, TariffConfig};
use postal_assistant_core::{QuestionAnswerer, ToolError};

pub use delivery_cost::{DeliveryCostTool, Shipment};
pub use delivery_date::DeliveryDateTool;
pub use package_info::PackageInfoTool;
pub use postal_api::{PostalApiClient, PostalResponse};
pub use question_answering::QuestionAnsweringTool;
pub use registry::{ToolExecutor, ToolRegistry};

/// Registry with every assistant tool
pub fn create_registry(
    postal_api: &PostalApiConfig,
    tariff: &TariffConfig,
    agent: &AgentConfig,
    answerer: Arc<dyn QuestionAnswerer>,
) -> Result<ToolRegistry, ToolError> {
    let api = Arc::new(PostalApiClient::new(postal_api)?);
    let qa_timeout = agent.question_answering_timeout_secs();

    let mut registry = ToolRegistry::new();
    registry.register(PackageInfoTool::new(api.clone(), agent.tool_timeout_secs));
    registry.register(DeliveryCostTool::new(tariff.clone()));
    registry.register(DeliveryDateTool::new(api, agent.tool_timeout_secs));
    registry.register(QuestionAnsweringTool::new(answerer, qa_timeout));

    tracing::info!(tools = ?registry.tool_names(), "Tool registry created");
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use postal_assistant_core::{ChatTurn, Result};

    struct StaticAnswerer;

    #[async_trait]
    impl QuestionAnswerer for StaticAnswerer {
        async fn answer(&self, _question: &str, _history: &[ChatTurn]) -> Result<String> {
            Ok("Так".to_string())
        }
    }

    #[test]
    fn test_create_registry() {
        let registry = create_registry(
            &PostalApiConfig::default(),
            &TariffConfig::default(),
            &AgentConfig::default(),
            Arc::new(StaticAnswerer),
        )
        .unwrap();

        assert_eq!(
            registry.tool_names(),
            vec![
                "package_info",
                "calculate_delivery_cost",
                "estimate_delivery_date",
                "question_answering"
            ]
        );
        assert!(registry.is_return_direct("question_answering"));
        assert!(!registry.is_return_direct("package_info"));
    }
}
