//! Language Model traits

use crate::{GenerateRequest, GenerateResponse, Result, ToolDefinition};
use async_trait::async_trait;

/// Language Model interface
///
/// Implementations:
/// - `OpenAIBackend` - OpenAI-compatible chat completions
/// - `OllamaBackend` - Local Ollama inference
///
/// # Example
///
/// ```ignore
/// let llm: Arc<dyn LanguageModel> = Arc::new(OpenAIBackend::new(config)?);
/// let request = GenerateRequest::new("You are a postal assistant")
///     .with_user_message("Скільки коштує доставка?");
/// let response = llm.generate(request).await?;
/// println!("{}", response.text);
/// ```
#[async_trait]
pub trait LanguageModel: Send + Sync + 'static {
    /// Generate completion
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse>;

    /// Generate with tool/function calling
    ///
    /// The response may carry tool calls instead of (or in addition to) text.
    async fn generate_with_tools(
        &self,
        request: GenerateRequest,
        tools: &[ToolDefinition],
    ) -> Result<GenerateResponse>;

    /// Check if model is available
    async fn is_available(&self) -> bool;

    /// Get model name for logging
    fn model_name(&self) -> &str;
}
