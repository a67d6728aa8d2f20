//! Ollama backend using the native `/api/chat` endpoint

use async_trait::async_trait;
use postal_assistant_core::{
    FinishReason, GenerateRequest, GenerateResponse, LanguageModel, Message, Role, TokenUsage,
    ToolCall, ToolDefinition,
};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

use crate::LlmError;

#[derive(Debug, Clone)]
pub struct OllamaConfig {
    pub endpoint: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout: Duration,
    /// Keep the model loaded between requests
    pub keep_alive: String,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:11434".to_string(),
            model: "qwen2.5:7b".to_string(),
            max_tokens: 1024,
            temperature: 0.0,
            timeout: Duration::from_secs(60),
            keep_alive: "5m".to_string(),
        }
    }
}

#[derive(Clone)]
pub struct OllamaBackend {
    client: Client,
    config: OllamaConfig,
}

impl OllamaBackend {
    pub fn new(config: OllamaConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/api{}", self.config.endpoint.trim_end_matches('/'), path)
    }

    fn build_request(&self, request: GenerateRequest, tools: &[ToolDefinition]) -> OllamaChatRequest {
        OllamaChatRequest {
            model: request.model.unwrap_or_else(|| self.config.model.clone()),
            messages: request.messages.iter().map(OllamaMessage::from).collect(),
            stream: false,
            options: OllamaOptions {
                temperature: Some(request.temperature.unwrap_or(self.config.temperature)),
                num_predict: Some(request.max_tokens.unwrap_or(self.config.max_tokens) as i32),
            },
            keep_alive: Some(self.config.keep_alive.clone()),
            tools: tools
                .iter()
                .map(|def| OllamaTool {
                    tool_type: "function",
                    function: OllamaFunctionDef {
                        name: def.name.clone(),
                        description: def.description.clone(),
                        parameters: def.parameters.clone(),
                    },
                })
                .collect(),
        }
    }

    async fn execute_request(&self, request: &OllamaChatRequest) -> Result<GenerateResponse, LlmError> {
        let response = self
            .client
            .post(self.api_url("/chat"))
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error = response.text().await.unwrap_or_default();
            if status.as_u16() == 404 {
                return Err(LlmError::ModelNotFound(request.model.clone()));
            }
            return Err(LlmError::Api(format!("HTTP {}: {}", status, error)));
        }

        let result: OllamaChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        // Ollama does not assign call ids
        let tool_calls: Vec<ToolCall> = result
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .map(|(i, call)| {
                ToolCall::new(format!("call_{}", i), call.function.name, call.function.arguments)
            })
            .collect();

        let finish_reason = if !tool_calls.is_empty() {
            FinishReason::ToolCalls
        } else if result.done {
            FinishReason::Stop
        } else {
            FinishReason::Length
        };

        Ok(GenerateResponse {
            text: result.message.content,
            finish_reason,
            usage: match (result.prompt_eval_count, result.eval_count) {
                (Some(prompt), Some(completion)) => Some(TokenUsage::new(prompt, completion)),
                _ => None,
            },
            tool_calls,
        })
    }
}

#[async_trait]
impl LanguageModel for OllamaBackend {
    async fn generate(&self, request: GenerateRequest) -> postal_assistant_core::Result<GenerateResponse> {
        let body = self.build_request(request, &[]);
        Ok(self.execute_request(&body).await?)
    }

    async fn generate_with_tools(
        &self,
        request: GenerateRequest,
        tools: &[ToolDefinition],
    ) -> postal_assistant_core::Result<GenerateResponse> {
        let body = self.build_request(request, tools);
        Ok(self.execute_request(&body).await?)
    }

    async fn is_available(&self) -> bool {
        self.client
            .get(self.api_url("/tags"))
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

// Ollama API types
#[derive(Debug, Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    stream: bool,
    options: OllamaOptions,
    #[serde(skip_serializing_if = "Option::is_none")]
    keep_alive: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<OllamaTool>,
}

#[derive(Debug, Serialize, Deserialize)]
struct OllamaMessage {
    role: String,
    #[serde(default)]
    content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<OllamaToolCall>>,
}

impl From<&Message> for OllamaMessage {
    fn from(msg: &Message) -> Self {
        let role = match msg.role {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        };
        let tool_calls = if msg.tool_calls.is_empty() {
            None
        } else {
            Some(
                msg.tool_calls
                    .iter()
                    .map(|call| OllamaToolCall {
                        function: OllamaFunctionCall {
                            name: call.name.clone(),
                            arguments: call.arguments.clone(),
                        },
                    })
                    .collect(),
            )
        };
        Self {
            role: role.to_string(),
            content: msg.content.clone(),
            tool_calls,
        }
    }
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<i32>,
}

#[derive(Debug, Serialize)]
struct OllamaTool {
    #[serde(rename = "type")]
    tool_type: &'static str,
    function: OllamaFunctionDef,
}

#[derive(Debug, Serialize)]
struct OllamaFunctionDef {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct OllamaToolCall {
    function: OllamaFunctionCall,
}

/// Unlike OpenAI, arguments arrive as a JSON object
#[derive(Debug, Serialize, Deserialize)]
struct OllamaFunctionCall {
    name: String,
    #[serde(default)]
    arguments: HashMap<String, Value>,
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: OllamaMessage,
    done: bool,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn backend(endpoint: String) -> OllamaBackend {
        OllamaBackend::new(OllamaConfig {
            endpoint,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_request_serialization() {
        let backend = backend("http://localhost:11434".to_string());
        let body = backend.build_request(
            GenerateRequest::new("system")
                .with_user_message("Привіт")
                .with_temperature(0.2),
            &[],
        );
        let value = serde_json::to_value(&body).unwrap();

        assert_eq!(value["stream"], false);
        assert_eq!(value["messages"][0]["role"], "system");
        assert!((value["options"]["temperature"].as_f64().unwrap() - 0.2).abs() < 1e-6);
        assert!(value.get("tools").is_none());
    }

    #[tokio::test]
    async fn test_tool_call_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "message": {
                    "role": "assistant",
                    "content": "",
                    "tool_calls": [{
                        "function": {
                            "name": "estimate_delivery_date",
                            "arguments": {"city_sender": "Київ", "city_recipient": "Львів"}
                        }
                    }]
                },
                "done": true,
                "prompt_eval_count": 42,
                "eval_count": 7
            })))
            .mount(&server)
            .await;

        let response = backend(server.uri())
            .generate_with_tools(GenerateRequest::from_user("Коли дійде?"), &[])
            .await
            .unwrap();

        assert_eq!(response.finish_reason, FinishReason::ToolCalls);
        assert_eq!(response.tool_calls[0].id, "call_0");
        assert_eq!(response.tool_calls[0].get_string("city_recipient"), Some("Львів"));
        assert_eq!(response.usage.unwrap().total_tokens, 49);
    }

    #[tokio::test]
    async fn test_missing_model() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(404).set_body_string("model not found"))
            .mount(&server)
            .await;

        let err = backend(server.uri())
            .generate(GenerateRequest::from_user("Привіт"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Model not found"));
    }
}
