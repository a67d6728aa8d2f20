//! Tool dispatch through native function calling
//!
//! The model sees every tool definition and either replies with text or
//! requests tool calls. Results of ordinary tools are fed back as tool
//! messages so the model can phrase the reply; a `return_direct` tool ends
//! the turn with its own output.

use std::sync::Arc;

use postal_assistant_core::{LanguageModel, Message, ToolContext};
use postal_assistant_llm::agent_request;
use postal_assistant_tools::ToolExecutor;

use crate::AgentError;

pub struct ToolDispatcher {
    llm: Arc<dyn LanguageModel>,
    tools: Arc<dyn ToolExecutor>,
    max_iterations: usize,
}

impl ToolDispatcher {
    pub fn new(
        llm: Arc<dyn LanguageModel>,
        tools: Arc<dyn ToolExecutor>,
        max_iterations: usize,
    ) -> Self {
        Self {
            llm,
            tools,
            max_iterations: max_iterations.max(1),
        }
    }

    pub fn tools(&self) -> &Arc<dyn ToolExecutor> {
        &self.tools
    }

    /// Reply to `input` given the recent history in `context`
    pub async fn run(&self, input: &str, context: &ToolContext) -> Result<String, AgentError> {
        let definitions = self.tools.definitions();
        let mut request = agent_request(&context.history, input)?;

        for iteration in 0..self.max_iterations {
            let response = self
                .llm
                .generate_with_tools(request.clone(), &definitions)
                .await?;

            if !response.has_tool_calls() {
                tracing::debug!(iteration, "Agent replied without tools");
                return Ok(response.text);
            }

            request.messages.push(Message::assistant_tool_calls(
                response.text.clone(),
                response.tool_calls.clone(),
            ));

            for call in &response.tool_calls {
                tracing::debug!(iteration, tool = %call.name, "Model requested tool");

                if self.tools.get_tool(&call.name).is_none() {
                    tracing::warn!(tool = %call.name, "Model requested an unknown tool");
                    request.messages.push(Message::tool(
                        format!("Unknown tool: {}", call.name),
                        &call.id,
                    ));
                    continue;
                }

                let direct = self.tools.is_return_direct(&call.name);
                match self
                    .tools
                    .execute(&call.name, call.arguments_json(), context)
                    .await
                {
                    Ok(output) if direct => return Ok(output.as_text()),
                    Ok(output) => request.messages.push(Message::tool(output.as_text(), &call.id)),
                    Err(e) if direct => return Err(e.into()),
                    Err(e) => request
                        .messages
                        .push(Message::tool(format!("Error: {}", e.message), &call.id)),
                }
            }
        }

        // Out of iterations: ask for a plain reply from what was gathered
        tracing::warn!(
            max_iterations = self.max_iterations,
            "Agent hit the iteration limit"
        );
        let response = self.llm.generate(request).await?;
        Ok(response.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use postal_assistant_core::{
        ChatTurn, GenerateRequest, GenerateResponse, InputSchema, PropertySchema, Result, Role,
        Tool, ToolCall, ToolDefinition, ToolError, ToolOutput, ToolSchema,
    };
    use postal_assistant_tools::ToolRegistry;
    use serde_json::{json, Value};
    use std::collections::{HashMap, VecDeque};

    /// Replies from a queue and keeps each request it saw
    struct ScriptedLlm {
        replies: Mutex<VecDeque<GenerateResponse>>,
        requests: Mutex<Vec<GenerateRequest>>,
    }

    impl ScriptedLlm {
        fn new(replies: Vec<GenerateResponse>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                requests: Mutex::default(),
            }
        }
    }

    #[async_trait]
    impl LanguageModel for ScriptedLlm {
        async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse> {
            self.requests.lock().push(request);
            Ok(self
                .replies
                .lock()
                .pop_front()
                .unwrap_or_else(|| GenerateResponse::text("Не можу відповісти")))
        }

        async fn generate_with_tools(
            &self,
            request: GenerateRequest,
            tools: &[ToolDefinition],
        ) -> Result<GenerateResponse> {
            assert!(!tools.is_empty());
            self.generate(request).await
        }

        async fn is_available(&self) -> bool {
            true
        }

        fn model_name(&self) -> &str {
            "scripted"
        }
    }

    struct OfficeHoursTool;

    #[async_trait]
    impl Tool for OfficeHoursTool {
        fn name(&self) -> &str {
            "office_hours"
        }

        fn description(&self) -> &str {
            "Office opening hours"
        }

        fn schema(&self) -> ToolSchema {
            ToolSchema {
                name: self.name().to_string(),
                description: self.description().to_string(),
                input_schema: InputSchema::object().property(
                    "office",
                    PropertySchema::string("Номер відділення"),
                    true,
                ),
            }
        }

        async fn execute(&self, input: Value) -> std::result::Result<ToolOutput, ToolError> {
            let office = input.get("office").and_then(Value::as_str).unwrap_or("?");
            Ok(ToolOutput::text(format!("Відділення {}: 8:00-20:00", office)))
        }
    }

    struct DirectTool {
        fail: bool,
    }

    #[async_trait]
    impl Tool for DirectTool {
        fn name(&self) -> &str {
            "question_answering"
        }

        fn description(&self) -> &str {
            "Answers questions"
        }

        fn schema(&self) -> ToolSchema {
            ToolSchema {
                name: self.name().to_string(),
                description: self.description().to_string(),
                input_schema: InputSchema::object(),
            }
        }

        async fn execute(&self, _input: Value) -> std::result::Result<ToolOutput, ToolError> {
            if self.fail {
                Err(ToolError::upstream("LLM error: HTTP 500"))
            } else {
                Ok(ToolOutput::text("Пряма відповідь"))
            }
        }

        fn return_direct(&self) -> bool {
            true
        }
    }

    fn call(id: &str, name: &str, args: &[(&str, Value)]) -> GenerateResponse {
        let arguments: HashMap<String, Value> =
            args.iter().map(|(k, v)| (k.to_string(), v.clone())).collect();
        GenerateResponse::with_tool_calls(vec![ToolCall::new(id, name, arguments)])
    }

    fn dispatcher(llm: Arc<ScriptedLlm>, fail_direct: bool) -> ToolDispatcher {
        let mut registry = ToolRegistry::new();
        registry.register(OfficeHoursTool);
        registry.register(DirectTool { fail: fail_direct });
        ToolDispatcher::new(llm, Arc::new(registry), 3)
    }

    #[tokio::test]
    async fn test_plain_reply() {
        let llm = Arc::new(ScriptedLlm::new(vec![GenerateResponse::text("Вітаю!")]));
        let reply = dispatcher(llm.clone(), false)
            .run("Привіт", &ToolContext::default())
            .await
            .unwrap();

        assert_eq!(reply, "Вітаю!");
        let request = &llm.requests.lock()[0];
        assert_eq!(request.messages[1].content, "Привіт");
        assert_eq!(request.messages[2].role, Role::System);
    }

    #[tokio::test]
    async fn test_tool_result_is_fed_back() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            call("call-1", "office_hours", &[("office", json!("5"))]),
            GenerateResponse::text("Відділення 5 працює з 8:00 до 20:00."),
        ]));
        let reply = dispatcher(llm.clone(), false)
            .run("Коли працює відділення 5?", &ToolContext::default())
            .await
            .unwrap();

        assert_eq!(reply, "Відділення 5 працює з 8:00 до 20:00.");
        let requests = llm.requests.lock();
        let follow_up = requests[1].messages.last().unwrap();
        assert_eq!(follow_up.role, Role::Tool);
        assert_eq!(follow_up.tool_call_id.as_deref(), Some("call-1"));
        assert_eq!(follow_up.content, "Відділення 5: 8:00-20:00");
    }

    #[tokio::test]
    async fn test_return_direct_skips_model() {
        let llm = Arc::new(ScriptedLlm::new(vec![call("call-1", "question_answering", &[])]));
        let reply = dispatcher(llm.clone(), false)
            .run("Що таке Нова Пошта?", &ToolContext::new("s1", vec![ChatTurn::human("Привіт")]))
            .await
            .unwrap();

        assert_eq!(reply, "Пряма відповідь");
        assert_eq!(llm.requests.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_return_direct_failure_propagates() {
        let llm = Arc::new(ScriptedLlm::new(vec![call("call-1", "question_answering", &[])]));
        let err = dispatcher(llm, true)
            .run("Що таке Нова Пошта?", &ToolContext::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::Tool(_)));
    }

    #[tokio::test]
    async fn test_unknown_tool_is_reported_to_model() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            call("call-1", "book_courier", &[]),
            GenerateResponse::text("Я не можу викликати кур'єра."),
        ]));
        let reply = dispatcher(llm.clone(), false)
            .run("Викличте кур'єра", &ToolContext::default())
            .await
            .unwrap();

        assert_eq!(reply, "Я не можу викликати кур'єра.");
        let requests = llm.requests.lock();
        assert_eq!(
            requests[1].messages.last().unwrap().content,
            "Unknown tool: book_courier"
        );
    }

    #[tokio::test]
    async fn test_iteration_limit() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            call("c1", "office_hours", &[("office", json!("1"))]),
            call("c2", "office_hours", &[("office", json!("2"))]),
            call("c3", "office_hours", &[("office", json!("3"))]),
            GenerateResponse::text("Відділення 1-3 працюють з 8:00 до 20:00."),
        ]));
        let reply = dispatcher(llm.clone(), false)
            .run("Коли працюють відділення?", &ToolContext::default())
            .await
            .unwrap();

        assert_eq!(reply, "Відділення 1-3 працюють з 8:00 до 20:00.");
        assert_eq!(llm.requests.lock().len(), 4);
    }
}
