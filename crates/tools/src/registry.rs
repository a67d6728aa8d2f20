//! Tool registry
//!
//! Manages tool registration, discovery, and execution.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use postal_assistant_core::{Tool, ToolContext, ToolDefinition, ToolError, ToolOutput, ToolSchema};

/// Tool executor trait
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Execute a tool by name
    async fn execute(
        &self,
        name: &str,
        arguments: Value,
        context: &ToolContext,
    ) -> Result<ToolOutput, ToolError>;

    /// List available tools, in registration order
    fn list_tools(&self) -> Vec<ToolSchema>;

    /// Get tool schema by name
    fn get_tool(&self, name: &str) -> Option<ToolSchema>;

    /// Function-calling definitions for every tool
    fn definitions(&self) -> Vec<ToolDefinition> {
        self.list_tools().iter().map(ToolSchema::to_definition).collect()
    }

    /// Whether the tool's output is the final reply
    fn is_return_direct(&self, name: &str) -> bool;
}

/// Tool registry
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    by_name: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool, replacing any tool with the same name
    pub fn register<T: Tool>(&mut self, tool: T) {
        self.register_arc(Arc::new(tool));
    }

    pub fn register_arc(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        match self.by_name.get(&name) {
            Some(&i) => self.tools[i] = tool,
            None => {
                self.by_name.insert(name, self.tools.len());
                self.tools.push(tool);
            },
        }
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.by_name.get(name).map(|&i| &self.tools[i])
    }

    pub fn has(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.tools.iter().map(|t| t.name().to_string()).collect()
    }
}

#[async_trait]
impl ToolExecutor for ToolRegistry {
    /// Execute a tool with timeout protection
    async fn execute(
        &self,
        name: &str,
        arguments: Value,
        context: &ToolContext,
    ) -> Result<ToolOutput, ToolError> {
        let tool = self
            .get(name)
            .ok_or_else(|| ToolError::not_found(format!("Tool not found: {}", name)))?;

        tool.validate(&arguments)?;

        let timeout_secs = tool.timeout_secs();
        let started = Instant::now();

        tracing::debug!(tool = name, timeout_secs, "Executing tool");

        let result = match tokio::time::timeout(
            Duration::from_secs(timeout_secs),
            tool.execute_with_context(arguments, context),
        )
        .await
        {
            Ok(result) => result,
            Err(_elapsed) => Err(ToolError::timeout(name, timeout_secs)),
        };

        let outcome = match &result {
            Ok(output) if output.is_error => "error",
            Ok(_) => "ok",
            Err(_) => "failed",
        };
        metrics::counter!("tool_calls_total", "tool" => name.to_string(), "outcome" => outcome)
            .increment(1);

        match &result {
            Ok(_) => tracing::debug!(
                tool = name,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Tool finished"
            ),
            Err(e) => tracing::warn!(tool = name, error = %e, "Tool failed"),
        }

        result
    }

    fn list_tools(&self) -> Vec<ToolSchema> {
        self.tools.iter().map(|t| t.schema()).collect()
    }

    fn get_tool(&self, name: &str) -> Option<ToolSchema> {
        self.get(name).map(|t| t.schema())
    }

    fn is_return_direct(&self, name: &str) -> bool {
        self.get(name).map_or(false, |t| t.return_direct())
    }
}
