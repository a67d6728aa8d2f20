//! Tool interface and schema types
//!
//! Tools are described to the model through [`ToolSchema`] and invoked with a
//! JSON object of arguments. Properties keep their declaration order, which is
//! also the order used when listing missing arguments back to the user.

use crate::{ChatTurn, ToolDefinition};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use thiserror::Error;

/// JSON-schema fragment for a single argument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertySchema {
    #[serde(rename = "type")]
    pub prop_type: String,
    pub description: String,
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,
}

impl PropertySchema {
    fn typed(prop_type: &str, description: impl Into<String>) -> Self {
        Self {
            prop_type: prop_type.to_string(),
            description: description.into(),
            enum_values: None,
        }
    }

    pub fn string(description: impl Into<String>) -> Self {
        Self::typed("string", description)
    }

    pub fn number(description: impl Into<String>) -> Self {
        Self::typed("number", description)
    }

    pub fn integer(description: impl Into<String>) -> Self {
        Self::typed("integer", description)
    }

    pub fn boolean(description: impl Into<String>) -> Self {
        Self::typed("boolean", description)
    }

    /// String restricted to a fixed set of values
    pub fn enum_type(description: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            enum_values: Some(values),
            ..Self::typed("string", description)
        }
    }
}

/// One declared argument
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaProperty {
    pub name: String,
    pub schema: PropertySchema,
    pub required: bool,
}

/// Object schema with ordered properties
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputSchema {
    pub properties: Vec<SchemaProperty>,
}

impl InputSchema {
    pub fn object() -> Self {
        Self::default()
    }

    pub fn property(mut self, name: impl Into<String>, schema: PropertySchema, required: bool) -> Self {
        self.properties.push(SchemaProperty {
            name: name.into(),
            schema,
            required,
        });
        self
    }

    pub fn get(&self, name: &str) -> Option<&SchemaProperty> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Required property names in declaration order
    pub fn required(&self) -> Vec<&str> {
        self.properties
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect()
    }

    /// JSON-schema object for function-calling APIs
    pub fn to_json(&self) -> Value {
        let mut properties = Map::new();
        for prop in &self.properties {
            properties.insert(
                prop.name.clone(),
                serde_json::to_value(&prop.schema).unwrap_or(Value::Null),
            );
        }
        json!({
            "type": "object",
            "properties": properties,
            "required": self.required(),
        })
    }
}

/// Full description of a tool as presented to the model
#[derive(Debug, Clone, PartialEq)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    pub input_schema: InputSchema,
}

impl ToolSchema {
    pub fn to_definition(&self) -> ToolDefinition {
        ToolDefinition::new(&self.name, &self.description, self.input_schema.to_json())
    }
}

/// Output content block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentBlock {
    Text { text: String },
}

/// Tool result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOutput {
    pub content: Vec<ContentBlock>,
    #[serde(default)]
    pub is_error: bool,
}

impl ToolOutput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::Text { text: text.into() }],
            is_error: false,
        }
    }

    pub fn json(value: Value) -> Self {
        let text = serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string());
        Self::text(text)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::Text { text: text.into() }],
            is_error: true,
        }
    }

    /// All text blocks joined by newlines
    pub fn as_text(&self) -> String {
        self.content
            .iter()
            .map(|block| match block {
                ContentBlock::Text { text } => text.as_str(),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    InvalidParams,
    NotFound,
    Timeout,
    Upstream,
    Internal,
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("{code:?}: {message}")]
pub struct ToolError {
    pub code: ErrorCode,
    pub message: String,
}

impl ToolError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidParams, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Upstream, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, message)
    }

    pub fn timeout(tool: &str, secs: u64) -> Self {
        Self::new(
            ErrorCode::Timeout,
            format!("Tool '{}' timed out after {}s", tool, secs),
        )
    }
}

impl From<ToolError> for crate::Error {
    fn from(err: ToolError) -> Self {
        match err.code {
            ErrorCode::Timeout => crate::Error::Timeout(err.message),
            _ => crate::Error::Tool(err.to_string()),
        }
    }
}

/// Per-request data a tool may need besides its arguments
#[derive(Debug, Clone, Default)]
pub struct ToolContext {
    pub session_id: Option<String>,
    /// Recent transcript, oldest first
    pub history: Vec<ChatTurn>,
}

impl ToolContext {
    pub fn new(session_id: impl Into<String>, history: Vec<ChatTurn>) -> Self {
        Self {
            session_id: Some(session_id.into()),
            history,
        }
    }
}

/// A callable the agent can select through function calling
#[async_trait]
pub trait Tool: Send + Sync + 'static {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn schema(&self) -> ToolSchema;

    async fn execute(&self, input: Value) -> Result<ToolOutput, ToolError>;

    /// Execute with request context; defaults to ignoring it
    async fn execute_with_context(
        &self,
        input: Value,
        _context: &ToolContext,
    ) -> Result<ToolOutput, ToolError> {
        self.execute(input).await
    }

    /// Structural validation run before execution.
    ///
    /// Absent arguments are not an error here: tools answer those with a
    /// prompt asking the user for the missing data.
    fn validate(&self, input: &Value) -> Result<(), ToolError> {
        if input.is_object() {
            Ok(())
        } else {
            Err(ToolError::invalid_params("arguments must be a JSON object"))
        }
    }

    fn timeout_secs(&self) -> u64 {
        30
    }

    /// Whether the output is the final reply, bypassing the model
    fn return_direct(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_schema_keeps_order() {
        let schema = InputSchema::object()
            .property("weight", PropertySchema::number("Вага"), true)
            .property("cost", PropertySchema::number("Вартість"), true)
            .property("note", PropertySchema::string("Примітка"), false);

        assert_eq!(schema.required(), vec!["weight", "cost"]);
        let json = schema.to_json();
        assert_eq!(json["type"], "object");
        assert_eq!(json["properties"]["weight"]["type"], "number");
        assert_eq!(json["required"][1], "cost");
    }

    #[test]
    fn test_enum_property_serializes() {
        let prop = PropertySchema::enum_type("Тип", vec!["A".into(), "B".into()]);
        let value = serde_json::to_value(&prop).unwrap();
        assert_eq!(value["enum"][1], "B");
        assert_eq!(value["type"], "string");
    }

    #[test]
    fn test_tool_output_text() {
        let output = ToolOutput::text("Статус: Доставлено");
        assert_eq!(output.as_text(), "Статус: Доставлено");
        assert!(!output.is_error);
        assert!(ToolOutput::error("boom").is_error);
    }

    #[test]
    fn test_tool_error_conversion() {
        let err: crate::Error = ToolError::timeout("package_info", 10).into();
        assert!(matches!(err, crate::Error::Timeout(_)));
        let err: crate::Error = ToolError::invalid_params("bad").into();
        assert!(matches!(err, crate::Error::Tool(_)));
    }
}
