//! Knowledge-base question answering exposed as a tool
//!
//! The answer is returned to the user verbatim; the agent does not rephrase it.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use postal_assistant_core::{
    InputSchema, PropertySchema, QuestionAnswerer, Tool, ToolContext, ToolError, ToolOutput,
    ToolSchema,
};

use crate::arguments::{self, missing_arguments_prompt};

const MISSING_HEADER: &str = "Щоб відповісти потрібно надати:\n";

pub struct QuestionAnsweringTool {
    answerer: Arc<dyn QuestionAnswerer>,
    timeout_secs: u64,
}

impl QuestionAnsweringTool {
    pub fn new(answerer: Arc<dyn QuestionAnswerer>, timeout_secs: u64) -> Self {
        Self {
            answerer,
            timeout_secs,
        }
    }
}

#[async_trait]
impl Tool for QuestionAnsweringTool {
    fn name(&self) -> &str {
        "question_answering"
    }

    fn description(&self) -> &str {
        "Useful for answering any type of questions, always use it if user asks a question"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: InputSchema::object().property(
                "question",
                PropertySchema::string(
                    "Question about postal, logistics, delivery, courier and related services and processes of the Nova Postha company",
                ),
                true,
            ),
        }
    }

    async fn execute(&self, input: Value) -> Result<ToolOutput, ToolError> {
        self.execute_with_context(input, &ToolContext::default()).await
    }

    async fn execute_with_context(
        &self,
        input: Value,
        context: &ToolContext,
    ) -> Result<ToolOutput, ToolError> {
        let Some(question) = arguments::text(&input, "question") else {
            return Ok(ToolOutput::text(missing_arguments_prompt(
                MISSING_HEADER,
                &self.schema().input_schema,
                &["question"],
            )));
        };

        let answer = self
            .answerer
            .answer(&question, &context.history)
            .await
            .map_err(|e| ToolError::upstream(e.to_string()))?;

        Ok(ToolOutput::text(answer))
    }

    fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }

    fn return_direct(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use postal_assistant_core::{ChatTurn, Error, Result};
    use serde_json::json;

    #[derive(Default)]
    struct RecordingAnswerer {
        seen: Mutex<Vec<(String, usize)>>,
    }

    #[async_trait]
    impl QuestionAnswerer for RecordingAnswerer {
        async fn answer(&self, question: &str, history: &[ChatTurn]) -> Result<String> {
            self.seen.lock().push((question.to_string(), history.len()));
            Ok(format!("Відповідь: {}", question))
        }
    }

    struct FailingAnswerer;

    #[async_trait]
    impl QuestionAnswerer for FailingAnswerer {
        async fn answer(&self, _question: &str, _history: &[ChatTurn]) -> Result<String> {
            Err(Error::Llm("model unavailable".to_string()))
        }
    }

    #[tokio::test]
    async fn test_answer_uses_history() {
        let answerer = Arc::new(RecordingAnswerer::default());
        let tool = QuestionAnsweringTool::new(answerer.clone(), 60);
        let context = ToolContext::new(
            "session-1",
            vec![ChatTurn::human("Привіт"), ChatTurn::ai("Вітаю! Чим допомогти?")],
        );

        let output = tool
            .execute_with_context(json!({"question": "Як оформити посилку?"}), &context)
            .await
            .unwrap();

        assert_eq!(output.as_text(), "Відповідь: Як оформити посилку?");
        assert_eq!(answerer.seen.lock()[0], ("Як оформити посилку?".to_string(), 2));
        assert!(tool.return_direct());
    }

    #[tokio::test]
    async fn test_missing_question() {
        let tool = QuestionAnsweringTool::new(Arc::new(RecordingAnswerer::default()), 60);
        let output = tool.execute(json!({"question": ""})).await.unwrap();
        assert!(output.as_text().starts_with("Щоб відповісти потрібно надати:\n1. Question about"));
    }

    #[tokio::test]
    async fn test_failure_propagates() {
        let tool = QuestionAnsweringTool::new(Arc::new(FailingAnswerer), 60);
        let err = tool.execute(json!({"question": "Що таке Нова Пошта?"})).await.unwrap_err();
        assert_eq!(err.code, postal_assistant_core::ErrorCode::Upstream);
    }
}
