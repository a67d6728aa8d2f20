use crate::{ChatTurn, Result};
use async_trait::async_trait;

/// Answers free-form questions, using recent history to resolve follow-ups
#[async_trait]
pub trait QuestionAnswerer: Send + Sync + 'static {
    async fn answer(&self, question: &str, history: &[ChatTurn]) -> Result<String>;
}
