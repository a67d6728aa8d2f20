//! Per-session chat entry point

use std::sync::Arc;
use std::time::Instant;

use postal_assistant_core::{recent_window, ChatTurn, ConversationStore, ToolContext};

use crate::dispatcher::ToolDispatcher;
use crate::AgentError;

/// Loads the recent transcript, runs the dispatcher, records the exchange
pub struct ChatHandler {
    dispatcher: Arc<ToolDispatcher>,
    store: Arc<dyn ConversationStore>,
    /// Exchanges handed to the dispatcher
    window: usize,
}

impl ChatHandler {
    pub fn new(
        dispatcher: Arc<ToolDispatcher>,
        store: Arc<dyn ConversationStore>,
        window: usize,
    ) -> Self {
        Self {
            dispatcher,
            store,
            window,
        }
    }

    pub fn dispatcher(&self) -> &Arc<ToolDispatcher> {
        &self.dispatcher
    }

    pub async fn handle(&self, session_id: &str, message: &str) -> Result<String, AgentError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(AgentError::InvalidInput("message is empty".to_string()));
        }

        let started = Instant::now();
        let result = self.respond(session_id, message).await;

        let outcome = if result.is_ok() { "ok" } else { "error" };
        metrics::counter!("chat_requests_total", "outcome" => outcome).increment(1);
        metrics::histogram!("chat_latency_seconds").record(started.elapsed().as_secs_f64());

        match &result {
            Ok(reply) => tracing::debug!(
                session_id,
                reply_len = reply.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Chat turn completed"
            ),
            Err(e) => tracing::warn!(session_id, error = %e, "Chat turn failed"),
        }
        result
    }

    async fn respond(&self, session_id: &str, message: &str) -> Result<String, AgentError> {
        let transcript = self.store.messages(session_id).await?;
        let history = recent_window(&transcript, self.window).to_vec();
        let context = ToolContext::new(session_id, history);

        let reply = self.dispatcher.run(message, &context).await?;

        self.store
            .append(session_id, &[ChatTurn::human(message), ChatTurn::ai(reply.as_str())])
            .await?;
        Ok(reply)
    }

    /// Full stored transcript, oldest first
    pub async fn transcript(&self, session_id: &str) -> Result<Vec<ChatTurn>, AgentError> {
        Ok(self.store.messages(session_id).await?)
    }

    pub async fn reset(&self, session_id: &str) -> Result<(), AgentError> {
        self.store.clear(session_id).await?;
        tracing::info!(session_id, "Chat transcript cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use postal_assistant_core::{
        GenerateRequest, GenerateResponse, LanguageModel, Result, ToolDefinition,
    };
    use postal_assistant_persistence::InMemoryConversationStore;
    use postal_assistant_tools::ToolRegistry;

    /// Echoes the user message and records the system prompt
    #[derive(Default)]
    struct EchoLlm {
        system_prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl LanguageModel for EchoLlm {
        async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse> {
            self.system_prompts.lock().push(request.messages[0].content.clone());
            Ok(GenerateResponse::text(format!("Ви написали: {}", request.messages[1].content)))
        }

        async fn generate_with_tools(
            &self,
            request: GenerateRequest,
            _tools: &[ToolDefinition],
        ) -> Result<GenerateResponse> {
            self.generate(request).await
        }

        async fn is_available(&self) -> bool {
            true
        }

        fn model_name(&self) -> &str {
            "echo"
        }
    }

    fn handler(llm: Arc<EchoLlm>, window: usize) -> ChatHandler {
        let dispatcher = ToolDispatcher::new(llm, Arc::new(ToolRegistry::new()), 3);
        ChatHandler::new(
            Arc::new(dispatcher),
            Arc::new(InMemoryConversationStore::new()),
            window,
        )
    }

    #[tokio::test]
    async fn test_exchange_is_recorded() {
        let chat = handler(Arc::new(EchoLlm::default()), 4);

        let reply = chat.handle("s1", "  Привіт ").await.unwrap();
        assert_eq!(reply, "Ви написали: Привіт");

        let transcript = chat.transcript("s1").await.unwrap();
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[0].content, "Привіт");
        assert_eq!(transcript[1].content, "Ви написали: Привіт");
        assert!(chat.transcript("s2").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_history_window() {
        let llm = Arc::new(EchoLlm::default());
        let chat = handler(llm.clone(), 1);

        chat.handle("s1", "перше").await.unwrap();
        chat.handle("s1", "друге").await.unwrap();
        chat.handle("s1", "третє").await.unwrap();

        let prompts = llm.system_prompts.lock();
        assert!(!prompts[0].contains("Human:"));
        assert!(prompts[2].contains("Human: друге"));
        assert!(!prompts[2].contains("Human: перше"));
    }

    #[tokio::test]
    async fn test_empty_message_rejected() {
        let chat = handler(Arc::new(EchoLlm::default()), 4);
        let err = chat.handle("s1", "   ").await.unwrap_err();
        assert!(matches!(err, AgentError::InvalidInput(_)));
        assert!(chat.transcript("s1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reset() {
        let chat = handler(Arc::new(EchoLlm::default()), 4);
        chat.handle("s1", "Привіт").await.unwrap();
        chat.reset("s1").await.unwrap();
        assert!(chat.transcript("s1").await.unwrap().is_empty());
    }
}
