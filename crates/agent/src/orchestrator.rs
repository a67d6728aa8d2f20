//! Cached conversational retrieval-QA
//!
//! Flow for one question:
//! 1. Cache check on the raw question
//! 2. Condense against the recent window when there is history
//! 3. Cache check on the condensed question
//! 4. Retrieve, prompt, generate
//! 5. Cache the answer under the question used for retrieval
//!
//! Any failure propagates; nothing is cached for a failed request.

use async_trait::async_trait;
use std::sync::Arc;

use postal_assistant_core::{
    recent_window, ChatTurn, LanguageModel, QuestionAnswerer, Result, Retriever,
};
use postal_assistant_llm::{answer_request, condense_request};
use postal_assistant_rag::CompletionCache;

pub struct CachedConversationalQa {
    llm: Arc<dyn LanguageModel>,
    retriever: Arc<dyn Retriever>,
    cache: Arc<CompletionCache>,
    /// Exchanges consulted for condensation
    condense_window: usize,
}

impl CachedConversationalQa {
    pub fn new(
        llm: Arc<dyn LanguageModel>,
        retriever: Arc<dyn Retriever>,
        cache: Arc<CompletionCache>,
        condense_window: usize,
    ) -> Self {
        Self {
            llm,
            retriever,
            cache,
            condense_window,
        }
    }

    /// Rewrite a follow-up as a standalone question
    async fn condense(&self, question: &str, recent: &[ChatTurn]) -> Result<String> {
        let request = condense_request(recent, question)?;
        let response = self.llm.generate(request).await?;
        let condensed = response.text.trim();

        if condensed.is_empty() {
            tracing::warn!(question, "Condensation returned nothing, keeping the original");
            return Ok(question.to_string());
        }
        Ok(condensed.to_string())
    }
}

#[async_trait]
impl QuestionAnswerer for CachedConversationalQa {
    async fn answer(&self, question: &str, history: &[ChatTurn]) -> Result<String> {
        if let Some(answer) = self.cache.get(question).await? {
            tracing::debug!(question, "Answered from cache");
            return Ok(answer);
        }

        let recent = recent_window(history, self.condense_window);
        let question = if recent.is_empty() {
            question.to_string()
        } else {
            let condensed = self.condense(question, recent).await?;
            tracing::debug!(original = question, condensed = %condensed, "Condensed follow-up");

            if let Some(answer) = self.cache.get(&condensed).await? {
                tracing::debug!(question = %condensed, "Answered from cache after condensation");
                return Ok(answer);
            }
            condensed
        };

        let documents = self.retriever.retrieve(&question).await?;
        tracing::debug!(
            question = %question,
            documents = documents.len(),
            retriever = self.retriever.name(),
            "Retrieved context"
        );

        let request = answer_request(&documents, &question)?;
        let answer = self.llm.generate(request).await?.text;

        self.cache.set(&question, &answer).await?;
        Ok(answer)
    }
}
