//! Prompt templates for the postal assistant
//!
//! Templates use `{name}` placeholders. Rendering fails loudly on a
//! placeholder left unfilled so a renamed variable cannot ship silently.

use postal_assistant_core::{buffer_string, ChatTurn, Document, GenerateRequest};

use crate::LlmError;

/// Answer a customer question from retrieved context
pub const ANSWER_TEMPLATE: &str = "\
You are an AI assistant answering customer questions about the services and processes of \
the postal company Nova Poshta. Use the pieces of context below to answer the user's question. \
Answer only in Ukrainian. Be concise and specific, and keep any links from the context intact.

CONTEXT:
{context}

USER QUESTION:
{question}

If the answer is not in the context, say that you do not have this information and suggest \
contacting Nova Poshta customer support. Do not make anything up.

ANSWER IN UKRAINIAN:";

/// Rewrite a follow-up as a standalone question
pub const CONDENSE_TEMPLATE: &str = "\
You help a Nova Poshta assistant understand follow-up questions. Given the conversation below \
and a follow-up input, rephrase the input as a standalone question that keeps every detail \
needed to answer it.

Last Messages:
{last_messages}

Human Follow Up Input:
{question}

If the input is not related to the conversation, return it unchanged.

REPHRASED QUESTION IN UKRAINIAN:";

/// System prompt of the tool-calling agent
pub const AGENT_SYSTEM_TEMPLATE: &str = "\
You are the AI assistant of the postal company Nova Poshta. You help customers track parcels, \
calculate the cost of services and find out delivery terms. Use the available tools to answer. \
For any general question about Nova Poshta services, use the question answering tool. \
Reply in the language of the customer.

Previous conversation:
{chat_messages}";

/// Appended after the user input to keep the agent on topic
pub const AGENT_GUARD: &str = "\
Do not answer questions that are not related to postal, logistics, delivery, courier and \
related services of Nova Poshta. Politely decline such questions.";

/// Separator between retrieved documents in the context block
pub const DOCUMENT_SEPARATOR: &str = "\n\n";

/// A template with `{name}` placeholders
#[derive(Debug, Clone, Copy)]
pub struct PromptTemplate {
    template: &'static str,
}

impl PromptTemplate {
    pub const fn new(template: &'static str) -> Self {
        Self { template }
    }

    /// Substitute every `{name}`; values are inserted verbatim
    pub fn render(&self, vars: &[(&str, &str)]) -> Result<String, LlmError> {
        let mut out = String::with_capacity(self.template.len());
        let mut rest = self.template;

        while let Some(start) = rest.find('{') {
            out.push_str(&rest[..start]);
            let after = &rest[start + 1..];
            let end = after.find('}').ok_or_else(|| {
                LlmError::Configuration("Unterminated placeholder in prompt template".to_string())
            })?;
            let name = &after[..end];
            let value = vars
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| *value)
                .ok_or_else(|| {
                    LlmError::Configuration(format!("Missing prompt variable: {}", name))
                })?;
            out.push_str(value);
            rest = &after[end + 1..];
        }
        out.push_str(rest);

        Ok(out)
    }
}

/// Retrieved documents joined into one context block
pub fn format_context(documents: &[Document]) -> String {
    documents
        .iter()
        .map(|doc| doc.content.trim())
        .collect::<Vec<_>>()
        .join(DOCUMENT_SEPARATOR)
}

/// Retrieval-augmented answer request
pub fn answer_request(documents: &[Document], question: &str) -> Result<GenerateRequest, LlmError> {
    let context = format_context(documents);
    let prompt = PromptTemplate::new(ANSWER_TEMPLATE)
        .render(&[("context", &context), ("question", question)])?;
    Ok(GenerateRequest::from_user(prompt))
}

/// Follow-up condensation request
pub fn condense_request(history: &[ChatTurn], question: &str) -> Result<GenerateRequest, LlmError> {
    let last_messages = buffer_string(history);
    let prompt = PromptTemplate::new(CONDENSE_TEMPLATE)
        .render(&[("last_messages", &last_messages), ("question", question)])?;
    Ok(GenerateRequest::from_user(prompt))
}

/// Agent request: system prompt with history, the user input, then the guard note
pub fn agent_request(history: &[ChatTurn], input: &str) -> Result<GenerateRequest, LlmError> {
    let chat_messages = buffer_string(history);
    let system = PromptTemplate::new(AGENT_SYSTEM_TEMPLATE)
        .render(&[("chat_messages", &chat_messages)])?;
    Ok(GenerateRequest::new(system)
        .with_user_message(input)
        .with_system_message(AGENT_GUARD))
}

#[cfg(test)]
mod tests {
    use super::*;
    use postal_assistant_core::Role;

    #[test]
    fn test_render_substitutes_all() {
        let template = PromptTemplate::new("Q: {question} / C: {context}");
        let rendered = template
            .render(&[("question", "Скільки?"), ("context", "100 грн")])
            .unwrap();
        assert_eq!(rendered, "Q: Скільки? / C: 100 грн");
    }

    #[test]
    fn test_render_missing_variable() {
        let template = PromptTemplate::new("{question}");
        assert!(matches!(
            template.render(&[]),
            Err(LlmError::Configuration(_))
        ));
    }

    #[test]
    fn test_values_with_braces_are_not_expanded() {
        let template = PromptTemplate::new("{question}");
        let rendered = template.render(&[("question", "{context}")]).unwrap();
        assert_eq!(rendered, "{context}");
    }

    #[test]
    fn test_answer_request_includes_context() {
        let docs = vec![
            Document::new("1", "Відділення працюють з 8 до 20.", "info", "hours.txt"),
            Document::new("2", "https://novaposhta.ua/timetable", "links", "links.txt"),
        ];
        let request = answer_request(&docs, "Коли працюють відділення?").unwrap();
        assert_eq!(request.messages.len(), 1);
        let content = &request.messages[0].content;
        assert!(content.contains("Відділення працюють з 8 до 20.\n\nhttps://novaposhta.ua/timetable"));
        assert!(content.contains("Коли працюють відділення?"));
    }

    #[test]
    fn test_condense_request_renders_history() {
        let history = vec![ChatTurn::human("Скільки коштує доставка?"), ChatTurn::ai("Від 60 грн")];
        let request = condense_request(&history, "А до Львова?").unwrap();
        let content = &request.messages[0].content;
        assert!(content.contains("Human: Скільки коштує доставка?\nAI: Від 60 грн"));
        assert!(content.contains("А до Львова?"));
    }

    #[test]
    fn test_agent_request_layout() {
        let request = agent_request(&[], "Де моя посилка?").unwrap();
        assert_eq!(request.messages.len(), 3);
        assert_eq!(request.messages[0].role, Role::System);
        assert_eq!(request.messages[1].content, "Де моя посилка?");
        assert_eq!(request.messages[2].content, AGENT_GUARD);
    }
}
