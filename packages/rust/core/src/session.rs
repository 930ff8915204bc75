//! Interview chat context and the per-conversation model session.

use std::sync::Arc;

use prepagent_gemini::{ChatRequest, IncrementStream, ModelBackend};
use prepagent_shared::{ChatConfig, ChatMessage, KnowledgeSnippet, Result, Turn};
use tracing::{debug, instrument};

/// Render the knowledge base as `[title]: content` entries separated by blank lines.
pub fn format_chat_sources(snippets: &[KnowledgeSnippet]) -> String {
    snippets
        .iter()
        .map(|s| format!("[{}]: {}", s.title, s.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Build the system instruction reused for every turn of a conversation.
pub fn build_system_instruction(snippets: &[KnowledgeSnippet], context_role: &str) -> String {
    let sources = format_chat_sources(snippets);

    format!(
        "You are an interviewer helping a candidate prepare for the role of \"{context_role}\".

RESOURCE CONTEXT (the candidate's notes):
{sources}

INSTRUCTIONS:
1. Answer the candidate's questions or run a mock interview.
2. PRIORITIZE information found in the RESOURCE CONTEXT.
3. When the context does not cover the answer, use your Google Search tool to find current information.
4. Be critical but encouraging.
5. When asked for a \"Case Study\", generate a realistic scenario for this role.
"
    )
}

/// A model conversation seeded with a system instruction and prior turns.
///
/// Cheap to build; holds no connection. Each [`send`](Self::send) opens one
/// streaming request.
pub struct ChatSession {
    backend: Arc<dyn ModelBackend>,
    model: String,
    web_search: bool,
    system_instruction: String,
    history: Vec<Turn>,
}

impl ChatSession {
    /// Create a session. Prior messages are reduced to role + text.
    pub fn new(
        backend: Arc<dyn ModelBackend>,
        config: &ChatConfig,
        system_instruction: String,
        history: &[ChatMessage],
    ) -> Self {
        Self {
            backend,
            model: config.model.clone(),
            web_search: config.web_search,
            system_instruction,
            history: history.iter().map(ChatMessage::to_turn).collect(),
        }
    }

    pub fn history(&self) -> &[Turn] {
        &self.history
    }

    pub fn system_instruction(&self) -> &str {
        &self.system_instruction
    }

    /// Send a user message and return the response increments.
    #[instrument(skip_all, fields(model = %self.model, history = self.history.len()))]
    pub async fn send(&self, message: &str) -> Result<IncrementStream> {
        debug!(message_len = message.len(), "sending chat message");
        self.backend
            .stream_chat(ChatRequest {
                model: self.model.clone(),
                system_instruction: self.system_instruction.clone(),
                web_search: self.web_search,
                history: self.history.clone(),
                message: message.to_string(),
            })
            .await
    }
}
