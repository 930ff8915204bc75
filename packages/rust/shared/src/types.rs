//! Core domain types: knowledge snippets, study plans, and chat messages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper for knowledge snippet identifiers (time-sortable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SnippetId(pub Uuid);

impl SnippetId {
    /// Generate a new, never-reused snippet identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for SnippetId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SnippetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for SnippetId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Identifier of a single chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub Uuid);

impl MessageId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Knowledge
// ---------------------------------------------------------------------------

/// One free-text study note in the knowledge base.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeSnippet {
    pub id: SnippetId,
    /// Topic or title, never empty.
    pub title: String,
    /// Note body, never empty.
    pub content: String,
    /// When the note was added.
    pub date_added: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// StudyPlan
// ---------------------------------------------------------------------------

/// The result of one plan generation. Replaced wholesale, never patched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyPlan {
    /// Target role the plan was generated for.
    pub role: String,
    /// Job description, verbatim.
    pub job_description: String,
    /// Markdown document returned by the model.
    pub generated_plan: String,
}

// ---------------------------------------------------------------------------
// Chat
// ---------------------------------------------------------------------------

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

impl ChatRole {
    /// Wire name used by the model provider.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Model => "model",
        }
    }
}

/// A grounding citation attached to a model response.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Source {
    pub uri: String,
    pub title: String,
}

/// A message as shown in the conversation view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: MessageId,
    pub role: ChatRole,
    /// Accumulated text. Grows while a model message is streaming.
    pub text: String,
    /// Deduplicated grounding sources, `None` when there are none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<Source>>,
    /// Set while a model message is waiting for its first text.
    #[serde(default)]
    pub is_thinking: bool,
}

impl ChatMessage {
    /// A complete user message.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            role: ChatRole::User,
            text: text.into(),
            sources: None,
            is_thinking: false,
        }
    }

    /// A complete model message (welcome text, error notices).
    pub fn model(text: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            role: ChatRole::Model,
            text: text.into(),
            sources: None,
            is_thinking: false,
        }
    }

    /// Reduce to the wire representation sent as history.
    pub fn to_turn(&self) -> Turn {
        Turn {
            role: self.role,
            text: self.text.clone(),
        }
    }
}

/// A prior conversation turn as submitted to the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: ChatRole,
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snippet_id_roundtrip() {
        let id = SnippetId::new();
        let s = id.to_string();
        let parsed: SnippetId = s.parse().expect("parse SnippetId");
        assert_eq!(id, parsed);
    }

    #[test]
    fn snippet_ids_are_unique() {
        let a = SnippetId::new();
        let b = SnippetId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn chat_role_uses_provider_names() {
        assert_eq!(serde_json::to_string(&ChatRole::Model).unwrap(), r#""model""#);
        assert_eq!(ChatRole::User.as_str(), "user");
    }

    #[test]
    fn to_turn_drops_sources_and_flags() {
        let mut msg = ChatMessage::model("answer");
        msg.sources = Some(vec![Source {
            uri: "https://a.com".into(),
            title: "A".into(),
        }]);
        msg.is_thinking = true;

        let turn = msg.to_turn();
        assert_eq!(
            turn,
            Turn {
                role: ChatRole::Model,
                text: "answer".into()
            }
        );
    }
}
