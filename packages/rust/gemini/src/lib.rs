//! Gemini model boundary for PrepAgent.
//!
//! Everything above this crate talks to the model through [`ModelBackend`]:
//! one non-streaming text generation call and one streaming chat call. The
//! production implementation is [`GeminiClient`], which speaks the Gemini
//! REST API (`generateContent` / `streamGenerateContent` over SSE).

mod client;
mod stream;
mod wire;

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use prepagent_shared::{Result, Source, Turn};

pub use client::GeminiClient;

/// Title given to a web citation that arrives without one.
pub const DEFAULT_SOURCE_TITLE: &str = "Web Source";

// ---------------------------------------------------------------------------
// Requests & responses
// ---------------------------------------------------------------------------

/// A one-shot text generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateRequest {
    /// Model identifier (e.g., `gemini-3-pro-preview`).
    pub model: String,
    /// The full prompt text.
    pub prompt: String,
    /// Optional persistent system instruction.
    pub system_instruction: Option<String>,
    /// Optional reasoning-depth hint (thinking token budget).
    pub thinking_budget: Option<u32>,
}

/// Result of a one-shot generation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerateResponse {
    /// Concatenated answer text, `None` when the model returned no text parts.
    pub text: Option<String>,
}

/// A streaming chat request: system instruction, prior turns, and the new message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    pub model: String,
    pub system_instruction: String,
    /// Enables the provider's web-search grounding tool.
    pub web_search: bool,
    /// Prior turns, oldest first.
    pub history: Vec<Turn>,
    /// The new user message.
    pub message: String,
}

/// One increment of a streamed chat response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatIncrement {
    /// Text fragment to append, if any.
    pub text: Option<String>,
    /// Grounding citations carried by this increment (may repeat earlier ones).
    pub citations: Vec<Source>,
}

impl ChatIncrement {
    /// An increment carrying only a text fragment.
    pub fn text(fragment: impl Into<String>) -> Self {
        Self {
            text: Some(fragment.into()),
            citations: Vec::new(),
        }
    }
}

/// A lazy, finite, non-restartable sequence of chat increments.
pub type IncrementStream = Pin<Box<dyn Stream<Item = Result<ChatIncrement>> + Send>>;

// ---------------------------------------------------------------------------
// Backend trait
// ---------------------------------------------------------------------------

/// The two model endpoints PrepAgent consumes.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Issue one non-streaming generation request.
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse>;

    /// Open a streaming chat response for `request.message`.
    ///
    /// Errors returned here mean no increment was ever produced; errors
    /// yielded by the stream terminate it.
    async fn stream_chat(&self, request: ChatRequest) -> Result<IncrementStream>;
}
