//! The interview conversation: ordered messages plus at most one in-flight turn.

use prepagent_shared::{ChatMessage, MessageId, PrepAgentError, Result, StudyPlan};
use tracing::{debug, warn};

use crate::aggregator::{StreamAggregator, StreamPhase};

/// Appended after a failed turn.
pub const STREAM_ERROR_NOTICE: &str =
    "I encountered an error connecting to the AI. Please try again.";

/// Opening model message for a new conversation.
pub fn welcome_message(plan: Option<&StudyPlan>) -> ChatMessage {
    let text = match plan {
        Some(plan) => format!(
            "I'm ready to help you prepare for the **{}** role. We can discuss your study plan, \
             run a mock interview, or go over specific case studies. What would you like to do?",
            plan.role
        ),
        None => "Please generate a study plan first, or we can just chat based on your \
                 Knowledge Base. What role are you preparing for?"
            .to_string(),
    };
    ChatMessage::model(text)
}

/// How a turn ended, reported back to the conversation that started it.
#[derive(Debug)]
pub struct TurnOutcome {
    /// Final snapshot of the model message.
    pub message: ChatMessage,
    pub phase: StreamPhase,
    /// Whether the chat stream was opened at all.
    pub opened: bool,
    /// Set when the request or the stream failed.
    pub error: Option<PrepAgentError>,
}

impl TurnOutcome {
    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}

/// Messages in display order. Only the placeholder of the in-flight turn is
/// ever mutated, and only by replacing it with a newer snapshot.
#[derive(Debug, Clone)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
    in_flight: Option<MessageId>,
}

impl Conversation {
    /// A conversation holding only the welcome message.
    pub fn new(plan: Option<&StudyPlan>) -> Self {
        Self {
            messages: vec![welcome_message(plan)],
            in_flight: None,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Whether a turn is in flight. New sends are rejected while this holds.
    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn in_flight(&self) -> Option<MessageId> {
        self.in_flight
    }

    /// Start a turn: append the user message and a thinking placeholder.
    ///
    /// Returns the prior history (excluding the new user message) and the
    /// aggregator that owns the placeholder.
    pub fn begin(&mut self, text: &str) -> Result<(Vec<ChatMessage>, StreamAggregator)> {
        if text.trim().is_empty() {
            return Err(PrepAgentError::validation("Type a message first."));
        }
        if self.is_loading() {
            return Err(PrepAgentError::validation(
                "Still waiting for the previous answer.",
            ));
        }

        let history = self.messages.clone();
        let aggregator = StreamAggregator::new();

        self.messages.push(ChatMessage::user(text));
        self.messages.push(aggregator.snapshot());
        self.in_flight = Some(aggregator.message_id());
        debug!(id = %aggregator.message_id(), history = history.len(), "turn started");

        Ok((history, aggregator))
    }

    /// Replace the in-flight placeholder with a newer snapshot.
    ///
    /// Snapshots for any other message are ignored.
    pub fn apply(&mut self, snapshot: ChatMessage) -> bool {
        if self.in_flight != Some(snapshot.id) {
            debug!(id = %snapshot.id, "snapshot for a message that is not in flight");
            return false;
        }
        match self.messages.iter_mut().rev().find(|m| m.id == snapshot.id) {
            Some(slot) => {
                *slot = snapshot;
                true
            }
            None => false,
        }
    }

    /// Close the in-flight turn.
    ///
    /// On failure [`STREAM_ERROR_NOTICE`] is appended. The model message is
    /// kept as last published unless the stream never opened, in which case
    /// the placeholder is dropped.
    pub fn finish(&mut self, outcome: TurnOutcome) {
        if self.in_flight != Some(outcome.message.id) {
            warn!(id = %outcome.message.id, "outcome for a turn that is not in flight");
            return;
        }
        self.in_flight = None;

        let id = outcome.message.id;
        self.apply_final(outcome.message);

        if let Some(err) = outcome.error {
            warn!(id = %id, opened = outcome.opened, error = %err, "turn failed");
            if !outcome.opened {
                self.messages.retain(|m| m.id != id);
            }
            self.messages.push(ChatMessage::model(STREAM_ERROR_NOTICE));
        }
    }

    fn apply_final(&mut self, message: ChatMessage) {
        if let Some(slot) = self.messages.iter_mut().rev().find(|m| m.id == message.id) {
            *slot = message;
        }
    }
}
