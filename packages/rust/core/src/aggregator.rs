//! Stream aggregation: turns chat increments into rendering-ready message snapshots.
//!
//! A model message moves through `Pending → Streaming → Complete | Failed`.
//! Text is only ever appended. Citations are merged into an insertion-ordered
//! set keyed by URI where the first title seen wins. A full snapshot is
//! republished after every increment, before the next one is polled.

use std::collections::HashSet;

use futures::StreamExt;
use prepagent_gemini::{ChatIncrement, IncrementStream};
use prepagent_shared::{ChatMessage, MessageId, Result, Source};
use tracing::{debug, warn};

/// Lifecycle of one in-flight model message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamPhase {
    /// Created, no text yet.
    Pending,
    /// At least one non-empty fragment received.
    Streaming,
    /// Stream exhausted without error.
    Complete,
    /// Stream raised an error; partial text is kept.
    Failed,
}

impl StreamPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Failed)
    }
}

// ---------------------------------------------------------------------------
// SourceSet
// ---------------------------------------------------------------------------

/// Insertion-ordered citation set keyed by URI, maintained incrementally.
#[derive(Debug, Clone, Default)]
pub struct SourceSet {
    ordered: Vec<Source>,
    seen: HashSet<String>,
}

impl SourceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert unless the URI is already present. Returns whether it was added.
    pub fn insert(&mut self, source: Source) -> bool {
        if self.seen.contains(&source.uri) {
            return false;
        }
        self.seen.insert(source.uri.clone());
        self.ordered.push(source);
        true
    }

    pub fn extend<I: IntoIterator<Item = Source>>(&mut self, sources: I) -> usize {
        sources.into_iter().filter(|s| self.insert(s.clone())).count()
    }

    pub fn as_slice(&self) -> &[Source] {
        &self.ordered
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }
}

// ---------------------------------------------------------------------------
// StreamAggregator
// ---------------------------------------------------------------------------

/// Reducer for a single streamed model message.
#[derive(Debug, Clone)]
pub struct StreamAggregator {
    id: MessageId,
    text: String,
    sources: SourceSet,
    phase: StreamPhase,
    /// Cleared by the first increment of any kind, or by a terminal phase.
    thinking: bool,
}

impl Default for StreamAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamAggregator {
    /// A fresh aggregator for a new model message in `Pending`.
    pub fn new() -> Self {
        Self {
            id: MessageId::new(),
            text: String::new(),
            sources: SourceSet::new(),
            phase: StreamPhase::Pending,
            thinking: true,
        }
    }

    pub fn message_id(&self) -> MessageId {
        self.id
    }

    pub fn phase(&self) -> StreamPhase {
        self.phase
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn sources(&self) -> &SourceSet {
        &self.sources
    }

    /// Current rendering state of the message.
    pub fn snapshot(&self) -> ChatMessage {
        let mut message = ChatMessage::model(self.text.clone());
        message.id = self.id;
        message.sources = (!self.sources.is_empty()).then(|| self.sources.as_slice().to_vec());
        message.is_thinking = self.thinking;
        message
    }

    /// Fold one increment into the message and return the snapshot to publish.
    pub fn apply(&mut self, increment: &ChatIncrement) -> ChatMessage {
        if self.phase.is_terminal() {
            warn!(id = %self.id, phase = ?self.phase, "increment after stream ended, ignoring");
            return self.snapshot();
        }

        self.thinking = false;
        if let Some(fragment) = increment.text.as_deref().filter(|f| !f.is_empty()) {
            self.text.push_str(fragment);
            if self.phase == StreamPhase::Pending {
                debug!(id = %self.id, "first text fragment received");
                self.phase = StreamPhase::Streaming;
            }
        }

        let added = self.sources.extend(increment.citations.iter().cloned());
        if added > 0 {
            debug!(id = %self.id, added, total = self.sources.len(), "merged citations");
        }

        self.snapshot()
    }

    /// Mark the stream exhausted and return the final snapshot.
    pub fn complete(&mut self) -> ChatMessage {
        if !self.phase.is_terminal() {
            self.phase = StreamPhase::Complete;
        }
        self.thinking = false;
        self.snapshot()
    }

    /// Mark the stream failed, keeping partial text, and return the final snapshot.
    pub fn fail(&mut self) -> ChatMessage {
        if !self.phase.is_terminal() {
            self.phase = StreamPhase::Failed;
        }
        self.thinking = false;
        self.snapshot()
    }
}

// ---------------------------------------------------------------------------
// Publishing
// ---------------------------------------------------------------------------

/// Receives every republished message snapshot, in order.
pub trait MessagePublisher: Send {
    fn publish(&mut self, message: &ChatMessage);
}

impl<F> MessagePublisher for F
where
    F: FnMut(&ChatMessage) + Send,
{
    fn publish(&mut self, message: &ChatMessage) {
        self(message)
    }
}

/// Drain `stream` through `aggregator`, publishing after each increment.
///
/// The final snapshot (complete or failed) is published before returning.
/// The first stream error ends aggregation and is returned.
pub async fn aggregate(
    mut stream: IncrementStream,
    aggregator: &mut StreamAggregator,
    publisher: &mut dyn MessagePublisher,
) -> Result<()> {
    let mut increments = 0usize;

    while let Some(item) = stream.next().await {
        match item {
            Ok(increment) => {
                increments += 1;
                let snapshot = aggregator.apply(&increment);
                publisher.publish(&snapshot);
            }
            Err(e) => {
                warn!(id = %aggregator.message_id(), increments, error = %e, "chat stream failed");
                publisher.publish(&aggregator.fail());
                return Err(e);
            }
        }
    }

    debug!(
        id = %aggregator.message_id(),
        increments,
        text_len = aggregator.text().len(),
        sources = aggregator.sources().len(),
        "chat stream complete"
    );
    publisher.publish(&aggregator.complete());
    Ok(())
}
