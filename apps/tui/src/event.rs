//! Events delivered to the UI loop.

use crossterm::event::KeyEvent;
use prepagent_core::conversation::TurnOutcome;
use prepagent_shared::{ChatMessage, Result, StudyPlan};

/// Everything the event loop reacts to. Background tasks only ever talk to
/// the UI through these.
#[derive(Debug)]
pub(crate) enum AppEvent {
    /// Keyboard input.
    Input(KeyEvent),
    /// Periodic tick, drives the thinking spinner.
    Tick,
    /// A plan request finished.
    PlanReady(Result<StudyPlan>),
    /// Newer state of the streaming model message.
    Snapshot(ChatMessage),
    /// A chat turn ended.
    TurnFinished(TurnOutcome),
}
