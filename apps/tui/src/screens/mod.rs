//! TUI screen definitions.
//!
//! Each screen is a tab holding its own form and scroll state. Screens read
//! the [`Assistant`] to render and answer key presses with an [`Action`] that
//! the app carries out.

mod interview;
mod knowledge;
mod planner;

use std::fmt;
use std::path::PathBuf;

use prepagent_shared::SnippetId;

pub(crate) use interview::InterviewScreen;
pub(crate) use knowledge::KnowledgeScreen;
pub(crate) use planner::PlannerScreen;

/// Screen identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScreenId {
    Knowledge,
    Planner,
    Interview,
}

impl fmt::Display for ScreenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Knowledge => write!(f, "Knowledge Base"),
            Self::Planner => write!(f, "Study Planner"),
            Self::Interview => write!(f, "Interview Agent"),
        }
    }
}

/// What a key press on a screen asks the app to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Action {
    None,
    Status(String),
    AddSnippet { title: String, content: String },
    ImportFile(PathBuf),
    RemoveSnippet(SnippetId),
    GeneratePlan { role: String, job_description: String },
    EditInputs,
    StartInterview,
    SendMessage(String),
}
