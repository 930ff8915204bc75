//! Shared types, error model, and configuration for PrepAgent.
//!
//! This crate is the foundation depended on by all other PrepAgent crates.
//! It provides:
//! - [`PrepAgentError`]: the unified error type
//! - Domain types ([`KnowledgeSnippet`], [`StudyPlan`], [`ChatMessage`], [`Turn`])
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, ChatConfig, GeminiConfig, PlanConfig, config_dir, config_file_path, init_config,
    load_config, load_config_from, resolve_api_key, validate_base_url,
};
pub use error::{PrepAgentError, Result};
pub use types::{
    ChatMessage, ChatRole, KnowledgeSnippet, MessageId, SnippetId, Source, StudyPlan, Turn,
};
