//! Application configuration for PrepAgent.
//!
//! User config lives at `~/.prepagent/prepagent.toml`.
//! Launch flags override the file location; missing files fall back to defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{PrepAgentError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "prepagent.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".prepagent";

// ---------------------------------------------------------------------------
// Config structs (matching prepagent.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Gemini connection settings.
    #[serde(default)]
    pub gemini: GeminiConfig,

    /// Study plan generation settings.
    #[serde(default)]
    pub plan: PlanConfig,

    /// Interview chat settings.
    #[serde(default)]
    pub chat: ChatConfig,
}

/// `[gemini]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// REST base URL, including the API version segment.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Timeout in seconds: the whole request for plan generation, and the
    /// longest gap between reads for a chat stream.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_api_key_env() -> String {
    "GEMINI_API_KEY".into()
}
fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".into()
}
fn default_timeout_secs() -> u64 {
    120
}

/// `[plan]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanConfig {
    /// Model used for the one-shot study plan.
    #[serde(default = "default_plan_model")]
    pub model: String,

    /// Reasoning token budget requested from the model.
    #[serde(default = "default_thinking_budget")]
    pub thinking_budget: u32,

    /// System instruction sent with the plan prompt.
    #[serde(default = "default_plan_system_instruction")]
    pub system_instruction: String,
}

impl Default for PlanConfig {
    fn default() -> Self {
        Self {
            model: default_plan_model(),
            thinking_budget: default_thinking_budget(),
            system_instruction: default_plan_system_instruction(),
        }
    }
}

fn default_plan_model() -> String {
    "gemini-3-pro-preview".into()
}
fn default_thinking_budget() -> u32 {
    2048
}
fn default_plan_system_instruction() -> String {
    "You are a precise and structured educational assistant.".into()
}

/// `[chat]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Model used for the interview conversation.
    #[serde(default = "default_chat_model")]
    pub model: String,

    /// Whether the web-search grounding tool is enabled.
    #[serde(default = "default_true")]
    pub web_search: bool,

    /// Role assumed when no study plan has been generated.
    #[serde(default = "default_role")]
    pub default_role: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            model: default_chat_model(),
            web_search: true,
            default_role: default_role(),
        }
    }
}

fn default_chat_model() -> String {
    "gemini-2.5-flash".into()
}
fn default_true() -> bool {
    true
}
fn default_role() -> String {
    "General Interview Candidate".into()
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.prepagent/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| PrepAgentError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.prepagent/prepagent.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| PrepAgentError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        PrepAgentError::config(format!("failed to parse {}: {e}", path.display()))
    })?;
    validate_base_url(&config.gemini.base_url)?;
    Ok(config)
}

/// Write a default config file to `path` (or the default location).
/// Returns the path to the created file.
pub fn init_config(path: Option<&Path>) -> Result<PathBuf> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => config_file_path()?,
    };
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| PrepAgentError::io(dir, e))?;
    }

    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| PrepAgentError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| PrepAgentError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Read the Gemini API key from the env var named in the config.
pub fn resolve_api_key(config: &AppConfig) -> Result<String> {
    let var_name = &config.gemini.api_key_env;
    match std::env::var(var_name) {
        Ok(val) if !val.trim().is_empty() => Ok(val),
        _ => Err(PrepAgentError::config(format!(
            "Gemini API key not found. Set the {var_name} environment variable.\n\
             Get a key at https://aistudio.google.com/apikey"
        ))),
    }
}

/// Check that the configured base URL is an absolute http(s) URL.
pub fn validate_base_url(base_url: &str) -> Result<()> {
    let url = Url::parse(base_url)
        .map_err(|e| PrepAgentError::config(format!("invalid gemini.base_url {base_url:?}: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(PrepAgentError::config(format!(
            "gemini.base_url must use http or https, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("GEMINI_API_KEY"));
        assert!(toml_str.contains("gemini-2.5-flash"));
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[chat]
model = "gemini-2.5-pro"
web_search = false
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.chat.model, "gemini-2.5-pro");
        assert!(!config.chat.web_search);
        assert_eq!(config.chat.default_role, "General Interview Candidate");
        assert_eq!(config.plan.thinking_budget, 2048);
        assert_eq!(config.plan.model, "gemini-3-pro-preview");
    }

    #[test]
    fn api_key_resolution_reports_missing_var() {
        let mut config = AppConfig::default();
        // Use a unique env var name to avoid interfering with other tests
        config.gemini.api_key_env = "PA_TEST_NONEXISTENT_KEY_12345".into();
        let result = resolve_api_key(&config);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("API key not found"));
    }

    #[test]
    fn base_url_validation() {
        assert!(validate_base_url("https://generativelanguage.googleapis.com/v1beta").is_ok());
        assert!(validate_base_url("http://127.0.0.1:8080").is_ok());
        assert!(validate_base_url("ftp://example.com").is_err());
        assert!(validate_base_url("not a url").is_err());
    }

    #[test]
    fn init_then_load_from_custom_path() {
        let dir = std::env::temp_dir().join(format!("prepagent-cfg-{}", uuid::Uuid::now_v7()));
        let path = dir.join("prepagent.toml");

        let written = init_config(Some(&path)).expect("init config");
        assert_eq!(written, path);

        let loaded = load_config_from(&path).expect("load config");
        assert_eq!(loaded.gemini.timeout_secs, 120);
        assert!(loaded.chat.web_search);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
