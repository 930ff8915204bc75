//! HTTP client for the Gemini REST API.

use std::time::Duration;

use async_trait::async_trait;
use prepagent_shared::{AppConfig, PrepAgentError, Result, resolve_api_key};
use reqwest::{Client, Response};
use tracing::{debug, info, instrument};

use crate::stream::increments_from_sse;
use crate::wire::{
    Content, ErrorEnvelope, GenerateContentRequest, GenerateContentResponse, GenerationConfig,
    GoogleSearch, ThinkingConfig, Tool,
};
use crate::{ChatRequest, GenerateRequest, GenerateResponse, IncrementStream, ModelBackend};

/// User-Agent string for model requests.
const USER_AGENT: &str = concat!("PrepAgent/", env!("CARGO_PKG_VERSION"));

/// Header carrying the API key.
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Timeout for establishing a connection.
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Gemini REST client implementing [`ModelBackend`].
pub struct GeminiClient {
    http: Client,
    base_url: String,
    api_key: String,
    /// Whole-request timeout for non-streaming calls. Also the idle limit
    /// between reads, so a stalled chat stream fails instead of hanging.
    timeout: Duration,
}

impl GeminiClient {
    /// Build a client for `base_url` (e.g. `https://generativelanguage.googleapis.com/v1beta`).
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .read_timeout(timeout)
            .build()
            .map_err(|e| PrepAgentError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            timeout,
        })
    }

    /// Build a client from the `[gemini]` config section and the API key env var.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let api_key = resolve_api_key(config)?;
        Self::new(
            api_key,
            config.gemini.base_url.clone(),
            Duration::from_secs(config.gemini.timeout_secs),
        )
    }

    fn endpoint(&self, model: &str, method: &str) -> String {
        format!("{}/models/{model}:{method}", self.base_url)
    }
}

#[async_trait]
impl ModelBackend for GeminiClient {
    #[instrument(skip_all, fields(model = %request.model, prompt_len = request.prompt.len()))]
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse> {
        let body = GenerateContentRequest {
            contents: vec![Content::user(&request.prompt)],
            system_instruction: request.system_instruction.as_deref().map(Content::system),
            tools: Vec::new(),
            generation_config: request.thinking_budget.map(|budget| GenerationConfig {
                thinking_config: ThinkingConfig {
                    thinking_budget: budget,
                },
            }),
        };

        let url = self.endpoint(&request.model, "generateContent");
        debug!(%url, "sending generateContent");

        let response = self
            .http
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| PrepAgentError::Network(format!("generateContent: {e}")))?;
        let response = ensure_success(response).await?;

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| PrepAgentError::parse(format!("generateContent response: {e}")))?;

        let text = parsed.text();
        info!(text_len = text.as_ref().map_or(0, String::len), "generation complete");
        Ok(GenerateResponse { text })
    }

    #[instrument(skip_all, fields(model = %request.model, history = request.history.len()))]
    async fn stream_chat(&self, request: ChatRequest) -> Result<IncrementStream> {
        let mut contents: Vec<Content> = request.history.iter().map(Content::from_turn).collect();
        contents.push(Content::user(&request.message));

        let tools = if request.web_search {
            vec![Tool {
                google_search: GoogleSearch {},
            }]
        } else {
            Vec::new()
        };

        let body = GenerateContentRequest {
            contents,
            system_instruction: Some(Content::system(&request.system_instruction)),
            tools,
            generation_config: None,
        };

        let url = self.endpoint(&request.model, "streamGenerateContent");
        debug!(%url, web_search = request.web_search, "opening chat stream");

        let response = self
            .http
            .post(&url)
            .query(&[("alt", "sse")])
            .header(API_KEY_HEADER, &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| PrepAgentError::Network(format!("streamGenerateContent: {e}")))?;
        let response = ensure_success(response).await?;

        Ok(increments_from_sse(response))
    }
}

/// Map a non-2xx response to [`PrepAgentError::Api`], preferring the API's own message.
async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorEnvelope>(&body)
        .map(|env| env.error.message)
        .unwrap_or(body);

    Err(PrepAgentError::Api {
        status: status.as_u16(),
        message,
    })
}
