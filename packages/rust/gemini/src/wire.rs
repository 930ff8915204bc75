//! Gemini REST payloads.
//!
//! ```json
//! {
//!   "contents": [{ "role": "user", "parts": [{ "text": "Hello" }] }],
//!   "systemInstruction": { "parts": [{ "text": "You are helpful" }] },
//!   "tools": [{ "googleSearch": {} }],
//!   "generationConfig": { "thinkingConfig": { "thinkingBudget": 2048 } }
//! }
//! ```

use prepagent_shared::{Source, Turn};
use serde::{Deserialize, Serialize};

use crate::DEFAULT_SOURCE_TITLE;

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<Tool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    pub fn user(text: &str) -> Self {
        Self {
            role: Some("user".into()),
            parts: vec![Part::text(text)],
        }
    }

    /// System instructions carry no role.
    pub fn system(text: &str) -> Self {
        Self {
            role: None,
            parts: vec![Part::text(text)],
        }
    }

    pub fn from_turn(turn: &Turn) -> Self {
        Self {
            role: Some(turn.role.as_str().into()),
            parts: vec![Part::text(&turn.text)],
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Set on reasoning summaries, which are not part of the answer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thought: Option<bool>,
}

impl Part {
    fn text(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            thought: None,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Tool {
    pub google_search: GoogleSearch,
}

#[derive(Debug, Serialize)]
pub(crate) struct GoogleSearch {}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerationConfig {
    pub thinking_config: ThinkingConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ThinkingConfig {
    pub thinking_budget: u32,
}

// ---------------------------------------------------------------------------
// Response
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
    #[serde(default)]
    pub grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GroundingMetadata {
    #[serde(default)]
    pub grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct GroundingChunk {
    #[serde(default)]
    pub web: Option<WebChunk>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct WebChunk {
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

impl GenerateContentResponse {
    /// Answer text of the first candidate, skipping thought parts.
    /// `None` when there is no text part at all.
    pub fn text(&self) -> Option<String> {
        let parts = &self.candidates.first()?.content.as_ref()?.parts;
        let mut out: Option<String> = None;
        for part in parts {
            if part.thought == Some(true) {
                continue;
            }
            if let Some(text) = &part.text {
                out.get_or_insert_with(String::new).push_str(text);
            }
        }
        out
    }

    /// Web citations of the first candidate, in response order.
    pub fn citations(&self) -> Vec<Source> {
        let Some(metadata) = self
            .candidates
            .first()
            .and_then(|c| c.grounding_metadata.as_ref())
        else {
            return Vec::new();
        };

        metadata
            .grounding_chunks
            .iter()
            .filter_map(|chunk| chunk.web.as_ref())
            .filter_map(|web| {
                let uri = web.uri.as_deref().filter(|u| !u.is_empty())?;
                Some(Source {
                    uri: uri.to_string(),
                    title: web
                        .title
                        .clone()
                        .filter(|t| !t.is_empty())
                        .unwrap_or_else(|| DEFAULT_SOURCE_TITLE.to_string()),
                })
            })
            .collect()
    }
}

/// Error envelope returned by the REST API.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use prepagent_shared::ChatRole;

    #[test]
    fn request_serializes_in_camel_case() {
        let request = GenerateContentRequest {
            contents: vec![
                Content::from_turn(&Turn {
                    role: ChatRole::Model,
                    text: "Welcome".into(),
                }),
                Content::user("Hi"),
            ],
            system_instruction: Some(Content::system("Be brief")),
            tools: vec![Tool {
                google_search: GoogleSearch {},
            }],
            generation_config: Some(GenerationConfig {
                thinking_config: ThinkingConfig {
                    thinking_budget: 2048,
                },
            }),
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["contents"][0]["role"], "model");
        assert_eq!(json["contents"][1]["parts"][0]["text"], "Hi");
        assert!(json["systemInstruction"].get("role").is_none());
        assert_eq!(json["tools"][0]["googleSearch"], serde_json::json!({}));
        assert_eq!(
            json["generationConfig"]["thinkingConfig"]["thinkingBudget"],
            2048
        );
    }

    #[test]
    fn tools_and_config_omitted_when_absent() {
        let request = GenerateContentRequest {
            contents: vec![Content::user("Hi")],
            system_instruction: None,
            tools: Vec::new(),
            generation_config: None,
        };
        let json = serde_json::to_string(&request).unwrap();
        assert_eq!(json, r#"{"contents":[{"role":"user","parts":[{"text":"Hi"}]}]}"#);
    }

    #[test]
    fn response_text_skips_thoughts() {
        let json = r##"{"candidates":[{"content":{"role":"model","parts":[
            {"text":"planning...","thought":true},
            {"text":"# Plan"},
            {"text":"\n- item"}
        ]}}]}"##;
        let resp: GenerateContentResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.text().as_deref(), Some("# Plan\n- item"));
    }

    #[test]
    fn response_without_text_parts_has_no_text() {
        let resp: GenerateContentResponse =
            serde_json::from_str(r#"{"candidates":[]}"#).unwrap();
        assert!(resp.text().is_none());

        let resp: GenerateContentResponse =
            serde_json::from_str(r#"{"candidates":[{"finishReason":"SAFETY"}]}"#).unwrap();
        assert!(resp.text().is_none());
    }

    #[test]
    fn citations_default_missing_titles() {
        let json = r#"{"candidates":[{"groundingMetadata":{"groundingChunks":[
            {"web":{"uri":"https://a.com","title":"A"}},
            {"web":{"uri":"https://b.com"}},
            {"retrievedContext":{"uri":"ignored"}},
            {"web":{"title":"no uri"}}
        ]}}]}"#;
        let resp: GenerateContentResponse = serde_json::from_str(json).unwrap();
        let citations = resp.citations();
        assert_eq!(citations.len(), 2);
        assert_eq!(citations[0].title, "A");
        assert_eq!(citations[1].uri, "https://b.com");
        assert_eq!(citations[1].title, DEFAULT_SOURCE_TITLE);
    }
}
