//! SSE → [`IncrementStream`] adapter for `streamGenerateContent?alt=sse`.
//!
//! Each SSE `data:` payload is a complete `GenerateContentResponse` holding
//! the next text fragment and any grounding chunks seen so far:
//! ```text
//! data: {"candidates":[{"content":{"parts":[{"text":"Hel"}],"role":"model"}}]}
//!
//! data: {"candidates":[{"content":{"parts":[{"text":"lo"}]},"groundingMetadata":{...}}]}
//! ```

use eventsource_stream::Eventsource;
use futures::StreamExt;
use prepagent_shared::{PrepAgentError, Result};
use reqwest::Response;
use tracing::trace;

use crate::wire::{ErrorEnvelope, GenerateContentResponse};
use crate::{ChatIncrement, IncrementStream};

/// Convert a successful SSE response into a stream of chat increments.
pub(crate) fn increments_from_sse(response: Response) -> IncrementStream {
    let stream = response
        .bytes_stream()
        .eventsource()
        .filter_map(|event| async move {
            match event {
                Ok(event) => parse_event(&event.data).transpose(),
                Err(e) => Some(Err(PrepAgentError::Stream(e.to_string()))),
            }
        });

    Box::pin(stream)
}

/// Parse one SSE data payload.
///
/// Returns `Ok(None)` for keep-alives and the `[DONE]` marker, an increment
/// for every response chunk (even one with no text), and an error for
/// in-band API errors or malformed JSON.
pub(crate) fn parse_event(data: &str) -> Result<Option<ChatIncrement>> {
    let data = data.trim();
    if data.is_empty() || data == "[DONE]" {
        return Ok(None);
    }

    if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(data) {
        return Err(PrepAgentError::Stream(envelope.error.message));
    }

    let chunk: GenerateContentResponse = serde_json::from_str(data).map_err(|e| {
        PrepAgentError::Stream(format!(
            "malformed stream chunk: {e} (got: {})",
            data.chars().take(200).collect::<String>()
        ))
    })?;

    let increment = ChatIncrement {
        text: chunk.text(),
        citations: chunk.citations(),
    };
    trace!(
        text_len = increment.text.as_ref().map_or(0, String::len),
        citations = increment.citations.len(),
        "stream increment"
    );
    Ok(Some(increment))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_chunk_becomes_increment() {
        let data = r#"{"candidates":[{"content":{"parts":[{"text":"Hel"}],"role":"model"}}]}"#;
        let inc = parse_event(data).unwrap().unwrap();
        assert_eq!(inc.text.as_deref(), Some("Hel"));
        assert!(inc.citations.is_empty());
    }

    #[test]
    fn grounding_only_chunk_has_no_text() {
        let data = r#"{"candidates":[{"content":{"parts":[],"role":"model"},
            "groundingMetadata":{"groundingChunks":[{"web":{"uri":"a.com","title":"A2"}}]}}]}"#;
        let inc = parse_event(data).unwrap().unwrap();
        assert!(inc.text.is_none());
        assert_eq!(inc.citations.len(), 1);
        assert_eq!(inc.citations[0].title, "A2");
    }

    #[test]
    fn keepalive_and_done_are_skipped() {
        assert!(parse_event("").unwrap().is_none());
        assert!(parse_event("  [DONE] ").unwrap().is_none());
    }

    #[test]
    fn in_band_error_terminates() {
        let data = r#"{"error":{"code":429,"message":"Resource exhausted","status":"RESOURCE_EXHAUSTED"}}"#;
        let err = parse_event(data).unwrap_err();
        assert!(matches!(err, PrepAgentError::Stream(ref m) if m == "Resource exhausted"));
    }

    #[test]
    fn malformed_json_is_a_stream_error() {
        let err = parse_event("{not json").unwrap_err();
        assert!(err.to_string().contains("malformed stream chunk"));
    }
}
