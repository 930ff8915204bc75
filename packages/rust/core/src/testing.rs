//! Scripted in-memory [`ModelBackend`] for unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use futures::stream;
use prepagent_gemini::{
    ChatIncrement, ChatRequest, GenerateRequest, GenerateResponse, IncrementStream, ModelBackend,
};
use prepagent_shared::{PrepAgentError, Result};

/// Outcome of one scripted `stream_chat` call.
pub(crate) type ScriptedStream = Result<Vec<Result<ChatIncrement>>>;

/// Replays queued responses and records every request it receives.
#[derive(Default)]
pub(crate) struct ScriptedBackend {
    generate: Mutex<VecDeque<Result<GenerateResponse>>>,
    streams: Mutex<VecDeque<ScriptedStream>>,
    generate_requests: Mutex<Vec<GenerateRequest>>,
    chat_requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedBackend {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_generate(self, result: Result<GenerateResponse>) -> Self {
        self.generate.lock().unwrap().push_back(result);
        self
    }

    pub(crate) fn with_stream(self, script: ScriptedStream) -> Self {
        self.streams.lock().unwrap().push_back(script);
        self
    }

    pub(crate) fn generate_requests(&self) -> Vec<GenerateRequest> {
        self.generate_requests.lock().unwrap().clone()
    }

    pub(crate) fn chat_requests(&self) -> Vec<ChatRequest> {
        self.chat_requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelBackend for ScriptedBackend {
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse> {
        self.generate_requests.lock().unwrap().push(request);
        self.generate
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(PrepAgentError::Network("no scripted response".into())))
    }

    async fn stream_chat(&self, request: ChatRequest) -> Result<IncrementStream> {
        self.chat_requests.lock().unwrap().push(request);
        let script = self
            .streams
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(PrepAgentError::Network("no scripted stream".into())))?;
        Ok(Box::pin(stream::iter(script)))
    }
}
