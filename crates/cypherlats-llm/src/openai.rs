//! OpenAI-compatible chat completions provider with SSE streaming
//!
//! Works against any endpoint that speaks `/chat/completions`
//! (OpenAI, Ollama, LM Studio, vLLM, hosted gateways).

use crate::provider::{LlmError, LlmProvider, LlmResult, LlmStream};
use crate::sse::{event_stream, SseEvent};
use crate::types::{LlmRequest, StreamDelta, Usage};
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

const OPENAI_API_URL: &str = "https://api.openai.com/v1";

pub struct OpenAiCompatProvider {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl OpenAiCompatProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: Some(api_key.into()),
            base_url: OPENAI_API_URL.to_string(),
        }
    }

    /// Local endpoints usually need no key.
    pub fn without_key(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: None,
            base_url: base_url.into(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait::async_trait]
impl LlmProvider for OpenAiCompatProvider {
    fn name(&self) -> &str { "openai" }

    async fn complete_stream(
        &self,
        request: LlmRequest,
        cancel: Option<CancellationToken>,
    ) -> LlmResult<LlmStream> {
        let body = build_request(&request);

        debug!("OpenAI-compatible request: model={} url={}", body.model, self.endpoint());

        let mut builder = self.client
            .post(self.endpoint())
            .header("content-type", "application/json")
            .json(&body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await?;
        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("OpenAI-compatible error {}: {}", status, error_text);
            return Err(LlmError::from_status(status, error_text));
        }

        let events = event_stream(response.bytes_stream(), cancel);
        let stream = events.filter_map(|event| async move {
            match event {
                Ok(event) => map_event(&event),
                Err(e) => Some(Err(e)),
            }
        });
        Ok(Box::pin(stream))
    }
}

fn build_request(request: &LlmRequest) -> ChatRequest {
    let mut messages = Vec::with_capacity(request.messages.len() + 1);
    if let Some(system) = &request.system {
        messages.push(ChatMessage { role: "system".into(), content: system.clone() });
    }
    messages.extend(request.messages.iter().map(|m| ChatMessage {
        role: m.role.clone(),
        content: m.content.clone(),
    }));
    ChatRequest {
        model: request.model.clone(),
        messages,
        max_tokens: request.max_tokens,
        temperature: request.temperature,
        stream: true,
    }
}

/// Translate one chat completions chunk into a delta.
pub(crate) fn map_event(event: &SseEvent) -> Option<LlmResult<StreamDelta>> {
    if event.data.trim() == "[DONE]" {
        return Some(Ok(StreamDelta::Done { stop_reason: None, usage: None }));
    }
    let chunk = match serde_json::from_str::<ChatChunk>(&event.data) {
        Ok(c) => c,
        Err(e) => return Some(Err(LlmError::InvalidResponse(e.to_string()))),
    };
    if let Some(err) = chunk.error {
        return Some(Err(LlmError::StreamError(err.message)));
    }
    let choice = chunk.choices.into_iter().next()?;
    if let Some(text) = choice.delta.content.filter(|t| !t.is_empty()) {
        return Some(Ok(StreamDelta::Text(text)));
    }
    if let Some(thinking) = choice.delta.reasoning_content.filter(|t| !t.is_empty()) {
        return Some(Ok(StreamDelta::Thinking(thinking)));
    }
    choice.finish_reason.map(|reason| {
        Ok(StreamDelta::Done {
            stop_reason: Some(reason),
            usage: chunk.usage.map(|u| Usage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            }),
        })
    })
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    stream: bool,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
    usage: Option<ChunkUsage>,
    error: Option<ChunkError>,
}

#[derive(Deserialize)]
struct ChunkChoice {
    delta: ChunkDelta,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ChunkDelta {
    content: Option<String>,
    reasoning_content: Option<String>,
}

#[derive(Deserialize)]
struct ChunkUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Deserialize)]
struct ChunkError {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LlmMessage;

    fn data(d: &str) -> SseEvent {
        SseEvent { event: String::new(), data: d.into() }
    }

    #[test]
    fn system_prompt_becomes_first_message() {
        let req = LlmRequest {
            model: "gpt-4o-mini".into(),
            messages: vec![LlmMessage::user("hi")],
            system: Some("be brief".into()),
            ..Default::default()
        };
        let body = build_request(&req);
        assert_eq!(body.messages.len(), 2);
        assert_eq!(body.messages[0].role, "system");
        assert_eq!(body.messages[1].content, "hi");
        assert!(body.stream);
    }

    #[test]
    fn endpoint_joins_without_double_slash() {
        let p = OpenAiCompatProvider::without_key("http://localhost:11434/v1/");
        assert_eq!(p.endpoint(), "http://localhost:11434/v1/chat/completions");
    }

    #[test]
    fn maps_content_chunk() {
        let e = data(r#"{"choices":[{"delta":{"content":"RETURN n"},"finish_reason":null}]}"#);
        match map_event(&e) {
            Some(Ok(StreamDelta::Text(t))) => assert_eq!(t, "RETURN n"),
            other => panic!("Expected text, got {:?}", other),
        }
    }

    #[test]
    fn maps_done_sentinel() {
        assert!(matches!(map_event(&data("[DONE]")), Some(Ok(StreamDelta::Done { .. }))));
    }

    #[test]
    fn maps_finish_reason() {
        let e = data(r#"{"choices":[{"delta":{},"finish_reason":"stop"}]}"#);
        match map_event(&e) {
            Some(Ok(StreamDelta::Done { stop_reason, .. })) => {
                assert_eq!(stop_reason.as_deref(), Some("stop"))
            }
            other => panic!("Expected done, got {:?}", other),
        }
    }

    #[test]
    fn malformed_chunk_is_invalid_response() {
        assert!(matches!(
            map_event(&data("{not json")),
            Some(Err(LlmError::InvalidResponse(_)))
        ));
    }
}
