//! Anthropic Claude API provider with SSE streaming

use crate::provider::{LlmError, LlmProvider, LlmResult, LlmStream};
use crate::sse::{event_stream, SseEvent};
use crate::types::{LlmRequest, StreamDelta, Usage};
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

pub struct AnthropicProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl AnthropicProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: ANTHROPIC_API_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

#[async_trait::async_trait]
impl LlmProvider for AnthropicProvider {
    fn name(&self) -> &str { "anthropic" }

    async fn complete_stream(
        &self,
        request: LlmRequest,
        cancel: Option<CancellationToken>,
    ) -> LlmResult<LlmStream> {
        let body = AnthropicRequest {
            model: request.model.clone(),
            messages: request.messages.iter().map(|m| AnthropicMessage {
                role: m.role.clone(),
                content: m.content.clone(),
            }).collect(),
            max_tokens: request.max_tokens.unwrap_or(4096),
            stream: true,
            system: request.system.clone(),
            temperature: request.temperature,
        };

        debug!("Anthropic request: model={}", body.model);

        let response = self.client
            .post(&self.base_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Anthropic error {}: {}", status, error_text);
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

/// Translate one Anthropic SSE event into a delta. Events carrying nothing
/// the caller needs map to None.
pub(crate) fn map_event(event: &SseEvent) -> Option<LlmResult<StreamDelta>> {
    match event.event.as_str() {
        "content_block_delta" => {
            let data = serde_json::from_str::<ContentBlockDelta>(&event.data).ok()?;
            match data.delta {
                DeltaType::TextDelta { text } => Some(Ok(StreamDelta::Text(text))),
                DeltaType::ThinkingDelta { thinking } => Some(Ok(StreamDelta::Thinking(thinking))),
                DeltaType::Other => None,
            }
        }
        "message_delta" => {
            if let Ok(data) = serde_json::from_str::<MessageDelta>(&event.data) {
                if let Some(stop_reason) = data.delta.stop_reason {
                    debug!("Message complete: stop_reason={}", stop_reason);
                }
            }
            None
        }
        "message_stop" => Some(Ok(StreamDelta::Done {
            stop_reason: Some("end_turn".to_string()),
            usage: None,
        })),
        "error" => {
            let data = serde_json::from_str::<ErrorEvent>(&event.data).ok()?;
            Some(Err(LlmError::StreamError(data.error.message)))
        }
        _ => None,
    }
}

#[derive(Serialize)]
struct AnthropicRequest {
    model: String,
    messages: Vec<AnthropicMessage>,
    max_tokens: u32,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Serialize)]
struct AnthropicMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ContentBlockDelta {
    #[allow(dead_code)]
    index: u32,
    delta: DeltaType,
}

#[derive(Deserialize)]
#[serde(tag = "type")]
enum DeltaType {
    #[serde(rename = "text_delta")]
    TextDelta { text: String },
    #[serde(rename = "thinking_delta")]
    ThinkingDelta { thinking: String },
    #[serde(other)]
    Other,
}

#[derive(Deserialize)]
struct MessageDelta {
    delta: MessageDeltaContent,
    #[allow(dead_code)]
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct MessageDeltaContent {
    stop_reason: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEvent {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    #[allow(dead_code)]
    #[serde(rename = "type")]
    error_type: String,
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(name: &str, data: &str) -> SseEvent {
        SseEvent { event: name.into(), data: data.into() }
    }

    #[test]
    fn maps_text_delta() {
        let e = event(
            "content_block_delta",
            r#"{"type":"content_block_delta","index":0,"delta":{"type":"text_delta","text":"MATCH"}}"#,
        );
        match map_event(&e) {
            Some(Ok(StreamDelta::Text(t))) => assert_eq!(t, "MATCH"),
            other => panic!("Expected text delta, got {:?}", other),
        }
    }

    #[test]
    fn ignores_tool_json_delta() {
        let e = event(
            "content_block_delta",
            r#"{"type":"content_block_delta","index":1,"delta":{"type":"input_json_delta","partial_json":"{"}}"#,
        );
        assert!(map_event(&e).is_none());
    }

    #[test]
    fn maps_message_stop_to_done() {
        let e = event("message_stop", r#"{"type":"message_stop"}"#);
        assert!(matches!(map_event(&e), Some(Ok(StreamDelta::Done { .. }))));
    }

    #[test]
    fn maps_error_event() {
        let e = event(
            "error",
            r#"{"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#,
        );
        match map_event(&e) {
            Some(Err(LlmError::StreamError(m))) => assert_eq!(m, "Overloaded"),
            other => panic!("Expected stream error, got {:?}", other),
        }
    }

    #[test]
    fn ping_is_ignored() {
        assert!(map_event(&event("ping", r#"{"type":"ping"}"#)).is_none());
    }
}
