//! Tests for cypherlats-llm: types, SSE framing, text collection, real API integration

use cypherlats_llm::sse::{event_stream, parse_event, SseEvent};
use cypherlats_llm::*;
use futures::StreamExt;

// ===========================================================================
// LlmRequest / LlmMessage
// ===========================================================================

#[test]
fn llm_request_default() {
    let req = LlmRequest::default();
    assert!(req.model.contains("claude"));
    assert!(req.messages.is_empty());
    assert_eq!(req.max_tokens, Some(4096));
    assert!(req.temperature.is_none());
    assert!(req.system.is_none());
}

#[test]
fn llm_request_single_turn() {
    let req = LlmRequest::single_turn("m", Some("sys".into()), "question");
    assert_eq!(req.model, "m");
    assert_eq!(req.system.as_deref(), Some("sys"));
    assert_eq!(req.messages, vec![LlmMessage::user("question")]);
}

#[test]
fn llm_request_skips_empty_options() {
    let req = LlmRequest {
        max_tokens: None,
        ..Default::default()
    };
    let json = serde_json::to_string(&req).unwrap();
    assert!(!json.contains("max_tokens"));
    assert!(!json.contains("temperature"));
    assert!(!json.contains("system"));
}

#[test]
fn llm_message_constructors() {
    let m = LlmMessage::user("a");
    assert_eq!(m.role, "user");
    assert_eq!(m.content, "a");
}

// ===========================================================================
// SSE framing
// ===========================================================================

#[test]
fn parse_event_reads_event_and_data() {
    let e = parse_event("event: message_stop\ndata: {\"type\":\"message_stop\"}");
    assert_eq!(e.event, "message_stop");
    assert_eq!(e.data, r#"{"type":"message_stop"}"#);
}

#[test]
fn parse_event_joins_multiline_data() {
    let e = parse_event("data: a\ndata: b");
    assert_eq!(e.event, "");
    assert_eq!(e.data, "a\nb");
}

fn chunks(parts: &[&str]) -> impl futures::Stream<Item = Result<bytes::Bytes, reqwest::Error>> + Send + 'static {
    let owned: Vec<Result<bytes::Bytes, reqwest::Error>> = parts
        .iter()
        .map(|p| Ok(bytes::Bytes::from(p.to_string())))
        .collect();
    futures::stream::iter(owned)
}

#[tokio::test]
async fn event_stream_reassembles_split_frames() {
    let stream = event_stream(
        chunks(&["event: a\nda", "ta: 1\n\nevent: b\ndata: 2\n", "\n: keepalive\n\n"]),
        None,
    );
    let events: Vec<SseEvent> = stream.map(|e| e.unwrap()).collect().await;
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].event, "a");
    assert_eq!(events[0].data, "1");
    assert_eq!(events[1].event, "b");
    assert_eq!(events[1].data, "2");
}

#[tokio::test]
async fn event_stream_handles_crlf() {
    let stream = event_stream(chunks(&["data: x\r\n\r\n"]), None);
    let events: Vec<SseEvent> = stream.map(|e| e.unwrap()).collect().await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].data, "x");
}

#[tokio::test]
async fn event_stream_keeps_multibyte_chars_split_across_chunks() {
    let text = "data: MATCH (n:城市) RETURN n\n\n".as_bytes();
    let split = text.iter().position(|&b| b == 0xE5).unwrap() + 1; // inside 城
    let parts: Vec<Result<bytes::Bytes, reqwest::Error>> = vec![
        Ok(bytes::Bytes::copy_from_slice(&text[..split])),
        Ok(bytes::Bytes::copy_from_slice(&text[split..])),
    ];
    let stream = event_stream(futures::stream::iter(parts), None);
    let events: Vec<SseEvent> = stream.map(|e| e.unwrap()).collect().await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].data, "MATCH (n:城市) RETURN n");
}

#[tokio::test]
async fn event_stream_handles_crlf_delimiter_split_across_chunks() {
    let stream = event_stream(chunks(&["data: a\r\n\r", "\ndata: b\r\n\r\n"]), None);
    let events: Vec<SseEvent> = stream.map(|e| e.unwrap()).collect().await;
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].data, "a");
    assert_eq!(events[1].data, "b");
}

#[tokio::test]
async fn event_stream_stops_on_cancel() {
    let cancel = CancellationToken::new();
    cancel.cancel();
    let stream = event_stream(chunks(&["data: x\n\n"]), Some(cancel));
    let events: Vec<_> = stream.collect().await;
    assert_eq!(events.len(), 1);
    assert!(matches!(events[0], Err(LlmError::Cancelled)));
}

// ===========================================================================
// collect_text
// ===========================================================================

#[tokio::test]
async fn collect_text_concatenates_and_skips_thinking() {
    let deltas = vec![
        Ok(StreamDelta::Thinking("hmm".into())),
        Ok(StreamDelta::Text("MATCH (n) ".into())),
        Ok(StreamDelta::Text("RETURN n".into())),
        Ok(StreamDelta::Done { stop_reason: None, usage: None }),
        Ok(StreamDelta::Text("ignored after done".into())),
    ];
    let text = collect_text(futures::stream::iter(deltas)).await.unwrap();
    assert_eq!(text, "MATCH (n) RETURN n");
}

#[tokio::test]
async fn collect_text_propagates_errors() {
    let deltas = vec![
        Ok(StreamDelta::Text("partial".into())),
        Err(LlmError::StreamError("boom".into())),
    ];
    let err = collect_text(futures::stream::iter(deltas)).await.unwrap_err();
    assert!(matches!(err, LlmError::StreamError(_)));

    let deltas = vec![Ok(StreamDelta::Error("overloaded".into()))];
    let err = collect_text(futures::stream::iter(deltas)).await.unwrap_err();
    assert_eq!(err.to_string(), "stream error: overloaded");
}

// ===========================================================================
// LlmError
// ===========================================================================

#[test]
fn llm_error_from_status() {
    use reqwest::StatusCode;
    assert!(matches!(
        LlmError::from_status(StatusCode::UNAUTHORIZED, "no".into()),
        LlmError::AuthFailed(_)
    ));
    assert!(matches!(
        LlmError::from_status(StatusCode::TOO_MANY_REQUESTS, String::new()),
        LlmError::RateLimited { .. }
    ));
    let e = LlmError::from_status(StatusCode::BAD_GATEWAY, "upstream".into());
    assert!(e.to_string().contains("upstream"));
}

// ===========================================================================
// Providers
// ===========================================================================

#[test]
fn provider_names() {
    assert_eq!(AnthropicProvider::new("k").name(), "anthropic");
    assert_eq!(OpenAiCompatProvider::new("k").name(), "openai");
}

fn load_api_key() -> Option<String> {
    std::env::var("ANTHROPIC_API_KEY").ok().filter(|k| !k.is_empty())
}

#[tokio::test]
async fn anthropic_provider_simple_text_response() {
    let api_key = match load_api_key() {
        Some(k) => k,
        None => { eprintln!("SKIP: no ANTHROPIC_API_KEY"); return; }
    };

    let provider = AnthropicProvider::new(&api_key);
    let mut request = LlmRequest::single_turn(
        "claude-haiku-4-5-20251001",
        None,
        "Reply with exactly the word 'pong' and nothing else.",
    );
    request.max_tokens = Some(32);

    let text = provider.complete(request).await.expect("API call failed");
    assert!(text.to_lowercase().contains("pong"), "Expected 'pong' in response, got: {}", text);
}

#[tokio::test]
async fn anthropic_provider_bad_key_fails() {
    if load_api_key().is_none() {
        eprintln!("SKIP: no network credentials configured");
        return;
    }
    let provider = AnthropicProvider::new("sk-bad-key-12345");
    let request = LlmRequest::single_turn("claude-haiku-4-5-20251001", None, "hello");
    let result = provider.complete_stream(request, None).await;
    assert!(result.is_err(), "Expected error with bad API key");
}
