//! LLM Provider trait

use crate::types::{LlmRequest, StreamDelta};
use futures::{Stream, StreamExt};
use std::pin::Pin;
use tokio_util::sync::CancellationToken;

/// Result type for LLM operations
pub type LlmResult<T> = Result<T, LlmError>;

/// LLM error types
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("request failed: {0}")]
    RequestFailed(String),

    #[error("authentication failed: {0}")]
    AuthFailed(String),

    #[error("rate limited: retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("stream error: {0}")]
    StreamError(String),

    #[error("cancelled")]
    Cancelled,

    #[error("network error: {0}")]
    NetworkError(#[from] reqwest::Error),
}

impl LlmError {
    /// Map a non-success HTTP status to an error.
    pub fn from_status(status: reqwest::StatusCode, body: String) -> Self {
        match status.as_u16() {
            401 | 403 => LlmError::AuthFailed(body),
            429 => LlmError::RateLimited { retry_after_ms: 60000 },
            _ => LlmError::RequestFailed(format!("{}: {}", status, body)),
        }
    }
}

/// Stream type for LLM responses
pub type LlmStream = Pin<Box<dyn Stream<Item = LlmResult<StreamDelta>> + Send>>;

/// LLM Provider trait
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Stream a completion response. If `cancel` is provided and triggered,
    /// the underlying HTTP connection is dropped and the stream yields `LlmError::Cancelled`.
    async fn complete_stream(
        &self,
        request: LlmRequest,
        cancel: Option<CancellationToken>,
    ) -> LlmResult<LlmStream>;

    /// Run a request to completion and return the concatenated text.
    async fn complete(&self, request: LlmRequest) -> LlmResult<String> {
        let stream = self.complete_stream(request, None).await?;
        collect_text(stream).await
    }
}

/// Drain a stream, concatenating text deltas. Thinking is dropped.
pub async fn collect_text(
    stream: impl Stream<Item = LlmResult<StreamDelta>> + Send,
) -> LlmResult<String> {
    tokio::pin!(stream);
    let mut text = String::new();
    while let Some(delta) = stream.next().await {
        match delta? {
            StreamDelta::Text(t) => text.push_str(&t),
            StreamDelta::Thinking(_) => {}
            StreamDelta::Done { .. } => break,
            StreamDelta::Error(e) => return Err(LlmError::StreamError(e)),
        }
    }
    Ok(text)
}
