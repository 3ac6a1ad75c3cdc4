//! Server-sent event framing shared by the streaming providers

use crate::provider::{LlmError, LlmResult};
use futures::StreamExt;
use tokio_util::sync::CancellationToken;

/// One `event:`/`data:` frame.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SseEvent {
    pub event: String,
    pub data: String,
}

/// Parse a complete frame (the text between two blank lines).
/// Multiple `data:` lines are joined with a newline.
pub fn parse_event(frame: &str) -> SseEvent {
    let mut event = SseEvent::default();
    for line in frame.lines() {
        let line = line.trim_end_matches('\r');
        if let Some(rest) = line.strip_prefix("event:") {
            event.event = rest.trim_start().to_string();
        } else if let Some(rest) = line.strip_prefix("data:") {
            if !event.data.is_empty() {
                event.data.push('\n');
            }
            event.data.push_str(rest.trim_start());
        }
    }
    event
}

/// Locate the first blank-line frame delimiter in raw bytes.
/// Returns (frame end, delimiter length). Accepts LF and CRLF line endings.
fn frame_boundary(buffer: &[u8]) -> Option<(usize, usize)> {
    let lf = buffer.windows(2).position(|w| w == b"\n\n").map(|i| (i, 2));
    let crlf = buffer.windows(4).position(|w| w == b"\r\n\r\n").map(|i| (i, 4));
    match (lf, crlf) {
        (Some(a), Some(b)) => Some(if b.0 < a.0 { b } else { a }),
        (a, b) => a.or(b),
    }
}

/// Split a byte stream into SSE frames. Frames without data are skipped.
///
/// Bytes are buffered until a whole frame is present, so multi-byte UTF-8
/// characters and CRLF delimiters may straddle chunk boundaries.
pub fn event_stream(
    bytes_stream: impl futures::Stream<Item = Result<bytes::Bytes, reqwest::Error>> + Send + 'static,
    cancel: Option<CancellationToken>,
) -> impl futures::Stream<Item = LlmResult<SseEvent>> + Send {
    let cancel = cancel.unwrap_or_else(CancellationToken::new);
    async_stream::stream! {
        let mut buffer: Vec<u8> = Vec::new();

        tokio::pin!(bytes_stream);

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                next = bytes_stream.next() => Some(next),
            };

            let chunk = match next {
                None => {
                    yield Err(LlmError::Cancelled);
                    break;
                }
                Some(None) => break,
                Some(Some(Ok(c))) => c,
                Some(Some(Err(e))) => {
                    yield Err(LlmError::StreamError(e.to_string()));
                    continue;
                }
            };

            buffer.extend_from_slice(&chunk);

            while let Some((end, delimiter)) = frame_boundary(&buffer) {
                let frame: Vec<u8> = buffer.drain(..end + delimiter).take(end).collect();
                let event = parse_event(&String::from_utf8_lossy(&frame));
                if event.data.is_empty() {
                    continue;
                }
                yield Ok(event);
            }
        }
    }
}
