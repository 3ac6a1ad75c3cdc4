//! Cypherlats LLM - Provider adapters with streaming support

pub mod anthropic;
pub mod openai;
pub mod provider;
pub mod sse;
pub mod types;

pub use anthropic::AnthropicProvider;
pub use openai::OpenAiCompatProvider;
pub use provider::{collect_text, LlmError, LlmProvider, LlmResult, LlmStream};
pub use tokio_util::sync::CancellationToken;
pub use types::*;
