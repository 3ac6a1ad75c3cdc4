//! Cypherlats Core - Reflection types, configuration, and error handling

pub mod config;
pub mod error;
pub mod types;

pub use config::{LatsConfig, ModelConfig, PromptConfig, ProviderKind, SearchConfig};
pub use error::{Error, Result};
pub use types::*;
