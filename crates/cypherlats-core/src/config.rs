//! Search and model configuration
//!
//! All tunable parameters in one place. Loaded from TOML at startup,
//! falls back to defaults if no config file exists.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LatsConfig {
    /// Tree search budget and exploration parameters.
    pub search: SearchConfig,
    /// Model backend for both oracles.
    pub model: ModelConfig,
    /// Optional system prompt overrides.
    pub prompts: PromptConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Maximum number of expansion rounds.
    pub search_depth: usize,
    /// Candidates generated per expansion round.
    pub expand_num: usize,
    /// The search ends once the tree is taller than this.
    pub max_height: usize,
    /// Weight of the exploration term in the upper confidence bound.
    pub exploration_weight: f64,
    /// Per-call bound on generation and reflection. None = unbounded.
    pub oracle_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Anthropic,
    /// Any endpoint speaking the OpenAI chat completions protocol.
    Openai,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub provider: ProviderKind,
    /// Endpoint override. None = the provider's public API.
    pub base_url: Option<String>,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    /// Model used to generate candidates.
    pub generator_model: String,
    /// Model used to score candidates.
    pub reflector_model: String,
    pub max_tokens: u32,
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    pub generator_system: Option<String>,
    pub reflector_system: Option<String>,
}

// ============================================================
// Defaults
// ============================================================

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            search_depth: 5,
            expand_num: 3,
            max_height: 5,
            exploration_weight: 1.0,
            oracle_timeout_secs: None,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Anthropic,
            base_url: None,
            api_key_env: "ANTHROPIC_API_KEY".into(),
            generator_model: "claude-sonnet-4-20250514".into(),
            reflector_model: "claude-haiku-4-5-20251001".into(),
            max_tokens: 4096,
            temperature: None,
        }
    }
}

// ============================================================
// Loading
// ============================================================

impl LatsConfig {
    /// Load config from a TOML file. A missing file yields defaults; any other
    /// read, parse or validation failure is returned.
    pub fn load(path: &Path) -> Result<Self> {
        match Self::try_load(path) {
            Ok(config) => {
                tracing::info!("Loaded config from {}", path.display());
                Ok(config)
            }
            Err(Error::IoError(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No config at {} - using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => {
                tracing::error!("Failed to load {}: {}", path.display(), e);
                Err(e)
            }
        }
    }

    /// Load and validate, surfacing every failure.
    pub fn try_load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Default path: ./cypherlats.toml
    pub fn default_path() -> PathBuf {
        PathBuf::from("cypherlats.toml")
    }

    /// Write the current config as TOML (for generating a default config file).
    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }

    pub fn validate(&self) -> Result<()> {
        self.search.validate()
    }

    /// Resolve the API key from the configured environment variable.
    pub fn api_key(&self) -> Result<String> {
        let var = &self.model.api_key_env;
        match std::env::var(var) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(Error::missing_api_key(var)),
        }
    }
}

impl SearchConfig {
    pub fn validate(&self) -> Result<()> {
        if self.search_depth == 0 {
            return Err(Error::config("search_depth must be at least 1"));
        }
        if self.expand_num == 0 {
            return Err(Error::config("expand_num must be at least 1"));
        }
        if !self.exploration_weight.is_finite() || self.exploration_weight < 0.0 {
            return Err(Error::config("exploration_weight must be a non-negative number"));
        }
        Ok(())
    }

    pub fn oracle_timeout(&self) -> Option<Duration> {
        self.oracle_timeout_secs.map(Duration::from_secs)
    }
}
