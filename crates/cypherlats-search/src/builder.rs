//! Wire a [`LatsSearch`] from a [`LatsConfig`].

use crate::lats::LatsSearch;
use crate::llm_oracle::{LlmCandidateGenerator, LlmReflector};
use cypherlats_core::{Error, LatsConfig, ProviderKind, Result};
use cypherlats_llm::{AnthropicProvider, LlmProvider, OpenAiCompatProvider};
use std::sync::Arc;
use tracing::info;

/// Provider for `config.model`.
///
/// Anthropic always needs a key. An OpenAI-compatible endpoint may run keyless
/// when a `base_url` points at a local server.
pub fn build_provider(config: &LatsConfig) -> Result<Arc<dyn LlmProvider>> {
    let model = &config.model;
    let provider: Arc<dyn LlmProvider> = match model.provider {
        ProviderKind::Anthropic => {
            let provider = AnthropicProvider::new(config.api_key()?);
            match &model.base_url {
                Some(url) => Arc::new(provider.with_base_url(url.clone())),
                None => Arc::new(provider),
            }
        }
        ProviderKind::Openai => match (config.api_key(), &model.base_url) {
            (Ok(key), Some(url)) => Arc::new(OpenAiCompatProvider::new(key).with_base_url(url.clone())),
            (Ok(key), None) => Arc::new(OpenAiCompatProvider::new(key)),
            (Err(Error::MissingApiKey { .. }), Some(url)) => {
                Arc::new(OpenAiCompatProvider::without_key(url.clone()))
            }
            (Err(e), _) => return Err(e),
        },
    };
    info!(provider = provider.name(), "LLM provider ready");
    Ok(provider)
}

/// Validated config to a ready search with LLM-backed oracles.
pub fn build_search(config: &LatsConfig) -> Result<LatsSearch> {
    config.validate()?;
    let provider = build_provider(config)?;
    let model = &config.model;

    let mut generator = LlmCandidateGenerator::new(provider.clone(), model.generator_model.clone())
        .with_max_tokens(model.max_tokens)
        .with_temperature(model.temperature);
    if let Some(prompt) = &config.prompts.generator_system {
        generator = generator.with_system_prompt(prompt.clone());
    }

    let mut reflector = LlmReflector::new(provider, model.reflector_model.clone());
    if let Some(prompt) = &config.prompts.reflector_system {
        reflector = reflector.with_system_prompt(prompt.clone());
    }

    Ok(LatsSearch::new(Arc::new(generator), Arc::new(reflector)).with_config(config.search.clone()))
}
