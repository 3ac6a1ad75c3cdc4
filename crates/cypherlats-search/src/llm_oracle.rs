//! LLM-backed oracles.

use crate::oracle::{CandidateGenerator, OracleError, Reflector};
use crate::prompts;
use cypherlats_core::{Reflection, MAX_SCORE};
use cypherlats_llm::{LlmProvider, LlmRequest};
use regex::Regex;
use serde::Deserialize;
use std::sync::{Arc, LazyLock};
use tracing::debug;

pub struct LlmCandidateGenerator {
    provider: Arc<dyn LlmProvider>,
    model: String,
    system_prompt: String,
    max_tokens: u32,
    temperature: Option<f32>,
}

impl LlmCandidateGenerator {
    pub fn new(provider: Arc<dyn LlmProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            system_prompt: prompts::GENERATOR_SYSTEM.to_string(),
            max_tokens: 4096,
            temperature: None,
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }
}

#[async_trait::async_trait]
impl CandidateGenerator for LlmCandidateGenerator {
    async fn generate(&self, question: &str, trajectory: &[String]) -> Result<String, OracleError> {
        let mut request = LlmRequest::single_turn(
            self.model.clone(),
            Some(self.system_prompt.clone()),
            prompts::candidate_prompt(question, trajectory),
        );
        request.max_tokens = Some(self.max_tokens);
        request.temperature = self.temperature;

        let text = self.provider.complete(request).await?;
        let candidate = text.trim();
        if candidate.is_empty() {
            return Err(OracleError::EmptyCandidate);
        }
        debug!(chars = candidate.len(), "candidate generated");
        Ok(candidate.to_string())
    }
}

pub struct LlmReflector {
    provider: Arc<dyn LlmProvider>,
    model: String,
    system_prompt: String,
    max_tokens: u32,
}

impl LlmReflector {
    pub fn new(provider: Arc<dyn LlmProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            system_prompt: prompts::REFLECTOR_SYSTEM.to_string(),
            max_tokens: 1024,
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

#[async_trait::async_trait]
impl Reflector for LlmReflector {
    async fn reflect(&self, question: &str, candidate: &str) -> Result<Reflection, OracleError> {
        let mut request = LlmRequest::single_turn(
            self.model.clone(),
            Some(self.system_prompt.clone()),
            prompts::reflection_prompt(question, candidate),
        );
        request.max_tokens = Some(self.max_tokens);
        request.temperature = Some(0.0);

        let text = self.provider.complete(request).await?;
        parse_reflection(&text)
    }
}

#[derive(Deserialize)]
struct RawReflection {
    #[serde(default, alias = "analysis")]
    plan: String,
    score: f64,
    #[serde(default, alias = "end")]
    terminal: bool,
}

static SCORE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^\W*score\W*[:：]\s*(\d+(?:\.\d+)?)").expect("valid regex")
});
static PLAN_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^\W*(?:plan|analysis)\W*[:：]\s*(.+)$").expect("valid regex")
});
static TERMINAL_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^\W*(?:terminal|end)\W*[:：]\s*(yes|no|true|false)").expect("valid regex")
});

/// Parse a reflector reply.
///
/// Accepts the first JSON object in the text (code fences and surrounding prose
/// are ignored), then falls back to `Plan:` / `Score:` / `Terminal:` lines.
/// Scores are rounded and clamped into 0-10.
pub fn parse_reflection(text: &str) -> Result<Reflection, OracleError> {
    if let Some(json) = extract_json_object(text) {
        if let Ok(raw) = serde_json::from_str::<RawReflection>(json) {
            return Ok(Reflection::new(raw.plan, clamp_score(raw.score), raw.terminal));
        }
    }

    let score = SCORE_LINE
        .captures(text)
        .and_then(|c| c[1].parse::<f64>().ok())
        .ok_or_else(|| OracleError::Unparseable(truncate(text, 200)))?;
    let plan = PLAN_LINE
        .captures(text)
        .map(|c| c[1].trim().to_string())
        .unwrap_or_default();
    let terminal = TERMINAL_LINE
        .captures(text)
        .map(|c| matches!(c[1].to_ascii_lowercase().as_str(), "yes" | "true"))
        .unwrap_or(false);

    Ok(Reflection::new(plan, clamp_score(score), terminal))
}

fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

fn clamp_score(score: f64) -> u8 {
    if score.is_nan() {
        return 0;
    }
    score.round().clamp(0.0, f64::from(MAX_SCORE)) as u8
}

fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((i, _)) => format!("{}...", &text[..i]),
        None => text.to_string(),
    }
}
