//! Oracle traits the search calls into.
//!
//! Any backend (LLM, agent team, scripted stub) can drive the search by
//! implementing these two traits.

use cypherlats_core::Reflection;
use cypherlats_llm::LlmError;
use std::time::Duration;

/// Sentinel logged in place of a candidate whose generation failed.
pub const FAILED_CANDIDATE: &str = "Failed to generate candidate.";

#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    #[error("generation failed: {0}")]
    Generation(String),

    #[error("generator returned an empty candidate")]
    EmptyCandidate,

    #[error("reflection failed: {0}")]
    Reflection(String),

    #[error("unparseable reflection: {0}")]
    Unparseable(String),

    #[error("oracle call timed out after {0:?}")]
    Timeout(Duration),

    #[error("llm error: {0}")]
    Llm(#[from] LlmError),
}

/// Produces one continuation of a trajectory.
///
/// Called `expand_num` times concurrently per round; implementations must not
/// rely on shared mutable state between calls.
#[async_trait::async_trait]
pub trait CandidateGenerator: Send + Sync {
    /// `trajectory` is empty for the initial response.
    async fn generate(&self, question: &str, trajectory: &[String]) -> Result<String, OracleError>;
}

/// Scores one candidate.
///
/// Errors are turned into a degraded zero-score reflection by the driver, so
/// implementations may simply propagate them.
#[async_trait::async_trait]
pub trait Reflector: Send + Sync {
    async fn reflect(&self, question: &str, candidate: &str) -> Result<Reflection, OracleError>;
}
