//! Core types for Cypherlats

use serde::{Deserialize, Serialize};

/// Highest score a reflection can assign.
pub const MAX_SCORE: u8 = 10;

/// Judgment of one candidate step, produced by the reflection oracle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reflection {
    /// Analysis of the intermediate state and the plan for the next step.
    pub plan: String,
    /// Quality of the candidate, 0-10.
    pub score: u8,
    /// Whether the candidate reached a final answer.
    #[serde(alias = "end")]
    pub terminal: bool,
}

impl Reflection {
    /// Build a reflection, clamping the score into 0-10.
    pub fn new(plan: impl Into<String>, score: u8, terminal: bool) -> Self {
        Self {
            plan: plan.into(),
            score: score.min(MAX_SCORE),
            terminal,
        }
    }

    /// Zero-score, non-terminal judgment carrying an error text as its plan.
    pub fn degraded(error: impl std::fmt::Display) -> Self {
        Self {
            plan: format!("Error in reflection: {}", error),
            score: 0,
            terminal: false,
        }
    }

    /// Score mapped into [0.0, 1.0] for back-propagation.
    pub fn normalized_score(&self) -> f64 {
        f64::from(self.score.min(MAX_SCORE)) / f64::from(MAX_SCORE)
    }

    /// Render as a trajectory message.
    pub fn as_message(&self) -> String {
        format!("Analysis and plan: {}\nScore: {}", self.plan, self.score)
    }
}

impl std::fmt::Display for Reflection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Reflection(plan='{}', score={}, terminal={})",
            self.plan, self.score, self.terminal
        )
    }
}
