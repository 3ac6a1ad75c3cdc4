//! Search outcome: structured result of one LATS run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const INITIAL_FAILURE: &str = "Failed to generate initial response due to an unexpected error.";
pub const NO_SOLUTION: &str = "No solution found in the search process.";

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SearchStatus {
    /// A solved leaf was found; the answer is its final artifact.
    Solved,
    /// Nothing was marked solved; the answer is the best-effort fallback.
    Unsolved,
    /// No answer could be produced; the answer is a failure message.
    Failed,
}

impl std::fmt::Display for SearchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Solved => write!(f, "solved"),
            Self::Unsolved => write!(f, "unsolved"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SearchOutcome {
    pub run_id: String,
    pub question: String,
    pub status: SearchStatus,
    /// Final artifact of the best trajectory, or a failure message.
    pub answer: String,
    /// Full best trajectory, root first, without reflections.
    pub trajectory: Vec<String>,
    /// Expansion rounds actually performed.
    pub rounds: usize,
    pub nodes: usize,
    pub tree_height: usize,
    /// Value of the node the answer came from.
    pub best_value: f64,
    pub started: DateTime<Utc>,
    pub elapsed_ms: u64,
}

impl SearchOutcome {
    pub fn failed(run_id: &str, question: &str, message: &str, started: DateTime<Utc>) -> Self {
        Self {
            run_id: run_id.into(),
            question: question.into(),
            status: SearchStatus::Failed,
            answer: message.into(),
            trajectory: Vec::new(),
            rounds: 0,
            nodes: 0,
            tree_height: 0,
            best_value: 0.0,
            started,
            elapsed_ms: elapsed_since(started),
        }
    }

    pub fn is_solved(&self) -> bool {
        self.status == SearchStatus::Solved
    }
}

pub(crate) fn elapsed_since(started: DateTime<Utc>) -> u64 {
    (Utc::now() - started).num_milliseconds().max(0) as u64
}
