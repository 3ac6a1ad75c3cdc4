//! cypherlats-search: Language-Agent Tree Search over Cypher reasoning steps.
//!
//! The search is code; the oracles do the thinking. [`LatsSearch`] drives the
//! tree, [`CandidateGenerator`] and [`Reflector`] supply and judge each step.

pub mod builder;
pub mod lats;
pub mod llm_oracle;
pub mod oracle;
pub mod outcome;
pub mod prompts;
pub mod tree;

pub use builder::{build_provider, build_search};
pub use lats::{Exploration, LatsSearch, LoopAction};
pub use llm_oracle::{parse_reflection, LlmCandidateGenerator, LlmReflector};
pub use oracle::{CandidateGenerator, OracleError, Reflector, FAILED_CANDIDATE};
pub use outcome::{SearchOutcome, SearchStatus, INITIAL_FAILURE, NO_SOLUTION};
pub use tree::{Node, NodeId, SearchTree, TreeState};
