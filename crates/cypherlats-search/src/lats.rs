//! LATS driver: best-first tree search over generated query trajectories.
//!
//! The driver owns the control flow only:
//! - INITIAL: one generation call on the raw question, scored once, becomes the root
//! - EXPANDING: pick the highest-UCT frontier node, fan out `expand_num`
//!   generation calls concurrently, score each candidate, attach them in order
//! - TERMINATED: extract the best solved leaf (or the fallback) and return its
//!   final artifact
//!
//! Generation and scoring are delegated to the [`CandidateGenerator`] and
//! [`Reflector`] oracles. Only the initial generation can fail a search; every
//! later failure is logged and absorbed.

use crate::oracle::{CandidateGenerator, OracleError, Reflector, FAILED_CANDIDATE};
use crate::outcome::{elapsed_since, SearchOutcome, SearchStatus, INITIAL_FAILURE, NO_SOLUTION};
use crate::tree::{Node, TreeState};
use chrono::{DateTime, Utc};
use cypherlats_core::{Reflection, SearchConfig};
use futures::future::join_all;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, info_span, warn, Instrument};

/// Decision taken before every expansion round.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopAction {
    Expand,
    End,
}

/// Tree left behind by [`LatsSearch::explore`].
#[derive(Debug)]
pub struct Exploration {
    pub state: TreeState,
    /// Expansion rounds performed, failed rounds included.
    pub rounds: usize,
}

pub struct LatsSearch {
    generator: Arc<dyn CandidateGenerator>,
    reflector: Arc<dyn Reflector>,
    config: SearchConfig,
}

impl LatsSearch {
    pub fn new(generator: Arc<dyn CandidateGenerator>, reflector: Arc<dyn Reflector>) -> Self {
        Self {
            generator,
            reflector,
            config: SearchConfig::default(),
        }
    }

    pub fn with_config(mut self, config: SearchConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Answer `question`. Returns the best trajectory's final artifact or a
    /// human-readable failure message; never fails.
    pub async fn run_search(&self, question: &str, search_depth: usize, expand_num: usize) -> String {
        self.run(question, search_depth, expand_num).await.answer
    }

    /// Blocking [`LatsSearch::run_search`] on a private current-thread runtime.
    ///
    /// Must not be called from inside an async context.
    pub fn run_search_blocking(&self, question: &str, search_depth: usize, expand_num: usize) -> String {
        match tokio::runtime::Builder::new_current_thread().enable_all().build() {
            Ok(rt) => rt.block_on(self.run_search(question, search_depth, expand_num)),
            Err(e) => {
                error!("Failed to start search runtime: {}", e);
                format!("Failed to start search runtime: {}", e)
            }
        }
    }

    /// Full run with metadata. The search budget comes from the arguments;
    /// height ceiling, exploration weight and timeouts from the config.
    pub async fn run(&self, question: &str, search_depth: usize, expand_num: usize) -> SearchOutcome {
        let run_id = uuid::Uuid::new_v4().to_string();
        let started = Utc::now();
        let span = info_span!("lats", run_id = %run_id);

        async {
            info!(search_depth, expand_num, "Processing question: {}", question);
            let outcome = match self.explore(question, search_depth, expand_num).await {
                Ok(exploration) => conclude(&run_id, exploration, started),
                Err(e) => {
                    error!("Error generating initial response: {}", e);
                    SearchOutcome::failed(&run_id, question, INITIAL_FAILURE, started)
                }
            };
            info!(
                status = %outcome.status,
                rounds = outcome.rounds,
                nodes = outcome.nodes,
                elapsed_ms = outcome.elapsed_ms,
                "LATS search completed"
            );
            outcome
        }
        .instrument(span)
        .await
    }

    /// Build the root, then expand until [`LatsSearch::should_loop`] says stop
    /// or `search_depth` rounds have run. Fails only if the root cannot be built.
    pub async fn explore(
        &self,
        question: &str,
        search_depth: usize,
        expand_num: usize,
    ) -> Result<Exploration, OracleError> {
        let mut state = self.generate_initial_response(question).await?;
        let mut rounds = 0;

        for round in 1..=search_depth {
            if self.should_loop(&state) == LoopAction::End {
                info!("Search ended after {} rounds", rounds);
                break;
            }
            match self.expand(&mut state, expand_num).await {
                Ok(added) => debug!(round, added, height = state.height(), "expansion round complete"),
                Err(e) => warn!(round, "Expansion round skipped: {}", e),
            }
            rounds += 1;
        }

        Ok(Exploration { state, rounds })
    }

    /// Stop once the root is solved or the tree outgrew `max_height`.
    pub fn should_loop(&self, state: &TreeState) -> LoopAction {
        if state.root().is_solved() {
            return LoopAction::End;
        }
        if state.height() > self.config.max_height {
            return LoopAction::End;
        }
        LoopAction::Expand
    }

    /// Generate and score the root from the bare question.
    pub async fn generate_initial_response(&self, question: &str) -> Result<TreeState, OracleError> {
        let candidate = self.call_generator(question, &[]).await?;
        info!("Initial response: {}", candidate);
        let reflection = self.reflection_chain(question, &candidate).await;
        Ok(TreeState::new(Node::scored(candidate, reflection), question))
    }

    /// `num` independent generation calls, run concurrently. Results keep call order.
    pub async fn generate_candidates(
        &self,
        question: &str,
        trajectory: &[String],
        num: usize,
    ) -> Vec<Result<String, OracleError>> {
        join_all((0..num).map(|_| self.call_generator(question, trajectory))).await
    }

    /// One expansion round under the best frontier node.
    ///
    /// Failed candidates are dropped; the rest attach in call order. Returns the
    /// number of children added, or the last error if none could be generated.
    pub async fn expand(&self, state: &mut TreeState, num: usize) -> Result<usize, OracleError> {
        let root = state.tree.root();
        let frontier = state
            .tree
            .best_child(root, self.config.exploration_weight)
            .unwrap_or(root);
        let trajectory = state.tree.trajectory(frontier, true);
        debug!(frontier = %state.tree.node(frontier), "expanding");

        let results = self.generate_candidates(&state.input, &trajectory, num).await;

        let mut candidates = Vec::with_capacity(results.len());
        let mut last_error = None;
        for (index, result) in results.into_iter().enumerate() {
            match result {
                Ok(candidate) => candidates.push(candidate),
                Err(e) => {
                    warn!(index, "{} {}", FAILED_CANDIDATE, e);
                    last_error = Some(e);
                }
            }
        }
        if candidates.is_empty() {
            return Err(last_error
                .unwrap_or_else(|| OracleError::Generation("no candidates requested".into())));
        }

        let mut reflections = Vec::with_capacity(candidates.len());
        for candidate in &candidates {
            reflections.push(self.reflection_chain(&state.input, candidate).await);
        }

        let mut added = 0;
        for (candidate, reflection) in candidates.into_iter().zip(reflections) {
            let id = state.tree.attach(frontier, Node::scored(candidate, reflection));
            debug!("expand_node: {}", state.tree.node(id));
            added += 1;
        }
        Ok(added)
    }

    /// Score `candidate`. Oracle failures become a zero-score, non-terminal reflection.
    pub async fn reflection_chain(&self, question: &str, candidate: &str) -> Reflection {
        let call = self.reflector.reflect(question, candidate);
        match with_timeout(self.config.oracle_timeout(), call).await {
            Ok(reflection) => {
                info!("reflection: {}", reflection);
                reflection
            }
            Err(e) => {
                error!("Error in reflection: {}", e);
                Reflection::degraded(e)
            }
        }
    }

    async fn call_generator(&self, question: &str, trajectory: &[String]) -> Result<String, OracleError> {
        let call = self.generator.generate(question, trajectory);
        let candidate = with_timeout(self.config.oracle_timeout(), call).await?;
        let candidate = candidate.trim();
        if candidate.is_empty() {
            return Err(OracleError::EmptyCandidate);
        }
        Ok(candidate.to_string())
    }
}

async fn with_timeout<T>(
    limit: Option<Duration>,
    call: impl Future<Output = Result<T, OracleError>>,
) -> Result<T, OracleError> {
    match limit {
        Some(limit) => tokio::time::timeout(limit, call)
            .await
            .map_err(|_| OracleError::Timeout(limit))?,
        None => call.await,
    }
}

fn conclude(run_id: &str, exploration: Exploration, started: DateTime<Utc>) -> SearchOutcome {
    let Exploration { state, rounds } = exploration;
    let tree = &state.tree;
    let root = tree.root();

    let best = tree.best_solution(root);
    let best_node = tree.node(best);
    let trajectory = tree.trajectory(best, false);

    let (status, answer) = match trajectory.last() {
        Some(answer) if best_node.is_terminal() && best_node.is_solved() => {
            (SearchStatus::Solved, answer.clone())
        }
        Some(answer) => (SearchStatus::Unsolved, answer.clone()),
        None => (SearchStatus::Failed, NO_SOLUTION.to_string()),
    };

    SearchOutcome {
        run_id: run_id.to_string(),
        question: state.input.clone(),
        status,
        answer,
        trajectory,
        rounds,
        nodes: tree.len(),
        tree_height: state.height(),
        best_value: best_node.value(),
        started,
        elapsed_ms: elapsed_since(started),
    }
}
