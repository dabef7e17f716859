//! The Workflow Engine (spec.md §4.1): executes a DAG of named node
//! functions over [`SharedState`] in topological order, with per-node
//! timeout, retry, and optional checkpointing.
//!
//! Generalizes the teacher's `Arc<dyn Fn(Value) -> BoxFuture<...>>` node
//! executor (see `langgraph-core::graph::NodeExecutor`) from a loosely
//! typed `serde_json::Value` to the concrete [`SharedState`], per the
//! "tagged records over loose dicts" redesign flag (spec.md §9).

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::{DigestGraphError, Result};
use crate::state::SharedState;
use digestgraph_checkpoint::CheckpointSink;
use digestgraph_tooling::async_utils::timeout::{with_timeout, TimeoutError};
use uuid::Uuid;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// What a node returns on a clean (non-exceptional) pass: the new state,
/// and whether it flagged a *structured* failure on itself (already
/// recorded into `state.errors` by the node). A structured failure is
/// never retried by the engine — only [`Err`] returns and timeouts are
/// (spec.md §4.1: "on structured failure ... otherwise continue").
pub struct NodeOutcome {
    pub state: SharedState,
    pub failed: bool,
}

impl NodeOutcome {
    pub fn ok(state: SharedState) -> Self {
        Self { state, failed: false }
    }

    pub fn failed(state: SharedState) -> Self {
        Self { state, failed: true }
    }
}

pub type NodeFn = Arc<dyn Fn(SharedState) -> BoxFuture<'static, Result<NodeOutcome>> + Send + Sync>;

/// Selects the next node name given the state after the current node ran.
pub type ConditionalFn = Arc<dyn Fn(&SharedState) -> String + Send + Sync>;

/// Per-node execution policy (spec.md §4.1 `register_node`).
#[derive(Debug, Clone)]
pub struct NodePolicy {
    pub timeout: Duration,
    pub retries: u32,
    pub retry_backoff: Duration,
    /// If true, a failure (structured or exhausted-retry) routes to the
    /// `on_error` conditional edge instead of the normal successor.
    pub fatal_if_failed: bool,
}

impl Default for NodePolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(120),
            retries: 2,
            retry_backoff: Duration::from_millis(500),
            fatal_if_failed: false,
        }
    }
}

impl NodePolicy {
    pub fn fatal() -> Self {
        Self { fatal_if_failed: true, ..Default::default() }
    }

    /// Exponential backoff clamped per spec.md §4.1:
    /// `retry_backoff_seconds · 2^k`.
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        self.retry_backoff.saturating_mul(1u32.checked_shl(attempt).unwrap_or(u32::MAX))
    }
}

const ON_ERROR: &str = "on_error";

struct RegisteredNode {
    func: NodeFn,
    policy: NodePolicy,
}

/// Cooperative cancellation signal (spec.md §5). Thin wrapper so callers
/// don't need a direct `tokio` dependency to request cancellation.
#[derive(Clone, Default)]
pub struct CancellationToken(Arc<std::sync::atomic::AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, std::sync::atomic::Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(std::sync::atomic::Ordering::SeqCst)
    }
}

/// The DAG container: named nodes with policies, linear edges, and
/// conditional edges for early termination (spec.md §4.1).
#[derive(Default)]
pub struct WorkflowEngine {
    nodes: HashMap<String, RegisteredNode>,
    edges: HashMap<String, String>,
    conditional_edges: HashMap<String, (ConditionalFn, Vec<String>)>,
    start: Option<String>,
}

impl WorkflowEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_start(&mut self, name: impl Into<String>) -> &mut Self {
        self.start = Some(name.into());
        self
    }

    pub fn register_node(&mut self, name: impl Into<String>, func: NodeFn, policy: NodePolicy) -> &mut Self {
        self.nodes.insert(name.into(), RegisteredNode { func, policy });
        self
    }

    pub fn add_edge(&mut self, from: impl Into<String>, to: impl Into<String>) -> &mut Self {
        self.edges.insert(from.into(), to.into());
        self
    }

    /// `selector` maps state to one of the names in `mapping`; used for the
    /// `on_error` early-termination route.
    pub fn add_conditional_edge(&mut self, from: impl Into<String>, selector: ConditionalFn, mapping: Vec<String>) -> &mut Self {
        self.conditional_edges.insert(from.into(), (selector, mapping));
        self
    }

    /// spec.md §4.1: "consult node policy — if `fatal_if_failed` the run
    /// short-circuits via the conditional edge `on_error`; otherwise
    /// continue." The routing decision is driven by the node's own policy,
    /// not by whether a conditional edge happens to be registered for it.
    fn successor(&self, from: &str, state: &SharedState, errored: bool) -> Option<String> {
        let fatal = errored && self.nodes.get(from).is_some_and(|n| n.policy.fatal_if_failed);
        if fatal {
            if let Some((selector, mapping)) = self.conditional_edges.get(from) {
                let next = selector(state);
                if mapping.iter().any(|m| m == &next) {
                    return Some(next);
                }
            }
            if self.nodes.contains_key(ON_ERROR) {
                return Some(ON_ERROR.to_string());
            }
            return None;
        }
        self.edges.get(from).cloned()
    }

    /// Run the DAG from its configured start node to completion (or to
    /// `on_error`'s successor chain, which by convention terminates at
    /// `finalize_on_failure`).
    ///
    /// If `checkpoint_sink` is set, the state is persisted after every node
    /// completes (success or terminal failure). If `cancel` fires mid-run,
    /// the in-flight node is allowed to finish (grace window enforced by
    /// its own timeout), a final checkpoint is written, and
    /// [`DigestGraphError::Cancelled`] is returned.
    pub async fn run(
        &self,
        initial_state: SharedState,
        checkpoint_sink: Option<Arc<dyn CheckpointSink>>,
        cancel: Option<CancellationToken>,
    ) -> Result<SharedState> {
        let start = self.start.clone();
        self.run_from(initial_state, start, checkpoint_sink, cancel).await
    }

    /// Resume a run from its last checkpoint (spec.md Scenario D — "Resume
    /// from checkpoint"): loads the latest snapshot for `run_id` from
    /// `sink`, restores [`SharedState`] from it, and continues the DAG from
    /// the successor of the node the checkpoint was taken after. Each
    /// node's own idempotent-at-node-granularity contract (see
    /// `state.rs`) — and, for `summarize_topics` specifically, its
    /// already-summarized-topic skip — is what makes restored work safe to
    /// carry forward rather than redo.
    pub async fn resume(
        &self,
        run_id: Uuid,
        sink: Arc<dyn CheckpointSink>,
        cancel: Option<CancellationToken>,
    ) -> Result<SharedState> {
        let entry = sink
            .load_latest(run_id)
            .await?
            .ok_or_else(|| DigestGraphError::Fatal(format!("no checkpoint found for run {run_id}")))?;
        let state: SharedState = serde_json::from_value(entry.snapshot)?;
        match self.successor(&entry.node, &state, false) {
            Some(next) => self.run_from(state, Some(next), Some(sink), cancel).await,
            None => Ok(state),
        }
    }

    async fn run_from(
        &self,
        initial_state: SharedState,
        start: Option<String>,
        checkpoint_sink: Option<Arc<dyn CheckpointSink>>,
        cancel: Option<CancellationToken>,
    ) -> Result<SharedState> {
        let mut state = initial_state;
        let mut current = start.ok_or_else(|| DigestGraphError::Fatal("workflow engine has no start node".into()))?;

        loop {
            if cancel.as_ref().is_some_and(CancellationToken::is_cancelled) {
                if let Some(sink) = &checkpoint_sink {
                    let snapshot = serde_json::to_value(&state)?;
                    sink.save(state.run_id, &state.current_stage, &snapshot).await.ok();
                }
                return Err(DigestGraphError::Cancelled);
            }

            let node = self
                .nodes
                .get(&current)
                .ok_or_else(|| DigestGraphError::Fatal(format!("unknown node in DAG: {current}")))?;

            state.current_stage = current.clone();
            let started = Instant::now();
            let (next_state, errored) = self.run_node_with_policy(node, state, &current).await?;
            state = next_state;
            state
                .metrics
                .duration_per_stage
                .insert(current.clone(), started.elapsed());

            if let Some(sink) = &checkpoint_sink {
                let snapshot = serde_json::to_value(&state)?;
                sink.save(state.run_id, &current, &snapshot).await.ok();
            }

            match self.successor(&current, &state, errored) {
                Some(next) => current = next,
                None => return Ok(state),
            }
        }
    }

    /// Runs one node with retry/backoff/timeout, returning the resulting
    /// state and whether the node terminally failed (structured failure,
    /// or exception/timeout with retries exhausted). The per-attempt
    /// timeout wrapping is the ambient `with_timeout` helper; the
    /// retry/backoff loop stays bespoke because it must distinguish
    /// `DigestGraphError::is_retryable()` failures from terminal ones,
    /// which the generic helper's policy does not model.
    async fn run_node_with_policy(&self, node: &RegisteredNode, original: SharedState, name: &str) -> Result<(SharedState, bool)> {
        let mut attempt = 0u32;
        loop {
            let attempt_state = original.clone();
            let invocation = (node.func)(attempt_state);
            let outcome = with_timeout(node.policy.timeout, invocation).await;

            match outcome {
                Ok(NodeOutcome { state, failed: false }) => return Ok((state, false)),
                Ok(NodeOutcome { state, failed: true }) => return Ok((state, true)),
                Err(TimeoutError::OperationFailed(err)) if err.is_retryable() && attempt < node.policy.retries => {
                    let mut state = original.clone();
                    state.record_error(name, None, err.stage_message(), true);
                    attempt += 1;
                    tokio::time::sleep(node.policy.backoff_for(attempt - 1)).await;
                    continue;
                }
                Err(TimeoutError::OperationFailed(err)) => {
                    let mut state = original;
                    state.record_error(name, None, err.stage_message(), false);
                    return Ok((state, true));
                }
                Err(TimeoutError::Timeout(_)) if attempt < node.policy.retries => {
                    let mut state = original.clone();
                    state.record_error(
                        name,
                        None,
                        format!("node '{name}' timed out after {:?}", node.policy.timeout),
                        true,
                    );
                    attempt += 1;
                    tokio::time::sleep(node.policy.backoff_for(attempt - 1)).await;
                    continue;
                }
                Err(TimeoutError::Timeout(_)) => {
                    let mut state = original;
                    state.record_error(
                        name,
                        None,
                        format!("node '{name}' timed out after {:?} (retries exhausted)", node.policy.timeout),
                        false,
                    );
                    return Ok((state, true));
                }
            }
        }
    }
}
