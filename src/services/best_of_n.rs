//! Best-of-N candidate orchestrator.
//!
//! Produces N seeded candidates for a task, executes them in bounded
//! parallel batches against isolated workspaces, tracks the running best,
//! and stops launching new batches once a candidate passes.

use crate::domain::errors::DomainResult;
use crate::domain::models::sampling::temperature_schedule;
use crate::domain::models::{
    candidate_id, candidate_seed, BestOfNResult, BestOfNStats, CandidateResult, TaskSpec,
    TemperatureSchedule,
};
use crate::domain::ports::CandidateGenerator;
use crate::services::evaluator::Evaluator;
use crate::services::event_bus::{SearchEventBus, SearchEventPayload};
use crate::services::workspace::WorkspaceGuard;
use futures::future::join_all;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Intra-batch parallelism cap: batches hold at most this many candidates.
pub const MAX_BATCH_SIZE: usize = 3;

/// Options for one best-of-N run.
#[derive(Debug, Clone)]
pub struct BestOfNOptions {
    /// Number of candidates to produce.
    pub n: usize,

    /// Per-candidate verification timeout in seconds.
    pub timeout_secs: u64,

    /// Base workspace each candidate receives an isolated copy of.
    pub workspace_base: PathBuf,

    /// Solution artifact filename inside each candidate workspace.
    pub solution_filename: String,

    /// Index of the first candidate. Nonzero when the adaptive scaler
    /// accumulates rounds, keeping ids and seeds unique across a run.
    pub start_index: usize,
}

impl BestOfNOptions {
    /// Options with standard defaults for the given base workspace.
    #[must_use]
    pub fn new(workspace_base: impl Into<PathBuf>, n: usize) -> Self {
        Self {
            n,
            timeout_secs: 120,
            workspace_base: workspace_base.into(),
            solution_filename: "regex.txt".to_string(),
            start_index: 0,
        }
    }
}

/// Orchestrates parallel candidate execution for one task.
pub struct BestOfNRunner {
    generator: Arc<dyn CandidateGenerator>,
    events: Arc<SearchEventBus>,
}

impl BestOfNRunner {
    /// Create a runner around a caller-supplied generator.
    #[must_use]
    pub fn new(generator: Arc<dyn CandidateGenerator>, events: Arc<SearchEventBus>) -> Self {
        Self { generator, events }
    }

    /// Event bus this runner emits on.
    #[must_use]
    pub fn events(&self) -> &Arc<SearchEventBus> {
        &self.events
    }

    /// Run N candidates in batches of at most [`MAX_BATCH_SIZE`].
    ///
    /// The early-termination check is cooperative: it runs between batches
    /// only, so in-flight candidates always complete and appear in the
    /// result. Individual failures degrade their candidate; this call never
    /// fails as a whole.
    #[instrument(skip(self, task, options), fields(task_id = %task.id, n = options.n))]
    pub async fn run_best_of_n(&self, task: &TaskSpec, options: &BestOfNOptions) -> BestOfNResult {
        let run_id = Uuid::new_v4();
        let batch_size = options.n.min(MAX_BATCH_SIZE).max(1);
        let temperatures = temperature_schedule(
            options.n,
            (0.3, 0.7),
            TemperatureSchedule::Even,
        );

        let indices: Vec<usize> = (options.start_index..options.start_index + options.n).collect();
        let mut candidates: Vec<CandidateResult> = Vec::with_capacity(options.n);
        let mut best: Option<CandidateResult> = None;

        for (batch_number, batch) in indices.chunks(batch_size).enumerate() {
            if best.as_ref().is_some_and(|b| b.passed) {
                info!(
                    task_id = %task.id,
                    completed = candidates.len(),
                    "Early termination: running best already passed"
                );
                break;
            }

            let futures = batch.iter().zip(batch_number * batch_size..).map(|(&index, offset)| {
                let temperature = temperatures.get(offset).copied().unwrap_or(0.7);
                self.run_candidate(task, index, temperature, options, run_id)
            });

            // Fan-in barrier: results are consumed in launch order, which
            // keeps the displacement rule reproducible on ties.
            for result in join_all(futures).await {
                self.events.emit(SearchEventPayload::CandidateCompleted {
                    candidate_id: result.id.clone(),
                    passed: result.passed,
                    progress: result.progress,
                });

                if best.as_ref().is_none_or(|b| b.displaced_by(&result)) {
                    best = Some(result.clone());
                }
                candidates.push(result);
            }

            self.events.emit(SearchEventPayload::BatchCompleted {
                batch: batch_number,
                completed: candidates.len(),
                total: options.n,
                best_progress: best.as_ref().map_or(0.0, |b| b.progress),
            });
        }

        let stats = BestOfNStats::from_candidates(&candidates);
        let any_passed = stats.passed_count > 0;

        info!(
            task_id = %task.id,
            total = stats.total_candidates,
            passed = stats.passed_count,
            best_progress = stats.best_progress,
            "Best-of-N run complete"
        );

        BestOfNResult {
            candidates,
            best,
            any_passed,
            stats,
        }
    }

    /// Execute a single candidate: generate, materialize, verify.
    ///
    /// Any failure degrades the candidate to a failed result carrying the
    /// error message; nothing propagates out of this method.
    async fn run_candidate(
        &self,
        task: &TaskSpec,
        index: usize,
        temperature: f64,
        options: &BestOfNOptions,
        run_id: Uuid,
    ) -> CandidateResult {
        let seed = candidate_seed(&task.id, index);
        let start = Instant::now();

        self.events.emit(SearchEventPayload::CandidateStarted {
            candidate_id: candidate_id(index),
            seed,
        });

        match self
            .attempt_candidate(task, index, seed, temperature, options, run_id)
            .await
        {
            Ok(result) => result,
            Err(e) => {
                warn!(
                    task_id = %task.id,
                    candidate = index,
                    error = %e,
                    "Candidate degraded to failure"
                );
                #[allow(clippy::cast_possible_truncation)]
                let elapsed = start.elapsed().as_millis() as u64;
                CandidateResult::failed(index, seed, e.to_string(), elapsed)
            }
        }
    }

    async fn attempt_candidate(
        &self,
        task: &TaskSpec,
        index: usize,
        seed: u32,
        temperature: f64,
        options: &BestOfNOptions,
        run_id: Uuid,
    ) -> DomainResult<CandidateResult> {
        let start = Instant::now();
        let variation = format!("seed-{seed}");

        let solution = self
            .generator
            .generate(&variation, temperature, index)
            .await?;

        self.events.emit(SearchEventPayload::OutputChunk {
            candidate_id: candidate_id(index),
            text: solution.clone(),
        });

        // The candidate owns its workspace for the whole attempt.
        let mut guard = WorkspaceGuard::new();
        let evaluation = async {
            let workspace = guard
                .create_workspace(&options.workspace_base, run_id, index)
                .await?;
            tokio::fs::write(workspace.join(&options.solution_filename), &solution).await?;
            Evaluator::evaluate_with_timeout(task, &workspace, options.timeout_secs).await
        }
        .await;
        guard.release().await;
        let evaluation = evaluation?;

        #[allow(clippy::cast_possible_truncation)]
        let duration_ms = start.elapsed().as_millis() as u64;

        debug!(
            task_id = %task.id,
            candidate = index,
            progress = evaluation.progress,
            passed = evaluation.passed,
            "Candidate evaluated"
        );

        Ok(CandidateResult {
            id: candidate_id(index),
            seed,
            passed: evaluation.passed,
            progress: evaluation.progress,
            turns: 1,
            duration_ms,
            error: None,
            solution: Some(solution),
        })
    }
}
