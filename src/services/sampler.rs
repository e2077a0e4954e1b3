//! Parallel sampler.
//!
//! Workspace-scoped search: generates several solution variants
//! concurrently, verifies each in its own ephemeral workspace, copies the
//! winning artifact back into the base workspace, and deletes the ephemeral
//! directories on every exit path.

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::sampling::temperature_schedule;
use crate::domain::models::{SampleOutcome, SamplingOptions, SamplingResult, TaskSpec};
use crate::domain::ports::{CandidateGenerator, SandboxVerifier};
use crate::services::event_bus::{SearchEventBus, SearchEventPayload};
use crate::services::workspace::WorkspaceGuard;
use futures::future::join_all;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Generic variation directives cycled across samples. Task knowledge comes
/// only from the task description the generator already holds.
const VARIATION_HINTS: &[&str] = &[
    "Take the most direct approach that satisfies every check.",
    "Prefer the simplest construction that could possibly work.",
    "Handle boundary conditions explicitly before the general case.",
    "Favor strict matching over permissive matching.",
    "Decompose the problem and solve each part independently.",
    "Target the checks most likely to fail first.",
];

/// Build one variation hint per sample, cycling the pool.
fn variation_hints(n: usize) -> Vec<String> {
    (0..n)
        .map(|i| format!("variant-{i}: {}", VARIATION_HINTS[i % VARIATION_HINTS.len()]))
        .collect()
}

/// A generated sample awaiting verification.
struct Survivor {
    index: usize,
    temperature: f64,
    variation: String,
    solution: String,
}

/// Workspace-scoped sampling orchestrator.
pub struct ParallelSampler {
    verifier: Arc<dyn SandboxVerifier>,
    events: Arc<SearchEventBus>,
}

impl ParallelSampler {
    #[must_use]
    pub fn new(verifier: Arc<dyn SandboxVerifier>, events: Arc<SearchEventBus>) -> Self {
        Self { verifier, events }
    }

    /// Run one parallel sampling call.
    ///
    /// Each step is a hard sequencing point: generation completes before any
    /// workspace is created, and all verification completes before the
    /// winning artifact is written back. The base workspace is read-only
    /// throughout except for that final write.
    ///
    /// # Errors
    ///
    /// Fails only when every sample's generation failed
    /// ([`DomainError::AllCandidatesFailed`]) or the base workspace cannot
    /// be read. Per-sample generation and verification failures degrade the
    /// sample instead.
    #[instrument(skip(self, generator, task, options), fields(task_id = %task.id, samples = options.num_samples))]
    pub async fn run_parallel_sampling(
        &self,
        generator: Arc<dyn CandidateGenerator>,
        task: &TaskSpec,
        options: &SamplingOptions,
    ) -> DomainResult<SamplingResult> {
        let run_id = Uuid::new_v4();

        // Step 1: variation hints and temperature schedule.
        let hints = variation_hints(options.num_samples);
        let temperatures = temperature_schedule(
            options.num_samples,
            options.temperature_range,
            options.schedule,
        );

        // Step 2: concurrent generation; individual failures drop the sample.
        let generations = join_all(hints.iter().zip(temperatures.iter()).enumerate().map(
            |(index, (variation, &temperature))| {
                let generator = Arc::clone(&generator);
                async move {
                    let outcome = generator.generate(variation, temperature, index).await;
                    (index, temperature, variation.clone(), outcome)
                }
            },
        ))
        .await;

        let mut survivors: Vec<Survivor> = Vec::new();
        for (index, temperature, variation, outcome) in generations {
            match outcome {
                Ok(solution) => {
                    self.events.emit(SearchEventPayload::OutputChunk {
                        candidate_id: format!("sample-{index}"),
                        text: solution.clone(),
                    });
                    survivors.push(Survivor {
                        index,
                        temperature,
                        variation,
                        solution,
                    });
                }
                Err(e) => {
                    warn!(sample = index, error = %e, "Sample generation failed, dropping");
                }
            }
        }

        if survivors.is_empty() {
            return Err(DomainError::AllCandidatesFailed {
                attempted: options.num_samples,
            });
        }

        // Steps 3-7 run under the guard; step 8 releases unconditionally.
        let mut guard = WorkspaceGuard::new();
        let result = self
            .verify_and_apply(task, &survivors, &mut guard, options, run_id)
            .await;
        guard.release().await;
        result
    }

    async fn verify_and_apply(
        &self,
        task: &TaskSpec,
        survivors: &[Survivor],
        guard: &mut WorkspaceGuard,
        options: &SamplingOptions,
        run_id: Uuid,
    ) -> DomainResult<SamplingResult> {
        // Step 3: one ephemeral workspace per surviving candidate.
        let mut workspaces: Vec<PathBuf> = Vec::with_capacity(survivors.len());
        for survivor in survivors {
            let workspace = guard
                .create_workspace(&options.workspace, run_id, survivor.index)
                .await?;
            workspaces.push(workspace);
        }

        // Step 4: write each solution artifact.
        for (survivor, workspace) in survivors.iter().zip(&workspaces) {
            tokio::fs::write(
                workspace.join(&options.solution_filename),
                &survivor.solution,
            )
            .await?;
        }

        // Step 5: concurrent sandboxed verification; failures degrade the
        // sample rather than the batch.
        let verifications = join_all(survivors.iter().zip(&workspaces).map(
            |(survivor, workspace)| async move {
                self.verifier
                    .verify(task, workspace, options.timeout_secs)
                    .await
                    .map(|blind| (survivor, blind))
                    .map_err(|e| (survivor, e))
            },
        ))
        .await;

        let mut outcomes: Vec<SampleOutcome> = Vec::with_capacity(survivors.len());
        for verification in verifications {
            let outcome = match verification {
                Ok((survivor, blind)) => SampleOutcome {
                    index: survivor.index,
                    temperature: survivor.temperature,
                    variation: survivor.variation.clone(),
                    solution: survivor.solution.clone(),
                    progress: blind.progress,
                    tests_passing: blind.tests_passing,
                    tests_total: blind.tests_total,
                    error: None,
                },
                Err((survivor, e)) => {
                    warn!(sample = survivor.index, error = %e, "Sample verification degraded");
                    SampleOutcome {
                        index: survivor.index,
                        temperature: survivor.temperature,
                        variation: survivor.variation.clone(),
                        solution: survivor.solution.clone(),
                        progress: 0.0,
                        tests_passing: 0,
                        tests_total: 0,
                        error: Some(e.to_string()),
                    }
                }
            };

            self.events.emit(SearchEventPayload::CandidateCompleted {
                candidate_id: format!("sample-{}", outcome.index),
                passed: (outcome.progress - 1.0).abs() < f64::EPSILON,
                progress: outcome.progress,
            });
            outcomes.push(outcome);
        }

        // Step 6: best by maximum progress, first max wins on ties.
        let mut best = outcomes[0].clone();
        for outcome in &outcomes[1..] {
            if outcome.progress > best.progress {
                best = outcome.clone();
            }
        }

        #[allow(clippy::cast_precision_loss)]
        let average_progress =
            outcomes.iter().map(|o| o.progress).sum::<f64>() / outcomes.len() as f64;
        let improvement = best.progress - options.current_best_progress;

        // Step 7: the only externally visible side effect - apply the
        // winning artifact to the base workspace.
        tokio::fs::write(
            options.workspace.join(&options.solution_filename),
            &best.solution,
        )
        .await?;

        info!(
            task_id = %task.id,
            best_sample = best.index,
            best_progress = best.progress,
            average_progress,
            improvement,
            "Parallel sampling complete"
        );

        let mut all = outcomes;
        all.sort_by(|a, b| {
            b.progress
                .partial_cmp(&a.progress)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        Ok(SamplingResult {
            best,
            all,
            average_progress,
            improvement,
        })
    }
}
