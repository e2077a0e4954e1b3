//! Adaptive best-of-N scaling.
//!
//! Starts at a small N and doubles across sequential rounds, capped at a
//! maximum, until a round produces a pass. Every round's candidates are kept
//! in the final result.

use crate::domain::models::{BestOfNResult, BestOfNStats, CandidateResult, TaskSpec};
use crate::services::best_of_n::{BestOfNOptions, BestOfNRunner};
use crate::services::event_bus::SearchEventPayload;
use tracing::{info, instrument};

impl BestOfNRunner {
    /// Run best-of-N rounds with doubling N until a pass or the cap.
    ///
    /// `options.n` is the starting N. Candidate indices continue across
    /// rounds so ids and seeds stay unique in the accumulated result, and
    /// the running best is maintained with the same displacement rule the
    /// per-round orchestrator uses.
    #[instrument(skip(self, task, options), fields(task_id = %task.id, start_n = options.n, max_n))]
    pub async fn run_adaptive_best_of_n(
        &self,
        task: &TaskSpec,
        options: &BestOfNOptions,
        max_n: usize,
    ) -> BestOfNResult {
        let mut all: Vec<CandidateResult> = Vec::new();
        let mut best: Option<CandidateResult> = None;
        let mut current_n = options.n.max(1);
        let mut round = 0usize;

        while current_n <= max_n {
            let mut round_options = options.clone();
            round_options.n = current_n;
            round_options.start_index = options.start_index + all.len();

            info!(task_id = %task.id, round, n = current_n, "Starting adaptive round");
            let result = self.run_best_of_n(task, &round_options).await;

            for candidate in result.candidates {
                if best.as_ref().is_none_or(|b| b.displaced_by(&candidate)) {
                    best = Some(candidate.clone());
                }
                all.push(candidate);
            }

            self.events().emit(SearchEventPayload::RoundCompleted {
                round,
                n: current_n,
                any_passed: result.any_passed,
            });

            if result.any_passed {
                info!(task_id = %task.id, round, "Adaptive scaling found a pass");
                break;
            }
            if current_n >= max_n {
                info!(task_id = %task.id, round, "Adaptive scaling reached cap without a pass");
                break;
            }

            current_n = (current_n * 2).min(max_n);
            round += 1;
        }

        let stats = BestOfNStats::from_candidates(&all);
        let any_passed = stats.passed_count > 0;

        BestOfNResult {
            candidates: all,
            best,
            any_passed,
            stats,
        }
    }
}
