//! Candidate attempt models for best-of-N search.
//!
//! A candidate is one independent attempt at solving a task, produced with a
//! deterministic seed so that runs are reproducible from `(task_id, n)` alone.

use serde::{Deserialize, Serialize};

/// Compute the deterministic seed for candidate `index` of a task.
///
/// Uses a 32-bit rolling hash of `"{task_id}-{index}"`: each step multiplies
/// the accumulator by 31 via shift-and-subtract, wrapping at 32 bits, then the
/// absolute value is taken. No external RNG state is involved, so the seed
/// sequence for a task is identical across repeated runs.
#[must_use]
pub fn candidate_seed(task_id: &str, index: usize) -> u32 {
    let input = format!("{task_id}-{index}");
    let mut hash: i32 = 0;
    for ch in input.chars() {
        hash = hash
            .wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(ch as i32);
    }
    hash.unsigned_abs()
}

/// Stable identifier for candidate `index` within a run.
#[must_use]
pub fn candidate_id(index: usize) -> String {
    format!("candidate-{index}")
}

/// One executed solution attempt.
///
/// Immutable value object created fresh per orchestrator invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateResult {
    /// Stable identifier, unique within a run (`candidate-{n}`).
    pub id: String,

    /// Deterministic seed derived from `(task_id, index)`.
    pub seed: u32,

    /// True iff verification reported full success.
    pub passed: bool,

    /// Fraction of checks passing, in `[0, 1]`. Always `1.0` when `passed`.
    pub progress: f64,

    /// Generation turns consumed by the attempt.
    pub turns: u32,

    /// Wall-clock duration of the attempt in milliseconds.
    pub duration_ms: u64,

    /// Set when generation or verification threw; implies `progress == 0`.
    pub error: Option<String>,

    /// Generated solution text, when the attempt produced one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub solution: Option<String>,
}

impl CandidateResult {
    /// Build a failed candidate carrying an error message.
    ///
    /// Enforces the invariant that an errored candidate has zero progress
    /// and is not passing.
    #[must_use]
    pub fn failed(index: usize, seed: u32, error: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            id: candidate_id(index),
            seed,
            passed: false,
            progress: 0.0,
            turns: 0,
            duration_ms,
            error: Some(error.into()),
            solution: None,
        }
    }

    /// Whether `new` should displace `self` as the running best.
    ///
    /// A passing candidate always displaces a non-passing best and is never
    /// displaced itself. Among failing candidates, strictly higher progress
    /// wins; ties keep the earlier candidate.
    #[must_use]
    pub fn displaced_by(&self, new: &Self) -> bool {
        if new.passed {
            return !self.passed;
        }
        !self.passed && new.progress > self.progress
    }
}

/// Aggregate statistics over a full candidate list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BestOfNStats {
    pub total_candidates: usize,
    pub passed_count: usize,
    pub avg_progress: f64,
    pub avg_turns: f64,
    pub best_progress: f64,
}

impl BestOfNStats {
    /// Compute stats as simple means over the candidate list.
    #[must_use]
    pub fn from_candidates(candidates: &[CandidateResult]) -> Self {
        let total = candidates.len();
        if total == 0 {
            return Self {
                total_candidates: 0,
                passed_count: 0,
                avg_progress: 0.0,
                avg_turns: 0.0,
                best_progress: 0.0,
            };
        }

        #[allow(clippy::cast_precision_loss)]
        let denom = total as f64;
        Self {
            total_candidates: total,
            passed_count: candidates.iter().filter(|c| c.passed).count(),
            avg_progress: candidates.iter().map(|c| c.progress).sum::<f64>() / denom,
            avg_turns: candidates.iter().map(|c| f64::from(c.turns)).sum::<f64>() / denom,
            best_progress: candidates
                .iter()
                .map(|c| c.progress)
                .fold(0.0_f64, f64::max),
        }
    }
}

/// Output of one best-of-N orchestrator run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BestOfNResult {
    /// Every candidate produced, in execution order. Nothing is discarded.
    pub candidates: Vec<CandidateResult>,

    /// Running best chosen during execution. `None` only when no candidate ran.
    pub best: Option<CandidateResult>,

    /// Whether any candidate passed.
    pub any_passed: bool,

    /// Aggregate statistics over `candidates`.
    pub stats: BestOfNStats,
}
