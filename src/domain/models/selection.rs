//! Selection policy models.

use serde::{Deserialize, Serialize};

use super::candidate::CandidateResult;

/// Policy for picking a single candidate out of a completed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionStrategy {
    /// First candidate in list order with `passed == true`.
    FirstPass,

    /// Passing candidate with the fewest `(turns, duration_ms)`.
    ShortestCorrect,

    /// Largest group of passing candidates bucketed by rounded progress.
    MajorityVote,

    /// Highest progress across all candidates, passing or not.
    HighestProgress,
}

impl std::fmt::Display for SelectionStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FirstPass => write!(f, "first_pass"),
            Self::ShortestCorrect => write!(f, "shortest_correct"),
            Self::MajorityVote => write!(f, "majority_vote"),
            Self::HighestProgress => write!(f, "highest_progress"),
        }
    }
}

/// Options for a selection call.
#[derive(Debug, Clone)]
pub struct SelectionOptions {
    pub strategy: SelectionStrategy,

    /// Minimum agreement for majority vote, `0.5` when unset.
    pub min_agreement: Option<f64>,
}

impl SelectionOptions {
    #[must_use]
    pub fn new(strategy: SelectionStrategy) -> Self {
        Self {
            strategy,
            min_agreement: None,
        }
    }
}

/// Metadata about how a selection was made.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionMetadata {
    pub passing_count: usize,
    pub total_considered: usize,

    /// `largest_group / passing_count`, reported by majority vote.
    pub agreement_score: Option<f64>,

    /// Length of the selected candidate's solution text, when present.
    pub solution_length: Option<usize>,
}

/// Output of the candidate selector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionResult {
    /// Selected candidate. `None` only when the input set was empty.
    pub selected: Option<CandidateResult>,

    /// Policy that actually decided, which may differ from the requested
    /// one due to fallback.
    pub strategy: SelectionStrategy,

    /// Human-readable justification.
    pub reason: String,

    pub metadata: SelectionMetadata,
}
