//! Parallel-sampling models.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// How temperatures are spread across the sampling range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemperatureSchedule {
    /// Evenly spaced across the range. Deterministic.
    #[default]
    Even,

    /// Uniformly random within the range.
    Random,
}

/// Options for one parallel-sampling call.
#[derive(Debug, Clone)]
pub struct SamplingOptions {
    /// Base workspace. Read-only during sampling except for the final
    /// winning-artifact write.
    pub workspace: PathBuf,

    pub num_samples: usize,

    /// Inclusive temperature bounds, default `(0.3, 0.7)`.
    pub temperature_range: (f64, f64),

    pub schedule: TemperatureSchedule,

    /// Solution artifact filename, default `regex.txt`.
    pub solution_filename: String,

    /// Caller-supplied baseline used to compute `improvement`.
    pub current_best_progress: f64,

    /// Per-candidate verification timeout in seconds.
    pub timeout_secs: u64,
}

impl SamplingOptions {
    /// Options with standard defaults for the given base workspace.
    #[must_use]
    pub fn new(workspace: impl Into<PathBuf>, num_samples: usize) -> Self {
        Self {
            workspace: workspace.into(),
            num_samples,
            temperature_range: (0.3, 0.7),
            schedule: TemperatureSchedule::Even,
            solution_filename: "regex.txt".to_string(),
            current_best_progress: 0.0,
            timeout_secs: 120,
        }
    }
}

/// Build a temperature schedule of `n` values over `range`.
///
/// `Even` spreads values uniformly across the range and is fully
/// deterministic; `Random` draws each value uniformly within the range.
/// A single sample gets the midpoint.
#[must_use]
pub fn temperature_schedule(
    n: usize,
    range: (f64, f64),
    schedule: TemperatureSchedule,
) -> Vec<f64> {
    let (low, high) = range;
    if n == 0 {
        return Vec::new();
    }

    match schedule {
        TemperatureSchedule::Even => {
            if n == 1 {
                return vec![(low + high) / 2.0];
            }
            #[allow(clippy::cast_precision_loss)]
            (0..n)
                .map(|i| low + (high - low) * (i as f64) / ((n - 1) as f64))
                .collect()
        }
        TemperatureSchedule::Random => {
            use rand::Rng;
            let mut rng = rand::thread_rng();
            (0..n).map(|_| rng.gen_range(low..=high)).collect()
        }
    }
}

/// One surviving sample with its verification score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleOutcome {
    /// Original sample index, also the tie-break order for `best`.
    pub index: usize,

    pub temperature: f64,

    /// Variation hint the sample was generated with.
    pub variation: String,

    /// Generated solution text.
    pub solution: String,

    /// Fraction of checks passing, in `[0, 1]`.
    pub progress: f64,

    pub tests_passing: u32,
    pub tests_total: u32,

    /// Set when verification degraded the sample instead of scoring it.
    pub error: Option<String>,
}

/// Output of one parallel-sampling call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplingResult {
    /// Sample with the maximum progress; first max wins on ties.
    pub best: SampleOutcome,

    /// All surviving samples, sorted by progress descending.
    pub all: Vec<SampleOutcome>,

    pub average_progress: f64,

    /// `best.progress - current_best_progress`.
    pub improvement: f64,
}
