//! Verification result models.

use serde::{Deserialize, Serialize};

/// One failing check extracted from verification output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureDetail {
    /// Test name as reported by the runner.
    pub test_name: String,

    /// Expected value, when the assertion message exposed one.
    pub expected: Option<String>,

    /// Actual value, when the assertion message exposed one.
    pub actual: Option<String>,

    /// Failure message, possibly truncated.
    pub message: String,

    /// Source line, when reported.
    pub line_number: Option<u32>,
}

/// Output of one verification run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluatorResult {
    /// Full success: the verification command exited zero.
    pub passed: bool,

    /// Fraction of checks passing, in `[0, 1]`. Zero when no checks ran.
    pub progress: f64,

    pub tests_total: u32,
    pub tests_passing: u32,

    /// Ordered list of failing checks. Empty in blind (sandboxed) mode.
    pub failures: Vec<FailureDetail>,

    /// Optional remediation hint derived from the failures.
    pub suggestion: Option<String>,

    /// Combined stdout and stderr of the verification command.
    pub raw_output: String,

    /// Wall-clock duration of the verification in milliseconds.
    pub duration_ms: u64,
}

