//! Evaluator service
//!
//! Runs a task's verification command against a workspace, parses the output
//! into a structured pass/fail score, and optionally emits a remediation
//! suggestion. Verification failures are captured in the result; only
//! infrastructure errors (the command cannot be invoked at all) surface as
//! errors.

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{EvaluatorResult, FailureDetail, TaskSpec};
use crate::domain::ports::SandboxVerifier;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, instrument, warn};

/// Summary-count patterns. Passed and failed are matched independently so
/// the order in the summary line does not matter.
static PASSED_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)\s+passed").unwrap());
static FAILED_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)\s+failed").unwrap());

/// House summary format: `Verification: FAILED (10/21 tests)`. Takes
/// precedence over raw runner counts since it is already aggregated.
static HOUSE_SUMMARY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Verification:\s*\w+\s*\((\d+)/(\d+)\s*tests?\)").unwrap());

/// Short summary failures: `FAILED tests/test_x.py::test_name`.
static SHORT_FAILURE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"FAILED\s+(\S+)::(\w+)").unwrap());

/// Verbose failures with message: `tests/test_x.py::test_name FAILED - msg`.
static VERBOSE_FAILURE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\S+)::(\w+)\s+FAILED\s*[-\u{2013}]\s*(.+?)(?:\n|$)").unwrap());

/// Assertion detail: `Expected [...], but got [...]`.
static EXPECTED_ACTUAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Expected\s+(\[.+?\]),\s+but\s+got\s+(\[.*?\])").unwrap());

/// Counts parsed from verification output.
#[derive(Debug)]
pub struct ParseSummary {
    pub total: u32,
    pub passed: u32,
    pub failed: u32,
    pub failures: Vec<FailureDetail>,
}

/// Whether the output looks like a structured test-runner summary.
#[must_use]
pub fn looks_structured(output: &str) -> bool {
    HOUSE_SUMMARY_RE.is_match(output)
        || PASSED_RE.is_match(output)
        || FAILED_RE.is_match(output)
}

/// Parse structured test-runner output into counts and failure details.
#[must_use]
pub fn parse_structured_output(output: &str) -> ParseSummary {
    let (mut passed, mut failed) = (0u32, 0u32);

    if let Some(caps) = HOUSE_SUMMARY_RE.captures(output) {
        passed = caps[1].parse().unwrap_or(0);
        let total: u32 = caps[2].parse().unwrap_or(0);
        failed = total.saturating_sub(passed);
    } else {
        if let Some(caps) = PASSED_RE.captures(output) {
            passed = caps[1].parse().unwrap_or(0);
        }
        if let Some(caps) = FAILED_RE.captures(output) {
            failed = caps[1].parse().unwrap_or(0);
        }
    }

    let mut failures: Vec<FailureDetail> = Vec::new();

    // Verbose lines carry a message; prefer them over the short summary.
    for caps in VERBOSE_FAILURE_RE.captures_iter(output) {
        failures.push(FailureDetail {
            test_name: caps[2].to_string(),
            expected: None,
            actual: None,
            message: caps[3].trim().to_string(),
            line_number: None,
        });
    }

    if failures.is_empty() {
        for caps in SHORT_FAILURE_RE.captures_iter(output) {
            failures.push(FailureDetail {
                test_name: caps[2].to_string(),
                expected: None,
                actual: None,
                message: "Test failed".to_string(),
                line_number: None,
            });
        }
    }

    // Attach expected/actual pairs to failures that don't have one yet.
    let mut pairs = EXPECTED_ACTUAL_RE.captures_iter(output);
    for failure in &mut failures {
        if failure.expected.is_some() {
            continue;
        }
        let Some(caps) = pairs.next() else { break };
        failure.expected = Some(caps[1].to_string());
        failure.actual = Some(caps[2].to_string());
    }

    ParseSummary {
        total: passed + failed,
        passed,
        failed,
        failures,
    }
}

/// Parse generic output using the exit code: zero is a single passing check,
/// nonzero a single failing check with the raw output as the message.
#[must_use]
pub fn parse_exit_code_output(output: &str, exit_code: i32) -> ParseSummary {
    if exit_code == 0 {
        return ParseSummary {
            total: 1,
            passed: 1,
            failed: 0,
            failures: vec![],
        };
    }

    ParseSummary {
        total: 1,
        passed: 0,
        failed: 1,
        failures: vec![FailureDetail {
            test_name: "verification".to_string(),
            expected: None,
            actual: None,
            message: truncate(output.trim(), 500),
            line_number: None,
        }],
    }
}

/// Count items in a bracketed array string, leniently.
///
/// Tries JSON first; falls back to splitting on commas inside the brackets
/// when the value is not valid JSON (single-quoted Python reprs and such).
#[must_use]
pub fn array_item_count(value: &str) -> Option<usize> {
    let trimmed = value.trim();
    if !trimmed.starts_with('[') || !trimmed.ends_with(']') {
        return None;
    }
    if let Ok(items) = serde_json::from_str::<Vec<serde_json::Value>>(trimmed) {
        return Some(items.len());
    }
    let inner = &trimmed[1..trimmed.len() - 1];
    if inner.trim().is_empty() {
        Some(0)
    } else {
        Some(inner.matches(',').count() + 1)
    }
}

/// Generate a remediation hint from the failure list.
///
/// When the first failure exposes expected/actual arrays, compares lengths:
/// too few items suggests over-restrictive constraints, too many suggests
/// false positives, equal lengths suggests wrong values. Otherwise falls
/// back to the first failure's message truncated to 100 characters.
#[must_use]
pub fn generate_suggestion(failures: &[FailureDetail]) -> Option<String> {
    let first = failures.first()?;

    if let (Some(expected), Some(actual)) = (&first.expected, &first.actual) {
        if let (Some(expected_count), Some(actual_count)) =
            (array_item_count(expected), array_item_count(actual))
        {
            if expected_count > actual_count {
                return Some(format!(
                    "Missing {} matches. Check if constraints are too restrictive.",
                    expected_count - actual_count
                ));
            }
            if actual_count > expected_count {
                return Some(format!(
                    "{} false positives. Check boundary conditions.",
                    actual_count - expected_count
                ));
            }
            return Some(
                "Right number of matches but wrong values. Compare against the expected output."
                    .to_string(),
            );
        }
    }

    Some(format!("Fix: {}", truncate(&first.message, 100)))
}

/// Render an evaluation for prompt injection or log summaries.
#[must_use]
pub fn format_for_summary(result: &EvaluatorResult) -> String {
    let mut lines = Vec::new();

    if result.passed {
        lines.push(format!(
            "Verification: PASSED ({}/{} tests)",
            result.tests_passing, result.tests_total
        ));
        return lines.join("\n");
    }

    lines.push(format!(
        "Verification: FAILED ({}/{} tests)",
        result.tests_passing, result.tests_total
    ));

    for failure in result.failures.iter().take(3) {
        if let (Some(expected), Some(actual)) = (&failure.expected, &failure.actual) {
            lines.push(format!(
                "  - {}: expected {expected}, got {actual}",
                failure.test_name
            ));
        } else {
            lines.push(format!(
                "  - {}: {}",
                failure.test_name,
                truncate(&failure.message, 100)
            ));
        }
    }

    if result.failures.len() > 3 {
        lines.push(format!("  ... and {} more failures", result.failures.len() - 3));
    }

    if let Some(ref suggestion) = result.suggestion {
        lines.push(format!("Suggestion: {suggestion}"));
    }

    lines.join("\n")
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let head: String = text.chars().take(max).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}

/// Verification evaluator.
pub struct Evaluator;

impl Evaluator {
    /// Run the task's verification command in `workspace` and score it.
    ///
    /// # Errors
    ///
    /// Returns an error only when the command cannot be invoked (missing
    /// command, spawn failure, or timeout). A failing verification suite is
    /// reported inside the returned result.
    pub async fn evaluate(task: &TaskSpec, workspace: &Path) -> DomainResult<EvaluatorResult> {
        Self::evaluate_with_timeout(task, workspace, task.verification.timeout_secs).await
    }

    /// Like [`Evaluator::evaluate`] with an explicit timeout.
    ///
    /// # Errors
    ///
    /// Same contract as [`Evaluator::evaluate`].
    #[instrument(skip(task, workspace), fields(task_id = %task.id))]
    pub async fn evaluate_with_timeout(
        task: &TaskSpec,
        workspace: &Path,
        timeout_secs: u64,
    ) -> DomainResult<EvaluatorResult> {
        let command = task
            .verification
            .resolve_command()
            .ok_or(DomainError::MissingVerification)?;

        let start = Instant::now();

        let child = Command::new("sh")
            .args(["-c", command])
            .current_dir(workspace)
            .kill_on_drop(true)
            .output();

        let output = match timeout(Duration::from_secs(timeout_secs), child).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(DomainError::Verification(format!(
                    "Failed to invoke verification command: {e}"
                )));
            }
            Err(_) => {
                warn!(task_id = %task.id, timeout_secs, "Verification timed out");
                return Err(DomainError::Timeout {
                    seconds: timeout_secs,
                });
            }
        };

        #[allow(clippy::cast_possible_truncation)]
        let duration_ms = start.elapsed().as_millis() as u64;
        let exit_code = output.status.code().unwrap_or(-1);
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let raw_output = format!("{stdout}\n{stderr}");

        let summary = if looks_structured(&raw_output) {
            parse_structured_output(&raw_output)
        } else {
            parse_exit_code_output(&raw_output, exit_code)
        };

        let passed = exit_code == 0;
        // A clean exit is full progress even when the output parse disagrees.
        let progress = if passed {
            1.0
        } else if summary.total > 0 {
            f64::from(summary.passed) / f64::from(summary.total)
        } else {
            0.0
        };

        debug!(
            task_id = %task.id,
            tests_passing = summary.passed,
            tests_total = summary.total,
            progress,
            passed,
            "Verification complete"
        );

        let suggestion = if passed {
            None
        } else {
            generate_suggestion(&summary.failures)
        };

        Ok(EvaluatorResult {
            passed,
            progress,
            tests_total: summary.total,
            tests_passing: summary.passed,
            failures: summary.failures,
            suggestion,
            raw_output,
            duration_ms,
        })
    }

    /// Run verification inside the sandbox boundary supplied by `verifier`.
    ///
    /// Blind mode: only aggregate counts come back, so the result carries no
    /// per-test failure detail.
    ///
    /// # Errors
    ///
    /// Returns an error when the sandbox itself cannot run the suite.
    #[instrument(skip(task, workspace, verifier), fields(task_id = %task.id))]
    pub async fn evaluate_sandboxed(
        task: &TaskSpec,
        workspace: &Path,
        verifier: &dyn SandboxVerifier,
        timeout_secs: u64,
    ) -> DomainResult<EvaluatorResult> {
        let start = Instant::now();
        let blind = verifier.verify(task, workspace, timeout_secs).await?;

        #[allow(clippy::cast_possible_truncation)]
        let duration_ms = start.elapsed().as_millis() as u64;

        Ok(EvaluatorResult {
            passed: blind.passed,
            progress: blind.progress,
            tests_total: blind.tests_total,
            tests_passing: blind.tests_passing,
            failures: Vec::new(),
            suggestion: None,
            raw_output: String::new(),
            duration_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_mixed_pytest_output() {
        let output = r"
============================= test session starts ==============================
collected 10 items

tests/test_solution.py::test_basic PASSED
tests/test_solution.py::test_edge_case FAILED - AssertionError: Expected ['a', 'b'], but got ['a']

=========================== short test summary info ============================
FAILED tests/test_solution.py::test_edge_case
========================= 1 passed, 1 failed in 0.05s ==========================
";
        let summary = parse_structured_output(output);
        assert_eq!(summary.passed, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.total, 2);
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].test_name, "test_edge_case");
        assert_eq!(summary.failures[0].expected.as_deref(), Some("['a', 'b']"));
        assert_eq!(summary.failures[0].actual.as_deref(), Some("['a']"));
    }

    #[test]
    fn parse_all_passed() {
        let output = "========================= 5 passed in 0.10s ==========================";
        let summary = parse_structured_output(output);
        assert_eq!(summary.passed, 5);
        assert_eq!(summary.failed, 0);
        assert_eq!(summary.total, 5);
        assert!(summary.failures.is_empty());
    }

    #[test]
    fn parse_reversed_summary_order() {
        let output = "2 failed, 8 passed in 1.2s";
        let summary = parse_structured_output(output);
        assert_eq!(summary.passed, 8);
        assert_eq!(summary.failed, 2);
        assert_eq!(summary.total, 10);
    }

    #[test]
    fn house_summary_takes_precedence() {
        let output = "Verification: FAILED (10/21 tests)\n3 passed, 1 failed";
        let summary = parse_structured_output(output);
        assert_eq!(summary.passed, 10);
        assert_eq!(summary.failed, 11);
        assert_eq!(summary.total, 21);
    }

    #[test]
    fn generic_parse_success() {
        let summary = parse_exit_code_output("ok\n", 0);
        assert_eq!(summary.total, 1);
        assert_eq!(summary.passed, 1);
        assert!(summary.failures.is_empty());
    }

    #[test]
    fn generic_parse_failure_carries_output() {
        let summary = parse_exit_code_output("something broke", 1);
        assert_eq!(summary.total, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.failures[0].message, "something broke");
    }

    #[test]
    fn structured_detection() {
        assert!(looks_structured("3 passed, 2 failed"));
        assert!(looks_structured("Verification: PASSED (5/5 tests)"));
        assert!(!looks_structured("no tests here"));
    }

    #[test]
    fn array_count_json() {
        assert_eq!(array_item_count(r#"["a", "b", "c"]"#), Some(3));
        assert_eq!(array_item_count("[]"), Some(0));
    }

    #[test]
    fn array_count_lenient_fallback() {
        // Python repr is not valid JSON; comma splitting applies.
        assert_eq!(array_item_count("['a', 'b']"), Some(2));
        assert_eq!(array_item_count("not an array"), None);
    }

    #[test]
    fn suggestion_missing_matches() {
        let failures = vec![FailureDetail {
            test_name: "test_matches".to_string(),
            expected: Some(r#"["a", "b", "c"]"#.to_string()),
            actual: Some(r#"["a"]"#.to_string()),
            message: "AssertionError".to_string(),
            line_number: None,
        }];
        let suggestion = generate_suggestion(&failures).unwrap();
        assert!(suggestion.contains("Missing 2 matches"));
    }

    #[test]
    fn suggestion_false_positives() {
        let failures = vec![FailureDetail {
            test_name: "test_matches".to_string(),
            expected: Some(r#"["a"]"#.to_string()),
            actual: Some(r#"["a", "b", "c"]"#.to_string()),
            message: "AssertionError".to_string(),
            line_number: None,
        }];
        let suggestion = generate_suggestion(&failures).unwrap();
        assert!(suggestion.contains("2 false positives"));
    }

    #[test]
    fn suggestion_generic_truncates_message() {
        let failures = vec![FailureDetail {
            test_name: "test_x".to_string(),
            expected: None,
            actual: None,
            message: "e".repeat(200),
            line_number: None,
        }];
        let suggestion = generate_suggestion(&failures).unwrap();
        assert!(suggestion.starts_with("Fix: "));
        assert!(suggestion.len() < 120);
    }

    #[test]
    fn no_suggestion_without_failures() {
        assert!(generate_suggestion(&[]).is_none());
    }

    #[test]
    fn summary_rendering() {
        let result = EvaluatorResult {
            passed: false,
            progress: 0.5,
            tests_total: 10,
            tests_passing: 5,
            failures: vec![FailureDetail {
                test_name: "test_basic".to_string(),
                expected: Some("['a', 'b']".to_string()),
                actual: Some("['a']".to_string()),
                message: "AssertionError".to_string(),
                line_number: None,
            }],
            suggestion: Some("Check edge cases".to_string()),
            raw_output: String::new(),
            duration_ms: 100,
        };

        let rendered = format_for_summary(&result);
        assert!(rendered.contains("FAILED"));
        assert!(rendered.contains("5/10"));
        assert!(rendered.contains("test_basic"));
        assert!(rendered.contains("Suggestion:"));
    }
}
