//! Sandbox verifier port - interface for blind verification backends.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::domain::errors::DomainResult;
use crate::domain::models::TaskSpec;

/// Aggregate result of a blind verification run.
///
/// Sandboxed verification happens inside an isolation boundary the core does
/// not control, so only pass/fail and counts come back. Per-test detail
/// never crosses the boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlindVerification {
    pub exit_code: i32,
    pub passed: bool,
    pub progress: f64,
    pub tests_passing: u32,
    pub tests_total: u32,
}

/// Trait for sandboxed command runners.
///
/// Implementations must support concurrent invocation against distinct
/// workspace paths.
#[async_trait]
pub trait SandboxVerifier: Send + Sync {
    /// Run the task's verification suite against `workspace` inside the
    /// sandbox boundary.
    ///
    /// # Errors
    ///
    /// Returns a verification error when the sandbox itself cannot run the
    /// suite. A failing suite is reported in the result, not as an error.
    async fn verify(
        &self,
        task: &TaskSpec,
        workspace: &Path,
        timeout_secs: u64,
    ) -> DomainResult<BlindVerification>;
}
