//! Task descriptor models.
//!
//! A task is read-only input to the search engine: it names the problem and
//! carries the verification command the evaluator runs against a workspace.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

fn default_timeout_secs() -> u64 {
    120
}

/// How a workspace is verified.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationConfig {
    /// Shell command run in the workspace (preferred over `script`).
    pub command: Option<String>,

    /// Script path run in the workspace when no command is set.
    pub script: Option<String>,

    /// Per-run timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            command: None,
            script: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl VerificationConfig {
    /// Resolve the command to execute, command first, script second.
    #[must_use]
    pub fn resolve_command(&self) -> Option<&str> {
        self.command.as_deref().or(self.script.as_deref())
    }
}

/// A verifiable task to be solved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSpec {
    /// Stable task identifier, also the seed namespace for candidates.
    pub id: String,

    /// Free-text problem description forwarded to candidate generators.
    pub description: String,

    pub verification: VerificationConfig,

    /// Source directory containing a `tests` subdirectory, required for
    /// sandboxed verification.
    pub source_path: Option<PathBuf>,
}

impl TaskSpec {
    /// Minimal task with a verification command.
    #[must_use]
    pub fn with_command(id: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: String::new(),
            verification: VerificationConfig {
                command: Some(command.into()),
                ..VerificationConfig::default()
            },
            source_path: None,
        }
    }
}
