//! Summit - Test-Time Compute Search
//!
//! Summit scales solution quality at inference time by sampling many
//! candidate solutions in parallel, verifying each against a task's test
//! command, and selecting a winner. It provides best-of-N search with
//! adaptive scaling, strategy-based candidate selection, and
//! workspace-isolated parallel sampling.
//!
//! # Architecture
//!
//! This crate follows Clean Architecture / Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): Candidate, evaluation, and selection models
//! - **Service Layer** (`services`): Search orchestration, evaluation, sampling
//! - **Infrastructure Layer** (`infrastructure`): Configuration and logging
//!
//! # Example
//!
//! ```ignore
//! use summit::services::{BestOfNOptions, BestOfNRunner};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // Wire a generator and run a search
//!     Ok(())
//! }
//! ```

pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::errors::{DomainError, DomainResult};
pub use domain::models::{
    BestOfNResult, BestOfNStats, CandidateResult, Config, EvaluatorResult, FailureDetail,
    LoggingConfig, SampleOutcome, SamplingConfig, SamplingOptions, SamplingResult, SearchConfig,
    SelectionMetadata, SelectionOptions, SelectionResult, SelectionStrategy, TaskSpec,
    VerificationConfig,
};
pub use domain::ports::{BlindVerification, CandidateGenerator, SandboxVerifier};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{
    BestOfNOptions, BestOfNRunner, Evaluator, ParallelSampler, SearchEvent, SearchEventBus,
    SearchEventPayload, WorkspaceGuard, auto_select, select_candidate,
};
