//! Candidate generator port - interface for solution-producing backends.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;

/// Trait for caller-supplied candidate generators.
///
/// A generator produces one candidate solution text given a variation hint
/// and a sampling temperature. Implementations must be safe to invoke
/// concurrently; they share no state with the search core.
#[async_trait]
pub trait CandidateGenerator: Send + Sync {
    /// Generate solution text for sample `index`.
    ///
    /// # Errors
    ///
    /// Returns a generation error when the backend cannot produce a
    /// solution. The orchestrator recovers locally: a failed generation
    /// degrades that one candidate and never aborts its batch.
    async fn generate(&self, variation: &str, temperature: f64, index: usize)
        -> DomainResult<String>;
}
