pub mod candidate;
pub mod config;
pub mod evaluation;
pub mod sampling;
pub mod selection;
pub mod task;

pub use candidate::{candidate_id, candidate_seed, BestOfNResult, BestOfNStats, CandidateResult};
pub use config::{Config, LoggingConfig, SamplingConfig, SearchConfig};
pub use evaluation::{EvaluatorResult, FailureDetail};
pub use sampling::{
    temperature_schedule, SampleOutcome, SamplingOptions, SamplingResult, TemperatureSchedule,
};
pub use selection::{SelectionMetadata, SelectionOptions, SelectionResult, SelectionStrategy};
pub use task::{TaskSpec, VerificationConfig};
