//! Service layer: search orchestration and evaluation logic.

pub mod adaptive;
pub mod best_of_n;
pub mod evaluator;
pub mod event_bus;
pub mod sampler;
pub mod selector;
pub mod workspace;

pub use best_of_n::{BestOfNOptions, BestOfNRunner};
pub use evaluator::Evaluator;
pub use event_bus::{SearchEvent, SearchEventBus, SearchEventPayload};
pub use sampler::ParallelSampler;
pub use selector::{auto_select, select_candidate};
pub use workspace::WorkspaceGuard;
