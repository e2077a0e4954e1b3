//! Port traits for caller-supplied collaborators.

pub mod generator;
pub mod verifier;

pub use generator::CandidateGenerator;
pub use verifier::{BlindVerification, SandboxVerifier};
