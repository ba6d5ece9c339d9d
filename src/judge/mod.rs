//! Judge integration: submission, verdict acquisition, pacing.
//!
//! - `JudgeClient`: the capability the orchestrator consumes
//! - `LocalJudge`: compile-and-run implementation over stored test cases
//! - `SubmitPacer`: shared spacing between consecutive submissions

mod client;
mod local;
mod pacing;

pub use client::{JudgeClient, JudgeResponse, SubmissionHandle, TestOutcome};
pub use local::LocalJudge;
pub use pacing::SubmitPacer;
