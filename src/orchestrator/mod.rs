//! The solve loop: generate a candidate, submit it, wait for the verdict,
//! diagnose, and retry until acceptance or budget exhaustion.

mod engine;

pub use engine::{CancelFlag, SolveOrchestrator};
