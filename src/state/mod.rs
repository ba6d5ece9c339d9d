//! Solve-run phase machine.

mod machine;

pub use machine::{PhaseTracker, PhaseTransition, SolvePhase};
