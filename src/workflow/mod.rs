//! Workflow bindings: which model writes solutions, which model writes
//! hints, and the per-run sessions that keep the two apart.

mod binding;
pub mod prompts;
mod session;

pub use binding::WorkflowBinding;
pub use session::{WorkflowSession, WorkflowSessionSummary};
