//! Run artifacts: per-attempt records, the solving log, aggregate
//! statistics, and the on-disk results store.

mod store;
mod types;

pub use store::RunStore;
pub use types::{AttemptRecord, FinalResult, FinalStatus, RunStatistics, SolveLog};
