//! Problem catalog: statements, test cases, judge mappings.

mod store;
mod types;

pub use store::ProblemStore;
pub use types::{JudgeTarget, Problem, ProblemSummary, TestCase, TestKind};
