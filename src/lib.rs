pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod judge;
pub mod orchestrator;
pub mod output;
pub mod problem;
pub mod provider;
pub mod run;
pub mod state;
pub mod utils;
pub mod verdict;
pub mod workflow;

pub use config::SolverConfig;
pub use context::{ContextArena, ConversationContext};
pub use error::{Result, SolverError};
pub use judge::{JudgeClient, JudgeResponse, LocalJudge, SubmitPacer};
pub use orchestrator::{CancelFlag, SolveOrchestrator};
pub use problem::{Problem, ProblemStore};
pub use provider::{LLMProvider, ProviderRegistry};
pub use run::{AttemptRecord, FinalResult, RunStore, SolveLog};
pub use state::{PhaseTracker, SolvePhase};
pub use verdict::Verdict;
pub use workflow::{WorkflowBinding, WorkflowSession};
