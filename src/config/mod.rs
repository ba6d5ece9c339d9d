//! Configuration types and loading.
//!
//! - `SolverConfig`: top-level configuration with validation
//! - Domain sections: solve loop, judge, local runner, providers, storage

mod settings;

pub use settings::{
    JudgeConfig, ProvidersConfig, RunnerConfig, SolveLoopConfig, SolverConfig, StorageConfig,
    CONFIG_FILE,
};
