use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::error::{Result, SolverError};

pub const CONFIG_FILE: &str = "solve-pilot.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub solver: SolveLoopConfig,
    pub judge: JudgeConfig,
    pub run: RunnerConfig,
    pub providers: ProvidersConfig,
    pub storage: StorageConfig,
}

impl SolverConfig {
    pub async fn load(dir: &Path) -> Result<Self> {
        let config_path = dir.join(CONFIG_FILE);
        let config = if config_path.exists() {
            let content = fs::read_to_string(&config_path).await?;
            toml::from_str(&content)?
        } else {
            Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub async fn save(&self, dir: &Path) -> Result<()> {
        self.validate()?;
        let config_path = dir.join(CONFIG_FILE);
        let content =
            toml::to_string_pretty(self).map_err(|e| SolverError::Config(e.to_string()))?;
        fs::write(&config_path, content).await?;
        Ok(())
    }

    /// Validate configuration values for consistency.
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        if self.solver.max_attempts == 0 {
            errors.push("solver.max_attempts must be greater than 0");
        }
        if self.solver.workflow.is_empty() {
            errors.push("solver.workflow must not be empty");
        }

        if self.judge.poll_timeout_secs == 0 {
            errors.push("judge.poll_timeout_secs must be greater than 0");
        }
        if self.judge.poll_interval_secs == 0 {
            errors.push("judge.poll_interval_secs must be greater than 0");
        }
        if self.judge.poll_interval_secs > self.judge.poll_timeout_secs {
            errors.push("judge.poll_interval_secs must not exceed judge.poll_timeout_secs");
        }
        if self.judge.submission_timeout_secs == 0 {
            errors.push("judge.submission_timeout_secs must be greater than 0");
        }

        if self.run.time_limit_ms == 0 {
            errors.push("run.time_limit_ms must be greater than 0");
        }
        if self.run.compiler.is_empty() {
            errors.push("run.compiler must not be empty");
        }

        if self.providers.request_timeout_secs == 0 {
            errors.push("providers.request_timeout_secs must be greater than 0");
        }
        if !(0.0..=2.0).contains(&self.providers.temperature) {
            errors.push("providers.temperature must be between 0.0 and 2.0");
        }
        if self.providers.max_tokens == 0 {
            errors.push("providers.max_tokens must be greater than 0");
        }

        if self.storage.db_path.is_empty() {
            errors.push("storage.db_path must not be empty");
        }
        if self.storage.results_dir.is_empty() {
            errors.push("storage.results_dir must not be empty");
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(SolverError::Config(format!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            )))
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SolveLoopConfig {
    /// Attempt budget per solve run.
    pub max_attempts: u32,
    /// Workflow used when the CLI does not name one.
    pub workflow: String,
}

impl Default for SolveLoopConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            workflow: String::from("gpt-mistral"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JudgeConfig {
    /// Minimum spacing between consecutive submissions, shared across runs.
    pub submit_spacing_secs: u64,
    /// Wall-clock bound on waiting for a terminal verdict.
    pub poll_timeout_secs: u64,
    pub poll_interval_secs: u64,
    /// Wall-clock bound on the submission call itself.
    pub submission_timeout_secs: u64,
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            submit_spacing_secs: 10,
            poll_timeout_secs: 900,
            poll_interval_secs: 3,
            submission_timeout_secs: 300,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Per-test execution limit for the local judge.
    pub time_limit_ms: u64,
    pub compiler: String,
    pub compile_flags: Vec<String>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            time_limit_ms: 2000,
            compiler: String::from("g++"),
            compile_flags: vec![
                String::from("-std=gnu++17"),
                String::from("-O2"),
                String::from("-pipe"),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub request_timeout_secs: u64,
    /// Sampling temperature sent with every chat completion.
    pub temperature: f64,
    /// Completion token cap; reasoning models spend this on reasoning too.
    pub max_tokens: u32,
    /// Keys by provider kind; falls back to the kind's environment variable.
    pub api_keys: HashMap<String, String>,
    /// Endpoint overrides by provider kind, mainly for tests and proxies.
    pub base_urls: HashMap<String, String>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 300,
            temperature: 0.3,
            max_tokens: 2000,
            api_keys: HashMap::new(),
            base_urls: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite database holding problems, tests, and judge mappings.
    pub db_path: String,
    /// Root directory for per-run artifacts.
    pub results_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: String::from("solve-pilot.db"),
            results_dir: String::from("results"),
        }
    }
}
