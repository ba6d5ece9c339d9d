use std::io::{self, Write};

use serde::Serialize;

use crate::cli::OutputFormat;
use crate::run::{FinalResult, SolveLog};
use crate::workflow::WorkflowBinding;

/// Output writer that handles the two CLI output formats.
///
/// - Text: Human-readable plain output (default)
/// - Json: Single JSON object at completion
pub struct OutputWriter {
    format: OutputFormat,
}

impl OutputWriter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Returns the configured output format.
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Emit the final result of a solve run.
    pub fn emit_result(&self, result: &FinalResult) {
        match self.format {
            OutputFormat::Text => {
                self.print_text_result(result);
            }
            OutputFormat::Json => {
                self.write_json(result);
            }
        }
    }

    /// Emit the workflow catalog.
    pub fn emit_workflows(&self, bindings: &[WorkflowBinding]) {
        match self.format {
            OutputFormat::Text => {
                for binding in bindings {
                    println!(
                        "{:<14} {}/{} + {}/{}",
                        binding.workflow_id,
                        binding.solution_kind.as_str(),
                        binding.solution_model,
                        binding.hint_kind.as_str(),
                        binding.hint_model
                    );
                }
            }
            OutputFormat::Json => {
                self.write_json(&bindings);
            }
        }
    }

    /// Emit recorded solve runs.
    pub fn emit_sessions(&self, logs: &[SolveLog]) {
        match self.format {
            OutputFormat::Text => {
                for log in logs {
                    println!(
                        "{:<36} {:<12} {}",
                        log.workflow_session, log.problem_id, log.final_status
                    );
                }
            }
            OutputFormat::Json => {
                let sessions: Vec<SessionOutput> = logs.iter().map(SessionOutput::from).collect();
                self.write_json(&sessions);
            }
        }
    }

    fn write_json<T: Serialize>(&self, value: &T) {
        if let Ok(json) = serde_json::to_string(value) {
            let mut stdout = io::stdout().lock();
            let _ = writeln!(stdout, "{}", json);
            let _ = stdout.flush();
        }
    }

    fn print_text_result(&self, result: &FinalResult) {
        println!();
        if result.accepted {
            println!("Problem {} solved!", result.problem_id);
        } else {
            println!(
                "Problem {} not solved ({}).",
                result.problem_id, result.status
            );
        }
        println!();
        println!("Workflow: {}", result.workflow);
        println!("Attempts: {}", result.total_attempts);
        if let Some(verdict) = result.best_verdict {
            println!("Last verdict: {}", verdict);
        }
        println!("Duration: {:.1} min", result.total_duration_minutes);
    }
}

#[derive(Debug, Clone, Serialize)]
struct SessionOutput {
    workflow_session: String,
    problem_id: String,
    workflow: String,
    final_status: String,
    attempts: usize,
    max_attempts: u32,
}

impl From<&SolveLog> for SessionOutput {
    fn from(log: &SolveLog) -> Self {
        Self {
            workflow_session: log.workflow_session.clone(),
            problem_id: log.problem_id.clone(),
            workflow: log.workflow.clone(),
            final_status: log.final_status.to_string(),
            attempts: log.attempts.len(),
            max_attempts: log.max_attempts,
        }
    }
}
