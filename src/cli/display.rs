use console::{Style, style};
use indicatif::{ProgressBar, ProgressStyle};

use crate::run::{FinalResult, FinalStatus, SolveLog};
use crate::utils::truncate_with_marker;
use crate::verdict::Verdict;
use crate::workflow::WorkflowBinding;

pub struct Display;

impl Display {
    pub fn new() -> Self {
        Self
    }

    pub fn print_header(&self, text: &str) {
        println!();
        println!("{}", style(text).bold().cyan());
        println!("{}", style("═".repeat(60)).dim());
        println!();
    }

    pub fn print_final_result(&self, result: &FinalResult) {
        self.print_header(&format!("Problem: {}", result.problem_id));

        let status_style = self.status_style(result.status);

        println!(
            "Status:    {}",
            status_style.apply_to(result.status.to_string())
        );
        println!("Workflow:  {}", result.workflow);
        println!("Attempts:  {}", result.total_attempts);

        if let Some(n) = result.successful_attempt {
            println!("Solved on: attempt {}", n);
        }

        if let Some(verdict) = result.best_verdict {
            println!(
                "Verdict:   {}",
                self.verdict_style(verdict).apply_to(verdict.to_string())
            );
        }

        println!("Duration:  {:.1} min", result.total_duration_minutes);

        let stats = result.statistics;
        let rows = [
            ("Compilation errors", stats.compilation_errors),
            ("Runtime errors", stats.runtime_errors),
            ("Wrong answers", stats.wrong_answers),
            ("Time limit exceeded", stats.time_limit_exceeded),
            ("Memory limit exceeded", stats.memory_limit_exceeded),
        ];
        if rows.iter().any(|(_, count)| *count > 0) {
            println!();
            println!("{}", style("Failure breakdown:").bold());
            for (label, count) in rows {
                if count > 0 {
                    println!("  {:<22} {}", label, count);
                }
            }
        }

        println!();
        println!(
            "{}",
            style(format!(
                "Started:  {}",
                result.start_time.format("%Y-%m-%d %H:%M:%S")
            ))
            .dim()
        );
        if let Some(end) = result.end_time {
            println!(
                "{}",
                style(format!("Finished: {}", end.format("%Y-%m-%d %H:%M:%S"))).dim()
            );
        }
    }

    pub fn print_workflows_table(&self, bindings: &[WorkflowBinding]) {
        if bindings.is_empty() {
            println!("{}", style("No workflows registered.").dim());
            return;
        }

        println!(
            "{:<14} {:<16} {:<30} {:<30}",
            style("ID").bold(),
            style("Name").bold(),
            style("Solutions").bold(),
            style("Hints").bold()
        );
        println!("{}", style("─".repeat(90)).dim());

        for binding in bindings {
            println!(
                "{:<14} {:<16} {:<30} {:<30}",
                binding.workflow_id,
                binding.name,
                format!("{}/{}", binding.solution_kind.as_str(), binding.solution_model),
                format!("{}/{}", binding.hint_kind.as_str(), binding.hint_model)
            );
            println!("{}", style(format!("    {}", binding.description)).dim());
        }
    }

    pub fn print_sessions_table(&self, logs: &[SolveLog]) {
        if logs.is_empty() {
            println!("{}", style("No recorded runs.").dim());
            return;
        }

        let accepted = logs
            .iter()
            .filter(|l| l.final_status == FinalStatus::Accepted)
            .count();
        println!(
            "Runs: {}  Accepted: {}",
            logs.len(),
            style(accepted).green()
        );
        println!();

        println!(
            "{:<36} {:<12} {:<12} {:<10}",
            style("Session").bold(),
            style("Problem").bold(),
            style("Status").bold(),
            style("Attempts").bold()
        );
        println!("{}", style("─".repeat(72)).dim());

        for log in logs {
            let status_style = self.status_style(log.final_status);

            println!(
                "{:<36} {:<12} {:<12} {:<10}",
                truncate_with_marker(&log.workflow_session, 34),
                log.problem_id,
                status_style.apply_to(log.final_status.to_string()),
                format!("{}/{}", log.attempts.len(), log.max_attempts)
            );
        }
    }

    pub fn print_success(&self, message: &str) {
        println!("{} {}", style("✓").green().bold(), message);
    }

    pub fn print_error(&self, message: &str) {
        eprintln!("{} {}", style("✗").red().bold(), message);
    }

    pub fn print_warning(&self, message: &str) {
        println!("{} {}", style("!").yellow().bold(), message);
    }

    pub fn print_info(&self, message: &str) {
        println!("{} {}", style("→").cyan(), message);
    }

    pub fn create_spinner(&self, message: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .expect("static template")
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );
        pb.set_message(message.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(80));
        pb
    }

    fn status_style(&self, status: FinalStatus) -> Style {
        match status {
            FinalStatus::InProgress => Style::new().yellow().bold(),
            FinalStatus::Accepted => Style::new().green(),
            FinalStatus::Failed => Style::new().red().bold(),
            FinalStatus::NoMapping => Style::new().magenta(),
            FinalStatus::Cancelled => Style::new().dim().strikethrough(),
        }
    }

    fn verdict_style(&self, verdict: Verdict) -> Style {
        match verdict {
            Verdict::Accepted => Style::new().green().bold(),
            Verdict::WrongAnswer | Verdict::RuntimeError => Style::new().red(),
            Verdict::CompilationError => Style::new().red().bold(),
            Verdict::TimeLimitExceeded
            | Verdict::MemoryLimitExceeded
            | Verdict::IdlenessLimitExceeded => Style::new().yellow(),
            _ => Style::new().dim(),
        }
    }
}

impl Default for Display {
    fn default() -> Self {
        Self::new()
    }
}
