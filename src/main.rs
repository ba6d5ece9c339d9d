use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use solve_pilot::cli::{Cli, Commands, Display, OutputFormat};
use solve_pilot::config::SolverConfig;
use solve_pilot::error::Result;
use solve_pilot::judge::{JudgeClient, LocalJudge, SubmitPacer};
use solve_pilot::orchestrator::SolveOrchestrator;
use solve_pilot::output::OutputWriter;
use solve_pilot::problem::{JudgeTarget, Problem, ProblemStore};
use solve_pilot::provider::ProviderRegistry;
use solve_pilot::run::RunStore;
use solve_pilot::workflow::WorkflowBinding;

/// Context for command output handling.
struct OutputContext<'a> {
    display: &'a Display,
    writer: &'a OutputWriter,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            Display::new().print_error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("solve_pilot=debug")
    } else {
        EnvFilter::new("solve_pilot=info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).without_time())
        .with(filter)
        .init();
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let display = Display::new();
    let writer = OutputWriter::new(OutputFormat::from_flag(cli.json));
    let out = OutputContext {
        display: &display,
        writer: &writer,
    };

    match cli.command {
        Commands::Solve {
            problem_id,
            workflow,
            attempts,
            local,
            db,
            out: out_dir,
        } => {
            let overrides = SolveOverrides {
                workflow,
                attempts,
                local,
                db,
                out_dir,
            };
            cmd_solve(&out, &problem_id, overrides).await
        }
        Commands::Workflows => cmd_workflows(&out),
        Commands::Show { problem_id } => cmd_show(&out, &problem_id).await,
        Commands::Sessions => cmd_sessions(&out).await,
    }
}

/// Command-line overrides applied on top of the loaded configuration.
struct SolveOverrides {
    workflow: Option<String>,
    attempts: Option<u32>,
    local: bool,
    db: Option<PathBuf>,
    out_dir: Option<PathBuf>,
}

async fn cmd_solve(
    out: &OutputContext<'_>,
    problem_id: &str,
    overrides: SolveOverrides,
) -> Result<ExitCode> {
    let mut config = SolverConfig::load(Path::new(".")).await?;
    if let Some(workflow) = overrides.workflow {
        config.solver.workflow = workflow;
    }
    if let Some(attempts) = overrides.attempts {
        config.solver.max_attempts = attempts;
    }
    if let Some(db) = overrides.db {
        config.storage.db_path = db.display().to_string();
    }
    if let Some(dir) = overrides.out_dir {
        config.storage.results_dir = dir.display().to_string();
    }
    config.validate()?;

    let problems = Arc::new(ProblemStore::open(&config.storage.db_path)?);

    if overrides.local {
        seed_local_mapping(&problems, problem_id)?;
    }

    let registry = Arc::new(ProviderRegistry::new(config.providers.clone()));
    let judge: Arc<dyn JudgeClient> = Arc::new(LocalJudge::new(
        Arc::clone(&problems),
        config.run.clone(),
        std::env::temp_dir().join("solve-pilot"),
    ));
    let pacer = Arc::new(SubmitPacer::new(Duration::from_secs(
        config.judge.submit_spacing_secs,
    )));
    let runs = RunStore::new(&config.storage.results_dir);
    let max_attempts = config.solver.max_attempts;

    let orchestrator = SolveOrchestrator::new(config, registry, problems, judge, pacer, runs);

    let cancel = orchestrator.cancel_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });

    let spinner = if out.writer.format() == OutputFormat::Text {
        Some(
            out.display
                .create_spinner(&format!("Solving {}...", problem_id)),
        )
    } else {
        None
    };

    let result = orchestrator.solve(problem_id, max_attempts).await;

    if let Some(s) = spinner {
        s.finish_and_clear();
    }

    let final_result = result?;

    match out.writer.format() {
        OutputFormat::Text => {
            if final_result.accepted {
                out.display
                    .print_success(&format!("Problem {} accepted!", problem_id));
            } else {
                out.display.print_error(&format!(
                    "Problem {} not solved ({})",
                    problem_id, final_result.status
                ));
            }
            out.display.print_final_result(&final_result);
        }
        OutputFormat::Json => out.writer.emit_result(&final_result),
    }

    Ok(if final_result.accepted {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Point the judge mapping at the problem's own coordinates so the local
/// judge can run it. Problems that already have a mapping keep it.
fn seed_local_mapping(problems: &ProblemStore, problem_id: &str) -> Result<()> {
    if !problems.exists(problem_id)? || problems.judge_mapping(problem_id)?.is_some() {
        return Ok(());
    }

    if let Some((contest_id, letter)) = Problem::parse_id(problem_id) {
        let target = JudgeTarget {
            judge_contest_id: contest_id.to_string(),
            judge_problem_index: letter.to_uppercase(),
        };
        problems.put_judge_mapping(problem_id, &target)?;
        debug!(problem_id = %problem_id, "Seeded local judge mapping");
    }

    Ok(())
}

fn cmd_workflows(out: &OutputContext<'_>) -> Result<ExitCode> {
    let bindings = WorkflowBinding::catalog();

    match out.writer.format() {
        OutputFormat::Text => {
            out.display.print_header("Workflow Bindings");
            out.display.print_workflows_table(&bindings);
        }
        OutputFormat::Json => out.writer.emit_workflows(&bindings),
    }

    Ok(ExitCode::SUCCESS)
}

async fn cmd_show(out: &OutputContext<'_>, problem_id: &str) -> Result<ExitCode> {
    let config = SolverConfig::load(Path::new(".")).await?;
    let runs = RunStore::new(&config.storage.results_dir);
    let final_result = runs.load_final(problem_id).await?;

    match out.writer.format() {
        OutputFormat::Text => out.display.print_final_result(&final_result),
        OutputFormat::Json => out.writer.emit_result(&final_result),
    }

    Ok(ExitCode::SUCCESS)
}

async fn cmd_sessions(out: &OutputContext<'_>) -> Result<ExitCode> {
    let config = SolverConfig::load(Path::new(".")).await?;
    let runs = RunStore::new(&config.storage.results_dir);
    let logs = runs.list_logs().await?;

    match out.writer.format() {
        OutputFormat::Text => {
            out.display.print_header("Solve Runs");
            out.display.print_sessions_table(&logs);
        }
        OutputFormat::Json => out.writer.emit_sessions(&logs),
    }

    Ok(ExitCode::SUCCESS)
}
