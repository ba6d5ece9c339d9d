use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "solve-pilot")]
#[command(author, version, about = "Automated competitive programming solver", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit results as a single JSON object instead of formatted text
    #[arg(long, global = true)]
    pub json: bool,
}

/// Output format for CLI results.
/// - Text: Human-readable text output (default)
/// - Json: Single JSON object at completion
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_flag(json: bool) -> Self {
        if json { Self::Json } else { Self::Text }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the generate/submit/diagnose loop for a problem
    Solve {
        /// Problem id in "{contest}_{letter}" form, e.g. 2042_a
        problem_id: String,

        /// Workflow binding to use (see `workflows`)
        #[arg(short, long)]
        workflow: Option<String>,

        /// Attempt budget override
        #[arg(short, long)]
        attempts: Option<u32>,

        /// Judge against the stored sample tests on this machine, seeding
        /// a judge mapping if the problem has none
        #[arg(long)]
        local: bool,

        /// Problem database path override
        #[arg(long)]
        db: Option<PathBuf>,

        /// Results directory override
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// List the built-in workflow bindings
    Workflows,

    /// Show the stored final result for a problem
    Show {
        /// Problem id of a finished run
        problem_id: String,
    },

    /// List recorded solve runs and their workflow sessions
    Sessions,
}
