//! staqd - stacked pull request orchestration

use anstream::eprintln;
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod cli;

use cli::style::Stylize;

/// Keep stacks of dependent pull requests rebased, retargeted and merged
#[derive(Parser, Debug)]
#[command(name = "staqd", version, about, disable_help_subcommand = true)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every subcommand
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Path to the git working tree
    #[arg(long, global = true, default_value = ".")]
    pub path: PathBuf,

    /// Git remote to fetch from and push to (overrides config)
    #[arg(long, global = true)]
    pub remote: Option<String>,

    /// Repository as owner/name (default: parsed from the remote URL)
    #[arg(long, global = true)]
    pub repo: Option<String>,

    /// Print reports without posting them as PR comments
    #[arg(long, global = true)]
    pub no_comment: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show available stack commands and the stored stack of a PR
    Help {
        /// PR number
        #[arg(long)]
        pr: u64,
    },
    /// Restack a PR's children onto its current head
    Restack {
        /// PR number
        #[arg(long)]
        pr: u64,
    },
    /// Merge a PR and restack its children onto its base
    Merge {
        /// PR number
        #[arg(long)]
        pr: u64,
    },
    /// Merge the whole stack rooted at a PR
    MergeAll {
        /// PR number of the stack root
        #[arg(long)]
        pr: u64,
        /// Skip the approval check
        #[arg(long)]
        force: bool,
        /// Do not ask for confirmation
        #[arg(long, short = 'y')]
        yes: bool,
    },
    /// Rebuild stack metadata from PR base branches
    Discover {
        /// PR number of the stack root
        #[arg(long)]
        pr: u64,
    },
    /// Create, update or remove the stack guide comment on a PR
    Guide {
        /// PR number
        #[arg(long)]
        pr: u64,
    },
    /// Run the stack command found in a PR comment
    Dispatch {
        /// PR the comment was posted on
        #[arg(long)]
        pr: u64,
        /// Comment text
        #[arg(long)]
        text: String,
    },
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.global.verbose);

    let result = match cli.command {
        Commands::Help { pr } => cli::run_help(&cli.global, pr).await,
        Commands::Restack { pr } => cli::run_restack(&cli.global, pr).await,
        Commands::Merge { pr } => cli::run_merge(&cli.global, pr).await,
        Commands::MergeAll { pr, force, yes } => {
            cli::run_merge_all(&cli.global, pr, force, yes).await
        }
        Commands::Discover { pr } => cli::run_discover(&cli.global, pr).await,
        Commands::Guide { pr } => cli::run_guide(&cli.global, pr).await,
        Commands::Dispatch { pr, text } => cli::run_dispatch(&cli.global, pr, &text).await,
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("{} {e}", "error:".error());
            ExitCode::FAILURE
        }
    }
}
