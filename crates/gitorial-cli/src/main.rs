mod cmd_list;
mod cmd_nav;
mod state_store;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use gitorial::ReadmeMode;
use gitorial_git::GitRepository;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "gitorial")]
#[command(version, about = "Step through tutorials written as git history")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    repo: RepoArgs,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Log debug diagnostics to stderr (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Where the tutorial lives and how to read it.
#[derive(Args, Debug, Clone)]
pub struct RepoArgs {
    /// Path to the tutorial repository
    #[arg(short, long, global = true, default_value = ".")]
    pub repo: PathBuf,

    /// Branch holding the tutorial (default: `gitorial`, `origin/gitorial`, then HEAD's branch)
    #[arg(short, long, global = true)]
    pub branch: Option<String>,

    /// Remote used to derive the tutorial id
    #[arg(long, global = true, default_value = "origin")]
    pub remote: String,

    /// File recording the last step of each tutorial
    #[arg(long, global = true)]
    pub state_file: Option<PathBuf>,

    /// What to do with `readme:` commits
    #[arg(long, global = true, value_enum, default_value_t = ReadmeArg::Exclude)]
    pub readme: ReadmeArg,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadmeArg {
    Exclude,
    Preserve,
}

impl From<ReadmeArg> for ReadmeMode {
    fn from(value: ReadmeArg) -> Self {
        match value {
            ReadmeArg::Exclude => ReadmeMode::Exclude,
            ReadmeArg::Preserve => ReadmeMode::Preserve,
        }
    }
}

impl RepoArgs {
    pub fn open_repository(&self) -> Result<GitRepository> {
        let repo_path = if self.repo.is_absolute() {
            self.repo.clone()
        } else {
            std::env::current_dir()?.join(&self.repo)
        };
        GitRepository::open(&repo_path)
    }

    /// The explicit branch, or the detected tutorial branch, or the branch
    /// HEAD belongs to.
    pub fn branch_for(&self, repo: &GitRepository) -> Result<String> {
        if let Some(branch) = &self.branch {
            return Ok(branch.clone());
        }
        match gitorial_git::detect_tutorial_branch(repo.repository()) {
            Some(branch) => Ok(branch),
            None => gitorial_git::head_branch(repo.repository()),
        }
    }

    pub fn state_path(&self) -> Result<PathBuf> {
        match &self.state_file {
            Some(path) => Ok(path.clone()),
            None => state_store::JsonStateStore::default_path()
                .context("no data directory available; pass --state-file"),
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List branches in the repository
    Branches,
    /// List the steps of the tutorial
    Steps,
    /// Open the tutorial, optionally on the step for a given commit
    Open {
        /// Commit hash to open on
        #[arg(long)]
        at: Option<String>,
    },
    /// Show the current step
    Status,
    /// Move to the next step
    Next,
    /// Move to the previous step
    Prev,
    /// Jump to a step by its 1-based number
    Goto {
        step: usize,
    },
    /// Show or hide the solution of the current template step
    Solution {
        #[arg(value_enum)]
        action: cmd_nav::SolutionAction,
    },
    /// Return to the first step and forget the saved position
    Reset,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Branches => cmd_list::run_branches(&cli.repo, cli.json),
        Commands::Steps => cmd_list::run_steps(&cli.repo, cli.json),
        Commands::Open { at } => cmd_nav::run(cmd_nav::NavOp::Open { at }, &cli.repo, cli.json),
        Commands::Status => cmd_nav::run(cmd_nav::NavOp::Status, &cli.repo, cli.json),
        Commands::Next => cmd_nav::run(cmd_nav::NavOp::Next, &cli.repo, cli.json),
        Commands::Prev => cmd_nav::run(cmd_nav::NavOp::Previous, &cli.repo, cli.json),
        Commands::Goto { step } => cmd_nav::run(cmd_nav::NavOp::GoTo(step), &cli.repo, cli.json),
        Commands::Solution { action } => {
            cmd_nav::run(cmd_nav::NavOp::Solution(action), &cli.repo, cli.json)
        }
        Commands::Reset => cmd_nav::run(cmd_nav::NavOp::Reset, &cli.repo, cli.json),
    }
}
