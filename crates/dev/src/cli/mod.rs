//! CLI definition and command handling

pub mod commands;
pub mod output;

use std::path::PathBuf;

use clap::{CommandFactory, Parser};

use commands::RunCommand;

const AFTER_HELP: &str = "\
Targets are read from dev.yaml in the project directory:

  build:
    cmd: [\"go build ./...\"]   # shell commands, run in order
    deps: [generate]          # targets run first, every time
    srcs: [\"src/*.go\"]        # files and directories to fingerprint
    cache: true               # skip when srcs are unchanged

Cache records live in .dev/<target>.json.";

/// Dev build system: run targets from dev.yaml, skipping unchanged ones
#[derive(Debug, Parser)]
#[command(name = "dev")]
#[command(version, about, long_about = None)]
#[command(after_help = AFTER_HELP)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Project directory (default: current directory)
    #[arg(short = 'C', long, global = true)]
    pub directory: Option<PathBuf>,

    #[command(flatten)]
    pub run: RunCommand,
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> anyhow::Result<()> {
        if self.run.target.is_none() && !self.run.list {
            Self::command().print_help()?;
            println!();
            return Ok(());
        }

        self.run.execute(&self)
    }

    /// Project root all paths are resolved against
    pub fn root(&self) -> anyhow::Result<PathBuf> {
        let cwd = std::env::current_dir()?;
        Ok(match &self.directory {
            Some(dir) => cwd.join(dir),
            None => cwd,
        })
    }
}
