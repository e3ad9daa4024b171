//! Run command: execute a target and its dependencies

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use console::style;
use tracing::warn;

use dev_core::config::default_config_path;
use dev_core::load_targets;
use dev_tasks::{
    CacheStore, Fingerprinter, OutputMode, SystemShell, TargetGraph, TargetResult, TargetStatus,
    TaskEvent, TaskExecutor, TaskReporter, TracingReporter,
};

use crate::cli::{output, Cli};

/// Run a target from dev.yaml
#[derive(Debug, Args)]
pub struct RunCommand {
    /// Target to run
    pub target: Option<String>,

    /// Config file (default: dev.yaml in the project directory)
    #[arg(short = 'f', long, env = "DEV_CONFIG")]
    pub config: Option<PathBuf>,

    /// List targets and their dependencies
    #[arg(long)]
    pub list: bool,

    /// Print command output after each command exits instead of streaming it
    #[arg(long)]
    pub buffered: bool,
}

impl RunCommand {
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        let root = cli.root()?;
        let config_path = match &self.config {
            Some(path) => root.join(path),
            None => default_config_path(&root),
        };

        let targets = load_targets(&config_path)?;
        let graph = TargetGraph::from_set(&targets);

        for cycle in graph.find_cycles() {
            warn!(cycle = %cycle.join(" -> "), "dependency cycle in config");
        }

        if self.list {
            print_targets(&graph, cli);
            return Ok(());
        }

        let Some(name) = self.target.as_deref() else {
            return Ok(());
        };

        let reporter: Arc<dyn TaskReporter> = if cli.quiet {
            Arc::new(TracingReporter)
        } else {
            Arc::new(ConsoleReporter::new(cli.verbose))
        };
        let mode = if self.buffered {
            OutputMode::Buffered
        } else {
            OutputMode::Stream
        };

        let executor = TaskExecutor::new(
            &graph,
            Fingerprinter::new(&root),
            CacheStore::default_dir(&root),
            Arc::new(SystemShell::new(mode)),
            reporter,
        );
        let results = executor.run(name)?;

        if cli.verbose {
            print_summary(&results);
        }

        Ok(())
    }
}

fn print_targets(graph: &TargetGraph, cli: &Cli) {
    if graph.is_empty() {
        if !cli.quiet {
            output::info("No targets defined.");
        }
        return;
    }

    println!("{}", output::header("Targets"));
    print!("{}", graph.describe());

    if !cli.quiet {
        for cycle in graph.find_cycles() {
            output::warning(&format!("dependency cycle: {}", cycle.join(" -> ")));
        }
        for (target, dep) in graph.missing_dependencies() {
            output::warning(&format!("{} depends on undefined target {}", target, dep));
        }
    }
}

fn print_summary(results: &[TargetResult]) {
    let cached = results
        .iter()
        .filter(|r| r.status == TargetStatus::CacheHit)
        .count();
    let total: Duration = results.iter().map(|r| r.duration).sum();

    println!();
    println!(
        "  {} {} target{} run, {} cached ({:.1}s)",
        style("✓").green().bold(),
        results.len(),
        if results.len() == 1 { "" } else { "s" },
        cached,
        total.as_secs_f64()
    );
}

/// Console reporter with styled progress lines
struct ConsoleReporter {
    verbose: bool,
}

impl ConsoleReporter {
    fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl TaskReporter for ConsoleReporter {
    fn report(&self, event: &TaskEvent) {
        match event {
            TaskEvent::Started { name } => {
                if self.verbose {
                    println!("  {} {}", style("▸").dim(), style(name).bold());
                }
            }
            TaskEvent::CacheHit { name } => {
                println!(
                    "  {} {} {}",
                    style("✓").green(),
                    style(name).green(),
                    style("(cached, skipping)").cyan()
                );
            }
            TaskEvent::CommandStarted { name, command } => {
                if self.verbose {
                    println!("    {} {}", style(format!("[{}]", name)).dim(), style(command).dim());
                }
            }
            TaskEvent::CacheSaved { name, path } => {
                if self.verbose {
                    println!(
                        "    {} cache saved to {}",
                        style(format!("[{}]", name)).dim(),
                        style(path.display()).cyan()
                    );
                }
            }
            TaskEvent::Completed {
                name,
                duration,
                cached,
            } => {
                if !*cached {
                    println!(
                        "  {} {} {}",
                        style("✓").green(),
                        style(name).green(),
                        style(format!("{:.1}s", duration.as_secs_f64())).dim()
                    );
                }
            }
            TaskEvent::Failed { name, duration, .. } => {
                println!(
                    "  {} {} {}",
                    style("✗").red(),
                    style(name).red(),
                    style(format!("{:.1}s", duration.as_secs_f64())).dim()
                );
            }
        }
    }
}
