//! Target executor: sequential, cache-aware target runs

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, instrument};

use crate::cache::{CacheError, CacheStore};
use crate::fingerprint::{FingerprintError, Fingerprinter};
use crate::graph::{GraphError, TargetGraph};
use crate::reporter::{TaskEvent, TaskReporter};
use crate::shell::CommandShell;
use crate::target::TargetSpec;

/// Deepest dependency chain a run may reach.
///
/// Cycles are not detected up front, so a cyclic graph stops here.
pub const MAX_DEPENDENCY_DEPTH: usize = 128;

/// How a target invocation finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetStatus {
    /// Commands ran and all succeeded
    Executed,
    /// Sources matched the cache record, commands were skipped
    CacheHit,
}

/// Result of a single target invocation
#[derive(Debug, Clone)]
pub struct TargetResult {
    /// Target that ran
    pub name: String,
    /// How it finished
    pub status: TargetStatus,
    /// How long it took, excluding dependencies
    pub duration: Duration,
}

/// Runs targets one at a time.
///
/// Dependencies run before their dependent on every reference, in
/// declaration order; nothing is memoized within a run.
pub struct TaskExecutor<'g> {
    graph: &'g TargetGraph,
    fingerprinter: Fingerprinter,
    cache: CacheStore,
    shell: Arc<dyn CommandShell>,
    reporter: Arc<dyn TaskReporter>,
}

impl<'g> TaskExecutor<'g> {
    /// Create an executor
    pub fn new(
        graph: &'g TargetGraph,
        fingerprinter: Fingerprinter,
        cache: CacheStore,
        shell: Arc<dyn CommandShell>,
        reporter: Arc<dyn TaskReporter>,
    ) -> Self {
        Self {
            graph,
            fingerprinter,
            cache,
            shell,
            reporter,
        }
    }

    /// Resolve a target by name and run it with its dependencies.
    ///
    /// Results are in completion order, one per invocation.
    #[instrument(skip(self))]
    pub fn run(&self, name: &str) -> Result<Vec<TargetResult>, ExecutionError> {
        let target = self.graph.resolve(name)?;
        let mut chain = Vec::new();
        let mut results = Vec::new();
        self.run_with_dependencies(target, &mut chain, &mut results)?;
        info!(target_name = name, invocations = results.len(), "run complete");
        Ok(results)
    }

    fn run_with_dependencies(
        &self,
        target: &TargetSpec,
        chain: &mut Vec<String>,
        results: &mut Vec<TargetResult>,
    ) -> Result<(), ExecutionError> {
        chain.push(target.name.clone());
        if chain.len() > MAX_DEPENDENCY_DEPTH {
            return Err(ExecutionError::DependencyDepthExceeded {
                chain: chain.clone(),
            });
        }

        for dep in &target.dependencies {
            let dep_target =
                self.graph
                    .resolve(dep)
                    .map_err(|_| GraphError::UnknownDependency {
                        target: target.name.clone(),
                        dependency: dep.clone(),
                    })?;
            debug!(target_name = %target.name, dependency = %dep, "running dependency");
            self.run_with_dependencies(dep_target, chain, results)?;
        }

        results.push(self.run_target(target)?);
        chain.pop();
        Ok(())
    }

    /// Run one target's own commands, without its dependencies.
    ///
    /// Skips the commands on a cache hit and saves the cache after all of
    /// them succeed.
    pub fn run_target(&self, target: &TargetSpec) -> Result<TargetResult, ExecutionError> {
        let start = Instant::now();
        self.reporter.report(&TaskEvent::Started {
            name: target.name.clone(),
        });

        if self.is_cached(target)? {
            self.reporter.report(&TaskEvent::CacheHit {
                name: target.name.clone(),
            });
            self.reporter.report(&TaskEvent::Completed {
                name: target.name.clone(),
                duration: start.elapsed(),
                cached: true,
            });
            return Ok(TargetResult {
                name: target.name.clone(),
                status: TargetStatus::CacheHit,
                duration: start.elapsed(),
            });
        }

        if let Err(e) = self.execute_commands(target).and_then(|_| self.persist(target)) {
            self.reporter.report(&TaskEvent::Failed {
                name: target.name.clone(),
                duration: start.elapsed(),
                error: e.to_string(),
            });
            return Err(e);
        }

        let duration = start.elapsed();
        self.reporter.report(&TaskEvent::Completed {
            name: target.name.clone(),
            duration,
            cached: false,
        });
        Ok(TargetResult {
            name: target.name.clone(),
            status: TargetStatus::Executed,
            duration,
        })
    }

    /// Whether a target's current sources match its cache record.
    ///
    /// Consults the record whether or not the target caches; `cache_enabled`
    /// only decides whether a successful run writes one.
    pub fn is_cached(&self, target: &TargetSpec) -> Result<bool, FingerprintError> {
        let current = self.fingerprinter.fingerprint(&target.sources)?;
        Ok(self.cache.is_valid(&target.name, &current))
    }

    fn execute_commands(&self, target: &TargetSpec) -> Result<(), ExecutionError> {
        let cwd = self.fingerprinter.root();
        for command in &target.commands {
            self.reporter.report(&TaskEvent::CommandStarted {
                name: target.name.clone(),
                command: command.clone(),
            });

            let status =
                self.shell
                    .run(command, cwd)
                    .map_err(|source| ExecutionError::CommandSpawn {
                        target: target.name.clone(),
                        command: command.clone(),
                        source,
                    })?;

            if !status.success() {
                return Err(ExecutionError::CommandFailed {
                    target: target.name.clone(),
                    command: command.clone(),
                    code: status.code,
                });
            }
        }
        Ok(())
    }

    fn persist(&self, target: &TargetSpec) -> Result<(), ExecutionError> {
        if let Some(path) = self.cache.save(target, &self.fingerprinter)? {
            self.reporter.report(&TaskEvent::CacheSaved {
                name: target.name.clone(),
                path,
            });
        }
        Ok(())
    }
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exited with code {}", code),
        None => "was terminated by a signal".to_string(),
    }
}

/// Errors that abort a run
#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    /// Unknown target or dependency
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// Sources could not be fingerprinted
    #[error(transparent)]
    Fingerprint(#[from] FingerprintError),

    /// Cache record could not be written
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// A command exited non-zero
    #[error("Target {target} failed: `{command}` {}", describe_exit(code))]
    CommandFailed {
        target: String,
        command: String,
        code: Option<i32>,
    },

    /// A command could not be started
    #[error("Target {target} failed: can't run `{command}`: {source}")]
    CommandSpawn {
        target: String,
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Dependency chain too deep, most likely a cycle
    #[error(
        "Dependency chain deeper than {} targets, check for a cycle: {}",
        MAX_DEPENDENCY_DEPTH,
        chain.join(" -> ")
    )]
    DependencyDepthExceeded { chain: Vec<String> },
}
