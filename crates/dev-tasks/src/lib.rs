//! Dev Tasks - incremental target execution engine
//!
//! This crate resolves targets from a [`TargetGraph`], runs their
//! dependencies and shell commands sequentially, and skips targets whose
//! source fingerprints match the last successful run.

pub mod cache;
pub mod executor;
pub mod fingerprint;
pub mod graph;
pub mod reporter;
pub mod shell;
pub mod target;

pub use cache::{CacheError, CacheRecord, CacheStore};
pub use executor::{ExecutionError, TargetResult, TargetStatus, TaskExecutor, MAX_DEPENDENCY_DEPTH};
pub use fingerprint::{FingerprintError, Fingerprinter, Snapshot};
pub use graph::{GraphError, TargetGraph, TargetNode};
pub use reporter::{CollectingReporter, TaskEvent, TaskReporter, TracingReporter};
pub use shell::{CommandShell, OutputMode, ShellStatus, SystemShell};
pub use target::TargetSpec;
