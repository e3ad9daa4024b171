//! Exit codes for the CLI

use dev_core::ConfigError;
use dev_tasks::ExecutionError;

/// Success, including usage output
pub const SUCCESS: u8 = 0;

/// Any fatal condition
pub const ERROR: u8 = 1;

/// Map a fatal error to the process exit code
pub fn for_error(err: &anyhow::Error) -> u8 {
    if err.downcast_ref::<ConfigError>().is_some() {
        tracing::debug!("exiting on configuration error");
    } else if let Some(exec) = err.downcast_ref::<ExecutionError>() {
        tracing::debug!(kind = execution_kind(exec), "exiting on execution error");
    }
    ERROR
}

/// Exit code for a command line clap rejected or answered itself.
///
/// `--help` and `--version` succeed; usage errors are fatal like any other.
pub fn for_usage(err: &clap::Error) -> u8 {
    if err.use_stderr() {
        ERROR
    } else {
        SUCCESS
    }
}

fn execution_kind(err: &ExecutionError) -> &'static str {
    match err {
        ExecutionError::Graph(_) => "lookup",
        ExecutionError::Fingerprint(_) => "source",
        ExecutionError::Cache(_) => "cache",
        ExecutionError::CommandFailed { .. } | ExecutionError::CommandSpawn { .. } => "command",
        ExecutionError::DependencyDepthExceeded { .. } => "dependency",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;
    use dev_tasks::GraphError;

    #[test]
    fn test_all_fatal_errors_exit_one() {
        let lookup = anyhow::Error::from(ExecutionError::from(GraphError::NotFound(
            "nope".to_string(),
        )));
        assert_eq!(for_error(&lookup), ERROR);

        let config = anyhow::Error::from(ConfigError::invalid("target name", "cannot be empty"));
        assert_eq!(for_error(&config), ERROR);

        assert_eq!(for_error(&anyhow::anyhow!("other")), ERROR);
    }

    #[test]
    fn test_usage_errors_exit_one() {
        let extra = Cli::try_parse_from(["dev", "build", "test"]).unwrap_err();
        assert_eq!(for_usage(&extra), ERROR);

        let unknown = Cli::try_parse_from(["dev", "--frobnicate"]).unwrap_err();
        assert_eq!(for_usage(&unknown), ERROR);
    }

    #[test]
    fn test_help_and_version_exit_zero() {
        let help = Cli::try_parse_from(["dev", "--help"]).unwrap_err();
        assert_eq!(for_usage(&help), SUCCESS);

        let version = Cli::try_parse_from(["dev", "--version"]).unwrap_err();
        assert_eq!(for_usage(&version), SUCCESS);
    }
}
