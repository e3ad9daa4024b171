//! Dev Core - configuration and error types for the dev task runner
//!
//! This crate loads and validates `dev.yaml` into a [`TargetSet`] and defines
//! the configuration error taxonomy shared by the engine and the CLI.

pub mod config;
pub mod error;

pub use config::{load_targets, TargetConfig, TargetSet};
pub use error::{ConfigError, Result};
