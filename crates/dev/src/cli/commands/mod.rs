//! CLI commands

mod run;

pub use run::RunCommand;
