//! Resolved target specifications

use std::fmt;

use dev_core::TargetConfig;

/// A target ready to run.
///
/// The name comes from the key the target was looked up under; definitions in
/// `dev.yaml` don't carry their own name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSpec {
    /// Target name
    pub name: String,
    /// Shell commands, run in order
    pub commands: Vec<String>,
    /// Targets run before this one, in order
    pub dependencies: Vec<String>,
    /// Source glob patterns
    pub sources: Vec<String>,
    /// Whether successful runs are cached
    pub cache_enabled: bool,
}

impl TargetSpec {
    /// Create an empty target with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            commands: Vec::new(),
            dependencies: Vec::new(),
            sources: Vec::new(),
            cache_enabled: false,
        }
    }

    /// Build a spec from its configuration, assigning the lookup name
    pub fn from_config(name: impl Into<String>, config: &TargetConfig) -> Self {
        Self {
            name: name.into(),
            commands: config.commands.clone(),
            dependencies: config.dependencies.clone(),
            sources: config.sources.clone(),
            cache_enabled: config.cache,
        }
    }

    /// Add a command
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.commands.push(command.into());
        self
    }

    /// Add a source pattern
    pub fn with_source(mut self, pattern: impl Into<String>) -> Self {
        self.sources.push(pattern.into());
        self
    }

    /// Set whether the target is cached
    pub fn with_cache(mut self, cache_enabled: bool) -> Self {
        self.cache_enabled = cache_enabled;
        self
    }
}

impl fmt::Display for TargetSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_assigns_name() {
        let config = TargetConfig::new()
            .with_command("go build")
            .with_dependency("generate")
            .with_source("src/*.go")
            .with_cache(true);

        let spec = TargetSpec::from_config("build", &config);
        assert_eq!(spec.name, "build");
        assert_eq!(spec.commands, vec!["go build"]);
        assert_eq!(spec.dependencies, vec!["generate"]);
        assert_eq!(spec.sources, vec!["src/*.go"]);
        assert!(spec.cache_enabled);
        assert_eq!(spec.to_string(), "build");
    }
}
