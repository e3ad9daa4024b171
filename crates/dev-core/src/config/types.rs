//! Configuration types

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A target as written in `dev.yaml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    /// Shell commands, run in order
    #[serde(rename = "cmd")]
    pub commands: Vec<String>,

    /// Targets that run before this one, in order
    #[serde(rename = "deps")]
    pub dependencies: Vec<String>,

    /// Source glob patterns fingerprinted for the cache
    #[serde(rename = "srcs")]
    pub sources: Vec<String>,

    /// Whether a successful run is recorded in the cache
    pub cache: bool,
}

impl TargetConfig {
    /// Create an empty target definition
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a command
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.commands.push(command.into());
        self
    }

    /// Add a dependency
    pub fn with_dependency(mut self, dep: impl Into<String>) -> Self {
        self.dependencies.push(dep.into());
        self
    }

    /// Add a source pattern
    pub fn with_source(mut self, pattern: impl Into<String>) -> Self {
        self.sources.push(pattern.into());
        self
    }

    /// Set whether the target is cached
    pub fn with_cache(mut self, cache: bool) -> Self {
        self.cache = cache;
        self
    }
}

/// All targets of a project, keyed by name.
///
/// Loaded once per invocation and read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetSet {
    targets: BTreeMap<String, TargetConfig>,
}

impl TargetSet {
    /// Create an empty target set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a target
    pub fn insert(&mut self, name: impl Into<String>, target: TargetConfig) {
        self.targets.insert(name.into(), target);
    }

    /// Builder-style insert
    pub fn with_target(mut self, name: impl Into<String>, target: TargetConfig) -> Self {
        self.insert(name, target);
        self
    }

    /// Look up a target definition by name
    pub fn get(&self, name: &str) -> Option<&TargetConfig> {
        self.targets.get(name)
    }

    /// Iterate targets in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TargetConfig)> {
        self.targets.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of targets
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// Whether there are no targets
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

impl FromIterator<(String, TargetConfig)> for TargetSet {
    fn from_iter<I: IntoIterator<Item = (String, TargetConfig)>>(iter: I) -> Self {
        Self {
            targets: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_config_field_names() {
        let yaml = "cmd: [\"echo hi\"]\ndeps: [gen]\nsrcs: [\"src/*.go\"]\ncache: true\n";
        let target: TargetConfig = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(target.commands, vec!["echo hi"]);
        assert_eq!(target.dependencies, vec!["gen"]);
        assert_eq!(target.sources, vec!["src/*.go"]);
        assert!(target.cache);
    }

    #[test]
    fn test_target_config_defaults() {
        let target: TargetConfig = serde_yaml::from_str("cmd: [\"true\"]").unwrap();
        assert!(target.dependencies.is_empty());
        assert!(target.sources.is_empty());
        assert!(!target.cache);
    }

    #[test]
    fn test_target_set_builder() {
        let set = TargetSet::new()
            .with_target("build", TargetConfig::new().with_command("make"))
            .with_target("test", TargetConfig::new().with_dependency("build"));

        assert_eq!(set.len(), 2);
        assert_eq!(set.get("test").unwrap().dependencies, vec!["build"]);
        let names: Vec<_> = set.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["build", "test"]);
    }
}
