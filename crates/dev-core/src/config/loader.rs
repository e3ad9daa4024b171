//! Configuration loading

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{debug, info};

use crate::error::{ConfigError, Result};

use super::types::{TargetConfig, TargetSet};
use super::validation::validate_targets;

/// Load and validate the target set from a `dev.yaml` file
pub fn load_targets(path: &Path) -> Result<TargetSet> {
    info!(path = %path.display(), "loading config");

    let content = std::fs::read_to_string(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            ConfigError::NotFound(path.to_path_buf())
        } else {
            ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    let targets = parse_targets(&content, path)?;
    validate_targets(&targets)?;
    debug!(path = %path.display(), targets = targets.len(), "config loaded and validated");
    Ok(targets)
}

/// Parse a target set from YAML text.
///
/// An empty document yields an empty set, and a target written with no body
/// (`lint:`) is an empty definition.
pub fn parse_targets(content: &str, path: &Path) -> Result<TargetSet> {
    if content.trim().is_empty() {
        return Ok(TargetSet::new());
    }

    let raw: Option<BTreeMap<String, Option<TargetConfig>>> =
        serde_yaml::from_str(content).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        })?;

    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|(name, target)| (name, target.unwrap_or_default()))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_targets() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("dev.yaml");
        std::fs::write(
            &config_path,
            "build:\n  cmd: [\"echo hi\"]\n  srcs: [\"src/*.go\"]\n  cache: true\n",
        )
        .unwrap();

        let targets = load_targets(&config_path).unwrap();
        let build = targets.get("build").unwrap();
        assert_eq!(build.commands, vec!["echo hi"]);
        assert_eq!(build.sources, vec!["src/*.go"]);
        assert!(build.cache);
    }

    #[test]
    fn test_load_missing_file() {
        let temp = TempDir::new().unwrap();
        let err = load_targets(&temp.path().join("dev.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_load_malformed_yaml() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("dev.yaml");
        std::fs::write(&config_path, "build: [unclosed\n").unwrap();

        let err = load_targets(&config_path).unwrap_err();
        assert!(matches!(err, ConfigError::Yaml { .. }));
        assert!(err.to_string().starts_with("Invalid yaml"));
    }

    #[test]
    fn test_wrong_field_type_is_rejected() {
        let err = parse_targets("build:\n  cache: maybe\n", Path::new("dev.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Yaml { .. }));
    }

    #[test]
    fn test_empty_document() {
        let targets = parse_targets("\n  \n", Path::new("dev.yaml")).unwrap();
        assert!(targets.is_empty());
    }

    #[test]
    fn test_target_without_body() {
        let targets = parse_targets("lint:\nbuild:\n  cmd: [make]\n", Path::new("dev.yaml")).unwrap();
        assert_eq!(targets.len(), 2);
        assert_eq!(targets.get("lint"), Some(&TargetConfig::default()));
    }
}
