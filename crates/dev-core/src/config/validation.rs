//! Configuration validation

use tracing::{debug, warn};

use crate::error::{ConfigError, Result};

use super::types::TargetSet;

/// Validate a loaded target set.
///
/// Target names become cache file names, so they must be usable as a single
/// path component. Dependencies on undefined targets are only warned about
/// here; they fail when a run reaches them.
pub fn validate_targets(targets: &TargetSet) -> Result<()> {
    debug!("validating targets");
    for (name, target) in targets.iter() {
        validate_target_name(name)?;

        for dep in &target.dependencies {
            if targets.get(dep).is_none() {
                warn!(target_name = name, dependency = %dep, "dependency is not defined");
            }
        }
    }
    debug!("target validation passed");
    Ok(())
}

fn validate_target_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(ConfigError::invalid("target name", "cannot be empty"));
    }

    if name == "." || name == ".." {
        return Err(ConfigError::invalid(
            format!("target '{}'", name),
            "name is reserved",
        ));
    }

    if name.contains(['/', '\\']) {
        return Err(ConfigError::invalid(
            format!("target '{}'", name),
            "name cannot contain path separators",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TargetConfig;

    #[test]
    fn test_valid_targets() {
        let targets = TargetSet::new()
            .with_target("build", TargetConfig::new().with_command("make"))
            .with_target("test", TargetConfig::new().with_dependency("build"));
        assert!(validate_targets(&targets).is_ok());
    }

    #[test]
    fn test_undefined_dependency_is_not_an_error() {
        let targets =
            TargetSet::new().with_target("test", TargetConfig::new().with_dependency("missing"));
        assert!(validate_targets(&targets).is_ok());
    }

    #[test]
    fn test_path_separator_in_name() {
        let targets = TargetSet::new().with_target("../escape", TargetConfig::new());
        let err = validate_targets(&targets).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_reserved_and_empty_names() {
        for name in ["", "  ", ".", ".."] {
            let targets = TargetSet::new().with_target(name, TargetConfig::new());
            assert!(validate_targets(&targets).is_err(), "{:?} should be rejected", name);
        }
    }
}
