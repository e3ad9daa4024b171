//! Default configuration values

use std::path::{Path, PathBuf};

/// Configuration file name, relative to the project root
pub const DEFAULT_CONFIG_FILE: &str = "dev.yaml";

/// Cache directory name, relative to the project root
pub const CACHE_DIR_NAME: &str = ".dev";

/// Path of the configuration file for a project root
pub fn default_config_path(root: &Path) -> PathBuf {
    root.join(DEFAULT_CONFIG_FILE)
}
