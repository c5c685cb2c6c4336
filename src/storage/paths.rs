//! Application paths for configuration.

use directories::ProjectDirs;
use std::path::PathBuf;

/// Config file name inside the config directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Application paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    /// Configuration directory.
    pub config: PathBuf,
}

impl AppPaths {
    /// Create paths for the curcheck application.
    #[must_use]
    pub fn new() -> Self {
        if let Some(proj_dirs) = ProjectDirs::from("com", "curcheck", "curcheck") {
            Self {
                config: proj_dirs.config_dir().to_path_buf(),
            }
        } else {
            // Fallback to home directory
            let home = directories::BaseDirs::new()
                .map_or_else(|| PathBuf::from("."), |d| d.home_dir().to_path_buf());
            Self {
                config: home.join(".config/curcheck"),
            }
        }
    }

    /// Path to the config file.
    #[must_use]
    pub fn config_file(&self) -> PathBuf {
        self.config.join(CONFIG_FILE_NAME)
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}
