//! Platform config paths.

use std::path::PathBuf;

use directories::ProjectDirs;

/// Application paths.
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Configuration directory.
    pub config: PathBuf,
}

impl AppPaths {
    /// Platform paths for compact-number.
    #[must_use]
    pub fn new() -> Self {
        let config = ProjectDirs::from("", "", "compact-number").map_or_else(
            || {
                directories::BaseDirs::new()
                    .map_or_else(|| PathBuf::from("."), |d| d.home_dir().to_path_buf())
                    .join(".config/compact-number")
            },
            |proj_dirs| proj_dirs.config_dir().to_path_buf(),
        );
        Self { config }
    }

    /// Default config file.
    #[must_use]
    pub fn config_file(&self) -> PathBuf {
        self.config.join("config.toml")
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}
