use directories::ProjectDirs;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    pub fn config_dir() -> Option<PathBuf> {
        ProjectDirs::from("", "", "sesh").map(|pd| pd.config_dir().to_path_buf())
    }

    pub fn log_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("log.csv"))
    }
}
