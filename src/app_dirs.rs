use directories::ProjectDirs;
use std::path::PathBuf;

const APP_NAME: &str = "typespeed";

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    fn project() -> Option<ProjectDirs> {
        ProjectDirs::from("", "", APP_NAME)
    }

    pub fn config_path() -> Option<PathBuf> {
        Self::project().map(|pd| pd.config_dir().join("config.json"))
    }

    /// Log file under the XDG state dir where there is one, local data otherwise.
    pub fn log_path() -> Option<PathBuf> {
        Self::project().map(|pd| {
            pd.state_dir()
                .unwrap_or_else(|| pd.data_local_dir())
                .join(format!("{APP_NAME}.log"))
        })
    }
}
