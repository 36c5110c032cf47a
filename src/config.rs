use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::{
    app_dirs::AppDirs,
    completion::CompletionPolicy,
    session::{SessionConfig, DEFAULT_DURATION_SECS},
    theme::Theme,
    wpm::{SamplingPolicy, DEFAULT_WPM_CAP},
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub duration_secs: u32,
    pub completion: CompletionPolicy,
    pub sampling: SamplingPolicy,
    pub sample_secs: u32,
    pub wpm_cap: u32,
    pub theme: Theme,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            duration_secs: DEFAULT_DURATION_SECS,
            completion: CompletionPolicy::default(),
            sampling: SamplingPolicy::default(),
            sample_secs: 2,
            wpm_cap: DEFAULT_WPM_CAP,
            theme: Theme::default(),
        }
    }
}

impl Config {
    /// Session parameters; zero durations and caps are raised to one.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            duration_secs: self.duration_secs.max(1),
            completion: self.completion,
            sampling: self.sampling,
            sample_period: Duration::from_secs(u64::from(self.sample_secs.max(1))),
            wpm_cap: self.wpm_cap.max(1),
        }
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path =
            AppDirs::config_path().unwrap_or_else(|| PathBuf::from("typespeed_config.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    /// Missing file means defaults; a malformed one is logged and ignored.
    fn load(&self) -> Config {
        let Ok(bytes) = fs::read(&self.path) else {
            return Config::default();
        };

        match serde_json::from_slice::<Config>(&bytes) {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!("ignoring malformed config {}: {e}", self.path.display());
                Config::default()
            }
        }
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)
    }
}
