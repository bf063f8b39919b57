use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    error::{ReelsightError, Result},
    provider::{self, DEFAULT_API_BASE_URL, DEFAULT_MODEL, ProviderConfig},
    upload::PollPolicy,
};

pub const CONFIG_ENV_VAR: &str = "REELSIGHT_CONFIG";
pub const LOCAL_CONFIG_FILE: &str = "reelsight.toml";

/// User settings, loaded from `reelsight.toml` in the working directory or
/// `<config dir>/reelsight/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub api_key: Option<String>,
    pub model: String,
    pub api_base_url: String,
    pub poll_interval_ms: u64,
    /// Upper bound on status re-fetches while the remote file is processing. 0 disables the bound.
    pub max_polls: u32,
    pub web_search: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            poll_interval_ms: 1000,
            max_polls: 600,
            web_search: true,
        }
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)
            .map_err(|e| ReelsightError::Config(format!("{}: {}", path.display(), e)))?;
        info!(path = %path.display(), "settings loaded");
        Ok(settings)
    }

    /// Like [`Settings::load`], but a missing file yields defaults. A file that
    /// exists and fails to parse is still an error.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no settings file, using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Resolve the settings file (explicit path, `$REELSIGHT_CONFIG`,
    /// `./reelsight.toml`, then the user config dir) and load it.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load(path),
            None => match config_path() {
                Some(path) => Self::load_or_default(&path),
                None => Ok(Self::default()),
            },
        }
    }

    /// Environment API key wins over the one in the file.
    pub fn with_env(self) -> Self {
        self.with_env_from(|name| std::env::var(name).ok())
    }

    pub fn with_env_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(key) = provider::api_key_from(lookup) {
            self.api_key = Some(key);
        }
        self
    }

    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy::new(Duration::from_millis(self.poll_interval_ms), self.max_polls)
    }

    pub fn provider_config(&self) -> ProviderConfig {
        ProviderConfig {
            api_base_url: self.api_base_url.clone(),
            model: self.model.clone(),
            api_key: self.api_key.clone(),
            web_search: self.web_search,
        }
    }
}

fn config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        return Some(PathBuf::from(path));
    }
    let local = PathBuf::from(LOCAL_CONFIG_FILE);
    if local.exists() {
        return Some(local);
    }
    dirs::config_dir().map(|dir| dir.join("reelsight").join("config.toml"))
}
