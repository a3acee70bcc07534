//! Configuration loading and saving utilities.
//!
//! Missing or unreadable config falls back to defaults; a client should never
//! fail to start because `config.json` is broken.

use crate::error::{AppListError, Result};
use crate::storage::StorageConfig;
use fs_err as fs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_REFRESH_POLL_INTERVAL_MS: u64 = 500;

/// Client settings stored in `config.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppListConfig {
    /// How often `refresh_catalog` re-checks the refresher status.
    pub refresh_poll_interval_ms: u64,
    /// Upper bound on a refresh wait. `None` waits for as long as the refresh runs.
    pub refresh_timeout_ms: Option<u64>,
    /// Unix socket of the session backend. Commands go to stdout when unset.
    pub dispatch_socket: Option<PathBuf>,
}

impl Default for AppListConfig {
    fn default() -> Self {
        Self {
            refresh_poll_interval_ms: DEFAULT_REFRESH_POLL_INTERVAL_MS,
            refresh_timeout_ms: None,
            dispatch_socket: None,
        }
    }
}

impl AppListConfig {
    pub fn refresh_poll_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_poll_interval_ms.max(1))
    }

    pub fn refresh_timeout(&self) -> Option<Duration> {
        self.refresh_timeout_ms.map(Duration::from_millis)
    }
}

/// Loads the configuration, returning defaults if the file is missing or corrupt.
pub fn load_config_with_storage(storage: &StorageConfig) -> AppListConfig {
    let path = storage.config_file();
    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(_) => return AppListConfig::default(),
    };
    match serde_json::from_str(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "Ignoring malformed config");
            AppListConfig::default()
        }
    }
}

/// Saves the configuration to disk.
pub fn save_config_with_storage(storage: &StorageConfig, config: &AppListConfig) -> Result<()> {
    let path = storage.config_file();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| AppListError::Io {
            context: "create config dir".to_string(),
            source,
        })?;
    }
    let content = serde_json::to_string_pretty(config).map_err(|source| AppListError::Json {
        context: "serialize config".to_string(),
        source,
    })?;
    fs::write(&path, content).map_err(|source| AppListError::Io {
        context: format!("write {}", path.display()),
        source,
    })
}
