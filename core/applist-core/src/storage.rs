//! Storage configuration and path management for the app list.
//!
//! This module provides a centralized `StorageConfig` struct that manages all
//! file paths for app list data. Tests inject a temp root with
//! [`StorageConfig::with_root`]; the `APPLIST_HOME` environment variable
//! overrides the default location for everything else.

use std::env;
use std::path::{Path, PathBuf};

pub const HOME_ENV: &str = "APPLIST_HOME";

/// Central configuration for all app list storage paths.
///
/// Production code uses `StorageConfig::default()` which points to `~/.applist/`.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    root: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        if let Some(root) = env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
            return Self {
                root: PathBuf::from(root),
            };
        }
        let home = dirs::home_dir().unwrap_or_else(env::temp_dir);
        Self {
            root: home.join(".applist"),
        }
    }
}

impl StorageConfig {
    /// Creates a StorageConfig with a custom root directory.
    pub fn with_root(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Files
    // ─────────────────────────────────────────────────────────────────────────────

    /// Path to apps.json (last fetched catalog).
    pub fn catalog_file(&self) -> PathBuf {
        self.root.join("apps.json")
    }

    /// Path to sessions.json (sessions as last reported by the backend).
    pub fn sessions_file(&self) -> PathBuf {
        self.root.join("sessions.json")
    }

    /// Path to preferences.json (per-app transport choice).
    pub fn preferences_file(&self) -> PathBuf {
        self.root.join("preferences.json")
    }

    /// Path to config.json (client settings).
    pub fn config_file(&self) -> PathBuf {
        self.root.join("config.json")
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Directories
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }
}
