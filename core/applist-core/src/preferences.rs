//! Per-app transport preference persistence.
//!
//! A preference is written the first time credentials are submitted for an app
//! and reused for every later launch of that app. This module never deletes
//! entries.
//!
//! # File Format
//!
//! ```json
//! {
//!   "version": 1,
//!   "apps": { "debian": "vnc", "alpine": "ssh" }
//! }
//! ```
//!
//! A missing file is an empty store. A file that cannot be read or parsed is
//! reported as unavailable rather than silently treated as empty, so a broken
//! disk never turns into a fresh credential prompt for every app.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use fs_err as fs;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::error::{AppListError, Result};
use crate::types::{TransportPreference, TransportType};

const FILE_VERSION: u32 = 1;

pub trait PreferenceStore: Send + Sync {
    /// Returns `Unset` when the app has no stored choice.
    fn get(&self, app_name: &str) -> Result<TransportPreference>;

    /// Overwrites any previous choice for the app.
    fn set(&self, app_name: &str, transport: TransportType) -> Result<()>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// In-Memory Store
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Default)]
pub struct InMemoryPreferenceStore {
    entries: Mutex<HashMap<String, TransportType>>,
}

impl InMemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for InMemoryPreferenceStore {
    fn get(&self, app_name: &str) -> Result<TransportPreference> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| AppListError::store_unavailable("preferences", "lock poisoned"))?;
        Ok(entries.get(app_name).copied().into())
    }

    fn set(&self, app_name: &str, transport: TransportType) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| AppListError::store_unavailable("preferences", "lock poisoned"))?;
        entries.insert(app_name.to_string(), transport);
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// JSON File Store
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Serialize, Deserialize)]
struct PreferenceFile {
    version: u32,
    #[serde(default)]
    apps: HashMap<String, TransportType>,
}

impl Default for PreferenceFile {
    fn default() -> Self {
        PreferenceFile {
            version: FILE_VERSION,
            apps: HashMap::new(),
        }
    }
}

/// File-backed store. Every call reads the file, so several processes see
/// each other's writes; writes go through a temp file + rename.
#[derive(Debug)]
pub struct JsonPreferenceStore {
    file_path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonPreferenceStore {
    pub fn new(file_path: &Path) -> Self {
        JsonPreferenceStore {
            file_path: file_path.to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    fn load(&self) -> Result<PreferenceFile> {
        let content = match fs::read_to_string(&self.file_path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(PreferenceFile::default())
            }
            Err(err) => {
                return Err(AppListError::store_unavailable(
                    "preferences",
                    err.to_string(),
                ))
            }
        };

        if content.trim().is_empty() {
            return Ok(PreferenceFile::default());
        }

        let file: PreferenceFile =
            serde_json::from_str(&content).map_err(|err| AppListError::PreferencesMalformed {
                path: self.file_path.clone(),
                details: err.to_string(),
            })?;

        if file.version != FILE_VERSION {
            return Err(AppListError::PreferencesMalformed {
                path: self.file_path.clone(),
                details: format!(
                    "unsupported version {} (expected {})",
                    file.version, FILE_VERSION
                ),
            });
        }

        Ok(file)
    }

    fn save(&self, file: &PreferenceFile) -> Result<()> {
        let unavailable = |details: String| AppListError::store_unavailable("preferences", details);

        let parent_dir = self
            .file_path
            .parent()
            .ok_or_else(|| unavailable("preference path has no parent directory".to_string()))?;
        fs::create_dir_all(parent_dir).map_err(|e| unavailable(e.to_string()))?;

        let content = serde_json::to_string_pretty(file).map_err(|source| AppListError::Json {
            context: "serialize preferences".to_string(),
            source,
        })?;

        let mut temp_file =
            NamedTempFile::new_in(parent_dir).map_err(|e| unavailable(e.to_string()))?;
        temp_file
            .write_all(content.as_bytes())
            .map_err(|e| unavailable(e.to_string()))?;
        temp_file.flush().map_err(|e| unavailable(e.to_string()))?;
        temp_file
            .persist(&self.file_path)
            .map_err(|e| unavailable(e.error.to_string()))?;
        Ok(())
    }
}

impl PreferenceStore for JsonPreferenceStore {
    fn get(&self, app_name: &str) -> Result<TransportPreference> {
        Ok(self.load()?.apps.get(app_name).copied().into())
    }

    fn set(&self, app_name: &str, transport: TransportType) -> Result<()> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| AppListError::store_unavailable("preferences", "lock poisoned"))?;
        let mut file = self.load()?;
        file.apps.insert(app_name.to_string(), transport);
        self.save(&file)?;
        tracing::debug!(app = %app_name, transport = %transport, "Stored transport preference");
        Ok(())
    }
}
