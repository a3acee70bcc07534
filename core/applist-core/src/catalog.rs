//! App catalog: list rows, on-disk catalog/session files, and refreshers.
//!
//! A refresher only exposes a status flag. Callers that need to know when a
//! refresh finished poll [`CatalogRefresher::status`] (see
//! [`crate::refresh::wait_while_active`]).

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

use fs_err as fs;
use serde::de::DeserializeOwned;
use tempfile::NamedTempFile;

use crate::error::{AppListError, AppListFfiError, Result};
use crate::snapshot::SnapshotPublisher;
use crate::types::{App, AppsListItem, RefreshStatus, Session};

/// Label for apps without a category; this group is always listed last.
pub const UNCATEGORIZED: &str = "Other";

pub trait CatalogRefresher: Send + Sync {
    /// Starts a refresh in the background. No-op while one is already active.
    fn refresh(&self);

    fn status(&self) -> RefreshStatus;
}

// ═══════════════════════════════════════════════════════════════════════════════
// List Rows
// ═══════════════════════════════════════════════════════════════════════════════

/// Groups apps by category for display.
///
/// Categories are sorted by name (uncategorized last); each group starts with
/// a separator row and lists its apps by name.
#[uniffi::export]
pub fn build_list_items(apps: Vec<App>) -> Vec<AppsListItem> {
    let mut groups: BTreeMap<String, Vec<App>> = BTreeMap::new();
    let mut uncategorized = Vec::new();
    for app in apps {
        if app.category.trim().is_empty() {
            uncategorized.push(app);
        } else {
            groups.entry(app.category.clone()).or_default().push(app);
        }
    }
    if let Some(mut named_other) = groups.remove(UNCATEGORIZED) {
        uncategorized.append(&mut named_other);
    }

    let mut items = Vec::new();
    let ordered = groups
        .into_iter()
        .chain((!uncategorized.is_empty()).then(|| (UNCATEGORIZED.to_string(), uncategorized)));
    for (category, mut members) in ordered {
        members.sort_by(|a, b| a.name.cmp(&b.name));
        items.push(AppsListItem::Separator { category });
        items.extend(members.into_iter().map(|app| AppsListItem::AppEntry { app }));
    }
    items
}

/// Reads a catalog file and groups it into list rows.
#[uniffi::export]
pub fn list_items_from_file(
    path: String,
) -> std::result::Result<Vec<AppsListItem>, AppListFfiError> {
    let apps = read_catalog_file(Path::new(&path))?;
    Ok(build_list_items(apps))
}

// ═══════════════════════════════════════════════════════════════════════════════
// Files
// ═══════════════════════════════════════════════════════════════════════════════

/// Reads a JSON array of apps. A missing file is an empty catalog.
pub fn read_catalog_file(path: &Path) -> Result<Vec<App>> {
    read_json_list(path)
}

/// Reads a JSON array of sessions. A missing file means no sessions.
pub fn read_sessions_file(path: &Path) -> Result<Vec<Session>> {
    read_json_list(path)
}

pub fn write_catalog_file(path: &Path, apps: &[App]) -> Result<()> {
    let parent = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent).map_err(|source| AppListError::Io {
        context: "create catalog dir".to_string(),
        source,
    })?;
    let content = serde_json::to_string_pretty(apps).map_err(|source| AppListError::Json {
        context: "serialize catalog".to_string(),
        source,
    })?;

    // Each writer gets its own temp file next to the target.
    let mut temp = NamedTempFile::new_in(parent).map_err(|source| AppListError::Io {
        context: "create catalog temp file".to_string(),
        source,
    })?;
    temp.write_all(content.as_bytes())
        .and_then(|()| temp.flush())
        .map_err(|source| AppListError::Io {
            context: "write catalog".to_string(),
            source,
        })?;
    temp.persist(path).map_err(|err| AppListError::Io {
        context: "commit catalog".to_string(),
        source: err.error,
    })?;
    Ok(())
}

fn read_json_list<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(AppListError::Io {
                context: format!("read {}", path.display()),
                source,
            })
        }
    };
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(&content).map_err(|err| AppListError::CatalogMalformed {
        path: path.to_path_buf(),
        details: err.to_string(),
    })
}

// ═══════════════════════════════════════════════════════════════════════════════
// File Refresher
// ═══════════════════════════════════════════════════════════════════════════════

/// Refreshes the catalog from a JSON file on a background thread.
///
/// On success the catalog is published (sessions are kept) and, when a cache
/// path is set, written there for the next start. On failure the previous
/// catalog stays published and the status becomes `Error`.
pub struct FileCatalogRefresher {
    source: PathBuf,
    cache: Option<PathBuf>,
    publisher: Arc<SnapshotPublisher>,
    status: Arc<Mutex<RefreshStatus>>,
}

impl FileCatalogRefresher {
    pub fn new(source: PathBuf, publisher: Arc<SnapshotPublisher>) -> Self {
        Self {
            source,
            cache: None,
            publisher,
            status: Arc::new(Mutex::new(RefreshStatus::Idle)),
        }
    }

    pub fn with_cache(mut self, cache: PathBuf) -> Self {
        self.cache = Some(cache);
        self
    }
}

impl CatalogRefresher for FileCatalogRefresher {
    fn refresh(&self) {
        {
            let mut status = self.status.lock().unwrap_or_else(PoisonError::into_inner);
            if *status == RefreshStatus::Active {
                tracing::debug!(source = %self.source.display(), "Refresh already active");
                return;
            }
            *status = RefreshStatus::Active;
        }

        let source = self.source.clone();
        let cache = self.cache.clone();
        let publisher = Arc::clone(&self.publisher);
        let status = Arc::clone(&self.status);

        let spawned = thread::Builder::new()
            .name("catalog-refresh".to_string())
            .spawn(move || {
                let settled = match refresh_from_file(&source, cache.as_deref(), &publisher) {
                    Ok(count) => {
                        tracing::info!(source = %source.display(), apps = count, "Catalog refreshed");
                        RefreshStatus::Idle
                    }
                    Err(err) => {
                        tracing::warn!(source = %source.display(), error = %err, "Catalog refresh failed");
                        RefreshStatus::Error
                    }
                };
                *status.lock().unwrap_or_else(PoisonError::into_inner) = settled;
            });

        if let Err(err) = spawned {
            tracing::error!(error = %err, "Failed to spawn catalog refresh thread");
            *self.status.lock().unwrap_or_else(PoisonError::into_inner) = RefreshStatus::Error;
        }
    }

    fn status(&self) -> RefreshStatus {
        *self.status.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn refresh_from_file(
    source: &Path,
    cache: Option<&Path>,
    publisher: &SnapshotPublisher,
) -> Result<usize> {
    if !source.exists() {
        return Err(AppListError::Io {
            context: format!("catalog source {}", source.display()),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        });
    }
    let apps = read_catalog_file(source)?;
    if let Some(cache) = cache {
        if let Err(err) = write_catalog_file(cache, &apps) {
            tracing::warn!(error = %err, "Failed to cache refreshed catalog");
        }
    }
    let count = apps.len();
    publisher.publish_catalog(apps);
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn app(name: &str, category: &str) -> App {
        App {
            category: category.to_string(),
            ..App::named(name)
        }
    }

    fn wait_idle(refresher: &FileCatalogRefresher) -> RefreshStatus {
        let deadline = Instant::now() + Duration::from_secs(5);
        while refresher.status() == RefreshStatus::Active && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        refresher.status()
    }

    #[test]
    fn list_items_group_by_category() {
        let items = build_list_items(vec![
            app("xfce", "Desktop"),
            app("debian", "Distribution"),
            app("alpine", "Distribution"),
            app("gimp", ""),
            app("lxde", "Desktop"),
        ]);

        let rendered: Vec<String> = items
            .iter()
            .map(|item| match item {
                AppsListItem::Separator { category } => format!("# {}", category),
                AppsListItem::AppEntry { app } => app.name.clone(),
            })
            .collect();

        assert_eq!(
            rendered,
            vec![
                "# Desktop",
                "lxde",
                "xfce",
                "# Distribution",
                "alpine",
                "debian",
                "# Other",
                "gimp"
            ]
        );
    }

    #[test]
    fn explicit_other_category_merges_with_uncategorized() {
        let items = build_list_items(vec![app("zsh", "Other"), app("bash", "")]);
        assert_eq!(items.len(), 3);
        assert_eq!(
            items[0],
            AppsListItem::Separator {
                category: "Other".to_string()
            }
        );
        assert_eq!(items[1].app().map(|a| a.name.as_str()), Some("bash"));
    }

    #[test]
    fn empty_catalog_has_no_rows() {
        assert!(build_list_items(Vec::new()).is_empty());
    }

    #[test]
    fn missing_files_read_as_empty() {
        let temp = tempfile::tempdir().expect("temp dir");
        assert!(read_catalog_file(&temp.path().join("apps.json"))
            .unwrap()
            .is_empty());
        assert!(read_sessions_file(&temp.path().join("sessions.json"))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn malformed_catalog_is_an_error() {
        let temp = tempfile::tempdir().expect("temp dir");
        let path = temp.path().join("apps.json");
        std::fs::write(&path, "[{").unwrap();
        assert!(matches!(
            read_catalog_file(&path),
            Err(AppListError::CatalogMalformed { .. })
        ));
    }

    #[test]
    fn list_items_from_file_reports_flat_error() {
        let temp = tempfile::tempdir().expect("temp dir");
        let path = temp.path().join("apps.json");
        std::fs::write(&path, "not json").unwrap();
        let err = list_items_from_file(path.display().to_string()).unwrap_err();
        assert!(err.to_string().contains("Catalog source malformed"));

        write_catalog_file(&path, &[app("debian", "Distribution")]).unwrap();
        let rows = list_items_from_file(path.display().to_string()).unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn concurrent_catalog_writes_leave_one_whole_file() {
        let temp = tempfile::tempdir().expect("temp dir");
        let path = Arc::new(temp.path().join("apps.json"));

        let writers: Vec<_> = (0..8)
            .map(|i| {
                let path = Arc::clone(&path);
                thread::spawn(move || {
                    let apps: Vec<App> = (0..=i).map(|n| App::named(&format!("app{n}"))).collect();
                    write_catalog_file(&path, &apps)
                })
            })
            .collect();
        for writer in writers {
            writer.join().unwrap().expect("every writer commits");
        }

        assert!(!read_catalog_file(&path).unwrap().is_empty());
        let leftovers: Vec<_> = std::fs::read_dir(temp.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .filter(|name| name != "apps.json")
            .collect();
        assert!(leftovers.is_empty(), "stray files: {leftovers:?}");
    }

    #[test]
    fn file_refresher_publishes_and_caches() {
        let temp = tempfile::tempdir().expect("temp dir");
        let source = temp.path().join("remote.json");
        let cache = temp.path().join("cache").join("apps.json");
        write_catalog_file(&source, &[App::named("debian"), App::named("alpine")]).unwrap();

        let publisher = Arc::new(SnapshotPublisher::new());
        let refresher = FileCatalogRefresher::new(source, Arc::clone(&publisher))
            .with_cache(cache.clone());
        refresher.refresh();

        assert_eq!(wait_idle(&refresher), RefreshStatus::Idle);
        assert_eq!(publisher.latest().apps.len(), 2);
        assert_eq!(read_catalog_file(&cache).unwrap().len(), 2);
    }

    #[test]
    fn file_refresher_reports_error_and_keeps_catalog() {
        let temp = tempfile::tempdir().expect("temp dir");
        let publisher = Arc::new(SnapshotPublisher::new());
        publisher.publish(vec![App::named("debian")], vec![]);

        let refresher =
            FileCatalogRefresher::new(temp.path().join("absent.json"), Arc::clone(&publisher));
        refresher.refresh();

        assert_eq!(wait_idle(&refresher), RefreshStatus::Error);
        assert_eq!(publisher.latest().apps.len(), 1);
    }
}
