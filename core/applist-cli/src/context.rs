//! Wires the core coordinator to on-disk stores for one CLI invocation.

use std::path::PathBuf;
use std::sync::Arc;

use applist_core::{
    load_config_with_storage, notice_text, read_catalog_file, read_sessions_file,
    AppListConfig, AppSessionCoordinator, DispatchTarget, FileCatalogRefresher,
    JsonPreferenceStore, LineDispatcher, Notice, NoticeSink, SnapshotPublisher,
    StaticPermissions, StorageConfig,
};

use crate::CliError;

/// Prints notices for the person at the terminal.
pub struct StderrNotices;

impl NoticeSink for StderrNotices {
    fn notify(&self, notice: Notice) {
        tracing::debug!(notice = ?notice, "Showing notice");
        eprintln!("{}", notice_text(notice));
    }
}

pub struct Context {
    pub storage: StorageConfig,
    pub coordinator: AppSessionCoordinator,
}

impl Context {
    /// Loads the cached catalog and last reported sessions and builds a
    /// coordinator that dispatches where `config.json` says.
    pub fn open(
        storage: StorageConfig,
        permissions_granted: bool,
        refresh_source: Option<PathBuf>,
    ) -> Result<Self, CliError> {
        let config = load_config_with_storage(&storage);
        let dispatcher = dispatcher_for(&config);
        Self::with_dispatcher(storage, config, permissions_granted, refresh_source, dispatcher)
    }

    pub fn with_dispatcher(
        storage: StorageConfig,
        config: AppListConfig,
        permissions_granted: bool,
        refresh_source: Option<PathBuf>,
        dispatcher: Arc<dyn DispatchTarget>,
    ) -> Result<Self, CliError> {
        let snapshots = Arc::new(SnapshotPublisher::new());
        let apps = read_catalog_file(&storage.catalog_file())?;
        let sessions = read_sessions_file(&storage.sessions_file())?;
        snapshots.publish(apps, sessions);

        let source = refresh_source.unwrap_or_else(|| storage.catalog_file());
        let refresher =
            FileCatalogRefresher::new(source, Arc::clone(&snapshots)).with_cache(storage.catalog_file());
        let preferences = JsonPreferenceStore::new(&storage.preferences_file());

        let coordinator = AppSessionCoordinator::builder(
            Arc::clone(&snapshots),
            Arc::new(preferences),
            Arc::new(refresher),
            dispatcher,
        )
        .permissions(Arc::new(StaticPermissions(permissions_granted)))
        .notices(Arc::new(StderrNotices))
        .config(config)
        .build();

        Ok(Self {
            storage,
            coordinator,
        })
    }
}

fn dispatcher_for(config: &AppListConfig) -> Arc<dyn DispatchTarget> {
    #[cfg(unix)]
    if let Some(socket) = &config.dispatch_socket {
        tracing::debug!(socket = %socket.display(), "Dispatching to backend socket");
        return Arc::new(applist_core::SocketDispatcher::new(socket.clone()));
    }
    #[cfg(not(unix))]
    if config.dispatch_socket.is_some() {
        tracing::warn!("Backend sockets are unix-only; writing commands to stdout");
    }
    Arc::new(LineDispatcher::new(std::io::stdout()))
}
