//! Fakes for the coordinator's collaborators, shared by unit tests.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use applist_protocol::DispatchCommand;

use crate::catalog::CatalogRefresher;
use crate::dispatch::DispatchTarget;
use crate::error::{AppListError, Result};
use crate::preferences::PreferenceStore;
use crate::signals::{NoticeSink, PermissionGate};
use crate::snapshot::SnapshotPublisher;
use crate::types::{App, Notice, RefreshStatus, TransportPreference, TransportType};

#[derive(Default)]
pub(crate) struct RecordingDispatcher {
    commands: Mutex<Vec<DispatchCommand>>,
}

impl RecordingDispatcher {
    pub(crate) fn commands(&self) -> Vec<DispatchCommand> {
        self.commands.lock().unwrap().clone()
    }
}

impl DispatchTarget for RecordingDispatcher {
    fn dispatch(&self, command: DispatchCommand) {
        self.commands.lock().unwrap().push(command);
    }
}

#[derive(Default)]
pub(crate) struct RecordingNotices {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotices {
    pub(crate) fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }
}

impl NoticeSink for RecordingNotices {
    fn notify(&self, notice: Notice) {
        self.notices.lock().unwrap().push(notice);
    }
}

pub(crate) struct TogglePermissions(pub(crate) AtomicBool);

impl TogglePermissions {
    pub(crate) fn new(granted: bool) -> Self {
        Self(AtomicBool::new(granted))
    }

    pub(crate) fn set(&self, granted: bool) {
        self.0.store(granted, Ordering::SeqCst);
    }
}

impl PermissionGate for TogglePermissions {
    fn permissions_granted(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Preference store whose backing storage is gone.
pub(crate) struct UnavailableStore;

impl PreferenceStore for UnavailableStore {
    fn get(&self, _: &str) -> Result<TransportPreference> {
        Err(AppListError::store_unavailable("preferences", "offline"))
    }

    fn set(&self, _: &str, _: TransportType) -> Result<()> {
        Err(AppListError::store_unavailable("preferences", "offline"))
    }
}

/// Store whose writes land but whose reads fail.
#[derive(Default)]
pub(crate) struct UnreadableAfterWriteStore {
    written: Mutex<Vec<(String, TransportType)>>,
}

impl UnreadableAfterWriteStore {
    pub(crate) fn written(&self) -> Vec<(String, TransportType)> {
        self.written.lock().unwrap().clone()
    }
}

impl PreferenceStore for UnreadableAfterWriteStore {
    fn get(&self, _: &str) -> Result<TransportPreference> {
        Err(AppListError::store_unavailable("preferences", "read failed"))
    }

    fn set(&self, app_name: &str, transport: TransportType) -> Result<()> {
        self.written
            .lock()
            .unwrap()
            .push((app_name.to_string(), transport));
        Ok(())
    }
}

/// Refresher that reports `Active` for a fixed number of status polls, then
/// settles. Optionally publishes a catalog at the moment it settles.
pub(crate) struct ScriptedRefresher {
    active_polls: u32,
    settle_to: RefreshStatus,
    state: Mutex<(RefreshStatus, u32)>,
    refresh_calls: AtomicU32,
    started: AtomicU32,
    status_polls: AtomicU32,
    on_settle: Option<(Arc<SnapshotPublisher>, Vec<App>)>,
}

impl ScriptedRefresher {
    pub(crate) fn settling_after(active_polls: u32, settle_to: RefreshStatus) -> Self {
        Self {
            active_polls,
            settle_to,
            state: Mutex::new((RefreshStatus::Idle, 0)),
            refresh_calls: AtomicU32::new(0),
            started: AtomicU32::new(0),
            status_polls: AtomicU32::new(0),
            on_settle: None,
        }
    }

    pub(crate) fn publishing(mut self, publisher: Arc<SnapshotPublisher>, apps: Vec<App>) -> Self {
        self.on_settle = Some((publisher, apps));
        self
    }

    pub(crate) fn refresh_calls(&self) -> u32 {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn started(&self) -> u32 {
        self.started.load(Ordering::SeqCst)
    }

    pub(crate) fn status_polls(&self) -> u32 {
        self.status_polls.load(Ordering::SeqCst)
    }
}

impl CatalogRefresher for ScriptedRefresher {
    fn refresh(&self) {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().unwrap();
        if state.0 == RefreshStatus::Active {
            return;
        }
        self.started.fetch_add(1, Ordering::SeqCst);
        *state = (RefreshStatus::Active, self.active_polls);
    }

    fn status(&self) -> RefreshStatus {
        self.status_polls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().unwrap();
        if state.0 != RefreshStatus::Active {
            return state.0;
        }
        if state.1 == 0 {
            if let Some((publisher, apps)) = &self.on_settle {
                publisher.publish_catalog(apps.clone());
            }
            state.0 = self.settle_to;
            return state.0;
        }
        state.1 -= 1;
        RefreshStatus::Active
    }
}
