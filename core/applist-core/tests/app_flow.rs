//! Integration tests for the full select / credentials / refresh flow over
//! file-backed stores.

use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use applist_core::{
    build_list_items, read_sessions_file, AppListConfig, AppSessionCoordinator, AppsListItem,
    CredentialForm, DispatchTarget, FileCatalogRefresher, JsonPreferenceStore, LineDispatcher,
    PreferenceStore, RefreshStatus, SelectionAction, SnapshotPublisher, StorageConfig,
    SubmitOutcome, TransportPreference, TransportType,
};
use applist_protocol::{parse_command, CommandKind, DispatchCommand};
use tempfile::TempDir;

// ─────────────────────────────────────────────────────────────────────────────
// Test Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures/catalog")
        .join(name)
}

/// Writer whose bytes stay readable after the dispatcher takes ownership.
#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    fn commands(&self) -> Vec<DispatchCommand> {
        let bytes = self.0.lock().unwrap().clone();
        String::from_utf8(bytes)
            .unwrap()
            .lines()
            .map(|line| parse_command(line).expect("valid command line"))
            .collect()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

struct Setup {
    _temp: TempDir,
    storage: StorageConfig,
    snapshots: Arc<SnapshotPublisher>,
    output: SharedBuffer,
    coordinator: AppSessionCoordinator,
}

fn setup_with_source(source: PathBuf) -> Setup {
    let temp = tempfile::tempdir().expect("temp dir");
    let storage = StorageConfig::with_root(temp.path().to_path_buf());
    let snapshots = Arc::new(SnapshotPublisher::new());
    let refresher = FileCatalogRefresher::new(source, Arc::clone(&snapshots))
        .with_cache(storage.catalog_file());
    let preferences = JsonPreferenceStore::new(&storage.preferences_file());
    let output = SharedBuffer::default();
    let dispatcher: Arc<dyn DispatchTarget> = Arc::new(LineDispatcher::new(output.clone()));

    let coordinator = AppSessionCoordinator::builder(
        Arc::clone(&snapshots),
        Arc::new(preferences),
        Arc::new(refresher),
        dispatcher,
    )
    .config(AppListConfig {
        refresh_poll_interval_ms: 5,
        refresh_timeout_ms: Some(5_000),
        ..AppListConfig::default()
    })
    .build();

    Setup {
        _temp: temp,
        storage,
        snapshots,
        output,
        coordinator,
    }
}

fn setup() -> Setup {
    setup_with_source(fixture_path("apps.json"))
}

fn credentials(transport: TransportType) -> CredentialForm {
    CredentialForm {
        login: "user1".to_string(),
        password: "Passw0rd".to_string(),
        secondary_password: "Pass1".to_string(),
        transport,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Refresh
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_refresh_loads_catalog_and_clears_empty_prompt() {
    let s = setup();
    assert!(s.coordinator.catalog_is_empty());

    let outcome = s.coordinator.refresh_catalog();
    assert_eq!(outcome.status, RefreshStatus::Idle);
    assert!(!outcome.timed_out);
    assert!(!outcome.catalog_empty);
    assert!(!s.coordinator.catalog_is_empty());
    assert_eq!(s.coordinator.snapshot().apps.len(), 4);

    // Cached for the next start.
    let cached = applist_core::read_catalog_file(&s.storage.catalog_file()).unwrap();
    assert_eq!(cached.len(), 4);
}

#[test]
fn test_failed_refresh_keeps_empty_prompt() {
    let s = setup_with_source(PathBuf::from("/definitely/not/a/catalog.json"));
    let outcome = s.coordinator.refresh_catalog();
    assert_eq!(outcome.status, RefreshStatus::Error);
    assert!(outcome.catalog_empty);
    assert!(s.coordinator.catalog_is_empty());
}

#[test]
fn test_list_rows_group_fixture_catalog() {
    let s = setup();
    s.coordinator.refresh_catalog();

    let rows = build_list_items(s.coordinator.snapshot().apps.clone());
    let separators: Vec<_> = rows
        .iter()
        .filter_map(|row| match row {
            AppsListItem::Separator { category } => Some(category.as_str()),
            AppsListItem::AppEntry { .. } => None,
        })
        .collect();
    assert_eq!(separators, vec!["Distribution", "Graphics", "Other"]);
}

// ─────────────────────────────────────────────────────────────────────────────
// First Launch and Reuse
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_first_launch_collects_credentials_then_reuses_transport() {
    let s = setup();
    s.coordinator.refresh_catalog();

    let decision = s.coordinator.select_by_name("debian").unwrap();
    let app = match decision.action {
        SelectionAction::RequireCredentials { app } => app,
        other => panic!("expected credential prompt, got {:?}", other),
    };
    assert!(s.output.commands().is_empty());

    let prompt = s.coordinator.begin_credentials(app).expect("prompt opens");
    let outcome = s
        .coordinator
        .submit_credentials(prompt, credentials(TransportType::Vnc))
        .unwrap();
    assert!(matches!(outcome, SubmitOutcome::Launched { .. }));

    let commands = s.output.commands();
    assert_eq!(commands.len(), 1);
    assert_eq!(commands[0].kind, CommandKind::StartApp);
    assert_eq!(commands[0].app.as_ref().unwrap().name, "debian");
    assert_eq!(commands[0].login.as_deref(), Some("user1"));
    assert_eq!(commands[0].transport_type.as_deref(), Some("vnc"));

    let decision = s.coordinator.select_by_name("debian").unwrap();
    assert!(matches!(
        decision.action,
        SelectionAction::LaunchWithKnownTransport {
            transport: TransportType::Vnc,
            ..
        }
    ));
    let commands = s.output.commands();
    assert_eq!(commands.len(), 2);
    assert!(!commands[1].has_credentials());
}

#[test]
fn test_transport_preference_survives_restart() {
    let s = setup();
    s.coordinator.refresh_catalog();
    let prompt = s
        .coordinator
        .begin_credentials(s.coordinator.snapshot().find_app("gimp").unwrap().clone())
        .expect("prompt opens");
    let _ = s
        .coordinator
        .submit_credentials(prompt, credentials(TransportType::Ssh))
        .unwrap();

    let reopened = JsonPreferenceStore::new(&s.storage.preferences_file());
    assert_eq!(
        reopened.get("gimp").unwrap(),
        TransportPreference::Set {
            transport: TransportType::Ssh
        }
    );
    assert_eq!(reopened.get("debian").unwrap(), TransportPreference::Unset);
}

#[test]
fn test_corrupt_preferences_block_selection() {
    let s = setup();
    s.coordinator.refresh_catalog();
    std::fs::write(s.storage.preferences_file(), "{not json").unwrap();

    let err = s.coordinator.select_by_name("debian").unwrap_err();
    assert!(err.is_store_unavailable());
    assert!(s.output.commands().is_empty());
}

// ─────────────────────────────────────────────────────────────────────────────
// Sessions
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_backend_sessions_drive_restart_and_duplicate_rejection() {
    let s = setup();
    s.coordinator.refresh_catalog();
    let sessions = read_sessions_file(&fixture_path("sessions.json")).unwrap();
    s.snapshots.publish_sessions(sessions);

    // Only the running session survives into the snapshot.
    assert_eq!(s.coordinator.snapshot().sessions.len(), 1);

    let decision = s.coordinator.select_by_name("debian").unwrap();
    assert_eq!(decision.action, SelectionAction::RejectDuplicate);
    assert!(s.output.commands().is_empty());

    let decision = s.coordinator.select_by_name("alpine").unwrap();
    assert!(matches!(
        decision.action,
        SelectionAction::RestartSession { .. }
    ));
    let commands = s.output.commands();
    assert_eq!(commands.len(), 1);
    assert_eq!(commands[0].kind, CommandKind::RestartSession);
    let session = commands[0].session.as_ref().unwrap();
    assert_eq!(session.name, "alpine");
    assert_eq!(session.transport_type.as_deref(), Some("ssh"));
}

#[test]
fn test_running_session_blocks_credential_launch() {
    let s = setup();
    s.coordinator.refresh_catalog();
    let debian = s.coordinator.snapshot().find_app("debian").unwrap().clone();
    let prompt = s
        .coordinator
        .begin_credentials(debian.clone())
        .expect("prompt opens while nothing runs");

    s.snapshots
        .publish_sessions(read_sessions_file(&fixture_path("sessions.json")).unwrap());

    assert!(s.coordinator.begin_credentials(debian).is_none());
    let outcome = s
        .coordinator
        .submit_credentials(prompt, credentials(TransportType::Vnc))
        .unwrap();
    assert!(matches!(outcome, SubmitOutcome::Refused { .. }));
    assert!(s.output.commands().is_empty());

    let stored = JsonPreferenceStore::new(&s.storage.preferences_file());
    assert_eq!(stored.get("debian").unwrap(), TransportPreference::Unset);
}

#[test]
fn test_stop_from_context_menu_is_dispatched() {
    let s = setup();
    s.coordinator.refresh_catalog();
    let app = s.coordinator.snapshot().find_app("alpine").unwrap().clone();

    s.coordinator
        .context_action(&AppsListItem::AppEntry { app }, applist_core::MenuAction::StopApp);

    let commands = s.output.commands();
    assert_eq!(commands.len(), 1);
    assert_eq!(commands[0].kind, CommandKind::StopApp);
}
