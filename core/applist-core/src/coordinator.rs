//! AppSessionCoordinator - turns user actions on the app list into at most
//! one backend command.
//!
//! The coordinator owns no state of its own beyond the "catalog is empty"
//! signal. Catalog and sessions come from the [`SnapshotPublisher`]; the
//! transport choice comes from the [`PreferenceStore`]. Every operation reads
//! exactly one snapshot.
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use applist_core::{AppSessionCoordinator, SelectionAction};
//!
//! let coordinator = AppSessionCoordinator::builder(snapshots, preferences, refresher, dispatcher)
//!     .permissions(Arc::new(StaticPermissions(true)))
//!     .build();
//!
//! if let SelectionAction::RequireCredentials { app } = coordinator.select_app(&app)?.action {
//!     if let Some(prompt) = coordinator.begin_credentials(app) {
//!         coordinator.submit_credentials(prompt, form)?;
//!     }
//! }
//! ```

use std::convert::Infallible;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use applist_protocol::DispatchCommand;

use crate::catalog::CatalogRefresher;
use crate::config::AppListConfig;
use crate::credentials::{check_credentials, CredentialForm, CredentialPrompt, SubmitOutcome};
use crate::dispatch::DispatchTarget;
use crate::error::{AppListError, Result};
use crate::preferences::PreferenceStore;
use crate::refresh::wait_while_active;
use crate::selection::{
    resolve_context_action, resolve_selection_with, ContextOutcome, MenuAction, SelectionAction,
    SelectionDecision,
};
use crate::signals::{LogNoticeSink, NoticeSink, PermissionGate, StaticPermissions};
use crate::snapshot::{AppsSnapshot, SnapshotPublisher, SubscriptionId};
use crate::types::{
    App, AppsListItem, Notice, RefreshOutcome, TransportPreference, TransportType,
};
use crate::validation::{CredentialValidator, DefaultCredentialValidator};

pub struct AppSessionCoordinator {
    snapshots: Arc<SnapshotPublisher>,
    preferences: Arc<dyn PreferenceStore>,
    refresher: Arc<dyn CatalogRefresher>,
    dispatcher: Arc<dyn DispatchTarget>,
    permissions: Arc<dyn PermissionGate>,
    notices: Arc<dyn NoticeSink>,
    validator: Arc<dyn CredentialValidator>,
    config: AppListConfig,
    catalog_empty: Arc<EmptySignal>,
    subscription: SubscriptionId,
}

/// "Catalog is empty" flag tagged with the version of the snapshot it was
/// read from, packed as `version << 1 | empty`. A snapshot never overwrites
/// the flag of a newer one.
#[derive(Debug, Default)]
struct EmptySignal(AtomicU64);

impl EmptySignal {
    fn observe(&self, snapshot: &AppsSnapshot) {
        let packed = (snapshot.version << 1) | u64::from(snapshot.catalog_is_empty());
        self.0.fetch_max(packed, Ordering::SeqCst);
    }

    fn get(&self) -> bool {
        self.0.load(Ordering::SeqCst) & 1 == 1
    }
}

pub struct CoordinatorBuilder {
    snapshots: Arc<SnapshotPublisher>,
    preferences: Arc<dyn PreferenceStore>,
    refresher: Arc<dyn CatalogRefresher>,
    dispatcher: Arc<dyn DispatchTarget>,
    permissions: Arc<dyn PermissionGate>,
    notices: Arc<dyn NoticeSink>,
    validator: Arc<dyn CredentialValidator>,
    config: AppListConfig,
}

impl CoordinatorBuilder {
    pub fn permissions(mut self, permissions: Arc<dyn PermissionGate>) -> Self {
        self.permissions = permissions;
        self
    }

    pub fn notices(mut self, notices: Arc<dyn NoticeSink>) -> Self {
        self.notices = notices;
        self
    }

    pub fn validator(mut self, validator: Arc<dyn CredentialValidator>) -> Self {
        self.validator = validator;
        self
    }

    pub fn config(mut self, config: AppListConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> AppSessionCoordinator {
        let catalog_empty = Arc::new(EmptySignal::default());
        let signal = Arc::clone(&catalog_empty);
        let subscription = self.snapshots.subscribe(move |snapshot| signal.observe(snapshot));
        // Seed after subscribing so a publish in between is not lost.
        catalog_empty.observe(&self.snapshots.latest());

        AppSessionCoordinator {
            snapshots: self.snapshots,
            preferences: self.preferences,
            refresher: self.refresher,
            dispatcher: self.dispatcher,
            permissions: self.permissions,
            notices: self.notices,
            validator: self.validator,
            config: self.config,
            catalog_empty,
            subscription,
        }
    }
}

impl Drop for AppSessionCoordinator {
    fn drop(&mut self) {
        self.snapshots.unsubscribe(self.subscription);
    }
}

impl AppSessionCoordinator {
    /// Starts a builder with the four required collaborators. Permissions
    /// default to granted, notices to the log, validation to the default rules.
    pub fn builder(
        snapshots: Arc<SnapshotPublisher>,
        preferences: Arc<dyn PreferenceStore>,
        refresher: Arc<dyn CatalogRefresher>,
        dispatcher: Arc<dyn DispatchTarget>,
    ) -> CoordinatorBuilder {
        CoordinatorBuilder {
            snapshots,
            preferences,
            refresher,
            dispatcher,
            permissions: Arc::new(StaticPermissions(true)),
            notices: Arc::new(LogNoticeSink),
            validator: Arc::new(DefaultCredentialValidator),
            config: AppListConfig::default(),
        }
    }

    pub fn snapshot(&self) -> Arc<AppsSnapshot> {
        self.snapshots.latest()
    }

    /// Whether the "pull down to refresh" prompt should be visible.
    pub fn catalog_is_empty(&self) -> bool {
        self.catalog_empty.get()
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Selection
    // ─────────────────────────────────────────────────────────────────────────────

    /// Decides what selecting `app` means right now and dispatches the
    /// resulting command, if any.
    ///
    /// `RestartSession` and `LaunchWithKnownTransport` are dispatched before
    /// returning. `RequireCredentials` is left to the caller
    /// ([`Self::begin_credentials`]). A preference store failure aborts the
    /// selection with nothing dispatched.
    pub fn select_app(&self, app: &App) -> Result<SelectionDecision> {
        let snapshot = self.snapshots.latest();
        let permissions_granted = self.permissions.permissions_granted();

        let decision =
            resolve_selection_with(app, &snapshot.sessions, permissions_granted, || {
                self.preferences.get(&app.name)
            })
            .inspect_err(|err| {
                tracing::error!(app = %app.name, error = %err, "Selection abandoned");
            })?;

        tracing::debug!(
            app = %app.name,
            snapshot = snapshot.version,
            reason = %decision.reason,
            "Resolved app selection"
        );

        match &decision.action {
            SelectionAction::PermissionsRequired => {
                self.notices.notify(Notice::PermissionsRequired);
            }
            SelectionAction::RestartSession { session } => {
                self.send(DispatchCommand::restart_session(session.to_ref()));
            }
            SelectionAction::RejectDuplicate => {
                self.notices.notify(Notice::SingleSessionSupported);
            }
            SelectionAction::LaunchWithKnownTransport { app, transport } => {
                self.send(DispatchCommand::start_app(app.to_ref(), transport.as_str()));
            }
            SelectionAction::RequireCredentials { .. } | SelectionAction::Handled => {}
        }

        Ok(decision)
    }

    /// List-row entry point; separators are a no-op.
    pub fn select_item(&self, item: &AppsListItem) -> Result<SelectionDecision> {
        match item {
            AppsListItem::Separator { category } => Ok(SelectionDecision {
                action: SelectionAction::Handled,
                reason: format!("Separator row '{}'", category),
            }),
            AppsListItem::AppEntry { app } => self.select_app(app),
        }
    }

    /// Looks the app up by name in the current catalog, then selects it.
    pub fn select_by_name(&self, name: &str) -> Result<SelectionDecision> {
        let snapshot = self.snapshots.latest();
        let app = snapshot
            .find_app(name)
            .ok_or_else(|| AppListError::AppNotFound(name.to_string()))?;
        self.select_app(app)
    }

    /// Context menu on a list row. Separators are handled without navigation
    /// or dispatch; `StopApp` dispatches a stop command.
    pub fn context_action(&self, item: &AppsListItem, action: MenuAction) -> ContextOutcome {
        let outcome = resolve_context_action(item.clone(), action);
        if let ContextOutcome::StopApp { app } = &outcome {
            self.send(DispatchCommand::stop_app(app.to_ref()));
        }
        outcome
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Refresh
    // ─────────────────────────────────────────────────────────────────────────────

    /// Starts a catalog refresh and blocks until the refresher is no longer
    /// active, polling at the configured interval.
    ///
    /// Success and failure are not distinguished here beyond the returned
    /// status. If a refresh is already running this waits on that one.
    pub fn refresh_catalog(&self) -> RefreshOutcome {
        self.refresher.refresh();
        let waited = wait_while_active(
            self.refresher.as_ref(),
            self.config.refresh_poll_interval(),
            self.config.refresh_timeout(),
        );

        let snapshot = self.snapshots.latest();
        let catalog_empty = snapshot.catalog_is_empty();
        self.catalog_empty.observe(&snapshot);

        tracing::info!(
            status = ?waited.status,
            polls = waited.polls,
            timed_out = waited.timed_out,
            apps = snapshot.apps.len(),
            "Catalog refresh finished"
        );

        RefreshOutcome {
            status: waited.status,
            catalog_empty,
            timed_out: waited.timed_out,
            snapshot_version: snapshot.version,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Credentials
    // ─────────────────────────────────────────────────────────────────────────────

    /// Opens a credential collection for `app`.
    ///
    /// Returns `None`, after emitting the matching notice, when a new launch
    /// is not allowed: permissions are missing or any session is active.
    /// Also the way to change an app's stored transport: a successful submit
    /// overwrites it.
    pub fn begin_credentials(&self, app: App) -> Option<CredentialPrompt> {
        if let Some(notice) = self.launch_blocker(&app) {
            self.notices.notify(notice);
            return None;
        }
        tracing::debug!(app = %app.name, "Opened credential prompt");
        Some(CredentialPrompt::open(app))
    }

    /// Dismisses a prompt without side effects.
    pub fn cancel_credentials(&self, prompt: CredentialPrompt) {
        tracing::debug!(app = %prompt.app().name, "Credential prompt dismissed");
    }

    /// Validates the form; on success stores the transport, closes the
    /// prompt and dispatches a launch carrying the credentials.
    ///
    /// The launch conditions are checked again first: if permissions were
    /// revoked or a session became active since the prompt opened, the prompt
    /// is closed with nothing stored or dispatched.
    pub fn submit_credentials(
        &self,
        prompt: CredentialPrompt,
        form: CredentialForm,
    ) -> Result<SubmitOutcome> {
        if let Some(notice) = self.launch_blocker(prompt.app()) {
            self.notices.notify(notice);
            return Ok(SubmitOutcome::Refused {
                app: prompt.into_app(),
                notice,
            });
        }

        if let Err(error) = check_credentials(
            self.validator.as_ref(),
            &form.login,
            &form.password,
            &form.secondary_password,
        ) {
            tracing::debug!(app = %prompt.app().name, error = %error, "Credentials rejected");
            self.notices.notify(error.notice());
            return Ok(SubmitOutcome::Rejected { prompt, error });
        }

        let app = prompt.into_app();
        self.preferences
            .set(&app.name, form.transport)
            .inspect_err(|err| {
                tracing::error!(app = %app.name, error = %err, "Could not store transport");
            })?;

        // Launch with what the store now holds, as later launches will. The
        // write already succeeded, so a failed read-back still launches.
        let transport = match self.preferences.get(&app.name) {
            Ok(stored) => stored.transport().unwrap_or(form.transport),
            Err(err) => {
                tracing::warn!(app = %app.name, error = %err, "Could not read back stored transport");
                form.transport
            }
        };

        self.send(DispatchCommand::start_app_with_credentials(
            app.to_ref(),
            transport.as_str(),
            form.login,
            form.password,
            form.secondary_password,
        ));

        Ok(SubmitOutcome::Launched { app, transport })
    }

    /// Explicitly re-selects the transport for an app.
    pub fn change_transport(&self, app_name: &str, transport: TransportType) -> Result<()> {
        self.preferences.set(app_name, transport)?;
        tracing::info!(app = %app_name, transport = %transport, "Transport preference changed");
        Ok(())
    }

    /// Why a new launch of `app` is not allowed right now, if anything
    /// blocks it. Same precedence as selection, with the preference ignored.
    fn launch_blocker(&self, app: &App) -> Option<Notice> {
        let snapshot = self.snapshots.latest();
        let permissions_granted = self.permissions.permissions_granted();
        let decision = match resolve_selection_with::<Infallible>(
            app,
            &snapshot.sessions,
            permissions_granted,
            || Ok(TransportPreference::Unset),
        ) {
            Ok(decision) => decision,
            Err(never) => match never {},
        };

        let notice = match decision.action {
            SelectionAction::RequireCredentials { .. } => return None,
            SelectionAction::PermissionsRequired => Notice::PermissionsRequired,
            _ => Notice::SingleSessionSupported,
        };
        tracing::debug!(app = %app.name, reason = %decision.reason, "Launch not allowed");
        Some(notice)
    }

    fn send(&self, command: DispatchCommand) {
        tracing::info!(
            kind = command.kind.as_str(),
            app = command.app.as_ref().map(|a| a.name.as_str()),
            session = command.session.as_ref().map(|s| s.name.as_str()),
            "Dispatching command"
        );
        self.dispatcher.dispatch(command);
    }
}
