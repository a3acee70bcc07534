//! App selection resolution.
//!
//! This module contains the pure decision logic for a user picking an app (or
//! an app's context menu entry). Given the active sessions and the stored
//! transport preference, it determines the single action the client takes.
//! Executing the action (dispatching, prompting) is the coordinator's job.
//!
//! ## Resolution Order
//!
//! ```text
//! permissions missing?            ──► PermissionsRequired
//! active session named like app?  ──► RestartSession
//! any other session active?       ──► RejectDuplicate      (one session system-wide)
//! transport preference stored?    ──► LaunchWithKnownTransport
//! otherwise                       ──► RequireCredentials
//! ```
//!
//! Each step only runs when every earlier one did not apply. The preference
//! store is not consulted at all while a session is active.

use crate::types::{App, AppsListItem, Session, TransportPreference, TransportType};

// ═══════════════════════════════════════════════════════════════════════════════
// FFI Types
// ═══════════════════════════════════════════════════════════════════════════════

/// The one action to take for a selected app.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Enum)]
pub enum SelectionAction {
    /// System permissions are missing; nothing else was evaluated
    PermissionsRequired,

    /// The app already has a session; bring it back
    RestartSession { session: Session },

    /// Another app's session is active and only one is supported
    RejectDuplicate,

    /// Launch with the transport remembered for this app
    LaunchWithKnownTransport { app: App, transport: TransportType },

    /// No remembered transport; collect credentials first
    RequireCredentials { app: App },

    /// Row was not an app (separator); nothing to do
    Handled,
}

/// The resolved selection decision.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct SelectionDecision {
    pub action: SelectionAction,
    /// Debug context explaining why this decision was made
    pub reason: String,
}

/// Context menu entries available on an app row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum MenuAction {
    ShowDetails,
    StopApp,
}

/// What a context menu selection resolves to.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Enum)]
pub enum ContextOutcome {
    /// Row was a separator; no navigation, no dispatch
    Handled,
    /// Navigate to the app's detail screen
    ShowDetails { app: App },
    /// Stop the app's session
    StopApp { app: App },
}

// ═══════════════════════════════════════════════════════════════════════════════
// Resolution Logic
// ═══════════════════════════════════════════════════════════════════════════════

/// Resolves a selection, looking the preference up only if it is needed.
///
/// `active_sessions` must already be filtered to active ones (snapshots are).
/// Errors from `lookup_preference` are returned as-is.
pub fn resolve_selection_with<E>(
    app: &App,
    active_sessions: &[Session],
    permissions_granted: bool,
    lookup_preference: impl FnOnce() -> Result<TransportPreference, E>,
) -> Result<SelectionDecision, E> {
    if !permissions_granted {
        return Ok(SelectionDecision {
            action: SelectionAction::PermissionsRequired,
            reason: "Required permissions not granted".to_string(),
        });
    }

    if !active_sessions.is_empty() {
        if let Some(session) = active_sessions.iter().find(|s| s.name == app.name) {
            return Ok(SelectionDecision {
                action: SelectionAction::RestartSession {
                    session: session.clone(),
                },
                reason: format!("Found active session '{}'", session.name),
            });
        }

        let running = active_sessions
            .iter()
            .map(|s| s.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        return Ok(SelectionDecision {
            action: SelectionAction::RejectDuplicate,
            reason: format!(
                "Session(s) [{}] active and none belongs to '{}'",
                running, app.name
            ),
        });
    }

    let decision = match lookup_preference()? {
        TransportPreference::Set { transport } => SelectionDecision {
            action: SelectionAction::LaunchWithKnownTransport {
                app: app.clone(),
                transport,
            },
            reason: format!("No active session; '{}' prefers {}", app.name, transport),
        },
        TransportPreference::Unset => SelectionDecision {
            action: SelectionAction::RequireCredentials { app: app.clone() },
            reason: format!("No active session and no transport stored for '{}'", app.name),
        },
    };
    Ok(decision)
}

/// Pure resolver for FFI clients that already hold the preference.
///
/// Inactive sessions in `sessions` are ignored.
#[uniffi::export]
pub fn resolve_selection(
    app: App,
    sessions: Vec<Session>,
    preference: TransportPreference,
    permissions_granted: bool,
) -> SelectionDecision {
    let active: Vec<Session> = sessions.into_iter().filter(Session::is_active).collect();
    match resolve_selection_with::<std::convert::Infallible>(
        &app,
        &active,
        permissions_granted,
        || Ok(preference),
    ) {
        Ok(decision) => decision,
        Err(never) => match never {},
    }
}

/// Maps a context menu choice on a row to its outcome.
#[uniffi::export]
pub fn resolve_context_action(item: AppsListItem, action: MenuAction) -> ContextOutcome {
    match item {
        AppsListItem::Separator { .. } => ContextOutcome::Handled,
        AppsListItem::AppEntry { app } => match action {
            MenuAction::ShowDetails => ContextOutcome::ShowDetails { app },
            MenuAction::StopApp => ContextOutcome::StopApp { app },
        },
    }
}
