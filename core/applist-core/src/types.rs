//! Core types shared across all app list clients.
//!
//! These types are the "lingua franca" between the catalog, the session
//! backend and the UI layer. All clients use these exact same types.
//!
//! **FFI Support:** All types are annotated with UniFFI macros for Kotlin/Swift/Python bindings.

use applist_protocol::{AppRef, SessionRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ═══════════════════════════════════════════════════════════════════════════════
// Catalog Types
// ═══════════════════════════════════════════════════════════════════════════════

/// A launchable remote environment from the app catalog.
///
/// `name` is the identity; it is unique within one catalog snapshot.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, uniffi::Record)]
pub struct App {
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub filesystem_required: String,
    #[serde(default)]
    pub supports_cli: bool,
    #[serde(default)]
    pub supports_gui: bool,
    #[serde(default)]
    pub is_paid_app: bool,
    #[serde(default)]
    pub version: u32,
}

impl App {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            category: String::new(),
            filesystem_required: String::new(),
            supports_cli: true,
            supports_gui: true,
            is_paid_app: false,
            version: 0,
        }
    }

    pub fn to_ref(&self) -> AppRef {
        AppRef {
            name: self.name.clone(),
            category: (!self.category.is_empty()).then(|| self.category.clone()),
        }
    }
}

/// One row of the app list: either a category header or an app.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, uniffi::Enum)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppsListItem {
    Separator { category: String },
    AppEntry { app: App },
}

impl AppsListItem {
    pub fn app(&self) -> Option<&App> {
        match self {
            AppsListItem::Separator { .. } => None,
            AppsListItem::AppEntry { app } => Some(app),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Transport Types
// ═══════════════════════════════════════════════════════════════════════════════

/// Connection protocol used to reach a session.
#[derive(
    Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, uniffi::Enum,
)]
#[serde(rename_all = "lowercase")]
pub enum TransportType {
    Ssh,
    Vnc,
}

impl TransportType {
    /// Wire form used in dispatch commands and the preference file.
    pub fn as_str(self) -> &'static str {
        match self {
            TransportType::Ssh => "ssh",
            TransportType::Vnc => "vnc",
        }
    }
}

impl fmt::Display for TransportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransportType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ssh" => Ok(TransportType::Ssh),
            "vnc" => Ok(TransportType::Vnc),
            other => Err(format!("unknown transport: {}", other)),
        }
    }
}

/// Remembered transport choice for one app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, uniffi::Enum)]
pub enum TransportPreference {
    #[default]
    Unset,
    Set { transport: TransportType },
}

impl TransportPreference {
    pub fn transport(self) -> Option<TransportType> {
        match self {
            TransportPreference::Unset => None,
            TransportPreference::Set { transport } => Some(transport),
        }
    }
}

impl From<Option<TransportType>> for TransportPreference {
    fn from(value: Option<TransportType>) -> Self {
        match value {
            Some(transport) => TransportPreference::Set { transport },
            None => TransportPreference::Unset,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Session Types
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default, uniffi::Enum)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Running,
    Connecting,
    #[default]
    Stopped,
}

/// A live backend session, observed read-only.
///
/// `app_name` is a soft reference by name; the catalog may no longer
/// contain that app.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, uniffi::Record)]
pub struct Session {
    pub name: String,
    #[serde(default)]
    pub state: SessionState,
    #[serde(default)]
    pub transport: Option<TransportType>,
    #[serde(default)]
    pub app_name: Option<String>,
}

impl Session {
    pub fn is_active(&self) -> bool {
        matches!(self.state, SessionState::Running | SessionState::Connecting)
    }

    pub fn to_ref(&self) -> SessionRef {
        SessionRef {
            name: self.name.clone(),
            app_name: self.app_name.clone(),
            transport_type: self.transport.map(|t| t.as_str().to_string()),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Refresh Types
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default, uniffi::Enum)]
#[serde(rename_all = "snake_case")]
pub enum RefreshStatus {
    #[default]
    Idle,
    Active,
    Error,
}

/// What a completed `refresh_catalog` call observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Record)]
pub struct RefreshOutcome {
    /// Status the refresher settled on (never `Active` unless `timed_out`).
    pub status: RefreshStatus,
    /// Whether the "catalog is empty" prompt should be shown.
    pub catalog_empty: bool,
    pub timed_out: bool,
    /// Snapshot version the outcome was computed from.
    pub snapshot_version: u64,
}

// ═══════════════════════════════════════════════════════════════════════════════
// User-Facing Notices
// ═══════════════════════════════════════════════════════════════════════════════

/// Signals a client surfaces to the user (toast, dialog, banner).
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
#[serde(rename_all = "snake_case")]
pub enum Notice {
    PermissionsRequired,
    SingleSessionSupported,
    EmptyField,
    PasswordTooLong,
    UsernameInvalid,
    PasswordInvalid,
    SecondaryPasswordInvalid,
}
