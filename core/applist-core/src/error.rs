//! Error types for applist-core operations.
//! Keep AppListFfiError minimal and stable to avoid breaking FFI clients.

use std::path::PathBuf;

// ═══════════════════════════════════════════════════════════════════════════════
// FFI-Compatible Error (for Kotlin/Swift/Python)
// ═══════════════════════════════════════════════════════════════════════════════

/// FFI-safe error type for use across language boundaries.
///
/// This simplified error type contains just an error message string,
/// making it compatible with UniFFI's error handling.
#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum AppListFfiError {
    #[error("{message}")]
    General { message: String },
}

impl From<String> for AppListFfiError {
    fn from(message: String) -> Self {
        AppListFfiError::General { message }
    }
}

impl From<&str> for AppListFfiError {
    fn from(message: &str) -> Self {
        AppListFfiError::General {
            message: message.to_string(),
        }
    }
}

impl From<AppListError> for AppListFfiError {
    fn from(err: AppListError) -> Self {
        AppListFfiError::General {
            message: err.to_string(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Internal Error (for Rust-only use)
// ═══════════════════════════════════════════════════════════════════════════════

/// All errors that can occur in applist-core operations.
///
/// Permission and single-session outcomes are not errors; they come back as
/// normal [`crate::SelectionAction`] variants. Credential failures are
/// [`crate::CredentialError`]. What remains here is fatal for the current
/// operation: nothing is dispatched and the caller decides what to show.
#[derive(Debug, thiserror::Error)]
pub enum AppListError {
    // ─────────────────────────────────────────────────────────────────────
    // Backing Store Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Backing store unavailable: {store}: {details}")]
    BackingStoreUnavailable { store: String, details: String },

    #[error("Preference file malformed: {path}: {details}")]
    PreferencesMalformed { path: PathBuf, details: String },

    // ─────────────────────────────────────────────────────────────────────
    // Catalog Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("App not found in catalog: {0}")]
    AppNotFound(String),

    #[error("Catalog source malformed: {path}: {details}")]
    CatalogMalformed { path: PathBuf, details: String },

    // ─────────────────────────────────────────────────────────────────────
    // I/O Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("I/O error: {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON parsing error: {context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

impl AppListError {
    pub fn store_unavailable(store: &str, details: impl Into<String>) -> Self {
        AppListError::BackingStoreUnavailable {
            store: store.to_string(),
            details: details.into(),
        }
    }

    /// True for errors that mean a backing store could not be reached or read.
    pub fn is_store_unavailable(&self) -> bool {
        matches!(
            self,
            AppListError::BackingStoreUnavailable { .. } | AppListError::PreferencesMalformed { .. }
        )
    }
}

/// Convenience type alias for Results using AppListError.
pub type Result<T> = std::result::Result<T, AppListError>;

// Conversion for string error compatibility
impl From<AppListError> for String {
    fn from(err: AppListError) -> String {
        err.to_string()
    }
}
