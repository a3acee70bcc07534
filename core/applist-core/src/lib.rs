//! # applist-core
//!
//! Core library for the app list, providing the app/session coordination
//! shared by all clients (CLI, desktop shells, mobile wrappers).
//!
//! ## Design Principles
//!
//! - **Synchronous**: No async runtime dependency. Clients can wrap with async if needed.
//! - **One snapshot per decision**: Catalog and sessions are read together, never mixed.
//! - **Pure decisions, thin execution**: Resolvers are plain functions; the
//!   coordinator only executes what they decide.
//! - **FFI-ready**: UniFFI annotations on the pure types and resolvers enable
//!   Swift, Kotlin, Python bindings.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use applist_core::{AppSessionCoordinator, JsonPreferenceStore, StorageConfig};
//!
//! let storage = StorageConfig::default();
//! let preferences = Arc::new(JsonPreferenceStore::new(&storage.preferences_file()));
//! let coordinator = AppSessionCoordinator::builder(snapshots, preferences, refresher, dispatcher).build();
//! let decision = coordinator.select_by_name("debian")?;
//! ```

// UniFFI scaffolding for Swift/Kotlin/Python bindings
uniffi::setup_scaffolding!();

// Public modules
pub mod catalog;
pub mod config;
pub mod coordinator;
pub mod credentials;
pub mod dispatch;
pub mod error;
pub mod preferences;
pub mod refresh;
pub mod selection;
pub mod signals;
pub mod snapshot;
pub mod storage;
pub mod types;
pub mod validation;

#[cfg(test)]
mod testing;

// Re-export commonly used items at crate root
pub use catalog::{
    build_list_items, list_items_from_file, read_catalog_file, read_sessions_file,
    write_catalog_file, CatalogRefresher, FileCatalogRefresher, UNCATEGORIZED,
};
pub use config::*;
pub use coordinator::{AppSessionCoordinator, CoordinatorBuilder};
pub use credentials::*;
pub use dispatch::{DispatchTarget, LineDispatcher};
#[cfg(unix)]
pub use dispatch::SocketDispatcher;
pub use error::{AppListError, AppListFfiError, Result};
pub use preferences::{InMemoryPreferenceStore, JsonPreferenceStore, PreferenceStore};
pub use refresh::{wait_while_active, WaitResult};
pub use selection::*;
pub use signals::*;
pub use snapshot::{AppsSnapshot, SnapshotPublisher, SubscriptionId};
pub use storage::*;
pub use types::*;
pub use validation::*;
