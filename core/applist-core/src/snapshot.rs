//! Versioned (catalog, active sessions) snapshots and their publisher.
//!
//! The catalog and the session list are always handed out together. A
//! publish builds a fresh [`AppsSnapshot`] and swaps it in; nothing mutates a
//! snapshot after it is published. Readers clone one `Arc` per decision, so
//! a decision can never pair a catalog with a session list from a different
//! publication.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use chrono::{DateTime, Utc};

use crate::types::{App, Session};

#[derive(Debug, Clone, PartialEq)]
pub struct AppsSnapshot {
    /// Starts at 0 for the empty initial snapshot; +1 per publish.
    pub version: u64,
    pub published_at: DateTime<Utc>,
    pub apps: Vec<App>,
    /// Active sessions only.
    pub sessions: Vec<Session>,
}

impl AppsSnapshot {
    pub fn empty() -> Self {
        Self {
            version: 0,
            published_at: Utc::now(),
            apps: Vec::new(),
            sessions: Vec::new(),
        }
    }

    pub fn catalog_is_empty(&self) -> bool {
        self.apps.is_empty()
    }

    pub fn has_active_sessions(&self) -> bool {
        !self.sessions.is_empty()
    }

    pub fn find_app(&self, name: &str) -> Option<&App> {
        self.apps.iter().find(|app| app.name == name)
    }

    /// The active session whose name equals `app_name`, if any.
    pub fn session_for(&self, app_name: &str) -> Option<&Session> {
        self.sessions.iter().find(|session| session.name == app_name)
    }
}

pub type SubscriptionId = u64;

type Subscriber = Arc<dyn Fn(&Arc<AppsSnapshot>) + Send + Sync>;

/// Holds the latest snapshot and notifies subscribers on every publish.
///
/// Subscribers run on the publishing thread, in publish order. They must not
/// publish from inside the callback.
pub struct SnapshotPublisher {
    current: RwLock<Arc<AppsSnapshot>>,
    subscribers: Mutex<Vec<(SubscriptionId, Subscriber)>>,
    next_subscription: AtomicU64,
    publish_lock: Mutex<()>,
}

impl Default for SnapshotPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotPublisher {
    pub fn new() -> Self {
        Self {
            current: RwLock::new(Arc::new(AppsSnapshot::empty())),
            subscribers: Mutex::new(Vec::new()),
            next_subscription: AtomicU64::new(1),
            publish_lock: Mutex::new(()),
        }
    }

    pub fn latest(&self) -> Arc<AppsSnapshot> {
        // A poisoned lock still guards a complete Arc; nothing is half-written.
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Replaces both lists at once.
    pub fn publish(&self, apps: Vec<App>, sessions: Vec<Session>) -> Arc<AppsSnapshot> {
        let _guard = self
            .publish_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        self.swap_in(apps, sessions)
    }

    /// Replaces the catalog, keeping the current session list.
    pub fn publish_catalog(&self, apps: Vec<App>) -> Arc<AppsSnapshot> {
        let _guard = self
            .publish_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let sessions = self.latest().sessions.clone();
        self.swap_in(apps, sessions)
    }

    /// Replaces the session list, keeping the current catalog.
    pub fn publish_sessions(&self, sessions: Vec<Session>) -> Arc<AppsSnapshot> {
        let _guard = self
            .publish_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let apps = self.latest().apps.clone();
        self.swap_in(apps, sessions)
    }

    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&Arc<AppsSnapshot>) + Send + Sync + 'static,
    {
        let id = self.next_subscription.fetch_add(1, Ordering::Relaxed);
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(callback)));
        id
    }

    /// Returns false if the id was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let before = subscribers.len();
        subscribers.retain(|(existing, _)| *existing != id);
        subscribers.len() != before
    }

    // Caller holds publish_lock.
    fn swap_in(&self, apps: Vec<App>, sessions: Vec<Session>) -> Arc<AppsSnapshot> {
        let previous = self.latest();
        let snapshot = Arc::new(AppsSnapshot {
            version: previous.version + 1,
            published_at: Utc::now(),
            apps: dedupe_apps(apps),
            sessions: sessions.into_iter().filter(Session::is_active).collect(),
        });

        *self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Arc::clone(&snapshot);

        tracing::debug!(
            version = snapshot.version,
            apps = snapshot.apps.len(),
            active_sessions = snapshot.sessions.len(),
            "Published apps snapshot"
        );

        let subscribers: Vec<Subscriber> = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();
        for callback in subscribers {
            callback(&snapshot);
        }

        snapshot
    }
}

/// App names are identities; the first occurrence wins.
fn dedupe_apps(apps: Vec<App>) -> Vec<App> {
    let mut seen = HashSet::new();
    apps.into_iter()
        .filter(|app| {
            let fresh = seen.insert(app.name.clone());
            if !fresh {
                tracing::warn!(app = %app.name, "Dropping duplicate app name from catalog");
            }
            fresh
        })
        .collect()
}
