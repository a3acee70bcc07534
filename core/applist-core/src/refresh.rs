//! Blocking wait for a catalog refresh to settle.
//!
//! Refreshers expose a status flag only, so completion is observed by polling
//! at a fixed interval. The wait never returns while the status is `Active`
//! unless an explicit timeout was configured.

use std::thread;
use std::time::{Duration, Instant};

use crate::catalog::CatalogRefresher;
use crate::types::RefreshStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitResult {
    pub status: RefreshStatus,
    pub timed_out: bool,
    pub polls: u32,
}

/// Blocks the calling thread until `refresher.status()` is no longer `Active`.
pub fn wait_while_active(
    refresher: &dyn CatalogRefresher,
    interval: Duration,
    timeout: Option<Duration>,
) -> WaitResult {
    let deadline = timeout.map(|t| Instant::now() + t);
    let mut polls = 0u32;

    loop {
        let status = refresher.status();
        polls = polls.saturating_add(1);
        if status != RefreshStatus::Active {
            return WaitResult {
                status,
                timed_out: false,
                polls,
            };
        }

        let mut nap = interval;
        if let Some(deadline) = deadline {
            let now = Instant::now();
            if now >= deadline {
                tracing::warn!(polls, "Gave up waiting for catalog refresh");
                return WaitResult {
                    status,
                    timed_out: true,
                    polls,
                };
            }
            nap = nap.min(deadline - now);
        }
        thread::sleep(nap);
    }
}
