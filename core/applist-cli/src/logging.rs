//! Logging setup for the `applist` binary.
//!
//! Everything goes to stderr (stdout carries dispatched commands) and to a
//! daily log file under the storage `logs/` directory.

use std::env;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

pub const DEBUG_ENV: &str = "APPLIST_DEBUG_LOG";

fn debug_enabled() -> bool {
    env::var(DEBUG_ENV)
        .map(|value| matches!(value.as_str(), "1" | "true" | "TRUE" | "yes" | "YES"))
        .unwrap_or(false)
}

fn filter() -> EnvFilter {
    if debug_enabled() {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

/// Installs the global subscriber. Keep the returned guard alive until exit
/// or buffered file output is lost. Returns `None` when the log directory
/// cannot be created; stderr logging still works then.
pub fn init(logs_dir: &Path) -> Option<WorkerGuard> {
    let stderr_layer = fmt::layer().with_writer(std::io::stderr).with_target(false);

    let file = match fs_err::create_dir_all(logs_dir) {
        Ok(()) => {
            let appender = tracing_appender::rolling::daily(logs_dir, "applist.log");
            Some(tracing_appender::non_blocking(appender))
        }
        Err(err) => {
            eprintln!("applist: file logging disabled: {}", err);
            None
        }
    };

    match file {
        Some((writer, guard)) => {
            let _ = tracing_subscriber::registry()
                .with(filter())
                .with(stderr_layer)
                .with(fmt::layer().with_writer(writer).with_ansi(false))
                .try_init();
            Some(guard)
        }
        None => {
            let _ = tracing_subscriber::registry()
                .with(filter())
                .with(stderr_layer)
                .try_init();
            None
        }
    }
}
