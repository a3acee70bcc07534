//! Outbound command delivery to the session backend.
//!
//! Delivery is fire-and-forget: the coordinator hands a command over and keeps
//! no further responsibility for it. Failures are logged, never retried.

use std::io::Write;
use std::sync::{Mutex, PoisonError};

use applist_protocol::DispatchCommand;

pub trait DispatchTarget: Send + Sync {
    fn dispatch(&self, command: DispatchCommand);
}

/// Writes each command as one JSON line to a writer (stdout, a pipe, a file).
pub struct LineDispatcher<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> LineDispatcher<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W: Write + Send> DispatchTarget for LineDispatcher<W> {
    fn dispatch(&self, command: DispatchCommand) {
        let line = match command.to_line() {
            Ok(line) => line,
            Err(err) => {
                tracing::error!(error = %err, kind = command.kind.as_str(), "Refusing to send invalid command");
                return;
            }
        };
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let written = writer.write_all(line.as_bytes());
        if let Err(err) = written.and_then(|_| writer.flush()) {
            tracing::warn!(error = %err, kind = command.kind.as_str(), "Failed to write command");
        }
    }
}

#[cfg(unix)]
pub use socket::SocketDispatcher;

#[cfg(unix)]
mod socket {
    use super::*;
    use std::os::unix::net::UnixStream;
    use std::path::PathBuf;
    use std::time::Duration;

    const WRITE_TIMEOUT_MS: u64 = 500;

    /// Sends each command over a fresh connection to the backend's unix socket.
    pub struct SocketDispatcher {
        path: PathBuf,
    }

    impl SocketDispatcher {
        pub fn new(path: PathBuf) -> Self {
            Self { path }
        }

        fn send(&self, line: &str) -> std::io::Result<()> {
            let mut stream = UnixStream::connect(&self.path)?;
            stream.set_write_timeout(Some(Duration::from_millis(WRITE_TIMEOUT_MS)))?;
            stream.write_all(line.as_bytes())?;
            stream.flush()
        }
    }

    impl DispatchTarget for SocketDispatcher {
        fn dispatch(&self, command: DispatchCommand) {
            let line = match command.to_line() {
                Ok(line) => line,
                Err(err) => {
                    tracing::error!(error = %err, kind = command.kind.as_str(), "Refusing to send invalid command");
                    return;
                }
            };
            match self.send(&line) {
                Ok(()) => {
                    tracing::debug!(path = %self.path.display(), kind = command.kind.as_str(), "Command delivered")
                }
                Err(err) => tracing::warn!(
                    path = %self.path.display(),
                    kind = command.kind.as_str(),
                    error = %err,
                    "Failed to deliver command to backend"
                ),
            }
        }
    }
}
