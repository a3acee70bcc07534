//! Permission checks and user-facing notices, abstracted from any UI toolkit.

use crate::types::Notice;

pub trait PermissionGate: Send + Sync {
    fn permissions_granted(&self) -> bool;
}

/// Fixed answer, for clients that check permissions before building the coordinator.
#[derive(Debug, Clone, Copy)]
pub struct StaticPermissions(pub bool);

impl PermissionGate for StaticPermissions {
    fn permissions_granted(&self) -> bool {
        self.0
    }
}

pub trait NoticeSink: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Logs notices; the default when a client shows nothing itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNoticeSink;

impl NoticeSink for LogNoticeSink {
    fn notify(&self, notice: Notice) {
        tracing::info!(notice = ?notice, message = notice_text(notice), "User notice");
    }
}

/// Default English text for a notice.
#[uniffi::export]
pub fn notice_message(notice: Notice) -> String {
    notice_text(notice).to_string()
}

pub fn notice_text(notice: Notice) -> &'static str {
    match notice {
        Notice::PermissionsRequired => "Required permissions have not been granted.",
        Notice::SingleSessionSupported => "Only one session can run at a time.",
        Notice::EmptyField => "All fields are required.",
        Notice::PasswordTooLong => "The VNC password must be 8 characters or fewer.",
        Notice::UsernameInvalid => "The username contains invalid characters.",
        Notice::PasswordInvalid => "The password contains invalid characters.",
        Notice::SecondaryPasswordInvalid => "The VNC password contains invalid characters.",
    }
}
