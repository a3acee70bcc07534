//! Credential collection for apps without a stored transport.
//!
//! A [`CredentialPrompt`] stands for one open collection surface tied to one
//! user action. Submitting a form that fails validation hands the prompt back
//! so the user can correct it; nothing is persisted until every check passes.

use std::fmt;

use crate::types::{App, Notice, TransportType};
use crate::validation::{CredentialValidator, DefaultCredentialValidator};

/// Longest display/control (VNC) password accepted, in characters.
pub const SECONDARY_PASSWORD_MAX_CHARS: usize = 8;

/// What the user typed into the credential surface.
#[derive(Clone, PartialEq, Eq, uniffi::Record)]
pub struct CredentialForm {
    pub login: String,
    pub password: String,
    /// Display/control password (VNC).
    pub secondary_password: String,
    pub transport: TransportType,
}

impl fmt::Debug for CredentialForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialForm")
            .field("login", &self.login)
            .field("password", &"<redacted>")
            .field("secondary_password", &"<redacted>")
            .field("transport", &self.transport)
            .finish()
    }
}

/// First failing credential check. Variants are listed in check order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error, uniffi::Enum)]
pub enum CredentialError {
    #[error("all credential fields are required")]
    EmptyField,
    #[error("secondary password exceeds 8 characters")]
    PasswordTooLong,
    #[error("username is invalid")]
    UsernameInvalid,
    #[error("password is invalid")]
    PasswordInvalid,
    #[error("secondary password is invalid")]
    SecondaryPasswordInvalid,
}

impl CredentialError {
    pub fn notice(self) -> Notice {
        match self {
            CredentialError::EmptyField => Notice::EmptyField,
            CredentialError::PasswordTooLong => Notice::PasswordTooLong,
            CredentialError::UsernameInvalid => Notice::UsernameInvalid,
            CredentialError::PasswordInvalid => Notice::PasswordInvalid,
            CredentialError::SecondaryPasswordInvalid => Notice::SecondaryPasswordInvalid,
        }
    }
}

/// Runs the credential checks in their fixed order; the first failure wins.
pub fn check_credentials(
    validator: &dyn CredentialValidator,
    login: &str,
    password: &str,
    secondary_password: &str,
) -> Result<(), CredentialError> {
    if login.is_empty() || password.is_empty() || secondary_password.is_empty() {
        return Err(CredentialError::EmptyField);
    }
    if secondary_password.chars().count() > SECONDARY_PASSWORD_MAX_CHARS {
        return Err(CredentialError::PasswordTooLong);
    }
    if !validator.is_username_valid(login) {
        return Err(CredentialError::UsernameInvalid);
    }
    if !validator.is_password_valid(password) {
        return Err(CredentialError::PasswordInvalid);
    }
    if !validator.is_password_valid(secondary_password) {
        return Err(CredentialError::SecondaryPasswordInvalid);
    }
    Ok(())
}

/// Checks a form with the default validator. `None` means the form is acceptable.
#[uniffi::export]
pub fn validate_credentials(form: CredentialForm) -> Option<CredentialError> {
    check_credentials(
        &DefaultCredentialValidator,
        &form.login,
        &form.password,
        &form.secondary_password,
    )
    .err()
}

/// One open credential collection for one app.
///
/// Obtained from [`crate::AppSessionCoordinator::begin_credentials`] and
/// consumed by submitting or cancelling it.
#[derive(Debug)]
#[must_use = "an open prompt should be submitted or cancelled"]
pub struct CredentialPrompt {
    app: App,
}

impl CredentialPrompt {
    pub(crate) fn open(app: App) -> Self {
        Self { app }
    }

    pub fn app(&self) -> &App {
        &self.app
    }

    pub(crate) fn into_app(self) -> App {
        self.app
    }
}

/// Result of submitting a credential form.
#[derive(Debug)]
pub enum SubmitOutcome {
    /// Validation failed; the prompt stays open for another attempt.
    Rejected {
        prompt: CredentialPrompt,
        error: CredentialError,
    },
    /// Preference stored, prompt closed, launch dispatched.
    Launched { app: App, transport: TransportType },
    /// A launch is not allowed any more (permissions revoked, or a session
    /// became active); the prompt is closed and nothing was stored.
    Refused { app: App, notice: Notice },
}
