//! Shape checks for login names and passwords.
//!
//! The credential flow only depends on the pass/fail contract of
//! [`CredentialValidator`]; clients with stricter rules inject their own.

use once_cell::sync::Lazy;
use regex::Regex;

/// Login names as accepted by `useradd` on the target distributions.
pub static RE_USERNAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z_][a-z0-9_-]{0,31}$").unwrap());

/// Printable ASCII without whitespace.
pub static RE_PASSWORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[!-~]+$").unwrap());

pub trait CredentialValidator: Send + Sync {
    fn is_username_valid(&self, username: &str) -> bool;
    fn is_password_valid(&self, password: &str) -> bool;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultCredentialValidator;

impl CredentialValidator for DefaultCredentialValidator {
    fn is_username_valid(&self, username: &str) -> bool {
        RE_USERNAME.is_match(username)
    }

    fn is_password_valid(&self, password: &str) -> bool {
        RE_PASSWORD.is_match(password)
    }
}

#[uniffi::export]
pub fn is_username_valid(username: &str) -> bool {
    DefaultCredentialValidator.is_username_valid(username)
}

#[uniffi::export]
pub fn is_password_valid(password: &str) -> bool {
    DefaultCredentialValidator.is_password_valid(password)
}
