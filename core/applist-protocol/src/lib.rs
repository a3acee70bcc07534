//! Dispatch command types shared by the app list core and the session backend.
//!
//! This crate is shared by the producer and any receiver to prevent schema drift.
//! The backend remains the authority on what it does with a command, but both
//! sides reuse the same types and the same per-kind field rules.
//!
//! Commands travel as one JSON object per line. Fields that do not apply to a
//! command kind are omitted from the payload, never sent as empty strings.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const PROTOCOL_VERSION: u32 = 1;
pub const MAX_COMMAND_BYTES: usize = 64 * 1024; // 64KB

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    RestartSession,
    StartApp,
    StopApp,
}

impl CommandKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RestartSession => "restart_session",
            Self::StartApp => "start_app",
            Self::StopApp => "stop_app",
        }
    }
}

/// Reference to a running session, by name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct SessionRef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transport_type: Option<String>,
}

/// Reference to a catalog app, by name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct AppRef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    pub code: String,
    pub message: String,
}

impl ErrorInfo {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ErrorInfo {}

/// A single command for the session backend.
///
/// Build with [`DispatchCommand::restart_session`], [`DispatchCommand::start_app`],
/// [`DispatchCommand::start_app_with_credentials`] or [`DispatchCommand::stop_app`]
/// so the per-kind field rules hold by construction.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DispatchCommand {
    pub protocol_version: u32,
    pub kind: CommandKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<SessionRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app: Option<AppRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transport_type: Option<String>,
}

impl DispatchCommand {
    fn empty(kind: CommandKind) -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION,
            kind,
            session: None,
            app: None,
            login: None,
            password: None,
            secondary_password: None,
            transport_type: None,
        }
    }

    pub fn restart_session(session: SessionRef) -> Self {
        Self {
            session: Some(session),
            ..Self::empty(CommandKind::RestartSession)
        }
    }

    pub fn start_app(app: AppRef, transport_type: impl Into<String>) -> Self {
        Self {
            app: Some(app),
            transport_type: Some(transport_type.into()),
            ..Self::empty(CommandKind::StartApp)
        }
    }

    pub fn start_app_with_credentials(
        app: AppRef,
        transport_type: impl Into<String>,
        login: impl Into<String>,
        password: impl Into<String>,
        secondary_password: impl Into<String>,
    ) -> Self {
        Self {
            login: Some(login.into()),
            password: Some(password.into()),
            secondary_password: Some(secondary_password.into()),
            ..Self::start_app(app, transport_type)
        }
    }

    pub fn stop_app(app: AppRef) -> Self {
        Self {
            app: Some(app),
            ..Self::empty(CommandKind::StopApp)
        }
    }

    pub fn has_credentials(&self) -> bool {
        self.login.is_some() || self.password.is_some() || self.secondary_password.is_some()
    }

    pub fn validate(&self) -> Result<(), ErrorInfo> {
        if self.protocol_version != PROTOCOL_VERSION {
            return Err(ErrorInfo::new(
                "protocol_mismatch",
                format!(
                    "protocol_version {} is not supported (expected {})",
                    self.protocol_version, PROTOCOL_VERSION
                ),
            ));
        }

        match self.kind {
            CommandKind::RestartSession => {
                let session = self
                    .session
                    .as_ref()
                    .ok_or_else(|| missing_field("session"))?;
                require_name(&session.name, "session.name")?;
                forbid(self.app.is_some(), "app", self.kind)?;
                forbid(self.has_credentials(), "credentials", self.kind)?;
                forbid(self.transport_type.is_some(), "transport_type", self.kind)?;
            }
            CommandKind::StartApp => {
                let app = self.app.as_ref().ok_or_else(|| missing_field("app"))?;
                require_name(&app.name, "app.name")?;
                require_transport(&self.transport_type)?;
                forbid(self.session.is_some(), "session", self.kind)?;
                if self.has_credentials() {
                    require_string(&self.login, "login")?;
                    require_string(&self.password, "password")?;
                    require_string(&self.secondary_password, "secondary_password")?;
                }
            }
            CommandKind::StopApp => {
                let app = self.app.as_ref().ok_or_else(|| missing_field("app"))?;
                require_name(&app.name, "app.name")?;
                forbid(self.session.is_some(), "session", self.kind)?;
                forbid(self.has_credentials(), "credentials", self.kind)?;
                forbid(self.transport_type.is_some(), "transport_type", self.kind)?;
            }
        }

        Ok(())
    }

    /// Serializes the command as a single newline-terminated JSON line.
    pub fn to_line(&self) -> Result<String, ErrorInfo> {
        self.validate()?;
        let mut line = serde_json::to_string(self).map_err(|err| {
            ErrorInfo::new("serialize_failed", format!("command encode failed: {}", err))
        })?;
        line.push('\n');
        Ok(line)
    }
}

// Secrets must never reach logs through `{:?}`.
impl fmt::Debug for DispatchCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchCommand")
            .field("protocol_version", &self.protocol_version)
            .field("kind", &self.kind)
            .field("session", &self.session)
            .field("app", &self.app)
            .field("login", &self.login)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field(
                "secondary_password",
                &self.secondary_password.as_ref().map(|_| "<redacted>"),
            )
            .field("transport_type", &self.transport_type)
            .finish()
    }
}

pub fn parse_command(line: &str) -> Result<DispatchCommand, ErrorInfo> {
    if line.len() > MAX_COMMAND_BYTES {
        return Err(ErrorInfo::new(
            "command_too_large",
            format!("command exceeds {} bytes", MAX_COMMAND_BYTES),
        ));
    }
    let command: DispatchCommand = serde_json::from_str(line.trim_end()).map_err(|err| {
        ErrorInfo::new(
            "invalid_command",
            format!("command payload is invalid JSON: {}", err),
        )
    })?;
    command.validate()?;
    Ok(command)
}

fn missing_field(field: &str) -> ErrorInfo {
    ErrorInfo::new("missing_field", format!("{} is required", field))
}

fn require_name(value: &str, field: &str) -> Result<(), ErrorInfo> {
    if value.trim().is_empty() {
        return Err(missing_field(field));
    }
    Ok(())
}

fn require_string(value: &Option<String>, field: &str) -> Result<(), ErrorInfo> {
    if let Some(candidate) = value {
        if !candidate.is_empty() {
            return Ok(());
        }
    }
    Err(missing_field(field))
}

fn require_transport(value: &Option<String>) -> Result<(), ErrorInfo> {
    match value.as_deref() {
        Some("ssh") | Some("vnc") => Ok(()),
        Some(other) => Err(ErrorInfo::new(
            "invalid_transport",
            format!("transport_type must be ssh or vnc, got {:?}", other),
        )),
        None => Err(missing_field("transport_type")),
    }
}

fn forbid(present: bool, field: &str, kind: CommandKind) -> Result<(), ErrorInfo> {
    if present {
        return Err(ErrorInfo::new(
            "unexpected_field",
            format!("{} is not allowed for {}", field, kind.as_str()),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app(name: &str) -> AppRef {
        AppRef {
            name: name.to_string(),
            category: None,
        }
    }

    #[test]
    fn start_app_omits_absent_fields() {
        let command = DispatchCommand::start_app(app("debian"), "ssh");
        let value = serde_json::to_value(&command).expect("encode");
        let object = value.as_object().expect("object");

        assert_eq!(object["kind"], "start_app");
        assert_eq!(object["transport_type"], "ssh");
        assert!(!object.contains_key("session"));
        assert!(!object.contains_key("login"));
        assert!(!object.contains_key("password"));
        assert!(!object.contains_key("secondary_password"));
    }

    #[test]
    fn validates_each_constructor() {
        let session = SessionRef {
            name: "debian".to_string(),
            app_name: Some("debian".to_string()),
            transport_type: Some("vnc".to_string()),
        };
        assert!(DispatchCommand::restart_session(session).validate().is_ok());
        assert!(DispatchCommand::start_app(app("debian"), "vnc")
            .validate()
            .is_ok());
        assert!(DispatchCommand::start_app_with_credentials(
            app("debian"),
            "vnc",
            "user1",
            "Passw0rd",
            "Pass1"
        )
        .validate()
        .is_ok());
        assert!(DispatchCommand::stop_app(app("debian")).validate().is_ok());
    }

    #[test]
    fn rejects_partial_credentials() {
        let mut command = DispatchCommand::start_app(app("debian"), "ssh");
        command.login = Some("user1".to_string());
        let err = command.validate().expect_err("partial credentials");
        assert_eq!(err.code, "missing_field");
    }

    #[test]
    fn rejects_unknown_transport() {
        let command = DispatchCommand::start_app(app("debian"), "rdp");
        let err = command.validate().expect_err("bad transport");
        assert_eq!(err.code, "invalid_transport");
    }

    #[test]
    fn rejects_transport_on_stop() {
        let mut command = DispatchCommand::stop_app(app("debian"));
        command.transport_type = Some("ssh".to_string());
        let err = command.validate().expect_err("stop with transport");
        assert_eq!(err.code, "unexpected_field");
    }

    #[test]
    fn parse_command_reads_a_line() {
        let line = DispatchCommand::stop_app(app("alpine"))
            .to_line()
            .expect("encode");
        assert!(line.ends_with('\n'));

        let parsed = parse_command(&line).expect("parse");
        assert_eq!(parsed.kind, CommandKind::StopApp);
        assert_eq!(parsed.app.map(|a| a.name), Some("alpine".to_string()));
    }

    #[test]
    fn parse_command_rejects_unknown_fields() {
        let line = r#"{"protocol_version":1,"kind":"stop_app","app":{"name":"x"},"extra":true}"#;
        let err = parse_command(line).expect_err("unknown field");
        assert_eq!(err.code, "invalid_command");
    }

    #[test]
    fn debug_redacts_passwords() {
        let command = DispatchCommand::start_app_with_credentials(
            app("debian"),
            "ssh",
            "user1",
            "Passw0rd",
            "Pass1",
        );
        let rendered = format!("{:?}", command);
        assert!(!rendered.contains("Passw0rd"));
        assert!(!rendered.contains("Pass1"));
        assert!(rendered.contains("user1"));
    }
}
