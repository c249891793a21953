//! Email configuration loaded from the process environment
//!
//! Two layers: [`EnvConfig`] is the raw snapshot of the four environment
//! variables taken once at startup and may be incomplete; [`EmailConfig`] is
//! the fully-resolved form a send actually runs with. The split preserves the
//! deliberate fail-fast/fail-soft policy: a present-but-unparseable SMTP_PORT
//! aborts the process at boot, while a missing variable stays a soft,
//! per-call configuration error reported through the tool result.

use thiserror::Error;

/// Environment variable holding the sender address.
pub const ENV_SENDER_EMAIL: &str = "SENDER_EMAIL";
/// Environment variable holding the sender credential (app password).
pub const ENV_SENDER_APP_PASSWORD: &str = "SENDER_APP_PASSWORD";
/// Environment variable holding the SMTP relay hostname.
pub const ENV_SMTP_SERVER: &str = "SMTP_SERVER";
/// Environment variable holding the SMTP relay port.
pub const ENV_SMTP_PORT: &str = "SMTP_PORT";

/// Startup-time configuration error. Only an unparseable port is fatal;
/// missing variables are handled per call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("SMTP_PORT '{value}' is not a valid port number (expected an integer in 1-65535)")]
    InvalidPort { value: String },
}

/// Raw, possibly incomplete snapshot of the mail environment.
///
/// Empty-string values count as unset. Immutable for the process lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvConfig {
    pub sender_email: Option<String>,
    pub sender_app_password: Option<String>,
    pub smtp_server: Option<String>,
    pub smtp_port: Option<u16>,
}

/// Fully-resolved mail configuration. Exists only when all four variables
/// are present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailConfig {
    pub sender: String,
    pub password: String,
    pub host: String,
    pub port: u16,
}

impl EnvConfig {
    /// Snapshot the four variables from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a snapshot from an arbitrary lookup function.
    ///
    /// This is the injection point that keeps configuration deterministic in
    /// tests: multiple configurations can coexist in one process without
    /// touching ambient global state.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.is_empty());

        let smtp_port = match get(ENV_SMTP_PORT) {
            Some(raw) => match parse_port(&raw) {
                Some(port) => Some(port),
                None => return Err(ConfigError::InvalidPort { value: raw }),
            },
            None => None,
        };

        Ok(Self {
            sender_email: get(ENV_SENDER_EMAIL),
            sender_app_password: get(ENV_SENDER_APP_PASSWORD),
            smtp_server: get(ENV_SMTP_SERVER),
            smtp_port,
        })
    }

    /// Names of the unset variables, in the fixed reporting order.
    pub fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.sender_email.is_none() {
            missing.push(ENV_SENDER_EMAIL);
        }
        if self.sender_app_password.is_none() {
            missing.push(ENV_SENDER_APP_PASSWORD);
        }
        if self.smtp_server.is_none() {
            missing.push(ENV_SMTP_SERVER);
        }
        if self.smtp_port.is_none() {
            missing.push(ENV_SMTP_PORT);
        }
        missing
    }

    /// Resolve into an [`EmailConfig`], or report which variables are unset.
    ///
    /// Deterministic and side-effect-free: no network activity happens here
    /// or anywhere before this succeeds.
    pub fn resolve(&self) -> Result<EmailConfig, Vec<&'static str>> {
        match (
            &self.sender_email,
            &self.sender_app_password,
            &self.smtp_server,
            self.smtp_port,
        ) {
            (Some(sender), Some(password), Some(host), Some(port)) => Ok(EmailConfig {
                sender: sender.clone(),
                password: password.clone(),
                host: host.clone(),
                port,
            }),
            _ => Err(self.missing()),
        }
    }
}

/// Parse a port string. `None` for anything that is not an integer in
/// 1..=65535; port 0 is not a reachable relay.
pub fn parse_port(raw: &str) -> Option<u16> {
    raw.trim().parse::<u16>().ok().filter(|port| *port > 0)
}
