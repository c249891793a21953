//! Email sending over authenticated STARTTLS SMTP
//!
//! One [`EmailSender::send`] call is one SMTP transaction: EHLO, STARTTLS,
//! EHLO again, AUTH, then the envelope. The connection is owned by the call
//! frame and released on every exit path; pooling is disabled in Cargo.toml.
//!
//! Every failure is converted into a [`SendOutcome`] here. Nothing escapes
//! this module as a fault: the caller (an LLM driving the tool) always gets
//! a descriptive string it can act on.

use std::fmt;

use lettre::message::Mailbox;
use lettre::transport::smtp::{self, authentication::Credentials};
use lettre::{Message, SmtpTransport, Transport};
use serde::Deserialize;
use thiserror::Error;

use crate::config::{EmailConfig, EnvConfig};

/// Arguments of one `send_email` tool call. Ephemeral, no validation beyond
/// being usable as plain-text MIME content.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailRequest {
    /// The email address of the recipient
    pub recipient_email: String,
    /// The subject of the email
    pub subject: String,
    /// The content/body of the email
    pub body: String,
}

/// Outcome of a send attempt.
///
/// Rendered into the user-visible status string exactly once, by the
/// `Display` impl. Classification stays testable independent of phrasing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    Sent { recipient: String, subject: String },
    Failed(SendFailure),
}

impl SendOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, SendOutcome::Sent { .. })
    }
}

impl fmt::Display for SendOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SendOutcome::Sent { recipient, subject } => write!(
                f,
                "Email successfully sent to {} with subject '{}'.",
                recipient, subject
            ),
            SendOutcome::Failed(failure) => failure.fmt(f),
        }
    }
}

/// Failure taxonomy for a send attempt, with the fixed phrasing each kind
/// must render to.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SendFailure {
    /// One or more required configuration variables are unset.
    #[error("Error: Email server not fully configured. Missing: {missing}. Please check your environment configuration.")]
    Config { missing: FieldList },

    /// The relay rejected the credentials during AUTH.
    #[error("Error: SMTP Authentication Failed. Check your SENDER_EMAIL or SENDER_APP_PASSWORD.")]
    Auth,

    /// The relay could not be reached, or the TLS handshake never completed.
    #[error("Error: Failed to connect to SMTP server {host} on port {port}.")]
    Connect { host: String, port: u16 },

    /// The session dropped mid-transaction.
    #[error("Error: SMTP server disconnected unexpectedly. Please try again.")]
    Disconnected,

    /// Any other SMTP-protocol-level failure.
    #[error("An SMTP error occurred: {0}")]
    Transport(String),

    /// Any non-transport failure, e.g. message construction.
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// Comma-separated list of environment variable names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldList(pub Vec<&'static str>);

impl fmt::Display for FieldList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(", "))
    }
}

/// Sends email through the configured SMTP relay.
///
/// Holds the possibly-incomplete environment snapshot; completeness is
/// checked per call so the tool can report exactly what is unset. Safe to
/// share across concurrent calls: the config is read-only and each send
/// builds its own message and transport.
pub struct EmailSender {
    config: EnvConfig,
}

impl EmailSender {
    pub fn new(config: EnvConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EnvConfig {
        &self.config
    }

    /// Send one email. Single attempt, synchronous, no retry.
    pub fn send(&self, recipient: &str, subject: &str, body: &str) -> SendOutcome {
        // Config check first: deterministic, side-effect-free, no network.
        let config = match self.config.resolve() {
            Ok(config) => config,
            Err(missing) => {
                return SendOutcome::Failed(SendFailure::Config {
                    missing: FieldList(missing),
                })
            }
        };

        tracing::info!(
            "sending email to {} via {}:{}",
            recipient,
            config.host,
            config.port
        );

        match submit(&config, recipient, subject, body) {
            Ok(()) => {
                tracing::info!("email delivered to {}", recipient);
                SendOutcome::Sent {
                    recipient: recipient.to_string(),
                    subject: subject.to_string(),
                }
            }
            Err(failure) => {
                tracing::warn!("email delivery failed: {}", failure);
                SendOutcome::Failed(failure)
            }
        }
    }
}

/// Build the message and run the SMTP transaction.
///
/// The transport lives on this frame, so the connection is closed when the
/// function returns, whichever path it returns by.
fn submit(
    config: &EmailConfig,
    recipient: &str,
    subject: &str,
    body: &str,
) -> Result<(), SendFailure> {
    let from: Mailbox = config
        .sender
        .parse()
        .map_err(|e| SendFailure::Unexpected(format!("invalid sender address: {}", e)))?;
    let to: Mailbox = recipient
        .parse()
        .map_err(|e| SendFailure::Unexpected(format!("invalid recipient address: {}", e)))?;

    let message = Message::builder()
        .from(from)
        .to(to)
        .subject(subject)
        .body(body.to_string())
        .map_err(|e| SendFailure::Unexpected(e.to_string()))?;

    let transport = SmtpTransport::starttls_relay(&config.host)
        .map_err(|e| classify_smtp_error(config, &e))?
        .port(config.port)
        .credentials(Credentials::new(
            config.sender.clone(),
            config.password.clone(),
        ))
        .build();

    let response = transport
        .send(&message)
        .map_err(|e| classify_smtp_error(config, &e))?;

    tracing::debug!(
        "relay response: {}",
        response.message().collect::<Vec<&str>>().join(" ")
    );
    Ok(())
}

/// AUTH failure reply codes (RFC 4954).
const AUTH_FAILURE_CODES: &[&str] = &["530", "534", "535", "538"];

pub(crate) fn is_auth_code(code: &str) -> bool {
    AUTH_FAILURE_CODES.contains(&code)
}

/// Map a transport error onto the failure taxonomy.
fn classify_smtp_error(config: &EmailConfig, err: &smtp::Error) -> SendFailure {
    // A reply code means the relay answered; AUTH rejections get their own
    // kind, everything else keeps the library's error text.
    if let Some(code) = err.status() {
        if is_auth_code(&code.to_string()) {
            return SendFailure::Auth;
        }
        return SendFailure::Transport(error_detail(err));
    }

    // No reply at all. Timeouts and TLS failures mean the handshake never
    // completed.
    if err.is_timeout() || err.is_tls() {
        return SendFailure::Connect {
            host: config.host.clone(),
            port: config.port,
        };
    }

    if let Some(kind) = io_error_kind(err) {
        return failure_for_io_kind(kind, config, error_detail(err));
    }

    if err.is_response() {
        // Truncated or garbled reply: the stream died mid-transaction.
        return SendFailure::Disconnected;
    }

    if err.is_client() {
        return SendFailure::Transport(error_detail(err));
    }

    // No status, no IO cause: the peer went away between commands.
    SendFailure::Disconnected
}

/// Map an IO error kind from the transport's cause chain.
pub(crate) fn failure_for_io_kind(
    kind: std::io::ErrorKind,
    config: &EmailConfig,
    detail: String,
) -> SendFailure {
    use std::io::ErrorKind;

    match kind {
        // Connection establishment failed.
        ErrorKind::ConnectionRefused
        | ErrorKind::TimedOut
        | ErrorKind::AddrNotAvailable
        | ErrorKind::AddrInUse
        | ErrorKind::NotFound => SendFailure::Connect {
            host: config.host.clone(),
            port: config.port,
        },
        // The stream died after it was up.
        ErrorKind::ConnectionReset
        | ErrorKind::ConnectionAborted
        | ErrorKind::BrokenPipe
        | ErrorKind::UnexpectedEof
        | ErrorKind::WriteZero => SendFailure::Disconnected,
        _ => SendFailure::Transport(detail),
    }
}

/// First `std::io::Error` in the error's cause chain, if any.
fn io_error_kind(err: &smtp::Error) -> Option<std::io::ErrorKind> {
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        if let Some(io) = cause.downcast_ref::<std::io::Error>() {
            return Some(io.kind());
        }
        source = cause.source();
    }
    None
}

/// Error text including the underlying cause, for the kinds whose phrasing
/// carries detail.
fn error_detail(err: &smtp::Error) -> String {
    match std::error::Error::source(err) {
        Some(cause) => format!("{}: {}", err, cause),
        None => err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        ENV_SENDER_APP_PASSWORD, ENV_SENDER_EMAIL, ENV_SMTP_PORT, ENV_SMTP_SERVER,
    };
    use pretty_assertions::assert_eq;
    use std::io::ErrorKind;

    fn test_config() -> EmailConfig {
        EmailConfig {
            sender: "bot@x.com".to_string(),
            password: "secret".to_string(),
            host: "smtp.x.com".to_string(),
            port: 587,
        }
    }

    fn sender_missing(present: &[(&str, &str)]) -> EmailSender {
        let pairs: Vec<(String, String)> = present
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let config =
            EnvConfig::from_lookup(|key| {
                pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone())
            })
            .unwrap();
        EmailSender::new(config)
    }

    #[test]
    fn test_config_failure_names_missing_fields() {
        let sender = sender_missing(&[
            (ENV_SENDER_EMAIL, "bot@x.com"),
            (ENV_SMTP_SERVER, "smtp.x.com"),
        ]);
        let outcome = sender.send("user@y.com", "Hi", "Body");

        assert_eq!(
            outcome.to_string(),
            "Error: Email server not fully configured. Missing: SENDER_APP_PASSWORD, SMTP_PORT. \
             Please check your environment configuration."
        );
    }

    #[test]
    fn test_config_failure_with_nothing_set() {
        let sender = sender_missing(&[]);
        let outcome = sender.send("user@y.com", "Hi", "Body");

        match &outcome {
            SendOutcome::Failed(SendFailure::Config { missing }) => {
                assert_eq!(
                    missing.0,
                    vec![
                        ENV_SENDER_EMAIL,
                        ENV_SENDER_APP_PASSWORD,
                        ENV_SMTP_SERVER,
                        ENV_SMTP_PORT
                    ]
                );
            }
            other => panic!("expected config failure, got {:?}", other),
        }
        assert!(outcome.to_string().contains(
            "Missing: SENDER_EMAIL, SENDER_APP_PASSWORD, SMTP_SERVER, SMTP_PORT"
        ));
    }

    #[test]
    fn test_success_phrasing_mentions_recipient_and_subject() {
        let outcome = SendOutcome::Sent {
            recipient: "user@y.com".to_string(),
            subject: "Reminder".to_string(),
        };
        assert!(outcome.is_sent());
        assert_eq!(
            outcome.to_string(),
            "Email successfully sent to user@y.com with subject 'Reminder'."
        );
    }

    #[test]
    fn test_auth_phrasing_references_configured_credentials() {
        let text = SendFailure::Auth.to_string();
        assert!(text.contains("Authentication Failed"));
        assert!(text.contains("SENDER_EMAIL"));
        assert!(text.contains("SENDER_APP_PASSWORD"));
    }

    #[test]
    fn test_connect_phrasing_includes_host_and_port() {
        let text = SendFailure::Connect {
            host: "smtp.x.com".to_string(),
            port: 587,
        }
        .to_string();
        assert_eq!(
            text,
            "Error: Failed to connect to SMTP server smtp.x.com on port 587."
        );
    }

    #[test]
    fn test_disconnect_phrasing_invites_retry() {
        let text = SendFailure::Disconnected.to_string();
        assert!(text.contains("disconnected unexpectedly"));
        assert!(text.contains("try again"));
    }

    #[test]
    fn test_detail_phrasings() {
        assert_eq!(
            SendFailure::Transport("454 TLS not available".to_string()).to_string(),
            "An SMTP error occurred: 454 TLS not available"
        );
        assert_eq!(
            SendFailure::Unexpected("boom".to_string()).to_string(),
            "An unexpected error occurred: boom"
        );
    }

    #[test]
    fn test_auth_codes() {
        for code in ["530", "534", "535", "538"] {
            assert!(is_auth_code(code), "{} should classify as auth", code);
        }
        for code in ["250", "421", "550", "554"] {
            assert!(!is_auth_code(code), "{} should not classify as auth", code);
        }
    }

    #[test]
    fn test_io_kind_classification() {
        let config = test_config();

        for kind in [
            ErrorKind::ConnectionRefused,
            ErrorKind::TimedOut,
            ErrorKind::AddrNotAvailable,
        ] {
            assert_eq!(
                failure_for_io_kind(kind, &config, String::new()),
                SendFailure::Connect {
                    host: "smtp.x.com".to_string(),
                    port: 587,
                }
            );
        }

        for kind in [
            ErrorKind::ConnectionReset,
            ErrorKind::ConnectionAborted,
            ErrorKind::BrokenPipe,
            ErrorKind::UnexpectedEof,
        ] {
            assert_eq!(
                failure_for_io_kind(kind, &config, String::new()),
                SendFailure::Disconnected
            );
        }

        assert_eq!(
            failure_for_io_kind(ErrorKind::PermissionDenied, &config, "denied".to_string()),
            SendFailure::Transport("denied".to_string())
        );
    }

    #[test]
    fn test_malformed_recipient_is_unexpected() {
        let sender = sender_missing(&[
            (ENV_SENDER_EMAIL, "bot@x.com"),
            (ENV_SENDER_APP_PASSWORD, "secret"),
            (ENV_SMTP_SERVER, "smtp.x.com"),
            (ENV_SMTP_PORT, "587"),
        ]);
        // Fails at message construction, before any connection is opened.
        let outcome = sender.send("not an address", "Hi", "Body");

        match outcome {
            SendOutcome::Failed(SendFailure::Unexpected(detail)) => {
                assert!(detail.contains("recipient"), "detail: {}", detail);
            }
            other => panic!("expected unexpected-failure, got {:?}", other),
        }
    }

    #[test]
    fn test_field_list_display() {
        assert_eq!(FieldList(vec!["A", "B"]).to_string(), "A, B");
        assert_eq!(FieldList(vec!["A"]).to_string(), "A");
    }
}
