//! Mailbridge - outbound email as an MCP tool
//!
//! A thin adapter between a Model Context Protocol host and an SMTP relay:
//! configuration from environment variables, one STARTTLS submission per
//! tool call, and a human-readable status string back to the caller.

pub mod config;
pub mod error;
pub mod mailer;
pub mod mcp;

pub use config::{EmailConfig, EnvConfig};
pub use error::{Result, ServerError};
pub use mailer::{EmailRequest, EmailSender, SendFailure, SendOutcome};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
