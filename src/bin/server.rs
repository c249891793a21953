//! Mailbridge MCP Server
//!
//! Run with: mailbridge-server

use clap::Parser;
use serde_json::{json, Value};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mailbridge::config::EnvConfig;
use mailbridge::error::Result;
use mailbridge::mailer::{EmailRequest, EmailSender};
use mailbridge::mcp::{
    get_tool_definitions, methods, InitializeResult, McpHandler, McpRequest, McpResponse,
    McpServer, ToolCallResult,
};

#[derive(Parser, Debug)]
#[command(name = "mailbridge-server")]
#[command(about = "MCP server exposing outbound email delivery as a tool")]
#[command(version)]
struct Args {
    /// Direct-execution mode: preflight the mail configuration and refuse
    /// to serve when it is incomplete. Without this flag the server always
    /// starts and configuration problems surface per tool call.
    #[arg(long)]
    standalone: bool,
}

/// MCP request handler
struct MailbridgeHandler {
    sender: EmailSender,
}

impl MailbridgeHandler {
    fn new(sender: EmailSender) -> Self {
        Self { sender }
    }

    fn handle_tool_call(&self, name: &str, params: Value) -> ToolCallResult {
        match name {
            "send_email" => self.tool_send_email(params),
            _ => ToolCallResult::error(format!("Unknown tool: {}", name)),
        }
    }

    fn tool_send_email(&self, params: Value) -> ToolCallResult {
        let request: EmailRequest = match serde_json::from_value(params) {
            Ok(r) => r,
            Err(e) => return ToolCallResult::error(format!("Invalid arguments: {}", e)),
        };

        let outcome = self
            .sender
            .send(&request.recipient_email, &request.subject, &request.body);

        // A failed send is still a successful tool call; the status string
        // is the result either way.
        ToolCallResult::text(outcome.to_string())
    }
}

impl McpHandler for MailbridgeHandler {
    fn handle_request(&self, request: McpRequest) -> McpResponse {
        match request.method.as_str() {
            methods::INITIALIZE => {
                let result = InitializeResult::default();
                McpResponse::success(request.id, json!(result))
            }
            methods::INITIALIZED => {
                // Notification, the serving loop drops the response.
                McpResponse::success(request.id, json!({}))
            }
            methods::LIST_TOOLS => {
                let tools = get_tool_definitions();
                McpResponse::success(request.id, json!({"tools": tools}))
            }
            methods::CALL_TOOL => {
                let name = request
                    .params
                    .get("name")
                    .and_then(|v| v.as_str())
                    .unwrap_or("");
                let arguments = request
                    .params
                    .get("arguments")
                    .cloned()
                    .unwrap_or(json!({}));

                let result = self.handle_tool_call(name, arguments);
                McpResponse::success(request.id, json!(result))
            }
            _ => McpResponse::error(
                request.id,
                -32601,
                format!("Method not found: {}", request.method),
            ),
        }
    }
}

fn main() -> Result<()> {
    // Initialize logging to stderr (stdout is for MCP protocol)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false),
        )
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    // Snapshot the environment once. A present-but-unparseable SMTP_PORT is
    // fatal here, before any tool registration.
    let config = match EnvConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    if args.standalone {
        match config.resolve() {
            Ok(resolved) => {
                tracing::info!("Mailbridge MCP server is starting...");
                tracing::info!("Sender: {}", resolved.sender);
                tracing::info!("SMTP relay: {}:{}", resolved.host, resolved.port);
            }
            Err(missing) => {
                eprintln!(
                    "Error: email server environment variables ({}) are not fully set.",
                    missing.join(", ")
                );
                eprintln!(
                    "Set SENDER_EMAIL, SENDER_APP_PASSWORD, SMTP_SERVER and SMTP_PORT, then rerun."
                );
                return Ok(());
            }
        }
    }

    let sender = EmailSender::new(config);
    let handler = MailbridgeHandler::new(sender);
    let server = McpServer::new(handler);

    tracing::info!("mailbridge-server listening on stdio");
    server.run()
}
