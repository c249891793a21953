//! MCP tool definitions for Mailbridge

use serde_json::json;

use super::protocol::ToolDefinition;

/// All tool definitions for Mailbridge
pub const TOOL_DEFINITIONS: &[(&str, &str, &str)] = &[(
    "send_email",
    "Sends an email from the configured sender to the specified recipient. \
     Returns a string describing the outcome of the sending operation.",
    r#"{
        "type": "object",
        "properties": {
            "recipient_email": {"type": "string", "description": "The email address of the recipient"},
            "subject": {"type": "string", "description": "The subject of the email"},
            "body": {"type": "string", "description": "The content/body of the email"}
        },
        "required": ["recipient_email", "subject", "body"]
    }"#,
)];

/// Get all tool definitions as ToolDefinition structs
pub fn get_tool_definitions() -> Vec<ToolDefinition> {
    TOOL_DEFINITIONS
        .iter()
        .map(|(name, description, schema)| ToolDefinition {
            name: name.to_string(),
            description: description.to_string(),
            input_schema: serde_json::from_str(schema).unwrap_or(json!({})),
        })
        .collect()
}
