//! MCP (Model Context Protocol) server implementation
//!
//! JSON-RPC 2.0 over stdio, exposing the email tool to an agent host.

pub mod protocol;
pub mod tools;

pub use protocol::{
    methods, InitializeResult, McpHandler, McpRequest, McpResponse, McpServer, ToolCallResult,
};
pub use tools::{get_tool_definitions, TOOL_DEFINITIONS};
