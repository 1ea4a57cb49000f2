//! Jukugo MCP - Model Context Protocol server
//!
//! Exposes imports and graph queries as MCP tools over stdio, and over
//! HTTP/SSE with a few plain REST read routes when the `sse` feature is on.

pub mod handlers;
pub mod server;
pub mod tools;
pub mod transport;

#[cfg(feature = "sse")]
pub mod sse;

pub use handlers::{ServerSettings, ToolCallResponse, ToolHandler};
pub use server::McpServer;

#[cfg(feature = "sse")]
pub use sse::run_sse_server;
