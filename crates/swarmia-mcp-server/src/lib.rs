//! Swarmia MCP Server
//!
//! Exposes the Swarmia Export API to AI assistants via Model Context Protocol.
//! Six read-only report tools, each bound to one API endpoint; report bodies
//! (CSV) are returned verbatim. Implements MCP JSON-RPC protocol over stdio.

pub mod catalog;
pub mod client;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod params;
pub mod protocol;
pub mod server;
pub mod tools;

pub use catalog::{Catalog, ToolDescriptor};
pub use client::{ReportClient, SwarmiaClient};
pub use config::{Config, ConfigError, Credential};
pub use dispatcher::Dispatcher;
pub use error::{McpError, ReportError, ReportResult};
pub use protocol::{ToolCallResult, ToolContent};
pub use server::McpServer;
pub use tools::swarmia_catalog;

/// Server name
pub const SERVER_NAME: &str = "swarmia-mcp";

/// Server version
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");
