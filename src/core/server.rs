//! MCP Server implementation and lifecycle management.
//!
//! This module contains the main server handler that implements the MCP
//! protocol by delegating to the tools domain.
//!
//! ## Tool Architecture
//!
//! Tools are defined in `domains/tools/definitions/` with one file per tool.
//! Each tool defines:
//! - Parameters struct (for rmcp)
//! - `execute()` method (core logic)
//! - `create_route()` method (registered via the ToolRouter)
//!
//! The ToolRouter is built dynamically in `domains/tools/router.rs`.
//! **Adding a new tool does NOT require modifying this file!**

use rmcp::{ServerHandler, handler::server::tool::ToolRouter, model::*, tool_handler};
use std::sync::Arc;

use super::config::Config;
use super::context::AppContext;
use crate::domains::tools::build_tool_router;

#[cfg(feature = "http")]
use crate::domains::tools::ToolRegistry;

/// The main MCP server handler.
///
/// This struct implements the `ServerHandler` trait from rmcp and holds the
/// shared application context the tools run against.
#[derive(Clone)]
pub struct McpServer {
    /// Shared application state: config, auth stores, API client.
    ctx: Arc<AppContext>,

    /// Tool router for handling tool calls.
    tool_router: ToolRouter<Self>,
}

impl McpServer {
    /// Create a new MCP server with the given configuration.
    pub fn new(config: Config) -> Self {
        let ctx = AppContext::new(Arc::new(config));
        Self {
            tool_router: build_tool_router::<Self>(ctx.clone()),
            ctx,
        }
    }

    /// Get the server name.
    pub fn name(&self) -> &str {
        &self.ctx.config.server.name
    }

    /// Get the server version.
    pub fn version(&self) -> &str {
        &self.ctx.config.server.version
    }

    /// Get the shared application context.
    pub fn context(&self) -> &Arc<AppContext> {
        &self.ctx
    }

    // ========================================================================
    // HTTP Transport Support Methods
    // ========================================================================

    /// List all available tools (for HTTP transport).
    pub fn list_tools(&self) -> Vec<serde_json::Value> {
        self.tool_router
            .list_all()
            .into_iter()
            .map(|t| {
                serde_json::json!({
                    "name": t.name,
                    "description": t.description,
                    "inputSchema": t.input_schema
                })
            })
            .collect()
    }

    /// Call a tool by name (for HTTP transport).
    ///
    /// The resolved request credentials travel with the call so user-scoped
    /// tools see the right Music User Token.
    #[cfg(feature = "http")]
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: serde_json::Value,
        creds: &crate::domains::auth::RequestCredentials,
    ) -> Result<serde_json::Value, String> {
        let registry = ToolRegistry::new(self.ctx.clone());
        registry.call_tool(name, arguments, creds).await
    }
}

/// ServerHandler implementation with tool_handler macro for automatic tool routing.
#[tool_handler]
impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Apple Music MCP server. Search the catalog, manage the user's \
                 library and playlists, and read listening history. User-scoped \
                 tools need a Music User Token obtained via the OAuth handshake \
                 or the MUSIC_USER_TOKEN environment variable."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_exposes_all_tools() {
        let server = McpServer::new(Config::default());
        let tools = server.list_tools();
        assert_eq!(tools.len(), 8);
    }

    #[test]
    fn test_server_name_and_version() {
        let server = McpServer::new(Config::default());
        assert_eq!(server.name(), "apple-music-mcp");
        assert_eq!(server.version(), env!("CARGO_PKG_VERSION"));
    }
}
