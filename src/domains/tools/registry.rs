//! Tool Registry - central registration and dispatch for all tools.
//!
//! This module provides:
//! - A registry of all available tools
//! - HTTP dispatch for tool calls (when http feature is enabled)
//! - Tool metadata for listing

use std::sync::Arc;

use rmcp::model::Tool;

use crate::core::context::AppContext;

use super::definitions::{
    CatalogSearchTool, HeavyRotationTool, LibraryAddTool, LibraryListTool, PlaylistAddTracksTool,
    PlaylistCreateTool, PlaylistTracksTool, RecentlyPlayedTool,
};

// ============================================================================
// Tool Registry
// ============================================================================

/// Tool registry - manages all available tools.
///
/// This struct provides a central point for:
/// - Listing all available tools
/// - Dispatching HTTP tool calls (when http feature is enabled)
pub struct ToolRegistry {
    ctx: Arc<AppContext>,
}

impl ToolRegistry {
    /// Create a new tool registry.
    pub fn new(ctx: Arc<AppContext>) -> Self {
        Self { ctx }
    }

    /// Get all tool names.
    pub fn tool_names(&self) -> Vec<&'static str> {
        vec![
            CatalogSearchTool::NAME,
            HeavyRotationTool::NAME,
            LibraryAddTool::NAME,
            LibraryListTool::NAME,
            PlaylistAddTracksTool::NAME,
            PlaylistCreateTool::NAME,
            PlaylistTracksTool::NAME,
            RecentlyPlayedTool::NAME,
        ]
    }

    /// Get all tools as Tool models (metadata).
    ///
    /// This is the single source of truth for all available tools.
    /// Both HTTP and STDIO transports use this to get tool metadata.
    pub fn get_all_tools() -> Vec<Tool> {
        vec![
            CatalogSearchTool::to_tool(),
            HeavyRotationTool::to_tool(),
            LibraryAddTool::to_tool(),
            LibraryListTool::to_tool(),
            PlaylistAddTracksTool::to_tool(),
            PlaylistCreateTool::to_tool(),
            PlaylistTracksTool::to_tool(),
            RecentlyPlayedTool::to_tool(),
        ]
    }

    /// Dispatch an HTTP tool call to the appropriate handler.
    ///
    /// The resolved request credentials carry the caller's bearer token
    /// and session id, so user-scoped tools pick up the right user token.
    #[cfg(feature = "http")]
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: serde_json::Value,
        creds: &crate::domains::auth::RequestCredentials,
    ) -> Result<serde_json::Value, String> {
        use tracing::warn;

        let result = match name {
            CatalogSearchTool::NAME => {
                CatalogSearchTool::execute(&self.ctx, creds, &parse_params(arguments)?).await
            }
            HeavyRotationTool::NAME => {
                HeavyRotationTool::execute(&self.ctx, creds, &parse_params(arguments)?).await
            }
            LibraryAddTool::NAME => {
                LibraryAddTool::execute(&self.ctx, creds, &parse_params(arguments)?).await
            }
            LibraryListTool::NAME => {
                LibraryListTool::execute(&self.ctx, creds, &parse_params(arguments)?).await
            }
            PlaylistAddTracksTool::NAME => {
                PlaylistAddTracksTool::execute(&self.ctx, creds, &parse_params(arguments)?).await
            }
            PlaylistCreateTool::NAME => {
                PlaylistCreateTool::execute(&self.ctx, creds, &parse_params(arguments)?).await
            }
            PlaylistTracksTool::NAME => {
                PlaylistTracksTool::execute(&self.ctx, creds, &parse_params(arguments)?).await
            }
            RecentlyPlayedTool::NAME => {
                RecentlyPlayedTool::execute(&self.ctx, creds, &parse_params(arguments)?).await
            }
            _ => {
                warn!("Unknown tool requested: {}", name);
                return Err(format!("Unknown tool: {}", name));
            }
        };

        Ok(serde_json::json!({
            "content": result.content,
            "isError": result.is_error.unwrap_or(false)
        }))
    }
}

/// Deserialize tool arguments into a typed params struct.
#[cfg(feature = "http")]
fn parse_params<T: serde::de::DeserializeOwned>(
    arguments: serde_json::Value,
) -> Result<T, String> {
    serde_json::from_value(arguments).map_err(|e| format!("Invalid arguments: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Config;

    fn test_ctx() -> Arc<AppContext> {
        AppContext::new(Arc::new(Config::default()))
    }

    #[test]
    fn test_registry_tool_names() {
        let registry = ToolRegistry::new(test_ctx());
        let names = registry.tool_names();
        assert_eq!(names.len(), 8);
        assert!(names.contains(&"am_catalog_search"));
        assert!(names.contains(&"am_library_list"));
        assert!(names.contains(&"am_library_add"));
        assert!(names.contains(&"am_playlist_create"));
        assert!(names.contains(&"am_playlist_add_tracks"));
        assert!(names.contains(&"am_playlist_tracks"));
        assert!(names.contains(&"am_recently_played"));
        assert!(names.contains(&"am_heavy_rotation"));
    }

    #[test]
    fn test_all_tools_have_schemas() {
        for tool in ToolRegistry::get_all_tools() {
            assert!(tool.description.is_some(), "{} lacks a description", tool.name);
        }
    }

    #[cfg(feature = "http")]
    #[tokio::test]
    async fn test_registry_call_unknown() {
        let registry = ToolRegistry::new(test_ctx());
        let creds = crate::domains::auth::RequestCredentials::default();
        let result = registry
            .call_tool("unknown", serde_json::json!({}), &creds)
            .await;
        assert!(result.is_err());
    }

    #[cfg(feature = "http")]
    #[tokio::test]
    async fn test_registry_call_with_bad_arguments() {
        let registry = ToolRegistry::new(test_ctx());
        let creds = crate::domains::auth::RequestCredentials::default();
        // Missing the required "term" field.
        let result = registry
            .call_tool(CatalogSearchTool::NAME, serde_json::json!({}), &creds)
            .await;
        assert!(result.is_err());
    }
}
