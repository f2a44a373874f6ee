//! Apple Music catalog search tool.

use std::sync::Arc;

use futures::FutureExt;
use rmcp::{
    ErrorData as McpError,
    handler::server::tool::{ToolCallContext, ToolRoute, cached_schema_for_type},
    model::{CallToolResult, Tool},
};
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::info;

use super::super::common::{api_error_result, default_limit, structured_result, validate_limit};
use crate::core::context::AppContext;
use crate::domains::auth::RequestCredentials;

/// Parameters for catalog search.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct CatalogSearchParams {
    /// What to search for.
    #[schemars(description = "Search term, e.g. a song, album, or artist name")]
    pub term: String,

    /// Which resource types to search.
    #[schemars(
        description = "Comma-separated resource types (default: songs,albums,artists,playlists)"
    )]
    #[serde(default = "default_types")]
    pub types: String,

    /// Maximum number of results per type.
    #[schemars(description = "Maximum results per type (default: 10, max: 100)")]
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_types() -> String {
    "songs,albums,artists,playlists".to_string()
}

/// Catalog search tool implementation.
#[derive(Debug, Clone)]
pub struct CatalogSearchTool;

impl CatalogSearchTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "am_catalog_search";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str = "Search the Apple Music catalog for songs, albums, artists, and playlists. Returns structured results with catalog ids usable by the library and playlist tools. Does not require user authorization.";

    /// Execute the tool logic.
    pub async fn execute(
        ctx: &AppContext,
        _creds: &RequestCredentials,
        params: &CatalogSearchParams,
    ) -> CallToolResult {
        info!("Searching catalog for: {}", params.term);
        let path = format!("/v1/catalog/{}/search", ctx.music.storefront());
        let query = [
            ("term", params.term.clone()),
            ("types", params.types.clone()),
            ("limit", validate_limit(params.limit).to_string()),
        ];

        match ctx.music.catalog_get(&path, &query).await {
            Ok(response) => {
                let results = response
                    .get("results")
                    .cloned()
                    .unwrap_or(serde_json::Value::Null);
                structured_result(
                    format!("Catalog results for '{}'", params.term),
                    results,
                )
            }
            Err(e) => api_error_result(&e),
        }
    }

    /// Create a Tool model for this tool (metadata).
    pub fn to_tool() -> Tool {
        Tool {
            name: Self::NAME.into(),
            description: Some(Self::DESCRIPTION.into()),
            input_schema: cached_schema_for_type::<CatalogSearchParams>(),
            annotations: None,
            output_schema: None,
            icons: None,
            meta: None,
            title: None,
        }
    }

    /// Create a ToolRoute for the rmcp router.
    pub fn create_route<S>(ctx: Arc<AppContext>) -> ToolRoute<S>
    where
        S: Send + Sync + 'static,
    {
        ToolRoute::new_dyn(Self::to_tool(), move |tcc: ToolCallContext<'_, S>| {
            let ctx = Arc::clone(&ctx);
            let args = tcc.arguments.clone().unwrap_or_default();
            async move {
                let params: CatalogSearchParams =
                    serde_json::from_value(serde_json::Value::Object(args))
                        .map_err(|e| McpError::invalid_params(e.to_string(), None))?;
                Ok(Self::execute(&ctx, &RequestCredentials::default(), &params).await)
            }
            .boxed()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_defaults() {
        let json = r#"{"term": "Nirvana"}"#;
        let params: CatalogSearchParams = serde_json::from_str(json).unwrap();
        assert_eq!(params.limit, 10);
        assert_eq!(params.types, "songs,albums,artists,playlists");
    }

    #[test]
    fn test_params_custom() {
        let json = r#"{"term": "Nirvana", "types": "songs", "limit": 5}"#;
        let params: CatalogSearchParams = serde_json::from_str(json).unwrap();
        assert_eq!(params.limit, 5);
        assert_eq!(params.types, "songs");
    }
}
