//! Library listing tool.

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

use super::super::common::{
    api_error_result, data_len, default_limit, error_result, structured_result, validate_limit,
};
use crate::core::context::AppContext;
use crate::domains::auth::{RequestCredentials, resolve_user_token};

/// Parameters for listing library contents.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct LibraryListParams {
    /// Which library collection to list.
    #[schemars(description = "Collection to list: 'songs', 'albums', or 'playlists'")]
    pub kind: String,

    /// Maximum number of results.
    #[schemars(description = "Maximum results (default: 10, max: 100)")]
    #[serde(default = "default_limit")]
    pub limit: usize,

    /// Offset into the collection for paging.
    #[schemars(description = "Offset for paging (default: 0)")]
    #[serde(default)]
    pub offset: usize,
}

/// Library listing tool implementation.
#[derive(Debug, Clone)]
pub struct LibraryListTool;

impl LibraryListTool {
    pub const NAME: &'static str = "am_library_list";

    pub const DESCRIPTION: &'static str = "List the songs, albums, or playlists in the user's Apple Music library, with paging. Requires user authorization.";

    pub async fn execute(
        ctx: &AppContext,
        creds: &RequestCredentials,
        params: &LibraryListParams,
    ) -> CallToolResult {
        let kind = params.kind.as_str();
        if !matches!(kind, "songs" | "albums" | "playlists") {
            return error_result(&format!(
                "Unknown library collection: {kind}. Use 'songs', 'albums', or 'playlists'"
            ));
        }

        info!("Listing library {}", kind);
        let user_token = resolve_user_token(&ctx.user_tokens, creds);
        let path = format!("/v1/me/library/{kind}");
        let query = [
            ("limit", validate_limit(params.limit).to_string()),
            ("offset", params.offset.to_string()),
        ];

        match ctx
            .music
            .user_get(&path, &query, user_token.as_deref())
            .await
        {
            Ok(response) => {
                let count = data_len(&response).unwrap_or(0);
                structured_result(format!("Found {count} library {kind}"), response)
            }
            Err(e) => api_error_result(&e),
        }
    }

    pub fn to_tool() -> Tool {
        Tool {
            name: Self::NAME.into(),
            description: Some(Self::DESCRIPTION.into()),
            input_schema: cached_schema_for_type::<LibraryListParams>(),
            annotations: None,
            output_schema: None,
            icons: None,
            meta: None,
            title: None,
        }
    }

    pub fn create_route<S>(ctx: Arc<AppContext>) -> ToolRoute<S>
    where
        S: Send + Sync + 'static,
    {
        ToolRoute::new_dyn(Self::to_tool(), move |tcc: ToolCallContext<'_, S>| {
            let ctx = Arc::clone(&ctx);
            let args = tcc.arguments.clone().unwrap_or_default();
            async move {
                let params: LibraryListParams =
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
        let json = r#"{"kind": "songs"}"#;
        let params: LibraryListParams = serde_json::from_str(json).unwrap();
        assert_eq!(params.limit, 10);
        assert_eq!(params.offset, 0);
    }

    #[tokio::test]
    async fn test_unknown_kind_is_rejected_without_io() {
        let ctx = crate::core::context::AppContext::new(Arc::new(Default::default()));
        let params = LibraryListParams {
            kind: "videos".to_string(),
            limit: 10,
            offset: 0,
        };
        let result =
            LibraryListTool::execute(&ctx, &RequestCredentials::default(), &params).await;
        assert!(result.is_error.unwrap_or(false));
    }
}
