//! Add catalog items to the user's library.

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

use super::super::common::{api_error_result, error_result, structured_result};
use crate::core::context::AppContext;
use crate::domains::auth::{RequestCredentials, resolve_user_token};

/// Parameters for adding catalog items to the library.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct LibraryAddParams {
    /// Catalog song ids to add.
    #[schemars(description = "Catalog song ids to add to the library")]
    #[serde(default)]
    pub song_ids: Vec<String>,

    /// Catalog album ids to add.
    #[schemars(description = "Catalog album ids to add to the library")]
    #[serde(default)]
    pub album_ids: Vec<String>,
}

/// Library add tool implementation.
#[derive(Debug, Clone)]
pub struct LibraryAddTool;

impl LibraryAddTool {
    pub const NAME: &'static str = "am_library_add";

    pub const DESCRIPTION: &'static str = "Add catalog songs and/or albums to the user's Apple Music library by catalog id (use am_catalog_search to find ids). Requires user authorization.";

    pub async fn execute(
        ctx: &AppContext,
        creds: &RequestCredentials,
        params: &LibraryAddParams,
    ) -> CallToolResult {
        if params.song_ids.is_empty() && params.album_ids.is_empty() {
            return error_result("Provide at least one of song_ids or album_ids");
        }

        info!(
            "Adding {} song(s), {} album(s) to library",
            params.song_ids.len(),
            params.album_ids.len()
        );
        let user_token = resolve_user_token(&ctx.user_tokens, creds);

        let mut query = Vec::new();
        if !params.song_ids.is_empty() {
            query.push(("ids[songs]", params.song_ids.join(",")));
        }
        if !params.album_ids.is_empty() {
            query.push(("ids[albums]", params.album_ids.join(",")));
        }

        match ctx
            .music
            .user_post("/v1/me/library", &query, None, user_token.as_deref())
            .await
        {
            Ok(_) => structured_result(
                "Added to library".to_string(),
                serde_json::json!({
                    "songs_added": params.song_ids,
                    "albums_added": params.album_ids,
                }),
            ),
            Err(e) => api_error_result(&e),
        }
    }

    pub fn to_tool() -> Tool {
        Tool {
            name: Self::NAME.into(),
            description: Some(Self::DESCRIPTION.into()),
            input_schema: cached_schema_for_type::<LibraryAddParams>(),
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
                let params: LibraryAddParams =
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
    fn test_params_default_to_empty() {
        let params: LibraryAddParams = serde_json::from_str("{}").unwrap();
        assert!(params.song_ids.is_empty());
        assert!(params.album_ids.is_empty());
    }

    #[tokio::test]
    async fn test_empty_request_is_rejected_without_io() {
        let ctx = crate::core::context::AppContext::new(Arc::new(Default::default()));
        let params = LibraryAddParams {
            song_ids: vec![],
            album_ids: vec![],
        };
        let result = LibraryAddTool::execute(&ctx, &RequestCredentials::default(), &params).await;
        assert!(result.is_error.unwrap_or(false));
    }
}
