//! Recently played listening history.

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
    api_error_result, data_len, default_limit, structured_result, validate_limit,
};
use crate::core::context::AppContext;
use crate::domains::auth::{RequestCredentials, resolve_user_token};

/// Parameters for the recently played listing.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct RecentlyPlayedParams {
    /// Maximum number of items.
    #[schemars(description = "Maximum results (default: 10, max: 100)")]
    #[serde(default = "default_limit")]
    pub limit: usize,
}

/// Recently played tool implementation.
#[derive(Debug, Clone)]
pub struct RecentlyPlayedTool;

impl RecentlyPlayedTool {
    pub const NAME: &'static str = "am_recently_played";

    pub const DESCRIPTION: &'static str = "List the albums, playlists, and stations the user played most recently. Requires user authorization.";

    pub async fn execute(
        ctx: &AppContext,
        creds: &RequestCredentials,
        params: &RecentlyPlayedParams,
    ) -> CallToolResult {
        info!("Fetching recently played");
        let user_token = resolve_user_token(&ctx.user_tokens, creds);
        let query = [("limit", validate_limit(params.limit).to_string())];

        match ctx
            .music
            .user_get("/v1/me/recent/played", &query, user_token.as_deref())
            .await
        {
            Ok(response) => {
                let count = data_len(&response).unwrap_or(0);
                structured_result(format!("{count} recently played resource(s)"), response)
            }
            Err(e) => api_error_result(&e),
        }
    }

    pub fn to_tool() -> Tool {
        Tool {
            name: Self::NAME.into(),
            description: Some(Self::DESCRIPTION.into()),
            input_schema: cached_schema_for_type::<RecentlyPlayedParams>(),
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
                let params: RecentlyPlayedParams =
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
    fn test_params_default_limit() {
        let params: RecentlyPlayedParams = serde_json::from_str("{}").unwrap();
        assert_eq!(params.limit, 10);
    }
}
