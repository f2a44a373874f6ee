//! List the tracks of a library playlist.

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

/// Parameters for listing playlist tracks.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct PlaylistTracksParams {
    /// Library playlist id (e.g. "p.ABC123").
    #[schemars(description = "Library playlist id")]
    pub playlist_id: String,

    /// Maximum number of tracks.
    #[schemars(description = "Maximum tracks (default: 10, max: 100)")]
    #[serde(default = "default_limit")]
    pub limit: usize,

    /// Offset for paging.
    #[schemars(description = "Offset for paging (default: 0)")]
    #[serde(default)]
    pub offset: usize,
}

/// Playlist tracks listing tool implementation.
#[derive(Debug, Clone)]
pub struct PlaylistTracksTool;

impl PlaylistTracksTool {
    pub const NAME: &'static str = "am_playlist_tracks";

    pub const DESCRIPTION: &'static str = "List the tracks of a playlist in the user's Apple Music library, with paging. Requires user authorization.";

    pub async fn execute(
        ctx: &AppContext,
        creds: &RequestCredentials,
        params: &PlaylistTracksParams,
    ) -> CallToolResult {
        info!("Listing tracks of playlist {}", params.playlist_id);
        let user_token = resolve_user_token(&ctx.user_tokens, creds);
        let path = format!("/v1/me/library/playlists/{}/tracks", params.playlist_id);
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
                structured_result(
                    format!("Playlist {} has {count} track(s) in this page", params.playlist_id),
                    response,
                )
            }
            Err(e) => api_error_result(&e),
        }
    }

    pub fn to_tool() -> Tool {
        Tool {
            name: Self::NAME.into(),
            description: Some(Self::DESCRIPTION.into()),
            input_schema: cached_schema_for_type::<PlaylistTracksParams>(),
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
                let params: PlaylistTracksParams =
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
        let json = r#"{"playlist_id": "p.1"}"#;
        let params: PlaylistTracksParams = serde_json::from_str(json).unwrap();
        assert_eq!(params.limit, 10);
        assert_eq!(params.offset, 0);
    }
}
