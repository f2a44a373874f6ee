//! Append catalog songs to an existing playlist.

use std::sync::Arc;

use futures::FutureExt;
use rmcp::{
    ErrorData as McpError,
    handler::server::tool::{ToolCallContext, ToolRoute, cached_schema_for_type},
    model::{CallToolResult, Tool},
};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use super::super::common::{api_error_result, error_result, structured_result};
use super::create::track_data;
use crate::core::context::AppContext;
use crate::domains::auth::{RequestCredentials, resolve_user_token};

/// Parameters for appending tracks to a playlist.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct PlaylistAddTracksParams {
    /// Library playlist id (e.g. "p.ABC123").
    #[schemars(description = "Library playlist id to append to")]
    pub playlist_id: String,

    /// Catalog song ids to append.
    #[schemars(description = "Catalog song ids to append")]
    pub track_ids: Vec<String>,
}

/// Playlist track append tool implementation.
#[derive(Debug, Clone)]
pub struct PlaylistAddTracksTool;

impl PlaylistAddTracksTool {
    pub const NAME: &'static str = "am_playlist_add_tracks";

    pub const DESCRIPTION: &'static str = "Append catalog songs to an existing playlist in the user's library (use am_library_list with kind=playlists to find playlist ids). Requires user authorization.";

    pub async fn execute(
        ctx: &AppContext,
        creds: &RequestCredentials,
        params: &PlaylistAddTracksParams,
    ) -> CallToolResult {
        if params.track_ids.is_empty() {
            return error_result("track_ids must not be empty");
        }

        info!(
            "Appending {} track(s) to playlist {}",
            params.track_ids.len(),
            params.playlist_id
        );
        let user_token = resolve_user_token(&ctx.user_tokens, creds);
        let path = format!("/v1/me/library/playlists/{}/tracks", params.playlist_id);
        let body = json!({ "data": track_data(&params.track_ids) });

        match ctx
            .music
            .user_post(&path, &[], Some(body), user_token.as_deref())
            .await
        {
            Ok(_) => structured_result(
                format!(
                    "Appended {} track(s) to playlist {}",
                    params.track_ids.len(),
                    params.playlist_id
                ),
                json!({ "playlist_id": params.playlist_id, "tracks_added": params.track_ids }),
            ),
            Err(e) => api_error_result(&e),
        }
    }

    pub fn to_tool() -> Tool {
        Tool {
            name: Self::NAME.into(),
            description: Some(Self::DESCRIPTION.into()),
            input_schema: cached_schema_for_type::<PlaylistAddTracksParams>(),
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
                let params: PlaylistAddTracksParams =
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
    fn test_params_require_playlist_and_tracks() {
        assert!(serde_json::from_str::<PlaylistAddTracksParams>("{}").is_err());
        let json = r#"{"playlist_id": "p.1", "track_ids": ["123"]}"#;
        let params: PlaylistAddTracksParams = serde_json::from_str(json).unwrap();
        assert_eq!(params.playlist_id, "p.1");
    }

    #[tokio::test]
    async fn test_empty_track_ids_rejected_without_io() {
        let ctx = crate::core::context::AppContext::new(Arc::new(Default::default()));
        let params = PlaylistAddTracksParams {
            playlist_id: "p.1".to_string(),
            track_ids: vec![],
        };
        let result =
            PlaylistAddTracksTool::execute(&ctx, &RequestCredentials::default(), &params).await;
        assert!(result.is_error.unwrap_or(false));
    }
}
