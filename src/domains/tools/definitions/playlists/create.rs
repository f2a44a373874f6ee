//! Playlist creation tool.

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

use super::super::common::{api_error_result, structured_result};
use crate::core::context::AppContext;
use crate::domains::auth::{RequestCredentials, resolve_user_token};

/// Parameters for creating a library playlist.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct PlaylistCreateParams {
    /// Playlist name.
    #[schemars(description = "Name of the new playlist")]
    pub name: String,

    /// Optional description.
    #[schemars(description = "Playlist description")]
    #[serde(default)]
    pub description: Option<String>,

    /// Catalog song ids to seed the playlist with.
    #[schemars(description = "Catalog song ids to add on creation")]
    #[serde(default)]
    pub track_ids: Vec<String>,
}

/// Playlist creation tool implementation.
#[derive(Debug, Clone)]
pub struct PlaylistCreateTool;

impl PlaylistCreateTool {
    pub const NAME: &'static str = "am_playlist_create";

    pub const DESCRIPTION: &'static str = "Create a new playlist in the user's Apple Music library, optionally seeded with catalog songs. Requires user authorization.";

    pub async fn execute(
        ctx: &AppContext,
        creds: &RequestCredentials,
        params: &PlaylistCreateParams,
    ) -> CallToolResult {
        info!("Creating playlist '{}'", params.name);
        let user_token = resolve_user_token(&ctx.user_tokens, creds);

        let mut attributes = json!({ "name": params.name });
        if let Some(description) = &params.description {
            attributes["description"] = json!(description);
        }
        let mut body = json!({ "attributes": attributes });
        if !params.track_ids.is_empty() {
            body["relationships"] = json!({
                "tracks": { "data": track_data(&params.track_ids) }
            });
        }

        match ctx
            .music
            .user_post(
                "/v1/me/library/playlists",
                &[],
                Some(body),
                user_token.as_deref(),
            )
            .await
        {
            Ok(response) => {
                structured_result(format!("Created playlist '{}'", params.name), response)
            }
            Err(e) => api_error_result(&e),
        }
    }

    pub fn to_tool() -> Tool {
        Tool {
            name: Self::NAME.into(),
            description: Some(Self::DESCRIPTION.into()),
            input_schema: cached_schema_for_type::<PlaylistCreateParams>(),
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
                let params: PlaylistCreateParams =
                    serde_json::from_value(serde_json::Value::Object(args))
                        .map_err(|e| McpError::invalid_params(e.to_string(), None))?;
                Ok(Self::execute(&ctx, &RequestCredentials::default(), &params).await)
            }
            .boxed()
        })
    }
}

/// Build the `{id, type: "songs"}` entries a tracks relationship expects.
pub(super) fn track_data(track_ids: &[String]) -> Vec<serde_json::Value> {
    track_ids
        .iter()
        .map(|id| json!({ "id": id, "type": "songs" }))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_defaults() {
        let json = r#"{"name": "Road Trip"}"#;
        let params: PlaylistCreateParams = serde_json::from_str(json).unwrap();
        assert_eq!(params.name, "Road Trip");
        assert!(params.description.is_none());
        assert!(params.track_ids.is_empty());
    }

    #[test]
    fn test_track_data_shape() {
        let data = track_data(&["123".to_string(), "456".to_string()]);
        assert_eq!(data[0], json!({"id": "123", "type": "songs"}));
        assert_eq!(data.len(), 2);
    }
}
