//! HTTP transport implementation.
//!
//! HTTP server with JSON-RPC over POST requests, plus the OAuth surface
//! used to hand Music User Tokens to the server: an authorization page
//! that loads MusicKit JS, a callback endpoint for the browser, a token
//! endpoint for the MCP client, and the well-known metadata documents
//! that let clients discover all of the above.

use axum::{
    Form, Json, Router,
    extract::{Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, instrument, warn};

use super::{TransportError, TransportResult, config::HttpConfig};
use crate::core::McpServer;
use crate::domains::auth::{AuthError, RequestCredentials, render_authorize_page, resolve_user_token};

/// Interval between sweeps of expired handshake state.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// HTTP transport handler.
pub struct HttpTransport {
    config: HttpConfig,
}

/// JSON-RPC request structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    pub method: String,
    #[serde(default)]
    pub params: Option<serde_json::Value>,
}

/// JSON-RPC response structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

/// JSON-RPC error structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl JsonRpcResponse {
    /// Create a success response.
    pub fn success(id: Option<serde_json::Value>, result: serde_json::Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response.
    pub fn error(id: Option<serde_json::Value>, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
                data: None,
            }),
        }
    }

    /// Method not found error.
    pub fn method_not_found(id: Option<serde_json::Value>) -> Self {
        Self::error(id, -32601, "Method not found")
    }

    /// Invalid request error.
    pub fn invalid_request(id: Option<serde_json::Value>) -> Self {
        Self::error(id, -32600, "Invalid Request")
    }

    /// Invalid params error.
    pub fn invalid_params(id: Option<serde_json::Value>, msg: impl Into<String>) -> Self {
        Self::error(id, -32602, msg)
    }
}

/// Application state shared across HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    /// The MCP server instance.
    server: McpServer,
}

impl HttpTransport {
    /// Create a new HTTP transport with the given config.
    pub fn new(config: HttpConfig) -> Self {
        Self { config }
    }

    /// Get the bind address.
    pub fn address(&self) -> String {
        format!("{}:{}", self.config.host, self.config.port)
    }

    /// Run the HTTP transport.
    pub async fn run(self, server: McpServer) -> TransportResult<()> {
        let addr = self.address();

        let _sweeper = server.context().oauth.spawn_sweeper(SWEEP_INTERVAL);

        let state = AppState { server };

        let mut app = Router::new()
            .route(&self.config.rpc_path, post(handle_rpc))
            .route("/oauth/authorize", get(oauth_authorize))
            .route("/oauth/callback", post(oauth_callback))
            .route("/oauth/token", post(oauth_token))
            .route(
                "/.well-known/oauth-authorization-server",
                get(authorization_server_metadata),
            )
            .route(
                "/.well-known/oauth-protected-resource",
                get(protected_resource_metadata),
            )
            .route("/health", get(health_check))
            .route("/", get(root_handler))
            .with_state(state);

        if self.config.enable_cors {
            let cors = CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any);
            app = app.layer(cors);
        }

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| TransportError::bind(&addr, e))?;

        let cors_status = if self.config.enable_cors {
            "enabled"
        } else {
            "disabled"
        };
        info!(
            "Ready - listening on {} (JSON-RPC over HTTP, CORS {})",
            addr, cors_status
        );
        info!("  → JSON-RPC:  POST {}", self.config.rpc_path);
        info!("  → Authorize: GET  /oauth/authorize");
        info!("  → Token:     POST /oauth/token");
        info!("  → Health:    GET  /health");

        axum::serve(listener, app)
            .await
            .map_err(|e| TransportError::http(e.to_string()))?;

        Ok(())
    }
}

/// Root handler - provides API info.
async fn root_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "name": state.server.name(),
        "version": state.server.version(),
        "transport": "HTTP",
        "endpoints": {
            "rpc": "/mcp",
            "authorize": "/oauth/authorize",
            "token": "/oauth/token",
            "health": "/health"
        },
        "protocol": "JSON-RPC 2.0"
    }))
}

/// Health check endpoint.
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Handle JSON-RPC requests.
///
/// Credentials are read fresh from the headers of every request, so two
/// clients with different Music User Tokens can share one server.
#[instrument(skip_all, fields(method))]
async fn handle_rpc(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<JsonRpcRequest>,
) -> Response {
    tracing::Span::current().record("method", &request.method);
    info!("Received JSON-RPC request: {}", request.method);

    let creds = RequestCredentials::from_headers(&headers);

    let oauth_cfg = &state.server.context().config.oauth;
    if oauth_cfg.require_authorization
        && request.method == "tools/call"
        && resolve_user_token(&state.server.context().user_tokens, &creds).is_none()
    {
        return unauthorized_challenge(&oauth_cfg.public_base_url);
    }

    let response = process_request(&state, request, &creds).await;

    (StatusCode::OK, Json(response)).into_response()
}

/// Build a 401 response pointing at the protected-resource metadata.
fn unauthorized_challenge(public_base_url: &str) -> Response {
    let challenge = format!(
        "Bearer resource_metadata=\"{public_base_url}/.well-known/oauth-protected-resource\""
    );
    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, challenge)],
        Json(serde_json::json!({
            "error": "unauthorized",
            "error_description": "Music User Token required"
        })),
    )
        .into_response()
}

/// Process a JSON-RPC request and return the response.
async fn process_request(
    state: &AppState,
    request: JsonRpcRequest,
    creds: &RequestCredentials,
) -> JsonRpcResponse {
    if request.jsonrpc != "2.0" {
        return JsonRpcResponse::invalid_request(request.id);
    }

    match request.method.as_str() {
        "initialize" => handle_initialize(state, request),

        "tools/list" => handle_tools_list(state, request),

        "tools/call" => handle_tools_call(state, request, creds).await,

        // Notifications need no response in stateless HTTP mode.
        method if method.starts_with("notifications/") => {
            info!("Received notification: {}", method);
            JsonRpcResponse::success(request.id, serde_json::json!(null))
        }

        _ => {
            warn!("Unknown method: {}", request.method);
            JsonRpcResponse::method_not_found(request.id)
        }
    }
}

/// Handle initialize request.
fn handle_initialize(state: &AppState, request: JsonRpcRequest) -> JsonRpcResponse {
    info!("Processing initialize request");

    let result = serde_json::json!({
        "protocolVersion": "2024-11-05",
        "capabilities": {
            "tools": {}
        },
        "serverInfo": {
            "name": state.server.name(),
            "version": state.server.version()
        },
        "instructions": "Apple Music MCP server. User-scoped tools need a Music User Token; start at GET /oauth/authorize to obtain one."
    });

    JsonRpcResponse::success(request.id, result)
}

/// Handle tools/list request.
fn handle_tools_list(state: &AppState, request: JsonRpcRequest) -> JsonRpcResponse {
    info!("Processing tools/list request");

    let tools = state.server.list_tools();
    JsonRpcResponse::success(request.id, serde_json::json!({ "tools": tools }))
}

/// Handle tools/call request.
async fn handle_tools_call(
    state: &AppState,
    request: JsonRpcRequest,
    creds: &RequestCredentials,
) -> JsonRpcResponse {
    info!("Processing tools/call request");

    let params = match request.params {
        Some(p) => p,
        None => return JsonRpcResponse::invalid_params(request.id.clone(), "Missing params"),
    };

    let name = match params.get("name").and_then(|v| v.as_str()) {
        Some(n) => n.to_string(),
        None => return JsonRpcResponse::invalid_params(request.id.clone(), "Missing tool name"),
    };

    let arguments = params
        .get("arguments")
        .cloned()
        .unwrap_or(serde_json::json!({}));

    match state.server.call_tool(&name, arguments, creds).await {
        Ok(result) => JsonRpcResponse::success(request.id, result),
        Err(e) => JsonRpcResponse::invalid_params(request.id, e),
    }
}

// ============================================================================
// OAuth handshake surface
// ============================================================================

#[derive(Debug, Deserialize)]
struct AuthorizeQuery {
    #[serde(default)]
    state: String,
    #[serde(default)]
    redirect_uri: String,
}

#[derive(Debug, Deserialize)]
struct CallbackForm {
    #[serde(default)]
    state: String,
    #[serde(default)]
    music_user_token: String,
}

#[derive(Debug, Deserialize)]
struct TokenForm {
    #[serde(default)]
    grant_type: String,
    #[serde(default)]
    code: String,
}

/// Serve the authorization page that runs MusicKit JS in the browser.
///
/// Minting can fail when Apple credentials are absent, so the page is
/// only rendered once a developer token is in hand.
async fn oauth_authorize(
    State(state): State<AppState>,
    Query(query): Query<AuthorizeQuery>,
) -> Response {
    let ctx = state.server.context();

    if let Err(e) = ctx.oauth.begin_authorize(&query.state, &query.redirect_uri) {
        return oauth_error_response(e);
    }

    match ctx.developer_tokens.current().await {
        Ok(token) => Html(render_authorize_page(
            &token.token,
            &query.state,
            &query.redirect_uri,
        ))
        .into_response(),
        Err(e) => {
            warn!("Developer token unavailable for authorize page: {e}");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({
                    "error": "temporarily_unavailable",
                    "error_description": e.to_string()
                })),
            )
                .into_response()
        }
    }
}

/// Accept the Music User Token posted by the authorization page.
async fn oauth_callback(
    State(state): State<AppState>,
    Form(form): Form<CallbackForm>,
) -> Response {
    let ctx = state.server.context();

    match ctx
        .oauth
        .complete_callback(&form.state, &form.music_user_token)
    {
        Ok(redirect) => Redirect::to(&redirect.location).into_response(),
        Err(e) => oauth_error_response(e),
    }
}

/// Exchange an authorization code for an access token.
async fn oauth_token(State(state): State<AppState>, Form(form): Form<TokenForm>) -> Response {
    let ctx = state.server.context();

    match ctx.oauth.exchange(&form.grant_type, &form.code) {
        Ok(token) => Json(token).into_response(),
        Err(e) => oauth_error_response(e),
    }
}

/// Map handshake failures onto RFC 6749 error responses.
fn oauth_error_response(error: AuthError) -> Response {
    let (status, code) = match &error {
        AuthError::MissingParameter(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
        AuthError::InvalidState | AuthError::UnknownCode => {
            (StatusCode::BAD_REQUEST, "invalid_grant")
        }
        AuthError::UnsupportedGrantType(_) => (StatusCode::BAD_REQUEST, "unsupported_grant_type"),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "server_error"),
    };
    if !error.is_client_error() {
        warn!("OAuth handshake failed: {error}");
    }
    (
        status,
        Json(serde_json::json!({
            "error": code,
            "error_description": error.to_string()
        })),
    )
        .into_response()
}

/// RFC 8414 authorization server metadata.
async fn authorization_server_metadata(State(state): State<AppState>) -> impl IntoResponse {
    let base = state.server.context().config.oauth.public_base_url.clone();
    Json(serde_json::json!({
        "issuer": base,
        "authorization_endpoint": format!("{base}/oauth/authorize"),
        "token_endpoint": format!("{base}/oauth/token"),
        "response_types_supported": ["code"],
        "grant_types_supported": ["authorization_code"],
        "token_endpoint_auth_methods_supported": ["none"],
        "scopes_supported": ["music.library"]
    }))
}

/// RFC 9728 protected resource metadata.
async fn protected_resource_metadata(State(state): State<AppState>) -> impl IntoResponse {
    let base = state.server.context().config.oauth.public_base_url.clone();
    Json(serde_json::json!({
        "resource": base,
        "authorization_servers": [base],
        "bearer_methods_supported": ["header"]
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Config;

    fn state_requiring_authorization() -> AppState {
        let mut config = Config::default();
        config.oauth.require_authorization = true;
        AppState {
            server: McpServer::new(config),
        }
    }

    fn tool_call(name: &str) -> JsonRpcRequest {
        JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            id: Some(serde_json::json!(1)),
            method: "tools/call".to_string(),
            params: Some(serde_json::json!({ "name": name, "arguments": {} })),
        }
    }

    #[tokio::test]
    async fn test_unauthenticated_tool_call_gets_bearer_challenge() {
        let state = state_requiring_authorization();

        let response = handle_rpc(
            State(state),
            HeaderMap::new(),
            Json(tool_call("am_library_list")),
        )
        .await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let challenge = response
            .headers()
            .get(header::WWW_AUTHENTICATE)
            .and_then(|v| v.to_str().ok())
            .unwrap();
        assert!(challenge.starts_with("Bearer resource_metadata="));
        assert!(challenge.contains("/.well-known/oauth-protected-resource"));
    }

    #[tokio::test]
    async fn test_bearer_passes_the_authorization_gate() {
        let state = state_requiring_authorization();
        let mut headers = HeaderMap::new();
        headers.insert("authorization", "Bearer MUT-1".parse().unwrap());

        // An unknown tool keeps dispatch local; the point is that the
        // request reaches dispatch instead of the 401 path.
        let response = handle_rpc(State(state), headers, Json(tool_call("unknown"))).await;

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_tools_list_is_not_gated() {
        let state = state_requiring_authorization();
        let request = JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            id: Some(serde_json::json!(2)),
            method: "tools/list".to_string(),
            params: None,
        };

        let response = handle_rpc(State(state), HeaderMap::new(), Json(request)).await;

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_jsonrpc_error_codes() {
        let resp = JsonRpcResponse::method_not_found(Some(serde_json::json!(1)));
        assert_eq!(resp.error.as_ref().map(|e| e.code), Some(-32601));

        let resp = JsonRpcResponse::invalid_request(None);
        assert_eq!(resp.error.as_ref().map(|e| e.code), Some(-32600));
    }

    #[test]
    fn test_success_response_skips_error() {
        let resp =
            JsonRpcResponse::success(Some(serde_json::json!(7)), serde_json::json!({"ok": true}));
        let encoded = serde_json::to_value(&resp).unwrap();
        assert!(encoded.get("error").is_none());
        assert_eq!(encoded["result"]["ok"], serde_json::json!(true));
    }
}
