//! Apple Music REST client.
//!
//! Thin parameter marshaling over `https://api.music.apple.com`. The
//! client's only contract logic is attaching the two credential headers:
//! `Authorization: Bearer <developer token>` on every request and
//! `Music-User-Token: <user token>` on user-scoped (`/v1/me/...`) requests.

use std::sync::Arc;

use reqwest::Method;
use serde_json::Value;
use tracing::debug;

use super::error::MusicError;
use crate::domains::auth::DeveloperTokenProvider;

/// Default API origin.
pub const DEFAULT_BASE_URL: &str = "https://api.music.apple.com";

/// Default storefront for catalog requests.
pub const DEFAULT_STOREFRONT: &str = "us";

/// Async client for the Apple Music API.
#[derive(Clone)]
pub struct MusicApiClient {
    http: reqwest::Client,
    base_url: String,
    storefront: String,
    developer_tokens: Arc<DeveloperTokenProvider>,
}

impl MusicApiClient {
    pub fn new(
        base_url: impl Into<String>,
        storefront: impl Into<String>,
        developer_tokens: Arc<DeveloperTokenProvider>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            storefront: storefront.into(),
            developer_tokens,
        }
    }

    /// Storefront used for catalog paths.
    pub fn storefront(&self) -> &str {
        &self.storefront
    }

    /// GET a catalog endpoint. Needs only the developer token.
    pub async fn catalog_get(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Value, MusicError> {
        self.send(Method::GET, path, query, None, None).await
    }

    /// GET a user-scoped endpoint. Fails with
    /// [`MusicError::MissingUserToken`] when no user token was resolved.
    pub async fn user_get(
        &self,
        path: &str,
        query: &[(&str, String)],
        user_token: Option<&str>,
    ) -> Result<Value, MusicError> {
        let user_token = user_token.ok_or(MusicError::MissingUserToken)?;
        self.send(Method::GET, path, query, None, Some(user_token))
            .await
    }

    /// POST to a user-scoped endpoint.
    pub async fn user_post(
        &self,
        path: &str,
        query: &[(&str, String)],
        body: Option<Value>,
        user_token: Option<&str>,
    ) -> Result<Value, MusicError> {
        let user_token = user_token.ok_or(MusicError::MissingUserToken)?;
        self.send(Method::POST, path, query, body, Some(user_token))
            .await
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<Value>,
        user_token: Option<&str>,
    ) -> Result<Value, MusicError> {
        let developer_token = self.developer_tokens.current().await?;
        let url = format!("{}{}", self.base_url, path);
        debug!("{} {}", method, url);

        let mut request = self
            .http
            .request(method, &url)
            .bearer_auth(&developer_token.token);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(user_token) = user_token {
            request = request.header("Music-User-Token", user_token);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(MusicError::upstream(status.as_u16(), text));
        }

        // 202/204 responses (library add, playlist track insert) have no body.
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::auth::AuthError;

    #[test]
    fn test_upstream_error_carries_status_and_body() {
        let err = MusicError::upstream(403, "Invalid authentication");
        assert_eq!(
            err.to_string(),
            "Apple Music API returned 403: Invalid authentication"
        );
    }

    #[tokio::test]
    async fn test_user_endpoints_require_user_token() {
        let minter = crate::domains::auth::DeveloperTokenMinter::new(
            &crate::domains::auth::developer_token::tests::test_identity(),
        )
        .unwrap();
        let provider = Arc::new(DeveloperTokenProvider::new(Arc::new(minter), 86_400));
        let client = MusicApiClient::new("http://127.0.0.1:0", "us", provider);

        // The absence is discovered here, before any network I/O.
        let err = client
            .user_get("/v1/me/library/songs", &[], None)
            .await
            .unwrap_err();
        assert!(matches!(err, MusicError::MissingUserToken));

        let err = client
            .user_post("/v1/me/library", &[], None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, MusicError::MissingUserToken));
    }

    #[test]
    fn test_auth_error_converts() {
        let err: MusicError = AuthError::configuration("missing key").into();
        assert!(err.to_string().contains("missing key"));
    }
}
