//! Request-time user credential resolution.
//!
//! For every inbound tool invocation this decides which Music User Token
//! applies. Resolution is a pure lookup over in-memory state: it never
//! blocks and never performs I/O.

use super::session::UserTokenStore;

/// Credentials carried by a single inbound request.
#[derive(Debug, Clone, Default)]
pub struct RequestCredentials {
    /// Explicit bearer credential from a request header, if any.
    pub bearer: Option<String>,

    /// Opaque session id supplied by the transport, if any.
    pub session_id: Option<String>,
}

impl RequestCredentials {
    /// Extract credentials from HTTP request headers.
    ///
    /// Several header spellings are accepted for compatibility with
    /// different MCP front-ends.
    #[cfg(feature = "http")]
    pub fn from_headers(headers: &axum::http::HeaderMap) -> Self {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let bearer = header("authorization")
            .and_then(|v| {
                v.strip_prefix("Bearer ")
                    .or_else(|| v.strip_prefix("bearer "))
                    .map(|t| t.trim().to_string())
            })
            .or_else(|| header("x-music-user-token"))
            .or_else(|| header("music-user-token"));

        Self {
            bearer,
            session_id: header("mcp-session-id"),
        }
    }
}

/// Resolve the user token that applies to this request, in priority order:
/// explicit bearer, then a previously bound session token, then the
/// pending (not yet session-bound) token.
///
/// A bearer that matches a session id with a bound record is an access
/// token from the session-mode token exchange and resolves to the bound
/// token. Any other bearer is the raw Music User Token: it is bound under
/// the request's session id when one is present and held as the pending
/// token either way, so a later request on the same session (or none) need
/// not resend it.
pub fn resolve_user_token(store: &UserTokenStore, creds: &RequestCredentials) -> Option<String> {
    if let Some(bearer) = &creds.bearer {
        if let Some(bound) = store.get(bearer) {
            // The resolved credential is bound under the request's own
            // session id too, so later requests on that session can drop
            // the bearer.
            if let Some(session_id) = &creds.session_id {
                store.put(session_id, &bound, None);
            }
            return Some(bound);
        }
        if let Some(session_id) = &creds.session_id {
            store.put(session_id, bearer, None);
        }
        store.set_pending(bearer);
        return Some(bearer.clone());
    }

    if let Some(session_id) = &creds.session_id {
        if let Some(bound) = store.get(session_id) {
            return Some(bound);
        }
        if let Some(pending) = store.pending() {
            store.put(session_id, &pending, None);
            return Some(pending);
        }
        return None;
    }

    store.pending()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds(bearer: Option<&str>, session_id: Option<&str>) -> RequestCredentials {
        RequestCredentials {
            bearer: bearer.map(String::from),
            session_id: session_id.map(String::from),
        }
    }

    #[test]
    fn test_bearer_takes_precedence_and_binds_session() {
        let store = UserTokenStore::new();
        store.put("s1", "old-token", None);

        let resolved = resolve_user_token(&store, &creds(Some("u1"), Some("s1")));
        assert_eq!(resolved.as_deref(), Some("u1"));

        // The follow-up request carries only the session id.
        let resolved = resolve_user_token(&store, &creds(None, Some("s1")));
        assert_eq!(resolved.as_deref(), Some("u1"));
    }

    #[test]
    fn test_bearer_without_session_becomes_pending() {
        let store = UserTokenStore::new();
        assert_eq!(
            resolve_user_token(&store, &creds(Some("u1"), None)).as_deref(),
            Some("u1")
        );

        // The pending token is bound the moment a session id appears.
        assert_eq!(
            resolve_user_token(&store, &creds(None, Some("s1"))).as_deref(),
            Some("u1")
        );
        assert_eq!(store.get("s1").as_deref(), Some("u1"));
    }

    #[test]
    fn test_session_mode_access_token_resolves_to_bound_token() {
        let store = UserTokenStore::new();
        // Token exchange bound the real token under a minted session id
        // that the client now presents as its bearer.
        store.put("minted-session", "real-token", None);

        let resolved = resolve_user_token(&store, &creds(Some("minted-session"), None));
        assert_eq!(resolved.as_deref(), Some("real-token"));
    }

    #[test]
    fn test_access_token_bearer_binds_presented_session() {
        let store = UserTokenStore::new();
        store.put("minted-session", "real-token", None);

        // Request 1 carries the exchange-issued access token plus the
        // transport's session id.
        let resolved = resolve_user_token(&store, &creds(Some("minted-session"), Some("s1")));
        assert_eq!(resolved.as_deref(), Some("real-token"));

        // Request 2 carries only the session id and must still resolve.
        let resolved = resolve_user_token(&store, &creds(None, Some("s1")));
        assert_eq!(resolved.as_deref(), Some("real-token"));
        assert_eq!(store.get("s1").as_deref(), Some("real-token"));
    }

    #[test]
    fn test_unauthenticated_request_resolves_to_none() {
        let store = UserTokenStore::new();
        assert_eq!(resolve_user_token(&store, &creds(None, None)), None);
        assert_eq!(resolve_user_token(&store, &creds(None, Some("s1"))), None);
    }

    #[cfg(feature = "http")]
    #[test]
    fn test_from_headers_spellings() {
        use axum::http::HeaderMap;

        let mut headers = HeaderMap::new();
        headers.insert("authorization", "Bearer abc".parse().unwrap());
        headers.insert("mcp-session-id", "s9".parse().unwrap());
        let creds = RequestCredentials::from_headers(&headers);
        assert_eq!(creds.bearer.as_deref(), Some("abc"));
        assert_eq!(creds.session_id.as_deref(), Some("s9"));

        let mut headers = HeaderMap::new();
        headers.insert("x-music-user-token", "xyz".parse().unwrap());
        let creds = RequestCredentials::from_headers(&headers);
        assert_eq!(creds.bearer.as_deref(), Some("xyz"));
        assert_eq!(creds.session_id, None);
    }
}
