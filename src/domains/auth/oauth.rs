//! Authorization handshake: authorize -> browser grant -> callback -> token
//! exchange.
//!
//! Each handshake attempt is tracked as a pending-state entry keyed by the
//! caller's `state` parameter, consumed exactly once by the callback. A
//! periodic background sweep evicts entries the callback never claimed.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use super::error::AuthError;
use super::session::UserTokenStore;

/// How long an authorize step may sit before its callback arrives.
pub const STATE_TTL_SECS: i64 = 600;

/// How long an issued exchange code stays redeemable.
pub const CODE_TTL_SECS: i64 = 600;

/// Advisory `expires_in` hint returned by the token endpoint. Music User
/// Tokens carry no client-visible expiry, so this is not enforced.
pub const ADVISORY_EXPIRES_IN_SECS: i64 = 180 * 24 * 60 * 60;

/// Scope advertised in discovery metadata and token responses.
pub const SCOPE: &str = "music.library";

/// How the token exchange represents the user credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OauthMode {
    /// The exchange code and access token are the Music User Token itself.
    /// No server-side mapping is kept.
    Stateless,

    /// The code and access token are opaque identifiers; the real token is
    /// bound into the user token store under a minted session id.
    Session,
}

#[derive(Debug, Clone)]
struct PendingAuthorization {
    redirect_uri: String,
    expires_at: i64,
}

#[derive(Debug, Clone)]
struct IssuedCode {
    token: String,
    expires_at: i64,
}

#[derive(Debug, Default)]
struct FlowState {
    pending: HashMap<String, PendingAuthorization>,
    codes: HashMap<String, IssuedCode>,
}

/// Redirect issued to the original caller after a successful callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackRedirect {
    pub location: String,
}

/// Successful token exchange payload.
#[derive(Debug, Clone, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    pub scope: &'static str,
}

/// Drives the redirect-based handshake and the token exchange.
pub struct AuthFlowService {
    mode: OauthMode,
    user_tokens: Arc<UserTokenStore>,
    state: Mutex<FlowState>,
}

impl AuthFlowService {
    pub fn new(mode: OauthMode, user_tokens: Arc<UserTokenStore>) -> Self {
        Self {
            mode,
            user_tokens,
            state: Mutex::new(FlowState::default()),
        }
    }

    pub fn mode(&self) -> OauthMode {
        self.mode
    }

    /// Record the start of a handshake attempt.
    pub fn begin_authorize(&self, state: &str, redirect_uri: &str) -> Result<(), AuthError> {
        if state.is_empty() {
            return Err(AuthError::MissingParameter("state"));
        }
        if redirect_uri.is_empty() {
            return Err(AuthError::MissingParameter("redirect_uri"));
        }

        let mut flow = self.lock();
        flow.pending.insert(
            state.to_string(),
            PendingAuthorization {
                redirect_uri: redirect_uri.to_string(),
                expires_at: Utc::now().timestamp() + STATE_TTL_SECS,
            },
        );
        debug!("Authorization started (pending states: {})", flow.pending.len());
        Ok(())
    }

    /// Consume a callback carrying the browser-obtained Music User Token.
    ///
    /// The state entry is deleted together with successful consumption, so
    /// replaying the same state fails with [`AuthError::InvalidState`].
    pub fn complete_callback(
        &self,
        state: &str,
        music_user_token: &str,
    ) -> Result<CallbackRedirect, AuthError> {
        if state.is_empty() {
            return Err(AuthError::MissingParameter("state"));
        }
        if music_user_token.is_empty() {
            return Err(AuthError::MissingParameter("music_user_token"));
        }

        let (redirect_uri, code) = {
            let mut flow = self.lock();
            let pending = flow.pending.remove(state).ok_or(AuthError::InvalidState)?;
            if pending.expires_at <= Utc::now().timestamp() {
                return Err(AuthError::InvalidState);
            }

            let code = match self.mode {
                OauthMode::Stateless => music_user_token.to_string(),
                OauthMode::Session => {
                    let code = Uuid::new_v4().to_string();
                    flow.codes.insert(
                        code.clone(),
                        IssuedCode {
                            token: music_user_token.to_string(),
                            expires_at: Utc::now().timestamp() + CODE_TTL_SECS,
                        },
                    );
                    code
                }
            };
            (pending.redirect_uri, code)
        };

        info!("Authorization callback accepted");
        let query = serde_urlencoded::to_string([("code", code.as_str()), ("state", state)])
            .map_err(|_| AuthError::InvalidState)?;
        let separator = if redirect_uri.contains('?') { '&' } else { '?' };
        Ok(CallbackRedirect {
            location: format!("{redirect_uri}{separator}{query}"),
        })
    }

    /// Exchange an authorization code for a bearer access token.
    pub fn exchange(&self, grant_type: &str, code: &str) -> Result<TokenResponse, AuthError> {
        if grant_type != "authorization_code" {
            return Err(AuthError::UnsupportedGrantType(grant_type.to_string()));
        }
        if code.is_empty() {
            return Err(AuthError::MissingParameter("code"));
        }

        let access_token = match self.mode {
            // The code already is the Music User Token.
            OauthMode::Stateless => code.to_string(),
            OauthMode::Session => {
                let issued = {
                    let mut flow = self.lock();
                    flow.codes.remove(code).ok_or(AuthError::UnknownCode)?
                };
                if issued.expires_at <= Utc::now().timestamp() {
                    return Err(AuthError::UnknownCode);
                }
                let session_id = Uuid::new_v4().to_string();
                self.user_tokens.put(&session_id, &issued.token, None);
                session_id
            }
        };

        info!("Token exchange completed");
        Ok(TokenResponse {
            access_token,
            token_type: "Bearer",
            expires_in: ADVISORY_EXPIRES_IN_SECS,
            scope: SCOPE,
        })
    }

    /// Drop expired pending states and unredeemed codes.
    ///
    /// Deletion is idempotent, so racing a concurrent callback that
    /// consumes the same entry is harmless.
    pub fn sweep(&self) -> usize {
        let now = Utc::now().timestamp();
        let mut flow = self.lock();
        let before = flow.pending.len() + flow.codes.len();
        flow.pending.retain(|_, p| p.expires_at > now);
        flow.codes.retain(|_, c| c.expires_at > now);
        before - (flow.pending.len() + flow.codes.len())
    }

    /// Spawn the fire-and-forget background sweep.
    pub fn spawn_sweeper(self: &Arc<Self>, interval: Duration) -> tokio::task::JoinHandle<()> {
        let service = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let evicted = service.sweep();
                if evicted > 0 {
                    debug!("Swept {evicted} expired authorization entries");
                }
            }
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FlowState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(mode: OauthMode) -> (AuthFlowService, Arc<UserTokenStore>) {
        let store = Arc::new(UserTokenStore::new());
        (AuthFlowService::new(mode, Arc::clone(&store)), store)
    }

    #[test]
    fn test_stateless_handshake_happy_path() {
        let (service, _) = service(OauthMode::Stateless);
        service
            .begin_authorize("S", "http://localhost:4000/cb")
            .unwrap();

        let redirect = service.complete_callback("S", "MUT-1").unwrap();
        assert_eq!(redirect.location, "http://localhost:4000/cb?code=MUT-1&state=S");

        let response = service.exchange("authorization_code", "MUT-1").unwrap();
        assert_eq!(response.access_token, "MUT-1");
        assert_eq!(response.token_type, "Bearer");
    }

    #[test]
    fn test_callback_replay_fails() {
        let (service, _) = service(OauthMode::Stateless);
        service.begin_authorize("S", "http://x/cb").unwrap();
        service.complete_callback("S", "MUT-1").unwrap();

        assert!(matches!(
            service.complete_callback("S", "MUT-1"),
            Err(AuthError::InvalidState)
        ));
    }

    #[test]
    fn test_callback_unknown_state_fails() {
        let (service, _) = service(OauthMode::Stateless);
        assert!(matches!(
            service.complete_callback("nope", "MUT-1"),
            Err(AuthError::InvalidState)
        ));
    }

    #[test]
    fn test_callback_missing_parameters() {
        let (service, _) = service(OauthMode::Stateless);
        service.begin_authorize("S", "http://x/cb").unwrap();
        assert!(matches!(
            service.complete_callback("S", ""),
            Err(AuthError::MissingParameter("music_user_token"))
        ));
        // The failed callback must not have consumed the state.
        assert!(service.complete_callback("S", "MUT-1").is_ok());
    }

    #[test]
    fn test_redirect_preserves_existing_query() {
        let (service, _) = service(OauthMode::Stateless);
        service.begin_authorize("S", "http://x/cb?a=1").unwrap();
        let redirect = service.complete_callback("S", "MUT-1").unwrap();
        assert_eq!(redirect.location, "http://x/cb?a=1&code=MUT-1&state=S");
    }

    #[test]
    fn test_exchange_wrong_grant_type_touches_nothing() {
        let (service, store) = service(OauthMode::Session);
        service.begin_authorize("S", "http://x/cb").unwrap();
        service.complete_callback("S", "MUT-1").unwrap();

        assert!(matches!(
            service.exchange("client_credentials", "whatever"),
            Err(AuthError::UnsupportedGrantType(_))
        ));
        assert_eq!(store.pending(), None);
        assert_eq!(service.lock().codes.len(), 1);
    }

    #[test]
    fn test_session_mode_exchange_binds_token() {
        let (service, store) = service(OauthMode::Session);
        service.begin_authorize("S", "http://x/cb").unwrap();
        let redirect = service.complete_callback("S", "MUT-1").unwrap();

        // The code is opaque, not the token itself.
        let code = redirect
            .location
            .split("code=")
            .nth(1)
            .and_then(|rest| rest.split('&').next())
            .unwrap()
            .to_string();
        assert_ne!(code, "MUT-1");

        let response = service.exchange("authorization_code", &code).unwrap();
        assert_ne!(response.access_token, "MUT-1");
        assert_eq!(store.get(&response.access_token).as_deref(), Some("MUT-1"));

        // Codes redeem exactly once.
        assert!(matches!(
            service.exchange("authorization_code", &code),
            Err(AuthError::UnknownCode)
        ));
    }

    #[test]
    fn test_sweep_evicts_expired_entries() {
        let (service, _) = service(OauthMode::Session);
        service.begin_authorize("fresh", "http://x/cb").unwrap();
        {
            let mut flow = service.lock();
            flow.pending.insert(
                "stale".to_string(),
                PendingAuthorization {
                    redirect_uri: "http://x/cb".to_string(),
                    expires_at: Utc::now().timestamp() - 1,
                },
            );
        }

        assert_eq!(service.sweep(), 1);
        assert!(service.complete_callback("fresh", "MUT-1").is_ok());
        assert!(matches!(
            service.complete_callback("stale", "MUT-1"),
            Err(AuthError::InvalidState)
        ));
    }
}
