//! Shared application context.
//!
//! The auth stores and the API client are constructed once at process
//! start and handed to every handler, so tests can substitute their own
//! instances without touching call sites.

use std::sync::Arc;

use super::config::{AppleCredentialsConfig, Config};
use crate::domains::auth::{
    AuthFlowService, AuthError, DeveloperToken, DeveloperTokenMinter, DeveloperTokenProvider,
    MintDeveloperToken, UserTokenStore,
};
use crate::domains::music::MusicApiClient;

/// Minter that resolves the signing identity from configuration on each
/// mint, so missing credentials surface when a token is actually needed
/// rather than at startup.
struct ConfiguredMinter {
    apple: AppleCredentialsConfig,
}

impl MintDeveloperToken for ConfiguredMinter {
    fn mint(&self, lifetime_secs: i64) -> Result<DeveloperToken, AuthError> {
        let identity = self.apple.signing_identity()?;
        DeveloperTokenMinter::new(&identity)?.mint(lifetime_secs)
    }
}

/// Long-lived state shared by every tool invocation and HTTP handler.
pub struct AppContext {
    pub config: Arc<Config>,
    pub developer_tokens: Arc<DeveloperTokenProvider>,
    pub user_tokens: Arc<UserTokenStore>,
    pub oauth: Arc<AuthFlowService>,
    pub music: MusicApiClient,
}

impl AppContext {
    pub fn new(config: Arc<Config>) -> Arc<Self> {
        let minter = Arc::new(ConfiguredMinter {
            apple: config.apple.clone(),
        });
        let developer_tokens = Arc::new(DeveloperTokenProvider::new(
            minter,
            config.apple.token_ttl_secs(),
        ));

        let user_tokens = Arc::new(UserTokenStore::new());
        // A statically configured user token acts as the initial pending
        // credential, so stdio deployments work without the handshake.
        if let Some(token) = &config.apple.music_user_token {
            user_tokens.set_pending(token);
        }

        let oauth = Arc::new(AuthFlowService::new(
            config.oauth.mode,
            Arc::clone(&user_tokens),
        ));

        let music = MusicApiClient::new(
            config.music.base_url.clone(),
            config.music.storefront.clone(),
            Arc::clone(&developer_tokens),
        );

        Arc::new(Self {
            config,
            developer_tokens,
            user_tokens,
            oauth,
            music,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_user_token_seeds_pending_slot() {
        let mut config = Config::default();
        config.apple.music_user_token = Some("static-token".to_string());
        let ctx = AppContext::new(Arc::new(config));
        assert_eq!(ctx.user_tokens.pending().as_deref(), Some("static-token"));
    }

    #[tokio::test]
    async fn test_unconfigured_credentials_fail_at_mint_time() {
        let ctx = AppContext::new(Arc::new(Config::default()));
        let err = ctx.developer_tokens.current().await.unwrap_err();
        assert!(matches!(err, AuthError::Configuration(_)));
    }
}
