//! Developer token cache with single-flight regeneration.
//!
//! The provider wraps a minter so that a still-valid token is reused and
//! concurrent regeneration collapses into one in-flight mint whose result
//! every waiter observes.

use std::sync::{Arc, Mutex, PoisonError};

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::Utc;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use tracing::{debug, warn};

use super::developer_token::{DeveloperToken, MintDeveloperToken, clamp_lifetime};
use super::error::AuthError;

/// A cached token expiring within this margin is treated as stale.
pub const EXPIRY_MARGIN_SECS: i64 = 300;

type SharedMint = Shared<BoxFuture<'static, Result<DeveloperToken, AuthError>>>;

struct ProviderState {
    cached: Option<DeveloperToken>,
    in_flight: Option<SharedMint>,
}

/// Caching, single-flight provider of the current developer token.
pub struct DeveloperTokenProvider {
    minter: Arc<dyn MintDeveloperToken>,
    lifetime_secs: i64,
    state: Mutex<ProviderState>,
}

impl DeveloperTokenProvider {
    /// Create a provider minting tokens with the given lifetime.
    pub fn new(minter: Arc<dyn MintDeveloperToken>, lifetime_secs: i64) -> Self {
        Self {
            minter,
            lifetime_secs: clamp_lifetime(lifetime_secs),
            state: Mutex::new(ProviderState {
                cached: None,
                in_flight: None,
            }),
        }
    }

    /// Get the current developer token.
    ///
    /// Returns the cached token when its expiry is more than
    /// [`EXPIRY_MARGIN_SECS`] in the future. Otherwise joins the in-flight
    /// mint if one exists, or starts a new one. A failed mint propagates to
    /// every waiter and leaves no partial state.
    pub async fn current(&self) -> Result<DeveloperToken, AuthError> {
        let mint = {
            let mut state = self.lock_state();

            if let Some(token) = &state.cached {
                if token.expires_at - Utc::now().timestamp() > EXPIRY_MARGIN_SECS {
                    return Ok(token.clone());
                }
            }

            match &state.in_flight {
                Some(mint) => mint.clone(),
                None => {
                    debug!("Minting a new developer token");
                    let minter = Arc::clone(&self.minter);
                    let lifetime = self.lifetime_secs;
                    let mint: SharedMint = async move {
                        let minted = minter.mint(lifetime)?;
                        // Trust the token's own exp claim when it parses;
                        // fall back to the computed expiry otherwise.
                        let expires_at =
                            parse_expiry_claim(&minted.token).unwrap_or(minted.expires_at);
                        Ok(DeveloperToken {
                            token: minted.token,
                            expires_at,
                        })
                    }
                    .boxed()
                    .shared();
                    state.in_flight = Some(mint.clone());
                    mint
                }
            }
        };

        let result = mint.clone().await;

        // The first waiter through clears the slot; success also refreshes
        // the cache. The slot is cleared on the error path too, so a failed
        // mint never wedges subsequent calls.
        let mut state = self.lock_state();
        if state.in_flight.as_ref().is_some_and(|f| f.ptr_eq(&mint)) {
            state.in_flight = None;
            match &result {
                Ok(token) => state.cached = Some(token.clone()),
                Err(e) => warn!("Developer token mint failed: {e}"),
            }
        }

        result
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, ProviderState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Extract the `exp` claim from a JWT without verifying the signature.
///
/// Only used to key the cache; validity is the upstream API's concern.
fn parse_expiry_claim(token: &str) -> Option<i64> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload).ok()?;
    let claims: serde_json::Value = serde_json::from_slice(&bytes).ok()?;
    claims.get("exp")?.as_i64()
}
