//! Authentication domain.
//!
//! Everything around the two credentials the Apple Music API wants:
//!
//! - `developer_token` / `provider` - minting and caching the service-level
//!   ES256 developer token, with single-flight regeneration
//! - `session` - per-session Music User Token storage
//! - `resolver` - per-request decision of which user token applies
//! - `oauth` - the browser handshake that obtains a user token
//! - `pages` - the static HTML served during that handshake

pub mod developer_token;
mod error;
pub mod oauth;
pub mod pages;
pub mod provider;
pub mod resolver;
pub mod session;

pub use developer_token::{
    DEFAULT_LIFETIME_SECS, DeveloperToken, DeveloperTokenMinter, MintDeveloperToken,
    SigningIdentity, clamp_lifetime,
};
pub use error::AuthError;
pub use oauth::{AuthFlowService, OauthMode, TokenResponse};
pub use pages::render_authorize_page;
pub use provider::DeveloperTokenProvider;
pub use resolver::{RequestCredentials, resolve_user_token};
pub use session::UserTokenStore;
