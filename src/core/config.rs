//! Configuration management for the MCP server.
//!
//! This module provides a centralized configuration structure that can be
//! populated from environment variables, configuration files, or defaults.

use super::transport::TransportConfig;
use crate::domains::auth::{AuthError, DEFAULT_LIFETIME_SECS, OauthMode, SigningIdentity};
use crate::domains::music::{DEFAULT_BASE_URL, DEFAULT_STOREFRONT};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{info, warn};

/// Main configuration structure for the MCP server.
///
/// This struct contains all configurable aspects of the server, organized
/// by domain for clarity and maintainability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server identification and metadata.
    pub server: ServerConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,

    /// Transport configuration.
    pub transport: TransportConfig,

    /// Apple developer credentials for developer token minting.
    pub apple: AppleCredentialsConfig,

    /// Apple Music API endpoint configuration.
    pub music: MusicApiConfig,

    /// OAuth handshake configuration (HTTP transport only).
    pub oauth: OauthConfig,
}

/// Server identification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The name of the server as reported to clients.
    pub name: String,

    /// The version of the server.
    pub version: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "trace").
    pub level: String,

    /// Whether to include timestamps in log output.
    pub with_timestamps: bool,
}

/// Apple developer credentials.
///
/// The private key is the MusicKit `.p8` key from the developer portal,
/// supplied either inline or as a file path.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct AppleCredentialsConfig {
    /// Apple developer team id (`iss` claim of the developer token).
    pub team_id: Option<String>,

    /// MusicKit key id (`kid` header of the developer token).
    pub key_id: Option<String>,

    /// PKCS#8 PEM private key contents.
    pub private_key: Option<String>,

    /// Path to the PKCS#8 PEM private key file.
    pub private_key_path: Option<PathBuf>,

    /// Developer token lifetime override in seconds. Clamped at mint time.
    pub token_ttl_secs: Option<i64>,

    /// Static Music User Token for deployments without the browser
    /// handshake (seeded into the pending slot at startup).
    pub music_user_token: Option<String>,
}

/// Custom Debug implementation to redact secrets from logs.
impl std::fmt::Debug for AppleCredentialsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppleCredentialsConfig")
            .field("team_id", &self.team_id)
            .field("key_id", &self.key_id)
            .field("private_key", &self.private_key.as_ref().map(|_| "[REDACTED]"))
            .field("private_key_path", &self.private_key_path)
            .field("token_ttl_secs", &self.token_ttl_secs)
            .field(
                "music_user_token",
                &self.music_user_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl AppleCredentialsConfig {
    /// Developer token lifetime, falling back to the default.
    pub fn token_ttl_secs(&self) -> i64 {
        self.token_ttl_secs.unwrap_or(DEFAULT_LIFETIME_SECS)
    }

    /// Resolve the signing identity, reading the key file if needed.
    pub fn signing_identity(&self) -> Result<SigningIdentity, AuthError> {
        let team_id = self
            .team_id
            .clone()
            .ok_or_else(|| AuthError::configuration("APPLE_TEAM_ID is not set"))?;
        let key_id = self
            .key_id
            .clone()
            .ok_or_else(|| AuthError::configuration("APPLE_KEY_ID is not set"))?;

        let private_key_pem = match (&self.private_key, &self.private_key_path) {
            (Some(pem), _) => pem.clone(),
            (None, Some(path)) => std::fs::read_to_string(path).map_err(|e| {
                AuthError::configuration(format!("cannot read {}: {e}", path.display()))
            })?,
            (None, None) => {
                return Err(AuthError::configuration(
                    "set APPLE_PRIVATE_KEY or APPLE_PRIVATE_KEY_PATH",
                ));
            }
        };

        Ok(SigningIdentity {
            team_id,
            key_id,
            private_key_pem,
        })
    }
}

/// Apple Music API endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MusicApiConfig {
    /// API origin, overridable for testing.
    pub base_url: String,

    /// Storefront for catalog requests (e.g. "us", "fr").
    pub storefront: String,
}

impl Default for MusicApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            storefront: DEFAULT_STOREFRONT.to_string(),
        }
    }
}

/// OAuth handshake configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OauthConfig {
    /// How the token exchange represents the user credential.
    pub mode: OauthMode,

    /// Public base URL advertised in discovery documents and challenges.
    pub public_base_url: String,

    /// Whether unauthenticated MCP requests get a 401 challenge pointing
    /// at the discovery documents.
    pub require_authorization: bool,
}

impl Default for OauthConfig {
    fn default() -> Self {
        Self {
            mode: OauthMode::Stateless,
            public_base_url: "http://127.0.0.1:8080".to_string(),
            require_authorization: false,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                name: "apple-music-mcp".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                with_timestamps: true,
            },
            transport: TransportConfig::default(),
            apple: AppleCredentialsConfig::default(),
            music: MusicApiConfig::default(),
            oauth: OauthConfig::default(),
        }
    }
}

impl Config {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        if let Ok(name) = std::env::var("MCP_SERVER_NAME") {
            config.server.name = name;
        }

        if let Ok(level) = std::env::var("MCP_LOG_LEVEL") {
            config.logging.level = level;
        }

        config.transport = TransportConfig::from_env();

        if let Ok(team_id) = std::env::var("APPLE_TEAM_ID") {
            config.apple.team_id = Some(team_id);
        }
        if let Ok(key_id) = std::env::var("APPLE_KEY_ID") {
            config.apple.key_id = Some(key_id);
        }
        if let Ok(key) = std::env::var("APPLE_PRIVATE_KEY") {
            // Env files often store the PEM with literal \n sequences.
            config.apple.private_key = Some(key.replace("\\n", "\n"));
        }
        if let Ok(path) = std::env::var("APPLE_PRIVATE_KEY_PATH") {
            config.apple.private_key_path = Some(PathBuf::from(path));
        }
        if let Ok(ttl) = std::env::var("APPLE_TOKEN_TTL_SECS") {
            match ttl.parse() {
                Ok(ttl) => config.apple.token_ttl_secs = Some(ttl),
                Err(_) => warn!("Ignoring unparseable APPLE_TOKEN_TTL_SECS: {ttl}"),
            }
        }
        if let Ok(token) = std::env::var("MUSIC_USER_TOKEN") {
            config.apple.music_user_token = Some(token);
            info!("Static Music User Token loaded from environment");
        }

        if let Ok(storefront) = std::env::var("APPLE_MUSIC_STOREFRONT") {
            config.music.storefront = storefront;
        }
        if let Ok(base_url) = std::env::var("APPLE_MUSIC_API_URL") {
            config.music.base_url = base_url;
        }

        if let Ok(mode) = std::env::var("MCP_OAUTH_MODE") {
            match mode.to_lowercase().as_str() {
                "session" => config.oauth.mode = OauthMode::Session,
                "stateless" => config.oauth.mode = OauthMode::Stateless,
                other => warn!("Unknown MCP_OAUTH_MODE '{other}', keeping stateless"),
            }
        }
        if let Ok(url) = std::env::var("MCP_OAUTH_PUBLIC_URL") {
            config.oauth.public_base_url = url.trim_end_matches('/').to_string();
        }
        if let Ok(require) = std::env::var("MCP_OAUTH_REQUIRE_AUTH") {
            config.oauth.require_authorization = require.to_lowercase() != "false" && require != "0";
        }

        if config.apple.team_id.is_none() || config.apple.key_id.is_none() {
            warn!(
                "APPLE_TEAM_ID / APPLE_KEY_ID not set - developer token \
                 minting will fail until they are configured"
            );
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Mutex to ensure env var tests run serially
    static ENV_TEST_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_apple_credentials_from_env() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        unsafe {
            std::env::set_var("APPLE_TEAM_ID", "TEAM123");
            std::env::set_var("APPLE_KEY_ID", "KEY456");
            std::env::set_var("APPLE_PRIVATE_KEY", "line1\\nline2");
        }
        let config = Config::from_env();
        assert_eq!(config.apple.team_id.as_deref(), Some("TEAM123"));
        assert_eq!(config.apple.key_id.as_deref(), Some("KEY456"));
        assert_eq!(config.apple.private_key.as_deref(), Some("line1\nline2"));
        unsafe {
            std::env::remove_var("APPLE_TEAM_ID");
            std::env::remove_var("APPLE_KEY_ID");
            std::env::remove_var("APPLE_PRIVATE_KEY");
        }
    }

    #[test]
    fn test_oauth_mode_from_env() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        unsafe {
            std::env::set_var("MCP_OAUTH_MODE", "session");
        }
        let config = Config::from_env();
        assert_eq!(config.oauth.mode, OauthMode::Session);
        unsafe {
            std::env::remove_var("MCP_OAUTH_MODE");
        }
    }

    #[test]
    fn test_secrets_redacted_in_debug() {
        let creds = AppleCredentialsConfig {
            private_key: Some("super_secret_key".to_string()),
            music_user_token: Some("super_secret_token".to_string()),
            ..Default::default()
        };
        let debug_str = format!("{:?}", creds);
        assert!(debug_str.contains("REDACTED"));
        assert!(!debug_str.contains("super_secret_key"));
        assert!(!debug_str.contains("super_secret_token"));
    }

    #[test]
    fn test_signing_identity_requires_key_source() {
        let creds = AppleCredentialsConfig {
            team_id: Some("T".to_string()),
            key_id: Some("K".to_string()),
            ..Default::default()
        };
        assert!(creds.signing_identity().is_err());
    }

    #[test]
    fn test_token_ttl_default() {
        let creds = AppleCredentialsConfig::default();
        assert_eq!(creds.token_ttl_secs(), DEFAULT_LIFETIME_SECS);
    }
}
