// Authentication configuration loaded from environment variables.
// Decision: AUTH_ prefix for all auth config
// Decision: Default to "none" mode for local development

use std::time::Duration;

/// Default token lifetime: 7 days
const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Authentication mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthMode {
    /// Bearer token optional; the requester may name itself with `userId`
    #[default]
    None,
    /// Bearer token required on resource routes
    Full,
}

impl AuthMode {
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "full" => AuthMode::Full,
            _ => AuthMode::None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMode::None => "none",
            AuthMode::Full => "full",
        }
    }
}

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Secret key for signing JWTs
    pub secret: String,
    pub token_lifetime: Duration,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            token_lifetime: DEFAULT_TOKEN_LIFETIME,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
    pub mode: AuthMode,
    pub jwt: JwtConfig,
}

impl AuthConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let mode = std::env::var("AUTH_MODE")
            .map(|s| AuthMode::from_str(&s))
            .unwrap_or_default();

        let secret = std::env::var("AUTH_JWT_SECRET")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| {
                if mode == AuthMode::Full {
                    tracing::warn!("AUTH_JWT_SECRET not set, tokens will not survive a restart");
                }
                random_secret()
            });

        let token_lifetime = std::env::var("AUTH_JWT_LIFETIME_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TOKEN_LIFETIME);

        Self {
            mode,
            jwt: JwtConfig {
                secret,
                token_lifetime,
            },
        }
    }

    /// Configuration with a fixed secret, for tests and tools
    pub fn with_secret(mode: AuthMode, secret: impl Into<String>) -> Self {
        Self {
            mode,
            jwt: JwtConfig {
                secret: secret.into(),
                ..JwtConfig::default()
            },
        }
    }
}

/// Random 256-bit secret, hex encoded
fn random_secret() -> String {
    use rand::Rng;
    let bytes: [u8; 32] = rand::thread_rng().gen();
    hex::encode(bytes)
}
