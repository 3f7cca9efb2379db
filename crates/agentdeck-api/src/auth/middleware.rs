// Requester resolution
// Decision: Support both cookie-based (UI) and header-based (API) tokens
// Decision: In "none" mode a request without a token may name its user with `userId`

use axum::extract::{FromRef, FromRequestParts};
use axum::http::{header, request::Parts};
use axum_extra::extract::CookieJar;
use std::sync::Arc;
use uuid::Uuid;

use super::config::{AuthConfig, AuthMode};
use super::jwt::JwtService;
use crate::api::{ApiError, ApiResult};

/// Cookie carrying the token for browser sessions
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

/// Auth state shared across routes
#[derive(Clone)]
pub struct AuthState {
    pub config: AuthConfig,
    pub jwt_service: Arc<JwtService>,
}

impl AuthState {
    pub fn new(config: AuthConfig) -> Self {
        let jwt_service = Arc::new(JwtService::new(config.jwt.clone()));
        Self {
            config,
            jwt_service,
        }
    }
}

/// Who is making the request
///
/// A valid token always wins. Without one, `userId` from the body or query
/// is trusted in "none" mode only; "full" mode rejects the request outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Requester {
    token_user: Option<Uuid>,
    mode: AuthMode,
}

impl Requester {
    pub fn anonymous(mode: AuthMode) -> Self {
        Self {
            token_user: None,
            mode,
        }
    }

    pub fn authenticated(user_id: Uuid, mode: AuthMode) -> Self {
        Self {
            token_user: Some(user_id),
            mode,
        }
    }

    /// User id from the token, if one was presented
    pub fn token_user(&self) -> Option<Uuid> {
        self.token_user
    }

    /// Effective user id: the token subject, else the claimed id
    pub fn resolve(&self, claimed: Option<Uuid>) -> Option<Uuid> {
        match (self.token_user, self.mode) {
            (Some(id), _) => Some(id),
            (None, AuthMode::None) => claimed,
            (None, AuthMode::Full) => None,
        }
    }

    /// Like `resolve`, but a missing user is a BadRequest
    pub fn require(&self, claimed: Option<Uuid>) -> ApiResult<Uuid> {
        self.resolve(claimed)
            .ok_or_else(|| ApiError::bad_request("userId is required"))
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Requester
where
    S: Send + Sync,
    AuthState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_state = AuthState::from_ref(state);
        let mode = auth_state.config.mode;

        match extract_token(parts)? {
            Some(token) => {
                let user_id = validate_token(&token, &auth_state)?;
                Ok(Requester::authenticated(user_id, mode))
            }
            None if mode == AuthMode::Full => {
                Err(ApiError::unauthorized("Authentication required"))
            }
            None => Ok(Requester::anonymous(mode)),
        }
    }
}

/// Bearer token from the Authorization header, else the access_token cookie
fn extract_token(parts: &Parts) -> ApiResult<Option<String>> {
    if let Some(auth_header) = parts.headers.get(header::AUTHORIZATION) {
        let auth_str = auth_header
            .to_str()
            .map_err(|_| ApiError::unauthorized("Invalid authorization header"))?;

        return match auth_str.strip_prefix("Bearer ") {
            Some(token) if !token.trim().is_empty() => Ok(Some(token.trim().to_string())),
            _ => Err(ApiError::unauthorized("Invalid authorization header")),
        };
    }

    let jar = CookieJar::from_headers(&parts.headers);
    Ok(jar
        .get(ACCESS_TOKEN_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty()))
}

fn validate_token(token: &str, auth_state: &AuthState) -> ApiResult<Uuid> {
    let claims = auth_state
        .jwt_service
        .validate_token(token)
        .map_err(|e| {
            tracing::debug!("JWT validation failed: {}", e);
            ApiError::unauthorized("Invalid or expired token")
        })?;

    claims
        .user_id()
        .map_err(|_| ApiError::unauthorized("Invalid user ID in token"))
}
