// Authentication HTTP routes
// Decision: One login endpoint; the `type` field selects password login, demo login or registration
// Decision: The token is returned in the body and set as an http-only cookie

use agentdeck_core::{NewUser, User, UserRole};
use agentdeck_storage::{hash_password, verify_password};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::middleware::{Requester, ACCESS_TOKEN_COOKIE};
use crate::api::validation::{is_valid_email, MIN_PASSWORD_CHARS};
use crate::api::{ApiError, ApiJson, ApiResponse, ApiResult};
use crate::AppState;

/// Fixed account used by demo login
pub const DEMO_EMAIL: &str = "demo@aiagentbuilder.com";
const DEMO_NAME: &str = "Demo User";

/// Login request. `type` is `register`, `demo`, or absent for password login.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[serde(rename = "type")]
    #[schema(example = "register")]
    pub login_type: Option<String>,
    #[schema(example = "user@example.com")]
    pub email: Option<String>,
    pub password: Option<String>,
    /// Display name, required for registration
    pub name: Option<String>,
}

/// Token and the user it was issued for
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub user: User,
    pub token: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/me", get(get_current_user))
}

/// POST /auth/login - Password login, demo login or registration
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = ApiResponse<AuthResponse>),
        (status = 201, description = "Registered", body = ApiResponse<AuthResponse>),
        (status = 400, description = "Invalid input", body = crate::api::ErrorBody),
        (status = 401, description = "Invalid credentials", body = crate::api::ErrorBody),
        (status = 409, description = "Email already registered", body = crate::api::ErrorBody)
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<Response> {
    match req.login_type.as_deref() {
        Some("register") => register(&state, jar, req).await,
        Some("demo") => demo_login(&state, jar).await,
        _ => password_login(&state, jar, req).await,
    }
}

async fn password_login(state: &AppState, jar: CookieJar, req: LoginRequest) -> ApiResult<Response> {
    let (Some(email), Some(password)) = (req.email, req.password) else {
        return Err(ApiError::bad_request("Email and password are required"));
    };
    if !is_valid_email(&email) {
        return Err(ApiError::bad_request("Invalid email format"));
    }

    let credentials = state
        .store
        .get_user_credentials(&email)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid email or password"))?;

    // Accounts created by demo login have no password
    let password_hash = credentials
        .password_hash
        .as_deref()
        .ok_or_else(|| ApiError::unauthorized("Invalid email or password"))?;

    let valid = verify_password(&password, password_hash).map_err(|e| {
        tracing::error!("Password verification error: {}", e);
        ApiError::unauthorized("Invalid email or password")
    })?;
    if !valid {
        return Err(ApiError::unauthorized("Invalid email or password"));
    }

    tracing::info!(user_id = %credentials.user.id, "user logged in");
    token_response(state, jar, credentials.user, StatusCode::OK, "Logged in successfully")
}

async fn register(state: &AppState, jar: CookieJar, req: LoginRequest) -> ApiResult<Response> {
    let name = req
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty());
    let (Some(email), Some(password), Some(name)) = (req.email.as_deref(), req.password.as_deref(), name)
    else {
        return Err(ApiError::bad_request("Email, password and name are required"));
    };
    if !is_valid_email(email) {
        return Err(ApiError::bad_request("Invalid email format"));
    }
    if password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(ApiError::bad_request(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_CHARS
        )));
    }

    if state.store.get_user_credentials(email).await?.is_some() {
        return Err(ApiError::conflict("An account with this email already exists"));
    }

    let password_hash = hash_password(password).map_err(|e| ApiError::internal(e.to_string()))?;

    let user = state
        .store
        .create_user(NewUser {
            email: email.trim().to_lowercase(),
            name: name.to_string(),
            avatar: None,
            role: UserRole::User,
            password_hash: Some(password_hash),
        })
        .await
        .map_err(|e| {
            if e.is_conflict() {
                ApiError::conflict("An account with this email already exists")
            } else {
                e.into()
            }
        })?;

    tracing::info!(user_id = %user.id, "user registered");
    token_response(state, jar, user, StatusCode::CREATED, "Registered successfully")
}

async fn demo_login(state: &AppState, jar: CookieJar) -> ApiResult<Response> {
    let user = match state.store.get_user_credentials(DEMO_EMAIL).await? {
        Some(credentials) => credentials.user,
        None => {
            let created = state
                .store
                .create_user(NewUser {
                    email: DEMO_EMAIL.to_string(),
                    name: DEMO_NAME.to_string(),
                    avatar: None,
                    role: UserRole::User,
                    password_hash: None,
                })
                .await;

            match created {
                Ok(user) => user,
                // Another request created it first
                Err(e) if e.is_conflict() => state
                    .store
                    .get_user_credentials(DEMO_EMAIL)
                    .await?
                    .map(|c| c.user)
                    .ok_or_else(|| ApiError::internal("demo user vanished after conflict"))?,
                Err(e) => return Err(e.into()),
            }
        }
    };

    token_response(state, jar, user, StatusCode::OK, "Demo login successful")
}

/// GET /auth/me - User behind the presented token
#[utoipa::path(
    get,
    path = "/auth/me",
    responses(
        (status = 200, description = "Current user", body = ApiResponse<User>),
        (status = 401, description = "Not authenticated", body = crate::api::ErrorBody)
    ),
    tag = "auth"
)]
pub async fn get_current_user(
    State(state): State<AppState>,
    requester: Requester,
) -> ApiResult<ApiResponse<User>> {
    let user_id = requester
        .token_user()
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

    let user = state
        .store
        .get_user(user_id)
        .await?
        .ok_or_else(|| ApiError::unauthorized("User no longer exists"))?;

    Ok(ApiResponse::new(user))
}

/// Issue a token for the user and set it as a cookie
fn token_response(
    state: &AppState,
    jar: CookieJar,
    user: User,
    status: StatusCode,
    message: &str,
) -> ApiResult<Response> {
    let token = state
        .auth
        .jwt_service
        .generate_token(&user)
        .map_err(|e| ApiError::internal(format!("Token generation error: {}", e)))?;

    let cookie = Cookie::build((ACCESS_TOKEN_COOKIE, token.clone()))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(
            state.auth.jwt_service.token_lifetime_secs(),
        ))
        .build();

    let body = ApiResponse::new(AuthResponse { user, token }).with_message(message);
    Ok((status, jar.add(cookie), Json(body)).into_response())
}
