// Agentdeck API server library
// Decision: Router assembly lives in the library so tests drive it in-process
// Decision: Store and LLM client are trait objects chosen by main

pub mod api;
pub mod auth;
pub mod config;
pub mod layers;
pub mod openapi;
pub mod services;

use agentdeck_core::{LlmClient, Store};
use axum::extract::FromRef;
use axum::middleware;
use axum::{routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::ApiError;
use crate::auth::AuthState;
use crate::openapi::ApiDoc;

/// App state shared across routes
#[derive(Clone, FromRef)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub llm: Arc<dyn LlmClient>,
    pub auth: AuthState,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, llm: Arc<dyn LlmClient>, auth: AuthState) -> Self {
        Self { store, llm, auth }
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn route_not_found() -> ApiError {
    ApiError::not_found("Route not found")
}

/// Build the full application router
///
/// `/health` and the Swagger UI are never prefixed; every API route is
/// nested under `api_prefix` when it is not empty.
pub fn build_router(state: AppState, api_prefix: &str) -> Router {
    let api_routes = Router::new()
        .merge(api::agents::routes())
        .merge(api::executions::routes())
        .merge(api::workflows::routes())
        .merge(api::tools::routes())
        .merge(api::models::routes())
        .merge(api::analytics::routes())
        .merge(auth::routes());

    Router::new()
        .route("/health", get(health))
        .merge(build_router_with_prefix(api_routes, api_prefix))
        .fallback(route_not_found)
        .with_state(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(middleware::map_response(layers::method_not_allowed_json))
        .layer(middleware::from_fn(layers::options_ok))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Nest routes under an optional prefix
fn build_router_with_prefix<S: Clone + Send + Sync + 'static>(
    api_routes: Router<S>,
    api_prefix: &str,
) -> Router<S> {
    if api_prefix.is_empty() {
        api_routes
    } else {
        Router::new().nest(api_prefix, api_routes)
    }
}
