// Router-wide response shaping
// Decision: OPTIONS answers 200 on every path; browsers send CORS preflights before writes
// Decision: axum's bare 405 is rewritten into the JSON error envelope, keeping `Allow`

use axum::body::Body;
use axum::extract::Request;
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::api::ApiError;

/// Short-circuit OPTIONS requests that reach the router
pub async fn options_ok(req: Request, next: Next) -> Response {
    if req.method() == Method::OPTIONS {
        return StatusCode::OK.into_response();
    }
    next.run(req).await
}

/// Give 405 responses the JSON error body
pub async fn method_not_allowed_json(response: Response) -> Response {
    if response.status() != StatusCode::METHOD_NOT_ALLOWED {
        return response;
    }

    let allow = response
        .headers()
        .get(header::ALLOW)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    let body = ApiError::MethodNotAllowed {
        message: format!("Method not allowed. Allowed: {}", allow),
    }
    .to_body();

    let (mut parts, _) = response.into_parts();
    parts.headers.remove(header::CONTENT_LENGTH);
    parts.headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );

    Response::from_parts(parts, Body::from(serde_json::to_vec(&body).unwrap_or_default()))
}
